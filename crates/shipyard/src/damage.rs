//! Applying damage to ship blocks.
//!
//! Health never drops below zero, and a block at zero is broken straight
//! away: removed from the grid, taking any Top block on it along, with the
//! break check picking up the pieces on the next tick.

use blockform_engine::{Block, BlockLayer, Position};

use crate::fleet::Ship;

/// What a hit did.
#[derive(Debug, Clone, PartialEq)]
pub enum DamageOutcome {
    /// Nothing at the target.
    Missed,
    /// The block survived with this much health.
    Damaged { health: f32 },
    /// The block broke; these blocks left the grid.
    Broken(Vec<Block>),
}

impl DamageOutcome {
    pub fn broken(&self) -> &[Block] {
        match self {
            DamageOutcome::Broken(blocks) => blocks,
            _ => &[],
        }
    }
}

/// Damage the block at `pos` on `layer`.
pub fn damage_block(ship: &mut Ship, pos: Position, layer: BlockLayer, amount: f32) -> DamageOutcome {
    let Some(block) = ship.grid().get(pos, layer) else {
        return DamageOutcome::Missed;
    };
    if block.is_destroyed() {
        return DamageOutcome::Missed;
    }
    let health = (block.health() - amount).max(0.0);
    ship.grid_mut().set_health(pos, layer, health);
    if health > 0.0 {
        return DamageOutcome::Damaged { health };
    }

    tracing::debug!("{:?} block at {} destroyed", layer, pos);
    DamageOutcome::Broken(ship.break_block(pos, layer))
}

/// Hit whatever is on top at `pos`. If a Top block breaks, the damage left
/// over after its health and damage buffer carries into the Base block
/// beneath it.
pub fn damage_at(ship: &mut Ship, pos: Position, amount: f32) -> DamageOutcome {
    let Some(top) = ship.grid().get(pos, BlockLayer::Top) else {
        return damage_block(ship, pos, BlockLayer::Base, amount);
    };
    let carry = amount - top.health() - top.block_type().damage_buffer;

    let outcome = damage_block(ship, pos, BlockLayer::Top, amount);
    if carry <= 0.0 || !matches!(outcome, DamageOutcome::Broken(_)) {
        return outcome;
    }
    let mut broken = outcome.broken().to_vec();
    broken.extend(damage_block(ship, pos, BlockLayer::Base, carry).broken().iter().cloned());
    DamageOutcome::Broken(broken)
}

/// Damage every cell within `radius` of `center`, falling off linearly to
/// nothing at the edge. Returns every block that broke.
pub fn blast(ship: &mut Ship, center: Position, radius: f32, amount: f32) -> Vec<Block> {
    let reach = radius.ceil() as i32;
    let mut broken = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance > radius {
                continue;
            }
            let falloff = if radius > 0.0 { 1.0 - distance / radius } else { 1.0 };
            let hit = amount * falloff;
            if hit <= 0.0 {
                continue;
            }
            let pos = Position::new(center.x + dx, center.y + dy);
            broken.extend(damage_at(ship, pos, hit).broken().iter().cloned());
        }
    }
    if !broken.is_empty() {
        tracing::info!("Blast at {} broke {} blocks on '{}'", center, broken.len(), ship.name());
    }
    broken
}
