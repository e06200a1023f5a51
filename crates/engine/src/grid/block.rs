use super::block_type::BlockType;
use super::facing::Facing;
use super::position::Position;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    /// Handle to the ship that owns a grid. Blocks carry it for lookups only;
    /// it never keeps the ship alive.
    pub struct ShipId;
}

/// The two stacked layers of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLayer {
    /// Structure: walls, floors, hull.
    Base,
    /// Equipment mounted on top of a Base cell.
    Top,
}

impl BlockLayer {
    pub const ALL: [BlockLayer; 2] = [BlockLayer::Base, BlockLayer::Top];
}

/// How a Base-layer block behaves for collision and movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionClass {
    Wall,
    #[default]
    Floor,
}

/// The closed set of behaviours a complex block can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Console,
    Thruster,
    ShieldGenerator,
    GravityGenerator,
    TractorBeam,
    Weapon,
}

/// Per-block runtime state for a complex block, one variant per behaviour.
#[derive(Debug, Clone, PartialEq)]
pub enum Ability {
    Console { crewed: bool },
    Thruster { firing: bool },
    ShieldGenerator { online: bool },
    GravityGenerator { online: bool },
    TractorBeam { target: Option<Position> },
    Weapon { cooldown: f32 },
}

impl Ability {
    /// Idle state for a freshly placed block.
    pub fn idle(kind: AbilityKind) -> Self {
        match kind {
            AbilityKind::Console => Ability::Console { crewed: false },
            AbilityKind::Thruster => Ability::Thruster { firing: false },
            AbilityKind::ShieldGenerator => Ability::ShieldGenerator { online: true },
            AbilityKind::GravityGenerator => Ability::GravityGenerator { online: true },
            AbilityKind::TractorBeam => Ability::TractorBeam { target: None },
            AbilityKind::Weapon => Ability::Weapon { cooldown: 0.0 },
        }
    }

    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::Console { .. } => AbilityKind::Console,
            Ability::Thruster { .. } => AbilityKind::Thruster,
            Ability::ShieldGenerator { .. } => AbilityKind::ShieldGenerator,
            Ability::GravityGenerator { .. } => AbilityKind::GravityGenerator,
            Ability::TractorBeam { .. } => AbilityKind::TractorBeam,
            Ability::Weapon { .. } => AbilityKind::Weapon,
        }
    }
}

/// A placed block.
///
/// Position and owner are stamped by the grid when the block is stored;
/// before that they are whatever the caller left in them.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    block_type: Arc<BlockType>,
    pos: Position,
    pub facing: Facing,
    health: f32,
    ship: Option<ShipId>,
    pub ability: Option<Ability>,
}

impl Block {
    pub fn new(block_type: Arc<BlockType>) -> Self {
        let health = block_type.max_health;
        let ability = block_type.ability.map(Ability::idle);
        Self {
            block_type,
            pos: Position::ZERO,
            facing: Facing::Up,
            health,
            ship: None,
            ability,
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.set_health(health);
        self
    }

    pub fn block_type(&self) -> &Arc<BlockType> {
        &self.block_type
    }

    pub fn type_id(&self) -> &str {
        &self.block_type.id
    }

    /// Is this block of type `id`?
    pub fn is(&self, id: &str) -> bool {
        self.block_type.id == id
    }

    pub fn layer(&self) -> BlockLayer {
        self.block_type.layer
    }

    pub fn collision(&self) -> CollisionClass {
        self.block_type.collision
    }

    pub fn mass(&self) -> f32 {
        self.block_type.mass
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn ship(&self) -> Option<ShipId> {
        self.ship
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    /// Clamped into `0..=max_health`.
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.block_type.max_health);
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_damaged(&self) -> bool {
        self.health < self.block_type.max_health
    }

    /// Cells covered by this block, starting at its origin.
    pub fn footprint(&self) -> impl Iterator<Item = Position> + use<> {
        footprint(self.pos, &self.block_type)
    }

    pub(crate) fn place(&mut self, pos: Position, ship: Option<ShipId>) {
        self.pos = pos;
        self.ship = ship;
    }
}

/// Cells a block of `block_type` covers when its origin is at `origin`.
pub fn footprint(origin: Position, block_type: &BlockType) -> impl Iterator<Item = Position> + use<> {
    let (width, height) = (block_type.width as i32, block_type.height as i32);
    (0..width).flat_map(move |i| (0..height).map(move |j| Position::new(origin.x + i, origin.y + j)))
}
