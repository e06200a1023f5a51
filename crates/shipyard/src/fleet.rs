//! Ships and the fleet that owns them.
//!
//! A [`Ship`] owns its live grid, a blueprint grid for planned edits, an
//! integrity checker and a change journal. Ships never share grids, so the
//! [`Fleet`] ticks them in parallel.

use blockform_engine::placement::drag::{DragPlan, plan_drag};
use blockform_engine::{
    AbilityKind, Block, BlockGrid, BlockLayer, BlockRecord, BlockTypeRegistry, BreakReport,
    Candidate, ChunkLayout, Facing, GridConfig, IntegrityChecker, Path, Pathfinder,
    PlacementContext, PlacementValidator, Position, Rejection, ShipId,
};
use rayon::prelude::*;
use slotmap::SlotMap;

use crate::event_bus::{ChangeJournal, GridChangeBatch};

/// Snapshot of what a ship can currently do, read from its type cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipStatus {
    pub base_blocks: usize,
    pub top_blocks: usize,
    pub mass: f32,
    pub shields: bool,
    pub gravity: bool,
    pub thrust: bool,
    pub weapons: usize,
}

pub struct Ship {
    id: ShipId,
    name: String,
    grid: BlockGrid,
    blueprint: BlockGrid,
    integrity: IntegrityChecker,
    journal: ChangeJournal,
}

impl Ship {
    fn new(id: ShipId, name: String, config: &GridConfig, layout: ChunkLayout) -> Self {
        let mut grid = BlockGrid::with_layout(layout).owned_by(id);
        let mut integrity = IntegrityChecker::new(config);
        integrity.attach(&mut grid);
        let journal = ChangeJournal::attach(&mut grid);
        Self {
            id,
            name,
            grid,
            blueprint: BlockGrid::with_layout(layout).owned_by(id),
            integrity,
            journal,
        }
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut BlockGrid {
        &mut self.grid
    }

    pub fn blueprint(&self) -> &BlockGrid {
        &self.blueprint
    }

    pub fn blueprint_mut(&mut self) -> &mut BlockGrid {
        &mut self.blueprint
    }

    pub fn integrity(&self) -> &IntegrityChecker {
        &self.integrity
    }

    pub fn journal(&self) -> &ChangeJournal {
        &self.journal
    }

    /// Place a fresh block of type `id` on the live grid.
    pub fn place(
        &mut self,
        registry: &BlockTypeRegistry,
        id: &str,
        pos: Position,
        facing: Facing,
    ) -> blockform_engine::Result<Option<Block>> {
        let block = registry.block(id)?.with_facing(facing);
        let layer = block.layer();
        self.grid.set(pos, layer, Some(block))
    }

    /// Break a block; a Base break also takes the Top block with it. The
    /// neighbours are checked on the next tick.
    pub fn break_block(&mut self, pos: Position, layer: BlockLayer) -> Vec<Block> {
        self.integrity.break_block(&mut self.grid, pos, layer)
    }

    /// Advance this ship's break-check timer.
    pub fn tick(&mut self, dt: f32) -> Option<BreakReport> {
        self.integrity.tick(&mut self.grid, dt)
    }

    /// Run the break check now, whatever the timer says.
    pub fn check_breaks(&mut self) -> BreakReport {
        self.integrity.update_breaks(&mut self.grid)
    }

    /// Everything the ship once had is gone.
    pub fn is_wrecked(&self) -> bool {
        self.grid.len(BlockLayer::Base) == 0 && self.grid.chunk_count() > 0
    }

    pub fn status(&self) -> ShipStatus {
        ShipStatus {
            base_blocks: self.grid.len(BlockLayer::Base),
            top_blocks: self.grid.len(BlockLayer::Top),
            mass: self.grid.total_mass(),
            shields: self.grid.has_ability(AbilityKind::ShieldGenerator),
            gravity: self.grid.has_ability(AbilityKind::GravityGenerator),
            thrust: self.grid.has_ability(AbilityKind::Thruster),
            weapons: self.grid.find_by_ability(AbilityKind::Weapon).count(),
        }
    }

    /// Shortest walk between two cells of the live grid.
    pub fn route(&self, pathfinder: &Pathfinder, from: Position, to: Position) -> Option<Path> {
        pathfinder.find_path(&self.grid, from, to)
    }

    // ── Blueprint editing ───────────────────────────────────────────────

    /// Validate a single planned block against the blueprint.
    pub fn check_placement(
        &self,
        validator: &PlacementValidator,
        candidate: &Candidate,
    ) -> Result<(), Rejection> {
        validator.check(&PlacementContext::new(&self.blueprint), candidate)
    }

    /// Validate and, if accepted, add a planned block to the blueprint.
    pub fn plan(
        &mut self,
        validator: &PlacementValidator,
        candidate: &Candidate,
    ) -> anyhow::Result<()> {
        self.check_placement(validator, candidate)?;
        self.blueprint
            .set(candidate.origin, candidate.layer(), Some(candidate.to_block()))?;
        Ok(())
    }

    /// Plan a drag over the blueprint, mirrored around the live ship's axis
    /// when `mirrored` is set.
    pub fn plan_drag(
        &self,
        validator: &PlacementValidator,
        template: &Candidate,
        from: Position,
        to: Position,
        mirrored: bool,
    ) -> DragPlan {
        let axis = mirrored.then(|| self.grid.mirror_axis());
        plan_drag(validator, &self.blueprint, template, from, to, axis)
    }

    /// Copy the blueprint onto the live grid, one block per cell the live
    /// grid leaves empty. Returns the number of blocks built.
    pub fn build_from_blueprint(
        &mut self,
        registry: &BlockTypeRegistry,
    ) -> blockform_engine::Result<usize> {
        let pending: Vec<BlockRecord> = self
            .blueprint
            .records()
            .into_iter()
            .filter(|r| self.grid.get(r.pos(), r.layer).is_none())
            .collect();
        self.grid.restore(registry, &pending)
    }

    /// Take this tick's grid changes as a broadcastable batch.
    pub fn drain_changes(&self) -> Option<GridChangeBatch> {
        let changes = self.journal.drain();
        if changes.is_empty() {
            return None;
        }
        Some(GridChangeBatch {
            ship: self.id,
            changes: changes.into(),
        })
    }
}

pub struct Fleet {
    config: GridConfig,
    layout: ChunkLayout,
    ships: SlotMap<ShipId, Ship>,
}

impl Fleet {
    pub fn new(config: GridConfig) -> blockform_engine::Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: config.layout()?,
            config,
            ships: SlotMap::with_key(),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Add an empty ship.
    pub fn spawn(&mut self, name: impl Into<String>) -> ShipId {
        let name = name.into();
        let (config, layout) = (&self.config, self.layout);
        let id = self
            .ships
            .insert_with_key(|id| Ship::new(id, name, config, layout));
        tracing::info!("Spawned ship '{}'", self.ships[id].name());
        id
    }

    /// Add a ship built from snapshot records.
    pub fn spawn_from_records(
        &mut self,
        name: impl Into<String>,
        registry: &BlockTypeRegistry,
        records: &[BlockRecord],
    ) -> blockform_engine::Result<ShipId> {
        let id = self.spawn(name);
        if let Err(err) = self.ships[id].grid.restore(registry, records) {
            self.ships.remove(id);
            return Err(err);
        }
        // Building from records is not damage.
        self.ships[id].journal.drain();
        Ok(id)
    }

    pub fn get(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id)
    }

    pub fn get_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(id)
    }

    pub fn remove(&mut self, id: ShipId) -> Option<Ship> {
        self.ships.remove(id)
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ship> {
        self.ships.values_mut()
    }

    /// Advance every ship's break checks by `dt` seconds, in parallel.
    /// Returns the reports of the ships whose check ran.
    pub fn tick(&mut self, dt: f32) -> Vec<(ShipId, BreakReport)> {
        let mut ships: Vec<&mut Ship> = self.ships.values_mut().collect();
        ships
            .par_iter_mut()
            .filter_map(|ship| ship.tick(dt).map(|report| (ship.id, report)))
            .collect()
    }

    /// Drain every ship's journal.
    pub fn drain_changes(&self) -> Vec<GridChangeBatch> {
        self.ships.values().filter_map(Ship::drain_changes).collect()
    }

    /// Remove ships that have lost every Base block. Returns their names.
    pub fn scrap_wrecks(&mut self) -> Vec<String> {
        let wrecks: Vec<ShipId> = self
            .ships
            .iter()
            .filter(|(_, ship)| ship.is_wrecked())
            .map(|(id, _)| id)
            .collect();
        wrecks
            .into_iter()
            .filter_map(|id| self.ships.remove(id))
            .map(|ship| {
                tracing::info!("Ship '{}' was destroyed", ship.name);
                ship.name
            })
            .collect()
    }
}
