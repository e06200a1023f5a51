//! Validation of speculative edits to a ship's blueprint.
//!
//! A [`Candidate`] is a block that has not been placed yet. Each
//! [`PlacementRule`] looks at the candidate alongside the blueprint (and the
//! blocks already picked up by the current drag, if any) and either lets it
//! through or says why not. Nothing here writes to a grid except
//! [`DragPlan::commit`](drag::DragPlan::commit).

pub mod drag;
pub mod mirror;
pub mod rules;

use crate::grid::BlockGrid;
use crate::grid::block::{Block, BlockLayer, footprint};
use crate::grid::block_type::BlockType;
use crate::grid::facing::Facing;
use crate::grid::position::Position;
use std::sync::Arc;
use thiserror::Error;

/// A block the editor would like to place.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub block_type: Arc<BlockType>,
    pub origin: Position,
    pub facing: Facing,
}

impl Candidate {
    pub fn new(block_type: Arc<BlockType>, origin: Position) -> Self {
        Self {
            block_type,
            origin,
            facing: Facing::Up,
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// The same block moved to `origin`.
    pub fn at(&self, origin: Position) -> Self {
        Self {
            origin,
            ..self.clone()
        }
    }

    pub fn layer(&self) -> BlockLayer {
        self.block_type.layer
    }

    pub fn footprint(&self) -> impl Iterator<Item = Position> + use<> {
        footprint(self.origin, &self.block_type)
    }

    /// Reflection across column `axis`: the origin's x is mirrored, y is
    /// kept, and left/right facings swap.
    pub fn mirrored(&self, axis: i32) -> Self {
        Self {
            block_type: Arc::clone(&self.block_type),
            origin: mirror::mirror_position(self.origin, axis),
            facing: self.facing.mirrored(),
        }
    }

    /// The block this candidate becomes once committed.
    pub fn to_block(&self) -> Block {
        Block::new(Arc::clone(&self.block_type)).with_facing(self.facing)
    }
}

/// What the rules may look at.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    /// The planned layout being edited.
    pub blueprint: &'a BlockGrid,
    /// Blocks accepted earlier in the current drag, not yet committed.
    pub cursor: Option<&'a BlockGrid>,
}

impl<'a> PlacementContext<'a> {
    pub fn new(blueprint: &'a BlockGrid) -> Self {
        Self {
            blueprint,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: &'a BlockGrid) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Base block at `pos` in the blueprint, else in the cursor.
    pub fn base_at(&self, pos: Position) -> Option<&'a Block> {
        self.blueprint
            .get(pos, BlockLayer::Base)
            .or_else(|| self.cursor.and_then(|cursor| cursor.get(pos, BlockLayer::Base)))
    }
}

/// Why a candidate was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("nothing adjoins the block's footprint")]
    NotAdjacent,
    #[error("cell {0} is already occupied")]
    Occupied(Position),
    #[error("cell {0} has nothing the block can sit on")]
    NoSupport(Position),
    #[error("cell {cell} is in the firing arc of the block at {blocker}")]
    InFiringArc { cell: Position, blocker: Position },
    #[error("no clear line of fire from {0}")]
    NoLineOfFire(Position),
}

/// A placement rule: `Ok(())` lets the candidate through.
///
/// Rules are pure. They read the context and never write to it, so any
/// number of candidates can be checked against one blueprint.
pub type PlacementRule = fn(&PlacementContext<'_>, &Candidate) -> Result<(), Rejection>;

/// An ordered collection of rules; the first rejection wins.
pub struct RuleSet {
    rules: Vec<PlacementRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adjacency, footprint fit, firing arcs, line of fire.
    pub fn standard() -> Self {
        let mut rules = Self::new();
        rules.add(rules::adjacency);
        rules.add(rules::footprint_fit);
        rules.add(rules::position_blocked);
        rules.add(rules::line_of_fire);
        rules
    }

    pub fn add(&mut self, rule: PlacementRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
        for rule in &self.rules {
            rule(ctx, candidate)?;
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a rule set over candidates. Never mutates the grids it is shown.
pub struct PlacementValidator {
    rules: RuleSet,
}

impl PlacementValidator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn check(&self, ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
        self.rules.evaluate(ctx, candidate)
    }

    pub fn is_valid(&self, ctx: &PlacementContext<'_>, candidate: &Candidate) -> bool {
        self.check(ctx, candidate).is_ok()
    }

    /// Check the mirror image of `candidate` across column `axis`, with the
    /// same rules as the original.
    pub fn check_mirrored(
        &self,
        ctx: &PlacementContext<'_>,
        candidate: &Candidate,
        axis: i32,
    ) -> Result<(), Rejection> {
        self.check(ctx, &candidate.mirrored(axis))
    }
}

impl Default for PlacementValidator {
    fn default() -> Self {
        Self::new(RuleSet::standard())
    }
}
