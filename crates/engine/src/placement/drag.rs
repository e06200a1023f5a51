//! Planning a drag: filling a rectangle (and optionally its mirror image)
//! with copies of one block.
//!
//! Accepted blocks go into a scratch cursor grid, so a cell can be adjacent
//! to a block accepted earlier in the same drag even though nothing has
//! been committed yet.

use super::mirror::mirror_extents;
use super::{Candidate, PlacementContext, PlacementValidator, Rejection};
use crate::error::Result;
use crate::grid::BlockGrid;
use crate::grid::block::Block;
use crate::grid::facing::Facing;
use crate::grid::position::{Extents, Position};

/// Result of planning a drag, not yet applied to the blueprint.
#[derive(Debug)]
pub struct DragPlan {
    cursor: BlockGrid,
    accepted: Vec<Candidate>,
    rejected: Vec<(Candidate, Rejection)>,
}

impl DragPlan {
    /// Blocks that would be placed, in the order they were accepted.
    pub fn accepted(&self) -> &[Candidate] {
        &self.accepted
    }

    pub fn rejected(&self) -> &[(Candidate, Rejection)] {
        &self.rejected
    }

    /// The scratch grid holding the accepted blocks.
    pub fn cursor(&self) -> &BlockGrid {
        &self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Write every accepted block into `blueprint`. Returns how many were
    /// written.
    pub fn commit(self, blueprint: &mut BlockGrid) -> Result<usize> {
        let count = self.accepted.len();
        for candidate in &self.accepted {
            blueprint.set(candidate.origin, candidate.layer(), Some(candidate.to_block()))?;
        }
        tracing::debug!("Committed {} blueprint blocks from drag", count);
        Ok(count)
    }
}

/// Plan a drag from `from` to `to` with copies of `template` (whose own
/// origin is ignored). With `mirror_axis` set, the reflected rectangle is
/// filled too, with left/right facings swapped.
///
/// Cells are tried row by row from the rectangle's minimum corner. A cell
/// already holding a cursor block on the same layer is skipped.
pub fn plan_drag(
    validator: &PlacementValidator,
    blueprint: &BlockGrid,
    template: &Candidate,
    from: Position,
    to: Position,
    mirror_axis: Option<i32>,
) -> DragPlan {
    let mut plan = DragPlan {
        cursor: BlockGrid::with_layout(*blueprint.layout()),
        accepted: Vec::new(),
        rejected: Vec::new(),
    };

    let rect = Extents::spanning(from, to);
    fill(&mut plan, validator, blueprint, template, rect);

    if let Some(axis) = mirror_axis {
        let mirrored = Candidate {
            facing: template.facing.mirrored(),
            ..template.clone()
        };
        fill(&mut plan, validator, blueprint, &mirrored, mirror_extents(rect, axis));
    }

    plan
}

fn fill(
    plan: &mut DragPlan,
    validator: &PlacementValidator,
    blueprint: &BlockGrid,
    template: &Candidate,
    rect: Extents,
) {
    for pos in rect.cells() {
        if plan.cursor.get(pos, template.layer()).is_some() {
            continue;
        }
        let candidate = template.at(pos);
        let verdict = {
            let ctx = PlacementContext::new(blueprint).with_cursor(&plan.cursor);
            validator.check(&ctx, &candidate)
        };
        match verdict {
            Ok(()) => match plan.cursor.set(pos, candidate.layer(), Some(candidate.to_block())) {
                Ok(_) => plan.accepted.push(candidate),
                Err(err) => {
                    tracing::warn!("Drag cell {} dropped: {}", pos, err);
                }
            },
            Err(rejection) => plan.rejected.push((candidate, rejection)),
        }
    }
}

/// The Base block beside `pos` (blueprint first, then cursor) closest to
/// `pointer`, a fractional grid position such as the mouse.
pub fn adjoining_block<'a>(
    ctx: &PlacementContext<'a>,
    pos: Position,
    pointer: (f32, f32),
) -> Option<&'a Block> {
    let distance = |block: &Block| {
        let dx = block.pos().x as f32 - pointer.0;
        let dy = block.pos().y as f32 - pointer.1;
        dx * dx + dy * dy
    };
    pos.neighbors()
        .into_iter()
        .filter_map(|n| ctx.base_at(n))
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
}

/// Facing that points away from the block a new block is attached to; `Up`
/// when there is nothing to attach to.
pub fn facing_from_adjoining(pos: Position, adjoining: Option<&Block>) -> Facing {
    adjoining.map_or(Facing::Up, |block| Facing::from_vector(pos - block.pos()))
}

