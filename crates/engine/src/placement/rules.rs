//! The standard placement rules. Each is a [`PlacementRule`](super::PlacementRule).

use super::{Candidate, PlacementContext, Rejection};
use crate::grid::block::{BlockLayer, CollisionClass};
use crate::grid::facing::Facing;
use crate::grid::position::{Extents, Position};
use std::collections::HashSet;

/// Something must already adjoin the footprint: a Base block in the
/// blueprint or the cursor next to one of its cells, or, for Top blocks,
/// a Base block underneath.
pub fn adjacency(ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
    let cells: HashSet<Position> = candidate.footprint().collect();
    let touches_outside = cells.iter().any(|cell| {
        cell.neighbors()
            .into_iter()
            .filter(|n| !cells.contains(n))
            .any(|n| ctx.base_at(n).is_some())
    });
    let sits_on_base = candidate.layer() == BlockLayer::Top
        && cells.iter().any(|&cell| ctx.base_at(cell).is_some());

    if touches_outside || sits_on_base {
        Ok(())
    } else {
        Err(Rejection::NotAdjacent)
    }
}

/// Base blocks need empty cells. Top blocks need a free Top slot over a
/// floor, or over a wall if the type fits inside walls.
pub fn footprint_fit(ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
    for cell in candidate.footprint() {
        match candidate.layer() {
            BlockLayer::Base => {
                if ctx.blueprint.blocks_at(cell).next().is_some() {
                    return Err(Rejection::Occupied(cell));
                }
            }
            BlockLayer::Top => {
                if ctx.blueprint.get(cell, BlockLayer::Top).is_some() {
                    return Err(Rejection::Occupied(cell));
                }
                let supported = match ctx.blueprint.collision_class(cell) {
                    Some(CollisionClass::Floor) => true,
                    Some(CollisionClass::Wall) => candidate.block_type.can_fit_inside_wall,
                    None => false,
                };
                if !supported {
                    return Err(Rejection::NoSupport(cell));
                }
            }
        }
    }
    Ok(())
}

/// No cell of the footprint may lie in the ray ahead of a front blocker.
pub fn position_blocked(ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
    for blocker in ctx.blueprint.front_blockers() {
        if let Some(cell) = candidate
            .footprint()
            .find(|&cell| in_firing_arc(blocker.pos(), blocker.facing, cell))
        {
            return Err(Rejection::InFiringArc {
                cell,
                blocker: blocker.pos(),
            });
        }
    }
    Ok(())
}

/// A front-blocking candidate needs every cell ahead of it, out to the far
/// edge of the blueprint, free of Base blocks. A candidate outside the
/// blueprint still has to see past everything it faces.
pub fn line_of_fire(ctx: &PlacementContext<'_>, candidate: &Candidate) -> Result<(), Rejection> {
    if !candidate.block_type.can_block_front {
        return Ok(());
    }
    let cells: HashSet<Position> = candidate.footprint().collect();
    let area = ctx.blueprint.extents();

    for &cell in &cells {
        let blocked = ray_ahead(area, cell, candidate.facing)
            .cells()
            .filter(|pos| !cells.contains(pos))
            .any(|pos| ctx.blueprint.get(pos, BlockLayer::Base).is_some());
        if blocked {
            return Err(Rejection::NoLineOfFire(cell));
        }
    }
    Ok(())
}

/// The cells strictly ahead of `cell` up to the far side of `area`, as a
/// one-cell-wide rectangle (empty once `cell` is past that side).
fn ray_ahead(area: Extents, cell: Position, facing: Facing) -> Extents {
    let Position { x, y } = cell;
    match facing {
        Facing::Up => Extents {
            min_x: x,
            max_x: x,
            min_y: y.saturating_add(1).max(area.min_y),
            max_y: area.max_y,
        },
        Facing::Down => Extents {
            min_x: x,
            max_x: x,
            min_y: area.min_y,
            max_y: y.saturating_sub(1).min(area.max_y),
        },
        Facing::Right => Extents {
            min_x: x.saturating_add(1).max(area.min_x),
            max_x: area.max_x,
            min_y: y,
            max_y: y,
        },
        Facing::Left => Extents {
            min_x: area.min_x,
            max_x: x.saturating_sub(1).min(area.max_x),
            min_y: y,
            max_y: y,
        },
    }
}

/// Is `cell` strictly ahead of a blocker at `origin` facing `facing`, on
/// the same row or column?
pub fn in_firing_arc(origin: Position, facing: Facing, cell: Position) -> bool {
    match facing {
        Facing::Up => cell.x == origin.x && cell.y > origin.y,
        Facing::Down => cell.x == origin.x && cell.y < origin.y,
        Facing::Right => cell.y == origin.y && cell.x > origin.x,
        Facing::Left => cell.y == origin.y && cell.x < origin.x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firing_arc_is_strict_and_axis_aligned() {
        let origin = Position::new(2, 2);
        assert!(in_firing_arc(origin, Facing::Up, Position::new(2, 3)));
        assert!(in_firing_arc(origin, Facing::Up, Position::new(2, 40)));
        assert!(!in_firing_arc(origin, Facing::Up, origin));
        assert!(!in_firing_arc(origin, Facing::Up, Position::new(3, 3)));
        assert!(!in_firing_arc(origin, Facing::Up, Position::new(2, 1)));
        assert!(in_firing_arc(origin, Facing::Left, Position::new(-1, 2)));
        assert!(!in_firing_arc(origin, Facing::Right, Position::new(-1, 2)));
        assert!(in_firing_arc(origin, Facing::Down, Position::new(2, 0)));
    }

    #[test]
    fn ray_reaches_the_far_side_from_anywhere() {
        let area = Extents::spanning(Position::new(0, 0), Position::new(4, 2));
        let from_outside: Vec<_> = ray_ahead(area, Position::new(7, 1), Facing::Left).cells().collect();
        assert_eq!(from_outside.first(), Some(&Position::new(0, 1)));
        assert_eq!(from_outside.len(), 5);

        let inside: Vec<_> = ray_ahead(area, Position::new(1, 0), Facing::Up).cells().collect();
        assert_eq!(inside, [Position::new(1, 1), Position::new(1, 2)]);

        assert_eq!(ray_ahead(area, Position::new(9, 1), Facing::Right).cells().count(), 0);
        assert_eq!(ray_ahead(area, Position::new(i32::MAX, 1), Facing::Right).cells().count(), 0);
        assert_eq!(ray_ahead(area, Position::new(2, i32::MIN), Facing::Down).cells().count(), 0);
    }
}
