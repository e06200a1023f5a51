use crate::grid::position::{Extents, Position};

/// Reflect `pos` across the column `axis`. A cell `d` columns right of the
/// axis lands `d` columns left of it; rows are unchanged.
pub const fn mirror_position(pos: Position, axis: i32) -> Position {
    Position::new(axis + (axis - pos.x), pos.y)
}

/// The rectangle covering the mirror images of every cell in `extents`.
pub fn mirror_extents(extents: Extents, axis: i32) -> Extents {
    Extents::spanning(
        mirror_position(Position::new(extents.min_x, extents.min_y), axis),
        mirror_position(Position::new(extents.max_x, extents.max_y), axis),
    )
}
