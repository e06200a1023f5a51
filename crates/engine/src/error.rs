use crate::grid::block::BlockLayer;
use crate::grid::position::Position;

/// Failures surfaced by the grid, registry and configuration.
///
/// Lookups that simply find nothing (`get`, `find_by_type`, pathfinding)
/// return `Option` instead; these variants are for calls the caller got wrong.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("unknown block type `{0}` (was it registered?)")]
    UnknownBlockType(String),

    #[error("block type `{0}` is already registered")]
    DuplicateBlockType(String),

    #[error("{0} is not a valid facing (expected one of 2, -2, 1, -1)")]
    InvalidFacing(i8),

    #[error("block type `{id}` has an invalid footprint {width}x{height}")]
    InvalidFootprint { id: String, width: u32, height: u32 },

    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    #[error("cannot place a {found:?}-layer block into the {expected:?} layer at {pos}")]
    LayerMismatch {
        pos: Position,
        expected: BlockLayer,
        found: BlockLayer,
    },

    #[error("refusing to store a destroyed block at {0}")]
    DestroyedBlock(Position),

    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed content: {0}")]
    Content(#[from] serde_json::Error),
}

pub type Result<T, E = GridError> = std::result::Result<T, E>;
