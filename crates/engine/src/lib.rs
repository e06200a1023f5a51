//! Two-layer chunked block grids for modular ships.
//!
//! - [`grid`]: storage. A [`BlockGrid`] holds a Base (structure) and a Top
//!   (equipment) layer of lazily allocated chunks, keeps a type cache in
//!   step with every write, and notifies subscribers synchronously.
//! - [`integrity`]: notices when removals cut a ship in two and discards
//!   the smaller piece.
//! - [`pathfinding`]: A* over passable cells.
//! - [`placement`]: pure rules deciding whether a planned block may go into
//!   a blueprint.
//!
//! Everything runs on the caller's thread; nothing here blocks or spawns.

pub mod config;
pub mod error;
pub mod grid;
pub mod integrity;
pub mod pathfinding;
pub mod placement;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use grid::BlockGrid;
pub use grid::block::{Ability, AbilityKind, Block, BlockLayer, CollisionClass, ShipId};
pub use grid::block_type::{BlockType, BlockTypeRegistry};
pub use grid::cache::CacheKey;
pub use grid::events::{GridEvent, SubscriptionId};
pub use grid::facing::Facing;
pub use grid::position::{ChunkCoord, ChunkLayout, Extents, LocalPos, Position};
pub use grid::snapshot::BlockRecord;
pub use integrity::{BreakReport, IntegrityChecker};
pub use pathfinding::{Path, Pathfinder};
pub use placement::{Candidate, PlacementContext, PlacementValidator, Rejection, RuleSet};
