//! Host-side collaborators for blockform ship grids.
//!
//! The engine crate owns the grid itself; this crate owns ships and
//! everything around them: block content, damage, the fixed-rate
//! simulation loop, change broadcasting and JSON snapshots.

pub mod content;
pub mod damage;
pub mod event_bus;
pub mod fleet;
pub mod persistence;
pub mod simulation;
