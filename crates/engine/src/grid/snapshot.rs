//! Flat per-block records for external save formats.
//!
//! The grid does not read or write files. It hands out one [`BlockRecord`]
//! per live block and rebuilds itself from such records by replaying
//! ordinary `set` calls, so record order does not matter.

use super::BlockGrid;
use super::block::{Block, BlockLayer};
use super::block_type::BlockTypeRegistry;
use super::facing::Facing;
use super::position::Position;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Everything needed to recreate one placed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub type_id: String,
    pub x: i32,
    pub y: i32,
    pub layer: BlockLayer,
    pub facing: Facing,
    pub health: f32,
}

impl BlockRecord {
    pub fn of(block: &Block) -> Self {
        Self {
            type_id: block.type_id().to_string(),
            x: block.pos().x,
            y: block.pos().y,
            layer: block.layer(),
            facing: block.facing,
            health: block.health(),
        }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl BlockGrid {
    /// One record per live block, sorted by layer then position.
    pub fn records(&self) -> Vec<BlockRecord> {
        let mut records: Vec<BlockRecord> = self.all_blocks().map(BlockRecord::of).collect();
        records.sort_by_key(|r| (r.layer, r.pos()));
        records
    }

    /// Replay `records` into this grid. Stops at the first record whose type
    /// is unknown or that cannot be stored; returns the number written.
    pub fn restore<'r>(
        &mut self,
        registry: &BlockTypeRegistry,
        records: impl IntoIterator<Item = &'r BlockRecord>,
    ) -> Result<usize> {
        let mut written = 0;
        for record in records {
            let block = registry
                .block(&record.type_id)?
                .with_facing(record.facing)
                .with_health(record.health);
            self.set(record.pos(), record.layer, Some(block))?;
            written += 1;
        }
        tracing::debug!("Restored {} blocks into grid", written);
        Ok(written)
    }
}
