//! Grid-change distribution.
//!
//! Each ship's grid feeds a [`ChangeJournal`] through an ordinary grid
//! subscription. Once per simulation tick the journals are drained into
//! [`GridChangeBatch`]es and published on a shared `tokio::sync::broadcast`
//! channel for whoever renders, syncs or records the fleet.

use std::sync::{Arc, Mutex, PoisonError};

use blockform_engine::{BlockGrid, BlockLayer, BlockRecord, GridEvent, Position, ShipId};

/// Recommended capacity for the broadcast channel.
pub const BUS_CAPACITY: usize = 256;

/// One cell's new state. `block` is `None` when the cell was cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockChange {
    pub pos: Position,
    pub layer: BlockLayer,
    pub block: Option<BlockRecord>,
}

/// Every change one ship's grid saw during a tick, oldest first.
///
/// Uses `Arc<[...]>` so cloning per broadcast subscriber is just a refcount bump.
#[derive(Clone, Debug)]
pub struct GridChangeBatch {
    pub ship: ShipId,
    pub changes: Arc<[BlockChange]>,
}

/// Shared buffer of changes, filled by a grid subscriber.
#[derive(Clone, Debug, Default)]
pub struct ChangeJournal {
    entries: Arc<Mutex<Vec<BlockChange>>>,
}

impl ChangeJournal {
    /// Subscribe a new journal to `grid`.
    pub fn attach(grid: &mut BlockGrid) -> Self {
        let journal = Self::default();
        let entries = Arc::clone(&journal.entries);
        grid.subscribe(move |event| {
            let GridEvent::BlockChanged { new, .. } = event else {
                return;
            };
            let Some(pos) = event.position() else {
                return;
            };
            let change = BlockChange {
                pos,
                layer: event.layer(),
                block: new.as_ref().map(BlockRecord::of),
            };
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(change);
        });
        journal
    }

    /// Take every change recorded so far.
    pub fn drain(&self) -> Vec<BlockChange> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
