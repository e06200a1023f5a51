//! Structural integrity: detecting when a ship has been cut in two.
//!
//! Removing a Base block queues its four neighbours. A periodic check then
//! drains the queue, flood-filling from each queued cell:
//!
//! - a fill covering every Base block means the ship is whole, and the rest
//!   of the queue is dropped;
//! - a fill smaller than half the Base blocks is a fragment that has broken
//!   off, and every block in it (with whatever is mounted on top) is removed;
//! - anything else is taken to be the main body; its cells leave the queue.
//!
//! This resolves one split into two pieces per removal. A cut that leaves
//! three or more pieces can keep more than the largest one, and an exact
//! half/half split keeps both halves. Both are long-standing game behaviour.

use crate::config::GridConfig;
use crate::grid::BlockGrid;
use crate::grid::block::{Block, BlockLayer};
use crate::grid::events::{GridEvent, SubscriptionId};
use crate::grid::position::Position;
use dashmap::DashSet;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of one pass over the pending queue.
#[derive(Debug, Default)]
pub struct BreakReport {
    /// Flood fills run.
    pub checks: usize,
    /// Blocks removed because their fragment broke away, Base before Top
    /// for each cell.
    pub discarded: Vec<Block>,
}

impl BreakReport {
    pub fn is_quiet(&self) -> bool {
        self.discarded.is_empty()
    }
}

/// Watches one grid for Base removals and resolves fragmentation on a timer.
///
/// The pending set is shared with a grid subscriber, which fills it as
/// blocks disappear.
#[derive(Debug)]
pub struct IntegrityChecker {
    pending: Arc<DashSet<Position>>,
    /// Set while a fragment is being discarded so its removals do not queue
    /// further checks.
    cascading: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
    interval: f32,
    elapsed: f32,
}

impl IntegrityChecker {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            pending: Arc::new(DashSet::new()),
            cascading: Arc::new(AtomicBool::new(false)),
            subscription: None,
            interval: config.break_check_interval,
            elapsed: 0.0,
        }
    }

    /// Start listening to `grid`'s removals. Attaching twice is a no-op.
    pub fn attach(&mut self, grid: &mut BlockGrid) {
        if self.subscription.is_some() {
            return;
        }
        let pending = Arc::clone(&self.pending);
        let cascading = Arc::clone(&self.cascading);
        let id = grid.subscribe(move |event| {
            let GridEvent::BlockRemoved(block) = event else {
                return;
            };
            if block.layer() != BlockLayer::Base {
                return;
            }
            pending.remove(&block.pos());
            if !cascading.load(Ordering::Relaxed) {
                for neighbor in block.pos().neighbors() {
                    pending.insert(neighbor);
                }
            }
        });
        self.subscription = Some(id);
    }

    pub fn detach(&mut self, grid: &mut BlockGrid) {
        if let Some(id) = self.subscription.take() {
            grid.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Queue a cell for the next check.
    pub fn schedule(&self, pos: Position) {
        self.pending.insert(pos);
    }

    pub fn is_pending(&self, pos: Position) -> bool {
        self.pending.contains(&pos)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Advance the check timer by `dt` simulated seconds and run a check
    /// when the interval has elapsed.
    pub fn tick(&mut self, grid: &mut BlockGrid, dt: f32) -> Option<BreakReport> {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return None;
        }
        self.elapsed %= self.interval;
        Some(self.update_breaks(grid))
    }

    /// Drain the pending queue, discarding any fragment that has broken off.
    pub fn update_breaks(&mut self, grid: &mut BlockGrid) -> BreakReport {
        let mut report = BreakReport::default();
        // Neighbours are queued blind; only occupied cells need a fill.
        self.pending
            .retain(|pos| grid.get(*pos, BlockLayer::Base).is_some());

        while let Some(start) = self.next_pending() {
            self.pending.remove(&start);
            if grid.get(start, BlockLayer::Base).is_none() {
                continue;
            }

            report.checks += 1;
            let total = grid.len(BlockLayer::Base);
            let Some(fragment) = flood_fill(grid, start) else {
                continue;
            };

            if fragment.len() == total {
                self.pending.clear();
                break;
            }

            if (fragment.len() as f32) < total as f32 / 2.0 {
                tracing::info!(
                    "Fragment of {} blocks broke away at ({}, {}), {} Base blocks remain",
                    fragment.len(),
                    start.x,
                    start.y,
                    total - fragment.len()
                );
                report.discarded.extend(self.discard(grid, &fragment));
            } else {
                tracing::debug!(
                    "Fill from ({}, {}) reached {} of {} Base blocks; keeping it",
                    start.x,
                    start.y,
                    fragment.len(),
                    total
                );
                for pos in &fragment {
                    self.pending.remove(pos);
                }
            }
        }

        report
    }

    /// Remove a block. Removing a Base block also removes the Top block on
    /// it, and queues its neighbours for the next check.
    pub fn break_block(&self, grid: &mut BlockGrid, pos: Position, layer: BlockLayer) -> Vec<Block> {
        let mut removed = Vec::new();
        removed.extend(grid.remove(pos, layer));
        if layer == BlockLayer::Base {
            removed.extend(grid.remove(pos, BlockLayer::Top));
        }
        removed
    }

    fn discard(&self, grid: &mut BlockGrid, fragment: &HashSet<Position>) -> Vec<Block> {
        let mut cells: Vec<Position> = fragment.iter().copied().collect();
        cells.sort();
        self.cascading.store(true, Ordering::Relaxed);
        let removed = cells
            .into_iter()
            .flat_map(|pos| self.break_block(grid, pos, BlockLayer::Base))
            .collect();
        self.cascading.store(false, Ordering::Relaxed);
        removed
    }

    /// Smallest queued position, so drains are reproducible.
    fn next_pending(&self) -> Option<Position> {
        self.pending.iter().map(|entry| *entry).min()
    }
}

/// The 4-connected set of occupied Base cells containing `start` (empty if
/// `start` itself is empty).
///
/// Returns `None` only if the fill grows past the grid's Base block count,
/// which means the grid's bookkeeping is broken. Debug builds panic.
pub fn flood_fill(grid: &BlockGrid, start: Position) -> Option<HashSet<Position>> {
    let mut visited = HashSet::new();
    if grid.get(start, BlockLayer::Base).is_none() {
        return Some(visited);
    }

    let limit = grid.len(BlockLayer::Base);
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(pos) = queue.pop_front() {
        for neighbor in pos.neighbors() {
            if visited.contains(&neighbor) || grid.get(neighbor, BlockLayer::Base).is_none() {
                continue;
            }
            visited.insert(neighbor);
            debug_assert!(
                visited.len() <= limit,
                "flood fill from {start:?} exceeded the {limit} Base blocks in the grid"
            );
            if visited.len() > limit {
                tracing::error!(
                    "Flood fill from ({}, {}) exceeded {} Base blocks; abandoning check",
                    start.x,
                    start.y,
                    limit
                );
                return None;
            }
            queue.push_back(neighbor);
        }
    }

    Some(visited)
}
