//! A* search over a ship's grid.
//!
//! Steps are cardinal and cost 1; the heuristic is Manhattan distance.
//! Search is confined to the grid's observed extents padded by a margin,
//! so a walk may leave the hull briefly but can never wander off forever.

use crate::config::GridConfig;
use crate::grid::BlockGrid;
use crate::grid::position::{Extents, Position};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// An ordered walk from start to goal, both included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    positions: Vec<Position>,
}

impl Path {
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Position> {
        self.positions
    }

    /// Number of moves, one fewer than the cells visited.
    pub fn steps(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; a path holds at least its start.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn start(&self) -> Position {
        self.positions[0]
    }

    pub fn goal(&self) -> Position {
        self.positions[self.positions.len() - 1]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pathfinder {
    padding: i32,
}

impl Pathfinder {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            padding: config.path_padding,
        }
    }

    pub const fn with_padding(padding: i32) -> Self {
        Self { padding }
    }

    pub const fn padding(&self) -> i32 {
        self.padding
    }

    /// Region the search may expand into.
    pub fn search_area(&self, grid: &BlockGrid) -> Extents {
        grid.extents().padded(self.padding)
    }

    /// Shortest walk from `start` to `goal` through passable cells, or
    /// `None` if the goal cannot be reached.
    pub fn find_path(&self, grid: &BlockGrid, start: Position, goal: Position) -> Option<Path> {
        self.find_path_with(grid, start, goal, |pos| grid.is_passable(pos))
    }

    /// As [`find_path`](Self::find_path), with a caller-supplied test for
    /// which cells may be entered. The start cell is never tested.
    pub fn find_path_with<F>(
        &self,
        grid: &BlockGrid,
        start: Position,
        goal: Position,
        passable: F,
    ) -> Option<Path>
    where
        F: Fn(Position) -> bool,
    {
        if start == goal {
            return Some(Path {
                positions: vec![start],
            });
        }

        let area = self.search_area(grid);
        if !area.contains(goal) || !passable(goal) {
            return None;
        }

        // (f, h, insertion order, cell): lowest f wins, then the cell closer
        // to the goal, then whichever was queued first.
        let mut open = BinaryHeap::new();
        let mut g_score: HashMap<Position, u64> = HashMap::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut closed: HashSet<Position> = HashSet::new();
        let mut seq = 0u64;

        g_score.insert(start, 0);
        let h = start.manhattan(goal);
        open.push(Reverse((h, h, seq, start)));

        while let Some(Reverse((_, _, _, current))) = open.pop() {
            if current == goal {
                tracing::trace!(
                    "Path ({}, {}) -> ({}, {}) found after expanding {} cells",
                    start.x,
                    start.y,
                    goal.x,
                    goal.y,
                    closed.len()
                );
                return Some(Path {
                    positions: reconstruct(&came_from, current),
                });
            }
            if !closed.insert(current) {
                continue;
            }

            let g = g_score[&current];
            for next in current.neighbors() {
                if closed.contains(&next) || !area.contains(next) || !passable(next) {
                    continue;
                }
                let tentative = g + 1;
                if g_score.get(&next).is_some_and(|&known| known <= tentative) {
                    continue;
                }
                g_score.insert(next, tentative);
                came_from.insert(next, current);
                let h = next.manhattan(goal);
                seq += 1;
                open.push(Reverse((tentative + h, h, seq, next)));
            }
        }

        tracing::trace!(
            "No path ({}, {}) -> ({}, {}) after expanding {} cells",
            start.x,
            start.y,
            goal.x,
            goal.y,
            closed.len()
        );
        None
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(&GridConfig::default())
    }
}

fn reconstruct(came_from: &HashMap<Position, Position>, mut current: Position) -> Vec<Position> {
    let mut positions = vec![current];
    while let Some(&previous) = came_from.get(&current) {
        positions.push(previous);
        current = previous;
    }
    positions.reverse();
    positions
}
