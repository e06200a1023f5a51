use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Cell coordinate on a ship grid. `(0, 0)` is the ship's origin block;
/// coordinates extend in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ZERO: Position = Position::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four cardinal neighbors (-x, +x, -y, +y).
    pub const fn neighbors(&self) -> [Position; 4] {
        [
            Self::new(self.x - 1, self.y),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y - 1),
            Self::new(self.x, self.y + 1),
        ]
    }

    /// Cardinal neighbors followed by the four diagonals.
    pub const fn neighbors_with_diagonal(&self) -> [Position; 8] {
        [
            Self::new(self.x - 1, self.y),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y - 1),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y - 1),
            Self::new(self.x - 1, self.y + 1),
            Self::new(self.x + 1, self.y - 1),
            Self::new(self.x + 1, self.y + 1),
        ]
    }

    /// Widened so that opposite corners of the `i32` plane still fit.
    pub const fn manhattan(&self, other: Position) -> u64 {
        self.x.abs_diff(other.x) as u64 + self.y.abs_diff(other.y) as u64
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Index of a chunk inside a layer's chunk array (always non-negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: u32,
    pub y: u32,
}

impl ChunkCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Cell position local to a chunk (each axis in `0..chunk_size`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: u32,
    pub y: u32,
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extents {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Extents {
    /// A single-cell rectangle.
    pub const fn around(pos: Position) -> Self {
        Self {
            min_x: pos.x,
            min_y: pos.y,
            max_x: pos.x,
            max_y: pos.y,
        }
    }

    /// The rectangle with `a` and `b` as opposite corners, in any order.
    pub fn spanning(a: Position, b: Position) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn include(&mut self, pos: Position) {
        self.min_x = self.min_x.min(pos.x);
        self.min_y = self.min_y.min(pos.y);
        self.max_x = self.max_x.max(pos.x);
        self.max_y = self.max_y.max(pos.y);
    }

    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }

    pub const fn padded(&self, by: i32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(by),
            min_y: self.min_y.saturating_sub(by),
            max_x: self.max_x.saturating_add(by),
            max_y: self.max_y.saturating_add(by),
        }
    }

    pub const fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub const fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    /// Every cell, row by row from the minimum corner.
    pub fn cells(&self) -> impl Iterator<Item = Position> + use<> {
        let Extents { min_x, min_y, max_x, max_y } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| Position::new(x, y)))
    }
}

/// Maps grid positions onto a fixed array of chunks.
///
/// The array is `width_in_chunks` x `height_in_chunks` chunks of
/// `chunk_size` cells each. Grid `(0, 0)` sits at the first cell of the
/// center chunk, so negative and positive coordinates both land on
/// non-negative array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_size: u32,
    width_in_chunks: u32,
    height_in_chunks: u32,
}

impl ChunkLayout {
    /// Fails on a zero size, or on a grid wider than a position can address.
    pub fn new(chunk_size: u32, width_in_chunks: u32, height_in_chunks: u32) -> Result<Self> {
        if chunk_size == 0 || width_in_chunks == 0 || height_in_chunks == 0 {
            return Err(GridError::InvalidConfig(format!(
                "chunk dimensions must be non-zero (got {chunk_size} cells, \
                 {width_in_chunks}x{height_in_chunks} chunks)"
            )));
        }
        let cells = chunk_size as u64 * width_in_chunks.max(height_in_chunks) as u64;
        if cells > i32::MAX as u64 {
            return Err(GridError::InvalidConfig(format!(
                "grid spans {cells} cells per axis, more than a position can address"
            )));
        }
        Ok(Self::unchecked(chunk_size, width_in_chunks, height_in_chunks))
    }

    const fn unchecked(chunk_size: u32, width_in_chunks: u32, height_in_chunks: u32) -> Self {
        Self {
            chunk_size,
            width_in_chunks,
            height_in_chunks,
        }
    }

    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub const fn width_in_chunks(&self) -> u32 {
        self.width_in_chunks
    }

    pub const fn height_in_chunks(&self) -> u32 {
        self.height_in_chunks
    }

    pub const fn chunk_count(&self) -> usize {
        self.width_in_chunks as usize * self.height_in_chunks as usize
    }

    const fn center_x(&self) -> i64 {
        (self.width_in_chunks / 2) as i64 * self.chunk_size as i64
    }

    const fn center_y(&self) -> i64 {
        (self.height_in_chunks / 2) as i64 * self.chunk_size as i64
    }

    /// The chunk and local cell holding `pos`, or `None` outside the array.
    pub const fn locate(&self, pos: Position) -> Option<(ChunkCoord, LocalPos)> {
        let size = self.chunk_size as i64;
        let true_x = self.center_x() + pos.x as i64;
        let true_y = self.center_y() + pos.y as i64;
        if true_x < 0
            || true_y < 0
            || true_x >= size * self.width_in_chunks as i64
            || true_y >= size * self.height_in_chunks as i64
        {
            return None;
        }
        Some((
            ChunkCoord::new((true_x / size) as u32, (true_y / size) as u32),
            LocalPos {
                x: (true_x % size) as u32,
                y: (true_y % size) as u32,
            },
        ))
    }

    /// Inverse of [`locate`](Self::locate).
    pub const fn to_position(&self, coord: ChunkCoord, local: LocalPos) -> Position {
        let size = self.chunk_size as i64;
        Position::new(
            (coord.x as i64 * size + local.x as i64 - self.center_x()) as i32,
            (coord.y as i64 * size + local.y as i64 - self.center_y()) as i32,
        )
    }

    /// Flat index of a chunk in a layer array.
    pub const fn chunk_index(&self, coord: ChunkCoord) -> usize {
        coord.y as usize * self.width_in_chunks as usize + coord.x as usize
    }

    /// Every position a grid with this layout can store.
    pub const fn bounds(&self) -> Extents {
        let lo = self.to_position(ChunkCoord::new(0, 0), LocalPos { x: 0, y: 0 });
        let last = self.chunk_size - 1;
        let hi = self.to_position(
            ChunkCoord::new(self.width_in_chunks - 1, self.height_in_chunks - 1),
            LocalPos { x: last, y: last },
        );
        Extents {
            min_x: lo.x,
            min_y: lo.y,
            max_x: hi.x,
            max_y: hi.y,
        }
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self::unchecked(32, 16, 16)
    }
}
