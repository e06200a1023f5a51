use super::block::{Block, BlockLayer};
use super::position::{ChunkCoord, LocalPos};

/// A square tile of cells for one layer.
///
/// Stored as a flat row-major array. Chunks are allocated the first time a
/// block is written into their range and are never freed afterwards.
#[derive(Debug, Clone)]
pub struct Chunk {
    layer: BlockLayer,
    coord: ChunkCoord,
    size: u32,
    cells: Box<[Option<Block>]>,
    occupied: usize,
}

impl Chunk {
    pub fn new(layer: BlockLayer, coord: ChunkCoord, size: u32) -> Self {
        let volume = size as usize * size as usize;
        Self {
            layer,
            coord,
            size,
            cells: (0..volume).map(|_| None).collect(),
            occupied: 0,
        }
    }

    #[inline]
    const fn index(&self, local: LocalPos) -> usize {
        local.y as usize * self.size as usize + local.x as usize
    }

    #[inline]
    pub fn get(&self, local: LocalPos) -> Option<&Block> {
        self.cells[self.index(local)].as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, local: LocalPos) -> Option<&mut Block> {
        let index = self.index(local);
        self.cells[index].as_mut()
    }

    /// Store `block` in a cell and return whatever was there.
    pub fn set(&mut self, local: LocalPos, block: Option<Block>) -> Option<Block> {
        let index = self.index(local);
        let filled = block.is_some();
        let old = std::mem::replace(&mut self.cells[index], block);
        match (old.is_some(), filled) {
            (false, true) => self.occupied += 1,
            (true, false) => self.occupied -= 1,
            _ => {}
        }
        old
    }

    pub fn layer(&self) -> BlockLayer {
        self.layer
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().flatten()
    }
}
