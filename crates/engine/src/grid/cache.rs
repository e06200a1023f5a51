use super::block::{AbilityKind, Block, BlockLayer};
use super::position::Position;
use indexmap::IndexSet;
use std::collections::HashMap;

/// What a cache bucket groups blocks by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Every block of one type id.
    Type(String),
    /// Every block with a given behaviour, whatever its type.
    Ability(AbilityKind),
    /// Blocks that keep the cells ahead of them clear.
    FrontBlocker,
}

/// Address of a stored block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub pos: Position,
    pub layer: BlockLayer,
}

impl BlockKey {
    pub fn of(block: &Block) -> Self {
        Self {
            pos: block.pos(),
            layer: block.layer(),
        }
    }
}

/// Live index from type, behaviour and front-blocking to the blocks that have
/// them, so "does this ship have a shield generator" never scans the grid.
#[derive(Debug, Default)]
pub struct TypeCache {
    buckets: HashMap<CacheKey, IndexSet<BlockKey>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys_for(block: &Block) -> impl Iterator<Item = CacheKey> + use<> {
        let block_type = block.block_type();
        let front = block_type.can_block_front.then_some(CacheKey::FrontBlocker);
        std::iter::once(CacheKey::Type(block_type.id.clone()))
            .chain(block_type.ability.map(CacheKey::Ability))
            .chain(front)
    }

    pub fn insert(&mut self, block: &Block) {
        let key = BlockKey::of(block);
        for bucket in Self::keys_for(block) {
            self.buckets.entry(bucket).or_default().insert(key);
        }
    }

    pub fn remove(&mut self, block: &Block) {
        let key = BlockKey::of(block);
        for bucket in Self::keys_for(block) {
            if let Some(set) = self.buckets.get_mut(&bucket) {
                set.swap_remove(&key);
            }
        }
    }

    /// Members of a bucket; the iterator borrows the cache but not `key`.
    pub fn get<'a>(&'a self, key: &CacheKey) -> impl Iterator<Item = BlockKey> + use<'a> {
        self.buckets.get(key).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn count(&self, key: &CacheKey) -> usize {
        self.buckets.get(key).map_or(0, IndexSet::len)
    }

    pub fn contains_any(&self, key: &CacheKey) -> bool {
        self.count(key) > 0
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
