pub mod block;
pub mod block_type;
pub mod cache;
pub mod chunk;
pub mod events;
pub mod facing;
pub mod position;
pub mod snapshot;

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use block::{AbilityKind, Block, BlockLayer, CollisionClass, ShipId};
use cache::{BlockKey, CacheKey, TypeCache};
use chunk::Chunk;
use events::{EventDispatcher, GridEvent, SubscriptionId};
use position::{ChunkCoord, ChunkLayout, Extents, Position};

/// A ship's two-layer block grid.
///
/// Each layer is a fixed array of lazily allocated chunks (see
/// [`ChunkLayout`]). Every write keeps the type cache in step with storage
/// and then notifies subscribers, synchronously, before returning.
#[derive(Debug)]
pub struct BlockGrid {
    layout: ChunkLayout,
    base: Vec<Option<Chunk>>,
    top: Vec<Option<Chunk>>,
    cache: TypeCache,
    events: EventDispatcher,
    owner: Option<ShipId>,
    /// Observed min/max of every cell ever filled; never shrinks.
    extents: Option<Extents>,
    base_count: usize,
    top_count: usize,
}

impl BlockGrid {
    pub fn new() -> Self {
        Self::with_layout(ChunkLayout::default())
    }

    pub fn with_config(config: &GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_layout(config.layout()?))
    }

    pub fn with_layout(layout: ChunkLayout) -> Self {
        let count = layout.chunk_count();
        Self {
            layout,
            base: (0..count).map(|_| None).collect(),
            top: (0..count).map(|_| None).collect(),
            cache: TypeCache::new(),
            events: EventDispatcher::new(),
            owner: None,
            extents: None,
            base_count: 0,
            top_count: 0,
        }
    }

    /// Stamp every block stored from now on with `ship`.
    pub fn owned_by(mut self, ship: ShipId) -> Self {
        self.owner = Some(ship);
        self
    }

    pub fn owner(&self) -> Option<ShipId> {
        self.owner
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    fn layer_chunks(&self, layer: BlockLayer) -> &[Option<Chunk>] {
        match layer {
            BlockLayer::Base => &self.base,
            BlockLayer::Top => &self.top,
        }
    }

    // ── Cell access ─────────────────────────────────────────────────────

    /// The block at `pos`, or `None` for empty cells, unallocated chunks
    /// and positions outside the grid.
    pub fn get(&self, pos: Position, layer: BlockLayer) -> Option<&Block> {
        let (coord, local) = self.layout.locate(pos)?;
        self.layer_chunks(layer)[self.layout.chunk_index(coord)]
            .as_ref()?
            .get(local)
    }

    /// Write a cell and return its previous occupant.
    ///
    /// Order of effects: chunk allocation, type cache update (old out, new
    /// in), then events: `ChunkCreated` for a new chunk, `BlockRemoved`
    /// and/or `BlockAdded`, and finally `BlockChanged`.
    pub fn set(
        &mut self,
        pos: Position,
        layer: BlockLayer,
        block: Option<Block>,
    ) -> Result<Option<Block>> {
        if let Some(new) = &block {
            if new.layer() != layer {
                return Err(GridError::LayerMismatch {
                    pos,
                    expected: layer,
                    found: new.layer(),
                });
            }
            if new.is_destroyed() {
                return Err(GridError::DestroyedBlock(pos));
            }
        }

        let Some((coord, local)) = self.layout.locate(pos) else {
            if block.is_none() {
                return Ok(None);
            }
            tracing::warn!("Rejected write outside the grid at ({}, {})", pos.x, pos.y);
            return Err(GridError::OutOfBounds(pos));
        };

        let owner = self.owner;
        let block = block.map(|mut b| {
            b.place(pos, owner);
            b
        });

        let size = self.layout.chunk_size();
        let index = self.layout.chunk_index(coord);
        let slot = match layer {
            BlockLayer::Base => &mut self.base[index],
            BlockLayer::Top => &mut self.top[index],
        };
        let created = slot.is_none();
        if created && block.is_none() {
            return Ok(None);
        }
        let chunk = slot.get_or_insert_with(|| Chunk::new(layer, coord, size));
        let old = chunk.set(local, block);
        let new = chunk.get(local).cloned();

        if let Some(old) = &old {
            self.cache.remove(old);
        }
        if let Some(new) = &new {
            self.cache.insert(new);
            match &mut self.extents {
                Some(extents) => extents.include(pos),
                None => self.extents = Some(Extents::around(pos)),
            }
        }
        let count = match layer {
            BlockLayer::Base => &mut self.base_count,
            BlockLayer::Top => &mut self.top_count,
        };
        match (old.is_some(), new.is_some()) {
            (false, true) => *count += 1,
            (true, false) => *count -= 1,
            _ => {}
        }

        if created {
            tracing::debug!(
                "Allocated {:?} chunk ({}, {}) for write at ({}, {})",
                layer, coord.x, coord.y, pos.x, pos.y
            );
            self.events.dispatch(&GridEvent::ChunkCreated { layer, coord });
        }
        if old.is_none() && new.is_none() {
            return Ok(None);
        }
        if self.events.is_empty() {
            return Ok(old);
        }
        if let Some(old) = &old {
            self.events.dispatch(&GridEvent::BlockRemoved(old.clone()));
        }
        if let Some(new) = &new {
            self.events.dispatch(&GridEvent::BlockAdded(new.clone()));
        }
        self.events.dispatch(&GridEvent::BlockChanged {
            new,
            old: old.clone(),
        });
        Ok(old)
    }

    /// Clear a cell. Never fails: clearing outside the grid is a no-op.
    pub fn remove(&mut self, pos: Position, layer: BlockLayer) -> Option<Block> {
        self.set(pos, layer, None).ok().flatten()
    }

    /// Update a stored block's health (clamped) and fire `BlockChanged`.
    /// Returns the new health, or `None` if the cell is empty.
    ///
    /// A block brought to zero stays in place; removing it is the caller's
    /// job.
    pub fn set_health(&mut self, pos: Position, layer: BlockLayer, health: f32) -> Option<f32> {
        let (coord, local) = self.layout.locate(pos)?;
        let index = self.layout.chunk_index(coord);
        let chunk = match layer {
            BlockLayer::Base => self.base[index].as_mut()?,
            BlockLayer::Top => self.top[index].as_mut()?,
        };
        let block = chunk.get_mut(local)?;
        let before = block.health();
        block.set_health(health);
        let after = block.health();
        if before != after && !self.events.is_empty() {
            let new = block.clone();
            let mut old = new.clone();
            old.set_health(before);
            self.events.dispatch(&GridEvent::BlockChanged {
                new: Some(new),
                old: Some(old),
            });
        }
        Some(after)
    }

    /// Both layers at `pos`, Base first.
    pub fn blocks_at(&self, pos: Position) -> impl Iterator<Item = &Block> {
        BlockLayer::ALL
            .into_iter()
            .filter_map(move |layer| self.get(pos, layer))
    }

    /// The Top block at `pos` if there is one, else the Base block.
    pub fn topmost(&self, pos: Position) -> Option<&Block> {
        self.get(pos, BlockLayer::Top)
            .or_else(|| self.get(pos, BlockLayer::Base))
    }

    // ── Neighbourhood queries ───────────────────────────────────────────

    pub fn neighbors(pos: Position) -> [Position; 4] {
        pos.neighbors()
    }

    pub fn neighbors_with_diagonal(pos: Position) -> [Position; 8] {
        pos.neighbors_with_diagonal()
    }

    /// Collision class of the Base block at `pos`.
    pub fn collision_class(&self, pos: Position) -> Option<CollisionClass> {
        self.get(pos, BlockLayer::Base).map(Block::collision)
    }

    /// Is `pos` an occupied cell with at least one neighbour that is empty
    /// or of a different collision class? Empty cells are never edges.
    pub fn is_edge(&self, pos: Position) -> bool {
        let Some(class) = self.collision_class(pos) else {
            return false;
        };
        pos.neighbors()
            .into_iter()
            .any(|n| self.collision_class(n) != Some(class))
    }

    /// Empty cells and floors can be walked through; walls cannot.
    pub fn is_passable(&self, pos: Position) -> bool {
        matches!(self.collision_class(pos), None | Some(CollisionClass::Floor))
    }

    // ── Type cache queries ──────────────────────────────────────────────

    /// Blocks in a cache bucket. Each call starts a fresh iteration.
    pub fn find<'a>(&'a self, key: &CacheKey) -> impl Iterator<Item = &'a Block> + use<'a> {
        self.cache
            .get(key)
            .filter_map(move |BlockKey { pos, layer }| self.get(pos, layer))
    }

    pub fn find_by_type<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Block> + use<'a> {
        self.find(&CacheKey::Type(id.to_string()))
    }

    pub fn find_by_ability(&self, kind: AbilityKind) -> impl Iterator<Item = &Block> {
        self.find(&CacheKey::Ability(kind))
    }

    /// Blocks that keep the cells ahead of them clear.
    pub fn front_blockers(&self) -> impl Iterator<Item = &Block> {
        self.find(&CacheKey::FrontBlocker)
    }

    pub fn has_type(&self, id: &str) -> bool {
        self.cache.contains_any(&CacheKey::Type(id.to_string()))
    }

    pub fn has_ability(&self, kind: AbilityKind) -> bool {
        self.cache.contains_any(&CacheKey::Ability(kind))
    }

    pub fn count_of(&self, key: &CacheKey) -> usize {
        self.cache.count(key)
    }

    // ── Bulk queries ────────────────────────────────────────────────────

    /// Allocated chunks, Base before Top at each chunk index.
    pub fn all_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.base
            .iter()
            .zip(self.top.iter())
            .flat_map(|(base, top)| base.iter().chain(top.iter()))
    }

    pub fn chunk(&self, layer: BlockLayer, coord: ChunkCoord) -> Option<&Chunk> {
        if coord.x >= self.layout.width_in_chunks() || coord.y >= self.layout.height_in_chunks() {
            return None;
        }
        self.layer_chunks(layer)[self.layout.chunk_index(coord)].as_ref()
    }

    pub fn chunk_count(&self) -> usize {
        self.all_chunks().count()
    }

    /// Every live block on both layers.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.all_chunks().flat_map(Chunk::blocks)
    }

    pub fn blocks_in(&self, layer: BlockLayer) -> impl Iterator<Item = &Block> {
        self.layer_chunks(layer)
            .iter()
            .flatten()
            .flat_map(Chunk::blocks)
    }

    /// Number of blocks on one layer.
    pub fn len(&self, layer: BlockLayer) -> usize {
        match layer {
            BlockLayer::Base => self.base_count,
            BlockLayer::Top => self.top_count,
        }
    }

    pub fn total_len(&self) -> usize {
        self.base_count + self.top_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Observed min/max of every filled cell; a single cell at the origin
    /// for a grid that has never held a block.
    pub fn extents(&self) -> Extents {
        self.extents.unwrap_or(Extents::around(Position::ZERO))
    }

    /// Outside the observed extents (always true for a grid never written).
    pub fn is_outside_bounds(&self, pos: Position) -> bool {
        self.extents.is_none_or(|extents| !extents.contains(pos))
    }

    pub fn total_mass(&self) -> f32 {
        self.all_blocks().map(Block::mass).sum()
    }

    /// Unweighted mean position of all blocks on both layers.
    pub fn centroid(&self) -> Option<(f32, f32)> {
        let count = self.total_len();
        if count == 0 {
            return None;
        }
        let (sx, sy) = self
            .all_blocks()
            .fold((0i64, 0i64), |(sx, sy), b| (sx + b.pos().x as i64, sy + b.pos().y as i64));
        Some((sx as f32 / count as f32, sy as f32 / count as f32))
    }

    /// Column that mirrored placement reflects around: the centroid's x,
    /// rounded. Zero for an empty grid.
    pub fn mirror_axis(&self) -> i32 {
        self.centroid().map_or(0, |(x, _)| x.round() as i32)
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Register a callback for every change to this grid. It runs inline,
    /// inside the write that triggered it.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }
}

impl Default for BlockGrid {
    fn default() -> Self {
        Self::new()
    }
}
