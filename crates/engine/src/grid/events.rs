use super::block::{Block, BlockLayer};
use super::position::{ChunkCoord, Position};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle returned by `BlockGrid::subscribe`, used to unsubscribe.
    pub struct SubscriptionId;
}

/// A change to a grid, delivered synchronously to every subscriber.
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// First write into a chunk; fired before that write's block events.
    ChunkCreated { layer: BlockLayer, coord: ChunkCoord },
    BlockAdded(Block),
    BlockRemoved(Block),
    /// Fired last for every write that changed a cell, and for health updates.
    BlockChanged {
        new: Option<Block>,
        old: Option<Block>,
    },
}

impl GridEvent {
    /// The cell this event concerns (none for chunk events).
    pub fn position(&self) -> Option<Position> {
        match self {
            GridEvent::ChunkCreated { .. } => None,
            GridEvent::BlockAdded(block) | GridEvent::BlockRemoved(block) => Some(block.pos()),
            GridEvent::BlockChanged { new, old } => new.as_ref().or(old.as_ref()).map(Block::pos),
        }
    }

    pub fn layer(&self) -> BlockLayer {
        match self {
            GridEvent::ChunkCreated { layer, .. } => *layer,
            GridEvent::BlockAdded(block) | GridEvent::BlockRemoved(block) => block.layer(),
            GridEvent::BlockChanged { new, old } => new
                .as_ref()
                .or(old.as_ref())
                .map_or(BlockLayer::Base, Block::layer),
        }
    }
}

/// A subscriber only sees the event, never the grid, so it cannot write back
/// into the grid while the write that fired it is still in progress.
pub type Subscriber = Box<dyn FnMut(&GridEvent) + Send + Sync>;

/// Subscriber list owned by a grid.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: SlotMap<SubscriptionId, Subscriber>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + Send + Sync + 'static,
    {
        self.subscribers.insert(Box::new(subscriber))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    /// Call every subscriber, inline, before returning.
    pub fn dispatch(&mut self, event: &GridEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
