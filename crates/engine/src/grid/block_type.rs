use super::block::{AbilityKind, Block, BlockLayer, CollisionClass};
use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable definition of a kind of block, identified by `id`.
///
/// Types are shared as `Arc<BlockType>` once registered; every placed
/// [`Block`] points at its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    pub id: String,
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "one")]
    pub height: u32,
    /// Added to the ship's total mass for every placed block.
    #[serde(default)]
    pub mass: f32,
    #[serde(default = "full_health")]
    pub max_health: f32,
    /// Damage soaked up when a hit carries through this block to the one
    /// beneath it.
    #[serde(default)]
    pub damage_buffer: f32,
    pub layer: BlockLayer,
    #[serde(default)]
    pub collision: CollisionClass,
    #[serde(default)]
    pub ability: Option<AbilityKind>,
    #[serde(default)]
    pub can_rotate: bool,
    #[serde(default)]
    pub can_fit_inside_wall: bool,
    #[serde(default)]
    pub can_block_sight: bool,
    /// Needs a clear line of fire and keeps the cells ahead of it clear.
    #[serde(default)]
    pub can_block_front: bool,
    #[serde(default)]
    pub is_complex_block: bool,
    /// Only works with a crewed console attached.
    #[serde(default)]
    pub needs_crew: bool,
}

fn one() -> u32 {
    1
}

fn full_health() -> f32 {
    1.0
}

impl BlockType {
    /// A 1x1 type with unit health and no capabilities.
    pub fn new(id: impl Into<String>, layer: BlockLayer) -> Self {
        Self {
            id: id.into(),
            width: 1,
            height: 1,
            mass: 0.0,
            max_health: full_health(),
            damage_buffer: 0.0,
            layer,
            collision: CollisionClass::default(),
            ability: None,
            can_rotate: false,
            can_fit_inside_wall: false,
            can_block_sight: false,
            can_block_front: false,
            is_complex_block: false,
            needs_crew: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_health(mut self, max_health: f32, damage_buffer: f32) -> Self {
        self.max_health = max_health;
        self.damage_buffer = damage_buffer;
        self
    }

    pub fn with_collision(mut self, collision: CollisionClass) -> Self {
        self.collision = collision;
        self
    }

    /// Attaches a behaviour; the type becomes a complex block.
    pub fn with_ability(mut self, ability: AbilityKind) -> Self {
        self.ability = Some(ability);
        self.is_complex_block = true;
        self
    }

    pub fn rotatable(mut self) -> Self {
        self.can_rotate = true;
        self
    }

    pub fn fits_inside_wall(mut self) -> Self {
        self.can_fit_inside_wall = true;
        self
    }

    pub fn blocks_sight(mut self) -> Self {
        self.can_block_sight = true;
        self
    }

    pub fn blocks_front(mut self) -> Self {
        self.can_block_front = true;
        self
    }

    pub fn requiring_crew(mut self) -> Self {
        self.needs_crew = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GridError::InvalidFootprint {
                id: self.id.clone(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Catalog of block types by id.
///
/// Built once at startup and handed to whatever needs to turn ids into
/// types. Tests build their own.
#[derive(Debug, Default)]
pub struct BlockTypeRegistry {
    by_id: HashMap<String, Arc<BlockType>>,
    all: Vec<Arc<BlockType>>,
}

impl BlockTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of type definitions and register each of them.
    pub fn from_json(text: &str) -> Result<Self> {
        let types: Vec<BlockType> = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for block_type in types {
            registry.register(block_type)?;
        }
        Ok(registry)
    }

    /// Add a type. A type with an ability is always a complex block,
    /// however it was built.
    pub fn register(&mut self, mut block_type: BlockType) -> Result<Arc<BlockType>> {
        block_type.validate()?;
        if block_type.ability.is_some() {
            block_type.is_complex_block = true;
        }
        if self.by_id.contains_key(&block_type.id) {
            return Err(GridError::DuplicateBlockType(block_type.id));
        }
        let block_type = Arc::new(block_type);
        self.by_id.insert(block_type.id.clone(), Arc::clone(&block_type));
        self.all.push(Arc::clone(&block_type));
        tracing::debug!("Registered block type '{}'", block_type.id);
        Ok(block_type)
    }

    /// Look up a type. An unknown id is a content bug, so it is an error
    /// rather than a `None`.
    pub fn get(&self, id: &str) -> Result<Arc<BlockType>> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| GridError::UnknownBlockType(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// A fresh, undamaged block of type `id`.
    pub fn block(&self, id: &str) -> Result<Block> {
        Ok(Block::new(self.get(id)?))
    }

    /// Types in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<BlockType>> {
        self.all.iter()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
