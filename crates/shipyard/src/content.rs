//! Standard block content and the demo hull.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use blockform_engine::{BlockRecord, BlockTypeRegistry, Facing, Position};

/// Bundled block type definitions.
pub const STANDARD_BLOCKS: &str = include_str!("../assets/blocks.json");

/// The cell joining the corvette's nose to its deck. Breaking it cuts the
/// nose loose.
pub const CORVETTE_NECK: Position = Position::new(5, 0);

/// Registry holding the bundled block types.
pub fn standard_registry() -> Result<BlockTypeRegistry> {
    BlockTypeRegistry::from_json(STANDARD_BLOCKS).context("parsing bundled block types")
}

/// Registry loaded from a JSON file of block type definitions.
pub fn load_registry(path: &Path) -> Result<BlockTypeRegistry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading block types from {}", path.display()))?;
    BlockTypeRegistry::from_json(&text)
        .with_context(|| format!("parsing block types from {}", path.display()))
}

/// A small warship: a walled 7x5 deck with a two-cell nose on a neck at
/// [`CORVETTE_NECK`], a console, a shield generator, gravity, two
/// thrusters aft and a laser on the nose. Every block is at full health.
pub fn corvette(registry: &BlockTypeRegistry) -> Result<Vec<BlockRecord>> {
    let mut layout: Vec<(&str, i32, i32, Facing)> = Vec::new();
    for x in -4i32..=4 {
        for y in -3i32..=3 {
            let perimeter = x.abs() == 4 || y.abs() == 3;
            layout.push((if perimeter { "hull" } else { "floor" }, x, y, Facing::Up));
        }
    }
    layout.extend([
        ("floor", CORVETTE_NECK.x, CORVETTE_NECK.y, Facing::Up),
        ("wall", 6, 0, Facing::Up),
        ("hull", 7, 0, Facing::Up),
        ("console", 0, 0, Facing::Right),
        ("shieldgen", -2, -2, Facing::Up),
        ("gravgen", 2, 2, Facing::Up),
        ("thruster", -4, -1, Facing::Left),
        ("thruster", -4, 1, Facing::Left),
        ("laser", 7, 0, Facing::Right),
    ]);

    layout
        .into_iter()
        .map(|(id, x, y, facing)| {
            let block_type = registry.get(id).context("corvette uses an unregistered block type")?;
            Ok(BlockRecord {
                type_id: block_type.id.clone(),
                x,
                y,
                layer: block_type.layer,
                facing,
                health: block_type.max_health,
            })
        })
        .collect()
}
