//! Ship snapshots as JSON files.
//!
//! A snapshot holds a ship's name plus one [`BlockRecord`] per block for its
//! live grid and its blueprint. Loading replays the records through the
//! grid's ordinary writes, so a hand-edited file in any order loads the
//! same ship.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use blockform_engine::{BlockRecord, BlockTypeRegistry, ShipId};
use serde::{Deserialize, Serialize};

use crate::fleet::{Fleet, Ship};

/// Version written into every snapshot.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShipSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    pub name: String,
    pub blocks: Vec<BlockRecord>,
    #[serde(default)]
    pub blueprint: Vec<BlockRecord>,
}

fn current_version() -> u32 {
    FORMAT_VERSION
}

impl ShipSnapshot {
    pub fn of(ship: &Ship) -> Self {
        Self {
            version: FORMAT_VERSION,
            name: ship.name().to_string(),
            blocks: ship.grid().records(),
            blueprint: ship.blueprint().records(),
        }
    }
}

// ── Save ─────────────────────────────────────────────────────────────────────

/// Write `ship` to `path`, creating parent directories as needed. Returns
/// the number of live blocks written.
pub fn save_ship(ship: &Ship, path: &Path) -> Result<usize> {
    let start = Instant::now();
    let snapshot = ShipSnapshot::of(ship);
    let json = serde_json::to_string_pretty(&snapshot)
        .with_context(|| format!("serializing ship '{}'", ship.name()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))?;

    tracing::info!(
        "Ship '{}' saved: {} blocks, {} planned ({:.2?})",
        snapshot.name,
        snapshot.blocks.len(),
        snapshot.blueprint.len(),
        start.elapsed(),
    );
    Ok(snapshot.blocks.len())
}

// ── Load ─────────────────────────────────────────────────────────────────────

/// Read a snapshot file without building anything.
///
/// Returns `None` if the file does not exist.
pub fn read_snapshot(path: &Path) -> Result<Option<ShipSnapshot>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: ShipSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    if snapshot.version > FORMAT_VERSION {
        anyhow::bail!(
            "snapshot {} has format version {}, newest supported is {}",
            path.display(),
            snapshot.version,
            FORMAT_VERSION
        );
    }
    Ok(Some(snapshot))
}

/// Add the ship described by `snapshot` to `fleet`.
pub fn spawn_snapshot(
    fleet: &mut Fleet,
    registry: &BlockTypeRegistry,
    snapshot: &ShipSnapshot,
) -> Result<ShipId> {
    let id = fleet
        .spawn_from_records(snapshot.name.clone(), registry, &snapshot.blocks)
        .with_context(|| format!("rebuilding ship '{}'", snapshot.name))?;
    let restored = match fleet.get_mut(id) {
        Some(ship) => ship.blueprint_mut().restore(registry, &snapshot.blueprint),
        None => Ok(0),
    };
    if let Err(err) = restored {
        fleet.remove(id);
        return Err(err).with_context(|| format!("rebuilding blueprint of '{}'", snapshot.name));
    }
    Ok(id)
}

/// Load a ship from `path` into `fleet`.
///
/// Returns `None` if the file does not exist.
pub fn load_ship(fleet: &mut Fleet, registry: &BlockTypeRegistry, path: &Path) -> Result<Option<ShipId>> {
    let start = Instant::now();
    let Some(snapshot) = read_snapshot(path)? else {
        return Ok(None);
    };
    let id = spawn_snapshot(fleet, registry, &snapshot)?;
    tracing::info!(
        "Ship '{}' loaded: {} blocks from {} ({:.2?})",
        snapshot.name,
        snapshot.blocks.len(),
        path.display(),
        start.elapsed(),
    );
    Ok(Some(id))
}

// ── Tests ────────────────────────────────────────────────────────────────────
