use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use blockform_engine::placement::drag::{adjoining_block, facing_from_adjoining};
use blockform_engine::{
    BlockLayer, BlockRecord, BlockTypeRegistry, Candidate, GridConfig, Pathfinder,
    PlacementContext, PlacementValidator, Position, ShipId,
};
use blockform_shipyard::content::{self, CORVETTE_NECK};
use blockform_shipyard::damage;
use blockform_shipyard::event_bus::{self, GridChangeBatch};
use blockform_shipyard::fleet::Fleet;
use blockform_shipyard::persistence;
use blockform_shipyard::simulation::{self, Bombardment, SimulationLayer};
use tokio::sync::{Mutex, broadcast};

/// Default number of simulation ticks outside demo mode.
const DEFAULT_TICKS: u64 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .map(Into::into);
    let snapshot_path: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--snapshot")
        .nth(1)
        .map(Into::into);
    let ticks: u64 = std::env::args()
        .skip_while(|a| a != "--ticks")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match &config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GridConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GridConfig::default(),
    };
    let registry = content::standard_registry()?;
    tracing::info!("Loaded {} block types", registry.len());

    let mut fleet = Fleet::new(config).context("invalid grid configuration")?;

    if demo_mode {
        let id = fleet.spawn_from_records("Corvette", &registry, &content::corvette(&registry)?)?;
        run_demo(&mut fleet, &registry, id);
        if let (Some(path), Some(ship)) = (&snapshot_path, fleet.get(id)) {
            persistence::save_ship(ship, path)?;
        }
        return Ok(());
    }

    // ── Load the ship, or start from the standard hull ───────────────────
    let loaded = match &snapshot_path {
        Some(path) => persistence::load_ship(&mut fleet, &registry, path)?,
        None => None,
    };
    let id = match loaded {
        Some(id) => id,
        None => {
            tracing::info!("No saved ship found, launching a fresh corvette");
            fleet.spawn_from_records("Corvette", &registry, &content::corvette(&registry)?)?
        }
    };

    // ── Run the simulation, logging what the bus carries ────────────────
    let (bus_tx, mut bus_rx) = broadcast::channel::<GridChangeBatch>(event_bus::BUS_CAPACITY);
    tokio::spawn(async move {
        while let Ok(batch) = bus_rx.recv().await {
            tracing::debug!("{} grid changes published", batch.changes.len());
        }
    });

    let period = Duration::from_secs_f32(fleet.config().break_check_interval);
    let fleet = Arc::new(Mutex::new(fleet));
    let layers: Vec<Box<dyn SimulationLayer>> = vec![Box::new(Bombardment {
        damage: 1.5,
        every: 5,
    })];
    let sim = simulation::start(Arc::clone(&fleet), layers, bus_tx, period, Some(ticks));

    tokio::select! {
        ran = sim => {
            let ran = ran.context("simulation task failed")?;
            tracing::info!("Simulation finished after {} ticks", ran);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    // ── Save on shutdown ─────────────────────────────────────────────────
    let fleet = fleet.lock().await;
    match fleet.get(id) {
        Some(ship) => {
            let status = ship.status();
            tracing::info!(
                "'{}': {} Base / {} Top blocks, mass {:.1}, shields {}",
                ship.name(),
                status.base_blocks,
                status.top_blocks,
                status.mass,
                if status.shields { "up" } else { "down" }
            );
            if let Some(path) = &snapshot_path {
                persistence::save_ship(ship, path)?;
            }
        }
        None => tracing::info!("The ship did not survive"),
    }
    Ok(())
}

/// Scripted walkthrough: cut the corvette's nose off, walk its deck, and
/// plan an extension in the blueprint.
fn run_demo(fleet: &mut Fleet, registry: &BlockTypeRegistry, id: ShipId) {
    let pathfinder = Pathfinder::new(fleet.config());
    let Some(ship) = fleet.get_mut(id) else {
        return;
    };
    tracing::info!("Blockform demo: '{}' with {} blocks", ship.name(), ship.grid().total_len());
    tracing::info!("Status before damage: {:?}", ship.status());

    // Break the neck; the nose and its laser should fall away.
    let outcome = damage::damage_at(ship, CORVETTE_NECK, 10.0);
    tracing::info!("Hit at {}: {} blocks broken", CORVETTE_NECK, outcome.broken().len());
    let report = ship.check_breaks();
    tracing::info!(
        "Break check: {} fills, {} blocks discarded",
        report.checks,
        report.discarded.len()
    );
    tracing::info!("Status after damage: {:?}", ship.status());

    // Walk from the shield generator to the gravity generator.
    match ship.route(&pathfinder, Position::new(-2, -2), Position::new(2, 2)) {
        Some(path) => tracing::info!("Crew route: {} steps via {:?}", path.steps(), path.positions()),
        None => tracing::warn!("No crew route across the deck"),
    }

    // Plan a mirrored row of floor off the port and starboard sides.
    let hull: Vec<BlockRecord> = ship
        .grid()
        .records()
        .into_iter()
        .filter(|r| r.layer == BlockLayer::Base)
        .collect();
    if let Err(err) = ship.blueprint_mut().restore(registry, &hull) {
        tracing::error!("Could not copy the hull into the blueprint: {}", err);
        return;
    }
    let validator = PlacementValidator::default();
    let floor = match registry.get("floor") {
        Ok(floor) => floor,
        Err(err) => {
            tracing::error!("{}", err);
            return;
        }
    };
    let template = Candidate::new(floor, Position::ZERO);
    let plan = ship.plan_drag(&validator, &template, Position::new(-1, 4), Position::new(1, 4), true);
    tracing::info!(
        "Drag plan: {} accepted, {} rejected",
        plan.accepted().len(),
        plan.rejected().len()
    );
    for (candidate, why) in plan.rejected() {
        tracing::info!("  {} rejected: {}", candidate.origin, why);
    }

    // A gun pointed back into the hull is refused.
    if let Ok(laser) = registry.get("laser") {
        let pos = Position::new(3, 1);
        let ctx = PlacementContext::new(ship.blueprint());
        let facing = facing_from_adjoining(pos, adjoining_block(&ctx, pos, (3.0, 1.0)));
        let gun = Candidate::new(laser, pos).with_facing(facing.opposite());
        match validator.check(&ctx, &gun) {
            Ok(()) => tracing::info!("Laser at {} facing {:?} accepted", pos, gun.facing),
            Err(why) => tracing::info!("Laser at {} facing {:?} refused: {}", pos, gun.facing, why),
        }
    }
}
