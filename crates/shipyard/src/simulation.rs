//! Fixed-rate simulation loop.
//!
//! Every tick, each [`SimulationLayer`] gets to act on the fleet, the
//! fleet's break checks advance, destroyed ships are scrapped, and the
//! resulting grid changes are published to the event bus.
//!
//! # Adding a new layer
//!
//! 1. Implement [`SimulationLayer`] for your struct.
//! 2. Push a `Box::new(YourLayer)` into the `layers` vec passed to [`start`].

use std::sync::Arc;
use std::time::Duration;

use blockform_engine::{BlockLayer, Position};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::damage;
use crate::event_bus::GridChangeBatch;
use crate::fleet::{Fleet, Ship};

/// A pluggable piece of per-tick behaviour.
///
/// Layers run on the simulation task with the fleet locked, so they should
/// be cheap per tick.
pub trait SimulationLayer: Send + Sync + 'static {
    /// Human-readable name, used for logging.
    fn name(&self) -> &'static str;

    /// Act on the fleet for tick number `tick`.
    fn update(&self, fleet: &mut Fleet, tick: u64);
}

/// What one tick did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepSummary {
    pub tick: u64,
    /// Blocks discarded by break checks.
    pub discarded: usize,
    /// Batches published on the bus.
    pub batches: usize,
    /// Ships removed because nothing was left of them.
    pub scrapped: Vec<String>,
}

/// Run one tick synchronously.
pub fn step(
    fleet: &mut Fleet,
    layers: &[Box<dyn SimulationLayer>],
    tick: u64,
    dt: f32,
    bus: &broadcast::Sender<GridChangeBatch>,
) -> StepSummary {
    for layer in layers {
        layer.update(fleet, tick);
    }

    let discarded = fleet
        .tick(dt)
        .iter()
        .map(|(_, report)| report.discarded.len())
        .sum();

    let batches = fleet.drain_changes();
    let published = batches.len();
    for batch in batches {
        // Ignore send errors (no subscribers = no problem).
        let _ = bus.send(batch);
    }

    StepSummary {
        tick,
        discarded,
        batches: published,
        scrapped: fleet.scrap_wrecks(),
    }
}

/// Spawn the simulation task. It ticks every `period` (with `dt` equal to
/// the period in seconds) until `max_ticks` ticks have run, or forever when
/// `max_ticks` is `None`. The task returns the number of ticks run.
pub fn start(
    fleet: Arc<Mutex<Fleet>>,
    layers: Vec<Box<dyn SimulationLayer>>,
    bus: broadcast::Sender<GridChangeBatch>,
    period: Duration,
    max_ticks: Option<u64>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick fires immediately; skip it so the fleet has time to initialize.
        interval.tick().await;

        let names: Vec<&str> = layers.iter().map(|l| l.name()).collect();
        tracing::info!("Simulation started (period {:?}, layers {:?})", period, names);

        let dt = period.as_secs_f32();
        let mut tick = 0u64;
        while max_ticks.is_none_or(|max| tick < max) {
            interval.tick().await;
            tick += 1;

            let summary = {
                let mut fleet = fleet.lock().await;
                step(&mut fleet, &layers, tick, dt, &bus)
            };
            if summary.discarded > 0 || !summary.scrapped.is_empty() {
                tracing::info!(
                    "Tick {}: {} blocks broke away, {} ships scrapped",
                    tick,
                    summary.discarded,
                    summary.scrapped.len()
                );
            } else {
                tracing::debug!("Tick {}: {} batches published", tick, summary.batches);
            }
        }
        tick
    })
}

/// Steady incoming fire: every `every` ticks, each ship takes `damage` at
/// its foremost Base block (largest x, then smallest y).
pub struct Bombardment {
    pub damage: f32,
    pub every: u64,
}

impl Bombardment {
    fn target(ship: &Ship) -> Option<Position> {
        ship.grid()
            .blocks_in(BlockLayer::Base)
            .map(|block| block.pos())
            .max_by_key(|pos| (pos.x, -pos.y))
    }
}

impl SimulationLayer for Bombardment {
    fn name(&self) -> &'static str {
        "bombardment"
    }

    fn update(&self, fleet: &mut Fleet, tick: u64) {
        if self.every == 0 || tick % self.every != 0 {
            return;
        }
        for ship in fleet.iter_mut() {
            if let Some(pos) = Self::target(ship) {
                damage::damage_at(ship, pos, self.damage);
            }
        }
    }
}
