//! Headless runner pairing one world with one metrics collector.

use crate::collector::{MetricsCollector, MetricsPlugin};
use crate::forage::ForagePlugin;
use crate::history::HistoryPlugin;
use crate::lineage::LineagePlugin;
use crate::snapshot::SnapshotPlugin;
use eco_core::LineageFitness;
use eco_world::World;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const PROGRESS_INTERVAL: u64 = 1000;

/// Outcome of [`Session::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_tick: u64,
    pub population: usize,
    pub births_total: u64,
    pub deaths_total: u64,
    pub lineages: usize,
    pub top_lineage: Option<LineageFitness>,
}

/// Owner of the tick loop: steps the world, then records metrics.
#[derive(Debug)]
pub struct Session {
    world: World,
    metrics: MetricsCollector,
}

impl Session {
    pub fn new(world: World) -> Self {
        Self {
            world,
            metrics: MetricsCollector::new(),
        }
    }

    /// Register the history, lineage, forage and snapshot plugins.
    pub fn with_default_plugins(mut self) -> Self {
        self.register(Box::new(HistoryPlugin::new()));
        self.register(Box::new(LineagePlugin::new()));
        self.register(Box::new(ForagePlugin::new()));
        self.register(Box::new(SnapshotPlugin::new()));
        self
    }

    pub fn register(&mut self, plugin: Box<dyn MetricsPlugin>) {
        self.metrics.register(plugin, &mut self.world);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Setup access for spawning between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn step(&mut self) {
        self.world.step();
        self.metrics.record_tick(&self.world.snapshot());
    }

    /// Advance `ticks` ticks, recording metrics after each one.
    #[instrument(skip(self), fields(start_tick = self.world.tick()))]
    pub fn run(&mut self, ticks: u64) -> RunSummary {
        info!(
            ticks,
            population = self.world.population(),
            "Starting run"
        );

        for _ in 0..ticks {
            self.step();
            let tick = self.world.tick();
            if tick % PROGRESS_INTERVAL == 0 {
                info!(
                    tick,
                    population = self.world.population(),
                    births_total = self.world.births_total(),
                    deaths_total = self.world.deaths_total(),
                    "Run progress"
                );
            }
        }

        let summary = self.summary(ticks);
        info!(
            event = "run_summary",
            final_tick = summary.final_tick,
            population = summary.population,
            births_total = summary.births_total,
            deaths_total = summary.deaths_total,
            lineages = summary.lineages,
            top_lineage = ?summary.top_lineage,
            "Run complete"
        );
        summary
    }

    fn summary(&self, ticks: u64) -> RunSummary {
        RunSummary {
            ticks,
            final_tick: self.world.tick(),
            population: self.world.population(),
            births_total: self.world.births_total(),
            deaths_total: self.world.deaths_total(),
            lineages: self.world.lineages().len(),
            top_lineage: self.world.lineages().ranked().into_iter().next(),
        }
    }

    /// Let every plugin write its end-of-run report.
    pub fn finalize(&mut self) {
        let snapshot = self.world.snapshot();
        self.metrics.finalize(&snapshot);
    }

    /// Swap in a fresh world and clear all recorded metrics. Plugins are kept
    /// and subscribed to the new world.
    pub fn reset(&mut self, world: World) {
        self.world = world;
        self.metrics.reset();
        self.metrics.resubscribe(&mut self.world);
    }
}
