//! Periodic per-lineage phenotype summaries and the final fitness ranking.

use crate::collector::MetricsPlugin;
use eco_core::RunningStats;
use eco_world::WorldSnapshot;
use std::any::Any;
use tracing::warn;

pub const LINEAGE: &str = "lineage";

pub const LINEAGE_HEADER: &str =
    "tick,lineageId,members,meanSpeed,meanVision,meanBasal,meanEnergy,births,deaths";
pub const FITNESS_HEADER: &str = "lineageId,fitness";

#[derive(Debug)]
pub struct LineagePlugin {
    rows: Vec<String>,
    fitness_rows: Vec<String>,
}

impl Default for LineagePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LineagePlugin {
    pub fn new() -> Self {
        Self {
            rows: vec![LINEAGE_HEADER.to_string()],
            fitness_rows: vec![FITNESS_HEADER.to_string()],
        }
    }

    /// One row per active lineage per sampling tick, header first
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Fitness ranking written by `finalize`, header first
    pub fn fitness_rows(&self) -> &[String] {
        &self.fitness_rows
    }
}

impl MetricsPlugin for LineagePlugin {
    fn name(&self) -> &str {
        LINEAGE
    }

    fn reset(&mut self) {
        self.rows.truncate(1);
        self.fitness_rows.truncate(1);
    }

    fn record_tick(&mut self, snapshot: &WorldSnapshot<'_>) {
        if snapshot.tick % snapshot.config.lineage_interval != 0 {
            return;
        }

        for (id, members) in snapshot.lineage_members() {
            let Some(meta) = snapshot.lineages.get(&id) else {
                warn!(lineage = %id, tick = snapshot.tick, "Live agents in unregistered lineage");
                continue;
            };

            let mut speed = RunningStats::new();
            let mut vision = RunningStats::new();
            let mut basal = RunningStats::new();
            let mut energy = RunningStats::new();
            for agent in &members {
                speed.push(agent.speed());
                vision.push(agent.vision());
                basal.push(agent.basal_rate());
                energy.push(agent.energy);
            }

            self.rows.push(format!(
                "{},{},{},{:.3},{:.3},{:.5},{:.3},{},{}",
                snapshot.tick,
                id,
                members.len(),
                speed.avg(),
                vision.avg(),
                basal.avg(),
                energy.avg(),
                meta.births_tick,
                meta.deaths_tick,
            ));
        }
    }

    fn finalize(&mut self, snapshot: &WorldSnapshot<'_>) {
        self.fitness_rows.truncate(1);
        for entry in snapshot.ranked_lineages() {
            self.fitness_rows
                .push(format!("{},{}", entry.lineage_id, entry.fitness));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
