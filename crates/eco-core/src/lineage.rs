//! Lineage bookkeeping records.

use crate::{Genome, LineageId};
use serde::{Deserialize, Serialize};

/// Metadata kept for every lineage ever registered in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageMetadata {
    pub founder_genome: Genome,
    /// Tick at which the lineage was registered
    pub founded_at: u64,
    /// Member-ticks lived, accrued at each lineage sampling point
    pub cumulative_life_ticks: u64,
    pub births: u64,
    pub deaths: u64,
    pub births_tick: u64,
    pub deaths_tick: u64,
}

impl LineageMetadata {
    pub fn new(founder_genome: Genome, founded_at: u64) -> Self {
        Self {
            founder_genome,
            founded_at,
            cumulative_life_ticks: 0,
            births: 0,
            deaths: 0,
            births_tick: 0,
            deaths_tick: 0,
        }
    }

    pub fn record_birth(&mut self) {
        self.births += 1;
        self.births_tick += 1;
    }

    pub fn record_death(&mut self) {
        self.deaths += 1;
        self.deaths_tick += 1;
    }

    pub fn reset_tick(&mut self) {
        self.births_tick = 0;
        self.deaths_tick = 0;
    }

    /// Credit `members` agents alive for `interval` ticks
    pub fn accrue(&mut self, members: u64, interval: u64) {
        self.cumulative_life_ticks += members * interval;
    }
}

/// One entry of a fitness ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageFitness {
    pub lineage_id: LineageId,
    pub fitness: u64,
}
