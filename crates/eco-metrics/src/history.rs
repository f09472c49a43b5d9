//! Per-tick timeseries of population, energy and food statistics.

use crate::collector::MetricsPlugin;
use eco_core::{calculate_gini, Histogram, RunningStats};
use eco_world::{EventBus, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::any::Any;

pub const HISTORY: &str = "history";

pub const SERIES_HEADER: &str =
    "tick,pop,births,deaths,meanE,sdE,moveDebit,basalDebit,minFood,maxFood,foodGini,successRate,meanSteps";

pub const MAX_HISTORY_ENTRIES: usize = 2000;
pub const HISTORY_HEAD: usize = 50;
pub const HISTORY_TAIL: usize = 50;

/// Aggregate metrics of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub tick: u64,
    pub population: usize,
    pub births: u64,
    pub deaths: u64,
    pub avg_energy: f64,
    pub energy_sd: f64,
    pub min_energy: f64,
    pub max_energy: f64,
    /// Present on histogram ticks only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_histogram: Option<Vec<u32>>,
    pub avg_tile_food: f64,
    pub avg_tile_food_sd: f64,
    pub min_tile_food: f64,
    pub max_tile_food: f64,
    pub food_gini: f64,
    pub move_debit: f64,
    pub basal_debit: f64,
    /// Fraction of agents that ate this tick
    pub success_rate: f64,
    pub mean_steps: f64,
}

#[derive(Debug)]
pub struct HistoryPlugin {
    history: Vec<TickStats>,
    series: Vec<String>,
    hist_rows: Vec<String>,
    energy_hist: Histogram,
    food_gini: Option<f64>,
}

impl Default for HistoryPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPlugin {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            series: vec![SERIES_HEADER.to_string()],
            hist_rows: Vec::new(),
            energy_hist: Histogram::new(10, 0.0, 40.0),
            food_gini: None,
        }
    }

    pub fn history(&self) -> &[TickStats] {
        &self.history
    }

    /// CSV rows, header first
    pub fn series(&self) -> &[String] {
        &self.series
    }

    /// Energy histogram CSV rows, header first
    pub fn hist_rows(&self) -> &[String] {
        &self.hist_rows
    }

    pub fn last(&self) -> Option<&TickStats> {
        self.history.last()
    }

    /// Bounded view of the history for export.
    pub fn summary(&self) -> (Vec<TickStats>, bool) {
        summarize_history(&self.history, MAX_HISTORY_ENTRIES, HISTORY_HEAD, HISTORY_TAIL)
    }

    fn hist_header(bins: usize) -> String {
        let mut header = String::from("tick");
        for bin in 0..bins {
            header.push_str(&format!(",b{bin}"));
        }
        header
    }
}

impl MetricsPlugin for HistoryPlugin {
    fn name(&self) -> &str {
        HISTORY
    }

    fn subscribe(&mut self, _bus: &mut EventBus, snapshot: &WorldSnapshot<'_>) {
        let config = snapshot.config;
        self.energy_hist = Histogram::new(config.hist_bins, 0.0, config.hist_max_energy);
        let header = Self::hist_header(config.hist_bins);
        if self.hist_rows.first() != Some(&header) {
            self.hist_rows = vec![header];
        }
    }

    fn reset(&mut self) {
        self.history.clear();
        self.series.truncate(1);
        self.hist_rows.truncate(1);
        self.energy_hist.reset();
        self.food_gini = None;
    }

    fn record_tick(&mut self, snapshot: &WorldSnapshot<'_>) {
        let config = snapshot.config;
        let population = snapshot.population();

        let mut energy = RunningStats::new();
        let mut steps = 0u64;
        let mut fed = 0usize;
        self.energy_hist.reset();
        for agent in snapshot.agents {
            energy.push(agent.energy);
            self.energy_hist.add(agent.energy);
            steps += u64::from(agent.steps_taken);
            if agent.found_food {
                fed += 1;
            }
        }
        let (success_rate, mean_steps) = if population > 0 {
            (fed as f64 / population as f64, steps as f64 / population as f64)
        } else {
            (0.0, 0.0)
        };

        let food: RunningStats = snapshot.food.iter().copied().collect();
        // the sort is O(n log n) over the whole grid, so honor the sampling interval
        let food_gini = match self.food_gini {
            Some(gini) if snapshot.tick % config.metrics_interval != 0 => gini,
            _ => calculate_gini(snapshot.food),
        };
        self.food_gini = Some(food_gini);

        let histogram_tick = snapshot.tick % config.histogram_interval == 0;
        let stats = TickStats {
            tick: snapshot.tick,
            population,
            births: snapshot.births_this_tick,
            deaths: snapshot.deaths_this_tick,
            avg_energy: energy.avg(),
            energy_sd: energy.sd(),
            min_energy: energy.min(),
            max_energy: energy.max(),
            energy_histogram: histogram_tick.then(|| self.energy_hist.to_vec()),
            avg_tile_food: food.avg(),
            avg_tile_food_sd: food.sd(),
            min_tile_food: food.min(),
            max_tile_food: food.max(),
            food_gini,
            move_debit: snapshot.move_debit,
            basal_debit: snapshot.basal_debit,
            success_rate,
            mean_steps,
        };

        self.series.push(format!(
            "{},{},{},{},{:.3},{:.3},{:.3},{:.3},{:.2},{:.2},{:.3},{:.3},{:.2}",
            stats.tick,
            stats.population,
            stats.births,
            stats.deaths,
            stats.avg_energy,
            stats.energy_sd,
            stats.move_debit,
            stats.basal_debit,
            stats.min_tile_food,
            stats.max_tile_food,
            stats.food_gini,
            stats.success_rate,
            stats.mean_steps,
        ));
        if histogram_tick {
            let mut row = stats.tick.to_string();
            for count in self.energy_hist.counts() {
                row.push_str(&format!(",{count}"));
            }
            self.hist_rows.push(row);
        }
        self.history.push(stats);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Downsample `history` to at most `max` entries, keeping the first `head`
/// and last `tail` rows and sampling the middle at a fixed stride.
///
/// Returns the rows and whether anything was dropped.
pub fn summarize_history<T: Clone>(
    history: &[T],
    max: usize,
    head: usize,
    tail: usize,
) -> (Vec<T>, bool) {
    if history.len() <= max {
        return (history.to_vec(), false);
    }
    let head = head.min(max);
    let tail = tail.min(max - head);
    let budget = max - head - tail;

    let middle = &history[head..history.len() - tail];
    let mut rows = Vec::with_capacity(max);
    rows.extend_from_slice(&history[..head]);
    if budget > 0 {
        let stride = (middle.len() / budget).max(1);
        rows.extend(middle.iter().step_by(stride).take(budget).cloned());
    }
    rows.extend_from_slice(&history[history.len() - tail..]);
    (rows, true)
}
