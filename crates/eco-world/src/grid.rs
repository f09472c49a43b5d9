//! Resource field: food, corpses and the static regrowth patch map.

use eco_core::{SimConfig, SimRng};
use rand::Rng;

/// A toroidal grid of per-tile food and corpse energy
#[derive(Debug, Clone)]
pub struct ResourceGrid {
    pub width: usize,
    pub height: usize,
    max_food: f64,
    food: Vec<f64>,
    corpses: Vec<f64>,
    /// Per-tile growth potential in `[0, 1]`
    patch: Vec<f64>,
}

impl ResourceGrid {
    /// Uniform grid with full growth potential everywhere.
    pub fn new(width: usize, height: usize, initial_food: f64, max_food: f64) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            max_food,
            food: vec![initial_food.clamp(0.0, max_food); size],
            corpses: vec![0.0; size],
            patch: vec![1.0; size],
        }
    }

    /// Create a grid from configuration, placing Gaussian hotspots with `rng`.
    pub fn from_config(config: &SimConfig, rng: &mut SimRng) -> Self {
        let mut grid = Self::new(
            config.width,
            config.height,
            config.initial_food,
            config.food_value,
        );
        if config.hotspot_count > 0 {
            grid.place_hotspots(config.hotspot_count, config.hotspot_radius, rng);
        }
        grid
    }

    /// Each tile's potential becomes the strongest Gaussian it lies under.
    fn place_hotspots(&mut self, count: usize, sigma: f64, rng: &mut SimRng) {
        let centers: Vec<(f64, f64)> = (0..count)
            .map(|_| {
                let x = (rng.gen::<f64>() * self.width as f64).floor();
                let y = (rng.gen::<f64>() * self.height as f64).floor();
                (x, y)
            })
            .collect();

        let denom = 2.0 * sigma * sigma;
        for y in 0..self.height {
            for x in 0..self.width {
                let value = centers
                    .iter()
                    .map(|&(cx, cy)| {
                        let dx = x as f64 - cx;
                        let dy = y as f64 - cy;
                        (-(dx * dx + dy * dy) / denom).exp()
                    })
                    .fold(0.0, f64::max);
                let index = self.index(x, y);
                self.patch[index] = value;
            }
        }
    }

    /// Flat index of a tile, wrapping out-of-range coordinates
    pub fn index(&self, x: usize, y: usize) -> usize {
        (y % self.height) * self.width + (x % self.width)
    }

    pub fn max_food(&self) -> f64 {
        self.max_food
    }

    pub fn food_at(&self, x: usize, y: usize) -> f64 {
        self.food[self.index(x, y)]
    }

    pub fn corpse_at(&self, x: usize, y: usize) -> f64 {
        self.corpses[self.index(x, y)]
    }

    pub fn patch_at(&self, x: usize, y: usize) -> f64 {
        self.patch[self.index(x, y)]
    }

    pub fn set_food(&mut self, x: usize, y: usize, amount: f64) {
        let index = self.index(x, y);
        self.food[index] = amount.clamp(0.0, self.max_food);
    }

    /// Remove up to `units` of food, returning what was actually taken.
    pub fn take_food(&mut self, x: usize, y: usize, units: f64) -> f64 {
        let index = self.index(x, y);
        let eaten = self.food[index].min(units.max(0.0));
        if eaten > 0.0 {
            self.food[index] -= eaten;
        }
        eaten
    }

    pub fn add_corpse(&mut self, x: usize, y: usize, energy: f64) {
        if energy > 0.0 {
            let index = self.index(x, y);
            self.corpses[index] += energy;
        }
    }

    pub fn take_corpse(&mut self, x: usize, y: usize, units: f64) -> f64 {
        let index = self.index(x, y);
        let eaten = self.corpses[index].min(units.max(0.0));
        if eaten > 0.0 {
            self.corpses[index] -= eaten;
        }
        eaten
    }

    /// Patch-weighted logistic regrowth on `trials` randomly chosen tiles.
    pub fn regrow(&mut self, rate: f64, trials: usize, rng: &mut SimRng) {
        let len = self.food.len();
        for _ in 0..trials {
            let index = rng.gen_range(0..len);
            let patch = self.patch[index];
            if patch <= 0.0 {
                continue;
            }
            let current = self.food[index];
            let growth = rate * patch * (1.0 - current / self.max_food);
            if growth > 0.0 {
                self.food[index] = (current + growth).min(self.max_food);
            }
        }
    }

    pub fn food(&self) -> &[f64] {
        &self.food
    }

    pub fn corpses(&self) -> &[f64] {
        &self.corpses
    }

    pub fn patch(&self) -> &[f64] {
        &self.patch
    }

    pub fn total_food(&self) -> f64 {
        self.food.iter().sum()
    }

    pub fn avg_tile_food(&self) -> f64 {
        if self.food.is_empty() {
            0.0
        } else {
            self.total_food() / self.food.len() as f64
        }
    }
}
