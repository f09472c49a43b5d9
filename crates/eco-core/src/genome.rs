//! Fixed-length real-valued genomes and point mutation.

use crate::config::{BASAL_LOCUS, SPEED_LOCUS, VISION_LOCUS};
use crate::rng::SimRng;
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear gene to trait mapping: `min + gene * (max - min)`.
pub fn map_linear(gene: f64, min: f64, max: f64) -> f64 {
    min + gene * (max - min)
}

/// A vector of genes, each in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome(Vec<f64>);

impl Genome {
    /// Genes outside `[0, 1]` are clamped.
    pub fn new(genes: Vec<f64>) -> Self {
        Self(genes.into_iter().map(|g| g.clamp(0.0, 1.0)).collect())
    }

    pub fn random(len: usize, rng: &mut SimRng) -> Self {
        Self((0..len).map(|_| rng.gen::<f64>()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gene at `locus`, or 0 if the genome is shorter
    pub fn gene(&self, locus: usize) -> f64 {
        self.0.get(locus).copied().unwrap_or(0.0)
    }

    pub fn genes(&self) -> &[f64] {
        &self.0
    }

    /// Largest absolute per-locus difference to `other`.
    pub fn max_locus_delta(&self, other: &Genome) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// Per-trait mutation probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitRates {
    pub speed: f64,
    pub vision: f64,
    pub basal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    /// Probabilities for the phenotype loci
    pub rates: TraitRates,
    /// Probability for every other locus
    pub default_rate: f64,
    /// Largest absolute change applied to a mutated locus
    pub max_delta: f64,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            rates: TraitRates {
                speed: 0.01,
                vision: 0.01,
                basal: 0.01,
            },
            default_rate: 0.01,
            max_delta: 0.1,
        }
    }
}

impl MutationParams {
    pub fn rate_for(&self, locus: usize) -> f64 {
        match locus {
            SPEED_LOCUS => self.rates.speed,
            VISION_LOCUS => self.rates.vision,
            BASAL_LOCUS => self.rates.basal,
            _ => self.default_rate,
        }
    }

    pub fn validate(&self, species: &str) -> Result<()> {
        let rates = [
            self.rates.speed,
            self.rates.vision,
            self.rates.basal,
            self.default_rate,
        ];
        if rates.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return Err(Error::InvalidConfig(format!(
                "{species}: mutation rates must lie in [0, 1]"
            )));
        }
        if !(0.0..=1.0).contains(&self.max_delta) {
            return Err(Error::InvalidConfig(format!(
                "{species}: max_delta must lie in [0, 1]"
            )));
        }
        Ok(())
    }

    /// Copy `parent`, perturbing each locus independently with its rate by a
    /// uniform delta in `[-max_delta, max_delta]`, clamped to `[0, 1]`.
    pub fn mutate(&self, parent: &Genome, rng: &mut SimRng) -> Genome {
        let genes = parent
            .0
            .iter()
            .enumerate()
            .map(|(locus, &gene)| {
                if rng.gen::<f64>() < self.rate_for(locus) {
                    let delta = (rng.gen::<f64>() * 2.0 - 1.0) * self.max_delta;
                    (gene + delta).clamp(0.0, 1.0)
                } else {
                    gene
                }
            })
            .collect();
        Genome(genes)
    }
}
