//! Configuration types for the simulation.

use crate::genome::{map_linear, MutationParams, TraitRates};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// World configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Width of the world grid
    pub width: usize,
    /// Height of the world grid
    pub height: usize,
    /// Food units placed on every tile at world creation
    pub initial_food: f64,
    /// Food regrowth rate per sampled tile per tick
    pub growth_rate: f64,
    /// Maximum food per tile, also the energy yielded by one food unit
    pub food_value: f64,
    /// Random tiles sampled for regrowth each tick
    pub regrowth_trials: usize,
    /// Number of Gaussian regrowth hotspots
    pub hotspot_count: usize,
    /// Standard deviation of each hotspot, in tiles
    pub hotspot_radius: f64,
    /// Per-locus genome delta above which a birth founds a new lineage
    pub lineage_threshold: f64,
    /// Ticks between per-agent snapshot rows
    pub snapshot_interval: u64,
    /// Ticks between energy histogram rows
    pub histogram_interval: u64,
    /// Ticks between lineage samples (and fitness accrual)
    pub lineage_interval: u64,
    /// Ticks between recomputations of secondary metrics such as food Gini
    pub metrics_interval: u64,
    /// Energy histogram resolution
    pub hist_bins: usize,
    /// Upper bound of the energy histogram; higher values land in the last bin
    pub hist_max_energy: f64,
    /// Forage log ring-buffer capacity
    pub forage_buffer: usize,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            initial_food: 0.5,
            growth_rate: 0.15,
            food_value: 10.0,
            regrowth_trials: 400,
            hotspot_count: 5,
            hotspot_radius: 20.0,
            lineage_threshold: 0.05,
            snapshot_interval: 100,
            histogram_interval: 100,
            lineage_interval: 100,
            metrics_interval: 1,
            hist_bins: 10,
            hist_max_energy: 40.0,
            forage_buffer: 20_000,
            seed: 1,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the tick algorithm or metrics meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.food_value > 0.0) {
            return Err(Error::InvalidConfig("food_value must be positive".into()));
        }
        if !(0.0..=self.food_value).contains(&self.initial_food) {
            return Err(Error::InvalidConfig(format!(
                "initial_food must lie in [0, {}]",
                self.food_value
            )));
        }
        if !(self.growth_rate >= 0.0) {
            return Err(Error::InvalidConfig("growth_rate must be non-negative".into()));
        }
        if !(self.lineage_threshold > 0.0 && self.lineage_threshold <= 1.0) {
            return Err(Error::InvalidConfig(
                "lineage_threshold must lie in (0, 1]".into(),
            ));
        }
        if self.hotspot_count > 0 && !(self.hotspot_radius > 0.0) {
            return Err(Error::InvalidConfig("hotspot_radius must be positive".into()));
        }
        for (name, interval) in [
            ("snapshot_interval", self.snapshot_interval),
            ("histogram_interval", self.histogram_interval),
            ("lineage_interval", self.lineage_interval),
            ("metrics_interval", self.metrics_interval),
        ] {
            if interval == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        if self.hist_bins == 0 || !(self.hist_max_energy > 0.0) {
            return Err(Error::InvalidConfig(
                "energy histogram needs bins and a positive range".into(),
            ));
        }
        if self.forage_buffer == 0 {
            return Err(Error::InvalidConfig("forage_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

/// Closed interval a gene in `[0, 1]` is linearly mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitRange {
    pub min: f64,
    pub max: f64,
}

impl TraitRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn map(&self, gene: f64) -> f64 {
        map_linear(gene, self.min, self.max)
    }
}

/// Genotype to phenotype mapping. Gene 0 is speed, 1 vision, 2 basal multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeRanges {
    /// Tiles moved per tick when pursuing or fleeing
    pub speed: TraitRange,
    /// Sensing radius in tiles
    pub vision: TraitRange,
    /// Multiplier on the species' basal metabolic rate
    pub basal: TraitRange,
}

pub const SPEED_LOCUS: usize = 0;
pub const VISION_LOCUS: usize = 1;
pub const BASAL_LOCUS: usize = 2;
/// Loci every species genome must carry for the phenotype mapping
pub const PHENOTYPE_LOCI: usize = 3;

/// Energy, movement and reproduction parameters of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    pub genome_length: usize,
    /// CSS color string for renderers
    pub color: String,
    /// Energy lost per tick for being alive, before the basal multiplier
    pub basal_metabolic_rate: f64,
    /// Energy lost per tile travelled
    pub movement_cost: f64,
    /// Minimum energy to give birth
    pub birth_threshold: f64,
    /// Energy moved from parent to child at birth
    pub birth_cost: f64,
    /// Starvation boundary
    pub death_threshold: f64,
    /// Energy sought per bite of ground food or corpse
    pub bite_energy: f64,
    pub hunting_radius: Option<f64>,
    pub phenotype: PhenotypeRanges,
    pub mutation: MutationParams,
}

impl SpeciesParams {
    /// Random-walking grazer.
    pub fn omnivore() -> Self {
        Self {
            genome_length: PHENOTYPE_LOCI,
            color: "rgb(200, 200, 200)".to_string(),
            basal_metabolic_rate: 0.01,
            movement_cost: 0.02,
            birth_threshold: 20.0,
            birth_cost: 9.0,
            death_threshold: 1e-3,
            bite_energy: 1.0,
            hunting_radius: None,
            phenotype: PhenotypeRanges {
                speed: TraitRange::new(1.0, 1.0),
                vision: TraitRange::new(0.0, 0.0),
                basal: TraitRange::new(0.5, 1.5),
            },
            mutation: MutationParams {
                rates: TraitRates {
                    speed: 0.05,
                    vision: 0.05,
                    basal: 0.05,
                },
                default_rate: 0.05,
                max_delta: 0.1,
            },
        }
    }

    /// Grazer that flees predators it can see.
    pub fn herbivore() -> Self {
        Self {
            genome_length: PHENOTYPE_LOCI,
            color: "rgb(120, 200, 90)".to_string(),
            basal_metabolic_rate: 0.01,
            movement_cost: 0.02,
            birth_threshold: 20.0,
            birth_cost: 9.0,
            death_threshold: 1e-3,
            bite_energy: 1.0,
            hunting_radius: None,
            phenotype: PhenotypeRanges {
                speed: TraitRange::new(1.0, 2.0),
                vision: TraitRange::new(3.0, 10.0),
                basal: TraitRange::new(0.5, 1.5),
            },
            mutation: MutationParams::default(),
        }
    }

    /// Pursuit hunter that also scavenges corpses.
    pub fn predator() -> Self {
        Self {
            genome_length: PHENOTYPE_LOCI,
            color: "rgb(220, 60, 60)".to_string(),
            basal_metabolic_rate: 0.02,
            movement_cost: 0.03,
            birth_threshold: 30.0,
            birth_cost: 12.0,
            death_threshold: 1e-3,
            bite_energy: 5.0,
            hunting_radius: Some(8.0),
            phenotype: PhenotypeRanges {
                speed: TraitRange::new(1.0, 3.0),
                vision: TraitRange::new(5.0, 10.0),
                basal: TraitRange::new(0.5, 1.5),
            },
            mutation: MutationParams::default(),
        }
    }

    pub fn validate(&self, species: &str) -> Result<()> {
        if self.genome_length < PHENOTYPE_LOCI {
            return Err(Error::GenomeLength {
                species: species.to_string(),
                expected: PHENOTYPE_LOCI,
                actual: self.genome_length,
            });
        }
        if self.birth_cost < 0.0 || self.birth_threshold < self.birth_cost {
            return Err(Error::InvalidConfig(format!(
                "{species}: birth_threshold must cover a non-negative birth_cost"
            )));
        }
        if self.basal_metabolic_rate < 0.0 || self.movement_cost < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "{species}: energy costs must be non-negative"
            )));
        }
        self.mutation.validate(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimConfig::default();
        assert_eq!(config.width, 200);
        assert_eq!(config.height, 200);
        assert_eq!(config.regrowth_trials, 400);
        assert!(config.validate().is_ok());

        let omnivore = SpeciesParams::omnivore();
        assert_eq!(omnivore.birth_threshold, 20.0);
        assert!(omnivore.validate("omnivore").is_ok());
        assert!(SpeciesParams::herbivore().validate("herbivore").is_ok());
        assert!(SpeciesParams::predator().validate("predator").is_ok());
    }

    #[test]
    fn test_config_json_roundtrip_fills_defaults() {
        let config = SimConfig::from_json(r#"{ "width": 30, "seed": 7 }"#).unwrap();
        assert_eq!(config.width, 30);
        assert_eq!(config.seed, 7);
        assert_eq!(config.height, 200);

        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let zero_width = SimConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(zero_width.validate(), Err(Error::InvalidConfig(_))));

        let zero_interval = SimConfig {
            snapshot_interval: 0,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());

        let threshold = SimConfig {
            lineage_threshold: 1.5,
            ..Default::default()
        };
        assert!(threshold.validate().is_err());

        assert!(SimConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_short_genome_rejected() {
        let params = SpeciesParams {
            genome_length: 2,
            ..SpeciesParams::omnivore()
        };
        assert!(matches!(
            params.validate("omnivore"),
            Err(Error::GenomeLength { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_trait_range_mapping() {
        let range = TraitRange::new(2.0, 6.0);
        assert_eq!(range.map(0.0), 2.0);
        assert_eq!(range.map(0.5), 4.0);
        assert_eq!(range.map(1.0), 6.0);
    }
}
