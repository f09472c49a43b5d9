//! Species definitions and the behavior contract agents delegate to.
//!
//! New species plug in by implementing [`SpeciesBehavior`] and registering a
//! [`SpeciesDefinition`]; the world never matches on species keys.

use crate::agent::Agent;
use crate::behavior::{Herbivore, Omnivore, Predator};
use crate::world::World;
use eco_core::{
    AgentId, Error, Genome, Result, SimRng, SpeciesParams, BASAL_LOCUS, PHENOTYPE_LOCI,
    SPEED_LOCUS, VISION_LOCUS,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const OMNIVORE: &str = "omnivore";
pub const HERBIVORE: &str = "herbivore";
pub const PREDATOR: &str = "predator";

/// What an agent attempts to eat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EatTarget {
    /// Ground resource on a tile
    Tile { x: usize, y: usize },
    /// Another agent sharing the eater's tile
    Agent(AgentId),
}

/// Per-species capability set invoked once per tick for every live agent.
pub trait SpeciesBehavior: fmt::Debug + Send + Sync {
    /// Genome length the behavior reads from.
    fn min_genome_length(&self) -> usize {
        PHENOTYPE_LOCI
    }

    /// Relocate the agent through [`World::relocate`], which wraps the
    /// position and debits movement energy.
    fn move_agent(&self, agent: &mut Agent, world: &mut World);

    /// Try to gain energy from `target`. Irrelevant targets are ignored.
    fn eat(&self, agent: &mut Agent, target: EatTarget, world: &mut World);

    /// Pay the birth cost and request a birth; the world builds the child.
    fn reproduce(&self, agent: &mut Agent, world: &mut World) {
        if agent.can_reproduce() {
            agent.energy -= agent.species.params.birth_cost;
            world.request_birth(agent.id);
        }
    }
}

/// Immutable description of a species, shared by all its agents
#[derive(Debug)]
pub struct SpeciesDefinition {
    pub key: String,
    pub params: SpeciesParams,
    pub behavior: Box<dyn SpeciesBehavior>,
}

impl SpeciesDefinition {
    pub fn new(
        key: impl Into<String>,
        params: SpeciesParams,
        behavior: Box<dyn SpeciesBehavior>,
    ) -> Self {
        Self {
            key: key.into(),
            params,
            behavior,
        }
    }

    /// Whether this species hunts other agents
    pub fn is_hunter(&self) -> bool {
        self.params.hunting_radius.is_some()
    }

    pub fn speed(&self, genome: &Genome) -> f64 {
        self.params.phenotype.speed.map(genome.gene(SPEED_LOCUS))
    }

    pub fn vision(&self, genome: &Genome) -> f64 {
        self.params.phenotype.vision.map(genome.gene(VISION_LOCUS))
    }

    pub fn basal_rate(&self, genome: &Genome) -> f64 {
        self.params.basal_metabolic_rate * self.params.phenotype.basal.map(genome.gene(BASAL_LOCUS))
    }

    pub fn mutate(&self, parent: &Genome, rng: &mut SimRng) -> Genome {
        self.params.mutation.mutate(parent, rng)
    }

    fn validate(&self) -> Result<()> {
        self.params.validate(&self.key)?;
        let needed = self.behavior.min_genome_length();
        if self.params.genome_length < needed {
            return Err(Error::GenomeLength {
                species: self.key.clone(),
                expected: needed,
                actual: self.params.genome_length,
            });
        }
        Ok(())
    }
}

/// Species lookup by key
#[derive(Debug, Clone, Default)]
pub struct SpeciesRegistry {
    species: BTreeMap<String, Arc<SpeciesDefinition>>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in omnivore, herbivore and predator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, SpeciesParams, Box<dyn SpeciesBehavior>); 3] = [
            (OMNIVORE, SpeciesParams::omnivore(), Box::new(Omnivore)),
            (HERBIVORE, SpeciesParams::herbivore(), Box::new(Herbivore)),
            (PREDATOR, SpeciesParams::predator(), Box::new(Predator)),
        ];
        for (key, params, behavior) in builtins {
            registry.species.insert(
                key.to_string(),
                Arc::new(SpeciesDefinition::new(key, params, behavior)),
            );
        }
        registry
    }

    /// Validate and add a species. Keys are unique.
    pub fn register(&mut self, definition: SpeciesDefinition) -> Result<()> {
        definition.validate()?;
        if self.species.contains_key(&definition.key) {
            return Err(Error::AlreadyExists(format!("species {}", definition.key)));
        }
        self.species
            .insert(definition.key.clone(), Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Arc<SpeciesDefinition>> {
        self.species
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UnknownSpecies(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.species.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.species.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
