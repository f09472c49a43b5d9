//! Agent state.

use crate::species::SpeciesDefinition;
use eco_core::{AgentId, Genome, LineageId, Position};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One organism in the simulation
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub lineage_id: LineageId,
    pub position: Position,
    pub energy: f64,
    pub genome: Arc<Genome>,
    pub age: u64,
    /// Cumulative energy eaten
    pub food_consumed: f64,
    pub born_at: u64,
    pub species: Arc<SpeciesDefinition>,
    // Per-tick scratch, cleared at the start of the next `World::step` so
    // metrics recorded after a tick still see it
    pub steps_taken: u32,
    pub distance_travelled: f64,
    pub found_food: bool,
}

impl Agent {
    pub fn new(
        id: AgentId,
        lineage_id: LineageId,
        position: Position,
        energy: f64,
        genome: Genome,
        species: Arc<SpeciesDefinition>,
        born_at: u64,
    ) -> Self {
        Self {
            id,
            lineage_id,
            position,
            energy,
            genome: Arc::new(genome),
            age: 0,
            food_consumed: 0.0,
            born_at,
            species,
            steps_taken: 0,
            distance_travelled: 0.0,
            found_food: false,
        }
    }

    pub fn species_key(&self) -> &str {
        &self.species.key
    }

    /// Tiles per tick when pursuing or fleeing
    pub fn speed(&self) -> f64 {
        self.species.speed(&self.genome)
    }

    pub fn vision(&self) -> f64 {
        self.species.vision(&self.genome)
    }

    /// Energy lost per tick for being alive
    pub fn basal_rate(&self) -> f64 {
        self.species.basal_rate(&self.genome)
    }

    pub fn is_starving(&self) -> bool {
        self.energy < self.species.params.death_threshold
    }

    pub fn can_reproduce(&self) -> bool {
        self.energy >= self.species.params.birth_threshold
    }

    /// Credit energy obtained by eating.
    pub fn feed(&mut self, energy: f64) {
        if energy > 0.0 {
            self.energy += energy;
            self.food_consumed += energy;
            self.found_food = true;
        }
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }

    /// Called by the world once per-tick counters have been harvested
    pub fn reset_tick_metrics(&mut self) {
        self.steps_taken = 0;
        self.distance_travelled = 0.0;
        self.found_food = false;
    }
}

/// Serializable agent data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    pub id: AgentId,
    pub lineage_id: LineageId,
    pub species: String,
    pub position: Position,
    pub energy: f64,
    pub age: u64,
    pub genome: Genome,
}

impl From<&Agent> for AgentData {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            lineage_id: agent.lineage_id,
            species: agent.species.key.clone(),
            position: agent.position,
            energy: agent.energy,
            age: agent.age,
            genome: (*agent.genome).clone(),
        }
    }
}
