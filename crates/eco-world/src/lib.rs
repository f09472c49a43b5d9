//! World simulation engine.
//!
//! A toroidal grid of regrowing food populated by agents whose species
//! behaviors move, eat and reproduce through the [`World`]. Structural changes
//! travel over the [`EventBus`] and are applied between agent turns.

pub mod agent;
pub mod behavior;
pub mod events;
pub mod grid;
pub mod lineage;
pub mod snapshot;
pub mod species;
pub mod world;

pub use agent::{Agent, AgentData};
pub use behavior::{Herbivore, Omnivore, Predator};
pub use events::{EventBus, EventHandler, EventKind, EventQueue, SimEvent};
pub use grid::ResourceGrid;
pub use lineage::{rank_lineages, LineageTracker};
pub use snapshot::WorldSnapshot;
pub use species::{
    EatTarget, SpeciesBehavior, SpeciesDefinition, SpeciesRegistry, HERBIVORE, OMNIVORE, PREDATOR,
};
pub use world::{SpawnOptions, World, DEFAULT_SPAWN_ENERGY};
