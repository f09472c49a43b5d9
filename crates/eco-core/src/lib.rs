//! Core types and utilities for the ecosim agent-based ecosystem simulator.

pub mod types;
pub mod config;
pub mod error;
pub mod genome;
pub mod lineage;
pub mod rng;
pub mod ring;
pub mod stats;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use genome::{map_linear, Genome, MutationParams, TraitRates};
pub use lineage::{LineageFitness, LineageMetadata};
pub use rng::{create_rng, SimRng};
pub use ring::RingBuffer;
pub use stats::{calculate_gini, Histogram, RunningStats};
