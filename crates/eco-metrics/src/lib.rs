//! Metrics collection for ecosystem runs.
//!
//! The [`MetricsCollector`] hosts independent [`MetricsPlugin`]s that read a
//! [`eco_world::WorldSnapshot`] after every tick or listen on the world's event
//! bus. Plugins only append rows; exporting them is left to the caller.

pub mod collector;
pub mod forage;
pub mod history;
pub mod lineage;
pub mod session;
pub mod snapshot;

pub use collector::{MetricsCollector, MetricsPlugin};
pub use forage::{ForagePlugin, ForageSample, FORAGE};
pub use history::{summarize_history, HistoryPlugin, TickStats, HISTORY};
pub use lineage::{LineagePlugin, LINEAGE};
pub use session::{RunSummary, Session};
pub use snapshot::{SnapshotFrame, SnapshotPlugin, SNAPSHOT};
