//! Periodic capture of every live agent, for reconstructing population state.

use crate::collector::MetricsPlugin;
use eco_core::Result;
use eco_world::{AgentData, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::any::Any;

pub const SNAPSHOT: &str = "snapshot";

pub const SNAPSHOT_HEADER: &str = "tick,id,x,y,energy,age";

/// All agents at one sampled tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFrame {
    pub tick: u64,
    pub agents: Vec<AgentData>,
}

#[derive(Debug)]
pub struct SnapshotPlugin {
    rows: Vec<String>,
    frames: Vec<SnapshotFrame>,
}

impl Default for SnapshotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPlugin {
    pub fn new() -> Self {
        Self {
            rows: vec![SNAPSHOT_HEADER.to_string()],
            frames: Vec::new(),
        }
    }

    /// One row per agent per sampled tick, header first
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn frames(&self) -> &[SnapshotFrame] {
        &self.frames
    }

    pub fn frames_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.frames)?)
    }
}

impl MetricsPlugin for SnapshotPlugin {
    fn name(&self) -> &str {
        SNAPSHOT
    }

    fn reset(&mut self) {
        self.rows.truncate(1);
        self.frames.clear();
    }

    fn record_tick(&mut self, snapshot: &WorldSnapshot<'_>) {
        if snapshot.tick % snapshot.config.snapshot_interval != 0 {
            return;
        }
        for agent in snapshot.agents {
            self.rows.push(format!(
                "{},{},{},{},{:.3},{}",
                snapshot.tick, agent.id, agent.position.x, agent.position.y, agent.energy, agent.age
            ));
        }
        self.frames.push(SnapshotFrame {
            tick: snapshot.tick,
            agents: snapshot.agents.iter().map(AgentData::from).collect(),
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MetricsCollector;
    use eco_core::{Position, SimConfig};
    use eco_world::{SpawnOptions, SpeciesRegistry, World, OMNIVORE};

    #[test]
    fn test_samples_on_interval() {
        let config = SimConfig {
            width: 20,
            height: 20,
            snapshot_interval: 3,
            ..Default::default()
        };
        let mut world = World::new(config, SpeciesRegistry::with_defaults()).unwrap();
        for i in 0..4 {
            world
                .spawn_agent(
                    OMNIVORE,
                    Position::new(i as f64, i as f64),
                    SpawnOptions::with_energy(12.0),
                )
                .unwrap();
        }
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(SnapshotPlugin::new()), &mut world);
        for _ in 0..7 {
            world.step();
            collector.record_tick(&world.snapshot());
        }

        let plugin = collector.plugin::<SnapshotPlugin>(SNAPSHOT).unwrap();
        assert_eq!(plugin.rows().len(), 1 + 2 * 4);
        assert!(plugin.rows()[1].starts_with("3,0,"));
        assert!(plugin.rows()[1].ends_with(",3"));

        let ticks: Vec<u64> = plugin.frames().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![3, 6]);
        assert_eq!(plugin.frames()[1].agents[2].age, 6);
        assert_eq!(plugin.frames()[1].agents[2].species, OMNIVORE);

        let json = plugin.frames_json().unwrap();
        let back: Vec<SnapshotFrame> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
    }
}
