//! Event-driven log of every food consumption, bounded by a ring buffer.

use crate::collector::MetricsPlugin;
use eco_core::RingBuffer;
use eco_world::{EventBus, EventKind, SimEvent, WorldSnapshot};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

pub const FORAGE: &str = "forage";

pub const FORAGE_HEADER: &str = "tick,agent,x,y,amount";

/// One food-consumed event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForageSample {
    pub tick: u64,
    pub agent: u64,
    pub x: usize,
    pub y: usize,
    /// Energy equivalent eaten
    pub amount: f64,
}

#[derive(Debug)]
pub struct ForagePlugin {
    log: Arc<Mutex<RingBuffer<ForageSample>>>,
    /// Samples overwritten in buffers replaced by a later subscription
    overwritten: u64,
}

impl Default for ForagePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ForagePlugin {
    pub fn new() -> Self {
        Self::with_capacity(eco_core::SimConfig::default().forage_buffer)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(RingBuffer::new(capacity))),
            overwritten: 0,
        }
    }

    /// Retained samples, oldest first
    pub fn samples(&self) -> Vec<ForageSample> {
        self.log.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Events seen since the last reset, including overwritten ones
    pub fn total_recorded(&self) -> u64 {
        self.overwritten + self.log.lock().total_pushed()
    }

    /// Retained samples as CSV rows, header first
    pub fn rows(&self) -> Vec<String> {
        let log = self.log.lock();
        let mut rows = Vec::with_capacity(log.len() + 1);
        rows.push(FORAGE_HEADER.to_string());
        rows.extend(log.iter().map(|s| {
            format!("{},{},{},{},{:.3}", s.tick, s.agent, s.x, s.y, s.amount)
        }));
        rows
    }
}

impl MetricsPlugin for ForagePlugin {
    fn name(&self) -> &str {
        FORAGE
    }

    fn subscribe(&mut self, bus: &mut EventBus, snapshot: &WorldSnapshot<'_>) {
        // a fresh buffer leaves closures from earlier subscriptions writing
        // into an orphan
        let mut fresh = RingBuffer::new(snapshot.config.forage_buffer);
        {
            let old = self.log.lock();
            self.overwritten += old.total_pushed() - old.len() as u64;
            for sample in old.iter() {
                fresh.push(*sample);
            }
        }
        self.log = Arc::new(Mutex::new(fresh));
        let log = Arc::clone(&self.log);
        bus.subscribe(EventKind::FoodConsumed, move |event| {
            if let SimEvent::FoodConsumed {
                tick,
                agent,
                amount,
                x,
                y,
            } = event
            {
                log.lock().push(ForageSample {
                    tick: *tick,
                    agent: agent.0,
                    x: *x,
                    y: *y,
                    amount: *amount,
                });
            }
        });
    }

    fn reset(&mut self) {
        self.log.lock().clear();
        self.overwritten = 0;
    }

    fn record_tick(&mut self, _snapshot: &WorldSnapshot<'_>) {}

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

    fn world(forage_buffer: usize) -> World {
        let config = SimConfig {
            width: 20,
            height: 20,
            forage_buffer,
            ..Default::default()
        };
        World::new(config, SpeciesRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_logs_consumption_events() {
        let mut world = world(100);
        let id = world
            .spawn_agent(OMNIVORE, Position::new(3.0, 3.0), SpawnOptions::default())
            .unwrap()
            .id;
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(ForagePlugin::new()), &mut world);

        world.consume_food(3, 3, 0.1, id);
        world.consume_food(4, 3, 0.0, id);

        let forage = collector.plugin::<ForagePlugin>(FORAGE).unwrap();
        let samples = forage.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!((samples[0].agent, samples[0].x, samples[0].y), (id.0, 3, 3));
        assert!((samples[0].amount - 1.0).abs() < 1e-12);
        assert_eq!(forage.rows()[1], "0,0,3,3,1.000");
    }

    #[test]
    fn test_ring_buffer_caps_log() {
        let mut world = world(5);
        let id = world
            .spawn_agent(OMNIVORE, Position::new(0.0, 0.0), SpawnOptions::default())
            .unwrap()
            .id;
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(ForagePlugin::new()), &mut world);

        for x in 0..8 {
            world.consume_food(x, 0, 0.1, id);
        }
        let forage = collector.plugin::<ForagePlugin>(FORAGE).unwrap();
        assert_eq!(forage.len(), 5);
        assert_eq!(forage.total_recorded(), 8);
        let xs: Vec<usize> = forage.samples().iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![3, 4, 5, 6, 7]);

        collector.reset();
        assert!(collector.plugin::<ForagePlugin>(FORAGE).unwrap().is_empty());
    }

    #[test]
    fn test_resubscribe_logs_once() {
        let mut world = world(100);
        let id = world
            .spawn_agent(OMNIVORE, Position::new(3.0, 3.0), SpawnOptions::default())
            .unwrap()
            .id;
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(ForagePlugin::new()), &mut world);
        world.consume_food(2, 2, 0.1, id);

        collector.resubscribe(&mut world);
        world.consume_food(3, 3, 0.1, id);
        collector.register(Box::new(ForagePlugin::new()), &mut world);
        world.consume_food(4, 4, 0.1, id);

        let forage = collector.plugin::<ForagePlugin>(FORAGE).unwrap();
        let xs: Vec<usize> = forage.samples().iter().map(|s| s.x).collect();
        // the replacement starts empty
        assert_eq!(xs, vec![4]);
        assert_eq!(forage.rows().len(), 2);
        assert_eq!(world.bus_mut().subscriber_count(EventKind::FoodConsumed), 1);
    }

    #[test]
    fn test_resubscribe_keeps_samples() {
        let mut world = world(3);
        let id = world
            .spawn_agent(OMNIVORE, Position::new(0.0, 0.0), SpawnOptions::default())
            .unwrap()
            .id;
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(ForagePlugin::new()), &mut world);
        for x in 0..5 {
            world.consume_food(x, 0, 0.1, id);
        }
        collector.resubscribe(&mut world);
        world.consume_food(5, 0, 0.1, id);

        let forage = collector.plugin::<ForagePlugin>(FORAGE).unwrap();
        let xs: Vec<usize> = forage.samples().iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![3, 4, 5]);
        assert_eq!(forage.total_recorded(), 6);
    }

    #[test]
    fn test_records_during_steps() {
        let mut world = world(1000);
        world
            .spawn_agent(OMNIVORE, Position::new(5.0, 5.0), SpawnOptions::default())
            .unwrap();
        let mut collector = MetricsCollector::new();
        collector.register(Box::new(ForagePlugin::new()), &mut world);
        for _ in 0..10 {
            world.step();
            collector.record_tick(&world.snapshot());
        }
        let samples = collector.plugin::<ForagePlugin>(FORAGE).unwrap().samples();
        assert!(!samples.is_empty());
        assert!(samples.windows(2).all(|w| w[0].tick <= w[1].tick));
    }
}
