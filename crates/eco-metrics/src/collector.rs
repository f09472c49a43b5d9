//! Plugin host that turns end-of-tick snapshots into analytics.

use eco_world::{EventBus, World, WorldSnapshot};
use std::any::Any;

/// One independent producer of derived metrics.
///
/// Plugins never see the world mutably: they get the event bus once, at
/// registration, and a read-only snapshot at every recorded tick.
pub trait MetricsPlugin: Any + Send {
    /// Unique name used for lookup
    fn name(&self) -> &str;

    /// Hook up event subscriptions and size buffers from the configuration.
    fn subscribe(&mut self, _bus: &mut EventBus, _snapshot: &WorldSnapshot<'_>) {}

    /// Drop everything recorded so far, keeping headers.
    fn reset(&mut self);

    fn record_tick(&mut self, snapshot: &WorldSnapshot<'_>);

    /// End-of-run reporting.
    fn finalize(&mut self, _snapshot: &WorldSnapshot<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Ordered set of plugins driven by the owner of the simulation loop
#[derive(Default)]
pub struct MetricsCollector {
    plugins: Vec<Box<dyn MetricsPlugin>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `plugin` to `world` and add it. A plugin with the same name
    /// is replaced, and every plugin is resubscribed so the old one's
    /// handlers leave the bus.
    pub fn register(&mut self, mut plugin: Box<dyn MetricsPlugin>, world: &mut World) {
        match self.plugins.iter().position(|p| p.name() == plugin.name()) {
            Some(index) => {
                self.plugins[index] = plugin;
                self.resubscribe(world);
            }
            None => {
                let (bus, snapshot) = world.observe();
                plugin.subscribe(bus, &snapshot);
                self.plugins.push(plugin);
            }
        }
    }

    /// Drop every observer on `world` and subscribe each plugin afresh,
    /// typically to a freshly built world.
    pub fn resubscribe(&mut self, world: &mut World) {
        world.clear_observers();
        let (bus, snapshot) = world.observe();
        for plugin in &mut self.plugins {
            plugin.subscribe(bus, &snapshot);
        }
    }

    pub fn record_tick(&mut self, snapshot: &WorldSnapshot<'_>) {
        for plugin in &mut self.plugins {
            plugin.record_tick(snapshot);
        }
    }

    pub fn reset(&mut self) {
        for plugin in &mut self.plugins {
            plugin.reset();
        }
    }

    pub fn finalize(&mut self, snapshot: &WorldSnapshot<'_>) {
        for plugin in &mut self.plugins {
            plugin.finalize(snapshot);
        }
    }

    /// Look up a plugin by name and concrete type.
    pub fn plugin<T: MetricsPlugin>(&self, name: &str) -> Option<&T> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .and_then(|p| p.as_any().downcast_ref::<T>())
    }

    pub fn plugin_mut<T: MetricsPlugin>(&mut self, name: &str) -> Option<&mut T> {
        self.plugins
            .iter_mut()
            .find(|p| p.name() == name)
            .and_then(|p| p.as_any_mut().downcast_mut::<T>())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.plugins.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
