//! Synchronous publish/subscribe channel between behaviors and the world.
//!
//! Behaviors discover births, deaths and foraging while the agent list is being
//! iterated. Instead of mutating the list inline the world buffers them in an
//! [`EventQueue`] it owns, applies them in one pass once the agent loop is
//! over, and publishes them on the bus for observers.

use eco_core::AgentId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Birth,
    Death,
    FoodConsumed,
}

impl EventKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            EventKind::Birth => 0,
            EventKind::Death => 1,
            EventKind::FoodConsumed => 2,
        }
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Birth {
        parent: AgentId,
    },
    Death {
        agent: AgentId,
    },
    FoodConsumed {
        tick: u64,
        agent: AgentId,
        /// Energy equivalent of the food eaten
        amount: f64,
        x: usize,
        y: usize,
    },
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimEvent::Birth { .. } => EventKind::Birth,
            SimEvent::Death { .. } => EventKind::Death,
            SimEvent::FoodConsumed { .. } => EventKind::FoodConsumed,
        }
    }
}

pub type EventHandler = Box<dyn FnMut(&SimEvent) + Send>;

/// Per-kind subscriber lists, dispatched in subscription order
#[derive(Default)]
pub struct EventBus {
    handlers: [Vec<EventHandler>; EventKind::COUNT],
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&SimEvent) + Send + 'static,
    {
        self.handlers[kind.slot()].push(Box::new(handler));
    }

    /// Invoke every current subscriber for the event's kind.
    pub fn emit(&mut self, event: &SimEvent) {
        for handler in &mut self.handlers[event.kind().slot()] {
            handler(event);
        }
    }

    pub fn unsubscribe(&mut self, kind: EventKind) {
        self.handlers[kind.slot()].clear();
    }

    pub fn unsubscribe_all(&mut self) {
        self.handlers.iter_mut().for_each(Vec::clear);
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers[kind.slot()].len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("birth", &self.subscriber_count(EventKind::Birth))
            .field("death", &self.subscriber_count(EventKind::Death))
            .field("food_consumed", &self.subscriber_count(EventKind::FoodConsumed))
            .finish()
    }
}

/// Shared buffer a subscriber appends to and its owner drains.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this queue to `kind` on `bus`.
    pub fn attach(&self, bus: &mut EventBus, kind: EventKind) {
        let events = Arc::clone(&self.events);
        bus.subscribe(kind, move |event| events.lock().push(event.clone()));
    }

    pub fn push(&self, event: SimEvent) {
        self.events.lock().push(event);
    }

    pub fn take(&self) -> Vec<SimEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
