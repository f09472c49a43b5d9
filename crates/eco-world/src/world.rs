//! World state and the tick algorithm.

use crate::agent::Agent;
use crate::events::{EventBus, EventQueue, SimEvent};
use crate::grid::ResourceGrid;
use crate::lineage::LineageTracker;
use crate::snapshot::WorldSnapshot;
use crate::species::{EatTarget, SpeciesDefinition, SpeciesRegistry};
use eco_core::{
    create_rng, AgentId, Error, Genome, LineageId, Position, Result, SimConfig, SimRng,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Energy given to spawned agents when none is specified
pub const DEFAULT_SPAWN_ENERGY: f64 = 10.0;

type Tile = (usize, usize);

/// Optional arguments to [`World::spawn_agent`]
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub energy: Option<f64>,
    /// Must match the species genome length; random when absent
    pub genome: Option<Genome>,
    /// Join an existing lineage instead of founding a new one
    pub lineage: Option<LineageId>,
}

impl SpawnOptions {
    pub fn with_energy(energy: f64) -> Self {
        Self {
            energy: Some(energy),
            ..Default::default()
        }
    }
}

/// Authoritative simulation state.
///
/// All structural changes to the agent population happen in
/// [`World::drain_events`], never while agents are being iterated.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    registry: SpeciesRegistry,
    grid: ResourceGrid,
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
    occupancy: HashMap<Tile, Vec<AgentId>>,
    /// Agents with a death queued this tick
    doomed: HashSet<AgentId>,
    bus: EventBus,
    queue: EventQueue,
    lineages: LineageTracker,
    rng: SimRng,
    next_agent_id: u64,
    tick: u64,
    births_this_tick: u64,
    deaths_this_tick: u64,
    move_debit: f64,
    basal_debit: f64,
    births_total: u64,
    deaths_total: u64,
}

impl World {
    pub fn new(config: SimConfig, registry: SpeciesRegistry) -> Result<Self> {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let grid = ResourceGrid::from_config(&config, &mut rng);

        Ok(Self {
            config,
            registry,
            grid,
            agents: Vec::new(),
            index: HashMap::new(),
            occupancy: HashMap::new(),
            doomed: HashSet::new(),
            bus: EventBus::new(),
            queue: EventQueue::new(),
            lineages: LineageTracker::new(),
            rng,
            next_agent_id: 0,
            tick: 0,
            births_this_tick: 0,
            deaths_this_tick: 0,
            move_debit: 0.0,
            basal_debit: 0.0,
            births_total: 0,
            deaths_total: 0,
        })
    }

    /// Drop every observer subscribed through the bus. Queued births and
    /// deaths are unaffected.
    pub fn clear_observers(&mut self) {
        self.bus.unsubscribe_all();
    }

    /// Queue a structural event for the drain, then notify observers.
    fn defer(&mut self, event: SimEvent) {
        self.queue.push(event.clone());
        self.bus.emit(&event);
    }

    /// Restart the random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = create_rng(seed);
    }

    /// Construct and register an agent between ticks.
    pub fn spawn_agent(
        &mut self,
        species: &str,
        position: Position,
        options: SpawnOptions,
    ) -> Result<&Agent> {
        let definition = self.registry.get(species)?;
        let expected = definition.params.genome_length;
        let genome = match options.genome {
            Some(genome) if genome.len() != expected => {
                return Err(Error::GenomeLength {
                    species: species.to_string(),
                    expected,
                    actual: genome.len(),
                });
            }
            Some(genome) => genome,
            None => Genome::random(expected, &mut self.rng),
        };
        let lineage = match options.lineage {
            Some(lineage) => lineage,
            None => self.lineages.allocate(),
        };
        self.lineages.register(lineage, &genome, self.tick);

        let energy = options.energy.unwrap_or(DEFAULT_SPAWN_ENERGY);
        let index = self.insert_agent(definition, position, energy, genome, lineage);
        Ok(&self.agents[index])
    }

    fn insert_agent(
        &mut self,
        species: Arc<SpeciesDefinition>,
        position: Position,
        energy: f64,
        genome: Genome,
        lineage: LineageId,
    ) -> usize {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        let position = position.wrap(self.config.width, self.config.height);
        self.agents
            .push(Agent::new(id, lineage, position, energy, genome, species, self.tick));
        let index = self.agents.len() - 1;
        self.index.insert(id, index);
        index
    }

    /// Take up to `units` of food from a tile, returning the amount eaten.
    ///
    /// Every ground-resource depletion goes through here so that foraging is
    /// observable as a `FoodConsumed` event carrying the energy equivalent.
    pub fn consume_food(&mut self, x: usize, y: usize, units: f64, agent: AgentId) -> f64 {
        let eaten = self.grid.take_food(x, y, units);
        if eaten > 0.0 {
            self.bus.emit(&SimEvent::FoodConsumed {
                tick: self.tick,
                agent,
                amount: eaten * self.config.food_value,
                x: x % self.config.width,
                y: y % self.config.height,
            });
        }
        eaten
    }

    /// Take up to `units` of corpse energy from a tile. Not reported as forage.
    pub fn consume_corpse(&mut self, x: usize, y: usize, units: f64) -> f64 {
        self.grid.take_corpse(x, y, units)
    }

    /// Queue a death. The agent stays in the live collection until the drain,
    /// and a second kill in the same tick is ignored.
    pub fn kill_agent(&mut self, agent: AgentId) {
        if self.doomed.insert(agent) {
            self.defer(SimEvent::Death { agent });
        }
    }

    pub fn is_doomed(&self, agent: AgentId) -> bool {
        self.doomed.contains(&agent)
    }

    pub fn request_birth(&mut self, parent: AgentId) {
        self.defer(SimEvent::Birth { parent });
    }

    /// Strip a live agent of its energy and queue its death.
    ///
    /// Returns the energy taken, or `None` if the agent is gone or already dying.
    pub fn devour(&mut self, prey: AgentId) -> Option<f64> {
        if self.doomed.contains(&prey) {
            return None;
        }
        let index = *self.index.get(&prey)?;
        let energy = self.agents[index].energy.max(0.0);
        self.agents[index].energy = 0.0;
        self.kill_agent(prey);
        Some(energy)
    }

    /// Move `agent` to `target` (wrapped into the world), charging
    /// `movement_cost` per tile of straight-line distance.
    pub fn relocate(&mut self, agent: &mut Agent, target: Position) {
        let distance = agent.position.distance_sq(&target).sqrt();
        let from = agent.position.tile();
        agent.position = target.wrap(self.config.width, self.config.height);
        agent.steps_taken += 1;
        agent.distance_travelled += distance;

        let cost = agent.species.params.movement_cost * distance;
        agent.energy -= cost;
        self.move_debit += cost;

        let to = agent.position.tile();
        if from != to {
            if let Some(ids) = self.occupancy.get_mut(&from) {
                ids.retain(|&id| id != agent.id);
            }
            self.occupancy.entry(to).or_default().push(agent.id);
        }
    }

    /// Closest live agent matching `predicate` strictly within `radius`,
    /// measured across the wrapped edges. Ties go to the earliest agent in
    /// the live collection.
    pub fn find_nearest_agent<F>(&self, source: &Agent, predicate: F, radius: f64) -> Option<&Agent>
    where
        F: Fn(&Agent) -> bool,
    {
        let mut nearest = None;
        let mut best = radius * radius;
        for agent in &self.agents {
            if agent.id == source.id || self.doomed.contains(&agent.id) || !predicate(agent) {
                continue;
            }
            let distance = source.position.toroidal_distance_sq(
                &agent.position,
                self.config.width,
                self.config.height,
            );
            if distance < best {
                best = distance;
                nearest = Some(agent);
            }
        }
        nearest
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.births_this_tick = 0;
        self.deaths_this_tick = 0;
        self.move_debit = 0.0;
        self.basal_debit = 0.0;
        self.lineages.reset_tick();
        // scratch was read by metrics after the previous tick
        for agent in &mut self.agents {
            agent.reset_tick_metrics();
        }

        self.grid
            .regrow(self.config.growth_rate, self.config.regrowth_trials, &mut self.rng);

        self.rebuild_occupancy();
        // births and deaths are deferred, so the population is fixed for the loop
        let count = self.agents.len();
        for index in 0..count {
            if self.doomed.contains(&self.agents[index].id) {
                continue;
            }
            let mut agent = self.agents[index].clone();
            self.act(&mut agent);
            self.agents[index] = agent;
        }

        self.drain_events();

        if self.tick % self.config.lineage_interval == 0 {
            self.accrue_lineage_fitness();
        }

        trace!(
            tick = self.tick,
            population = self.agents.len(),
            births = self.births_this_tick,
            deaths = self.deaths_this_tick,
            move_debit = self.move_debit,
            basal_debit = self.basal_debit,
            "Tick complete"
        );
    }

    fn act(&mut self, agent: &mut Agent) {
        agent.tick();
        let basal = agent.basal_rate();
        agent.energy -= basal;
        self.basal_debit += basal;

        let species = Arc::clone(&agent.species);
        let behavior = species.behavior.as_ref();

        behavior.move_agent(agent, self);

        let (x, y) = agent.position.tile();
        behavior.eat(agent, EatTarget::Tile { x, y }, self);

        let tile_mates: Vec<AgentId> = self
            .occupancy
            .get(&(x, y))
            .map(|ids| ids.iter().copied().filter(|&id| id != agent.id).collect())
            .unwrap_or_default();
        for other in tile_mates {
            if !self.doomed.contains(&other) {
                behavior.eat(agent, EatTarget::Agent(other), self);
            }
        }

        behavior.reproduce(agent, self);

        if agent.is_starving() {
            self.kill_agent(agent.id);
        }
    }

    /// Apply queued births and deaths in emission order, then remove the dead
    /// in a single pass. Repeated deaths for one agent are no-ops.
    ///
    /// [`World::step`] calls this once per tick.
    pub fn drain_events(&mut self) {
        let mut culled = HashSet::new();
        for event in self.queue.take() {
            match event {
                SimEvent::Birth { parent } => self.handle_birth(parent),
                SimEvent::Death { agent } => {
                    if !culled.contains(&agent) && self.handle_death(agent) {
                        culled.insert(agent);
                    }
                }
                SimEvent::FoodConsumed { .. } => {}
            }
        }

        if !culled.is_empty() {
            self.agents.retain(|agent| !culled.contains(&agent.id));
            self.reindex();
        }
        self.doomed.clear();
    }

    fn handle_birth(&mut self, parent_id: AgentId) {
        let Some(&index) = self.index.get(&parent_id) else {
            warn!(parent = %parent_id, tick = self.tick, "Birth from unknown parent ignored");
            return;
        };
        let parent = &self.agents[index];
        let species = Arc::clone(&parent.species);
        let parent_genome = Arc::clone(&parent.genome);
        let position = parent.position;
        let mut lineage = parent.lineage_id;

        let child_genome = species.mutate(&parent_genome, &mut self.rng);
        if LineageTracker::branches(&parent_genome, &child_genome, self.config.lineage_threshold) {
            let founded = self.lineages.allocate();
            self.lineages.register(founded, &child_genome, self.tick);
            debug!(
                parent_lineage = %lineage,
                lineage = %founded,
                tick = self.tick,
                "New lineage founded"
            );
            lineage = founded;
        }

        let energy = species.params.birth_cost;
        self.insert_agent(species, position, energy, child_genome, lineage);
        self.lineages.record_birth(lineage);
        self.births_this_tick += 1;
        self.births_total += 1;
    }

    fn handle_death(&mut self, id: AgentId) -> bool {
        let Some(&index) = self.index.get(&id) else {
            warn!(agent = %id, tick = self.tick, "Death for agent outside the live collection ignored");
            return false;
        };
        let agent = &self.agents[index];
        let (x, y) = agent.position.tile();
        let energy = agent.energy;
        let lineage = agent.lineage_id;

        self.grid.add_corpse(x, y, energy);
        self.lineages.record_death(lineage);
        self.deaths_this_tick += 1;
        self.deaths_total += 1;
        true
    }

    fn reindex(&mut self) {
        self.index = self
            .agents
            .iter()
            .enumerate()
            .map(|(index, agent)| (agent.id, index))
            .collect();
    }

    fn rebuild_occupancy(&mut self) {
        self.occupancy.clear();
        for agent in &self.agents {
            self.occupancy
                .entry(agent.position.tile())
                .or_default()
                .push(agent.id);
        }
    }

    fn accrue_lineage_fitness(&mut self) {
        let mut members: BTreeMap<LineageId, u64> = BTreeMap::new();
        for agent in &self.agents {
            *members.entry(agent.lineage_id).or_default() += 1;
        }
        self.lineages
            .accrue(&members, self.config.lineage_interval);
    }

    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            tick: self.tick,
            config: &self.config,
            agents: &self.agents,
            food: self.grid.food(),
            births_this_tick: self.births_this_tick,
            deaths_this_tick: self.deaths_this_tick,
            move_debit: self.move_debit,
            basal_debit: self.basal_debit,
            births_total: self.births_total,
            deaths_total: self.deaths_total,
            lineages: self.lineages.as_map(),
        }
    }

    /// Event bus and snapshot at once, for observers that subscribe based on
    /// the current configuration.
    pub fn observe(&mut self) -> (&mut EventBus, WorldSnapshot<'_>) {
        let snapshot = WorldSnapshot {
            tick: self.tick,
            config: &self.config,
            agents: &self.agents,
            food: self.grid.food(),
            births_this_tick: self.births_this_tick,
            deaths_this_tick: self.deaths_this_tick,
            move_debit: self.move_debit,
            basal_debit: self.basal_debit,
            births_total: self.births_total,
            deaths_total: self.deaths_total,
            lineages: self.lineages.as_map(),
        };
        (&mut self.bus, snapshot)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    pub fn grid(&self) -> &ResourceGrid {
        &self.grid
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&index| &self.agents[index])
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }

    pub fn lineages(&self) -> &LineageTracker {
        &self.lineages
    }

    pub fn births_total(&self) -> u64 {
        self.births_total
    }

    pub fn deaths_total(&self) -> u64 {
        self.deaths_total
    }

    pub fn births_this_tick(&self) -> u64 {
        self.births_this_tick
    }

    pub fn deaths_this_tick(&self) -> u64 {
        self.deaths_this_tick
    }

    pub fn avg_energy(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.energy).sum::<f64>() / self.agents.len() as f64
    }

    /// The world's random stream, for behaviors
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Event bus, for observers that subscribe to births, deaths or forage.
    /// Events emitted here directly reach observers only, never the drain.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::species::{SpeciesBehavior, HERBIVORE, OMNIVORE, PREDATOR};
    use eco_core::SpeciesParams;
    use parking_lot::Mutex;
    use rand::Rng;

    fn small_config() -> SimConfig {
        SimConfig {
            width: 50,
            height: 50,
            seed: 42,
            ..Default::default()
        }
    }

    fn world(config: SimConfig) -> World {
        World::new(config, SpeciesRegistry::with_defaults()).unwrap()
    }

    fn spawn_at(world: &mut World, species: &str, x: f64, y: f64, energy: f64) -> AgentId {
        world
            .spawn_agent(species, Position::new(x, y), SpawnOptions::with_energy(energy))
            .unwrap()
            .id
    }

    #[test]
    fn test_world_creation_validates_config() {
        let config = SimConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            World::new(config, SpeciesRegistry::with_defaults()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_spawn_agent() {
        let mut world = world(small_config());
        let agent = world
            .spawn_agent(OMNIVORE, Position::new(-1.0, 52.0), SpawnOptions::default())
            .unwrap();
        assert_eq!(agent.energy, DEFAULT_SPAWN_ENERGY);
        assert_eq!(agent.position, Position::new(49.0, 2.0));
        assert_eq!(agent.genome.len(), 3);
        let (id, lineage) = (agent.id, agent.lineage_id);

        let sibling = world
            .spawn_agent(
                OMNIVORE,
                Position::new(1.0, 1.0),
                SpawnOptions {
                    lineage: Some(lineage),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_ne!(sibling.id, id);
        assert_eq!(sibling.lineage_id, lineage);

        let stranger = spawn_at(&mut world, OMNIVORE, 2.0, 2.0, 5.0);
        assert_ne!(world.agent(stranger).unwrap().lineage_id, lineage);
        assert_eq!(world.population(), 3);
        assert_eq!(world.lineages().len(), 2);
    }

    #[test]
    fn test_spawn_errors() {
        let mut world = world(small_config());
        assert!(matches!(
            world.spawn_agent("dragon", Position::new(0.0, 0.0), SpawnOptions::default()),
            Err(Error::UnknownSpecies(_))
        ));

        let options = SpawnOptions {
            genome: Some(Genome::new(vec![0.5; 5])),
            ..Default::default()
        };
        assert!(matches!(
            world.spawn_agent(OMNIVORE, Position::new(0.0, 0.0), options),
            Err(Error::GenomeLength { expected: 3, actual: 5, .. })
        ));
        assert_eq!(world.population(), 0);
    }

    #[test]
    fn test_consume_food_conservation() {
        let mut world = world(small_config());
        let id = spawn_at(&mut world, OMNIVORE, 3.0, 4.0, 10.0);
        let forage = EventQueue::new();
        forage.attach(world.bus_mut(), EventKind::FoodConsumed);

        let before = world.grid().food_at(3, 4);
        assert_eq!(before, 0.5);
        let eaten = world.consume_food(3, 4, 0.2, id);
        assert_eq!(eaten, 0.2);
        assert!((world.grid().food_at(3, 4) - 0.3).abs() < 1e-12);

        let eaten = world.consume_food(3, 4, 1.0, id);
        assert!((eaten - 0.3).abs() < 1e-12);
        assert_eq!(world.grid().food_at(3, 4), 0.0);
        assert_eq!(world.consume_food(3, 4, 1.0, id), 0.0);

        let events = forage.take();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SimEvent::FoodConsumed { agent, amount, x, y, .. } => {
                assert_eq!(*agent, id);
                assert!((amount - 2.0).abs() < 1e-12);
                assert_eq!((*x, *y), (3, 4));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_find_nearest_agent() {
        let mut world = world(small_config());
        let source = spawn_at(&mut world, PREDATOR, 10.0, 10.0, 10.0);
        let far = spawn_at(&mut world, OMNIVORE, 14.0, 10.0, 10.0);
        let tie_first = spawn_at(&mut world, OMNIVORE, 12.0, 10.0, 10.0);
        let tie_second = spawn_at(&mut world, OMNIVORE, 10.0, 12.0, 10.0);
        let _hunter = spawn_at(&mut world, PREDATOR, 11.0, 10.0, 10.0);

        let source = world.agent(source).unwrap().clone();
        let prey = |a: &Agent| !a.species.is_hunter();

        let nearest = world.find_nearest_agent(&source, prey, 5.0).unwrap();
        assert_eq!(nearest.id, tie_first);
        // strictly inside the radius
        assert!(world.find_nearest_agent(&source, prey, 2.0).is_none());
        assert_eq!(world.find_nearest_agent(&source, |_| true, 5.0).unwrap().position.x, 11.0);

        world.kill_agent(tie_first);
        world.kill_agent(tie_second);
        assert_eq!(world.find_nearest_agent(&source, prey, 5.0).unwrap().id, far);
    }

    #[test]
    fn test_kill_is_deferred_and_idempotent() {
        let mut world = world(small_config());
        let victim = spawn_at(&mut world, OMNIVORE, 1.0, 1.0, 10.0);
        let survivor = spawn_at(&mut world, OMNIVORE, 2.0, 2.0, 10.0);

        let deaths = EventQueue::new();
        deaths.attach(world.bus_mut(), EventKind::Death);

        world.kill_agent(victim);
        world.kill_agent(victim);
        // observers only; never reaches the drain
        world.bus_mut().emit(&SimEvent::Death { agent: survivor });
        assert_eq!(deaths.len(), 2);
        assert!(world.agent(victim).is_some());
        assert!(world.is_doomed(victim));

        world.drain_events();
        assert!(world.agent(victim).is_none());
        assert!(world.agent(survivor).is_some());
        assert_eq!(world.deaths_total(), 1);
        assert!(world.grid().corpse_at(1, 1) > 9.0);

        // a stale death after removal changes nothing
        world.kill_agent(victim);
        world.drain_events();
        assert_eq!(world.deaths_total(), 1);
        assert_eq!(world.population(), 1);
    }

    #[test]
    fn test_unsubscribing_observers_keeps_deaths() {
        let config = SimConfig {
            initial_food: 0.0,
            growth_rate: 0.0,
            ..small_config()
        };
        let mut world = world(config);
        let id = spawn_at(&mut world, OMNIVORE, 5.0, 5.0, 0.01);
        world.bus_mut().unsubscribe_all();
        world.bus_mut().unsubscribe(EventKind::Death);

        for _ in 0..5 {
            world.step();
        }
        assert!(world.agent(id).is_none());
        assert_eq!(world.population(), 0);
        assert_eq!(world.deaths_total(), 1);

        world.clear_observers();
        let parent = spawn_at(&mut world, OMNIVORE, 5.0, 5.0, 25.0);
        world.request_birth(parent);
        world.drain_events();
        assert_eq!(world.population(), 2);
    }

    #[test]
    fn test_find_nearest_agent_wraps() {
        let config = SimConfig {
            width: 200,
            height: 200,
            ..small_config()
        };
        let mut world = world(config);
        let herbivore = spawn_at(&mut world, HERBIVORE, 0.5, 50.0, 10.0);
        let predator = spawn_at(&mut world, PREDATOR, 199.5, 50.0, 10.0);
        let _inland = spawn_at(&mut world, PREDATOR, 4.5, 50.0, 10.0);

        let source = world.agent(herbivore).unwrap().clone();
        let hunter = world
            .find_nearest_agent(&source, |a| a.species.is_hunter(), 5.0)
            .unwrap();
        assert_eq!(hunter.id, predator);
    }

    #[test]
    fn test_pursuit_takes_short_way_across_edge() {
        let config = SimConfig {
            width: 200,
            height: 200,
            initial_food: 0.0,
            growth_rate: 0.0,
            ..small_config()
        };
        let mut world = world(config);
        let fast = SpawnOptions {
            energy: Some(10.0),
            genome: Some(Genome::new(vec![1.0, 0.5, 0.5])),
            lineage: None,
        };
        let predator = world
            .spawn_agent(PREDATOR, Position::new(198.5, 50.0), fast)
            .unwrap()
            .id;
        spawn_at(&mut world, OMNIVORE, 1.0, 50.0, 10.0);

        world.step();
        let hunter = world.agent(predator).unwrap();
        assert_eq!(hunter.position, Position::new(1.0, 50.0));
        assert_eq!(hunter.distance_travelled, 2.5);
    }

    #[test]
    fn test_birth_spawns_mutated_child() {
        let mut world = world(small_config());
        let parent = spawn_at(&mut world, OMNIVORE, 5.0, 5.0, 25.0);
        let lineage = world.agent(parent).unwrap().lineage_id;

        world.request_birth(parent);
        world.request_birth(AgentId(999));
        world.drain_events();

        assert_eq!(world.population(), 2);
        let child = &world.agents()[1];
        assert_eq!(child.energy, SpeciesParams::omnivore().birth_cost);
        assert_eq!(child.position, Position::new(5.0, 5.0));
        assert_eq!(child.born_at, 0);
        assert_eq!(world.births_total(), 1);
        let meta = world.lineages().get(child.lineage_id).unwrap();
        assert_eq!(meta.births, 1);
        if child.lineage_id != lineage {
            assert_eq!(meta.founder_genome, *child.genome);
        }
    }

    #[test]
    fn test_starvation_without_reproduction() {
        let config = SimConfig {
            initial_food: 0.0,
            growth_rate: 0.0,
            seed: 7,
            ..Default::default()
        };
        let mut world = world(config);
        for _ in 0..50 {
            let x = world.rng_mut().gen::<f64>() * 200.0;
            let y = world.rng_mut().gen::<f64>() * 200.0;
            spawn_at(&mut world, OMNIVORE, x, y, 15.0);
        }

        // worst case 15 / (0.005 + 0.02) = 600 ticks
        for _ in 0..700 {
            world.step();
        }
        assert_eq!(world.population(), 0);
        assert_eq!(world.deaths_total(), 50);
        assert_eq!(world.births_total(), 0);
    }

    #[test]
    fn test_growth_driven_reproduction() {
        let config = SimConfig {
            width: 100,
            height: 100,
            seed: 3,
            ..Default::default()
        };
        let mut world = world(config);
        for i in 0..5 {
            spawn_at(&mut world, OMNIVORE, 10.0 + 15.0 * i as f64, 50.0, 15.0);
        }
        assert_eq!(world.registry().get(OMNIVORE).unwrap().params.birth_threshold, 20.0);

        for _ in 0..500 {
            world.step();
        }
        assert!(world.population() > 5, "population {}", world.population());
        assert!(world.births_total() > 0);
    }

    #[test]
    fn test_predation() {
        let mut world = world(small_config());
        let predator_id = spawn_at(&mut world, PREDATOR, 10.0, 10.0, 10.0);
        let prey_id = spawn_at(&mut world, HERBIVORE, 10.0, 10.0, 10.0);
        let rival_id = spawn_at(&mut world, PREDATOR, 10.0, 10.0, 10.0);

        let mut predator = world.agent(predator_id).unwrap().clone();
        let species = Arc::clone(&predator.species);
        let before = predator.energy;
        let deaths_before = world.deaths_total();

        species
            .behavior
            .eat(&mut predator, EatTarget::Agent(rival_id), &mut world);
        assert_eq!(predator.energy, before);

        species
            .behavior
            .eat(&mut predator, EatTarget::Agent(prey_id), &mut world);
        // already dying prey cannot be eaten twice
        species
            .behavior
            .eat(&mut predator, EatTarget::Agent(prey_id), &mut world);
        world.drain_events();

        assert!(world.agent(prey_id).is_none());
        assert!(world.agent(rival_id).is_some());
        assert!(predator.energy > before);
        assert_eq!(predator.energy, 20.0);
        assert_eq!(world.deaths_total(), deaths_before + 1);
        // the carcass was stripped, so nothing is left to scavenge
        assert_eq!(world.grid().corpse_at(10, 10), 0.0);
    }

    #[test]
    fn test_predators_hunt_during_steps() {
        let config = SimConfig {
            initial_food: 0.0,
            growth_rate: 0.0,
            ..small_config()
        };
        let mut world = world(config);
        let fast = SpawnOptions {
            energy: Some(10.0),
            genome: Some(Genome::new(vec![1.0, 0.5, 0.5])),
            lineage: None,
        };
        let predator = world
            .spawn_agent(PREDATOR, Position::new(10.0, 10.0), fast)
            .unwrap()
            .id;
        let prey = spawn_at(&mut world, OMNIVORE, 12.0, 10.0, 10.0);
        assert_eq!(world.agent(predator).unwrap().speed(), 3.0);

        for _ in 0..10 {
            world.step();
            if world.agent(prey).is_none() {
                break;
            }
        }
        assert!(world.agent(prey).is_none());
        assert!(world.agent(predator).unwrap().energy > 10.0);
    }

    #[test]
    fn test_population_accounting() {
        let mut world = world(small_config());
        for i in 0..20 {
            let species = [OMNIVORE, HERBIVORE, PREDATOR][i % 3];
            spawn_at(&mut world, species, (i * 2) as f64, (i * 3) as f64, 15.0);
        }
        let initial = world.population() as u64;

        let (mut births, mut deaths) = (0, 0);
        for _ in 0..300 {
            world.step();
            births += world.births_this_tick();
            deaths += world.deaths_this_tick();

            let mut ids: Vec<_> = world.agents().iter().map(|a| a.id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), world.population());
        }
        assert_eq!(world.births_total(), births);
        assert_eq!(world.deaths_total(), deaths);
        assert_eq!(world.population() as u64, initial + births - deaths);
    }

    #[test]
    fn test_resource_bound_holds() {
        let config = SimConfig {
            growth_rate: 3.0,
            regrowth_trials: 2000,
            ..small_config()
        };
        let mut world = world(config);
        for i in 0..10 {
            spawn_at(&mut world, OMNIVORE, i as f64, i as f64, 15.0);
        }
        for _ in 0..100 {
            world.step();
            let max = world.config().food_value;
            assert!(world.grid().food().iter().all(|&f| (0.0..=max).contains(&f)));
        }
    }

    #[allow(clippy::type_complexity)]
    fn fingerprint(seed: u64) -> (Vec<(u64, usize, u64, u64, u64)>, Vec<(u64, u64, u64, u64)>) {
        let config = SimConfig {
            seed,
            ..small_config()
        };
        let mut world = world(config);
        for i in 0..30 {
            let species = [OMNIVORE, HERBIVORE, PREDATOR][i % 3];
            let x = world.rng_mut().gen::<f64>() * 50.0;
            let y = world.rng_mut().gen::<f64>() * 50.0;
            spawn_at(&mut world, species, x, y, 15.0);
        }
        let mut series = Vec::new();
        for _ in 0..200 {
            world.step();
            series.push((
                world.tick(),
                world.population(),
                world.births_this_tick(),
                world.deaths_this_tick(),
                world.avg_energy().to_bits(),
            ));
        }
        let agents = world
            .agents()
            .iter()
            .map(|a| {
                (
                    a.id.0,
                    a.position.x.to_bits(),
                    a.position.y.to_bits(),
                    a.energy.to_bits(),
                )
            })
            .collect();
        (series, agents)
    }

    #[test]
    fn test_determinism() {
        assert_eq!(fingerprint(11), fingerprint(11));
        assert_ne!(fingerprint(11).0, fingerprint(12).0);
    }

    #[test]
    fn test_reseed_replays_stream() {
        let mut a = world(small_config());
        let mut b = world(small_config());
        a.reseed(5);
        b.reseed(5);
        assert_eq!(a.rng_mut().gen::<u64>(), b.rng_mut().gen::<u64>());
    }

    /// Logs every agent it moves and kills the agent with the next id.
    #[derive(Debug)]
    struct Sentinel {
        moved: Arc<Mutex<Vec<(u64, u64)>>>,
    }

    impl SpeciesBehavior for Sentinel {
        fn move_agent(&self, agent: &mut Agent, world: &mut World) {
            self.moved.lock().push((world.tick(), agent.id.0));
        }

        fn eat(&self, agent: &mut Agent, target: EatTarget, world: &mut World) {
            if matches!(target, EatTarget::Tile { .. }) && agent.id.0 % 2 == 0 {
                world.kill_agent(AgentId(agent.id.0 + 1));
            }
        }

        fn reproduce(&self, _agent: &mut Agent, _world: &mut World) {}
    }

    #[test]
    fn test_no_double_processing() {
        let moved = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SpeciesRegistry::new();
        registry
            .register(SpeciesDefinition::new(
                "sentinel",
                SpeciesParams::omnivore(),
                Box::new(Sentinel {
                    moved: Arc::clone(&moved),
                }),
            ))
            .unwrap();
        let mut world = World::new(small_config(), registry).unwrap();
        for i in 0..6 {
            spawn_at(&mut world, "sentinel", i as f64, 0.0, 10.0);
        }

        world.step();
        let ids: Vec<u64> = world.agents().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 2, 4]);
        world.step();

        assert_eq!(
            *moved.lock(),
            vec![(1, 0), (1, 2), (1, 4), (2, 0), (2, 2), (2, 4)]
        );
        assert_eq!(world.deaths_total(), 3);
        assert_eq!(world.population(), 3);
    }

    #[test]
    fn test_lineage_fitness_accrues_on_interval() {
        let config = SimConfig {
            lineage_interval: 10,
            ..small_config()
        };
        let mut world = world(config);
        let id = spawn_at(&mut world, OMNIVORE, 1.0, 1.0, 15.0);
        let lineage = world.agent(id).unwrap().lineage_id;
        for _ in 0..10 {
            world.step();
        }
        let meta = world.lineages().get(lineage).unwrap();
        let members = world
            .agents()
            .iter()
            .filter(|a| a.lineage_id == lineage)
            .count() as u64;
        assert_eq!(meta.cumulative_life_ticks, members * 10);
    }

    #[test]
    fn test_snapshot_reflects_tick() {
        let mut world = world(small_config());
        spawn_at(&mut world, OMNIVORE, 1.0, 1.0, 15.0);
        world.step();
        let snapshot = world.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.population(), 1);
        assert_eq!(snapshot.food.len(), 2500);
        assert!(snapshot.basal_debit > 0.0);
        assert!((snapshot.move_debit - 0.02).abs() < 1e-12);
        assert_eq!(snapshot.agents[0].steps_taken, 1);
    }
}
