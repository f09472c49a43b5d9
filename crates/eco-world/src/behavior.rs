//! Built-in species behaviors.

use crate::agent::Agent;
use crate::species::{EatTarget, SpeciesBehavior};
use crate::world::World;
use eco_core::{Direction, Position};
use rand::Rng;

/// One von Neumann step in a random direction.
fn random_step(agent: &mut Agent, world: &mut World) {
    let directions = Direction::all();
    let direction = directions[world.rng_mut().gen_range(0..directions.len())];
    let (dx, dy) = direction.to_delta();
    let target = agent.position.add(dx, dy);
    world.relocate(agent, target);
}

/// Move up to `step` tiles along the shortest wrapped line from `agent`
/// through `toward`, or directly away from it when `step` is negative.
fn step_along(agent: &mut Agent, toward: Position, step: f64, world: &mut World) {
    let (width, height) = (world.config().width, world.config().height);
    let (dx, dy) = agent.position.toroidal_delta(&toward, width, height);
    let distance = (dx * dx + dy * dy).sqrt();
    if distance == 0.0 {
        random_step(agent, world);
        return;
    }
    let target = if step >= distance {
        agent.position.add(dx, dy)
    } else {
        agent.position.add(dx / distance * step, dy / distance * step)
    };
    world.relocate(agent, target);
}

/// Bite the ground resource on the agent's tile.
fn graze(agent: &mut Agent, x: usize, y: usize, world: &mut World) {
    let food_value = world.config().food_value;
    let units = agent.species.params.bite_energy / food_value;
    let eaten = world.consume_food(x, y, units, agent.id);
    agent.feed(eaten * food_value);
}

/// Random walker that grazes wherever it lands
#[derive(Debug, Clone, Copy, Default)]
pub struct Omnivore;

impl SpeciesBehavior for Omnivore {
    fn move_agent(&self, agent: &mut Agent, world: &mut World) {
        random_step(agent, world);
    }

    fn eat(&self, agent: &mut Agent, target: EatTarget, world: &mut World) {
        if let EatTarget::Tile { x, y } = target {
            graze(agent, x, y, world);
        }
    }
}

/// Grazer that runs from the nearest hunter it can see
#[derive(Debug, Clone, Copy, Default)]
pub struct Herbivore;

impl SpeciesBehavior for Herbivore {
    fn move_agent(&self, agent: &mut Agent, world: &mut World) {
        let threat = world
            .find_nearest_agent(agent, |other| other.species.is_hunter(), agent.vision())
            .map(|hunter| hunter.position);
        match threat {
            Some(hunter) => {
                let speed = agent.speed();
                step_along(agent, hunter, -speed, world)
            }
            None => random_step(agent, world),
        }
    }

    fn eat(&self, agent: &mut Agent, target: EatTarget, world: &mut World) {
        if let EatTarget::Tile { x, y } = target {
            graze(agent, x, y, world);
        }
    }
}

/// Pursuit hunter. Eats co-located non-hunters and scavenges corpses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Predator;

impl SpeciesBehavior for Predator {
    fn move_agent(&self, agent: &mut Agent, world: &mut World) {
        let radius = agent
            .species
            .params
            .hunting_radius
            .unwrap_or_else(|| agent.vision());
        let prey = world
            .find_nearest_agent(agent, |other| !other.species.is_hunter(), radius)
            .map(|prey| prey.position);
        match prey {
            Some(prey) => {
                let speed = agent.speed();
                step_along(agent, prey, speed, world)
            }
            None => random_step(agent, world),
        }
    }

    fn eat(&self, agent: &mut Agent, target: EatTarget, world: &mut World) {
        match target {
            EatTarget::Tile { x, y } => {
                let eaten = world.consume_corpse(x, y, agent.species.params.bite_energy);
                agent.feed(eaten);
            }
            EatTarget::Agent(prey) => {
                let edible = world
                    .agent(prey)
                    .is_some_and(|other| !other.species.is_hunter());
                if edible {
                    if let Some(energy) = world.devour(prey) {
                        agent.feed(energy);
                    }
                }
            }
        }
    }
}
