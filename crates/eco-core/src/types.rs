//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineageId(pub u64);

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Real-valued 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping into `[0, width) x [0, height)`
    pub fn wrap(&self, width: usize, height: usize) -> Self {
        Self {
            x: wrap_axis(self.x, width as f64),
            y: wrap_axis(self.y, height as f64),
        }
    }

    /// Integer tile coordinates of this (already wrapped) position
    pub fn tile(&self) -> (usize, usize) {
        (self.x.max(0.0) as usize, self.y.max(0.0) as usize)
    }

    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Shortest signed offset from `self` to `other` on a torus of the given size
    pub fn toroidal_delta(&self, other: &Position, width: usize, height: usize) -> (f64, f64) {
        (
            shortest_axis(other.x - self.x, width as f64),
            shortest_axis(other.y - self.y, height as f64),
        )
    }

    pub fn toroidal_distance_sq(&self, other: &Position, width: usize, height: usize) -> f64 {
        let (dx, dy) = self.toroidal_delta(other, width, height);
        dx * dx + dy * dy
    }
}

fn shortest_axis(d: f64, extent: f64) -> f64 {
    let d = d.rem_euclid(extent);
    if d > extent / 2.0 {
        d - extent
    } else {
        d
    }
}

fn wrap_axis(v: f64, extent: f64) -> f64 {
    let w = v.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs
    if w >= extent {
        0.0
    } else {
        w
    }
}

/// Von Neumann step direction for random walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (f64, f64) {
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::East => (1.0, 0.0),
            Direction::West => (-1.0, 0.0),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::East,
            Direction::West,
            Direction::South,
            Direction::North,
        ]
    }
}
