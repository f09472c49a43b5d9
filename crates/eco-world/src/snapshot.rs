//! Read-only view of world state handed to metrics and other observers.

use crate::agent::Agent;
use crate::lineage::rank_lineages;
use eco_core::{LineageFitness, LineageId, LineageMetadata, SimConfig};
use std::collections::BTreeMap;

/// State at the end of a tick; borrowing prevents consumers from mutating it
#[derive(Debug, Clone, Copy)]
pub struct WorldSnapshot<'a> {
    pub tick: u64,
    pub config: &'a SimConfig,
    pub agents: &'a [Agent],
    pub food: &'a [f64],
    pub births_this_tick: u64,
    pub deaths_this_tick: u64,
    pub move_debit: f64,
    pub basal_debit: f64,
    pub births_total: u64,
    pub deaths_total: u64,
    pub lineages: &'a BTreeMap<LineageId, LineageMetadata>,
}

impl WorldSnapshot<'_> {
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// Live members per lineage
    pub fn lineage_members(&self) -> BTreeMap<LineageId, Vec<&Agent>> {
        let mut groups: BTreeMap<LineageId, Vec<&Agent>> = BTreeMap::new();
        for agent in self.agents {
            groups.entry(agent.lineage_id).or_default().push(agent);
        }
        groups
    }

    /// Lineages by cumulative fitness, best first
    pub fn ranked_lineages(&self) -> Vec<LineageFitness> {
        rank_lineages(self.lineages)
    }
}
