//! Lineage registry and speciation rule.

use eco_core::{Genome, LineageFitness, LineageId, LineageMetadata};
use std::collections::BTreeMap;

/// Lineages by cumulative life-ticks, best first; ties by id.
pub fn rank_lineages(lineages: &BTreeMap<LineageId, LineageMetadata>) -> Vec<LineageFitness> {
    let mut ranking: Vec<LineageFitness> = lineages
        .iter()
        .map(|(&lineage_id, meta)| LineageFitness {
            lineage_id,
            fitness: meta.cumulative_life_ticks,
        })
        .collect();
    ranking.sort_by(|a, b| b.fitness.cmp(&a.fitness).then(a.lineage_id.cmp(&b.lineage_id)));
    ranking
}

/// Append-only lineage table kept by the world
#[derive(Debug, Clone, Default)]
pub struct LineageTracker {
    next_id: u64,
    lineages: BTreeMap<LineageId, LineageMetadata>,
}

impl LineageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A birth founds a new lineage when any locus moved by more than `threshold`.
    pub fn branches(parent: &Genome, child: &Genome, threshold: f64) -> bool {
        parent.max_locus_delta(child) > threshold
    }

    pub fn allocate(&mut self) -> LineageId {
        let id = LineageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register `id` unless already known. Returns whether it was new.
    pub fn register(&mut self, id: LineageId, founder: &Genome, tick: u64) -> bool {
        if self.lineages.contains_key(&id) {
            return false;
        }
        // caller-chosen ids must never be handed out again
        self.next_id = self.next_id.max(id.0 + 1);
        self.lineages
            .insert(id, LineageMetadata::new(founder.clone(), tick));
        true
    }

    pub fn get(&self, id: LineageId) -> Option<&LineageMetadata> {
        self.lineages.get(&id)
    }

    pub fn record_birth(&mut self, id: LineageId) {
        if let Some(meta) = self.lineages.get_mut(&id) {
            meta.record_birth();
        }
    }

    pub fn record_death(&mut self, id: LineageId) {
        if let Some(meta) = self.lineages.get_mut(&id) {
            meta.record_death();
        }
    }

    pub fn reset_tick(&mut self) {
        self.lineages.values_mut().for_each(LineageMetadata::reset_tick);
    }

    /// Credit each lineage with `members x interval` life-ticks.
    pub fn accrue(&mut self, members: &BTreeMap<LineageId, u64>, interval: u64) {
        for (id, &count) in members {
            if let Some(meta) = self.lineages.get_mut(id) {
                meta.accrue(count, interval);
            }
        }
    }

    pub fn ranked(&self) -> Vec<LineageFitness> {
        rank_lineages(&self.lineages)
    }

    pub fn len(&self) -> usize {
        self.lineages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LineageId, &LineageMetadata)> + '_ {
        self.lineages.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<LineageId, LineageMetadata> {
        &self.lineages
    }
}
