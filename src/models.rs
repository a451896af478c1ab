//! In-memory reference implementation of [`EditCostModel`].
//!
//! [`EditTable`] prices edits from a sparse table of explicit costs and
//! falls back to [`DefaultCosts`] by edit kind. Counts recorded during
//! training sit behind a mutex so one table can be shared by lattices scored
//! on many threads. Persisting tables and re-estimating costs from counts
//! belong to the caller.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::token::{Edit, EditKind};
use crate::traits::EditCostModel;

/// Fallback cost for each kind of edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultCosts {
    pub self_match: u32,
    pub substitution: u32,
    pub insertion: u32,
    pub deletion: u32,
}

impl Default for DefaultCosts {
    /// Plain Levenshtein costs.
    fn default() -> Self {
        Self {
            self_match: 0,
            substitution: 1,
            insertion: 1,
            deletion: 1,
        }
    }
}

impl DefaultCosts {
    #[inline]
    pub fn cost_of(&self, kind: EditKind) -> u32 {
        match kind {
            EditKind::Match => self.self_match,
            EditKind::Substitution => self.substitution,
            EditKind::Insertion => self.insertion,
            EditKind::Deletion => self.deletion,
        }
    }
}

/// Sparse per-edit cost table with a shared count accumulator.
#[derive(Debug, Default)]
pub struct EditTable {
    defaults: DefaultCosts,
    costs: HashMap<Edit, u32>,
    counts: Mutex<HashMap<Edit, u64>>,
}

impl EditTable {
    pub fn new(defaults: DefaultCosts) -> Self {
        Self {
            defaults,
            costs: HashMap::new(),
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> DefaultCosts {
        self.defaults
    }

    /// Override the cost of one edit.
    pub fn set_cost(&mut self, edit: Edit, cost: u32) {
        self.costs.insert(edit, cost);
    }

    /// Builder-style [`set_cost`](Self::set_cost).
    pub fn with_cost(mut self, edit: Edit, cost: u32) -> Self {
        self.set_cost(edit, cost);
        self
    }

    /// Replace every explicit cost, e.g. after an EM re-estimation step.
    pub fn replace_costs(&mut self, costs: HashMap<Edit, u32>) {
        self.costs = costs;
    }

    /// Observations recorded for `edit` so far.
    pub fn count(&self, edit: Edit) -> u64 {
        self.counts.lock().get(&edit).copied().unwrap_or(0)
    }

    /// Sum of all recorded observations.
    pub fn total_count(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    /// Snapshot of every recorded count.
    pub fn counts(&self) -> HashMap<Edit, u64> {
        self.counts.lock().clone()
    }

    /// Drain the accumulator, returning what was recorded.
    pub fn take_counts(&self) -> HashMap<Edit, u64> {
        std::mem::take(&mut *self.counts.lock())
    }

    pub fn clear_counts(&self) {
        self.counts.lock().clear();
    }
}

impl EditCostModel for EditTable {
    #[inline]
    fn cost(&self, edit: Edit) -> u32 {
        match self.costs.get(&edit) {
            Some(&c) => c,
            None => self.defaults.cost_of(edit.kind()),
        }
    }

    fn add_count(&self, edit: Edit, increment: u64) {
        *self.counts.lock().entry(edit).or_insert(0) += increment;
    }
}
