//! The cost-model seam between the alignment engine and training.
//!
//! The engine never owns a cost model. It borrows one for the duration of
//! each `fill`, `score` or `accumulate` call and only needs two things:
//! - an integer cost for every edit, and
//! - somewhere to record how often each edit was chosen.
//!
//! Turning recorded counts back into costs (the EM step) happens outside
//! this crate, between training passes.

use crate::token::Edit;

/// Trainable per-edit cost model.
///
/// `add_count` takes `&self` so a single model can be shared by many
/// lattices at once; implementations are responsible for making count
/// updates atomic. [`crate::models::EditTable`] does this with a mutex.
pub trait EditCostModel {
    /// Non-negative cost of `edit`.
    ///
    /// Edits with [`Token::EMPTY`](crate::token::Token::EMPTY) on one side
    /// are insertions or deletions and must be priced like any other edit.
    fn cost(&self, edit: Edit) -> u32;

    /// Record `increment` further observations of `edit`.
    fn add_count(&self, edit: Edit, increment: u64);
}

impl<M: EditCostModel + ?Sized> EditCostModel for &M {
    #[inline]
    fn cost(&self, edit: Edit) -> u32 {
        (**self).cost(edit)
    }

    #[inline]
    fn add_count(&self, edit: Edit, increment: u64) {
        (**self).add_count(edit, increment)
    }
}
