//! Count feedback for offline retraining of the cost model.

use crate::error::ScoreError;
use crate::lattice::{AlignmentLattice, FilledLattice};
use crate::traits::EditCostModel;

impl<M: EditCostModel + ?Sized> FilledLattice<'_, '_, M> {
    /// Record one count per edit on the best path in the bound model.
    ///
    /// Returns the number of edits recorded (the path length).
    pub fn accumulate(&self) -> usize {
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("accumulate_counts");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut recorded = 0;
        for (from, to) in self.lattice.steps_backward() {
            self.model.add_count(self.lattice.step_edit(from, to), 1);
            recorded += 1;
        }
        recorded
    }
}

impl AlignmentLattice {
    /// Push the best path's edits into `model`, which must be the model used
    /// by the last [`fill`](Self::fill).
    ///
    /// # Errors
    /// [`ScoreError::NotFilled`] if the lattice has not been filled since
    /// construction or the last reset.
    pub fn accumulate<M: EditCostModel + ?Sized>(&self, model: &M) -> Result<usize, ScoreError> {
        Ok(self.filled_with(model)?.accumulate())
    }
}
