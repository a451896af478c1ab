//! Normalized similarity score for the best path of a filled lattice.
//!
//! Edit `i` on the path (counted from the start of the names) is divided by
//! `i + smoothing`, so a mismatch in the first letters costs more than the
//! same mismatch near the end. The weighted sum is normalized by the larger
//! of the two names' self-match baselines.
//!
//! Summation order is fixed (start of the path first) so results are
//! reproducible to the bit.

use crate::error::{check_smoothing, ScoreError};
use crate::lattice::{AlignmentLattice, FilledLattice};
use crate::token::{Edit, Token};
use crate::traits::EditCostModel;

/// Default positional smoothing: weights run 1, 1/2, 1/3, ...
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// `cost` discounted by its position on the path.
#[inline]
pub fn weighted_cost(cost: u32, position: usize, smoothing: f64) -> f64 {
    f64::from(cost) / (position as f64 + smoothing)
}

/// Weighted cost of aligning `seq` with itself, token by token.
///
/// # Errors
/// Returns [`ScoreError::InvalidSmoothing`] unless `smoothing` is finite and positive.
pub fn self_cost<M: EditCostModel + ?Sized>(
    seq: &[Token],
    model: &M,
    smoothing: f64,
) -> Result<f64, ScoreError> {
    let smoothing = check_smoothing(smoothing)?;
    Ok(self_cost_unchecked(seq, model, smoothing))
}

fn self_cost_unchecked<M: EditCostModel + ?Sized>(
    seq: &[Token],
    model: &M,
    smoothing: f64,
) -> f64 {
    seq.iter()
        .enumerate()
        .map(|(i, &t)| weighted_cost(model.cost(Edit::new(t, t)), i, smoothing))
        .fold(0.0, |acc, c| acc + c)
}

/// A scored best path with its intermediate terms.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPath {
    /// Final similarity distance; 0 is a perfect zero-cost alignment.
    pub score: f64,
    /// Positionally weighted path cost before normalization.
    pub raw_cost: f64,
    /// `max(self_cost(source), self_cost(target))`.
    pub baseline: f64,
    /// Path edits in forward order.
    pub edits: Vec<Edit>,
}

impl<M: EditCostModel + ?Sized> FilledLattice<'_, '_, M> {
    /// Similarity distance of the best path; larger means less similar.
    ///
    /// The value has no fixed ceiling; it depends on the cost range of the
    /// model. When both self-match baselines are zero the raw weighted cost is
    /// returned unnormalized.
    ///
    /// # Errors
    /// Returns [`ScoreError::InvalidSmoothing`] unless `smoothing` is finite and positive.
    pub fn score(&self, smoothing: f64) -> Result<f64, ScoreError> {
        self.scored_path(smoothing).map(|p| p.score)
    }

    /// Like [`score`](Self::score) but keeps the path and both normalization terms.
    pub fn scored_path(&self, smoothing: f64) -> Result<ScoredPath, ScoreError> {
        let smoothing = check_smoothing(smoothing)?;
        Ok(self.scored_path_unchecked(smoothing))
    }

    /// `smoothing` must already have passed [`check_smoothing`].
    pub(crate) fn scored_path_unchecked(&self, smoothing: f64) -> ScoredPath {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("score_path", smoothing);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let edits = self.best_edits();
        let raw_cost = edits
            .iter()
            .enumerate()
            .map(|(i, &e)| weighted_cost(self.model.cost(e), i, smoothing))
            .fold(0.0, |acc, c| acc + c);

        let lattice = self.lattice;
        let source_cost = self_cost_unchecked(lattice.source(), self.model, smoothing);
        let target_cost = self_cost_unchecked(lattice.target(), self.model, smoothing);
        let baseline = source_cost.max(target_cost);
        let score = if baseline > 0.0 {
            raw_cost / baseline
        } else {
            raw_cost
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(path_len = edits.len(), raw_cost, baseline, score, "scored best path");

        ScoredPath {
            score,
            raw_cost,
            baseline,
            edits,
        }
    }
}

impl AlignmentLattice {
    /// Score the best path against `model`, which must be the model used by
    /// the last [`fill`](Self::fill).
    ///
    /// # Errors
    /// [`ScoreError::NotFilled`] if the lattice has not been filled since
    /// construction or the last reset, [`ScoreError::InvalidSmoothing`] for a
    /// non-positive smoothing value.
    pub fn score<M: EditCostModel + ?Sized>(
        &self,
        model: &M,
        smoothing: f64,
    ) -> Result<f64, ScoreError> {
        self.filled_with(model)?.score(smoothing)
    }
}
