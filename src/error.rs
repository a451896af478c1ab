//! Error types for scoring and training calls.

use thiserror::Error;

/// Errors returned by lattice scoring, feedback and scorer construction.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScoreError {
    /// Positional weighting divides by `i + smoothing`, so smoothing must be
    /// finite and strictly positive.
    #[error("smoothing must be finite and > 0, got {0}")]
    InvalidSmoothing(f64),

    /// The lattice has not been filled since construction or the last reset.
    #[error("lattice has not been filled; call fill() before score() or accumulate()")]
    NotFilled,
}

/// Check a smoothing value before it is used as a divisor.
pub(crate) fn check_smoothing(smoothing: f64) -> Result<f64, ScoreError> {
    if smoothing.is_finite() && smoothing > 0.0 {
        Ok(smoothing)
    } else {
        Err(ScoreError::InvalidSmoothing(smoothing))
    }
}
