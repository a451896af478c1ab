//! Weighted edit-distance lattice for fuzzy personal-name matching
//!
//! This crate scores how similar two tokenized names are under a trainable,
//! per-token-pair edit-cost model, and feeds the chosen alignments back into
//! that model's counts for offline retraining.
//!
//! ## Core idea
//! 1. Tokenize both names upstream (characters or phonetic units) into
//!    [`Token`] sequences.
//! 2. Build an [`AlignmentLattice`] for the pair and [`fill`] it once against
//!    an [`EditCostModel`]: a single integer-only forward sweep that records
//!    the best predecessor of every cell.
//! 3. Read the result off the filled lattice:
//!    - `score` walks the best path and returns a positionally weighted,
//!      normalized distance (0 = perfect zero-cost alignment),
//!    - `accumulate` pushes one count per path edit into the model.
//!
//! Between training passes an external EM step turns counts into new costs;
//! [`AlignmentLattice::reset`] lets the same lattice be re-filled in place.
//!
//! ## Quick start
//! ```
//! use name_lattice::{tokens_from_bytes, AlignmentLattice, DefaultCosts, EditTable};
//!
//! let model = EditTable::new(DefaultCosts {
//!     self_match: 0,
//!     substitution: 2,
//!     insertion: 3,
//!     deletion: 3,
//! });
//! let mut lattice = AlignmentLattice::new(tokens_from_bytes(b"ace"), tokens_from_bytes(b"ape"));
//! let filled = lattice.fill(&model);
//! assert_eq!(filled.terminal_cost(), 2);
//! assert_eq!(filled.score(1.0).unwrap(), 1.0);
//! assert_eq!(filled.accumulate(), 3);
//! ```
//!
//! ## Direction
//! Ties in the sweep are broken on integer cost alone, so a pair and its
//! mirror image can score differently. [`NameScorer`] with
//! [`AlignmentStrategy::ExactBidirectional`] aligns both ways and keeps the
//! better score.
//!
//! [`fill`]: AlignmentLattice::fill

pub mod builder;
pub mod error;
pub mod lattice;
pub mod models;
pub mod scorer;
pub mod scoring;
pub mod token;
pub mod traits;
mod training;

pub use crate::builder::NameScorerBuilder;
pub use crate::error::ScoreError;
pub use crate::lattice::{AlignmentLattice, FilledLattice};
pub use crate::models::{DefaultCosts, EditTable};
pub use crate::scorer::{AlignmentStrategy, NameScorer, PairAlignment};
pub use crate::scoring::{ScoredPath, DEFAULT_SMOOTHING};
pub use crate::token::{tokens_from_bytes, Edit, EditKind, Sequence, Token};
pub use crate::traits::EditCostModel;
