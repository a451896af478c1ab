//! Pair-level scoring and training on top of [`AlignmentLattice`].
//!
//! [`NameScorer`] owns a cost model plus the scoring configuration and hides
//! the construct / fill / score sequence behind one call per name pair. It is
//! also where the alignment direction policy lives: the lattice's integer
//! tie-break is not symmetric, so [`AlignmentStrategy::ExactBidirectional`]
//! aligns both ways and keeps the better score.
//!
//! With the `parallel` feature the batch operations fan out over `rayon`;
//! each pair gets its own lattice and only the model is shared.

use std::fmt;

use crate::builder::NameScorerBuilder;
use crate::lattice::AlignmentLattice;
use crate::scoring::{ScoredPath, DEFAULT_SMOOTHING};
use crate::token::{Edit, Sequence, Token};
use crate::traits::EditCostModel;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which alignment direction(s) to evaluate for a pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlignmentStrategy {
    /// Align source against target only. Cheapest; may miss the minimum
    /// under positional weighting for a small fraction of pairs.
    #[default]
    ForwardApproximate,
    /// Align both `(source, target)` and `(target, source)` and keep the
    /// lower score. Symmetric in its arguments.
    ExactBidirectional,
}

/// Callback receiving each chosen path (source→target orientation) and its
/// score, from scoring and training alike.
pub type PathObserver = Box<dyn Fn(&[Edit], f64) + Send + Sync>;

/// Result of aligning one pair under a strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct PairAlignment {
    pub score: f64,
    /// Edits in forward order, always oriented source→target.
    pub edits: Vec<Edit>,
    /// True if the `(target, source)` direction produced the kept score.
    pub reversed: bool,
}

pub struct NameScorer<M: EditCostModel> {
    model: M,
    smoothing: f64,
    strategy: AlignmentStrategy,
    observer: Option<PathObserver>,
}

impl<M: EditCostModel + fmt::Debug> fmt::Debug for NameScorer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameScorer")
            .field("model", &self.model)
            .field("smoothing", &self.smoothing)
            .field("strategy", &self.strategy)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<M: EditCostModel> NameScorer<M> {
    /// Scorer with [`DEFAULT_SMOOTHING`] and forward-only alignment.
    pub fn new(model: M) -> Self {
        Self {
            model,
            smoothing: DEFAULT_SMOOTHING,
            strategy: AlignmentStrategy::default(),
            observer: None,
        }
    }

    pub fn builder(model: M) -> NameScorerBuilder<M> {
        NameScorerBuilder::new(model)
    }

    /// Assemble from parts already validated by the builder.
    pub(crate) fn from_parts(
        model: M,
        smoothing: f64,
        strategy: AlignmentStrategy,
        observer: Option<PathObserver>,
    ) -> Self {
        Self {
            model,
            smoothing,
            strategy,
            observer,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access for updating costs between training passes.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn strategy(&self) -> AlignmentStrategy {
        self.strategy
    }

    fn align_one_way(&self, source: &[Token], target: &[Token]) -> ScoredPath {
        let mut lattice = AlignmentLattice::new(source.to_vec(), target.to_vec());
        lattice.fill(&self.model).scored_path_unchecked(self.smoothing)
    }

    /// Apply the strategy to an already scored forward path. Under
    /// `ExactBidirectional` the reversed path replaces it only on a strictly
    /// lower score.
    fn choose(&self, forward: ScoredPath, source: &[Token], target: &[Token]) -> PairAlignment {
        match self.strategy {
            AlignmentStrategy::ForwardApproximate => PairAlignment {
                score: forward.score,
                edits: forward.edits,
                reversed: false,
            },
            AlignmentStrategy::ExactBidirectional => {
                let backward = self.align_one_way(target, source);
                if backward.score < forward.score {
                    PairAlignment {
                        score: backward.score,
                        edits: backward.edits.into_iter().map(Edit::swapped).collect(),
                        reversed: true,
                    }
                } else {
                    PairAlignment {
                        score: forward.score,
                        edits: forward.edits,
                        reversed: false,
                    }
                }
            }
        }
    }

    fn notify(&self, alignment: &PairAlignment) {
        if let Some(observe) = &self.observer {
            observe(&alignment.edits, alignment.score);
        }
    }

    /// Align one pair under the configured strategy.
    pub fn align_pair(&self, source: &[Token], target: &[Token]) -> PairAlignment {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "align_pair",
            strategy = ?self.strategy,
            source_len = source.len(),
            target_len = target.len()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let forward = self.align_one_way(source, target);
        let alignment = self.choose(forward, source, target);
        self.notify(&alignment);
        alignment
    }

    /// Similarity distance between two tokenized names.
    pub fn score_pair(&self, source: &[Token], target: &[Token]) -> f64 {
        self.align_pair(source, target).score
    }

    /// Feed the chosen path of one labeled pair into the model's counts.
    ///
    /// Returns the number of edits recorded.
    pub fn train_pair(&self, source: &[Token], target: &[Token]) -> usize {
        let mut lattice = AlignmentLattice::new(source.to_vec(), target.to_vec());
        self.train_lattice(&mut lattice)
    }

    /// Fill a fresh or reset lattice and record the path the strategy keeps.
    ///
    /// Under `ExactBidirectional` the reversed direction gets its own
    /// short-lived lattice; the caller's lattice always holds the forward fill.
    fn train_lattice(&self, lattice: &mut AlignmentLattice) -> usize {
        let filled = lattice.fill(&self.model);
        if self.strategy == AlignmentStrategy::ForwardApproximate && self.observer.is_none() {
            return filled.accumulate();
        }

        let forward = filled.scored_path_unchecked(self.smoothing);
        let lattice = filled.lattice();
        let alignment = self.choose(forward, lattice.source(), lattice.target());
        self.notify(&alignment);
        for &edit in &alignment.edits {
            self.model.add_count(edit, 1);
        }
        alignment.edits.len()
    }

    /// Reset, re-fill and accumulate every lattice against the current model.
    ///
    /// Intended for iterative retraining: keep one lattice per labeled pair
    /// and call this once per pass after the model's costs have been updated.
    /// Records the same counts as [`train_batch`](Self::train_batch) on the
    /// same pairs.
    #[cfg(not(feature = "parallel"))]
    pub fn retrain_pass(&self, lattices: &mut [AlignmentLattice]) -> usize {
        lattices
            .iter_mut()
            .map(|lattice| {
                lattice.reset();
                self.train_lattice(lattice)
            })
            .sum()
    }

    /// Score many pairs; results follow input order.
    #[cfg(not(feature = "parallel"))]
    pub fn score_batch(&self, pairs: &[(Sequence, Sequence)]) -> Vec<f64> {
        pairs.iter().map(|(s, t)| self.score_pair(s, t)).collect()
    }

    /// Train on many labeled pairs; returns the total edits recorded.
    #[cfg(not(feature = "parallel"))]
    pub fn train_batch(&self, pairs: &[(Sequence, Sequence)]) -> usize {
        pairs.iter().map(|(s, t)| self.train_pair(s, t)).sum()
    }
}

#[cfg(feature = "parallel")]
impl<M: EditCostModel + Sync> NameScorer<M> {
    /// Reset, re-fill and accumulate every lattice against the current model.
    ///
    /// Intended for iterative retraining: keep one lattice per labeled pair
    /// and call this once per pass after the model's costs have been updated.
    /// Records the same counts as [`train_batch`](Self::train_batch) on the
    /// same pairs.
    pub fn retrain_pass(&self, lattices: &mut [AlignmentLattice]) -> usize {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("retrain_pass", lattices = lattices.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        lattices
            .par_iter_mut()
            .map(|lattice| {
                lattice.reset();
                self.train_lattice(lattice)
            })
            .sum()
    }

    /// Score many pairs in parallel; results follow input order.
    pub fn score_batch(&self, pairs: &[(Sequence, Sequence)]) -> Vec<f64> {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("score_batch", pairs = pairs.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        pairs
            .par_iter()
            .map(|(s, t)| self.score_pair(s, t))
            .collect()
    }

    /// Train on many labeled pairs in parallel; returns the total edits recorded.
    ///
    /// The model's `add_count` is called concurrently and must be atomic.
    pub fn train_batch(&self, pairs: &[(Sequence, Sequence)]) -> usize {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("train_batch", pairs = pairs.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        pairs
            .par_iter()
            .map(|(s, t)| self.train_pair(s, t))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DefaultCosts, EditTable};
    use crate::token::tokens_from_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn table() -> EditTable {
        EditTable::new(DefaultCosts {
            self_match: 0,
            substitution: 2,
            insertion: 3,
            deletion: 3,
        })
    }

    #[test]
    fn forward_scoring_matches_lattice() {
        let scorer = NameScorer::new(table());
        let s = tokens_from_bytes(b"ace");
        let t = tokens_from_bytes(b"ape");
        let mut lattice = AlignmentLattice::new(s.clone(), t.clone());
        let expected = lattice.fill(scorer.model()).score(1.0).unwrap();
        assert_eq!(scorer.score_pair(&s, &t), expected);
    }

    #[test]
    fn bidirectional_is_symmetric() {
        let scorer = NameScorer::builder(table())
            .with_strategy(AlignmentStrategy::ExactBidirectional)
            .build()
            .unwrap();
        let a = tokens_from_bytes(b"abc");
        let b = tokens_from_bytes(b"bcab");
        assert_eq!(scorer.score_pair(&a, &b), scorer.score_pair(&b, &a));
    }

    #[test]
    fn observer_sees_every_scored_path() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let scorer = NameScorer::builder(table())
            .with_path_observer(move |edits, _score| {
                assert!(!edits.is_empty());
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();
        let a = tokens_from_bytes(b"anna");
        let b = tokens_from_bytes(b"ana");
        scorer.score_pair(&a, &b);
        scorer.score_pair(&b, &a);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn train_pair_records_path_length() {
        let scorer = NameScorer::new(table());
        let a = tokens_from_bytes(b"anna");
        let b = tokens_from_bytes(b"ana");
        let recorded = scorer.train_pair(&a, &b);
        assert_eq!(recorded, 4);
        assert_eq!(scorer.model().total_count(), 4);
    }

    #[test]
    fn retrain_pass_refills_against_updated_costs() {
        let mut scorer = NameScorer::new(table());
        let mut lattices = vec![AlignmentLattice::new(
            tokens_from_bytes(b"ace"),
            tokens_from_bytes(b"ape"),
        )];
        assert_eq!(scorer.retrain_pass(&mut lattices), 3);
        assert_eq!(lattices[0].terminal_cost(), Some(2));

        let c = Token(u32::from(b'c'));
        let p = Token(u32::from(b'p'));
        scorer.model_mut().set_cost(Edit::new(c, p), 0);
        scorer.model().clear_counts();
        assert_eq!(scorer.retrain_pass(&mut lattices), 3);
        assert_eq!(lattices[0].terminal_cost(), Some(0));
        assert_eq!(scorer.model().count(Edit::new(c, p)), 1);
    }

    #[test]
    fn retrain_pass_follows_the_strategy() {
        let pairs = vec![
            (vec![Token(1), Token(2), Token(3)], vec![Token(2), Token(3), Token(1), Token(2)]),
            (tokens_from_bytes(b"johnson"), tokens_from_bytes(b"jonson")),
            (tokens_from_bytes(b"ana"), tokens_from_bytes(b"anna")),
        ];
        for strategy in [
            AlignmentStrategy::ForwardApproximate,
            AlignmentStrategy::ExactBidirectional,
        ] {
            let scorer = NameScorer::builder(table())
                .with_strategy(strategy)
                .build()
                .unwrap();
            let via_batch = scorer.train_batch(&pairs);
            let batch_counts = scorer.model().take_counts();

            let mut lattices: Vec<AlignmentLattice> = pairs
                .iter()
                .map(|(s, t)| AlignmentLattice::new(s.clone(), t.clone()))
                .collect();
            let via_retrain = scorer.retrain_pass(&mut lattices);
            assert_eq!(via_retrain, via_batch, "{strategy:?}");
            assert_eq!(scorer.model().counts(), batch_counts, "{strategy:?}");
            assert!(lattices.iter().all(AlignmentLattice::is_filled));
        }
    }

    #[test]
    fn bidirectional_retrain_records_the_better_direction() {
        let scorer = NameScorer::builder(table())
            .with_strategy(AlignmentStrategy::ExactBidirectional)
            .build()
            .unwrap();
        let mut lattices = vec![AlignmentLattice::new(
            vec![Token(1), Token(2), Token(3)],
            vec![Token(2), Token(3), Token(1), Token(2)],
        )];
        assert_eq!(scorer.retrain_pass(&mut lattices), 5);
        // the reversed direction wins; its edits come back source→target
        assert_eq!(scorer.model().count(Edit::deletion(Token(1))), 1);
        assert_eq!(scorer.model().count(Edit::insertion(Token(1))), 1);
        assert_eq!(scorer.model().count(Edit::insertion(Token(2))), 1);
        assert_eq!(scorer.model().count(Edit::deletion(Token(3))), 0);
        // the kept lattice still holds the forward fill
        assert_eq!(lattices[0].source(), &[Token(1), Token(2), Token(3)]);
    }

    #[test]
    fn observer_sees_training_paths_for_both_strategies() {
        for strategy in [
            AlignmentStrategy::ForwardApproximate,
            AlignmentStrategy::ExactBidirectional,
        ] {
            let calls = Arc::new(AtomicUsize::new(0));
            let seen = Arc::clone(&calls);
            let scorer = NameScorer::builder(table())
                .with_strategy(strategy)
                .with_path_observer(move |_edits, _score| {
                    seen.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap();
            let a = tokens_from_bytes(b"anna");
            let b = tokens_from_bytes(b"ana");
            let recorded = scorer.train_pair(&a, &b);
            assert_eq!(recorded, 4);
            assert_eq!(scorer.model().total_count(), 4);
            let mut lattices = vec![AlignmentLattice::new(a, b)];
            scorer.retrain_pass(&mut lattices);
            assert_eq!(calls.load(Ordering::SeqCst), 2, "{strategy:?}");
        }
    }

    #[test]
    fn batch_follows_input_order() {
        let scorer = NameScorer::new(table());
        let pairs = vec![
            (tokens_from_bytes(b"ace"), tokens_from_bytes(b"ace")),
            (tokens_from_bytes(b"ace"), tokens_from_bytes(b"ape")),
        ];
        let scores = scorer.score_batch(&pairs);
        assert_eq!(scores, vec![0.0, 1.0]);
        assert_eq!(scorer.train_batch(&pairs), 6);
    }
}
