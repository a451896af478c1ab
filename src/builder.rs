use crate::error::{check_smoothing, ScoreError};
use crate::scorer::{AlignmentStrategy, NameScorer, PathObserver};
use crate::scoring::DEFAULT_SMOOTHING;
use crate::token::Edit;
use crate::traits::EditCostModel;

pub struct NameScorerBuilder<M: EditCostModel> {
    model: M,
    smoothing: Option<f64>,
    strategy: AlignmentStrategy,
    observer: Option<PathObserver>,
}

impl<M: EditCostModel> NameScorerBuilder<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            smoothing: None,
            strategy: AlignmentStrategy::default(),
            observer: None,
        }
    }
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = Some(smoothing);
        self
    }
    pub fn with_strategy(mut self, strategy: AlignmentStrategy) -> Self {
        self.strategy = strategy;
        self
    }
    /// Install a callback that receives every chosen path and its score.
    pub fn with_path_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&[Edit], f64) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }
    pub fn build(self) -> Result<NameScorer<M>, ScoreError> {
        let smoothing = match self.smoothing {
            Some(s) => check_smoothing(s)?,
            None => DEFAULT_SMOOTHING,
        };
        Ok(NameScorer::from_parts(
            self.model,
            smoothing,
            self.strategy,
            self.observer,
        ))
    }
}
