//! # Trainer Options
//!
//! Runtime knobs that are not part of the serialized [`TrainerSpec`](unipiece::proto::TrainerSpec).

use unipiece::normalizer::{InvalidCharPolicy, NormalizerOptions};

/// Default bound on UNIGRAM pruning rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// Default relative slack before an EM objective counts as a regression.
pub const DEFAULT_OBJECTIVE_TOLERANCE: f64 = 1e-9;

/// Options for configuring a [`Trainer`](crate::Trainer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerOptions {
    /// How invalid UTF-8 in the corpus is handled.
    pub normalizer: NormalizerOptions,

    /// Upper bound on UNIGRAM EM + prune rounds.
    pub max_rounds: usize,

    /// Relative slack when comparing successive EM objectives.
    pub objective_tolerance: f64,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            normalizer: NormalizerOptions::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            objective_tolerance: DEFAULT_OBJECTIVE_TOLERANCE,
        }
    }
}

impl TrainerOptions {
    /// Sets the invalid UTF-8 policy for corpus lines.
    pub fn with_invalid_chars(
        self,
        invalid_chars: InvalidCharPolicy,
    ) -> Self {
        Self {
            normalizer: self.normalizer.with_invalid_chars(invalid_chars),
            ..self
        }
    }

    /// Sets the pruning round bound.
    pub fn with_max_rounds(
        self,
        max_rounds: usize,
    ) -> Self {
        Self { max_rounds, ..self }
    }

    /// Sets the EM regression tolerance.
    pub fn with_objective_tolerance(
        self,
        objective_tolerance: f64,
    ) -> Self {
        Self {
            objective_tolerance,
            ..self
        }
    }
}
