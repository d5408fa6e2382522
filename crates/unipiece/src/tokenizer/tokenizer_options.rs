use crate::normalizer::{InvalidCharPolicy, NormalizerOptions};

/// Options for configuring a [`Tokenizer`](crate::tokenizer::Tokenizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenizerOptions {
    /// Normalizer runtime options.
    pub normalizer: NormalizerOptions,

    /// Use ``rayon`` for batch calls (when the feature is enabled).
    pub parallel: bool,
}

impl TokenizerOptions {
    /// Gets the configured parallelism value.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Sets the configured parallelism value.
    ///
    /// Enabling parallelism will request threaded batch implementations.
    pub fn with_parallel(
        self,
        parallel: bool,
    ) -> Self {
        Self { parallel, ..self }
    }

    /// Sets the invalid UTF-8 policy used by byte-input calls.
    pub fn with_invalid_chars(
        self,
        invalid_chars: InvalidCharPolicy,
    ) -> Self {
        Self {
            normalizer: self.normalizer.with_invalid_chars(invalid_chars),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let options = TokenizerOptions::default();
        assert!(!options.parallel());
        assert_eq!(options.normalizer.invalid_chars, InvalidCharPolicy::Replace);

        let options = options
            .with_parallel(true)
            .with_invalid_chars(InvalidCharPolicy::Reject);
        assert!(options.parallel());
        assert_eq!(options.normalizer.invalid_chars, InvalidCharPolicy::Reject);
    }
}
