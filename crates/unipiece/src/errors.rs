//! # Error Types

/// Errors from unipiece operations.
#[derive(Debug, thiserror::Error)]
pub enum UnipieceError {
    /// The seed vocabulary cannot represent the configured character coverage.
    #[error("character coverage needs {required} pieces, but only {available} are available")]
    Coverage {
        /// The number of pieces the covered alphabet requires.
        required: usize,

        /// The number of piece slots available.
        available: usize,
    },

    /// A configuration invariant was violated.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Invalid byte sequence, and the normalizer rejects invalid input.
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    Encoding {
        /// Byte offset of the first invalid byte.
        offset: usize,
    },

    /// A piece id outside the model's range.
    #[error("unknown piece id {id} (vocab size {size})")]
    UnknownPieceId {
        /// The offending id.
        id: usize,

        /// The model's vocabulary size.
        size: usize,
    },

    /// Vocabulary data is inconsistent.
    #[error("{0}")]
    VocabConflict(String),

    /// Token value out of range for the target type.
    #[error("token out of range")]
    TokenOutOfRange,

    /// Failed to decode a wire-format message.
    #[error(transparent)]
    ProtoDecode(#[from] prost::DecodeError),

    /// Failed to encode a wire-format message.
    #[error(transparent)]
    ProtoEncode(#[from] prost::EncodeError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parse error (integers, rule tables, etc.)
    #[error("parse error: {0}")]
    Parse(String),
}

impl UnipieceError {
    /// Build a [`UnipieceError::Config`] from any displayable message.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Is this a training-stage error (coverage or configuration)?
    pub fn is_training_error(&self) -> bool {
        matches!(self, Self::Coverage { .. } | Self::Config(_))
    }
}

/// Result type for unipiece operations.
pub type UPResult<T> = core::result::Result<T, UnipieceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UnipieceError::UnknownPieceId { id: 12, size: 10 };
        assert_eq!(err.to_string(), "unknown piece id 12 (vocab size 10)");

        let err = UnipieceError::config("shrinking_factor must be in (0, 1)");
        assert!(err.is_training_error());
        assert_eq!(
            err.to_string(),
            "invalid configuration: shrinking_factor must be in (0, 1)"
        );

        let err = UnipieceError::Encoding { offset: 3 };
        assert!(!err.is_training_error());
    }
}
