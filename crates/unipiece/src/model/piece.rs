//! # Vocabulary Pieces

use crate::proto::{PieceType, SentencePiece};

/// One scored vocabulary entry; its position in the model is its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// The piece text, in normalized (escaped) form.
    pub text: String,

    /// Log-probability (UNIGRAM) or merge priority (BPE).
    pub score: f32,

    /// The piece role.
    pub kind: PieceType,
}

impl Piece {
    /// Build a piece.
    pub fn new<S: Into<String>>(
        text: S,
        score: f32,
        kind: PieceType,
    ) -> Self {
        Self {
            text: text.into(),
            score,
            kind,
        }
    }

    /// Can segmentation emit this piece?
    ///
    /// CONTROL pieces are never produced; UNKNOWN is produced only as a fallback.
    pub fn is_segmentable(&self) -> bool {
        matches!(self.kind, PieceType::Normal | PieceType::UserDefined)
    }

    /// Is this the UNKNOWN piece?
    pub fn is_unknown(&self) -> bool {
        self.kind == PieceType::Unknown
    }

    /// Is this a CONTROL piece?
    pub fn is_control(&self) -> bool {
        self.kind == PieceType::Control
    }

    /// Is this a USER_DEFINED piece?
    pub fn is_user_defined(&self) -> bool {
        self.kind == PieceType::UserDefined
    }
}

impl From<&SentencePiece> for Piece {
    fn from(value: &SentencePiece) -> Self {
        Self::new(value.piece(), value.score(), value.r#type())
    }
}

impl From<&Piece> for SentencePiece {
    fn from(value: &Piece) -> Self {
        SentencePiece::new(value.text.clone(), value.score, value.kind)
    }
}
