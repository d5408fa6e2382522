//! # Word [`TokenEncoder`]
//!
//! Splits before each whitespace marker and looks words up verbatim.

use std::sync::Arc;

use crate::{
    encoders::{TokenEncoder, token_encoder::Segment},
    model::Model,
    normalizer::META_SPACE,
};

/// A WORD model encoder.
#[derive(Debug, Clone)]
pub struct WordEncoder {
    model: Arc<Model>,
}

impl WordEncoder {
    /// Create an encoder over a model.
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }
}

/// Split text so each word after the first starts with a whitespace marker.
///
/// ## Returns
/// ``(start, end)`` byte ranges.
pub fn split_words(text: &str) -> Vec<(usize, usize)> {
    let mut words = Vec::new();
    let mut start = 0;
    for (pos, c) in text.char_indices() {
        if (c == META_SPACE || c == ' ') && pos > start {
            words.push((start, pos));
            start = pos;
        }
    }
    if start < text.len() {
        words.push((start, text.len()));
    }
    words
}

impl TokenEncoder for WordEncoder {
    fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        for (start, end) in split_words(span) {
            let id = self
                .model
                .piece_to_id(&span[start..end])
                .filter(|&id| self.model.piece(id).is_some_and(|p| p.is_segmentable()))
                .unwrap_or(self.model.unk_id());
            segments.push(Segment::new(id, offset + start, offset + end));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::testing::build_model_proto,
        proto::{ModelType, NormalizerSpec, PieceType},
    };

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("▁ab▁c"), vec![(0, 5), (5, 9)]);
        assert_eq!(split_words("ab▁▁c"), vec![(0, 2), (2, 5), (5, 9)]);
        assert_eq!(split_words(""), vec![]);
    }

    #[test]
    fn test_word_lookup() {
        let proto = build_model_proto(
            ModelType::Word,
            NormalizerSpec::default(),
            &[
                ("▁the", -1.0, PieceType::Normal),
                ("▁cat", -2.0, PieceType::Normal),
            ],
        );
        let encoder = WordEncoder::new(Arc::new(Model::from_proto(&proto).unwrap()));
        assert_eq!(
            encoder.encode_as_pieces("the cat  sat"),
            vec!["▁the", "▁cat", "▁sat"]
        );
        let ids: Vec<u32> = encoder.try_encode("the cat sat").unwrap();
        assert_eq!(ids, vec![3, 4, 0]);
    }
}
