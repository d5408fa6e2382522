//! # Character [`TokenEncoder`]

use std::sync::Arc;

use crate::{
    encoders::{TokenEncoder, token_encoder::Segment},
    model::Model,
};

/// A CHAR model encoder; one piece per code point.
#[derive(Debug, Clone)]
pub struct CharEncoder {
    model: Arc<Model>,
}

impl CharEncoder {
    /// Create an encoder over a model.
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }
}

impl TokenEncoder for CharEncoder {
    fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        let mut buf = [0u8; 4];
        for (start, c) in span.char_indices() {
            let id = self
                .model
                .piece_to_id(c.encode_utf8(&mut buf))
                .filter(|&id| self.model.piece(id).is_some_and(|p| p.is_segmentable()))
                .unwrap_or(self.model.unk_id());
            segments.push(Segment::new(id, offset + start, offset + start + c.len_utf8()));
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
    fn test_chars() {
        let proto = build_model_proto(
            ModelType::Char,
            NormalizerSpec::default(),
            &[
                ("▁", -1.0, PieceType::Normal),
                ("a", -2.0, PieceType::Normal),
                ("b", -2.0, PieceType::Normal),
            ],
        );
        let encoder = CharEncoder::new(Arc::new(Model::from_proto(&proto).unwrap()));
        assert_eq!(encoder.encode_as_pieces("ab"), vec!["▁", "a", "b"]);
        let ids: Vec<u32> = encoder.try_encode("a z").unwrap();
        assert_eq!(ids, vec![3, 4, 3, 0]);
    }
}
