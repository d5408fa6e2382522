//! # Model-Type Dispatch
//!
//! [`ModelEncoder`] selects the segmentation algorithm from the model's
//! [`ModelType`], once, at construction.

use std::sync::Arc;

use rand::Rng;

use crate::{
    encoders::{
        BpeEncoder,
        CharEncoder,
        TokenEncoder,
        UnigramEncoder,
        WordEncoder,
        token_encoder::Segment,
    },
    model::Model,
    proto::ModelType,
};

/// An encoder for any model type.
#[derive(Debug, Clone)]
pub enum ModelEncoder {
    /// UNIGRAM Viterbi segmentation.
    Unigram(UnigramEncoder),

    /// BPE merges.
    Bpe(BpeEncoder),

    /// Whitespace-delimited words.
    Word(WordEncoder),

    /// Single characters.
    Char(CharEncoder),
}

impl ModelEncoder {
    /// Build the encoder matching ``model.model_type()``.
    pub fn new(model: Arc<Model>) -> Self {
        match model.model_type() {
            ModelType::Unigram => Self::Unigram(UnigramEncoder::new(model)),
            ModelType::Bpe => Self::Bpe(BpeEncoder::new(model)),
            ModelType::Word => Self::Word(WordEncoder::new(model)),
            ModelType::Char => Self::Char(CharEncoder::new(model)),
        }
    }

    /// Segment normalized text by sampling (UNIGRAM only).
    ///
    /// Other model types are deterministic and return the best segmentation.
    pub fn sample_segments<R: Rng + ?Sized>(
        &self,
        normalized: &str,
        alpha: f32,
        rng: &mut R,
    ) -> Vec<Segment> {
        match self {
            Self::Unigram(e) => e.sample_segments(normalized, alpha, rng),
            _ => self.segment_normalized(normalized),
        }
    }

    /// The ``n`` best segmentations of normalized text (UNIGRAM only).
    ///
    /// Other model types return their single segmentation, scored by the
    /// sum of piece scores.
    pub fn nbest_segments(
        &self,
        normalized: &str,
        n: usize,
    ) -> Vec<(Vec<Segment>, f64)> {
        match self {
            Self::Unigram(e) => e.nbest_segments(normalized, n),
            _ if n == 0 => Vec::new(),
            _ => {
                let segments = self.segment_normalized(normalized);
                let score = segments
                    .iter()
                    .filter_map(|s| self.model().score(s.id))
                    .map(f64::from)
                    .sum();
                vec![(segments, score)]
            }
        }
    }
}

impl TokenEncoder for ModelEncoder {
    fn model(&self) -> &Arc<Model> {
        match self {
            Self::Unigram(e) => e.model(),
            Self::Bpe(e) => e.model(),
            Self::Word(e) => e.model(),
            Self::Char(e) => e.model(),
        }
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        match self {
            Self::Unigram(e) => e.segment_span(span, offset, segments),
            Self::Bpe(e) => e.segment_span(span, offset, segments),
            Self::Word(e) => e.segment_span(span, offset, segments),
            Self::Char(e) => e.segment_span(span, offset, segments),
        }
    }
}
