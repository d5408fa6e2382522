use core::ops::Range;
use std::sync::Arc;

use rand::Rng;

use crate::{
    decoders::{PieceDecoder, TokenDecoder},
    encoders::{ModelEncoder, Segment, TokenEncoder},
    errors::UPResult,
    model::Model,
    normalizer::Normalizer,
    tokenizer::TokenizerOptions,
    types::{TokenType, token_from_index},
};

fn segments_to_tokens<T: TokenType>(segments: &[Segment]) -> UPResult<Vec<T>> {
    segments
        .iter()
        .map(|s| token_from_index(s.id as usize))
        .collect()
}

/// A model bundled with its normalizer, encoder and decoder.
///
/// The model is shared read-only; a `Tokenizer` is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    model: Arc<Model>,
    normalizer: Normalizer,
    encoder: ModelEncoder,
    decoder: PieceDecoder,
    options: TokenizerOptions,
}

impl From<Arc<Model>> for Tokenizer {
    fn from(model: Arc<Model>) -> Self {
        Self::new(model, TokenizerOptions::default())
    }
}

impl Tokenizer {
    /// Build a tokenizer over a model.
    ///
    /// ## Arguments
    /// * `model` - The shared model.
    /// * `options` - Runtime options.
    pub fn new(
        model: Arc<Model>,
        options: TokenizerOptions,
    ) -> Self {
        let normalizer = model.normalizer().clone().with_options(options.normalizer);
        Self {
            encoder: ModelEncoder::new(model.clone()),
            decoder: PieceDecoder::new(model.clone()),
            normalizer,
            model,
            options,
        }
    }

    /// Load a tokenizer from model bytes.
    pub fn from_bytes(buf: &[u8]) -> UPResult<Self> {
        Ok(Arc::new(Model::from_bytes(buf)?).into())
    }

    /// The model.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// The encoder.
    pub fn encoder(&self) -> &ModelEncoder {
        &self.encoder
    }

    /// The decoder.
    pub fn decoder(&self) -> &PieceDecoder {
        &self.decoder
    }

    /// The runtime options.
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Normalize text with the model's rules.
    pub fn normalize(
        &self,
        text: &str,
    ) -> String {
        self.normalizer.normalize(text)
    }

    /// Encode text into piece ids.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, text)))]
    pub fn encode<T: TokenType>(
        &self,
        text: &str,
    ) -> UPResult<Vec<T>> {
        let normalized = self.normalizer.normalize(text);
        self.encoder.try_encode_normalized(&normalized)
    }

    /// Encode raw bytes, applying the configured invalid UTF-8 policy.
    pub fn encode_bytes<T: TokenType>(
        &self,
        input: &[u8],
    ) -> UPResult<Vec<T>> {
        let normalized = self.normalizer.normalize_bytes(input)?;
        self.encoder.try_encode_normalized(&normalized.text)
    }

    /// Encode text into piece strings.
    pub fn encode_as_pieces(
        &self,
        text: &str,
    ) -> Vec<String> {
        let normalized = self.normalizer.normalize(text);
        self.encoder
            .segment_normalized(&normalized)
            .iter()
            .map(|s| normalized[s.start..s.end].to_string())
            .collect()
    }

    /// Encode text, returning each piece id with the source byte range it covers.
    pub fn encode_with_offsets(
        &self,
        text: &str,
    ) -> Vec<(u32, Range<usize>)> {
        let normalized = self.normalizer.normalize_with_alignment(text);
        self.encoder
            .segment_normalized(&normalized.text)
            .iter()
            .map(|s| (s.id, normalized.alignment[s.start]..normalized.alignment[s.end]))
            .collect()
    }

    /// Encode with subword regularization (UNIGRAM only).
    ///
    /// ## Arguments
    /// * `text` - The text to encode.
    /// * `alpha` - Smoothing; lower values flatten the distribution.
    /// * `rng` - The random source.
    pub fn sample_encode<T: TokenType, R: Rng + ?Sized>(
        &self,
        text: &str,
        alpha: f32,
        rng: &mut R,
    ) -> UPResult<Vec<T>> {
        let normalized = self.normalizer.normalize(text);
        segments_to_tokens(&self.encoder.sample_segments(&normalized, alpha, rng))
    }

    /// The ``n`` best segmentations with their scores (UNIGRAM only).
    pub fn nbest_encode<T: TokenType>(
        &self,
        text: &str,
        n: usize,
    ) -> UPResult<Vec<(Vec<T>, f64)>> {
        let normalized = self.normalizer.normalize(text);
        self.encoder
            .nbest_segments(&normalized, n)
            .into_iter()
            .map(|(segments, score)| Ok((segments_to_tokens(&segments)?, score)))
            .collect()
    }

    /// Encode a batch of text.
    pub fn encode_batch<T: TokenType>(
        &self,
        batch: &[String],
    ) -> UPResult<Vec<Vec<T>>> {
        #[cfg(feature = "rayon")]
        if self.options.parallel {
            return crate::rayon::ParallelRayonEncoder::new(self.encoder.clone())
                .try_encode_batch(batch);
        }
        self.encoder.try_encode_batch(batch)
    }

    /// Decode piece ids into text.
    pub fn decode<T: TokenType>(
        &self,
        tokens: &[T],
    ) -> UPResult<String> {
        self.decoder.try_decode_to_string(tokens)
    }

    /// Decode piece strings into text.
    pub fn decode_pieces<S: AsRef<str>>(
        &self,
        pieces: &[S],
    ) -> String {
        self.decoder.decode_pieces(pieces)
    }

    /// Decode a batch of piece id sequences.
    pub fn decode_batch<T: TokenType>(
        &self,
        batch: &[&[T]],
    ) -> UPResult<Vec<String>> {
        #[cfg(feature = "rayon")]
        if self.options.parallel {
            return crate::rayon::ParallelRayonDecoder::new(self.decoder.clone())
                .try_decode_batch_to_strings(batch);
        }
        self.decoder.try_decode_batch_to_strings(batch)
    }

    /// Look up a piece id.
    pub fn piece_to_id(
        &self,
        piece: &str,
    ) -> Option<u32> {
        self.model.piece_to_id(piece)
    }

    /// Look up a piece string.
    pub fn id_to_piece(
        &self,
        id: u32,
    ) -> Option<&str> {
        self.model.id_to_piece(id)
    }

    /// The piece score.
    pub fn score(
        &self,
        id: u32,
    ) -> Option<f32> {
        self.model.score(id)
    }

    /// The number of pieces.
    pub fn vocab_size(&self) -> usize {
        self.model.vocab_size()
    }

    /// The UNKNOWN piece id.
    pub fn unk_id(&self) -> u32 {
        self.model.unk_id()
    }

    /// The begin-of-sentence id, if present.
    pub fn bos_id(&self) -> Option<u32> {
        self.model.bos_id()
    }

    /// The end-of-sentence id, if present.
    pub fn eos_id(&self) -> Option<u32> {
        self.model.eos_id()
    }

    /// The padding id, if present.
    pub fn pad_id(&self) -> Option<u32> {
        self.model.pad_id()
    }
}
