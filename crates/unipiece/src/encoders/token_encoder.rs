//! # Token Encoder Trait

use std::sync::Arc;

use crate::{
    errors::UPResult,
    model::{Model, SpanRef},
    normalizer::Normalizer,
    types::{TokenType, token_from_index},
};

/// A piece id with the normalized byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// The piece id.
    pub id: u32,

    /// Start byte offset in the normalized text.
    pub start: usize,

    /// End byte offset in the normalized text.
    pub end: usize,
}

impl Segment {
    /// Build a segment.
    pub fn new(
        id: u32,
        start: usize,
        end: usize,
    ) -> Self {
        Self { id, start, end }
    }
}

/// Append a segment, merging it into the previous one when both are UNKNOWN.
pub(crate) fn push_merging_unk(
    segments: &mut Vec<Segment>,
    segment: Segment,
    unk_id: u32,
) {
    if segment.id == unk_id
        && let Some(last) = segments.last_mut()
        && last.id == unk_id
        && last.end == segment.start
    {
        last.end = segment.end;
        return;
    }
    segments.push(segment);
}

/// A trait for token encoders.
///
/// Implementations segment spans of normalized text; the provided methods
/// handle normalization, USER_DEFINED pre-segmentation, and id conversion.
pub trait TokenEncoder: Send + Sync {
    /// Return the attached model.
    ///
    /// ## Returns
    /// A reference to the internal `Model` arc.
    fn model(&self) -> &Arc<Model>;

    /// Segment a span of normalized text.
    ///
    /// ## Arguments
    /// * `span` - A normalized span with no USER_DEFINED piece inside.
    /// * `offset` - The span's byte offset in the normalized text.
    /// * `segments` - The target buffer to append to.
    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    );

    /// Return the model's normalizer.
    fn normalizer(&self) -> &Normalizer {
        self.model().normalizer()
    }

    /// Segment normalized text.
    ///
    /// ## Arguments
    /// * `normalized` - Text already run through [`TokenEncoder::normalizer`].
    ///
    /// ## Returns
    /// Segments covering ``normalized`` in order.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, normalized)))]
    fn segment_normalized(
        &self,
        normalized: &str,
    ) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(normalized.len() / 2 + 1);
        for span in self.model().split_user_defined(normalized) {
            match span {
                SpanRef::Normal { offset, text } => self.segment_span(text, offset, &mut segments),
                SpanRef::UserDefined { offset, text, id } => {
                    segments.push(Segment::new(id, offset, offset + text.len()))
                }
            }
        }
        segments
    }

    /// Encode normalized text into tokens.
    fn try_encode_normalized<T: TokenType>(
        &self,
        normalized: &str,
    ) -> UPResult<Vec<T>> {
        self.segment_normalized(normalized)
            .iter()
            .map(|s| token_from_index(s.id as usize))
            .collect()
    }

    /// Encode text into tokens, returning an error if a token is out of range.
    ///
    /// ## Arguments
    /// * `text` - The raw text to encode.
    ///
    /// ## Returns
    /// A `Result` containing the vector of tokens or an error.
    fn try_encode<T: TokenType, S: AsRef<str>>(
        &self,
        text: S,
    ) -> UPResult<Vec<T>> {
        let normalized = self.normalizer().normalize(text.as_ref());
        self.try_encode_normalized(&normalized)
    }

    /// Encode text into piece strings.
    ///
    /// Merged UNKNOWN runs are returned as their normalized surface.
    fn encode_as_pieces<S: AsRef<str>>(
        &self,
        text: S,
    ) -> Vec<String> {
        let normalized = self.normalizer().normalize(text.as_ref());
        self.segment_normalized(&normalized)
            .iter()
            .map(|s| normalized[s.start..s.end].to_string())
            .collect()
    }

    /// Encode a batch of text into tokens, returning an error if any encoding fails.
    ///
    /// ## Arguments
    /// * `batch` - A slice of strings to encode.
    ///
    /// ## Returns
    /// A `Result` containing the vector of token vectors or an error.
    fn try_encode_batch<T: TokenType>(
        &self,
        batch: &[String],
    ) -> UPResult<Vec<Vec<T>>> {
        batch.iter().map(|s| self.try_encode(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merging_unk() {
        let mut segments = Vec::new();
        push_merging_unk(&mut segments, Segment::new(5, 0, 1), 0);
        push_merging_unk(&mut segments, Segment::new(0, 1, 2), 0);
        push_merging_unk(&mut segments, Segment::new(0, 2, 4), 0);
        push_merging_unk(&mut segments, Segment::new(5, 4, 5), 0);
        push_merging_unk(&mut segments, Segment::new(0, 5, 6), 0);
        assert_eq!(
            segments,
            vec![
                Segment::new(5, 0, 1),
                Segment::new(0, 1, 4),
                Segment::new(5, 4, 5),
                Segment::new(0, 5, 6),
            ]
        );
    }
}
