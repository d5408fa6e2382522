//! # Parallel Encoder

use std::sync::Arc;

use crate::{
    encoders::{Segment, TokenEncoder},
    errors::UPResult,
    model::Model,
    types::TokenType,
};

/// Batch-Level Parallel Encoder Wrapper.
///
/// Enables ``rayon`` encoding of batches when available.
#[derive(Debug, Clone)]
pub struct ParallelRayonEncoder<E: TokenEncoder> {
    /// Inner encoder.
    pub inner: E,
}

impl<E: TokenEncoder> ParallelRayonEncoder<E> {
    /// Create a new parallel encoder.
    ///
    /// ## Arguments
    /// * `inner` - The token encoder to wrap.
    ///
    /// ## Returns
    /// A new `ParallelRayonEncoder` instance.
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: TokenEncoder> TokenEncoder for ParallelRayonEncoder<E> {
    fn model(&self) -> &Arc<Model> {
        self.inner.model()
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        self.inner.segment_span(span, offset, segments)
    }

    fn try_encode_batch<T: TokenType>(
        &self,
        batch: &[String],
    ) -> UPResult<Vec<Vec<T>>> {
        use rayon::prelude::*;
        batch
            .par_iter()
            .map(|text| self.inner.try_encode(text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decoders::{PieceDecoder, TokenDecoder},
        encoders::ModelEncoder,
        model::testing::sample_model_proto,
        types::{check_is_send, check_is_sync},
    };

    #[test]
    fn test_encoder() {
        let samples: Vec<String> = ["ab ba", "a<sep>b", "cab abc", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let model = Arc::new(Model::from_proto(&sample_model_proto()).unwrap());
        let encoder = ParallelRayonEncoder::new(ModelEncoder::new(model.clone()));
        check_is_send(&encoder);
        check_is_sync(&encoder);

        let decoder = PieceDecoder::new(model);

        let batch: Vec<Vec<u32>> = encoder.try_encode_batch(&samples).unwrap();
        assert_eq!(batch.len(), samples.len());
        for (sample, tokens) in samples.iter().zip(batch.iter()) {
            assert_eq!(&decoder.try_decode_to_string(tokens).unwrap(), sample);
        }
    }
}
