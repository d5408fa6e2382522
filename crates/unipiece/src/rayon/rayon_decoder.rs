//! # Parallel Decoder

use crate::{decoders::TokenDecoder, errors::UPResult, types::TokenType};

/// Batch-Level Parallel Decoder Wrapper.
///
/// Enables ``rayon`` decoding of batches when available.
#[derive(Debug, Clone)]
pub struct ParallelRayonDecoder<D: TokenDecoder> {
    /// Wrapped decoder.
    pub inner: D,
}

impl<D: TokenDecoder> ParallelRayonDecoder<D> {
    /// Create a new parallel decoder.
    ///
    /// ## Arguments
    /// * `inner` - The token decoder to wrap.
    ///
    /// ## Returns
    /// A new `ParallelRayonDecoder` instance.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: TokenDecoder> TokenDecoder for ParallelRayonDecoder<D> {
    fn try_decode_to_string<T: TokenType>(
        &self,
        tokens: &[T],
    ) -> UPResult<String> {
        self.inner.try_decode_to_string(tokens)
    }

    fn try_decode_batch_to_strings<T: TokenType>(
        &self,
        batch: &[&[T]],
    ) -> UPResult<Vec<String>> {
        use rayon::prelude::*;

        batch
            .par_iter()
            .map(|tokens| self.inner.try_decode_to_string(tokens))
            .collect()
    }
}
