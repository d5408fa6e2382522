//! # Token Decoder Trait

use crate::{errors::UPResult, types::TokenType};

/// Trait for token decoders.
pub trait TokenDecoder: Send + Sync {
    /// Decodes tokens into a string.
    ///
    /// ## Arguments
    /// * `tokens` - A slice of tokens to decode.
    ///
    /// ## Returns
    /// A `UPResult<String>`; out of range ids are an error.
    fn try_decode_to_string<T: TokenType>(
        &self,
        tokens: &[T],
    ) -> UPResult<String>;

    /// Decodes a batch of tokens.
    ///
    /// ## Arguments
    /// * `batch` - A batch of tokens.
    ///
    /// ## Returns
    /// A `UPResult<Vec<String>>`, failing on the first error.
    fn try_decode_batch_to_strings<T: TokenType>(
        &self,
        batch: &[&[T]],
    ) -> UPResult<Vec<String>> {
        batch
            .iter()
            .map(|tokens| self.try_decode_to_string(tokens))
            .collect()
    }
}
