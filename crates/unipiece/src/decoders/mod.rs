//! # Decoders

pub mod piece_decoder;
pub mod token_decoder;

#[doc(inline)]
pub use piece_decoder::PieceDecoder;
#[doc(inline)]
pub use token_decoder::TokenDecoder;
