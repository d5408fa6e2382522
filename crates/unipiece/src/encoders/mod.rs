//! # Encoders
//!
//! [`TokenEncoder`] implementations per model type, and the shared
//! [`Lattice`] used by UNIGRAM segmentation and training.

pub mod bpe_encoder;
pub mod char_encoder;
pub mod lattice;
pub mod model_encoder;
pub mod token_encoder;
pub mod unigram_encoder;
pub mod word_encoder;

#[doc(inline)]
pub use bpe_encoder::BpeEncoder;
#[doc(inline)]
pub use char_encoder::CharEncoder;
#[doc(inline)]
pub use lattice::{Lattice, LatticeNode};
#[doc(inline)]
pub use model_encoder::ModelEncoder;
#[doc(inline)]
pub use token_encoder::{Segment, TokenEncoder};
#[doc(inline)]
pub use unigram_encoder::{UNK_PENALTY, UnigramEncoder};
#[doc(inline)]
pub use word_encoder::WordEncoder;
