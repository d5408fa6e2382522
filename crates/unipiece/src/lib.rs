//! # `unipiece` Subword Tokenizer
//!
//! Runtime for unigram-language-model and BPE subword tokenizers, reading and
//! writing a sentencepiece-compatible model format.
//!
//! See:
//! * [`normalizer`] to normalize raw text.
//! * [`model`] for the trained, immutable piece table.
//! * [`encoders`] to segment text into piece ids.
//! * [`decoders`] to turn piece ids back into text.
//! * [`tokenizer`] for the combined facade.
//! * [`io`] to load and save model files.
//!
//! Training lives in the ``unipiece-training`` crate.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use unipiece::{io::load_model_path, tokenizer::{Tokenizer, TokenizerOptions}};
//!
//! let model = Arc::new(load_model_path("m.model")?);
//! let tok = Tokenizer::new(model, TokenizerOptions::default().with_parallel(true));
//!
//! let ids: Vec<u32> = tok.encode("hello world")?;
//! assert_eq!(tok.decode(&ids)?, "hello world");
//! ```
//!
//! ## Crate Features
#![doc = document_features::document_features!()]
#![warn(missing_docs, unused)]

#[cfg(feature = "rayon")]
pub mod rayon;

pub mod decoders;
pub mod encoders;
pub mod errors;
pub mod io;
pub mod model;
pub mod normalizer;
#[allow(missing_docs)]
pub mod proto;
pub mod tokenizer;
pub mod types;

#[doc(inline)]
pub use errors::{UPResult, UnipieceError};
#[doc(inline)]
pub use model::Model;
#[doc(inline)]
pub use tokenizer::{Tokenizer, TokenizerOptions};
#[doc(inline)]
pub use types::TokenType;
