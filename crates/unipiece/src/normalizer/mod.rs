//! # Text Normalization
//!
//! See [`Normalizer`] for the pipeline and [`CharsMap`] for the
//! precompiled rewrite table.

pub mod chars_map;
pub mod text_normalizer;

#[doc(inline)]
pub use chars_map::CharsMap;
#[doc(inline)]
pub use text_normalizer::{InvalidCharPolicy, Normalized, Normalizer, NormalizerOptions};

/// The escaped whitespace character, ``▁`` (U+2581).
pub const META_SPACE: char = '\u{2581}';

/// [`META_SPACE`] as a string.
pub const META_SPACE_STR: &str = "\u{2581}";
