//! # Training Types
use core::{
    fmt::{Debug, Display},
    hash::Hash,
    ops::{AddAssign, SubAssign},
};

use num_traits::{FromPrimitive, PrimInt, ToPrimitive};

/// A type that can be used as a word key.
pub trait StringChunkType:
    for<'a> From<&'a str> + AsRef<str> + Debug + Clone + Send + Sync + Eq + Hash + Ord
{
}

impl<T> StringChunkType for T where
    T: for<'a> From<&'a str> + AsRef<str> + Debug + Clone + Send + Sync + Eq + Hash + Ord
{
}

/// A type that can be used as a sentence or word count.
pub trait CountType:
    'static
    + PrimInt
    + FromPrimitive
    + ToPrimitive
    + Hash
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + AddAssign
    + SubAssign
{
}

impl<T> CountType for T where
    T: 'static
        + PrimInt
        + FromPrimitive
        + ToPrimitive
        + Hash
        + Default
        + Debug
        + Display
        + Send
        + Sync
        + AddAssign
        + SubAssign
{
}

/// A normalized training sentence with its frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// The normalized text.
    pub text: String,

    /// How many times the sentence occurs in the sample.
    pub freq: u64,
}

impl Sentence {
    /// Build a sentence.
    pub fn new<S: Into<String>>(
        text: S,
        freq: u64,
    ) -> Self {
        Self {
            text: text.into(),
            freq,
        }
    }
}

/// A trained piece with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPiece {
    /// The piece text.
    pub text: String,

    /// The piece log-probability (or merge rank score).
    pub score: f32,
}

impl ScoredPiece {
    /// Build a scored piece.
    pub fn new<S: Into<String>>(
        text: S,
        score: f32,
    ) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Sort pieces by descending score, ties by ascending text.
pub fn sort_by_score(pieces: &mut [ScoredPiece]) {
    pieces.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.text.cmp(&b.text)));
}

#[cfg(test)]
mod tests {
    use core::marker::PhantomData;

    use compact_str::CompactString;

    use super::*;

    #[test]
    fn test_common_count_types() {
        struct IsCount<T: CountType>(PhantomData<T>);

        let _: IsCount<u32>;
        let _: IsCount<u64>;
        let _: IsCount<usize>;
    }

    #[test]
    fn test_common_string_chunk_types() {
        struct IsStringChunk<T: StringChunkType>(PhantomData<T>);

        let _: IsStringChunk<String>;
        let _: IsStringChunk<CompactString>;
    }

    #[test]
    fn test_sort_by_score() {
        let mut pieces = vec![
            ScoredPiece::new("b", -1.0),
            ScoredPiece::new("a", -1.0),
            ScoredPiece::new("c", 0.0),
        ];
        sort_by_score(&mut pieces);
        let texts: Vec<&str> = pieces.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }
}
