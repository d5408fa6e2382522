//! # `PairSpanIndex` Builder

use unipiece::types::{Pair, UPHashMap, UPHashSet};

use crate::{training_types::CountType, utility::SymbolSpanBuf};

/// A map from [`Pair`] to its weighted occurrence count.
pub type PairCountMap<C> = UPHashMap<Pair<u32>, C>;

/// A map from [`Pair`] to indices over ``words``.
pub type PairIndexMap = UPHashMap<Pair<u32>, UPHashSet<usize>>;

/// An index of symbol pair information relative to a ``&[SymbolSpanBuf]``.
#[derive(Debug, Clone)]
pub struct PairSpanIndex<C: CountType> {
    /// ``sum(occurrences(words[i], pair) * word_counts[i])`` per pair.
    pub pair_counts: PairCountMap<C>,

    /// The words each pair occurs in.
    pub pair_index: PairIndexMap,
}

impl<C: CountType> PairSpanIndex<C> {
    /// Build a [`PairSpanIndex`] from spans and their counts.
    ///
    /// ## Arguments
    /// * `spans` - a sequence of unique words.
    /// * `counts` - ``counts[i]`` is the count of ``spans[i]``.
    /// * `mergeable` - pairs for which this returns false are not indexed.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn from_span_count_table<F>(
        spans: &[SymbolSpanBuf],
        counts: &[C],
        mut mergeable: F,
    ) -> Self
    where
        F: FnMut(Pair<u32>) -> bool,
    {
        let mut index = PairSpanIndex {
            pair_counts: PairCountMap::default(),
            pair_index: PairIndexMap::default(),
        };

        let zero = C::zero();
        for (i, (span, &count)) in spans.iter().zip(counts).enumerate() {
            if count == zero || span.len() < 2 {
                continue;
            }
            for p in span.pairs() {
                if !mergeable(p) {
                    continue;
                }
                *index.pair_counts.entry(p).or_default() += count;
                index.pair_index.entry(p).or_default().insert(i);
            }
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_index() {
        let spans: Vec<SymbolSpanBuf> = vec![[1, 2, 1, 2].into(), [2, 1].into(), [7].into()];
        let counts: Vec<u64> = vec![3, 5, 100];

        let PairSpanIndex {
            pair_counts,
            pair_index,
        } = PairSpanIndex::from_span_count_table(&spans, &counts, |p| p != (9, 9));

        assert_eq!(pair_counts.get(&(1, 2)), Some(&6));
        assert_eq!(pair_counts.get(&(2, 1)), Some(&8));
        assert_eq!(pair_counts.len(), 2);
        assert_eq!(pair_index.get(&(2, 1)).map(|s| s.len()), Some(2));
        assert!(pair_index.get(&(1, 2)).unwrap().contains(&0));
    }

    #[test]
    fn test_unmergeable_pairs_skipped() {
        let spans: Vec<SymbolSpanBuf> = vec![[1, 0, 2].into()];
        let index = PairSpanIndex::from_span_count_table(&spans, &[1u32], |(a, b)| a != 0 && b != 0);
        assert!(index.pair_counts.is_empty());
    }
}
