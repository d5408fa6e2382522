//! # Symbol Span Buffer

use unipiece::types::Pair;

/// A mutable span of symbol ids (one word).
///
/// Symbols start as characters and are iteratively merged during BPE training.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolSpanBuf {
    symbols: Vec<u32>,
}

impl<S: AsRef<[u32]>> From<S> for SymbolSpanBuf {
    fn from(symbols: S) -> Self {
        Self {
            symbols: symbols.as_ref().to_vec(),
        }
    }
}

impl SymbolSpanBuf {
    const DEC: i32 = -1;
    const INC: i32 = 1;

    /// Build a span by mapping each character of ``text`` to a symbol.
    pub fn from_chars<F>(
        text: &str,
        symbol_of: F,
    ) -> Self
    where
        F: FnMut(char) -> u32,
    {
        Self {
            symbols: text.chars().map(symbol_of).collect(),
        }
    }

    /// View the symbols as a slice.
    pub fn symbols(&self) -> &[u32] {
        &self.symbols
    }

    /// Get the length of the span.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Is this span empty?
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get an iterator over adjacent [`Pair`]s of this span.
    pub fn pairs(&self) -> impl Iterator<Item = Pair<u32>> + '_ {
        self.symbols.windows(2).map(|w| (w[0], w[1]))
    }

    /// Merge all non-overlapping occurrences of ``pair -> replacement``, left to right.
    ///
    /// ## Arguments
    /// * `pair` - the pair to merge.
    /// * `replacement` - the symbol to replace ``pair`` with.
    /// * `on_merge` - called per pair delta: ``+1`` added, ``-1`` removed.
    pub fn merge_pair_cb<F>(
        &mut self,
        pair: Pair<u32>,
        replacement: u32,
        on_merge: &mut F,
    ) where
        F: FnMut(Pair<u32>, i32),
    {
        let (a, b) = pair;
        let n = self.symbols.len();
        if n < 2 {
            return;
        }

        let mut merged: Vec<u32> = Vec::with_capacity(n);
        let mut i = 0;
        while i < n {
            let current = self.symbols[i];
            if i + 1 < n && pair == (current, self.symbols[i + 1]) {
                if let Some(&x) = merged.last() {
                    on_merge((x, a), Self::DEC);
                    on_merge((x, replacement), Self::INC);
                }

                on_merge(pair, Self::DEC);

                if i + 2 < n {
                    let y = self.symbols[i + 2];
                    on_merge((b, y), Self::DEC);
                    on_merge((replacement, y), Self::INC);
                }

                merged.push(replacement);
                i += 2;
            } else {
                merged.push(current);
                i += 1;
            }
        }

        self.symbols = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chars() {
        let span = SymbolSpanBuf::from_chars("abc", |c| c as u32 - 'a' as u32);
        assert_eq!(span.symbols(), &[0, 1, 2]);
        assert_eq!(span.len(), 3);
        assert_eq!(span.pairs().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_merge_pair_cb() {
        let mut span: SymbolSpanBuf = [1, 2, 3, 1, 2].into();
        let mut deltas = Vec::new();
        span.merge_pair_cb((1, 2), 9, &mut |p, d| deltas.push((p, d)));
        assert_eq!(span.symbols(), &[9, 3, 9]);
        assert_eq!(
            deltas,
            vec![
                ((1, 2), -1),
                ((2, 3), -1),
                ((9, 3), 1),
                ((3, 1), -1),
                ((3, 9), 1),
                ((1, 2), -1),
            ]
        );
    }

    #[test]
    fn test_merge_overlapping_run() {
        let mut span: SymbolSpanBuf = [1, 1, 1].into();
        let mut net: i32 = 0;
        span.merge_pair_cb((1, 1), 5, &mut |p, d| {
            if p == (1, 1) {
                net += d;
            }
        });
        assert_eq!(span.symbols(), &[5, 1]);
        // Two (1, 1) pairs existed; none remain.
        assert_eq!(net, -2);
    }
}
