//! # Alphabet and Character Coverage
//!
//! The required alphabet is the smallest frequency-ranked character set
//! whose mass reaches ``character_coverage``. Every other character is
//! rewritten to [`UNK_CHAR`] in the training sentences.

use unipiece::{normalizer::META_SPACE, types::UPHashMap};

use crate::training_types::Sentence;

/// Stands in for characters outside the required alphabet.
pub const UNK_CHAR: char = '\u{2585}';

/// Separates sentences in concatenated corpus text.
pub const SENTENCE_BOUNDARY: char = '\0';

/// The required characters of a corpus.
#[derive(Debug, Clone)]
pub struct Alphabet {
    /// Required characters with their weighted counts; by count desc, then code point.
    chars: Vec<(char, u64)>,
    index: UPHashMap<char, u64>,
    total: u64,
    rejected: usize,
}

impl Alphabet {
    /// Count characters and select the required alphabet.
    ///
    /// ## Arguments
    /// * `sentences` - Normalized sentences; user-defined symbols already removed.
    /// * `coverage` - The fraction of character mass to accept, in ``(0, 1]``.
    pub fn from_sentences(
        sentences: &[Sentence],
        coverage: f64,
    ) -> Self {
        let mut counts: UPHashMap<char, u64> = UPHashMap::default();
        for sentence in sentences {
            for c in sentence.text.chars() {
                if c == SENTENCE_BOUNDARY || c == UNK_CHAR {
                    continue;
                }
                *counts.entry(c).or_default() += sentence.freq;
            }
        }

        let total: u64 = counts.values().sum();
        let mut ranked: Vec<(char, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut accepted = 0u64;
        let mut chars = Vec::with_capacity(ranked.len());
        let mut rejected = 0;
        for (c, count) in ranked {
            if c == META_SPACE || total == 0 || (accepted as f64) / (total as f64) < coverage {
                accepted += count;
                chars.push((c, count));
            } else {
                rejected += 1;
            }
        }
        if !chars.iter().any(|&(c, _)| c == META_SPACE) {
            chars.push((META_SPACE, 0));
        }

        log::info!(
            "alphabet: {} required characters, {} rejected, coverage {:.4}",
            chars.len(),
            rejected,
            if total == 0 {
                1.0
            } else {
                accepted as f64 / total as f64
            }
        );

        let index = chars.iter().copied().collect();
        Self {
            chars,
            index,
            total,
            rejected,
        }
    }

    /// The required characters with their counts, most frequent first.
    pub fn chars(&self) -> &[(char, u64)] {
        &self.chars
    }

    /// The number of required characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Is the alphabet empty?
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Total character mass of the corpus.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The number of characters outside the alphabet.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Is ``c`` a required character?
    pub fn contains(
        &self,
        c: char,
    ) -> bool {
        self.index.contains_key(&c)
    }

    /// The weighted count of a required character.
    pub fn count(
        &self,
        c: char,
    ) -> Option<u64> {
        self.index.get(&c).copied()
    }

    /// Rewrite characters outside the alphabet to [`UNK_CHAR`].
    pub fn rewrite(
        &self,
        text: &str,
    ) -> String {
        text.chars()
            .map(|c| if self.contains(c) { c } else { UNK_CHAR })
            .collect()
    }

    /// Rewrite every sentence in place.
    pub fn rewrite_sentences(
        &self,
        sentences: &mut [Sentence],
    ) {
        if self.rejected == 0 {
            return;
        }
        for sentence in sentences {
            if sentence.text.chars().any(|c| !self.contains(c)) {
                sentence.text = self.rewrite(&sentence.text);
            }
        }
    }
}
