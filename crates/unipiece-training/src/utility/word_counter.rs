//! # Word Counter

use unipiece::{encoders::word_encoder::split_words, types::UPHashMap};

use crate::training_types::{CountType, Sentence, StringChunkType};

/// Frequency-weighted counts of whitespace-delimited words.
///
/// Words keep their leading ``▁``.
pub struct WordCounter<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    /// The word counts.
    pub word_counts: UPHashMap<K, C>,
}

impl<K, C> Default for WordCounter<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    fn default() -> Self {
        Self {
            word_counts: UPHashMap::default(),
        }
    }
}

impl<K, C> WordCounter<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    /// Release the word counts and return them.
    pub fn release(self) -> UPHashMap<K, C> {
        self.word_counts
    }

    /// Count the words of one sentence.
    ///
    /// ## Arguments
    /// * `text` - Normalized text.
    /// * `count` - The weight added per occurrence.
    pub fn update_from_text(
        &mut self,
        text: &str,
        count: C,
    ) {
        for (start, end) in split_words(text) {
            let k: K = text[start..end].into();
            *self.word_counts.entry(k).or_default() += count;
        }
    }

    /// Count the words of every sentence, weighted by sentence frequency.
    ///
    /// Frequencies that do not fit ``C`` saturate.
    pub fn update_from_sentences(
        &mut self,
        sentences: &[Sentence],
    ) {
        for sentence in sentences {
            let count = C::from_u64(sentence.freq).unwrap_or_else(C::max_value);
            self.update_from_text(&sentence.text, count);
        }
    }

    /// The counts as a list, most frequent first (ties by word).
    pub fn to_ranked_vec(&self) -> Vec<(K, C)> {
        let mut ranked: Vec<(K, C)> = self
            .word_counts
            .iter()
            .map(|(k, c)| (k.clone(), *c))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}
