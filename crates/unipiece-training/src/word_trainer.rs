//! # WORD Trainer
//!
//! The most frequent whitespace-delimited words, scored by log relative
//! frequency.

use compact_str::CompactString;

use crate::{
    alphabet::UNK_CHAR,
    training_types::{ScoredPiece, Sentence},
    utility::WordCounter,
};

/// Train WORD pieces.
///
/// ## Arguments
/// * `sentences` - Normalized training sentences.
/// * `target_size` - The NORMAL piece target.
/// * `max_len` - Words longer than this (in characters) are skipped.
/// * `use_all_vocab` - Keep every word, ignoring ``target_size``.
pub fn train_words(
    sentences: &[Sentence],
    target_size: usize,
    max_len: usize,
    use_all_vocab: bool,
) -> Vec<ScoredPiece> {
    let mut counter: WordCounter<CompactString, u64> = WordCounter::default();
    counter.update_from_sentences(sentences);

    let ranked: Vec<(CompactString, u64)> = counter
        .to_ranked_vec()
        .into_iter()
        .filter(|(word, _)| !word.contains(UNK_CHAR) && word.chars().count() <= max_len)
        .collect();
    let total: u64 = ranked.iter().map(|(_, c)| c).sum();
    let log_total = (total.max(1) as f64).ln();

    let keep = if use_all_vocab {
        ranked.len()
    } else {
        target_size.min(ranked.len())
    };
    log::info!("WORD training: {} distinct words, keeping {}", ranked.len(), keep);

    ranked
        .into_iter()
        .take(keep)
        .map(|(word, count)| ScoredPiece::new(word.as_str(), ((count as f64).ln() - log_total) as f32))
        .collect()
}
