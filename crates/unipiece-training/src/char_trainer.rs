//! # CHAR Trainer

use crate::{alphabet::Alphabet, training_types::ScoredPiece};

/// Train CHAR pieces: the alphabet, scored by log relative frequency.
///
/// ## Arguments
/// * `alphabet` - The required alphabet.
/// * `target_size` - The NORMAL piece target.
/// * `use_all_vocab` - Keep every character, ignoring ``target_size``.
pub fn train_chars(
    alphabet: &Alphabet,
    target_size: usize,
    use_all_vocab: bool,
) -> Vec<ScoredPiece> {
    let log_total = (alphabet.total().max(1) as f64).ln();
    let keep = if use_all_vocab {
        alphabet.len()
    } else {
        target_size.min(alphabet.len())
    };
    alphabet
        .chars()
        .iter()
        .take(keep)
        .map(|&(c, count)| ScoredPiece::new(c, ((count.max(1) as f64).ln() - log_total) as f32))
        .collect()
}
