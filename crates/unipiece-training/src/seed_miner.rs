//! # Seed Piece Miner
//!
//! Frequent substrings of the corpus, found as the maximal repeats of the
//! concatenated sentences, make up the initial UNIGRAM vocabulary.

use rayon::prelude::*;

use crate::{
    alphabet::{Alphabet, SENTENCE_BOUNDARY},
    piece_validity::PieceValidator,
    suffix_array::{lcp_array, maximal_repeats, suffix_array},
    training_types::{ScoredPiece, Sentence, sort_by_score},
};

/// Mines seed pieces from a sentence sample.
#[derive(Debug, Clone)]
pub struct SeedPieceMiner {
    validator: PieceValidator,
    seed_size: usize,
}

impl SeedPieceMiner {
    /// Create a miner.
    ///
    /// ## Arguments
    /// * `validator` - The piece splitting rules.
    /// * `seed_size` - The seed vocabulary size, alphabet included.
    pub fn new(
        validator: PieceValidator,
        seed_size: usize,
    ) -> Self {
        Self {
            validator,
            seed_size,
        }
    }

    /// Mine seed pieces.
    ///
    /// ## Arguments
    /// * `sentences` - Normalized sentences, rejected characters rewritten.
    /// * `alphabet` - The required alphabet; every character becomes a seed.
    ///
    /// ## Returns
    /// Seed pieces scored with log relative frequency; multi-character
    /// pieces first, then the alphabet.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn mine(
        &self,
        sentences: &[Sentence],
        alphabet: &Alphabet,
    ) -> Vec<ScoredPiece> {
        let mut chars: Vec<char> = Vec::new();
        for sentence in sentences {
            chars.extend(sentence.text.chars());
            chars.push(SENTENCE_BOUNDARY);
        }

        let mut symbols: Vec<char> = chars.clone();
        symbols.sort_unstable();
        symbols.dedup();
        let text: Vec<u32> = chars
            .iter()
            .map(|c| symbols.binary_search(c).unwrap_or_default() as u32)
            .collect();

        log::info!("mining seed pieces over {} characters", text.len());
        let sa = suffix_array(&text, symbols.len());
        let lcp = lcp_array(&text, &sa);
        let nodes = maximal_repeats(&text, &sa, &lcp);
        log::debug!("{} maximal repeats", nodes.len());

        let mut candidates: Vec<ScoredPiece> = nodes
            .par_iter()
            .filter_map(|node| {
                let freq = node.freq();
                if freq <= 1 || node.depth < 2 {
                    return None;
                }
                let start = sa[node.left];
                let piece = &chars[start..start + node.depth];
                if !self.validator.is_valid(piece) {
                    return None;
                }
                Some(ScoredPiece::new(
                    piece.iter().collect::<String>(),
                    (freq * node.depth) as f32,
                ))
            })
            .collect();
        sort_by_score(&mut candidates);
        candidates.truncate(self.seed_size.saturating_sub(alphabet.len()));

        for &(c, count) in alphabet.chars() {
            candidates.push(ScoredPiece::new(c, count.max(1) as f32));
        }

        let total: f64 = candidates.iter().map(|p| p.score as f64).sum();
        let log_total = total.ln();
        for piece in &mut candidates {
            piece.score = ((piece.score as f64).ln() - log_total) as f32;
        }

        log::info!(
            "initialized {} seed pieces ({} characters)",
            candidates.len(),
            alphabet.len()
        );
        candidates
    }
}
