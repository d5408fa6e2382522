//! # Piece Table
//!
//! One immutable generation of the UNIGRAM vocabulary under training.
//! Each EM or pruning phase builds a new table; tables are shared as
//! [`Arc<PieceTable>`](std::sync::Arc) and never mutated.

use unipiece::{
    encoders::{Lattice, UNK_PENALTY},
    model::PrefixMatcher,
};

use crate::training_types::ScoredPiece;

/// A generation of scored pieces with its prefix trie.
#[derive(Debug, Clone)]
pub struct PieceTable {
    pieces: Vec<ScoredPiece>,
    required: Vec<bool>,
    matcher: PrefixMatcher,
    unk_score: f32,
}

impl PieceTable {
    /// Build a table.
    ///
    /// ## Arguments
    /// * `pieces` - The pieces; ids are positions.
    /// * `is_required` - Marks pieces exempt from pruning.
    pub fn new<F>(
        pieces: Vec<ScoredPiece>,
        is_required: F,
    ) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let required = pieces.iter().map(|p| is_required(&p.text)).collect();
        let matcher = pieces
            .iter()
            .enumerate()
            .map(|(id, p)| (p.text.as_str(), id as u32))
            .collect();
        let min_score = pieces
            .iter()
            .map(|p| p.score)
            .fold(f32::INFINITY, f32::min);
        let unk_score = if min_score.is_finite() {
            min_score - UNK_PENALTY
        } else {
            -UNK_PENALTY
        };
        Self {
            pieces,
            required,
            matcher,
            unk_score,
        }
    }

    /// The same pieces with new scores.
    ///
    /// ## Arguments
    /// * `scores` - One score per piece, in id order.
    pub fn rescored(
        &self,
        scores: &[f32],
    ) -> Self {
        let pieces: Vec<ScoredPiece> = self
            .pieces
            .iter()
            .zip(scores)
            .map(|(p, &score)| ScoredPiece::new(p.text.clone(), score))
            .collect();
        let min_score = scores.iter().copied().fold(f32::INFINITY, f32::min);
        Self {
            pieces,
            required: self.required.clone(),
            matcher: self.matcher.clone(),
            unk_score: if min_score.is_finite() {
                min_score - UNK_PENALTY
            } else {
                self.unk_score
            },
        }
    }

    /// The subset of pieces whose ids are marked in ``keep``.
    pub fn retain(
        &self,
        keep: &[bool],
    ) -> Self {
        let mut pieces = Vec::new();
        let mut required = Vec::new();
        for ((piece, &req), &k) in self.pieces.iter().zip(&self.required).zip(keep) {
            if k {
                pieces.push(piece.clone());
                required.push(req);
            }
        }
        let mut table = Self::new(pieces, |_| false);
        table.required = required;
        table
    }

    /// The pieces, in id order.
    pub fn pieces(&self) -> &[ScoredPiece] {
        &self.pieces
    }

    /// The number of pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Is piece ``id`` exempt from pruning?
    pub fn is_required(
        &self,
        id: usize,
    ) -> bool {
        self.required.get(id).copied().unwrap_or(false)
    }

    /// The virtual id given to UNKNOWN lattice nodes.
    pub fn unk_id(&self) -> u32 {
        self.pieces.len() as u32
    }

    /// Build the lattice of ``text`` over this table.
    pub fn lattice<'a>(
        &self,
        text: &'a str,
    ) -> Lattice<'a> {
        let mut lattice = Lattice::new(text);
        lattice.populate(
            &self.matcher,
            |id| self.pieces.get(id as usize).map(|p| p.score),
            self.unk_id(),
            self.unk_score,
        );
        lattice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PieceTable {
        PieceTable::new(
            vec![
                ScoredPiece::new("ab", -1.0),
                ScoredPiece::new("a", -2.0),
                ScoredPiece::new("b", -2.0),
            ],
            |p| p.chars().count() == 1,
        )
    }

    #[test]
    fn test_lattice() {
        let table = table();
        assert!(!table.is_required(0));
        assert!(table.is_required(1));

        let lattice = table.lattice("abx");
        let (path, score) = lattice.viterbi();
        let ids: Vec<u32> = path.iter().map(|&i| lattice.nodes()[i].id).collect();
        assert_eq!(ids, vec![0, table.unk_id()]);
        assert_eq!(score, -1.0 + (-2.0 - UNK_PENALTY) as f64);
    }

    #[test]
    fn test_generations() {
        let table = table();
        let rescored = table.rescored(&[-3.0, -1.0, -1.0]);
        assert_eq!(rescored.pieces()[0].score, -3.0);
        assert_eq!(table.pieces()[0].score, -1.0);

        let pruned = rescored.retain(&[false, true, true]);
        assert_eq!(pruned.len(), 2);
        assert_eq!(pruned.pieces()[0].text, "a");
        assert!(pruned.is_required(0));
        assert_eq!(pruned.unk_id(), 2);
    }
}
