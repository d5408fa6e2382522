//! # Segmentation Lattice
//!
//! Every candidate piece occurrence over a sentence, as index-addressed
//! nodes grouped by start and end character position.
//!
//! Supports:
//! * Viterbi best path ([`Lattice::viterbi`]);
//! * forward-backward expected counts ([`Lattice::populate_marginal`]);
//! * n-best paths ([`Lattice::nbest`]);
//! * forward-filtering / backward-sampling ([`Lattice::sample`]).
//!
//! Scores are log-probabilities; path scores are accumulated in ``f64``.

use core::{cmp::Ordering, ops::Range};
use std::collections::BinaryHeap;

use rand::Rng;

use crate::model::PrefixMatcher;

/// Upper bound on n-best search expansions.
const MAX_NBEST_EXPANSIONS: usize = 100_000;

/// One candidate piece occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeNode {
    /// Piece id.
    pub id: u32,

    /// Start position, in characters.
    pub pos: usize,

    /// Length, in characters.
    pub len: usize,

    /// Piece score.
    pub score: f32,
}

impl LatticeNode {
    /// End position, in characters.
    pub fn end(&self) -> usize {
        self.pos + self.len
    }
}

/// A lattice over one sentence.
#[derive(Debug, Clone)]
pub struct Lattice<'a> {
    text: &'a str,

    /// Byte offset of each char position; ``len() + 1`` entries.
    offsets: Vec<usize>,

    nodes: Vec<LatticeNode>,
    begin_nodes: Vec<Vec<usize>>,
    end_nodes: Vec<Vec<usize>>,
}

impl<'a> Lattice<'a> {
    /// Create an empty lattice over ``text``.
    pub fn new(text: &'a str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let positions = offsets.len();

        Self {
            text,
            offsets,
            nodes: Vec::new(),
            begin_nodes: vec![Vec::new(); positions],
            end_nodes: vec![Vec::new(); positions],
        }
    }

    /// The sentence.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Sentence length in characters.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Is the sentence empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    /// Node indices starting at char position ``pos``.
    pub fn begin_nodes(
        &self,
        pos: usize,
    ) -> &[usize] {
        &self.begin_nodes[pos]
    }

    /// Node indices ending at char position ``pos``.
    pub fn end_nodes(
        &self,
        pos: usize,
    ) -> &[usize] {
        &self.end_nodes[pos]
    }

    /// The byte range a node covers.
    pub fn byte_range(
        &self,
        node: &LatticeNode,
    ) -> Range<usize> {
        self.offsets[node.pos]..self.offsets[node.end()]
    }

    /// The text a node covers.
    pub fn surface(
        &self,
        node: &LatticeNode,
    ) -> &'a str {
        &self.text[self.byte_range(node)]
    }

    /// Add a node; returns its index.
    pub fn insert(
        &mut self,
        pos: usize,
        len: usize,
        id: u32,
        score: f32,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(LatticeNode {
            id,
            pos,
            len,
            score,
        });
        self.begin_nodes[pos].push(idx);
        self.end_nodes[pos + len].push(idx);
        idx
    }

    /// Add a node for every vocabulary match.
    ///
    /// Positions with no single-character match get an UNKNOWN node, so
    /// every position is reachable.
    ///
    /// ## Arguments
    /// * `matcher` - The piece trie.
    /// * `score_of` - Score for a matched id; ``None`` skips the match.
    /// * `unk_id` - The UNKNOWN piece id.
    /// * `unk_score` - The UNKNOWN node score.
    pub fn populate<F>(
        &mut self,
        matcher: &PrefixMatcher,
        mut score_of: F,
        unk_id: u32,
        unk_score: f32,
    ) where
        F: FnMut(u32) -> Option<f32>,
    {
        for pos in 0..self.len() {
            let start = self.offsets[pos];
            let mut has_single = false;

            for (byte_len, id) in matcher.common_prefix_search(&self.text[start..]) {
                let Some(score) = score_of(id) else {
                    continue;
                };
                let Ok(end) = self.offsets.binary_search(&(start + byte_len)) else {
                    continue;
                };
                let len = end - pos;
                has_single |= len == 1;
                self.insert(pos, len, id, score);
            }

            if !has_single {
                self.insert(pos, 1, unk_id, unk_score);
            }
        }
    }

    /// Best forward score to each position, with the winning incoming node.
    ///
    /// On equal scores the longer incoming piece wins, then the lower id.
    fn best_forward(&self) -> (Vec<f64>, Vec<Option<usize>>) {
        let positions = self.offsets.len();
        let mut best = vec![f64::NEG_INFINITY; positions];
        let mut back: Vec<Option<usize>> = vec![None; positions];
        best[0] = 0.0;

        for pos in 1..positions {
            for &idx in &self.end_nodes[pos] {
                let node = &self.nodes[idx];
                let prev = best[node.pos];
                if prev == f64::NEG_INFINITY {
                    continue;
                }
                let candidate = prev + node.score as f64;

                let better = match back[pos] {
                    None => true,
                    Some(current) => {
                        let current = &self.nodes[current];
                        match candidate.total_cmp(&best[pos]) {
                            Ordering::Greater => true,
                            Ordering::Less => false,
                            Ordering::Equal => (node.len, core::cmp::Reverse(node.id))
                                > (current.len, core::cmp::Reverse(current.id)),
                        }
                    }
                };
                if better {
                    best[pos] = candidate;
                    back[pos] = Some(idx);
                }
            }
        }

        (best, back)
    }

    /// The best segmentation.
    ///
    /// ## Returns
    /// ``(node indices, path score)``; empty for an empty sentence.
    pub fn viterbi(&self) -> (Vec<usize>, f64) {
        let (best, back) = self.best_forward();

        let mut path = Vec::new();
        let mut pos = self.len();
        while pos > 0 {
            let Some(idx) = back[pos] else {
                return (Vec::new(), f64::NEG_INFINITY);
            };
            path.push(idx);
            pos = self.nodes[idx].pos;
        }
        path.reverse();

        (path, best[self.len()])
    }

    /// Log-space forward sums, scores scaled by ``theta``.
    fn forward(
        &self,
        theta: f64,
    ) -> Vec<f64> {
        let positions = self.offsets.len();
        let mut alpha = vec![f64::NEG_INFINITY; positions];
        alpha[0] = 0.0;
        for pos in 1..positions {
            alpha[pos] = self.end_nodes[pos]
                .iter()
                .map(|&idx| {
                    let node = &self.nodes[idx];
                    alpha[node.pos] + theta * node.score as f64
                })
                .fold(f64::NEG_INFINITY, log_add);
        }
        alpha
    }

    /// Log-space backward sums, scores scaled by ``theta``.
    fn backward(
        &self,
        theta: f64,
    ) -> Vec<f64> {
        let positions = self.offsets.len();
        let mut beta = vec![f64::NEG_INFINITY; positions];
        beta[positions - 1] = 0.0;
        for pos in (0..positions - 1).rev() {
            beta[pos] = self.begin_nodes[pos]
                .iter()
                .map(|&idx| {
                    let node = &self.nodes[idx];
                    theta * node.score as f64 + beta[node.end()]
                })
                .fold(f64::NEG_INFINITY, log_add);
        }
        beta
    }

    /// Accumulate expected piece counts.
    ///
    /// ## Arguments
    /// * `freq` - The sentence frequency.
    /// * `expected` - Per-id counts; ``expected[node.id] += freq * P(node)``.
    ///
    /// ## Returns
    /// The log marginal likelihood of the sentence.
    pub fn populate_marginal(
        &self,
        freq: f64,
        expected: &mut [f64],
    ) -> f64 {
        let alpha = self.forward(1.0);
        let beta = self.backward(1.0);
        let z = alpha[self.len()];

        for node in &self.nodes {
            let Some(slot) = expected.get_mut(node.id as usize) else {
                continue;
            };
            let log_marginal = alpha[node.pos] + node.score as f64 + beta[node.end()] - z;
            *slot += freq * log_marginal.exp();
        }

        z
    }

    /// Sample one segmentation.
    ///
    /// ## Arguments
    /// * `theta` - Inverse temperature; scales scores before sampling.
    /// * `rng` - The random source.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        theta: f64,
        rng: &mut R,
    ) -> Vec<usize> {
        let alpha = self.forward(theta);

        let mut path = Vec::new();
        let mut pos = self.len();
        while pos > 0 {
            let candidates = &self.end_nodes[pos];
            let weights: Vec<f64> = candidates
                .iter()
                .map(|&idx| {
                    let node = &self.nodes[idx];
                    (alpha[node.pos] + theta * node.score as f64 - alpha[pos]).exp()
                })
                .collect();

            let total: f64 = weights.iter().sum();
            let mut r = rng.random::<f64>() * total;
            let mut chosen = candidates.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if r < *w {
                    chosen = i;
                    break;
                }
                r -= w;
            }

            let idx = candidates[chosen];
            path.push(idx);
            pos = self.nodes[idx].pos;
        }
        path.reverse();
        path
    }

    /// The ``n`` best segmentations, best first.
    ///
    /// A* search from the sentence end, using Viterbi forward scores as the
    /// (exact) heuristic.
    pub fn nbest(
        &self,
        n: usize,
    ) -> Vec<(Vec<usize>, f64)> {
        if n == 0 {
            return Vec::new();
        }
        if self.is_empty() {
            return vec![(Vec::new(), 0.0)];
        }

        let (best, _) = self.best_forward();

        struct Hypothesis {
            node: Option<usize>,
            next: Option<usize>,
            pos: usize,
            gx: f64,
        }

        let mut arena = vec![Hypothesis {
            node: None,
            next: None,
            pos: self.len(),
            gx: 0.0,
        }];
        let mut agenda = BinaryHeap::new();
        agenda.push(AgendaEntry {
            fx: best[self.len()],
            seq: 0,
            hyp: 0,
        });

        let mut results = Vec::new();
        let mut expansions = 0;
        while let Some(entry) = agenda.pop() {
            let hyp = &arena[entry.hyp];
            if hyp.pos == 0 {
                let mut path = Vec::new();
                let mut cursor = Some(entry.hyp);
                while let Some(h) = cursor {
                    if let Some(node) = arena[h].node {
                        path.push(node);
                    }
                    cursor = arena[h].next;
                }
                results.push((path, hyp.gx));
                if results.len() == n {
                    break;
                }
                continue;
            }

            expansions += 1;
            if expansions > MAX_NBEST_EXPANSIONS {
                break;
            }

            let (pos, gx) = (hyp.pos, hyp.gx);
            for &idx in &self.end_nodes[pos] {
                let node = &self.nodes[idx];
                if best[node.pos] == f64::NEG_INFINITY {
                    continue;
                }
                let gx = gx + node.score as f64;
                arena.push(Hypothesis {
                    node: Some(idx),
                    next: Some(entry.hyp),
                    pos: node.pos,
                    gx,
                });
                agenda.push(AgendaEntry {
                    fx: gx + best[node.pos],
                    seq: arena.len() - 1,
                    hyp: arena.len() - 1,
                });
            }
        }

        results
    }
}

/// A* agenda entry; max-heap on ``fx``, earlier entries first on ties.
struct AgendaEntry {
    fx: f64,
    seq: usize,
    hyp: usize,
}

impl PartialEq for AgendaEntry {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AgendaEntry {}

impl Ord for AgendaEntry {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.fx
            .total_cmp(&other.fx)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for AgendaEntry {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ``log(exp(a) + exp(b))``.
pub fn log_add(
    a: f64,
    b: f64,
) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn pieces_matcher(pieces: &[(&str, f32)]) -> PrefixMatcher {
        pieces
            .iter()
            .enumerate()
            .map(|(i, (p, _))| (*p, i as u32 + 1))
            .collect()
    }

    fn build<'a>(
        text: &'a str,
        pieces: &[(&str, f32)],
    ) -> Lattice<'a> {
        let matcher = pieces_matcher(pieces);
        let mut lattice = Lattice::new(text);
        lattice.populate(
            &matcher,
            |id| Some(pieces[id as usize - 1].1),
            0,
            -100.0,
        );
        lattice
    }

    fn surfaces(
        lattice: &Lattice,
        path: &[usize],
    ) -> Vec<String> {
        path.iter()
            .map(|&i| lattice.surface(&lattice.nodes()[i]).to_string())
            .collect()
    }

    #[test]
    fn test_empty() {
        let lattice = Lattice::new("");
        assert!(lattice.is_empty());
        assert_eq!(lattice.viterbi().0, Vec::<usize>::new());
        assert_eq!(lattice.nbest(3).len(), 1);
    }

    #[test]
    fn test_viterbi() {
        let pieces = [("▁hello", -1.0), ("▁world", -1.2), ("▁", -3.0)];
        let lattice = build("▁hello▁world", &pieces);
        let (path, score) = lattice.viterbi();
        assert_eq!(surfaces(&lattice, &path), vec!["▁hello", "▁world"]);
        assert!((score - -2.2).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_fallback() {
        let pieces = [("a", -1.0)];
        let lattice = build("axa", &pieces);
        let (path, _) = lattice.viterbi();
        let ids: Vec<u32> = path.iter().map(|&i| lattice.nodes()[i].id).collect();
        assert_eq!(ids, vec![1, 0, 1]);
    }

    #[test]
    fn test_viterbi_tie_prefers_longer_piece() {
        // "ab" (-2.0) ties with "a" + "b" (-1.0 + -1.0).
        let pieces = [("a", -1.0), ("b", -1.0), ("ab", -2.0)];
        let lattice = build("ab", &pieces);
        let (path, score) = lattice.viterbi();
        assert_eq!(surfaces(&lattice, &path), vec!["ab"]);
        assert_eq!(score, -2.0);
    }

    #[test]
    fn test_viterbi_tie_prefers_lower_id() {
        let matcher: PrefixMatcher = [("x", 7u32)].into_iter().collect();
        let mut lattice = Lattice::new("x");
        lattice.insert(0, 1, 9, -1.0);
        lattice.populate(&matcher, |_| Some(-1.0), 0, -10.0);
        let (path, _) = lattice.viterbi();
        assert_eq!(lattice.nodes()[path[0]].id, 7);
    }

    #[test]
    fn test_marginals_sum() {
        let pieces = [("a", -1.0), ("b", -1.5), ("ab", -2.0)];
        let lattice = build("ab", &pieces);
        let mut expected = vec![0.0; 4];
        let z = lattice.populate_marginal(1.0, &mut expected);

        // Z = log(e^-2.5 + e^-2.0)
        let want = ((-2.5f64).exp() + (-2.0f64).exp()).ln();
        assert!((z - want).abs() < 1e-9);

        // P(a) == P(b); P(a) + P(ab) == 1.
        assert!((expected[1] - expected[2]).abs() < 1e-9);
        assert!((expected[1] + expected[3] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nbest() {
        let pieces = [("a", -1.0), ("b", -1.5), ("ab", -2.0)];
        let lattice = build("ab", &pieces);
        let results = lattice.nbest(5);
        assert_eq!(results.len(), 2);
        assert_eq!(surfaces(&lattice, &results[0].0), vec!["ab"]);
        assert_eq!(surfaces(&lattice, &results[1].0), vec!["a", "b"]);
        assert!((results[1].1 - -2.5).abs() < 1e-9);
    }

    #[test]
    fn test_sample_is_valid_path() {
        let pieces = [("a", -1.0), ("b", -1.5), ("ab", -2.0), ("ba", -2.0)];
        let lattice = build("abab", &pieces);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let path = lattice.sample(0.5, &mut rng);
            assert_eq!(surfaces(&lattice, &path).concat(), "abab");
        }
    }

    #[test]
    fn test_log_add() {
        assert_eq!(log_add(f64::NEG_INFINITY, 1.0), 1.0);
        let v = log_add(0.0, 0.0);
        assert!((v - 2f64.ln()).abs() < 1e-12);
    }
}
