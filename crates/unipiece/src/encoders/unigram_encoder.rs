//! # Unigram [`TokenEncoder`]
//!
//! Viterbi segmentation over a [`Lattice`] built from the model's prefix trie.

use std::sync::Arc;

use rand::Rng;

use crate::{
    encoders::{
        Lattice,
        TokenEncoder,
        token_encoder::{Segment, push_merging_unk},
    },
    model::{Model, SpanRef},
};

/// The score of an UNKNOWN node, relative to the model's minimum score.
pub const UNK_PENALTY: f32 = 10.0;

/// A UNIGRAM language-model encoder.
#[derive(Debug, Clone)]
pub struct UnigramEncoder {
    model: Arc<Model>,
    unk_score: f32,
}

impl UnigramEncoder {
    /// Create an encoder over a model.
    pub fn new(model: Arc<Model>) -> Self {
        let unk_score = model.min_score() - UNK_PENALTY;
        Self { model, unk_score }
    }

    /// Build the lattice for a span.
    pub fn build_lattice<'a>(
        &self,
        span: &'a str,
    ) -> Lattice<'a> {
        let mut lattice = Lattice::new(span);
        let model = &self.model;
        lattice.populate(
            model.prefix_matcher(),
            |id| match model.piece(id) {
                Some(p) if p.is_user_defined() => Some(0.0),
                Some(p) => Some(p.score),
                None => None,
            },
            model.unk_id(),
            self.unk_score,
        );
        lattice
    }

    fn push_path(
        &self,
        lattice: &Lattice,
        path: &[usize],
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        let unk_id = self.model.unk_id();
        for &idx in path {
            let node = &lattice.nodes()[idx];
            let range = lattice.byte_range(node);
            push_merging_unk(
                segments,
                Segment::new(node.id, offset + range.start, offset + range.end),
                unk_id,
            );
        }
    }

    /// Segment normalized text with one sampled path per span.
    ///
    /// ## Arguments
    /// * `normalized` - Normalized text.
    /// * `alpha` - Smoothing; scores are scaled by ``alpha`` before sampling.
    /// * `rng` - The random source.
    pub fn sample_segments<R: Rng + ?Sized>(
        &self,
        normalized: &str,
        alpha: f32,
        rng: &mut R,
    ) -> Vec<Segment> {
        let mut segments = Vec::new();
        for span in self.model.split_user_defined(normalized) {
            match span {
                SpanRef::Normal { offset, text } => {
                    let lattice = self.build_lattice(text);
                    let path = lattice.sample(alpha as f64, rng);
                    self.push_path(&lattice, &path, offset, &mut segments);
                }
                SpanRef::UserDefined { offset, text, id } => {
                    segments.push(Segment::new(id, offset, offset + text.len()))
                }
            }
        }
        segments
    }

    /// The ``n`` best segmentations of normalized text, with their scores.
    ///
    /// USER_DEFINED pieces are scored 0 and are not alternatives; spans are
    /// combined best-first per span, so the k-th result takes the k-th path
    /// of the first span with enough alternatives and the best path elsewhere.
    pub fn nbest_segments(
        &self,
        normalized: &str,
        n: usize,
    ) -> Vec<(Vec<Segment>, f64)> {
        if n == 0 {
            return Vec::new();
        }

        // Per span: candidate (segments, score) lists.
        let mut per_span: Vec<Vec<(Vec<Segment>, f64)>> = Vec::new();
        for span in self.model.split_user_defined(normalized) {
            match span {
                SpanRef::Normal { offset, text } => {
                    let lattice = self.build_lattice(text);
                    per_span.push(
                        lattice
                            .nbest(n)
                            .into_iter()
                            .map(|(path, score)| {
                                let mut segments = Vec::new();
                                self.push_path(&lattice, &path, offset, &mut segments);
                                (segments, score)
                            })
                            .collect(),
                    );
                }
                SpanRef::UserDefined { offset, text, id } => {
                    per_span.push(vec![(vec![Segment::new(id, offset, offset + text.len())], 0.0)])
                }
            }
        }

        let best: Vec<usize> = vec![0; per_span.len()];
        let mut results = vec![combine(&per_span, &best)];
        for (span_idx, candidates) in per_span.iter().enumerate() {
            for k in 1..candidates.len() {
                if results.len() >= n {
                    break;
                }
                let mut choice = best.clone();
                choice[span_idx] = k;
                results.push(combine(&per_span, &choice));
            }
        }
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(n);
        results
    }
}

fn combine(
    per_span: &[Vec<(Vec<Segment>, f64)>],
    choice: &[usize],
) -> (Vec<Segment>, f64) {
    let mut segments = Vec::new();
    let mut score = 0.0;
    for (candidates, &k) in per_span.iter().zip(choice) {
        if let Some((s, sc)) = candidates.get(k) {
            segments.extend_from_slice(s);
            score += sc;
        }
    }
    (segments, score)
}

impl TokenEncoder for UnigramEncoder {
    fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        let lattice = self.build_lattice(span);
        let (path, _) = lattice.viterbi();
        self.push_path(&lattice, &path, offset, segments);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        model::testing::{build_model_proto, hello_world_proto, sample_model_proto},
        proto::{ModelType, NormalizerSpec, PieceType},
        types::{check_is_send, check_is_sync},
    };

    fn encoder(proto: &crate::proto::ModelProto) -> UnigramEncoder {
        UnigramEncoder::new(Arc::new(Model::from_proto(proto).unwrap()))
    }

    #[test]
    fn test_hello_world() {
        let encoder = encoder(&hello_world_proto());
        check_is_send(&encoder);
        check_is_sync(&encoder);

        assert_eq!(
            encoder.encode_as_pieces("hello world"),
            vec!["▁hello", "▁world"]
        );
        let ids: Vec<u32> = encoder.try_encode("hello world").unwrap();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_unknown_runs_merge() {
        let encoder = encoder(&hello_world_proto());
        let pieces = encoder.encode_as_pieces("hello xyz");
        assert_eq!(pieces, vec!["▁hello", "▁", "xyz"]);
        let ids: Vec<u16> = encoder.try_encode("hello xyz").unwrap();
        assert_eq!(ids, vec![3, 5, 0]);
    }

    #[test]
    fn test_user_defined_presegmentation() {
        let encoder = encoder(&sample_model_proto());
        assert_eq!(
            encoder.encode_as_pieces("a<sep>bc"),
            vec!["▁a", "<sep>", "bc"]
        );
    }

    #[test]
    fn test_tie_break_longer_piece() {
        let proto = build_model_proto(
            ModelType::Unigram,
            NormalizerSpec {
                add_dummy_prefix: Some(false),
                ..Default::default()
            },
            &[
                ("x", -1.0, PieceType::Normal),
                ("y", -1.0, PieceType::Normal),
                ("xy", -2.0, PieceType::Normal),
            ],
        );
        let encoder = encoder(&proto);
        assert_eq!(encoder.encode_as_pieces("xy"), vec!["xy"]);
    }

    #[test]
    fn test_nbest_and_sample() {
        let encoder = encoder(&sample_model_proto());
        let model = encoder.model().clone();
        let normalized = model.normalizer().normalize("ab");
        assert_eq!(normalized, "▁ab");

        let nbest = encoder.nbest_segments(&normalized, 3);
        assert_eq!(nbest.len(), 3);
        for pair in nbest.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        let best: Vec<Segment> = encoder.segment_normalized(&normalized);
        assert_eq!(nbest[0].0, best);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let segments = encoder.sample_segments(&normalized, 0.1, &mut rng);
            let surface: String = segments
                .iter()
                .map(|s| &normalized[s.start..s.end])
                .collect();
            assert_eq!(surface, normalized);
        }
    }
}
