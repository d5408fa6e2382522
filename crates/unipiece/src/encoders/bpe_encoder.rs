//! # BPE [`TokenEncoder`]
//!
//! Starts from single characters and repeatedly merges the adjacent pair
//! whose concatenation is the highest-scoring piece (leftmost on ties).
//!
//! Uses a binary max-heap over an index-linked symbol list; stale heap
//! entries are detected by re-checking adjacency and symbol extents.

use core::cmp::Ordering;
use std::{collections::BinaryHeap, sync::Arc};

use crate::{
    encoders::{TokenEncoder, token_encoder::Segment},
    model::Model,
};

const NONE: u32 = u32::MAX;

struct Symbol {
    start: usize,
    end: usize,
    prev: u32,
    next: u32,
}

/// A candidate merge of ``nodes[left]`` and ``nodes[right]``.
struct MergeEntry {
    score: f32,
    left: u32,
    right: u32,
    /// ``nodes[left].end`` when queued.
    mid: usize,
    /// ``nodes[right].end`` when queued.
    end: usize,
    /// ``nodes[left].start``; orders ties leftmost first.
    start: usize,
}

impl PartialEq for MergeEntry {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl Ord for MergeEntry {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.start.cmp(&self.start))
    }
}

impl PartialOrd for MergeEntry {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A BPE encoder; merge priority is the piece score.
#[derive(Debug, Clone)]
pub struct BpeEncoder {
    model: Arc<Model>,
}

impl BpeEncoder {
    /// Create an encoder over a model.
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    fn merge_score(
        &self,
        text: &str,
    ) -> Option<f32> {
        let id = self.model.piece_to_id(text)?;
        self.model
            .piece(id)
            .filter(|p| p.is_segmentable())
            .map(|p| p.score)
    }

    fn queue(
        &self,
        span: &str,
        symbols: &[Symbol],
        left: u32,
        heap: &mut BinaryHeap<MergeEntry>,
    ) {
        let l = &symbols[left as usize];
        if l.next == NONE {
            return;
        }
        let r = &symbols[l.next as usize];
        if let Some(score) = self.merge_score(&span[l.start..r.end]) {
            heap.push(MergeEntry {
                score,
                left,
                right: l.next,
                mid: l.end,
                end: r.end,
                start: l.start,
            });
        }
    }
}

impl TokenEncoder for BpeEncoder {
    fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn segment_span(
        &self,
        span: &str,
        offset: usize,
        segments: &mut Vec<Segment>,
    ) {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(span.len());
        for (i, (start, c)) in span.char_indices().enumerate() {
            symbols.push(Symbol {
                start,
                end: start + c.len_utf8(),
                prev: if i == 0 { NONE } else { (i - 1) as u32 },
                next: (i + 1) as u32,
            });
        }
        let Some(last) = symbols.last_mut() else {
            return;
        };
        last.next = NONE;

        let mut heap = BinaryHeap::with_capacity(symbols.len());
        for i in 0..symbols.len() as u32 {
            self.queue(span, &symbols, i, &mut heap);
        }

        while let Some(entry) = heap.pop() {
            let (li, ri) = (entry.left as usize, entry.right as usize);
            if symbols[li].next != entry.right
                || symbols[li].end != entry.mid
                || symbols[ri].end != entry.end
            {
                continue;
            }

            // Left absorbs right.
            let right_next = symbols[ri].next;
            symbols[li].end = entry.end;
            symbols[li].next = right_next;
            if right_next != NONE {
                symbols[right_next as usize].prev = entry.left;
            }
            symbols[ri].next = NONE;
            symbols[ri].prev = NONE;

            let left_prev = symbols[li].prev;
            if left_prev != NONE {
                self.queue(span, &symbols, left_prev, &mut heap);
            }
            self.queue(span, &symbols, entry.left, &mut heap);
        }

        let unk_id = self.model.unk_id();
        let mut idx = 0u32;
        while idx != NONE {
            let symbol = &symbols[idx as usize];
            let id = self
                .model
                .piece_to_id(&span[symbol.start..symbol.end])
                .filter(|&id| self.model.piece(id).is_some_and(|p| p.is_segmentable()))
                .unwrap_or(unk_id);
            segments.push(Segment::new(
                id,
                offset + symbol.start,
                offset + symbol.end,
            ));
            idx = symbol.next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::testing::build_model_proto,
        proto::{ModelType, NormalizerSpec, PieceType},
    };

    fn low_encoder() -> BpeEncoder {
        // Merge order: (l,o) -> lo first, then (lo,w) -> low.
        let proto = build_model_proto(
            ModelType::Bpe,
            NormalizerSpec {
                add_dummy_prefix: Some(false),
                ..Default::default()
            },
            &[
                ("lo", 0.0, PieceType::Normal),
                ("low", -1.0, PieceType::Normal),
                ("l", -2.0, PieceType::Normal),
                ("o", -3.0, PieceType::Normal),
                ("w", -4.0, PieceType::Normal),
            ],
        );
        BpeEncoder::new(Arc::new(Model::from_proto(&proto).unwrap()))
    }

    #[test]
    fn test_merges() {
        let encoder = low_encoder();
        assert_eq!(encoder.encode_as_pieces("low"), vec!["low"]);
        assert_eq!(encoder.encode_as_pieces("owl"), vec!["o", "w", "l"]);
        assert_eq!(encoder.encode_as_pieces("lolow"), vec!["lo", "low"]);
        assert_eq!(encoder.encode_as_pieces(""), Vec::<String>::new());
    }

    #[test]
    fn test_unknown_chars() {
        let encoder = low_encoder();
        let ids: Vec<u32> = encoder.try_encode("lox").unwrap();
        assert_eq!(ids, vec![3, 0]);
    }

    #[test]
    fn test_leftmost_on_ties() {
        let proto = build_model_proto(
            ModelType::Bpe,
            NormalizerSpec {
                add_dummy_prefix: Some(false),
                ..Default::default()
            },
            &[
                ("aa", 0.0, PieceType::Normal),
                ("a", -1.0, PieceType::Normal),
            ],
        );
        let encoder = BpeEncoder::new(Arc::new(Model::from_proto(&proto).unwrap()));
        assert_eq!(encoder.encode_as_pieces("aaa"), vec!["aa", "a"]);
    }
}
