//! # Model
//!
//! [`Model`] is the validated, immutable runtime form of a [`ModelProto`].
//! It is built once and shared as ``Arc<Model>`` by encoders and decoders.

use aho_corasick::{AhoCorasick, MatchKind};

use crate::{
    errors::{UPResult, UnipieceError},
    model::{Piece, PrefixMatcher},
    normalizer::Normalizer,
    proto::{ModelExtensions, ModelProto, ModelType, NormalizerSpec, PieceType, TrainerSpec},
    types::{UPHashMap, hash_map_with_capacity},
};

/// A span of normalized text, split on USER_DEFINED pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanRef<'a> {
    /// Text to be segmented by the model.
    Normal {
        /// Byte offset into the normalized text.
        offset: usize,

        /// The span text.
        text: &'a str,
    },

    /// An exact USER_DEFINED piece match.
    UserDefined {
        /// Byte offset into the normalized text.
        offset: usize,

        /// The matched text.
        text: &'a str,

        /// The piece id.
        id: u32,
    },
}

/// Leftmost-longest matcher over USER_DEFINED pieces.
#[derive(Debug, Clone)]
struct UserDefinedMatcher {
    automaton: AhoCorasick,
    ids: Vec<u32>,
}

/// A trained model.
#[derive(Debug, Clone)]
pub struct Model {
    pieces: Vec<Piece>,
    piece_index: UPHashMap<String, u32>,
    model_type: ModelType,

    unk_id: u32,
    bos_id: Option<u32>,
    eos_id: Option<u32>,
    pad_id: Option<u32>,

    min_score: f32,
    max_score: f32,

    prefix_matcher: PrefixMatcher,
    user_defined: Option<UserDefinedMatcher>,
    normalizer: Normalizer,

    trainer_spec: TrainerSpec,
    normalizer_spec: NormalizerSpec,
    extensions: ModelExtensions,
}

impl Model {
    /// Validate and index a [`ModelProto`].
    ///
    /// ## Arguments
    /// * `proto` - The decoded model.
    ///
    /// ## Returns
    /// A `UPResult<Model>`; empty or duplicate pieces, or anything other than
    /// exactly one UNKNOWN piece, is a [`UnipieceError::VocabConflict`].
    pub fn from_proto(proto: &ModelProto) -> UPResult<Self> {
        if proto.pieces.is_empty() {
            return Err(UnipieceError::VocabConflict(
                "model has no pieces".to_string(),
            ));
        }

        let pieces: Vec<Piece> = proto.pieces.iter().map(Piece::from).collect();

        let mut piece_index = hash_map_with_capacity(pieces.len());
        let mut unk_id = None;
        for (id, piece) in pieces.iter().enumerate() {
            let id = id as u32;
            if piece.text.is_empty() {
                return Err(UnipieceError::VocabConflict(format!(
                    "piece {id} is empty"
                )));
            }
            if let Some(prev) = piece_index.insert(piece.text.clone(), id) {
                return Err(UnipieceError::VocabConflict(format!(
                    "piece {:?} is duplicated at ids {prev} and {id}",
                    piece.text
                )));
            }
            if piece.is_unknown() && unk_id.replace(id).is_some() {
                return Err(UnipieceError::VocabConflict(
                    "model has more than one UNKNOWN piece".to_string(),
                ));
            }
        }
        let unk_id = unk_id.ok_or_else(|| {
            UnipieceError::VocabConflict("model has no UNKNOWN piece".to_string())
        })?;

        let trainer_spec = proto.trainer_spec.clone().unwrap_or_default();
        let normalizer_spec = proto.normalizer_spec.clone().unwrap_or_default();

        let (min_score, max_score) = pieces
            .iter()
            .filter(|p| p.kind == PieceType::Normal)
            .fold(None, |acc: Option<(f32, f32)>, p| match acc {
                None => Some((p.score, p.score)),
                Some((lo, hi)) => Some((lo.min(p.score), hi.max(p.score))),
            })
            .unwrap_or((0.0, 0.0));

        let prefix_matcher = pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_segmentable())
            .map(|(id, p)| (p.text.as_str(), id as u32))
            .collect();

        let user_defined = build_user_defined_matcher(&pieces)?;
        let normalizer = Normalizer::new(&normalizer_spec)?;

        let control_id = |id: i32, piece: &str| -> Option<u32> {
            let by_id = u32::try_from(id)
                .ok()
                .filter(|&id| pieces.get(id as usize).is_some_and(Piece::is_control));
            by_id.or_else(|| {
                piece_index
                    .get(piece)
                    .copied()
                    .filter(|&id| pieces[id as usize].is_control())
            })
        };
        let bos_id = control_id(trainer_spec.bos_id(), trainer_spec.bos_piece());
        let eos_id = control_id(trainer_spec.eos_id(), trainer_spec.eos_piece());
        let pad_id = control_id(trainer_spec.pad_id(), trainer_spec.pad_piece());

        Ok(Self {
            model_type: trainer_spec.model_type(),
            pieces,
            piece_index,
            unk_id,
            bos_id,
            eos_id,
            pad_id,
            min_score,
            max_score,
            prefix_matcher,
            user_defined,
            normalizer,
            trainer_spec,
            normalizer_spec,
            extensions: ModelExtensions::default(),
        })
    }

    /// Decode and validate a model from wire bytes.
    ///
    /// Extension fields (tags ``>= 200``) are kept and re-emitted by
    /// [`Model::to_bytes`].
    pub fn from_bytes(buf: &[u8]) -> UPResult<Self> {
        let proto = ModelProto::from_bytes(buf)?;
        let mut model = Self::from_proto(&proto)?;
        model.extensions = ModelExtensions::scan(buf)?;
        Ok(model)
    }

    /// Rebuild the [`ModelProto`].
    pub fn to_proto(&self) -> ModelProto {
        ModelProto {
            pieces: self.pieces.iter().map(Into::into).collect(),
            trainer_spec: Some(self.trainer_spec.clone()),
            normalizer_spec: Some(self.normalizer_spec.clone()),
        }
    }

    /// Serialize, including any captured extension fields.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.extensions.encode_model(&self.to_proto())
    }

    /// The number of pieces.
    pub fn vocab_size(&self) -> usize {
        self.pieces.len()
    }

    /// The pieces, in id order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Look up a piece by id.
    pub fn piece(
        &self,
        id: u32,
    ) -> Option<&Piece> {
        self.pieces.get(id as usize)
    }

    /// Look up a piece id; unknown strings map to ``None``.
    pub fn piece_to_id(
        &self,
        piece: &str,
    ) -> Option<u32> {
        self.piece_index.get(piece).copied()
    }

    /// Look up a piece id; unknown strings map to the UNKNOWN id.
    pub fn piece_to_id_or_unk(
        &self,
        piece: &str,
    ) -> u32 {
        self.piece_to_id(piece).unwrap_or(self.unk_id)
    }

    /// Look up a piece string.
    pub fn id_to_piece(
        &self,
        id: u32,
    ) -> Option<&str> {
        self.piece(id).map(|p| p.text.as_str())
    }

    /// The piece score; ``None`` for out of range ids.
    pub fn score(
        &self,
        id: u32,
    ) -> Option<f32> {
        self.piece(id).map(|p| p.score)
    }

    /// The segmentation algorithm.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The UNKNOWN piece id.
    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    /// The begin-of-sentence CONTROL piece id, if present.
    pub fn bos_id(&self) -> Option<u32> {
        self.bos_id
    }

    /// The end-of-sentence CONTROL piece id, if present.
    pub fn eos_id(&self) -> Option<u32> {
        self.eos_id
    }

    /// The padding CONTROL piece id, if present.
    pub fn pad_id(&self) -> Option<u32> {
        self.pad_id
    }

    /// The smallest NORMAL piece score.
    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// The largest NORMAL piece score.
    pub fn max_score(&self) -> f32 {
        self.max_score
    }

    /// The decoded surface of the UNKNOWN piece.
    pub fn unk_surface(&self) -> &str {
        self.trainer_spec.unk_surface_or_default()
    }

    /// The trie over NORMAL and USER_DEFINED pieces.
    pub fn prefix_matcher(&self) -> &PrefixMatcher {
        &self.prefix_matcher
    }

    /// The compiled normalizer.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// The training configuration recorded in the model.
    pub fn trainer_spec(&self) -> &TrainerSpec {
        &self.trainer_spec
    }

    /// The normalization configuration recorded in the model.
    pub fn normalizer_spec(&self) -> &NormalizerSpec {
        &self.normalizer_spec
    }

    /// Extension fields captured at load.
    pub fn extensions(&self) -> &ModelExtensions {
        &self.extensions
    }

    /// Split normalized text on USER_DEFINED pieces.
    ///
    /// Matches are leftmost-longest; the remaining text is returned as
    /// [`SpanRef::Normal`] spans.
    pub fn split_user_defined<'a>(
        &self,
        text: &'a str,
    ) -> Vec<SpanRef<'a>> {
        let Some(matcher) = &self.user_defined else {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![SpanRef::Normal { offset: 0, text }];
        };

        let mut spans = Vec::new();
        let mut pos = 0;
        for mat in matcher.automaton.find_iter(text) {
            if mat.start() > pos {
                spans.push(SpanRef::Normal {
                    offset: pos,
                    text: &text[pos..mat.start()],
                });
            }
            spans.push(SpanRef::UserDefined {
                offset: mat.start(),
                text: &text[mat.start()..mat.end()],
                id: matcher.ids[mat.pattern().as_usize()],
            });
            pos = mat.end();
        }
        if pos < text.len() {
            spans.push(SpanRef::Normal {
                offset: pos,
                text: &text[pos..],
            });
        }
        spans
    }
}

fn build_user_defined_matcher(pieces: &[Piece]) -> UPResult<Option<UserDefinedMatcher>> {
    let (patterns, ids): (Vec<&str>, Vec<u32>) = pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_user_defined())
        .map(|(id, p)| (p.text.as_str(), id as u32))
        .unzip();

    if patterns.is_empty() {
        return Ok(None);
    }

    let automaton = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&patterns)
        .map_err(|e| UnipieceError::VocabConflict(e.to_string()))?;

    Ok(Some(UserDefinedMatcher { automaton, ids }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::testing::{hello_world_proto, sample_model_proto},
        proto::SentencePiece,
        types::{check_is_send, check_is_sync},
    };

    #[test]
    fn test_from_proto() {
        let model = Model::from_proto(&hello_world_proto()).unwrap();
        check_is_send(&model);
        check_is_sync(&model);

        assert_eq!(model.model_type(), ModelType::Unigram);
        assert_eq!(model.vocab_size(), 6);
        assert_eq!(model.unk_id(), 0);
        assert_eq!(model.bos_id(), Some(1));
        assert_eq!(model.eos_id(), Some(2));
        assert_eq!(model.pad_id(), None);
        assert_eq!(model.piece_to_id("▁hello"), Some(3));
        assert_eq!(model.piece_to_id("nope"), None);
        assert_eq!(model.piece_to_id_or_unk("nope"), 0);
        assert_eq!(model.id_to_piece(4), Some("▁world"));
        assert_eq!(model.id_to_piece(40), None);
        assert_eq!(model.min_score(), -3.0);
        assert_eq!(model.max_score(), -1.0);
        assert_eq!(model.unk_surface(), " \u{2047} ");

        // CONTROL and UNKNOWN pieces are not in the trie.
        assert_eq!(model.prefix_matcher().get("<s>"), None);
        assert_eq!(model.prefix_matcher().get("<unk>"), None);
        assert_eq!(model.prefix_matcher().get("▁"), Some(5));
    }

    #[test]
    fn test_validation() {
        let empty = ModelProto::default();
        assert!(matches!(
            Model::from_proto(&empty),
            Err(UnipieceError::VocabConflict(_))
        ));

        let mut proto = hello_world_proto();
        proto
            .pieces
            .push(SentencePiece::new("▁hello", -5.0, PieceType::Normal));
        assert!(matches!(
            Model::from_proto(&proto),
            Err(UnipieceError::VocabConflict(_))
        ));

        let mut proto = hello_world_proto();
        proto.pieces[0].set_type(PieceType::Normal);
        assert!(matches!(
            Model::from_proto(&proto),
            Err(UnipieceError::VocabConflict(_))
        ));

        let mut proto = hello_world_proto();
        proto
            .pieces
            .push(SentencePiece::new("<unk2>", 0.0, PieceType::Unknown));
        assert!(Model::from_proto(&proto).is_err());

        let mut proto = hello_world_proto();
        proto.pieces.push(SentencePiece::new("", 0.0, PieceType::Normal));
        assert!(Model::from_proto(&proto).is_err());
    }

    #[test]
    fn test_split_user_defined() {
        let model = Model::from_proto(&sample_model_proto()).unwrap();
        let spans = model.split_user_defined("▁a<sep>b<sep><sep>");
        assert_eq!(
            spans,
            vec![
                SpanRef::Normal {
                    offset: 0,
                    text: "▁a"
                },
                SpanRef::UserDefined {
                    offset: 4,
                    text: "<sep>",
                    id: 3
                },
                SpanRef::Normal {
                    offset: 9,
                    text: "b"
                },
                SpanRef::UserDefined {
                    offset: 10,
                    text: "<sep>",
                    id: 3
                },
                SpanRef::UserDefined {
                    offset: 15,
                    text: "<sep>",
                    id: 3
                },
            ]
        );
        assert!(model.split_user_defined("").is_empty());
    }

    #[test]
    fn test_bytes_round_trip() {
        let model = Model::from_proto(&sample_model_proto()).unwrap();
        let bytes = model.to_bytes();
        let loaded = Model::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.to_proto(), model.to_proto());
        assert!(loaded.extensions().is_empty());
        assert_eq!(loaded.to_bytes(), bytes);
    }
}
