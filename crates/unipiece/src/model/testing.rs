//! # Test Models

use crate::proto::{ModelProto, ModelType, NormalizerSpec, PieceType, SentencePiece, TrainerSpec};

fn with_meta_pieces(normal: &[(&str, f32, PieceType)]) -> Vec<SentencePiece> {
    let mut pieces = vec![
        SentencePiece::new("<unk>", 0.0, PieceType::Unknown),
        SentencePiece::new("<s>", 0.0, PieceType::Control),
        SentencePiece::new("</s>", 0.0, PieceType::Control),
    ];
    pieces.extend(
        normal
            .iter()
            .map(|&(piece, score, kind)| SentencePiece::new(piece, score, kind)),
    );
    pieces
}

/// Build a model proto from meta pieces plus the given pieces.
///
/// ## Arguments
/// * `model_type` - The segmentation algorithm.
/// * `normalizer_spec` - The normalization config.
/// * `pieces` - ``(piece, score, type)`` entries, ids starting at 3.
pub fn build_model_proto(
    model_type: ModelType,
    normalizer_spec: NormalizerSpec,
    pieces: &[(&str, f32, PieceType)],
) -> ModelProto {
    let mut trainer_spec = TrainerSpec::default();
    trainer_spec.set_model_type(model_type);
    trainer_spec.vocab_size = Some(pieces.len() as i32 + 3);

    ModelProto {
        pieces: with_meta_pieces(pieces),
        trainer_spec: Some(trainer_spec),
        normalizer_spec: Some(normalizer_spec),
    }
}

/// ``{▁hello: -1.0, ▁world: -1.2, ▁: -3.0}``, ids 3, 4, 5.
pub fn hello_world_proto() -> ModelProto {
    build_model_proto(
        ModelType::Unigram,
        NormalizerSpec::default(),
        &[
            ("▁hello", -1.0, PieceType::Normal),
            ("▁world", -1.2, PieceType::Normal),
            ("▁", -3.0, PieceType::Normal),
        ],
    )
}

/// A small UNIGRAM model with a ``<sep>`` USER_DEFINED piece at id 3.
pub fn sample_model_proto() -> ModelProto {
    build_model_proto(
        ModelType::Unigram,
        NormalizerSpec::default(),
        &[
            ("<sep>", 0.0, PieceType::UserDefined),
            ("▁", -2.0, PieceType::Normal),
            ("a", -3.0, PieceType::Normal),
            ("b", -3.0, PieceType::Normal),
            ("c", -3.5, PieceType::Normal),
            ("▁a", -2.5, PieceType::Normal),
            ("ab", -2.8, PieceType::Normal),
            ("▁ab", -4.0, PieceType::Normal),
            ("bc", -3.0, PieceType::Normal),
        ],
    )
}
