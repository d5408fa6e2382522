use std::sync::Arc;

use proptest::prelude::*;
use prost::encoding::{WireType, encode_key, encode_varint};
use unipiece::{
    Model,
    Tokenizer,
    TokenizerOptions,
    UnipieceError,
    proto::{ModelProto, ModelType, NormalizerSpec, PieceType, SentencePiece, TrainerSpec},
};

fn model_proto(
    model_type: ModelType,
    add_dummy_prefix: bool,
    pieces: &[(&str, f32)],
) -> ModelProto {
    let mut trainer_spec = TrainerSpec::default();
    trainer_spec.set_model_type(model_type);

    let mut all = vec![
        SentencePiece::new("<unk>", 0.0, PieceType::Unknown),
        SentencePiece::new("<s>", 0.0, PieceType::Control),
        SentencePiece::new("</s>", 0.0, PieceType::Control),
    ];
    all.extend(
        pieces
            .iter()
            .map(|&(p, s)| SentencePiece::new(p, s, PieceType::Normal)),
    );

    ModelProto {
        pieces: all,
        trainer_spec: Some(trainer_spec),
        normalizer_spec: Some(NormalizerSpec {
            add_dummy_prefix: Some(add_dummy_prefix),
            ..Default::default()
        }),
    }
}

fn tokenizer(proto: &ModelProto) -> Tokenizer {
    Tokenizer::new(
        Arc::new(Model::from_proto(proto).unwrap()),
        TokenizerOptions::default(),
    )
}

fn abc_unigram() -> Tokenizer {
    tokenizer(&model_proto(
        ModelType::Unigram,
        true,
        &[
            ("▁", -2.0),
            ("a", -3.0),
            ("b", -3.0),
            ("c", -3.0),
            ("▁a", -2.5),
            ("ab", -2.7),
            ("bc", -2.9),
            ("▁abc", -4.0),
        ],
    ))
}

#[test]
fn test_hello_world_scenario() {
    let tok = tokenizer(&model_proto(
        ModelType::Unigram,
        true,
        &[("▁hello", -1.0), ("▁world", -1.2), ("▁", -3.0)],
    ));
    assert_eq!(tok.encode_as_pieces("hello world"), vec!["▁hello", "▁world"]);
}

#[test]
fn test_bpe_scenario() {
    let tok = tokenizer(&model_proto(
        ModelType::Bpe,
        false,
        &[("lo", 0.0), ("low", -1.0), ("l", -2.0), ("o", -3.0), ("w", -4.0)],
    ));
    assert_eq!(tok.encode_as_pieces("low"), vec!["low"]);
    assert_eq!(tok.encode_as_pieces("owl"), vec!["o", "w", "l"]);
}

#[test]
fn test_unknown_piece_id() {
    let tok = abc_unigram();
    let size = tok.vocab_size() as u32;
    assert!(matches!(
        tok.decode(&[3u32, size]),
        Err(UnipieceError::UnknownPieceId { .. })
    ));
}

#[test]
fn test_extensions_survive_model_round_trip() {
    let proto = model_proto(ModelType::Unigram, true, &[("▁", -1.0)]);
    let mut buf = proto.to_bytes();
    encode_key(250, WireType::Varint, &mut buf);
    encode_varint(12345, &mut buf);

    let model = Model::from_bytes(&buf).unwrap();
    assert!(!model.extensions().is_empty());
    assert_eq!(model.to_bytes(), buf);
}

#[test]
fn test_model_type_dispatch_round_trip() {
    for model_type in [ModelType::Unigram, ModelType::Bpe, ModelType::Word, ModelType::Char] {
        let tok = tokenizer(&model_proto(
            model_type,
            true,
            &[("▁", -1.0), ("a", -2.0), ("b", -2.0), ("▁ab", -1.5), ("ab", -1.8)],
        ));
        let ids: Vec<u32> = tok.encode("ab ab").unwrap();
        assert_eq!(tok.decode(&ids).unwrap(), "ab ab", "{model_type:?}");
    }
}

proptest! {
    #[test]
    fn test_decode_encode_round_trip(text in "[abc]{1,6}( [abc]{1,6}){0,4}") {
        let tok = abc_unigram();
        let ids: Vec<u32> = tok.encode(&text).unwrap();
        prop_assert!(!ids.contains(&tok.unk_id()));
        prop_assert_eq!(tok.decode(&ids).unwrap(), text);
    }

    #[test]
    fn test_pieces_concat_to_normalized(text in "[abc ]{0,24}") {
        let tok = abc_unigram();
        let pieces = tok.encode_as_pieces(&text);
        prop_assert_eq!(pieces.concat(), tok.normalize(&text));
    }
}
