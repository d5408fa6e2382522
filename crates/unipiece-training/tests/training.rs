use std::{fs, sync::Arc};

use tempdir::TempDir;
use unipiece::{
    Model,
    Tokenizer,
    UnipieceError,
    proto::{ModelType, NormalizerSpec, PieceType, TrainerSpec},
};
use unipiece_training::{Trainer, TrainerOptions};

const WORDS: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "pack", "my", "box", "with",
    "five", "dozen", "liquor", "jugs",
];

fn corpus() -> Vec<String> {
    (0..300)
        .map(|i| {
            [
                WORDS[i % 16],
                WORDS[(i / 16) % 16],
                WORDS[(i * 7 + 3) % 16],
                WORDS[(i * 11 + i / 16) % 16],
            ]
            .join(" ")
        })
        .collect()
}

// The corpus yields 27 characters and 26 mined multi-character seeds, so
// UNIGRAM vocabularies stay below 53 NORMAL pieces.
fn spec(
    model_type: ModelType,
    vocab_size: i32,
) -> TrainerSpec {
    let mut spec = TrainerSpec {
        vocab_size: Some(vocab_size),
        character_coverage: Some(1.0),
        num_threads: Some(2),
        ..Default::default()
    };
    spec.set_model_type(model_type);
    spec
}

fn train(spec: TrainerSpec) -> Model {
    Trainer::new(spec, NormalizerSpec::default())
        .unwrap()
        .with_options(TrainerOptions::default().with_objective_tolerance(1e-5))
        .train(corpus())
        .unwrap()
}

fn assert_round_trip(model: Model) {
    let tok: Tokenizer = Arc::new(model).into();
    for line in corpus().iter().take(20) {
        let ids: Vec<u32> = tok.encode(line).unwrap();
        assert!(!ids.contains(&tok.unk_id()), "{line:?} -> {ids:?}");
        assert_eq!(&tok.decode(&ids).unwrap(), line);
    }
}

#[test]
fn test_unigram() {
    let model = train(spec(ModelType::Unigram, 48));
    assert_eq!(model.vocab_size(), 48);
    assert_eq!(model.model_type(), ModelType::Unigram);

    let normal: Vec<f32> = model
        .pieces()
        .iter()
        .filter(|p| p.kind == PieceType::Normal)
        .map(|p| p.score)
        .collect();
    assert!(normal.windows(2).all(|w| w[0] >= w[1]));
    assert!(normal.iter().all(|&s| s <= 0.0));

    assert_round_trip(model);
}

#[test]
fn test_bpe() {
    let model = train(spec(ModelType::Bpe, 60));
    assert_eq!(model.vocab_size(), 60);
    assert_round_trip(model);
}

#[test]
fn test_word() {
    // 16 words plus the meta pieces.
    let model = train(spec(ModelType::Word, 19));
    assert_eq!(model.vocab_size(), 19);
    assert!(model.piece_to_id("▁liquor").is_some());
    assert_round_trip(model);
}

#[test]
fn test_char() {
    // 26 letters, the whitespace marker, and the meta pieces.
    let model = train(spec(ModelType::Char, 30));
    assert_eq!(model.vocab_size(), 30);
    assert_round_trip(model);
}

#[test]
fn test_reserved_pieces() {
    let mut spec = spec(ModelType::Unigram, 50);
    spec.control_symbols = vec!["<cls>".to_string()];
    spec.user_defined_symbols = vec!["<sep>".to_string()];
    let model = train(spec);
    assert_eq!(model.vocab_size(), 50);

    // Meta pieces keep their ids; reserved symbols fill the next free slots.
    assert_eq!(model.unk_id(), 0);
    assert_eq!(model.bos_id(), Some(1));
    assert_eq!(model.eos_id(), Some(2));

    let cls = model.piece_to_id("<cls>").unwrap();
    let sep = model.piece_to_id("<sep>").unwrap();
    assert_eq!((cls, sep), (3, 4));
    assert_eq!(model.piece(cls).unwrap().kind, PieceType::Control);
    assert_eq!(model.piece(sep).unwrap().kind, PieceType::UserDefined);

    let tok: Tokenizer = Arc::new(model).into();
    let ids: Vec<u32> = tok.encode("the fox<sep>dog").unwrap();
    assert!(ids.contains(&sep));
    assert_eq!(tok.decode(&ids).unwrap(), "the fox<sep>dog");
}

#[test]
fn test_deterministic() {
    let a = train(spec(ModelType::Unigram, 48));
    let b = train(spec(ModelType::Unigram, 48));
    assert_eq!(a.pieces(), b.pieces());
}

#[test]
fn test_coverage_error() {
    let err = Trainer::new(spec(ModelType::Unigram, 20), NormalizerSpec::default())
        .unwrap()
        .train(corpus())
        .unwrap_err();
    assert!(matches!(
        err,
        UnipieceError::Coverage {
            required: 30,
            available: 20
        }
    ));
}

#[test]
fn test_config_error() {
    let spec = TrainerSpec {
        vocab_size: Some(100),
        seed_sentencepiece_size: Some(50),
        ..Default::default()
    };
    let err = Trainer::new(spec, NormalizerSpec::default()).unwrap_err();
    assert!(err.is_training_error());
    assert!(matches!(err, UnipieceError::Config(_)));
}

#[test]
fn test_unigram_shortfall() {
    let err = Trainer::new(spec(ModelType::Unigram, 60), NormalizerSpec::default())
        .unwrap()
        .train(corpus())
        .unwrap_err();
    assert!(matches!(err, UnipieceError::Config(_)), "{err:?}");
}

#[test]
fn test_soft_vocab_limit() {
    let mut spec = spec(ModelType::Word, 40);
    let err = Trainer::new(spec.clone(), NormalizerSpec::default())
        .unwrap()
        .train(corpus())
        .unwrap_err();
    assert!(matches!(err, UnipieceError::Config(_)));

    spec.hard_vocab_limit = Some(false);
    let model = train(spec);
    assert_eq!(model.vocab_size(), 19);
}

#[test]
fn test_train_from_files() {
    let dir = TempDir::new("unipiece_training").unwrap();
    let path = dir.path().join("corpus.txt");
    fs::write(&path, corpus().join("\n")).unwrap();

    let mut spec = spec(ModelType::Bpe, 60);
    spec.input = vec![path.to_string_lossy().to_string()];
    let model = Trainer::new(spec, NormalizerSpec::default())
        .unwrap()
        .train_from_files()
        .unwrap();
    assert_eq!(model.vocab_size(), 60);
}
