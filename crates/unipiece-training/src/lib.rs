//! # `unipiece` Training
//!
//! Trains UNIGRAM, BPE, WORD and CHAR models for the ``unipiece`` runtime.
//!
//! See:
//! * [`trainer`] for the end-to-end driver.
//! * [`sampler`] and [`corpus`] for corpus intake.
//! * [`alphabet`] for character coverage.
//! * [`seed_miner`] and [`unigram_trainer`] for UNIGRAM EM.
//! * [`bpe_trainer`], [`word_trainer`] and [`char_trainer`] for the other model types.
//!
//! ```rust,ignore
//! use unipiece::proto::{ModelType, NormalizerSpec, TrainerSpec};
//! use unipiece_training::Trainer;
//!
//! let mut spec = TrainerSpec {
//!     vocab_size: Some(8000),
//!     input: vec!["corpus.txt".to_string()],
//!     ..Default::default()
//! };
//! spec.set_model_type(ModelType::Unigram);
//!
//! let model = Trainer::new(spec, NormalizerSpec::default())?.train_from_files()?;
//! ```
#![warn(missing_docs, unused)]

pub mod alphabet;
pub mod bpe_trainer;
pub mod char_trainer;
pub mod config;
pub mod corpus;
pub mod piece_table;
pub mod piece_validity;
pub mod sampler;
pub mod seed_miner;
pub mod suffix_array;
pub mod trainer;
pub mod trainer_options;
pub mod training_types;
pub mod unigram_trainer;
pub mod utility;
pub mod word_trainer;

#[doc(inline)]
pub use config::TrainerConfig;
#[doc(inline)]
pub use sampler::InputFormat;
#[doc(inline)]
pub use trainer::Trainer;
#[doc(inline)]
pub use trainer_options::TrainerOptions;
#[doc(inline)]
pub use training_types::{ScoredPiece, Sentence};
