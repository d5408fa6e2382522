//! # Model Wire Messages
//!
//! proto2 messages, field-compatible with the sentencepiece model schema.
//!
//! Optional scalars carry their proto2 defaults; use the generated accessors
//! (``spec.vocab_size()``) rather than the raw ``Option`` fields.

use prost::{Message, bytes::BufMut};

use crate::errors::UPResult;

/// The segmentation algorithm a model was trained for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ModelType {
    /// Unigram language model with Viterbi segmentation.
    Unigram = 1,
    /// Byte-pair-style merges over characters.
    Bpe = 2,
    /// Whitespace-delimited words.
    Word = 3,
    /// One piece per character.
    Char = 4,
}

/// The role of a piece in the vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PieceType {
    /// A statistically mined piece.
    Normal = 1,
    /// The single unknown piece.
    Unknown = 2,
    /// A reserved piece; never produced by segmentation.
    Control = 3,
    /// An always-atomic, maximal-priority piece.
    UserDefined = 4,
}

/// Training configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrainerSpec {
    /// Input corpus files.
    #[prost(string, repeated, tag = "1")]
    pub input: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// Output model file prefix.
    #[prost(string, optional, tag = "2")]
    pub model_prefix: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(enumeration = "ModelType", optional, tag = "3", default = "Unigram")]
    pub model_type: ::core::option::Option<i32>,
    /// Target vocabulary size, including meta pieces.
    #[prost(int32, optional, tag = "4", default = "8000")]
    pub vocab_size: ::core::option::Option<i32>,
    /// Corpus line format: ``text``, ``tsv`` or ``bilingual``.
    #[prost(string, optional, tag = "7")]
    pub input_format: ::core::option::Option<::prost::alloc::string::String>,
    /// Fraction of corpus characters kept in the alphabet.
    #[prost(float, optional, tag = "10", default = "0.9995")]
    pub character_coverage: ::core::option::Option<f32>,
    /// Max sentences loaded from the corpus; 0 is unbounded.
    #[prost(uint64, optional, tag = "11", default = "0")]
    pub input_sentence_size: ::core::option::Option<u64>,
    /// Max sentences used for seed mining; 0 is unbounded.
    #[prost(int32, optional, tag = "12", default = "0")]
    pub mining_sentence_size: ::core::option::Option<i32>,
    /// Max sentences used for EM training; 0 is unbounded.
    #[prost(int32, optional, tag = "13", default = "0")]
    pub training_sentence_size: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "14", default = "1000000")]
    pub seed_sentencepiece_size: ::core::option::Option<i32>,
    #[prost(float, optional, tag = "15", default = "0.75")]
    pub shrinking_factor: ::core::option::Option<f32>,
    #[prost(int32, optional, tag = "16", default = "16")]
    pub num_threads: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "17", default = "2")]
    pub num_sub_iterations: ::core::option::Option<i32>,
    /// Max sentence length in bytes; longer lines are skipped.
    #[prost(int32, optional, tag = "18", default = "4192")]
    pub max_sentence_length: ::core::option::Option<i32>,
    #[prost(bool, optional, tag = "19", default = "true")]
    pub shuffle_input_sentence: ::core::option::Option<bool>,
    /// Max piece length in characters.
    #[prost(int32, optional, tag = "20", default = "16")]
    pub max_sentencepiece_length: ::core::option::Option<i32>,
    #[prost(bool, optional, tag = "21", default = "true")]
    pub split_by_unicode_script: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "22", default = "true")]
    pub split_by_whitespace: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "23", default = "true")]
    pub split_by_number: ::core::option::Option<bool>,
    #[prost(string, repeated, tag = "30")]
    pub control_symbols: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "31")]
    pub user_defined_symbols: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// Fail when the corpus cannot produce ``vocab_size`` pieces.
    #[prost(bool, optional, tag = "33", default = "true")]
    pub hard_vocab_limit: ::core::option::Option<bool>,
    /// WORD / CHAR: keep every observed piece regardless of ``vocab_size``.
    #[prost(bool, optional, tag = "34", default = "false")]
    pub use_all_vocab: ::core::option::Option<bool>,
    #[prost(int32, optional, tag = "40", default = "0")]
    pub unk_id: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "41", default = "1")]
    pub bos_id: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "42", default = "2")]
    pub eos_id: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "43", default = "-1")]
    pub pad_id: ::core::option::Option<i32>,
    /// Decoded surface of the unknown piece; defaults to [`DEFAULT_UNK_SURFACE`].
    #[prost(string, optional, tag = "44")]
    pub unk_surface: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "45", default = "<unk>")]
    pub unk_piece: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "46", default = "<s>")]
    pub bos_piece: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "47", default = "</s>")]
    pub eos_piece: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "48", default = "<pad>")]
    pub pad_piece: ::core::option::Option<::prost::alloc::string::String>,
    /// Seed for corpus sampling.
    #[prost(uint64, optional, tag = "60", default = "0")]
    pub random_seed: ::core::option::Option<u64>,
}

/// The default decoded surface of the unknown piece.
pub const DEFAULT_UNK_SURFACE: &str = " \u{2047} ";

impl TrainerSpec {
    /// The decoded surface of the unknown piece.
    pub fn unk_surface_or_default(&self) -> &str {
        self.unk_surface.as_deref().unwrap_or(DEFAULT_UNK_SURFACE)
    }
}

/// Text normalization configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NormalizerSpec {
    /// Name of the rule set.
    #[prost(string, optional, tag = "1")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    /// Compiled rewrite table; see [`crate::normalizer::CharsMap`].
    #[prost(bytes = "vec", optional, tag = "2")]
    pub precompiled_charsmap: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(bool, optional, tag = "3", default = "true")]
    pub add_dummy_prefix: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "4", default = "true")]
    pub remove_extra_whitespaces: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "5", default = "true")]
    pub escape_whitespaces: ::core::option::Option<bool>,
    /// Source rule table; compiled when ``precompiled_charsmap`` is empty.
    #[prost(string, optional, tag = "6")]
    pub normalization_rule_tsv: ::core::option::Option<::prost::alloc::string::String>,
}

/// One scored vocabulary entry.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SentencePiece {
    #[prost(string, optional, tag = "1")]
    pub piece: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(float, optional, tag = "2")]
    pub score: ::core::option::Option<f32>,
    #[prost(enumeration = "PieceType", optional, tag = "3", default = "Normal")]
    pub r#type: ::core::option::Option<i32>,
}

impl SentencePiece {
    /// Build a piece entry.
    pub fn new<S: Into<String>>(
        piece: S,
        score: f32,
        kind: PieceType,
    ) -> Self {
        Self {
            piece: Some(piece.into()),
            score: Some(score),
            r#type: Some(kind as i32),
        }
    }
}

/// The serialized model.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelProto {
    /// Pieces; the position is the piece id.
    #[prost(message, repeated, tag = "1")]
    pub pieces: ::prost::alloc::vec::Vec<SentencePiece>,
    #[prost(message, optional, tag = "2")]
    pub trainer_spec: ::core::option::Option<TrainerSpec>,
    #[prost(message, optional, tag = "3")]
    pub normalizer_spec: ::core::option::Option<NormalizerSpec>,
}

impl ModelProto {
    /// Decode a model from wire bytes; unknown fields are ignored.
    pub fn from_bytes(buf: &[u8]) -> UPResult<Self> {
        Ok(Self::decode(buf)?)
    }

    /// Encode the model to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Encode the model into a caller-provided buffer.
    ///
    /// ## Returns
    /// [`crate::errors::UnipieceError::ProtoEncode`] when ``buf`` lacks capacity.
    pub fn write_to<B: BufMut>(
        &self,
        buf: &mut B,
    ) -> UPResult<()> {
        Ok(self.encode(buf)?)
    }
}
