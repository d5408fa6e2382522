//! # Trainer Configuration
//!
//! [`TrainerConfig`] is the validated, resolved view of a [`TrainerSpec`].
//! Every check here runs before any corpus line is read.

use unipiece::{
    errors::{UPResult, UnipieceError},
    normalizer::META_SPACE_STR,
    proto::{ModelType, NormalizerSpec, PieceType, TrainerSpec},
    types::UPHashSet,
};

use crate::{piece_validity::PieceValidator, sampler::InputFormat};

/// A reserved piece with a fixed id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPiece {
    /// The configured id.
    pub id: usize,

    /// The piece text.
    pub text: String,

    /// UNKNOWN or CONTROL.
    pub kind: PieceType,
}

/// A validated trainer configuration.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// The model type to train.
    pub model_type: ModelType,

    /// The target vocabulary size, meta pieces included.
    pub vocab_size: usize,

    /// How corpus lines are parsed.
    pub input_format: InputFormat,

    /// Fraction of character mass the alphabet must cover.
    pub character_coverage: f64,

    /// Sampled sentence cap; 0 keeps all.
    pub input_sentence_size: usize,

    /// Shuffle (reservoir-sample) rather than truncate.
    pub shuffle_input_sentence: bool,

    /// Sentence cap for seed mining; 0 keeps all.
    pub mining_sentence_size: usize,

    /// Sentence cap for EM training; 0 keeps all.
    pub training_sentence_size: usize,

    /// Seed vocabulary size.
    pub seed_sentencepiece_size: usize,

    /// Fraction of pieces kept per pruning round.
    pub shrinking_factor: f64,

    /// Worker threads for the E-step.
    pub num_threads: usize,

    /// EM iterations per pruning round.
    pub num_sub_iterations: usize,

    /// Longest accepted corpus line, in bytes.
    pub max_sentence_length: usize,

    /// Longest piece, in characters.
    pub max_sentencepiece_length: usize,

    /// Piece validity rules.
    pub validator: PieceValidator,

    /// CONTROL symbols, in configured order.
    pub control_symbols: Vec<String>,

    /// USER_DEFINED symbols, in configured order.
    pub user_defined_symbols: Vec<String>,

    /// Fail when fewer pieces than ``vocab_size`` can be produced.
    pub hard_vocab_limit: bool,

    /// WORD/CHAR: keep every observed piece.
    pub use_all_vocab: bool,

    /// UNKNOWN and CONTROL meta pieces, sorted by id.
    pub meta_pieces: Vec<MetaPiece>,

    /// The sampling seed.
    pub random_seed: u64,
}

fn positive(
    name: &str,
    value: i32,
) -> UPResult<usize> {
    if value <= 0 {
        return Err(UnipieceError::config(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(value as usize)
}

fn non_negative(
    name: &str,
    value: i32,
) -> UPResult<usize> {
    if value < 0 {
        return Err(UnipieceError::config(format!(
            "{name} must not be negative, got {value}"
        )));
    }
    Ok(value as usize)
}

impl TrainerConfig {
    /// Validate and resolve a trainer spec.
    ///
    /// ## Arguments
    /// * `spec` - The training configuration.
    /// * `normalizer_spec` - The normalization rules the model will carry.
    ///
    /// ## Returns
    /// The resolved configuration, or [`UnipieceError::Config`].
    pub fn from_spec(
        spec: &TrainerSpec,
        normalizer_spec: &NormalizerSpec,
    ) -> UPResult<Self> {
        let vocab_size = positive("vocab_size", spec.vocab_size())?;
        let seed_sentencepiece_size =
            positive("seed_sentencepiece_size", spec.seed_sentencepiece_size())?;
        if seed_sentencepiece_size <= vocab_size {
            return Err(UnipieceError::config(format!(
                "seed_sentencepiece_size ({seed_sentencepiece_size}) must exceed vocab_size ({vocab_size})"
            )));
        }

        let shrinking_factor = spec.shrinking_factor() as f64;
        if !(shrinking_factor > 0.0 && shrinking_factor < 1.0) {
            return Err(UnipieceError::config(format!(
                "shrinking_factor must be in (0, 1), got {shrinking_factor}"
            )));
        }

        let character_coverage = spec.character_coverage() as f64;
        if !(character_coverage > 0.0 && character_coverage <= 1.0) {
            return Err(UnipieceError::config(format!(
                "character_coverage must be in (0, 1], got {character_coverage}"
            )));
        }

        if !normalizer_spec.escape_whitespaces() {
            return Err(UnipieceError::config(
                "training requires escape_whitespaces = true",
            ));
        }

        let input_format = match spec.input_format() {
            "" => InputFormat::default(),
            name => name.parse::<InputFormat>().map_err(|_| {
                UnipieceError::config(format!("unknown input_format {name:?}"))
            })?,
        };

        let max_sentencepiece_length =
            positive("max_sentencepiece_length", spec.max_sentencepiece_length())?;

        let meta_pieces = Self::resolve_meta_pieces(spec, vocab_size)?;
        let control_symbols = spec.control_symbols.clone();
        let user_defined_symbols = spec.user_defined_symbols.clone();

        let mut reserved: UPHashSet<&str> = meta_pieces.iter().map(|m| m.text.as_str()).collect();
        for symbol in control_symbols.iter().chain(&user_defined_symbols) {
            if symbol.is_empty() {
                return Err(UnipieceError::config("control and user-defined symbols must not be empty"));
            }
            if !reserved.insert(symbol.as_str()) {
                return Err(UnipieceError::config(format!(
                    "symbol {symbol:?} is reserved more than once"
                )));
            }
        }

        let reserved_count = reserved.len();
        if reserved_count >= vocab_size {
            return Err(UnipieceError::config(format!(
                "vocab_size ({vocab_size}) leaves no room after {reserved_count} reserved pieces"
            )));
        }

        Ok(Self {
            model_type: spec.model_type(),
            vocab_size,
            input_format,
            character_coverage,
            input_sentence_size: spec.input_sentence_size() as usize,
            shuffle_input_sentence: spec.shuffle_input_sentence(),
            mining_sentence_size: non_negative("mining_sentence_size", spec.mining_sentence_size())?,
            training_sentence_size: non_negative(
                "training_sentence_size",
                spec.training_sentence_size(),
            )?,
            seed_sentencepiece_size,
            shrinking_factor,
            num_threads: positive("num_threads", spec.num_threads())?,
            num_sub_iterations: positive("num_sub_iterations", spec.num_sub_iterations())?,
            max_sentence_length: positive("max_sentence_length", spec.max_sentence_length())?,
            max_sentencepiece_length,
            validator: PieceValidator {
                max_len: max_sentencepiece_length,
                split_by_whitespace: spec.split_by_whitespace(),
                split_by_unicode_script: spec.split_by_unicode_script(),
                split_by_number: spec.split_by_number(),
            },
            control_symbols,
            user_defined_symbols,
            hard_vocab_limit: spec.hard_vocab_limit(),
            use_all_vocab: spec.use_all_vocab(),
            meta_pieces,
            random_seed: spec.random_seed(),
        })
    }

    fn resolve_meta_pieces(
        spec: &TrainerSpec,
        vocab_size: usize,
    ) -> UPResult<Vec<MetaPiece>> {
        if spec.unk_id() < 0 {
            return Err(UnipieceError::config("unk_id must not be negative"));
        }

        let candidates = [
            (spec.unk_id(), spec.unk_piece(), PieceType::Unknown),
            (spec.bos_id(), spec.bos_piece(), PieceType::Control),
            (spec.eos_id(), spec.eos_piece(), PieceType::Control),
            (spec.pad_id(), spec.pad_piece(), PieceType::Control),
        ];

        let mut ids: UPHashSet<usize> = UPHashSet::default();
        let mut texts: UPHashSet<&str> = UPHashSet::default();
        let mut meta = Vec::with_capacity(candidates.len());
        for (id, text, kind) in candidates {
            if id < 0 {
                continue;
            }
            let id = id as usize;
            if id >= vocab_size {
                return Err(UnipieceError::config(format!(
                    "meta piece {text:?} id {id} is outside vocab_size {vocab_size}"
                )));
            }
            if text.is_empty() || text.contains(META_SPACE_STR) {
                return Err(UnipieceError::config(format!(
                    "invalid meta piece {text:?}"
                )));
            }
            if !ids.insert(id) {
                return Err(UnipieceError::config(format!("meta piece id {id} is used twice")));
            }
            if !texts.insert(text) {
                return Err(UnipieceError::config(format!("meta piece {text:?} is used twice")));
            }
            meta.push(MetaPiece {
                id,
                text: text.to_string(),
                kind,
            });
        }
        meta.sort_by_key(|m| m.id);
        Ok(meta)
    }

    /// The number of reserved (meta, CONTROL, USER_DEFINED) pieces.
    pub fn reserved_count(&self) -> usize {
        self.meta_pieces.len() + self.control_symbols.len() + self.user_defined_symbols.len()
    }

    /// The number of NORMAL pieces to train.
    pub fn normal_target(&self) -> usize {
        self.vocab_size - self.reserved_count()
    }

    /// Is ``piece`` a meta, CONTROL or USER_DEFINED piece?
    pub fn is_reserved(
        &self,
        piece: &str,
    ) -> bool {
        self.meta_pieces.iter().any(|m| m.text == piece)
            || self.control_symbols.iter().any(|s| s == piece)
            || self.user_defined_symbols.iter().any(|s| s == piece)
    }
}
