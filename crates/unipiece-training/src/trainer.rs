//! # Trainer Driver
//!
//! Sampling, normalization, alphabet selection, per-model-type training,
//! and final model assembly. Any failure aborts the whole run.

use compact_str::CompactString;
use rand::{SeedableRng, rngs::StdRng};
use unipiece::{
    errors::{UPResult, UnipieceError},
    model::Model,
    normalizer::Normalizer,
    proto::{ModelProto, ModelType, NormalizerSpec, PieceType, SentencePiece, TrainerSpec},
    types::UPHashMap,
};

use crate::{
    alphabet::Alphabet,
    bpe_trainer::BpeTrainerOptions,
    char_trainer::train_chars,
    config::TrainerConfig,
    corpus::read_corpus_lines,
    sampler::{CorpusSampler, RawSentence, bounded_subset},
    seed_miner::SeedPieceMiner,
    trainer_options::TrainerOptions,
    training_types::{ScoredPiece, Sentence, sort_by_score},
    unigram_trainer::UnigramTrainer,
    word_trainer::train_words,
};

/// Split ``text`` around USER_DEFINED symbols (leftmost-longest).
///
/// ## Returns
/// The non-empty fragments between symbol occurrences.
pub fn split_on_symbols<'a>(
    text: &'a str,
    symbols: &[String],
) -> Vec<&'a str> {
    if symbols.is_empty() {
        return vec![text];
    }

    let mut fragments = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        let matched = symbols
            .iter()
            .filter(|s| rest.starts_with(s.as_str()))
            .map(|s| s.len())
            .max();
        match matched {
            Some(len) => {
                if pos > start {
                    fragments.push(&text[start..pos]);
                }
                pos += len;
                start = pos;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    if start < text.len() {
        fragments.push(&text[start..]);
    }
    fragments
}

/// Trains a [`Model`] from a corpus.
#[derive(Debug, Clone)]
pub struct Trainer {
    trainer_spec: TrainerSpec,
    normalizer_spec: NormalizerSpec,
    config: TrainerConfig,
    normalizer: Normalizer,
    options: TrainerOptions,
}

impl Trainer {
    /// Validate a configuration and build a trainer.
    ///
    /// ## Arguments
    /// * `trainer_spec` - The training configuration.
    /// * `normalizer_spec` - The normalization rules.
    ///
    /// ## Returns
    /// The trainer, or [`UnipieceError::Config`] before any corpus is read.
    pub fn new(
        trainer_spec: TrainerSpec,
        normalizer_spec: NormalizerSpec,
    ) -> UPResult<Self> {
        let config = TrainerConfig::from_spec(&trainer_spec, &normalizer_spec)?;
        let normalizer = Normalizer::new(&normalizer_spec)?;
        Ok(Self {
            trainer_spec,
            normalizer_spec,
            config,
            normalizer,
            options: TrainerOptions::default(),
        })
    }

    /// Replace the runtime options.
    pub fn with_options(
        self,
        options: TrainerOptions,
    ) -> Self {
        Self {
            normalizer: self.normalizer.with_options(options.normalizer),
            options,
            ..self
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// The runtime options.
    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    /// Train on corpus lines.
    ///
    /// ## Arguments
    /// * `lines` - Raw corpus lines, laid out per ``input_format``.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn train<I, L>(
        &self,
        lines: I,
    ) -> UPResult<Model>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let proto = self.train_proto(lines.into_iter().map(Ok))?;
        Model::from_proto(&proto)
    }

    /// Train on the files listed in ``trainer_spec.input``.
    pub fn train_from_files(&self) -> UPResult<Model> {
        if self.trainer_spec.input.is_empty() {
            return Err(UnipieceError::config("no input files"));
        }
        let proto = self.train_proto(read_corpus_lines(&self.trainer_spec.input))?;
        Model::from_proto(&proto)
    }

    /// Train on fallible corpus lines, returning the model message.
    pub fn train_proto<I, L>(
        &self,
        lines: I,
    ) -> UPResult<ModelProto>
    where
        I: IntoIterator<Item = UPResult<L>>,
        L: AsRef<[u8]>,
    {
        let config = &self.config;

        let mut sampler = CorpusSampler::new(
            config.input_format,
            config.max_sentence_length,
            config.input_sentence_size,
            config.shuffle_input_sentence,
            config.random_seed,
        );
        for line in lines {
            sampler.push_line(line?.as_ref())?;
        }
        let (raw, stats) = sampler.finish();
        log::info!(
            "sampled {} sentences (seen {}, too long {}, empty {})",
            stats.kept,
            stats.seen,
            stats.too_long,
            stats.empty
        );

        let mut sentences = self.normalize(raw)?;
        if sentences.is_empty() {
            return Err(UnipieceError::config("the corpus has no usable sentences"));
        }

        let alphabet = Alphabet::from_sentences(&sentences, config.character_coverage);
        self.check_coverage(&alphabet)?;
        alphabet.rewrite_sentences(&mut sentences);

        let mut normals = self.train_normal_pieces(&sentences, &alphabet)?;
        normals.retain(|p| !config.is_reserved(&p.text));
        sort_by_score(&mut normals);

        let target = config.normal_target();
        let open_ended = config.use_all_vocab && matches!(config.model_type, ModelType::Word | ModelType::Char);
        if !open_ended {
            normals.truncate(target);
        }
        if normals.len() < target && config.hard_vocab_limit && !open_ended {
            return Err(UnipieceError::config(format!(
                "only {} pieces could be trained; vocab_size {} needs {}; set hard_vocab_limit = false to accept a smaller vocabulary",
                normals.len(),
                config.vocab_size,
                target
            )));
        }

        self.assemble(normals)
    }

    /// Normalize, drop empties, merge duplicates, and split out USER_DEFINED symbols.
    fn normalize(
        &self,
        raw: Vec<RawSentence>,
    ) -> UPResult<Vec<Sentence>> {
        let mut merged: UPHashMap<String, u64> = UPHashMap::default();
        let mut invalid = 0usize;
        for sentence in raw {
            let normalized = self.normalizer.normalize_bytes(&sentence.bytes)?;
            invalid += normalized.invalid_count;
            for fragment in split_on_symbols(&normalized.text, &self.config.user_defined_symbols) {
                *merged.entry(fragment.to_string()).or_default() += sentence.freq;
            }
        }
        if invalid > 0 {
            log::warn!("replaced {invalid} invalid UTF-8 sequences in the corpus");
        }

        let mut sentences: Vec<Sentence> = merged
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .map(|(text, freq)| Sentence::new(text, freq))
            .collect();
        sentences.sort_by(|a, b| a.text.cmp(&b.text));
        log::info!("{} distinct normalized sentences", sentences.len());
        Ok(sentences)
    }

    fn check_coverage(
        &self,
        alphabet: &Alphabet,
    ) -> UPResult<()> {
        let config = &self.config;
        if config.model_type == ModelType::Word {
            return Ok(());
        }
        if config.model_type == ModelType::Char && config.use_all_vocab {
            return Ok(());
        }

        let required = alphabet.len() + config.reserved_count();
        if config.hard_vocab_limit && required > config.vocab_size {
            return Err(UnipieceError::Coverage {
                required,
                available: config.vocab_size,
            });
        }
        if config.model_type == ModelType::Unigram && alphabet.len() > config.seed_sentencepiece_size {
            return Err(UnipieceError::Coverage {
                required: alphabet.len(),
                available: config.seed_sentencepiece_size,
            });
        }
        Ok(())
    }

    fn train_normal_pieces(
        &self,
        sentences: &[Sentence],
        alphabet: &Alphabet,
    ) -> UPResult<Vec<ScoredPiece>> {
        let config = &self.config;
        let target = config.normal_target();
        log::info!("training {:?} model: {} NORMAL pieces", config.model_type, target);

        Ok(match config.model_type {
            ModelType::Unigram => {
                let mut rng = StdRng::seed_from_u64(config.random_seed);
                let mining = bounded_subset(sentences, config.mining_sentence_size, &mut rng);
                let training = bounded_subset(sentences, config.training_sentence_size, &mut rng);

                let mut seeds = SeedPieceMiner::new(config.validator, config.seed_sentencepiece_size)
                    .mine(&mining, alphabet);
                seeds.retain(|p| !config.is_reserved(&p.text));

                UnigramTrainer::new(config, &self.options)?
                    .train(seeds, alphabet, &training)
                    .pieces
            }
            ModelType::Bpe => {
                let mut trainer = BpeTrainerOptions::new(target, config.validator)
                    .init::<CompactString, u64>();
                trainer.update_from_sentences(sentences);
                trainer.train(alphabet)
            }
            ModelType::Word => train_words(
                sentences,
                target,
                config.max_sentencepiece_length,
                config.use_all_vocab,
            ),
            ModelType::Char => train_chars(alphabet, target, config.use_all_vocab),
        })
    }

    /// Lay out meta, CONTROL, USER_DEFINED and NORMAL pieces by id.
    fn assemble(
        &self,
        normals: Vec<ScoredPiece>,
    ) -> UPResult<ModelProto> {
        let config = &self.config;
        let total = config.reserved_count() + normals.len();

        let mut slots: Vec<Option<SentencePiece>> = vec![None; total];
        for meta in &config.meta_pieces {
            let Some(slot) = slots.get_mut(meta.id) else {
                return Err(UnipieceError::config(format!(
                    "meta piece {:?} id {} is outside the trained vocabulary of {}",
                    meta.text, meta.id, total
                )));
            };
            *slot = Some(SentencePiece::new(meta.text.clone(), 0.0, meta.kind));
        }

        let fill = config
            .control_symbols
            .iter()
            .map(|s| SentencePiece::new(s.clone(), 0.0, PieceType::Control))
            .chain(
                config
                    .user_defined_symbols
                    .iter()
                    .map(|s| SentencePiece::new(s.clone(), 0.0, PieceType::UserDefined)),
            )
            .chain(
                normals
                    .into_iter()
                    .map(|p| SentencePiece::new(p.text, p.score, PieceType::Normal)),
            );
        let mut free = slots.iter_mut().filter(|s| s.is_none());
        for piece in fill {
            if let Some(slot) = free.next() {
                *slot = Some(piece);
            }
        }

        let pieces: Vec<SentencePiece> = slots.into_iter().flatten().collect();
        log::info!("assembled model with {} pieces", pieces.len());
        Ok(ModelProto {
            pieces,
            trainer_spec: Some(self.trainer_spec.clone()),
            normalizer_spec: Some(self.normalizer_spec.clone()),
        })
    }
}
