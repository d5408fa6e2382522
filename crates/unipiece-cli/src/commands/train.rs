use unipiece::{
    io::{save_model_path, save_vocab_tsv_path},
    proto::{ModelType, NormalizerSpec, TrainerSpec},
};
use unipiece_training::{InputFormat, Trainer};

use crate::LogArgs;

/// Model types for the train command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelTypeArg {
    /// Unigram language model.
    Unigram,

    /// Byte-pair encoding over characters.
    Bpe,

    /// Whole whitespace-delimited words.
    Word,

    /// Single characters.
    Char,
}

impl From<ModelTypeArg> for ModelType {
    fn from(arg: ModelTypeArg) -> Self {
        match arg {
            ModelTypeArg::Unigram => ModelType::Unigram,
            ModelTypeArg::Bpe => ModelType::Bpe,
            ModelTypeArg::Word => ModelType::Word,
            ModelTypeArg::Char => ModelType::Char,
        }
    }
}

/// Args for the train command.
#[derive(clap::Args, Debug)]
pub struct TrainArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Corpus files.
    #[arg(long, num_args = 1.., required = true)]
    input: Vec<String>,

    /// Corpus line layout: text, tsv (``sentence\tfreq``) or bilingual.
    #[arg(long, default_value_t = InputFormat::Text)]
    input_format: InputFormat,

    /// Output prefix; writes ``{prefix}.model`` and ``{prefix}.vocab``.
    #[arg(long)]
    model_prefix: String,

    #[arg(long, value_enum, default_value = "unigram")]
    model_type: ModelTypeArg,

    #[arg(long, default_value = "8000")]
    vocab_size: i32,

    #[arg(long, default_value = "0.9995")]
    character_coverage: f32,

    /// Max sentences sampled from the corpus; 0 keeps all.
    #[arg(long, default_value = "0")]
    input_sentence_size: u64,

    #[arg(long, default_value = "1000000")]
    seed_sentencepiece_size: i32,

    #[arg(long, default_value = "0.75")]
    shrinking_factor: f32,

    #[arg(long, default_value = "2")]
    num_sub_iterations: i32,

    #[arg(long, default_value = "16")]
    num_threads: i32,

    #[arg(long, default_value = "16")]
    max_sentencepiece_length: i32,

    #[arg(long, value_delimiter = ',')]
    control_symbols: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    user_defined_symbols: Vec<String>,

    /// Fail unless exactly ``vocab_size`` pieces are produced.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    hard_vocab_limit: bool,

    /// Keep every WORD/CHAR piece, ignoring ``vocab_size``.
    #[arg(long)]
    use_all_vocab: bool,

    #[arg(long, default_value = "0")]
    random_seed: u64,

    /// Prepend the whitespace marker to every sentence.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    add_dummy_prefix: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    remove_extra_whitespaces: bool,

    /// ``source\ttarget`` codepoint rewrite rules.
    #[arg(long)]
    normalization_rule_tsv: Option<String>,
}

impl TrainArgs {
    fn specs(&self) -> Result<(TrainerSpec, NormalizerSpec), Box<dyn std::error::Error>> {
        let mut trainer_spec = TrainerSpec {
            input: self.input.clone(),
            model_prefix: Some(self.model_prefix.clone()),
            vocab_size: Some(self.vocab_size),
            input_format: Some(self.input_format.to_string()),
            character_coverage: Some(self.character_coverage),
            input_sentence_size: Some(self.input_sentence_size),
            seed_sentencepiece_size: Some(self.seed_sentencepiece_size),
            shrinking_factor: Some(self.shrinking_factor),
            num_sub_iterations: Some(self.num_sub_iterations),
            num_threads: Some(self.num_threads),
            max_sentencepiece_length: Some(self.max_sentencepiece_length),
            control_symbols: self.control_symbols.clone(),
            user_defined_symbols: self.user_defined_symbols.clone(),
            hard_vocab_limit: Some(self.hard_vocab_limit),
            use_all_vocab: Some(self.use_all_vocab),
            random_seed: Some(self.random_seed),
            ..Default::default()
        };
        trainer_spec.set_model_type(self.model_type.into());

        let normalization_rule_tsv = match &self.normalization_rule_tsv {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };
        let normalizer_spec = NormalizerSpec {
            add_dummy_prefix: Some(self.add_dummy_prefix),
            remove_extra_whitespaces: Some(self.remove_extra_whitespaces),
            normalization_rule_tsv,
            ..Default::default()
        };

        Ok((trainer_spec, normalizer_spec))
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let (trainer_spec, normalizer_spec) = self.specs()?;
        let model = Trainer::new(trainer_spec, normalizer_spec)?.train_from_files()?;
        log::info!("Vocabulary Size: {}", model.vocab_size());

        let model_path = format!("{}.model", self.model_prefix);
        let vocab_path = format!("{}.vocab", self.model_prefix);
        save_model_path(&model, &model_path)?;
        save_vocab_tsv_path(&model, &vocab_path)?;
        log::info!("wrote {model_path} and {vocab_path}");

        Ok(())
    }
}
