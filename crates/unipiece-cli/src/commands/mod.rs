use crate::commands::{
    decode::DecodeArgs,
    encode::EncodeArgs,
    export_vocab::ExportVocabArgs,
    train::TrainArgs,
};

pub mod decode;
pub mod encode;
pub mod export_vocab;
pub mod train;

/// Subcommands for unipiece.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Train a model from corpus files.
    Train(TrainArgs),

    /// Encode text lines into ids or pieces.
    Encode(EncodeArgs),

    /// Decode id lines back into text.
    Decode(DecodeArgs),

    /// Write a model's ``piece\tscore`` vocabulary.
    ExportVocab(ExportVocabArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Train(cmd) => cmd.run(),
            Commands::Encode(cmd) => cmd.run(),
            Commands::Decode(cmd) => cmd.run(),
            Commands::ExportVocab(cmd) => cmd.run(),
        }
    }
}
