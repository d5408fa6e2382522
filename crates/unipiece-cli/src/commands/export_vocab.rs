use std::io::Write;

use unipiece::io::write_vocab_tsv;

use crate::{
    LogArgs,
    input_output::{ModelArgs, OutputArgs},
};

/// Args for the export-vocab command.
#[derive(clap::Args, Debug)]
pub struct ExportVocabArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl ExportVocabArgs {
    /// Run the export-vocab command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let tokenizer = self.model.load_tokenizer()?;
        let mut writer = self.output.open_writer()?;
        write_vocab_tsv(tokenizer.model(), &mut writer)?;
        writer.flush()?;

        Ok(())
    }
}
