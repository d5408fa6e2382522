use std::io::{BufRead, Write};

use unipiece::UnipieceError;

use crate::{
    LogArgs,
    input_output::{InputArgs, ModelArgs, OutputArgs},
};

/// Args for the decode command.
#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl DecodeArgs {
    /// Run the decode command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let tokenizer = self.model.load_tokenizer()?;
        let reader = self.input.open_reader()?;
        let mut writer = self.output.open_writer()?;

        for (idx, line) in reader.lines().enumerate() {
            let ids = parse_ids(&line?).map_err(|err| format!("line {}: {err}", idx + 1))?;
            writeln!(writer, "{}", tokenizer.decode(&ids)?)?;
        }
        writer.flush()?;

        Ok(())
    }
}

/// Parse space-separated piece ids.
fn parse_ids(line: &str) -> Result<Vec<u32>, UnipieceError> {
    line.split_ascii_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .map_err(|err| UnipieceError::Parse(format!("{tok:?}: {err}")))
        })
        .collect()
}
