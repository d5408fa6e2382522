use std::io::{BufRead, Write};

use unipiece::Tokenizer;

use crate::{
    LogArgs,
    input_output::{InputArgs, ModelArgs, OutputArgs},
};

/// Lines encoded per batch.
const BATCH_SIZE: usize = 1024;

/// Output formats for the encode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Space-separated piece ids.
    Id,

    /// Space-separated piece strings.
    Piece,
}

/// Args for the encode command.
#[derive(clap::Args, Debug)]
pub struct EncodeArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    model: ModelArgs,

    #[arg(long, value_enum, default_value = "id")]
    output_format: OutputFormat,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl EncodeArgs {
    /// Run the encode command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let tokenizer = self.model.load_tokenizer()?;
        let reader = self.input.open_reader()?;
        let mut writer = self.output.open_writer()?;

        let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);
        for line in reader.lines() {
            batch.push(line?);
            if batch.len() == BATCH_SIZE {
                write_encoded(&tokenizer, self.output_format, &batch, &mut writer)?;
                batch.clear();
            }
        }
        write_encoded(&tokenizer, self.output_format, &batch, &mut writer)?;
        writer.flush()?;

        Ok(())
    }
}

fn write_encoded(
    tokenizer: &Tokenizer,
    format: OutputFormat,
    batch: &[String],
    writer: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Id => {
            let encoded: Vec<Vec<u32>> = tokenizer.encode_batch(batch)?;
            for ids in encoded {
                let line: Vec<String> = ids.iter().map(u32::to_string).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
        OutputFormat::Piece => {
            for text in batch {
                writeln!(writer, "{}", tokenizer.encode_as_pieces(text).join(" "))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use unipiece::{
        Model,
        proto::{ModelProto, NormalizerSpec, PieceType, SentencePiece, TrainerSpec},
    };

    use super::*;

    fn tokenizer() -> Tokenizer {
        let proto = ModelProto {
            pieces: vec![
                SentencePiece::new("<unk>", 0.0, PieceType::Unknown),
                SentencePiece::new("<s>", 0.0, PieceType::Control),
                SentencePiece::new("</s>", 0.0, PieceType::Control),
                SentencePiece::new("▁hello", -1.0, PieceType::Normal),
                SentencePiece::new("▁world", -1.2, PieceType::Normal),
                SentencePiece::new("▁", -3.0, PieceType::Normal),
            ],
            trainer_spec: Some(TrainerSpec::default()),
            normalizer_spec: Some(NormalizerSpec::default()),
        };
        Arc::new(Model::from_proto(&proto).unwrap()).into()
    }

    #[test]
    fn test_write_encoded() {
        let tok = tokenizer();
        let batch = vec!["hello world".to_string(), "world".to_string()];

        let mut out: Vec<u8> = Vec::new();
        write_encoded(&tok, OutputFormat::Id, &batch, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3 4\n4\n");

        let mut out: Vec<u8> = Vec::new();
        write_encoded(&tok, OutputFormat::Piece, &batch, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "▁hello ▁world\n▁world\n");
    }
}
