use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    sync::Arc,
};

use unipiece::{Tokenizer, TokenizerOptions, io::load_model_path};

fn squash_standard_io(path: &Option<String>) -> Option<String> {
    match path {
        Some(p) if p == "-" => None,
        Some(p) => Some(p.clone()),
        None => None,
    }
}

/// Input argument group.
#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Optional input file; "-" may be used to indicate stdin.
    #[clap(long, default_value = None)]
    pub input: Option<String>,
}

impl InputArgs {
    /// Open a reader for the input.
    pub fn open_reader(&self) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
        Ok(match squash_standard_io(&self.input) {
            None => Box::new(BufReader::new(std::io::stdin().lock())),
            Some(p) => Box::new(BufReader::new(File::open(p)?)),
        })
    }
}

/// Output argument group.
#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Optional output file; "-" may be used to indicate stdout.
    #[clap(long, default_value = None)]
    pub output: Option<String>,
}

impl OutputArgs {
    /// Open a writer for the output.
    pub fn open_writer(&self) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
        Ok(match squash_standard_io(&self.output) {
            Some(p) => Box::new(BufWriter::new(File::create(p)?)),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        })
    }
}

/// Model file arg group.
#[derive(clap::Args, Debug)]
pub struct ModelArgs {
    /// Model file to load.
    #[arg(long)]
    pub model: String,

    /// Encode and decode batches in parallel.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub parallel: bool,
}

impl ModelArgs {
    /// Load the tokenizer.
    pub fn load_tokenizer(&self) -> Result<Tokenizer, Box<dyn std::error::Error>> {
        log::info!("model: {}", self.model);
        let model = Arc::new(load_model_path(&self.model)?);
        Ok(Tokenizer::new(
            model,
            TokenizerOptions::default().with_parallel(self.parallel),
        ))
    }
}
