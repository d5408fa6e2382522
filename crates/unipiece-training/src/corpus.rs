//! # Corpus Files
//!
//! Line-oriented readers over one or more corpus files. Lines are raw
//! bytes; decoding is the normalizer's job.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use unipiece::errors::UPResult;

/// An iterator over the lines of several files, in order.
///
/// Yields each line without its ``\n`` terminator.
pub struct CorpusLines {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<Box<dyn BufRead + Send>>,
    buf: Vec<u8>,
}

impl CorpusLines {
    /// Read lines from an already opened source.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self {
            paths: Vec::new().into_iter(),
            current: Some(Box::new(reader)),
            buf: Vec::new(),
        }
    }
}

impl Iterator for CorpusLines {
    type Item = UPResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.paths.next()?;
                log::info!("reading corpus file {}", path.display());
                match File::open(&path) {
                    Ok(file) => self.current = Some(Box::new(BufReader::new(file))),
                    Err(err) => return Some(Err(err.into())),
                }
            }
            let Some(reader) = self.current.as_mut() else {
                continue;
            };

            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.current = None,
                Ok(_) => {
                    if self.buf.last() == Some(&b'\n') {
                        self.buf.pop();
                    }
                    return Some(Ok(self.buf.clone()));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// Read corpus files line by line.
///
/// ## Arguments
/// * `paths` - The corpus files, read in order.
///
/// ## Returns
/// A lazy line iterator; open and read errors surface as items.
pub fn read_corpus_lines<P: AsRef<Path>>(paths: &[P]) -> CorpusLines {
    CorpusLines {
        paths: paths
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect::<Vec<_>>()
            .into_iter(),
        current: None,
        buf: Vec::new(),
    }
}
