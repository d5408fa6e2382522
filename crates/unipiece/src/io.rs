//! # Model IO
//!
//! Model files hold the encoded [`crate::proto::ModelProto`]; vocab files are
//! ``piece\tscore`` lines in id order.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{errors::UPResult, model::Model};

/// Load a [`Model`] from a model file.
///
/// ## Arguments
/// * `path` - path to the file.
pub fn load_model_path<P: AsRef<Path>>(path: P) -> UPResult<Model> {
    let reader = BufReader::new(File::open(path)?);
    read_model(reader)
}

/// Read a [`Model`] from a reader.
///
/// ## Arguments
/// * `reader` - the byte source; read to the end.
pub fn read_model<R: Read>(mut reader: R) -> UPResult<Model> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Model::from_bytes(&buf)
}

/// Save a [`Model`] to a model file.
///
/// ## Arguments
/// * `model` - the model to save.
/// * `path` - the path to save the model to.
pub fn save_model_path<P: AsRef<Path>>(
    model: &Model,
    path: P,
) -> UPResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_model(model, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a [`Model`] to a [`Write`] writer.
pub fn write_model<W: Write>(
    model: &Model,
    writer: &mut W,
) -> UPResult<()> {
    writer.write_all(&model.to_bytes())?;
    Ok(())
}

/// Save the vocabulary of a [`Model`] to a file.
///
/// Lines are:
/// ```terminaloutput
/// {PIECE}\t{SCORE}
/// ```
pub fn save_vocab_tsv_path<P: AsRef<Path>>(
    model: &Model,
    path: P,
) -> UPResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_vocab_tsv(model, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the vocabulary of a [`Model`] to a [`Write`] writer.
///
/// Lines are:
/// ```terminaloutput
/// {PIECE}\t{SCORE}
/// ```
pub fn write_vocab_tsv<W: Write>(
    model: &Model,
    writer: &mut W,
) -> UPResult<()> {
    for piece in model.pieces() {
        writeln!(writer, "{}\t{}", piece.text, piece.score)?;
    }
    Ok(())
}
