use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::models::Document;

/// Failure to bring the data file into memory. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, or a record that doesn't match the schema.
    #[error("invalid data file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to rewrite the data file after a mutation.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load both collections from `path`. No partial loads: any bad record
/// rejects the whole file.
pub fn load(path: &Path) -> Result<Document, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document: Document =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        path = %path.display(),
        tickets = document.tickets.len(),
        messages = document.messages.len(),
        "data file loaded"
    );
    Ok(document)
}

/// Overwrite `path` with the full document.
///
/// The file is truncated before writing, so an error partway through leaves
/// it incomplete and the next `load` will refuse it.
pub fn save(path: &Path, document: &Document) -> Result<(), SaveError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;

    info!(
        path = %path.display(),
        tickets = document.tickets.len(),
        messages = document.messages.len(),
        "data file saved"
    );
    Ok(())
}
