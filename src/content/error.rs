//! Extraction error types.

use thiserror::Error;

/// Reasons a primary document could not be extracted from raw bytes.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file name carries neither the plain nor the container suffix.
    #[error("Unsupported file kind: {0}")]
    UnsupportedKind(String),

    /// Bytes claim to be a container but are not a readable archive, and
    /// do not look like a markup document either.
    #[error("Not a valid workbook container: {0}")]
    NotAContainer(#[source] zip::result::ZipError),

    /// The container holds no entry with a document extension.
    #[error("Container has no workbook or XML entry")]
    NoDocumentEntry,

    /// Reading an entry from a valid container failed.
    #[error("Container entry could not be read: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error while decompressing an entry.
    #[error("I/O error while reading container entry: {0}")]
    Io(#[from] std::io::Error),
}
