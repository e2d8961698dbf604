use std::path::PathBuf;

use thiserror::Error;

use crate::data::source::ChiKind;

/// Errors that can occur while loading a single instrument file.
///
/// Every variant is contained at the batch boundary: the offending file is
/// logged and skipped, the rest of the batch continues.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("undecodable bytes in {}", .0.display())]
    Decode(PathBuf),

    #[error("empty or missing header line in {}", .0.display())]
    EmptyHeader(PathBuf),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("unrecognized file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("missing required columns: {0}")]
    MissingColumns(String),

    #[error("{}: not {} data", path.display(), expected)]
    NotOfKind { expected: ChiKind, path: PathBuf },

    #[error("no experiment timestamp in {}", .0.display())]
    TimestampUnavailable(PathBuf),

    #[error("no BioLogic .mpr reader installed; cannot read {}", .0.display())]
    MprReaderUnavailable(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for file-loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
