use std::path::{Path, PathBuf};

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the generation, analysis and report stages.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad generation or configuration arguments.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input data lacks an expected column, or a row breaks the record
    /// invariants.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The destination or source could not be read or written.
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: impl Into<BoxError>) -> Self {
        Self::IoFailure {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
