use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffCovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{what}: file does not exist ({})", path.display())]
    InputNotFound { what: &'static str, path: PathBuf },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid root dir used against code coverage file: '{key}' is not under '{}'", root.display())]
    Integrity { key: String, root: PathBuf },

    #[error("Malformed coverage report: {0}")]
    MalformedReport(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DiffCovError>;
