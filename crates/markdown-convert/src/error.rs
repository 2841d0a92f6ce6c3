use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("expected at most 2 positional arguments, got {0}")]
    TooManyArguments(usize),

    #[error("error reading template {path}: {source}")]
    Template { path: PathBuf, source: io::Error },

    #[error("invalid input pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("error reading from {path}: {source}")]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("error reading from stdin: {0}")]
    ReadStdin(#[source] io::Error),

    #[error("error creating {path}: {source}")]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("error writing output to {target}: {source}")]
    WriteOutput { target: String, source: io::Error },
}

impl ConvertError {
    /// Usage errors are reported together with the usage text.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::TooManyArguments(_))
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
