use std::io;
use std::path::PathBuf;

use readme_extract::MarkerError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    OutOfDate = 1,
    InvalidArguments = 2,
    Source = 3,
    Output = 4,
    Config = 5,
}

#[derive(Debug, Error)]
pub enum GenError {
    #[error("failed to read source {}: {source}", path.display())]
    Source { path: PathBuf, source: io::Error },

    #[error("failed to write output {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },

    #[error("invalid marker: {0}")]
    InvalidMarker(#[from] MarkerError),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl GenError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Source { .. } => ExitCode::Source,
            Self::Output { .. } => ExitCode::Output,
            Self::InvalidMarker(_) | Self::InvalidArguments(_) => ExitCode::InvalidArguments,
        }
    }
}

pub type GenResult<T> = Result<T, GenError>;
