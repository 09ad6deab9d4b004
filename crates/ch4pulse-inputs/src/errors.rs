use ch4pulse_core::errors::PulseError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading and writing experiment files.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Invalid value '{value}' in column '{column}' of {path}, line {line}")]
    InvalidValue {
        path: PathBuf,
        column: String,
        line: usize,
        value: String,
    },
    #[error("{path}: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error(transparent)]
    Pulse(#[from] PulseError),
}

/// Convenience type for `Result<T, InputError>`.
pub type InputResult<T> = Result<T, InputError>;
