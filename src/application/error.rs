//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("record at line {line}: {source}")]
    Build {
        line: u64,
        #[source]
        source: DomainError,
    },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("unknown country: {0}")]
    UnknownCountry(String),

    #[error("data file not found: {0}")]
    DataFileNotFound(PathBuf),

    #[error("no data file configured (pass --data or set data_file)")]
    NoDataFile,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Whether the failure is caused by the dataset contents.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            ApplicationError::MalformedRecord { .. } | ApplicationError::Build { .. } => true,
            ApplicationError::Domain(e) => e.is_malformed_input(),
            _ => false,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
