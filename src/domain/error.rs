//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors are either malformed input or violated preconditions.
/// A month that a country never reported is not an error; queries yield 0 for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("operation requires a non-empty tree")]
    EmptyTree,

    #[error("invalid month key '{key}': {reason}")]
    InvalidMonthKey { key: String, reason: String },

    #[error("unknown metric view: {0}")]
    UnknownMetric(String),

    #[error("malformed date '{value}': expected YYYY-MM-DD")]
    MalformedDate { value: String },

    #[error("records for country '{country}' are not contiguous")]
    NonContiguousCountry { country: String },

    #[error("malformed tree at offset {offset}: {reason}")]
    MalformedTree { offset: usize, reason: String },
}

impl DomainError {
    /// Whether the error stems from the input data rather than from the caller.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DomainError::MalformedDate { .. }
                | DomainError::NonContiguousCountry { .. }
                | DomainError::MalformedTree { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
