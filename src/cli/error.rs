//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Application(e) if e.is_malformed_input() => crate::exitcode::DATAERR,
            CliError::Application(e) => match e {
                ApplicationError::Domain(_)
                | ApplicationError::UnknownRegion(_)
                | ApplicationError::UnknownCountry(_) => crate::exitcode::USAGE,
                ApplicationError::DataFileNotFound(_) | ApplicationError::NoDataFile => {
                    crate::exitcode::NOINPUT
                }
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                ApplicationError::MalformedRecord { .. } | ApplicationError::Build { .. } => {
                    crate::exitcode::DATAERR
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;

    #[test]
    fn test_exit_codes() {
        let bad_month: CliError = DomainError::InvalidMonthKey {
            key: "Smarch 2021".into(),
            reason: "unknown month".into(),
        }
        .into();
        assert_eq!(bad_month.exit_code(), exitcode::USAGE);

        let bad_date: CliError = DomainError::MalformedDate {
            value: "2021-13-01".into(),
        }
        .into();
        assert_eq!(bad_date.exit_code(), exitcode::DATAERR);

        let missing = CliError::from(ApplicationError::NoDataFile);
        assert_eq!(missing.exit_code(), exitcode::NOINPUT);

        let config = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(config.exit_code(), exitcode::CONFIG);

        let args = CliError::InvalidArgs("--from March 2021 is after --to January 2021".into());
        assert_eq!(args.exit_code(), exitcode::USAGE);
    }
}
