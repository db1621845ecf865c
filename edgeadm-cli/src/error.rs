//! CLI error type and exit codes.

use edgeadm::{ConfigError, InstallerError};
use thiserror::Error;

/// Exit code for ordinary failures.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when the host platform itself is unsupported.
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Installer(#[from] InstallerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Installer(e) if e.is_fatal() => EXIT_FATAL,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_package_manager_is_fatal() {
        let err = CliError::from(InstallerError::UnsupportedPackageManager);
        assert_eq!(err.exit_code(), EXIT_FATAL);
    }

    #[test]
    fn test_other_errors_exit_one() {
        let err = CliError::from(InstallerError::ServiceNotInstalled("edgecore".into()));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(CliError::Config("bad".into()).exit_code(), EXIT_FAILURE);
    }
}
