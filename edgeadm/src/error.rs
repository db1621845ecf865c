//! Error types for installation and service lifecycle operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::ComponentType;

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Errors that can occur while installing or supervising a component.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A host command could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A host command ran but returned an unexpected exit code.
    #[error("`{command}` failed ({}): {stderr}", describe_exit(.exit_code))]
    Execution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Downloaded artifact does not match its published digest.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// Every download attempt produced an artifact that failed verification.
    #[error("failed to download {filename}: checksum still mismatched after {attempts} attempts")]
    DownloadVerificationFailed {
        filename: String,
        attempts: u32,
        /// Mismatch seen on the last attempt.
        #[source]
        source: Box<InstallerError>,
    },

    /// HTTP transfer failed.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// HTTP transfer timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// A service with the same name is already registered.
    #[error("service {0} already exists")]
    ServiceAlreadyExists(String),

    /// The service to act on has never been registered.
    #[error("service {0} is not installed")]
    ServiceNotInstalled(String),

    /// None of apt, yum or pacman was found on the host.
    #[error("failed to detect supported package manager command (apt, yum, pacman)")]
    UnsupportedPackageManager,

    /// Failed to create a directory.
    #[error("not able to create {} folder path: {source}", .path.display())]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write, copy or remove a file.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Archive extraction failed.
    #[error("failed to extract {}: {reason}", .path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    /// A version string could not be parsed as semver.
    #[error("invalid version {input:?}: {reason}")]
    InvalidVersion { input: String, reason: String },

    /// The component cannot be managed on this host.
    #[error("{0} is not supported on this platform")]
    UnsupportedComponent(ComponentType),

    /// The interactive confirmation could not be read.
    #[error("failed to read confirmation: {0}")]
    Prompt(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Windows Service Control Manager failure.
    #[cfg(windows)]
    #[error("service control manager error: {0}")]
    Windows(#[from] windows_service::Error),
}

impl InstallerError {
    /// Whether the error leaves no way forward for the current process.
    ///
    /// Without a supported package manager none of the OS strategies can
    /// be constructed, so the caller is expected to terminate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedPackageManager)
    }

    /// Whether another download attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed { .. } | Self::Timeout { .. } | Self::ChecksumMismatch { .. }
        )
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_not_installed_names_service() {
        let err = InstallerError::ServiceNotInstalled("edgecore".to_string());
        assert_eq!(err.to_string(), "service edgecore is not installed");
    }

    #[test]
    fn test_execution_display() {
        let err = InstallerError::Execution {
            command: "systemctl start edgecore".to_string(),
            exit_code: Some(5),
            stderr: "Unit edgecore.service not found.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("systemctl start edgecore"));
        assert!(msg.contains("exit code 5"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_execution_killed_by_signal() {
        let err = InstallerError::Execution {
            command: "pidof edgecore".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_download_verification_failed_names_artifact() {
        let err = InstallerError::DownloadVerificationFailed {
            filename: "kubeedge-v1.14.0-linux-amd64.tar.gz".to_string(),
            attempts: 5,
            source: Box::new(InstallerError::ChecksumMismatch {
                filename: "kubeedge-v1.14.0-linux-amd64.tar.gz".to_string(),
                expected: "aa".to_string(),
                actual: "bb".to_string(),
            }),
        };
        assert!(err
            .to_string()
            .contains("kubeedge-v1.14.0-linux-amd64.tar.gz"));

        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(cause.contains("expected aa, got bb"));
    }

    #[test]
    fn test_transfer_and_checksum_errors_are_retryable() {
        assert!(InstallerError::DownloadFailed {
            url: "http://releases.local/a".into(),
            reason: "connection reset".into(),
        }
        .is_retryable());
        assert!(InstallerError::Timeout {
            url: "http://releases.local/a".into(),
            timeout_secs: 300,
        }
        .is_retryable());
        assert!(!InstallerError::HttpClient("tls".into()).is_retryable());
        assert!(!InstallerError::ServiceNotInstalled("edgecore".into()).is_retryable());
    }

    #[test]
    fn test_only_package_manager_detection_is_fatal() {
        assert!(InstallerError::UnsupportedPackageManager.is_fatal());
        assert!(!InstallerError::ServiceAlreadyExists("edgecore".into()).is_fatal());
    }
}
