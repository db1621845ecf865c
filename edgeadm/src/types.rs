//! Core data types shared by the installer, service managers and inspector.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use semver::Version;
use serde::Serialize;

use crate::error::{InstallerError, InstallerResult};

/// Which of the two installable programs an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    /// The cloud-side component.
    CloudCore,
    /// The edge-side component.
    EdgeCore,
}

impl ComponentType {
    /// Process name, also used as the service name.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::CloudCore => "cloudcore",
            Self::EdgeCore => "edgecore",
        }
    }

    /// File name of the executable on this host.
    pub fn executable_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.binary_name())
        } else {
            self.binary_name().to_string()
        }
    }

    /// Name of the OS service registration.
    pub fn service_name(&self) -> &'static str {
        self.binary_name()
    }

    /// systemd unit file name.
    pub fn service_file_name(&self) -> &'static str {
        match self {
            Self::CloudCore => "cloudcore.service",
            Self::EdgeCore => "edgecore.service",
        }
    }

    /// Location of the binary inside an extracted release directory.
    pub fn binary_in_release(&self, release_dir: &Path) -> PathBuf {
        match self {
            Self::CloudCore => release_dir
                .join("cloud")
                .join("cloudcore")
                .join(self.binary_name()),
            Self::EdgeCore => release_dir.join("edge").join(self.binary_name()),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloud" | "cloudcore" => Ok(Self::CloudCore),
            "edge" | "edgecore" => Ok(Self::EdgeCore),
            other => Err(format!("unknown component {:?} (expected cloud or edge)", other)),
        }
    }
}

/// Result of a liveness check. Cloud wins when both could match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleRunning {
    CloudRunning,
    EdgeRunning,
    NoneRunning,
}

impl fmt::Display for ModuleRunning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CloudRunning => "cloudcore is running",
            Self::EdgeRunning => "edgecore is running",
            Self::NoneRunning => "no KubeEdge component is running",
        };
        f.write_str(s)
    }
}

/// Inputs for a single install run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Component to install.
    pub component: ComponentType,
    /// Release to install.
    pub version: Version,
    /// Where release archives are stored. `None` means the platform base path.
    pub tarball_dir: Option<PathBuf>,
}

impl InstallOptions {
    /// Create options for the given component and version.
    pub fn new(component: ComponentType, version: Version) -> Self {
        Self {
            component,
            version,
            tarball_dir: None,
        }
    }

    /// Store archives in a custom directory.
    pub fn with_tarball_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tarball_dir = Some(dir.into());
        self
    }
}

/// Inputs for teardown decisions.
#[derive(Debug, Clone)]
pub struct ResetOptions {
    /// kubeconfig used to look for a containerized cloudcore.
    pub kubeconfig: PathBuf,
}

/// Parse a release version, accepting an optional leading `v`.
pub fn parse_version(input: &str) -> InstallerResult<Version> {
    let trimmed = input.trim();
    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).map_err(|e| {
        InstallerError::InvalidVersion {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Yes/no confirmation supplied by the caller.
pub trait Confirm {
    /// Ask the question and return the answer.
    fn confirm(&self, prompt: &str) -> InstallerResult<bool>;
}

/// Answers every question with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> InstallerResult<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_names() {
        assert_eq!(ComponentType::CloudCore.binary_name(), "cloudcore");
        assert_eq!(ComponentType::EdgeCore.service_name(), "edgecore");
        assert_eq!(
            ComponentType::CloudCore.service_file_name(),
            "cloudcore.service"
        );
        assert_eq!(ComponentType::EdgeCore.service_file_name(), "edgecore.service");
    }

    #[test]
    fn test_binary_in_release() {
        let dir = Path::new("/tmp/kubeedge-v1.14.0-linux-amd64");
        assert_eq!(
            ComponentType::CloudCore.binary_in_release(dir),
            dir.join("cloud/cloudcore/cloudcore")
        );
        assert_eq!(
            ComponentType::EdgeCore.binary_in_release(dir),
            dir.join("edge/edgecore")
        );
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!("cloud".parse::<ComponentType>(), Ok(ComponentType::CloudCore));
        assert_eq!("EdgeCore".parse::<ComponentType>(), Ok(ComponentType::EdgeCore));
        assert!("router".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_parse_version_strips_prefix() {
        assert_eq!(parse_version("v1.14.0").unwrap(), Version::new(1, 14, 0));
        assert_eq!(parse_version(" 1.15.2\n").unwrap(), Version::new(1, 15, 2));
    }

    #[test]
    fn test_parse_version_rejects_garbage() {
        match parse_version("latest") {
            Err(InstallerError::InvalidVersion { input, .. }) => assert_eq!(input, "latest"),
            other => panic!("Expected InvalidVersion, got {:?}", other),
        }
    }
}
