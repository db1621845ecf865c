//! Release artifact naming and URL resolution.
//!
//! Every published release ships one archive per architecture plus a
//! sidecar file holding its SHA-512 digest:
//!
//! ```text
//! {base}/v1.14.0/kubeedge-v1.14.0-linux-amd64.tar.gz
//! {base}/v1.14.0/checksum_kubeedge-v1.14.0-linux-amd64.tar.gz.txt
//! ```
//!
//! Unit files and CRDs are not part of the archive; they are fetched from
//! the `release-{major}.{minor}` branch of the source repository.

use semver::Version;
use tracing::debug;

use crate::config::InstallerConfig;
use crate::download::HttpFetcher;
use crate::error::InstallerResult;
use crate::types::{parse_version, ComponentType};

/// One versioned release archive for one architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    /// Release version.
    pub version: Version,
    /// Architecture suffix (`amd64`, `arm64`, `arm`).
    pub arch: String,
}

impl ReleaseArtifact {
    /// Create an artifact descriptor.
    pub fn new(version: Version, arch: impl Into<String>) -> Self {
        Self {
            version,
            arch: arch.into(),
        }
    }

    /// Directory the archive unpacks into.
    pub fn dir_name(&self) -> String {
        format!("kubeedge-v{}-linux-{}", self.version, self.arch)
    }

    /// Archive file name.
    pub fn file_name(&self) -> String {
        format!("{}.tar.gz", self.dir_name())
    }

    /// Sidecar checksum file name.
    pub fn checksum_file_name(&self) -> String {
        format!("checksum_{}.txt", self.file_name())
    }

    /// Download URL of the archive.
    pub fn url(&self, config: &InstallerConfig) -> String {
        format!(
            "{}/v{}/{}",
            config.download_url,
            self.version,
            self.file_name()
        )
    }

    /// Download URL of the sidecar checksum file.
    pub fn checksum_url(&self, config: &InstallerConfig) -> String {
        format!(
            "{}/v{}/{}",
            config.download_url,
            self.version,
            self.checksum_file_name()
        )
    }
}

/// `major.minor` branch suffix for a version.
pub fn release_branch(version: &Version) -> String {
    format!("{}.{}", version.major, version.minor)
}

/// Branch to fetch the unit file from.
///
/// A requested version newer than the latest published release has no
/// release branch yet, so the latest release's branch is used instead.
pub fn service_file_branch(requested: &Version, latest: Option<&Version>) -> String {
    match latest {
        Some(latest) if requested > latest => {
            debug!(
                requested = %requested,
                latest = %latest,
                "Requested version is newer than latest release, using latest branch"
            );
            release_branch(latest)
        }
        _ => release_branch(requested),
    }
}

/// URL of the systemd unit file for a component on a release branch.
pub fn service_file_url(config: &InstallerConfig, branch: &str, component: ComponentType) -> String {
    format!(
        "{}/release-{}/build/tools/{}",
        config.raw_content_url,
        branch,
        component.service_file_name()
    )
}

/// Query the latest published release.
pub fn latest_version(
    fetcher: &dyn HttpFetcher,
    config: &InstallerConfig,
) -> InstallerResult<Version> {
    let body = fetcher.fetch_text(&config.latest_version_url)?;
    parse_version(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_artifact_names_for_1_14_amd64() {
        let artifact = ReleaseArtifact::new(Version::new(1, 14, 0), "amd64");
        assert_eq!(artifact.file_name(), "kubeedge-v1.14.0-linux-amd64.tar.gz");
        assert_eq!(
            artifact.checksum_file_name(),
            "checksum_kubeedge-v1.14.0-linux-amd64.tar.gz.txt"
        );
        assert_eq!(artifact.dir_name(), "kubeedge-v1.14.0-linux-amd64");
    }

    #[test]
    fn test_artifact_urls() {
        let config = InstallerConfig::default();
        let artifact = ReleaseArtifact::new(Version::new(1, 14, 0), "arm64");
        assert_eq!(
            artifact.url(&config),
            "https://github.com/kubeedge/kubeedge/releases/download/v1.14.0/kubeedge-v1.14.0-linux-arm64.tar.gz"
        );
        assert_eq!(
            artifact.checksum_url(&config),
            "https://github.com/kubeedge/kubeedge/releases/download/v1.14.0/checksum_kubeedge-v1.14.0-linux-arm64.tar.gz.txt"
        );
    }

    #[test]
    fn test_service_file_url_uses_requested_branch() {
        let config = InstallerConfig::default();
        let branch = service_file_branch(&Version::new(1, 13, 2), Some(&Version::new(1, 14, 0)));
        assert_eq!(branch, "1.13");
        assert_eq!(
            service_file_url(&config, &branch, ComponentType::EdgeCore),
            "https://raw.githubusercontent.com/kubeedge/kubeedge/release-1.13/build/tools/edgecore.service"
        );
    }

    #[test]
    fn test_service_file_branch_falls_back_to_latest() {
        let branch = service_file_branch(&Version::new(1, 16, 0), Some(&Version::new(1, 15, 1)));
        assert_eq!(branch, "1.15");
    }

    #[test]
    fn test_service_file_branch_without_latest() {
        assert_eq!(service_file_branch(&Version::new(1, 16, 0), None), "1.16");
    }

    proptest! {
        #[test]
        fn artifact_names_share_one_stem(major in 0u64..10, minor in 0u64..40, patch in 0u64..20,
                                         arch in prop::sample::select(vec!["amd64", "arm64", "arm"])) {
            let artifact = ReleaseArtifact::new(Version::new(major, minor, patch), arch);
            let stem = artifact.dir_name();
            prop_assert_eq!(artifact.file_name(), format!("{}.tar.gz", stem));
            prop_assert!(artifact.checksum_file_name().starts_with("checksum_"));
            prop_assert!(artifact.checksum_file_name().contains(&stem));
        }

        #[test]
        fn service_branch_never_exceeds_latest(req_minor in 0u64..40, latest_minor in 0u64..40) {
            let requested = Version::new(1, req_minor, 0);
            let latest = Version::new(1, latest_minor, 3);
            let branch = service_file_branch(&requested, Some(&latest));
            let expected_minor = if requested > latest { latest_minor } else { req_minor };
            prop_assert_eq!(branch, format!("1.{}", expected_minor));
        }
    }
}
