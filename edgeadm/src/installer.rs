//! Component installer.
//!
//! This module orchestrates the full installation workflow:
//! 1. Prepare the tarball and base directories
//! 2. Download and verify the release archive
//! 3. Fetch the systemd unit file (systemd hosts only)
//! 4. Extract the archive
//! 5. Place the component binary in the binary directory

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{info, warn};

use crate::config::InstallerConfig;
use crate::download::{HttpFetcher, RetryDownloader};
use crate::error::{InstallerError, InstallerResult};
use crate::extract::{ArchiveExtractor, TarGzExtractor};
use crate::platform::PlatformPaths;
use crate::release::{self, ReleaseArtifact};
use crate::service::ServiceManager;
use crate::types::{ComponentType, Confirm, InstallOptions};

/// Progress callback for installation operations.
///
/// # Arguments
///
/// * `stage` - Current installation stage
/// * `message` - Human-readable message
pub type InstallProgressCallback = Box<dyn Fn(InstallStage, &str) + Send + Sync>;

/// Installation stages for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Creating directories.
    Preparing,
    /// Downloading and verifying the release archive.
    Downloading,
    /// Fetching the unit file.
    FetchingServiceFile,
    /// Extracting archive contents.
    Extracting,
    /// Copying the binary into place.
    Installing,
    /// Installation complete.
    Complete,
}

impl InstallStage {
    /// Get a human-readable name for the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Preparing => "Preparing",
            Self::Downloading => "Downloading",
            Self::FetchingServiceFile => "Fetching service file",
            Self::Extracting => "Extracting",
            Self::Installing => "Installing",
            Self::Complete => "Complete",
        }
    }
}

/// Result of a component installation.
#[derive(Debug, Clone)]
pub struct InstallResult {
    /// Installed component.
    pub component: ComponentType,
    /// Installed version.
    pub version: Version,
    /// Verified release archive.
    pub archive: PathBuf,
    /// Where the binary was placed.
    pub binary_path: PathBuf,
    /// Staged unit file, when one was fetched or already present.
    pub service_file: Option<PathBuf>,
    /// Regular files unpacked from the archive.
    pub files_extracted: usize,
}

/// Installs cloudcore or edgecore from a published release.
pub struct Installer<F: HttpFetcher> {
    paths: PlatformPaths,
    config: InstallerConfig,
    fetcher: F,
    extractor: TarGzExtractor,
}

impl<F: HttpFetcher> Installer<F> {
    /// Create a new installer.
    pub fn new(paths: PlatformPaths, config: InstallerConfig, fetcher: F) -> Self {
        Self {
            paths,
            config,
            fetcher,
            extractor: TarGzExtractor::new(),
        }
    }

    /// Host layout used by this installer.
    pub fn paths(&self) -> &PlatformPaths {
        &self.paths
    }

    /// Configuration used by this installer.
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Latest published release.
    pub fn latest_version(&self) -> InstallerResult<Version> {
        release::latest_version(&self.fetcher, &self.config)
    }

    /// Download, verify, extract and place the requested component.
    ///
    /// An existing archive that fails verification is only replaced when
    /// `confirm` agrees.
    pub fn install(
        &self,
        options: &InstallOptions,
        confirm: &dyn Confirm,
        on_progress: Option<InstallProgressCallback>,
    ) -> InstallerResult<InstallResult> {
        let report = |stage: InstallStage, message: &str| {
            if let Some(ref cb) = on_progress {
                cb(stage, message);
            }
        };
        let component = options.component;
        let version = &options.version;

        report(InstallStage::Preparing, "Creating directories");
        let tarball_dir = options
            .tarball_dir
            .clone()
            .unwrap_or_else(|| self.paths.base_dir.clone());
        create_dir(&tarball_dir)?;
        create_dir(&self.paths.base_dir)?;

        let artifact = ReleaseArtifact::new(version.clone(), self.config.arch.clone());
        report(
            InstallStage::Downloading,
            &format!("Fetching {}", artifact.file_name()),
        );
        let archive = RetryDownloader::new(&self.fetcher, &self.config).fetch_verified(
            &artifact,
            &tarball_dir,
            confirm,
        )?;

        report(InstallStage::FetchingServiceFile, component.service_file_name());
        let service_file = self.download_service_file(component, version)?;

        report(
            InstallStage::Extracting,
            &format!("Extracting {}", artifact.file_name()),
        );
        let files_extracted = self.extractor.extract(&archive, &tarball_dir)?;

        report(InstallStage::Installing, component.binary_name());
        let release_dir = tarball_dir.join(artifact.dir_name());
        let binary_path = self.place_binary(component, &release_dir)?;

        info!(
            component = %component,
            version = %version,
            binary = %binary_path.display(),
            "Component installed"
        );
        report(InstallStage::Complete, "Installation complete");

        Ok(InstallResult {
            component,
            version: version.clone(),
            archive,
            binary_path,
            service_file,
            files_extracted,
        })
    }

    /// Fetch the component's unit file into the base directory.
    ///
    /// Nothing is fetched on hosts without systemd or when the file is
    /// already staged. A requested version newer than the latest release
    /// uses the latest release's branch.
    pub fn download_service_file(
        &self,
        component: ComponentType,
        version: &Version,
    ) -> InstallerResult<Option<PathBuf>> {
        if !self.paths.has_systemd() {
            return Ok(None);
        }

        let staged = self.paths.staged_unit_file(component);
        if staged.exists() {
            info!(path = %staged.display(), "Service file already present, skipping download");
            return Ok(Some(staged));
        }

        let latest = match self.latest_version() {
            Ok(latest) => Some(latest),
            Err(e) => {
                warn!(error = %e, "Failed to query latest release");
                None
            }
        };
        let branch = release::service_file_branch(version, latest.as_ref());
        let url = release::service_file_url(&self.config, &branch, component);

        info!(url = %url, "Downloading service file");
        self.fetcher.download(&url, &staged)?;
        Ok(Some(staged))
    }

    /// Copy the binary out of an extracted release into the binary directory.
    fn place_binary(&self, component: ComponentType, release_dir: &Path) -> InstallerResult<PathBuf> {
        let src = component.binary_in_release(release_dir);
        let dest = self.paths.binary_path(component);
        create_dir(&self.paths.bin_dir)?;

        fs::copy(&src, &dest).map_err(|e| InstallerError::WriteFailed {
            path: dest.clone(),
            source: e,
        })?;
        make_executable(&dest)?;
        Ok(dest)
    }
}

/// Register and start an installed component, returning where its logs go.
pub fn run_component(
    component: ComponentType,
    paths: &PlatformPaths,
    services: &dyn ServiceManager,
) -> InstallerResult<String> {
    create_dir(&paths.log_dir)?;
    services.install(component)?;

    let hint = services.log_hint(component);
    info!(component = %component, logs = %hint, "Component is running");
    Ok(hint)
}

fn create_dir(path: &Path) -> InstallerResult<()> {
    fs::create_dir_all(path).map_err(|e| InstallerError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> InstallerResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        InstallerError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> InstallerResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::testing::FakeFetcher;
    use tempfile::TempDir;

    fn installer(temp: &TempDir, fetcher: FakeFetcher) -> Installer<FakeFetcher> {
        let config = InstallerConfig::default()
            .with_download_url("http://releases.local")
            .with_raw_content_url("http://raw.local")
            .with_latest_version_url("http://releases.local/latest")
            .with_arch("amd64");
        Installer::new(PlatformPaths::rooted(temp.path()), config, fetcher)
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(InstallStage::Downloading.name(), "Downloading");
        assert_eq!(InstallStage::Complete.name(), "Complete");
    }

    #[test]
    fn test_service_file_skipped_without_systemd() {
        let temp = TempDir::new().unwrap();
        let installer = installer(&temp, FakeFetcher::new());

        let result = installer
            .download_service_file(ComponentType::EdgeCore, &Version::new(1, 14, 0))
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_service_file_uses_latest_branch_for_unreleased_version() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new()
            .serve("http://releases.local/latest", "v1.15.1\n")
            .serve(
                "http://raw.local/release-1.15/build/tools/edgecore.service",
                "[Unit]\n",
            );
        let installer = installer(&temp, fetcher);
        fs::create_dir_all(&installer.paths().systemd_boot_dir).unwrap();
        fs::create_dir_all(&installer.paths().base_dir).unwrap();

        let staged = installer
            .download_service_file(ComponentType::EdgeCore, &Version::new(1, 16, 0))
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(staged).unwrap(), "[Unit]\n");
    }

    #[test]
    fn test_service_file_latest_lookup_failure_is_tolerated() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().serve(
            "http://raw.local/release-1.14/build/tools/cloudcore.service",
            "[Unit]\n",
        );
        let installer = installer(&temp, fetcher);
        fs::create_dir_all(&installer.paths().systemd_boot_dir).unwrap();
        fs::create_dir_all(&installer.paths().base_dir).unwrap();

        assert!(installer
            .download_service_file(ComponentType::CloudCore, &Version::new(1, 14, 2))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_latest_version() {
        let temp = TempDir::new().unwrap();
        let installer = installer(
            &temp,
            FakeFetcher::new().serve("http://releases.local/latest", "v1.15.1"),
        );
        assert_eq!(installer.latest_version().unwrap(), Version::new(1, 15, 1));
    }
}
