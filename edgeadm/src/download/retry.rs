//! Download-verify-retry loop for release archives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::checksum::verify_checksum;
use super::http::HttpFetcher;
use crate::config::{InstallerConfig, RETRY_TIMES};
use crate::error::{InstallerError, InstallerResult};
use crate::release::ReleaseArtifact;
use crate::types::Confirm;

/// Fetches a release archive and guarantees it matches its published digest.
///
/// Transfer failures, timeouts and checksum mismatches each consume one of
/// the `RETRY_TIMES` attempts. There is no backoff between attempts.
pub struct RetryDownloader<'a> {
    fetcher: &'a dyn HttpFetcher,
    config: &'a InstallerConfig,
}

impl<'a> RetryDownloader<'a> {
    pub fn new(fetcher: &'a dyn HttpFetcher, config: &'a InstallerConfig) -> Self {
        Self { fetcher, config }
    }

    /// Make sure a verified copy of `artifact` is present in `tarball_dir`.
    ///
    /// An existing archive that cannot be verified, whether it mismatches or
    /// the digest is unreachable, is only replaced when `confirm` agrees;
    /// otherwise it is used as-is with a warning.
    pub fn fetch_verified(
        &self,
        artifact: &ReleaseArtifact,
        tarball_dir: &Path,
        confirm: &dyn Confirm,
    ) -> InstallerResult<PathBuf> {
        let archive = tarball_dir.join(artifact.file_name());

        if !archive.exists() {
            return self.retry_download(artifact, tarball_dir);
        }

        let sidecar = tarball_dir.join(artifact.checksum_file_name());
        match verify_checksum(&archive, &sidecar, &artifact.checksum_url(self.config), self.fetcher) {
            Ok(()) => {
                info!(file = %archive.display(), "Release archive already present and verified");
                return Ok(archive);
            }
            Err(e) => warn!(
                file = %archive.display(),
                error = %e,
                "Existing release archive could not be verified"
            ),
        }

        let prompt = format!(
            "{} could not be verified against the published digest. Delete it and download again?",
            archive.display()
        );
        if confirm.confirm(&prompt)? {
            discard(&archive)?;
            self.retry_download(artifact, tarball_dir)
        } else {
            warn!(
                file = %archive.display(),
                "Using release archive that failed checksum verification"
            );
            Ok(archive)
        }
    }

    /// Download and verify, discarding the archive and trying again after
    /// any retryable failure.
    ///
    /// When the budget runs out on a mismatch the result is
    /// `DownloadVerificationFailed`; otherwise the last transfer error is
    /// returned.
    pub fn retry_download(
        &self,
        artifact: &ReleaseArtifact,
        tarball_dir: &Path,
    ) -> InstallerResult<PathBuf> {
        let archive = tarball_dir.join(artifact.file_name());
        let sidecar = tarball_dir.join(artifact.checksum_file_name());
        let url = artifact.url(self.config);
        let checksum_url = artifact.checksum_url(self.config);

        let mut attempt = 1;
        loop {
            info!(
                url = %url,
                attempt,
                max_attempts = RETRY_TIMES,
                "Downloading release archive"
            );
            let outcome = self
                .fetcher
                .download(&url, &archive)
                .and_then(|_| verify_checksum(&archive, &sidecar, &checksum_url, self.fetcher));

            let error = match outcome {
                Ok(()) => {
                    info!(file = %archive.display(), "Release archive downloaded and verified");
                    return Ok(archive);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            warn!(
                file = %archive.display(),
                attempt,
                error = %error,
                "Download attempt failed, deleting archive"
            );
            discard(&archive)?;

            if attempt >= RETRY_TIMES {
                return Err(exhausted(artifact, error));
            }
            attempt += 1;
        }
    }
}

fn exhausted(artifact: &ReleaseArtifact, last: InstallerError) -> InstallerError {
    match last {
        InstallerError::ChecksumMismatch { .. } => InstallerError::DownloadVerificationFailed {
            filename: artifact.file_name(),
            attempts: RETRY_TIMES,
            source: Box::new(last),
        },
        other => other,
    }
}

/// Remove the archive if a previous step left one behind.
fn discard(path: &Path) -> InstallerResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallerError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
