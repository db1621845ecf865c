//! SHA-512 verification of release archives.
//!
//! Each archive is published with a sidecar file holding its hex digest.
//! The sidecar is looked up next to the archive first; when absent it is
//! fetched from the release URL and kept for subsequent checks.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use super::http::HttpFetcher;
use crate::error::{InstallerError, InstallerResult};

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculate the SHA-512 digest of a file as lowercase hex.
pub fn calculate_sha512(path: &Path) -> InstallerResult<String> {
    let mut file = File::open(path).map_err(|e| InstallerError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| InstallerError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Reduce sidecar content to a bare lowercase digest.
///
/// Accepts both a bare digest and the `sha512sum` layout
/// (`<digest>  <filename>`).
pub fn normalize_digest(content: &str) -> String {
    content
        .replace(['\r', '\n'], " ")
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Length of a hex-encoded SHA-512 digest.
const SHA512_HEX_LEN: usize = 128;

/// Whether `digest` is a lowercase hex SHA-512 digest.
pub fn is_sha512_hex(digest: &str) -> bool {
    digest.len() == SHA512_HEX_LEN
        && digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Expected digest for an archive.
///
/// Reads `checksum_file` when it holds a digest; otherwise fetches
/// `remote_url` and keeps the digest in `checksum_file`. A remote body that
/// is not a digest is a `DownloadFailed` and is never written.
pub fn expected_checksum(
    checksum_file: &Path,
    remote_url: &str,
    fetcher: &dyn HttpFetcher,
) -> InstallerResult<String> {
    if checksum_file.exists() {
        let content = fs::read_to_string(checksum_file).map_err(|e| InstallerError::ReadFailed {
            path: checksum_file.to_path_buf(),
            source: e,
        })?;
        let digest = normalize_digest(&content);
        if is_sha512_hex(&digest) {
            debug!(path = %checksum_file.display(), "Using local checksum file");
            return Ok(digest);
        }
        warn!(path = %checksum_file.display(), "Ignoring malformed checksum file");
    }

    debug!(url = %remote_url, "Fetching remote checksum");
    let body = fetcher.fetch_text(remote_url)?;
    let digest = normalize_digest(&body);
    if !is_sha512_hex(&digest) {
        return Err(InstallerError::DownloadFailed {
            url: remote_url.to_string(),
            reason: "response is not a SHA-512 digest".to_string(),
        });
    }

    if let Err(e) = fs::write(checksum_file, format!("{}\n", digest)) {
        warn!(
            path = %checksum_file.display(),
            error = %e,
            "Failed to keep checksum file"
        );
    }

    Ok(digest)
}

/// Verify the archive against the published digest.
///
/// A mismatch is `ChecksumMismatch`; I/O and transport failures keep their
/// own kinds.
pub fn verify_checksum(
    artifact: &Path,
    checksum_file: &Path,
    remote_url: &str,
    fetcher: &dyn HttpFetcher,
) -> InstallerResult<()> {
    let expected = expected_checksum(checksum_file, remote_url, fetcher)?;
    let actual = calculate_sha512(artifact)?;

    if actual == expected {
        debug!(file = %artifact.display(), "Checksum verified");
        return Ok(());
    }

    warn!(
        file = %artifact.display(),
        expected = %expected,
        actual = %actual,
        "Checksum mismatch"
    );
    Err(InstallerError::ChecksumMismatch {
        filename: artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.display().to_string()),
        expected,
        actual,
    })
}

/// Compare the archive's digest with the published one.
///
/// I/O and transport failures are errors; a mismatch is `Ok(false)`.
pub fn check_sum(
    artifact: &Path,
    checksum_file: &Path,
    remote_url: &str,
    fetcher: &dyn HttpFetcher,
) -> InstallerResult<bool> {
    match verify_checksum(artifact, checksum_file, remote_url, fetcher) {
        Ok(()) => Ok(true),
        Err(InstallerError::ChecksumMismatch { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
