//! Release archive extraction.
//!
//! Archives are gzip-compressed tarballs with a single top-level directory
//! named after the release (`kubeedge-v1.14.0-linux-amd64/`).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use crate::error::{InstallerError, InstallerResult};

/// Unpacks release archives.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive_path` into `dest_dir`. Returns the number of regular
    /// files unpacked from the archive.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> InstallerResult<usize>;
}

/// In-process `.tar.gz` extractor.
///
/// Entries that would land outside the destination directory are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzExtractor;

impl TarGzExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive_path: &Path) -> InstallerResult<Archive<GzDecoder<BufReader<File>>>> {
        let file = File::open(archive_path).map_err(|e| InstallerError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
    }
}

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> InstallerResult<usize> {
        fs::create_dir_all(dest_dir).map_err(|e| InstallerError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        debug!(
            archive = %archive_path.display(),
            dest = %dest_dir.display(),
            "Extracting archive"
        );

        let mut archive = self.open(archive_path)?;
        archive.set_preserve_permissions(true);

        let entries = archive
            .entries()
            .map_err(|e| extraction_failed(archive_path, e))?;
        let mut unpacked = 0;
        for entry in entries {
            let mut entry = entry.map_err(|e| extraction_failed(archive_path, e))?;
            let is_file = entry.header().entry_type().is_file();
            // `unpack_in` refuses `..` and absolute paths.
            let written = entry
                .unpack_in(dest_dir)
                .map_err(|e| extraction_failed(archive_path, e))?;
            if written && is_file {
                unpacked += 1;
            }
        }

        debug!(files = unpacked, "Archive extracted");
        Ok(unpacked)
    }
}

fn extraction_failed(archive_path: &Path, e: std::io::Error) -> InstallerError {
    InstallerError::ExtractionFailed {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    }
}
