//! Installer configuration.
//!
//! Defaults point at the public KubeEdge release infrastructure. An optional
//! INI file can override them:
//!
//! ```ini
//! [download]
//! base_url = https://mirror.example.com/kubeedge/releases/download
//! raw_base_url = https://mirror.example.com/kubeedge/raw
//! latest_version_url = https://mirror.example.com/kubeedge/latestversion
//! timeout_secs = 600
//!
//! [install]
//! arch = arm64
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

/// Release download base URL.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com/kubeedge/kubeedge/releases/download";

/// Raw repository content base URL (unit files, CRDs).
pub const DEFAULT_RAW_CONTENT_URL: &str = "https://raw.githubusercontent.com/kubeedge/kubeedge";

/// Endpoint returning the latest published version string.
pub const DEFAULT_LATEST_VERSION_URL: &str = "https://kubeedge.io/latestversion";

/// Number of download-and-verify attempts before giving up.
pub const RETRY_TIMES: u32 = 5;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Name of the optional configuration file inside the base directory.
pub const CONFIG_FILE_NAME: &str = "edgeadm.ini";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The configuration file is not valid INI.
    #[error("failed to parse config file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// A key holds a value of the wrong shape.
    #[error("invalid value for {section}.{key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// Configuration for downloads and installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Base URL release archives and checksums are downloaded from.
    pub download_url: String,

    /// Base URL for raw repository files (unit files, CRDs).
    pub raw_content_url: String,

    /// URL returning the latest released version.
    pub latest_version_url: String,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Release architecture (`amd64`, `arm64`, `arm`).
    pub arch: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            raw_content_url: DEFAULT_RAW_CONTENT_URL.to_string(),
            latest_version_url: DEFAULT_LATEST_VERSION_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            arch: host_arch().to_string(),
        }
    }
}

impl InstallerConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the release download base URL.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = trim_slash(url.into());
        self
    }

    /// Set the raw content base URL.
    pub fn with_raw_content_url(mut self, url: impl Into<String>) -> Self {
        self.raw_content_url = trim_slash(url.into());
        self
    }

    /// Set the latest-version endpoint.
    pub fn with_latest_version_url(mut self, url: impl Into<String>) -> Self {
        self.latest_version_url = url.into();
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the release architecture.
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_ini_str(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();

        if let Some(download) = ini.section(Some("download")) {
            if let Some(url) = download.get("base_url") {
                config = config.with_download_url(url);
            }
            if let Some(url) = download.get("raw_base_url") {
                config = config.with_raw_content_url(url);
            }
            if let Some(url) = download.get("latest_version_url") {
                config = config.with_latest_version_url(url);
            }
            if let Some(value) = download.get("timeout_secs") {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        section: "download".to_string(),
                        key: "timeout_secs".to_string(),
                        value: value.to_string(),
                    })?;
                config = config.with_timeout(Duration::from_secs(secs));
            }
        }

        if let Some(install) = ini.section(Some("install")) {
            if let Some(arch) = install.get("arch") {
                let arch = arch.trim();
                if !matches!(arch, "amd64" | "arm64" | "arm") {
                    return Err(ConfigError::InvalidValue {
                        section: "install".to_string(),
                        key: "arch".to_string(),
                        value: arch.to_string(),
                    });
                }
                config = config.with_arch(arch);
            }
        }

        Ok(config)
    }
}

/// Release architecture name for the architecture this binary was built for.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = InstallerConfig::default();
        assert_eq!(config.download_url, DEFAULT_DOWNLOAD_URL);
        assert_eq!(config.latest_version_url, DEFAULT_LATEST_VERSION_URL);
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.arch, host_arch());
    }

    #[test]
    fn test_builder_pattern() {
        let config = InstallerConfig::new()
            .with_download_url("https://mirror.example.com/download/")
            .with_timeout(Duration::from_secs(60))
            .with_arch("arm64");

        assert_eq!(config.download_url, "https://mirror.example.com/download");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.arch, "arm64");
    }

    #[test]
    fn test_from_ini_overrides() {
        let config = InstallerConfig::from_ini_str(
            "[download]\nbase_url = https://mirror.local/dl\ntimeout_secs = 42\n\n[install]\narch = arm\n",
        )
        .unwrap();

        assert_eq!(config.download_url, "https://mirror.local/dl");
        assert_eq!(config.raw_content_url, DEFAULT_RAW_CONTENT_URL);
        assert_eq!(config.timeout, Duration::from_secs(42));
        assert_eq!(config.arch, "arm");
    }

    #[test]
    fn test_from_ini_rejects_bad_timeout() {
        let result = InstallerConfig::from_ini_str("[download]\ntimeout_secs = soon\n");
        match result {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "timeout_secs"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_from_ini_rejects_unknown_arch() {
        let result = InstallerConfig::from_ini_str("[install]\narch = sparc\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = InstallerConfig::load(&temp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, InstallerConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[download]\nlatest_version_url = http://127.0.0.1/latest\n",
        )
        .unwrap();

        let config = InstallerConfig::load(&path).unwrap();
        assert_eq!(config.latest_version_url, "http://127.0.0.1/latest");
    }
}
