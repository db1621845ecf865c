//! edgeadm - install and supervise KubeEdge cloudcore/edgecore
//!
//! This library fetches versioned release archives, verifies their SHA-512
//! digests, places the component binaries and registers them with the host's
//! service manager (systemd, a PID-file fallback, or the Windows SCM).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edgeadm::{
//!     ComponentType, FixedAnswer, HttpDownloader, InstallOptions, Installer,
//!     InstallerConfig, PlatformPaths, SystemExecutor, parse_version,
//!     run_component, service_manager_for,
//! };
//!
//! let paths = PlatformPaths::host();
//! let config = InstallerConfig::default();
//! let fetcher = HttpDownloader::with_timeout(config.timeout)?;
//! let installer = Installer::new(paths.clone(), config, fetcher);
//!
//! let options = InstallOptions::new(ComponentType::EdgeCore, parse_version("v1.14.0")?);
//! installer.install(&options, &FixedAnswer(true), None)?;
//!
//! let services = service_manager_for(&paths, Arc::new(SystemExecutor::new()));
//! run_component(ComponentType::EdgeCore, &paths, services.as_ref())?;
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod exec;
pub mod extract;
pub mod inspect;
pub mod installer;
pub mod os;
pub mod platform;
pub mod release;
pub mod service;
pub mod types;

pub use config::{ConfigError, InstallerConfig};
pub use download::{HttpDownloader, HttpFetcher, RetryDownloader};
pub use error::{InstallerError, InstallerResult};
pub use exec::{CommandExecutor, CommandOutput, SystemExecutor};
pub use inspect::{running_module, running_module_by_service, running_module_v2, KubectlCloudCheck};
pub use installer::{run_component, InstallResult, InstallStage, Installer};
pub use os::{detect_os_installer, OsInstaller, PackageManager};
pub use platform::PlatformPaths;
pub use release::ReleaseArtifact;
pub use service::{kill_component, service_manager_for, ServiceManager, ServiceState};
pub use types::{parse_version, ComponentType, Confirm, FixedAnswer, InstallOptions, ModuleRunning, ResetOptions};
