//! OS service lifecycle for cloudcore and edgecore.
//!
//! ```text
//!  Absent ──install──▶ Running ◀──start── Stopped
//!    ▲                    │                  ▲
//!    └────uninstall───────┴───────stop───────┘
//! ```
//!
//! Three backends implement [`ServiceManager`]:
//!
//! - [`SystemdManager`] for hosts booted with systemd
//! - [`ProcessManager`] for other Unix hosts: a detached process tracked
//!   through a PID file
//! - `WindowsServiceManager` for the Windows Service Control Manager

mod kill;
#[cfg(unix)]
mod process;
mod systemd;
#[cfg(windows)]
mod windows;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::InstallerResult;
use crate::exec::CommandExecutor;
use crate::platform::PlatformPaths;
use crate::types::ComponentType;

pub use kill::{enabled_units, kill_component};
#[cfg(unix)]
pub use process::ProcessManager;
pub use systemd::SystemdManager;
#[cfg(windows)]
pub use windows::WindowsServiceManager;

/// Lifecycle state of one component's OS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Never installed, or uninstalled.
    Absent,
    /// Installed but not running.
    Stopped,
    Running,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "not installed",
            Self::Stopped => "stopped",
            Self::Running => "running",
        };
        f.write_str(s)
    }
}

/// Registers and controls a component as an OS service.
pub trait ServiceManager: Send + Sync {
    /// Backend name for diagnostics.
    fn backend(&self) -> &'static str;

    /// Current lifecycle state.
    fn state(&self, component: ComponentType) -> InstallerResult<ServiceState>;

    /// Register the service and start it.
    ///
    /// Fails with `ServiceAlreadyExists` without touching the host when the
    /// service is already registered.
    fn install(&self, component: ComponentType) -> InstallerResult<()>;

    /// Stop and deregister the service.
    ///
    /// Fails with `ServiceNotInstalled` when nothing is registered.
    fn uninstall(&self, component: ComponentType) -> InstallerResult<()>;

    /// Start a registered service.
    fn start(&self, component: ComponentType) -> InstallerResult<()>;

    /// Stop a registered service.
    fn stop(&self, component: ComponentType) -> InstallerResult<()>;

    /// Where the service's output can be read.
    fn log_hint(&self, component: ComponentType) -> String;
}

/// Pick the service backend for this host.
pub fn service_manager_for(
    paths: &PlatformPaths,
    executor: Arc<dyn CommandExecutor>,
) -> Box<dyn ServiceManager> {
    #[cfg(windows)]
    {
        Box::new(WindowsServiceManager::new(paths.clone(), executor))
    }

    #[cfg(not(windows))]
    {
        if paths.has_systemd() {
            Box::new(SystemdManager::new(paths.clone(), executor))
        } else {
            Box::new(ProcessManager::new(paths.clone(), executor))
        }
    }
}
