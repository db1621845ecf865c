//! Host package-manager strategies.
//!
//! The package manager is detected once per process with
//! [`detect_os_installer`] and the resulting strategy is passed to every
//! operation that needs it.

mod debian;
mod pacman;
mod rpm;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;

pub use debian::DebOs;
pub use pacman::PacmanOs;
pub use rpm::RpmOs;

/// Shell command that prints the path of the first available package manager.
pub const PACKAGE_MANAGER_LOOKUP: &str = "command -v apt || command -v yum || command -v pacman";

/// MQTT broker package installed on edge nodes.
pub const MQTT_PACKAGE: &str = "mosquitto";

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Yum,
    Pacman,
}

impl PackageManager {
    /// Command name as found on `PATH`.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// OS-specific installation capabilities.
pub trait OsInstaller: Send + Sync {
    /// Package manager this strategy drives.
    fn package_manager(&self) -> PackageManager;

    /// Install a package non-interactively.
    fn install_package(&self, name: &str) -> InstallerResult<()>;

    /// Remove a package non-interactively.
    fn uninstall_package(&self, name: &str) -> InstallerResult<()>;

    /// Whether a process with this exact name is running.
    fn is_process_running(&self, process: &str) -> InstallerResult<bool>;

    /// Install the MQTT broker used by edge nodes.
    fn install_mqtt(&self) -> InstallerResult<()> {
        self.install_package(MQTT_PACKAGE)
    }
}

/// Pick the package manager from the lookup's stdout.
pub fn parse_lookup_output(stdout: &str) -> Option<PackageManager> {
    let path = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    [PackageManager::Apt, PackageManager::Yum, PackageManager::Pacman]
        .into_iter()
        .find(|pm| path.ends_with(pm.command()))
}

/// Detect the host's package manager.
///
/// A lookup that cannot run is logged and treated as "nothing found".
pub fn detect_package_manager(executor: &dyn CommandExecutor) -> InstallerResult<PackageManager> {
    let output = match executor.run_shell(PACKAGE_MANAGER_LOOKUP) {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Package manager lookup failed");
            return Err(InstallerError::UnsupportedPackageManager);
        }
    };

    match parse_lookup_output(&output.stdout) {
        Some(pm) => {
            debug!(package_manager = %pm, "Detected package manager");
            Ok(pm)
        }
        None => Err(InstallerError::UnsupportedPackageManager),
    }
}

/// Build the strategy for the host's package manager.
pub fn detect_os_installer(
    executor: Arc<dyn CommandExecutor>,
) -> InstallerResult<Box<dyn OsInstaller>> {
    let pm = detect_package_manager(executor.as_ref())?;
    Ok(os_installer_for(pm, executor))
}

/// Build the strategy for a known package manager.
pub fn os_installer_for(
    pm: PackageManager,
    executor: Arc<dyn CommandExecutor>,
) -> Box<dyn OsInstaller> {
    match pm {
        PackageManager::Apt => Box::new(DebOs::new(executor)),
        PackageManager::Yum => Box::new(RpmOs::new(executor)),
        PackageManager::Pacman => Box::new(PacmanOs::new(executor)),
    }
}

/// `pidof` liveness check shared by every Linux strategy.
///
/// Exit 0 means running, exit 1 means not running, anything else is an error.
pub(crate) fn pidof(executor: &dyn CommandExecutor, process: &str) -> InstallerResult<bool> {
    let output = executor.run("pidof", &[process])?;
    match output.exit_code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(InstallerError::Execution {
            command: output.command,
            exit_code: output.exit_code,
            stderr: output.stderr,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::MockExecutor;

    #[test]
    fn test_parse_lookup_output() {
        assert_eq!(parse_lookup_output("/usr/bin/apt\n"), Some(PackageManager::Apt));
        assert_eq!(parse_lookup_output("/bin/yum"), Some(PackageManager::Yum));
        assert_eq!(
            parse_lookup_output("\n/usr/sbin/pacman\n"),
            Some(PackageManager::Pacman)
        );
        assert_eq!(parse_lookup_output("/usr/bin/zypper"), None);
        assert_eq!(parse_lookup_output(""), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_picks_yum() {
        let mock = MockExecutor::new().respond("sh -c command -v apt", 0, "/usr/bin/yum");
        assert_eq!(detect_package_manager(&mock).unwrap(), PackageManager::Yum);
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_nothing_found_is_fatal() {
        let mock = MockExecutor::new().respond("sh -c command -v apt", 1, "");
        let err = detect_package_manager(&mock).unwrap_err();
        assert!(matches!(err, InstallerError::UnsupportedPackageManager));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_detect_lookup_spawn_failure() {
        let mock = MockExecutor::new().fail_spawn("sh");
        assert!(matches!(
            detect_package_manager(&mock),
            Err(InstallerError::UnsupportedPackageManager)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_os_installer_threads_strategy() {
        let mock = Arc::new(MockExecutor::new().respond("sh -c command -v apt", 0, "/usr/bin/pacman"));
        let os = detect_os_installer(mock).unwrap();
        assert_eq!(os.package_manager(), PackageManager::Pacman);
    }

    #[test]
    fn test_pidof_exit_codes() {
        let mock = MockExecutor::new()
            .respond("pidof cloudcore", 0, "1234")
            .respond("pidof edgecore", 1, "")
            .respond("pidof broken", 2, "");

        assert!(pidof(&mock, "cloudcore").unwrap());
        assert!(!pidof(&mock, "edgecore").unwrap());
        assert!(matches!(
            pidof(&mock, "broken"),
            Err(InstallerError::Execution { .. })
        ));
    }

    #[test]
    fn test_install_mqtt_uses_detected_manager() {
        let mock = Arc::new(MockExecutor::new());
        let os = os_installer_for(PackageManager::Apt, mock.clone());
        os.install_mqtt().unwrap();
        assert!(mock.called("apt-get install -y mosquitto"));
    }
}
