//! systemd unit management.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{ServiceManager, ServiceState};
use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;
use crate::platform::PlatformPaths;
use crate::types::ComponentType;

/// Manages components as systemd units.
///
/// Unit files are staged in the base directory by the installer and linked
/// into the systemd unit directory on install.
pub struct SystemdManager {
    paths: PlatformPaths,
    executor: Arc<dyn CommandExecutor>,
}

impl SystemdManager {
    pub fn new(paths: PlatformPaths, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { paths, executor }
    }

    fn systemctl(&self, args: &[&str]) -> InstallerResult<()> {
        self.executor.run("systemctl", args)?.check()?;
        Ok(())
    }

    fn require_installed(&self, component: ComponentType) -> InstallerResult<()> {
        if self.paths.unit_file(component).exists() {
            Ok(())
        } else {
            Err(InstallerError::ServiceNotInstalled(
                component.service_name().to_string(),
            ))
        }
    }
}

impl ServiceManager for SystemdManager {
    fn backend(&self) -> &'static str {
        "systemd"
    }

    fn state(&self, component: ComponentType) -> InstallerResult<ServiceState> {
        if !self.paths.unit_file(component).exists() {
            return Ok(ServiceState::Absent);
        }
        let output = self
            .executor
            .run("systemctl", &["is-active", "--quiet", component.service_name()])?;
        Ok(if output.success() {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        })
    }

    fn install(&self, component: ComponentType) -> InstallerResult<()> {
        let name = component.service_name();
        let unit = self.paths.unit_file(component);
        if unit.exists() {
            return Err(InstallerError::ServiceAlreadyExists(name.to_string()));
        }

        let staged = self.paths.staged_unit_file(component);
        link_or_copy(&staged, &unit)?;
        info!(unit = %unit.display(), "Registered systemd unit");

        self.systemctl(&["daemon-reload"])?;
        self.systemctl(&["enable", name])?;
        self.systemctl(&["start", name])?;
        info!(service = name, "Service enabled and started");
        Ok(())
    }

    fn uninstall(&self, component: ComponentType) -> InstallerResult<()> {
        self.require_installed(component)?;
        let name = component.service_name();

        self.systemctl(&["stop", name])?;
        self.systemctl(&["disable", name])?;

        let unit = self.paths.unit_file(component);
        fs::remove_file(&unit).map_err(|e| InstallerError::WriteFailed {
            path: unit.clone(),
            source: e,
        })?;
        self.systemctl(&["daemon-reload"])?;
        info!(service = name, "Service removed");
        Ok(())
    }

    fn start(&self, component: ComponentType) -> InstallerResult<()> {
        self.require_installed(component)?;
        self.systemctl(&["start", component.service_name()])
    }

    fn stop(&self, component: ComponentType) -> InstallerResult<()> {
        self.require_installed(component)?;
        self.systemctl(&["stop", component.service_name()])
    }

    fn log_hint(&self, component: ComponentType) -> String {
        format!("journalctl -u {} -xe", component.service_file_name())
    }
}

/// Hard-link `src` to `dest`, copying when linking is not possible.
pub(crate) fn link_or_copy(src: &Path, dest: &Path) -> InstallerResult<()> {
    if !src.exists() {
        return Err(InstallerError::ReadFailed {
            path: src.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "unit file has not been downloaded"),
        });
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| InstallerError::CreateDirFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    if let Err(e) = fs::hard_link(src, dest) {
        debug!(error = %e, "Hard link failed, copying unit file instead");
        fs::copy(src, dest).map_err(|e| InstallerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::MockExecutor;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PlatformPaths, Arc<MockExecutor>) {
        let temp = TempDir::new().unwrap();
        let paths = PlatformPaths::rooted(temp.path());
        fs::create_dir_all(&paths.base_dir).unwrap();
        fs::create_dir_all(&paths.systemd_unit_dir).unwrap();
        (temp, paths, Arc::new(MockExecutor::new()))
    }

    #[test]
    fn test_install_links_and_starts_unit() {
        let (_temp, paths, mock) = setup();
        fs::write(paths.staged_unit_file(ComponentType::EdgeCore), "[Unit]\n").unwrap();
        let manager = SystemdManager::new(paths.clone(), mock.clone());

        manager.install(ComponentType::EdgeCore).unwrap();

        assert!(paths.unit_file(ComponentType::EdgeCore).exists());
        assert_eq!(
            mock.calls(),
            vec![
                "systemctl daemon-reload".to_string(),
                "systemctl enable edgecore".to_string(),
                "systemctl start edgecore".to_string(),
            ]
        );
    }

    #[test]
    fn test_install_existing_unit_is_rejected_without_mutation() {
        let (_temp, paths, mock) = setup();
        let unit = paths.unit_file(ComponentType::CloudCore);
        fs::write(&unit, "original").unwrap();
        fs::write(paths.staged_unit_file(ComponentType::CloudCore), "new").unwrap();
        let manager = SystemdManager::new(paths, mock.clone());

        match manager.install(ComponentType::CloudCore) {
            Err(InstallerError::ServiceAlreadyExists(name)) => assert_eq!(name, "cloudcore"),
            other => panic!("Expected ServiceAlreadyExists, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&unit).unwrap(), "original");
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_install_without_staged_unit() {
        let (_temp, paths, mock) = setup();
        let manager = SystemdManager::new(paths, mock);
        assert!(matches!(
            manager.install(ComponentType::EdgeCore),
            Err(InstallerError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_uninstall_never_installed() {
        let (_temp, paths, mock) = setup();
        let manager = SystemdManager::new(paths, mock.clone());

        match manager.uninstall(ComponentType::EdgeCore) {
            Err(InstallerError::ServiceNotInstalled(name)) => assert_eq!(name, "edgecore"),
            other => panic!("Expected ServiceNotInstalled, got {:?}", other),
        }
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_uninstall_removes_unit() {
        let (_temp, paths, mock) = setup();
        fs::write(paths.unit_file(ComponentType::EdgeCore), "[Unit]\n").unwrap();
        let manager = SystemdManager::new(paths.clone(), mock.clone());

        manager.uninstall(ComponentType::EdgeCore).unwrap();

        assert!(!paths.unit_file(ComponentType::EdgeCore).exists());
        assert_eq!(
            mock.calls(),
            vec![
                "systemctl stop edgecore".to_string(),
                "systemctl disable edgecore".to_string(),
                "systemctl daemon-reload".to_string(),
            ]
        );
    }

    #[test]
    fn test_state() {
        let (_temp, paths, _) = setup();
        let mock = Arc::new(MockExecutor::new().respond("systemctl is-active --quiet edgecore", 3, ""));
        let manager = SystemdManager::new(paths.clone(), mock);

        assert_eq!(manager.state(ComponentType::EdgeCore).unwrap(), ServiceState::Absent);

        fs::write(paths.unit_file(ComponentType::EdgeCore), "[Unit]\n").unwrap();
        fs::write(paths.unit_file(ComponentType::CloudCore), "[Unit]\n").unwrap();
        assert_eq!(manager.state(ComponentType::EdgeCore).unwrap(), ServiceState::Stopped);
        assert_eq!(manager.state(ComponentType::CloudCore).unwrap(), ServiceState::Running);
    }

    #[test]
    fn test_start_failure_is_reported() {
        let (_temp, paths, _) = setup();
        fs::write(paths.unit_file(ComponentType::EdgeCore), "[Unit]\n").unwrap();
        let mock = Arc::new(MockExecutor::new().respond("systemctl start", 5, ""));
        let manager = SystemdManager::new(paths, mock);

        assert!(matches!(
            manager.start(ComponentType::EdgeCore),
            Err(InstallerError::Execution { exit_code: Some(5), .. })
        ));
    }

    #[test]
    fn test_log_hint() {
        let (_temp, paths, mock) = setup();
        let manager = SystemdManager::new(paths, mock);
        assert_eq!(
            manager.log_hint(ComponentType::EdgeCore),
            "journalctl -u edgecore.service -xe"
        );
    }
}
