//! Red Hat family (`yum`).

use std::sync::Arc;

use tracing::info;

use super::{pidof, OsInstaller, PackageManager};
use crate::error::InstallerResult;
use crate::exec::CommandExecutor;

/// CentOS, RHEL, Fedora and derivatives.
pub struct RpmOs {
    executor: Arc<dyn CommandExecutor>,
}

impl RpmOs {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl OsInstaller for RpmOs {
    fn package_manager(&self) -> PackageManager {
        PackageManager::Yum
    }

    fn install_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Installing package with yum");
        self.executor.run("yum", &["install", "-y", name])?.check()?;
        Ok(())
    }

    fn uninstall_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Removing package with yum");
        self.executor.run("yum", &["remove", "-y", name])?.check()?;
        Ok(())
    }

    fn is_process_running(&self, process: &str) -> InstallerResult<bool> {
        pidof(self.executor.as_ref(), process)
    }
}
