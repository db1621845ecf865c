//! Debian family (`apt-get`).

use std::sync::Arc;

use tracing::info;

use super::{pidof, OsInstaller, PackageManager};
use crate::error::InstallerResult;
use crate::exec::CommandExecutor;

/// Debian, Ubuntu and derivatives.
pub struct DebOs {
    executor: Arc<dyn CommandExecutor>,
}

impl DebOs {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl OsInstaller for DebOs {
    fn package_manager(&self) -> PackageManager {
        PackageManager::Apt
    }

    fn install_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Installing package with apt-get");
        self.executor
            .run("apt-get", &["install", "-y", name])?
            .check()?;
        Ok(())
    }

    fn uninstall_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Removing package with apt-get");
        self.executor
            .run("apt-get", &["remove", "-y", name])?
            .check()?;
        Ok(())
    }

    fn is_process_running(&self, process: &str) -> InstallerResult<bool> {
        pidof(self.executor.as_ref(), process)
    }
}
