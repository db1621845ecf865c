//! Arch family (`pacman`).

use std::sync::Arc;

use tracing::info;

use super::{pidof, OsInstaller, PackageManager};
use crate::error::InstallerResult;
use crate::exec::CommandExecutor;

pub struct PacmanOs {
    executor: Arc<dyn CommandExecutor>,
}

impl PacmanOs {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl OsInstaller for PacmanOs {
    fn package_manager(&self) -> PackageManager {
        PackageManager::Pacman
    }

    fn install_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Installing package with pacman");
        self.executor
            .run("pacman", &["-S", "--noconfirm", "--needed", name])?
            .check()?;
        Ok(())
    }

    fn uninstall_package(&self, name: &str) -> InstallerResult<()> {
        info!(package = name, "Removing package with pacman");
        self.executor
            .run("pacman", &["-R", "--noconfirm", name])?
            .check()?;
        Ok(())
    }

    fn is_process_running(&self, process: &str) -> InstallerResult<bool> {
        pidof(self.executor.as_ref(), process)
    }
}
