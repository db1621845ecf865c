//! Subcommand implementations.

pub mod detect;
pub mod install;
pub mod lifecycle;
pub mod status;

pub use detect::DetectArgs;
pub use install::InstallArgs;
pub use lifecycle::RoleArgs;
pub use status::StatusArgs;

use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use console::style;
use edgeadm::config::CONFIG_FILE_NAME;
use edgeadm::{
    service_manager_for, CommandExecutor, ComponentType, InstallerConfig, PlatformPaths,
    ServiceManager, SystemExecutor,
};
use tracing::debug;

use crate::error::CliError;

/// Component selection for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// cloudcore, the control-plane side
    Cloud,
    /// edgecore, the node agent
    Edge,
}

impl From<Role> for ComponentType {
    fn from(role: Role) -> Self {
        match role {
            Role::Cloud => ComponentType::CloudCore,
            Role::Edge => ComponentType::EdgeCore,
        }
    }
}

/// Everything a command needs from the host.
pub struct Context {
    pub paths: PlatformPaths,
    pub config: InstallerConfig,
    pub executor: Arc<dyn CommandExecutor>,
}

impl Context {
    /// Load configuration from `config_path`, or `edgeadm.ini` in the base
    /// directory when none is given.
    pub fn load(paths: PlatformPaths, config_path: Option<&Path>) -> Result<Self, CliError> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.base_dir.join(CONFIG_FILE_NAME));
        debug!(path = %path.display(), "Loading configuration");
        let config = InstallerConfig::load(&path)?;

        Ok(Self {
            paths,
            config,
            executor: Arc::new(SystemExecutor::new()),
        })
    }

    /// Service backend for this host.
    pub fn services(&self) -> Box<dyn ServiceManager> {
        service_manager_for(&self.paths, self.executor.clone())
    }
}

/// Print a success line.
pub fn success(message: impl AsRef<str>) {
    println!("{} {}", style("✓").green().bold(), message.as_ref());
}
