//! Detached-process fallback for hosts without systemd.

use std::fs::{self, OpenOptions};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{ServiceManager, ServiceState};
use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;
use crate::platform::PlatformPaths;
use crate::types::ComponentType;

/// Runs a component as a background process with its output appended to
/// `{log_dir}/{binary}.log`.
///
/// The PID is recorded in `{socket_dir}/{binary}.pid`; a PID file whose
/// process is gone means "stopped", no PID file means "absent".
pub struct ProcessManager {
    paths: PlatformPaths,
    executor: Arc<dyn CommandExecutor>,
}

impl ProcessManager {
    pub fn new(paths: PlatformPaths, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { paths, executor }
    }

    fn read_pid(&self, component: ComponentType) -> InstallerResult<Option<u32>> {
        let path = self.paths.pid_file(component);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| InstallerError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;
        match content.trim().parse::<u32>() {
            Ok(pid) => Ok(Some(pid)),
            Err(_) => {
                warn!(path = %path.display(), "Ignoring malformed PID file");
                Ok(None)
            }
        }
    }

    fn is_alive(&self, pid: u32) -> InstallerResult<bool> {
        let pid = pid.to_string();
        Ok(self.executor.run("kill", &["-0", &pid])?.success())
    }

    fn spawn(&self, component: ComponentType) -> InstallerResult<u32> {
        let binary = self.paths.binary_path(component);
        if !binary.exists() {
            return Err(InstallerError::ServiceNotInstalled(
                component.service_name().to_string(),
            ));
        }

        for dir in [&self.paths.log_dir, &self.paths.socket_dir] {
            fs::create_dir_all(dir).map_err(|e| InstallerError::CreateDirFailed {
                path: dir.clone(),
                source: e,
            })?;
        }

        let log_path = self.paths.log_file(component);
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| InstallerError::WriteFailed {
                path: log_path.clone(),
                source: e,
            })?;
        let stderr = stdout.try_clone().map_err(|e| InstallerError::WriteFailed {
            path: log_path.clone(),
            source: e,
        })?;

        let child = Command::new(&binary)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| InstallerError::Spawn {
                command: binary.display().to_string(),
                source: e,
            })?;
        let pid = child.id();

        let pid_path = self.paths.pid_file(component);
        fs::write(&pid_path, format!("{}\n", pid)).map_err(|e| InstallerError::WriteFailed {
            path: pid_path,
            source: e,
        })?;

        info!(
            component = %component,
            pid,
            log = %log_path.display(),
            "Started background process"
        );
        Ok(pid)
    }

    fn terminate(&self, component: ComponentType, pid: u32) -> InstallerResult<()> {
        if self.is_alive(pid)? {
            let pid_arg = pid.to_string();
            self.executor.run("kill", &["-TERM", &pid_arg])?.check()?;
            info!(component = %component, pid, "Sent termination signal");
        } else {
            debug!(component = %component, pid, "Process already gone");
        }
        Ok(())
    }
}

impl ServiceManager for ProcessManager {
    fn backend(&self) -> &'static str {
        "process"
    }

    fn state(&self, component: ComponentType) -> InstallerResult<ServiceState> {
        match self.read_pid(component)? {
            None => Ok(ServiceState::Absent),
            Some(pid) if self.is_alive(pid)? => Ok(ServiceState::Running),
            Some(_) => Ok(ServiceState::Stopped),
        }
    }

    fn install(&self, component: ComponentType) -> InstallerResult<()> {
        if self.state(component)? == ServiceState::Running {
            return Err(InstallerError::ServiceAlreadyExists(
                component.service_name().to_string(),
            ));
        }
        self.spawn(component).map(|_| ())
    }

    fn uninstall(&self, component: ComponentType) -> InstallerResult<()> {
        let pid = self.read_pid(component)?.ok_or_else(|| {
            InstallerError::ServiceNotInstalled(component.service_name().to_string())
        })?;
        self.terminate(component, pid)?;

        let pid_path = self.paths.pid_file(component);
        fs::remove_file(&pid_path).map_err(|e| InstallerError::WriteFailed {
            path: pid_path,
            source: e,
        })?;
        Ok(())
    }

    fn start(&self, component: ComponentType) -> InstallerResult<()> {
        match self.state(component)? {
            ServiceState::Running => Ok(()),
            ServiceState::Absent => Err(InstallerError::ServiceNotInstalled(
                component.service_name().to_string(),
            )),
            ServiceState::Stopped => self.spawn(component).map(|_| ()),
        }
    }

    fn stop(&self, component: ComponentType) -> InstallerResult<()> {
        let pid = self.read_pid(component)?.ok_or_else(|| {
            InstallerError::ServiceNotInstalled(component.service_name().to_string())
        })?;
        self.terminate(component, pid)
    }

    fn log_hint(&self, component: ComponentType) -> String {
        self.paths.log_file(component).display().to_string()
    }
}
