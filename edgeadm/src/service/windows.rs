//! Windows Service Control Manager backend.
//!
//! Only edgecore runs on Windows. Besides the SCM registration an event-log
//! source is registered under
//! `HKLM\SYSTEM\CurrentControlSet\Services\EventLog\Application\{name}`
//! with `EventCreate.exe` as message file.

use std::ffi::OsString;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use windows_service::service::{
    Service, ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceStartType,
    ServiceState as ScmState, ServiceType,
};
use windows_service::service_manager::{ServiceManager as Scm, ServiceManagerAccess};

use super::{ServiceManager, ServiceState};
use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;
use crate::platform::PlatformPaths;
use crate::types::ComponentType;

/// `ERROR_SERVICE_DOES_NOT_EXIST`
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;

const EVENT_LOG_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Services\EventLog\Application";

/// Error | Warning | Information
const EVENT_TYPES_SUPPORTED: &str = "7";

const SERVICE_DESCRIPTION: &str = "KubeEdge edge node agent";

pub struct WindowsServiceManager {
    paths: PlatformPaths,
    executor: Arc<dyn CommandExecutor>,
}

impl WindowsServiceManager {
    pub fn new(paths: PlatformPaths, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { paths, executor }
    }

    fn connect(&self, access: ServiceManagerAccess) -> InstallerResult<Scm> {
        Ok(Scm::local_computer(None::<&str>, access)?)
    }

    /// Open the service, mapping "does not exist" to `None`.
    fn open(&self, component: ComponentType, access: ServiceAccess) -> InstallerResult<Option<Service>> {
        let scm = self.connect(ServiceManagerAccess::CONNECT)?;
        match scm.open_service(component.service_name(), access) {
            Ok(service) => Ok(Some(service)),
            Err(windows_service::Error::Winapi(ref e))
                if e.raw_os_error() == Some(ERROR_SERVICE_DOES_NOT_EXIST) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn open_installed(&self, component: ComponentType, access: ServiceAccess) -> InstallerResult<Service> {
        self.open(component, access)?.ok_or_else(|| {
            InstallerError::ServiceNotInstalled(component.service_name().to_string())
        })
    }

    fn event_log_key(name: &str) -> String {
        format!(r"{}\{}", EVENT_LOG_KEY, name)
    }

    fn event_source_exists(&self, name: &str) -> InstallerResult<bool> {
        let key = Self::event_log_key(name);
        Ok(self.executor.run("reg", &["query", &key])?.success())
    }

    fn register_event_source(&self, name: &str) -> InstallerResult<()> {
        let key = Self::event_log_key(name);
        self.executor
            .run(
                "reg",
                &[
                    "add",
                    &key,
                    "/v",
                    "EventMessageFile",
                    "/t",
                    "REG_EXPAND_SZ",
                    "/d",
                    r"%SystemRoot%\System32\EventCreate.exe",
                    "/f",
                ],
            )?
            .check()?;
        self.executor
            .run(
                "reg",
                &[
                    "add",
                    &key,
                    "/v",
                    "TypesSupported",
                    "/t",
                    "REG_DWORD",
                    "/d",
                    EVENT_TYPES_SUPPORTED,
                    "/f",
                ],
            )?
            .check()?;
        Ok(())
    }

    fn remove_event_source(&self, name: &str) -> InstallerResult<()> {
        let key = Self::event_log_key(name);
        self.executor.run("reg", &["delete", &key, "/f"])?.check()?;
        Ok(())
    }

    fn ensure_supported(component: ComponentType) -> InstallerResult<()> {
        match component {
            ComponentType::EdgeCore => Ok(()),
            ComponentType::CloudCore => Err(InstallerError::UnsupportedComponent(component)),
        }
    }
}

impl ServiceManager for WindowsServiceManager {
    fn backend(&self) -> &'static str {
        "windows-scm"
    }

    fn state(&self, component: ComponentType) -> InstallerResult<ServiceState> {
        let Some(service) = self.open(component, ServiceAccess::QUERY_STATUS)? else {
            return Ok(ServiceState::Absent);
        };
        let status = service.query_status()?;
        Ok(if status.current_state == ScmState::Running {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        })
    }

    fn install(&self, component: ComponentType) -> InstallerResult<()> {
        Self::ensure_supported(component)?;
        let name = component.service_name();

        if self.open(component, ServiceAccess::QUERY_STATUS)?.is_some() {
            return Err(InstallerError::ServiceAlreadyExists(name.to_string()));
        }

        let scm = self.connect(ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE)?;
        let info = ServiceInfo {
            name: OsString::from(name),
            display_name: OsString::from(name),
            service_type: ServiceType::OWN_PROCESS,
            start_type: ServiceStartType::AutoStart,
            error_control: ServiceErrorControl::Normal,
            executable_path: self.paths.binary_path(component),
            launch_arguments: vec![],
            dependencies: vec![],
            account_name: None,
            account_password: None,
        };
        let service = scm.create_service(
            &info,
            ServiceAccess::CHANGE_CONFIG | ServiceAccess::START | ServiceAccess::DELETE,
        )?;
        service.set_description(SERVICE_DESCRIPTION)?;

        if !self.event_source_exists(name)? {
            if let Err(e) = self.register_event_source(name) {
                warn!(error = %e, "Event log registration failed, deleting service");
                service.delete()?;
                return Err(e);
            }
        }

        service.start::<OsString>(&[])?;
        info!(service = name, "Windows service installed and started");
        Ok(())
    }

    fn uninstall(&self, component: ComponentType) -> InstallerResult<()> {
        Self::ensure_supported(component)?;
        let name = component.service_name();
        let service = self.open_installed(
            component,
            ServiceAccess::QUERY_STATUS | ServiceAccess::STOP | ServiceAccess::DELETE,
        )?;

        if service.query_status()?.current_state != ScmState::Stopped {
            service.stop()?;
            // The SCM only deletes a service once it has reached Stopped.
            for _ in 0..10 {
                if service.query_status()?.current_state == ScmState::Stopped {
                    break;
                }
                thread::sleep(Duration::from_millis(500));
            }
        }

        service.delete()?;
        self.remove_event_source(name)?;
        info!(service = name, "Windows service removed");
        Ok(())
    }

    fn start(&self, component: ComponentType) -> InstallerResult<()> {
        Self::ensure_supported(component)?;
        let service = self.open_installed(component, ServiceAccess::START)?;
        service.start::<OsString>(&[])?;
        Ok(())
    }

    fn stop(&self, component: ComponentType) -> InstallerResult<()> {
        Self::ensure_supported(component)?;
        let service = self.open_installed(component, ServiceAccess::STOP)?;
        service.stop()?;
        Ok(())
    }

    fn log_hint(&self, component: ComponentType) -> String {
        format!("Windows Event Viewer, source {}", component.service_name())
    }
}
