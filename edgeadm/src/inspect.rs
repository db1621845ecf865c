//! Which component, if any, is running on this host.

use std::path::Path;

use tracing::warn;

use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;
use crate::os::OsInstaller;
use crate::service::{ServiceManager, ServiceState};
use crate::types::{ComponentType, ModuleRunning, ResetOptions};

/// Namespace cloudcore is deployed into when containerized.
pub const SYSTEM_NAMESPACE: &str = "kubeedge";

/// Looks for a cloudcore running inside the cluster.
pub trait CloudContainerCheck {
    fn is_cloudcore_running(&self, namespace: &str, kubeconfig: &Path) -> InstallerResult<bool>;
}

/// Asks `kubectl` for the ready replica count of the cloudcore deployment.
pub struct KubectlCloudCheck<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> KubectlCloudCheck<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl CloudContainerCheck for KubectlCloudCheck<'_> {
    fn is_cloudcore_running(&self, namespace: &str, kubeconfig: &Path) -> InstallerResult<bool> {
        let kubeconfig = kubeconfig.to_string_lossy();
        let output = self
            .executor
            .run(
                "kubectl",
                &[
                    "--kubeconfig",
                    &kubeconfig,
                    "-n",
                    namespace,
                    "get",
                    "deployment",
                    ComponentType::CloudCore.binary_name(),
                    "-o",
                    "jsonpath={.status.readyReplicas}",
                ],
            )?
            .check()?;

        // An empty field means no replica is ready.
        let ready = output.stdout.trim();
        Ok(!ready.is_empty() && ready.parse::<u32>().map(|n| n >= 1).unwrap_or(false))
    }
}

/// Process-based check: cloud first, then edge.
///
/// A failed check is logged and does not prevent the next one. When nothing
/// is found running, the first check error (if any) is returned.
pub fn running_module(os: &dyn OsInstaller) -> InstallerResult<ModuleRunning> {
    let mut errors: Vec<InstallerError> = Vec::new();

    for (component, module) in [
        (ComponentType::CloudCore, ModuleRunning::CloudRunning),
        (ComponentType::EdgeCore, ModuleRunning::EdgeRunning),
    ] {
        match os.is_process_running(component.binary_name()) {
            Ok(true) => return Ok(module),
            Ok(false) => {}
            Err(e) => {
                warn!(component = %component, error = %e, "Failed to check process");
                errors.push(e);
            }
        }
    }

    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(ModuleRunning::NoneRunning),
    }
}

/// Containerized cloud check, then edge process check. Never fails.
pub fn running_module_v2(
    opts: &ResetOptions,
    cloud_check: &dyn CloudContainerCheck,
    os: &dyn OsInstaller,
) -> ModuleRunning {
    match cloud_check.is_cloudcore_running(SYSTEM_NAMESPACE, &opts.kubeconfig) {
        Ok(true) => return ModuleRunning::CloudRunning,
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Failed to check whether cloudcore is running"),
    }

    match os.is_process_running(ComponentType::EdgeCore.binary_name()) {
        Ok(true) => ModuleRunning::EdgeRunning,
        Ok(false) => ModuleRunning::NoneRunning,
        Err(e) => {
            warn!(error = %e, "Failed to check whether edgecore is running");
            ModuleRunning::NoneRunning
        }
    }
}

/// Service-based check used where no process lookup exists (Windows).
///
/// edgecore is running only when its service is registered and in the
/// Running state. Query errors are logged and treated as not running.
pub fn running_module_by_service(services: &dyn ServiceManager) -> ModuleRunning {
    match services.state(ComponentType::EdgeCore) {
        Ok(ServiceState::Running) => ModuleRunning::EdgeRunning,
        Ok(_) => ModuleRunning::NoneRunning,
        Err(e) => {
            warn!(error = %e, "Failed to query edgecore service");
            ModuleRunning::NoneRunning
        }
    }
}
