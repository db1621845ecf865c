//! `edgeadm status`

use std::path::PathBuf;

use clap::Args;
use console::style;
use edgeadm::{
    detect_os_installer, running_module, running_module_by_service, running_module_v2,
    ComponentType, KubectlCloudCheck, ModuleRunning, ResetOptions, ServiceManager, ServiceState,
};
use serde_json::{json, Value};
use tracing::warn;

use super::Context;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Also look for a containerized cloudcore through this kubeconfig
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Print machine-readable output
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &Context, args: StatusArgs) -> Result<(), CliError> {
    let services = ctx.services();
    let running = detect_running(ctx, &args, services.as_ref())?;
    let states = service_states(services.as_ref());

    if args.json {
        let report = render_json(running, services.backend(), &states);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let headline = match running {
        ModuleRunning::NoneRunning => style(running.to_string()).yellow(),
        _ => style(running.to_string()).green(),
    };
    println!("{}", headline);
    println!("Service backend: {}", services.backend());
    for (component, state) in &states {
        let state = state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {:<10} {}", component.binary_name(), state);
    }
    Ok(())
}

fn detect_running(
    ctx: &Context,
    args: &StatusArgs,
    services: &dyn ServiceManager,
) -> Result<ModuleRunning, CliError> {
    if cfg!(windows) {
        return Ok(running_module_by_service(services));
    }

    let os = detect_os_installer(ctx.executor.clone())?;
    Ok(match &args.kubeconfig {
        Some(kubeconfig) => {
            let opts = ResetOptions {
                kubeconfig: kubeconfig.clone(),
            };
            let cloud_check = KubectlCloudCheck::new(ctx.executor.as_ref());
            running_module_v2(&opts, &cloud_check, os.as_ref())
        }
        None => running_module(os.as_ref())?,
    })
}

/// Service state per component; `None` when the query failed.
fn service_states(services: &dyn ServiceManager) -> Vec<(ComponentType, Option<ServiceState>)> {
    [ComponentType::CloudCore, ComponentType::EdgeCore]
        .into_iter()
        .map(|component| {
            let state = services
                .state(component)
                .map_err(|e| warn!(component = %component, error = %e, "Failed to query service"))
                .ok();
            (component, state)
        })
        .collect()
}

fn render_json(
    running: ModuleRunning,
    backend: &str,
    states: &[(ComponentType, Option<ServiceState>)],
) -> Value {
    let services: serde_json::Map<String, Value> = states
        .iter()
        .map(|(component, state)| (component.binary_name().to_string(), json!(state)))
        .collect();
    json!({
        "running": running,
        "backend": backend,
        "services": services,
    })
}
