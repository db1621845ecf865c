//! `edgeadm detect`

use clap::Args;
use console::style;
use edgeadm::os::detect_package_manager;
use edgeadm::PackageManager;
use serde_json::json;

use super::Context;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Print machine-readable output
    #[arg(long)]
    pub json: bool,
}

/// Report host facts. A Linux host without apt, yum or pacman is reported
/// and then fails as unsupported.
pub fn run(ctx: &Context, args: DetectArgs) -> Result<(), CliError> {
    let package_manager = if cfg!(windows) {
        None
    } else {
        Some(detect_package_manager(ctx.executor.as_ref()))
    };
    let detected: Option<PackageManager> = package_manager
        .as_ref()
        .and_then(|pm| pm.as_ref().ok().copied());
    let services = ctx.services();

    if args.json {
        let report = json!({
            "os": std::env::consts::OS,
            "arch": ctx.config.arch,
            "package_manager": detected.map(|pm| pm.to_string()),
            "systemd": ctx.paths.has_systemd(),
            "service_backend": services.backend(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("OS:              {}", std::env::consts::OS);
        println!("Architecture:    {}", ctx.config.arch);
        match detected {
            Some(pm) => println!("Package manager: {}", style(pm).green()),
            None if cfg!(windows) => println!("Package manager: n/a"),
            None => println!("Package manager: {}", style("unsupported").red()),
        }
        println!("systemd:         {}", ctx.paths.has_systemd());
        println!("Service backend: {}", services.backend());
    }

    match package_manager {
        Some(Err(e)) => Err(e.into()),
        _ => Ok(()),
    }
}

