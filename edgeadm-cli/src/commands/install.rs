//! `edgeadm install`

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use edgeadm::{
    detect_os_installer, parse_version, run_component, ComponentType, Confirm, HttpDownloader,
    InstallOptions, InstallStage, Installer, InstallerResult,
};
use indicatif::{ProgressBar, ProgressStyle};

use super::{success, Context, Role};
use crate::error::CliError;
use crate::prompt;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Component to install
    #[arg(long, value_enum)]
    pub role: Role,

    /// Release to install, e.g. 1.14.0 (defaults to the latest release)
    #[arg(long, value_name = "SEMVER")]
    pub version: Option<String>,

    /// Directory for release archives (defaults to the KubeEdge base directory)
    #[arg(long, value_name = "DIR")]
    pub tarball_path: Option<PathBuf>,

    /// Answer yes to every prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Also install the mosquitto MQTT broker (edge only)
    #[arg(long)]
    pub mqtt: bool,

    /// Place the binary without registering or starting the service
    #[arg(long)]
    pub no_start: bool,
}

/// Keeps prompts readable while the spinner is drawing.
struct SuspendingConfirm<'a> {
    inner: &'a dyn Confirm,
    spinner: &'a ProgressBar,
}

impl Confirm for SuspendingConfirm<'_> {
    fn confirm(&self, prompt: &str) -> InstallerResult<bool> {
        self.spinner.suspend(|| self.inner.confirm(prompt))
    }
}

pub fn run(ctx: &Context, args: InstallArgs) -> Result<(), CliError> {
    let component = ComponentType::from(args.role);
    if args.mqtt && component != ComponentType::EdgeCore {
        return Err(CliError::Config(
            "--mqtt only applies to edge nodes".to_string(),
        ));
    }

    let fetcher = HttpDownloader::with_timeout(ctx.config.timeout)?;
    let installer = Installer::new(ctx.paths.clone(), ctx.config.clone(), fetcher);

    let version = match args.version.as_deref() {
        Some(v) => parse_version(v)?,
        None => {
            let latest = installer.latest_version()?;
            println!("Using latest release {}", style(format!("v{}", latest)).cyan());
            latest
        }
    };

    let mut options = InstallOptions::new(component, version);
    if let Some(dir) = args.tarball_path {
        options = options.with_tarball_dir(dir);
    }

    let spinner = spinner();
    let progress = spinner.clone();
    let answer = prompt::confirmer(args.yes);
    let confirm = SuspendingConfirm {
        inner: answer.as_ref(),
        spinner: &spinner,
    };

    let result = installer.install(
        &options,
        &confirm,
        Some(Box::new(move |stage: InstallStage, message: &str| {
            progress.set_message(format!("{}: {}", stage.name(), message));
        })),
    );
    let result = match result {
        Ok(result) => {
            spinner.finish_and_clear();
            result
        }
        Err(e) => {
            spinner.abandon_with_message(style("Installation failed").red().to_string());
            return Err(e.into());
        }
    };

    success(format!(
        "Installed {} v{} to {}",
        component,
        result.version,
        result.binary_path.display()
    ));

    if args.mqtt {
        let os = detect_os_installer(ctx.executor.clone())?;
        os.install_mqtt()?;
        success("Installed mosquitto");
    }

    if args.no_start {
        return Ok(());
    }

    let services = ctx.services();
    let hint = run_component(component, &ctx.paths, services.as_ref())?;
    success(format!("{} is running ({})", component, services.backend()));
    println!("  Logs: {}", style(hint).dim());
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
