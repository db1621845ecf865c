//! edgeadm - install and supervise KubeEdge cloudcore/edgecore.

mod commands;
mod error;
mod logging;
mod prompt;

use std::error::Error as _;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;
use edgeadm::PlatformPaths;

use commands::{Context, DetectArgs, InstallArgs, RoleArgs, StatusArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "edgeadm")]
#[command(version, about = "Install and manage KubeEdge cloudcore/edgecore", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to edgeadm.ini in the KubeEdge base directory)
    #[arg(long, global = true, env = "EDGEADM_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, verify and install a component, then start it
    Install(InstallArgs),

    /// Start an installed component
    Start(RoleArgs),

    /// Stop a running component
    Stop(RoleArgs),

    /// Stop and unregister a component's service
    Uninstall(RoleArgs),

    /// Forcefully stop a component however it was started
    Kill(RoleArgs),

    /// Show which component is running on this host
    Status(StatusArgs),

    /// Report the host's package manager and service backend
    Detect(DetectArgs),
}

fn main() {
    let cli = Cli::parse();
    let paths = PlatformPaths::host();
    let _guard = logging::init(cli.verbose, &paths.log_dir);

    if let Err(err) = run(cli, paths) {
        report(&err);
        process::exit(err.exit_code());
    }
}

fn run(cli: Cli, paths: PlatformPaths) -> Result<(), CliError> {
    let ctx = Context::load(paths, cli.config.as_deref())?;

    match cli.command {
        Commands::Install(args) => commands::install::run(&ctx, args),
        Commands::Start(args) => commands::lifecycle::start(&ctx, args),
        Commands::Stop(args) => commands::lifecycle::stop(&ctx, args),
        Commands::Uninstall(args) => commands::lifecycle::uninstall(&ctx, args),
        Commands::Kill(args) => commands::lifecycle::kill(&ctx, args),
        Commands::Status(args) => commands::status::run(&ctx, args),
        Commands::Detect(args) => commands::detect::run(&ctx, args),
    }
}

/// Print the error and its causes.
fn report(err: &CliError) {
    eprintln!("{} {}", style("error:").red().bold(), err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  {} {}", style("caused by:").dim(), cause);
        source = cause.source();
    }
}
