//! `edgeadm start|stop|uninstall|kill`

use clap::Args;
use edgeadm::{kill_component, ComponentType};
use tracing::info;

use super::{success, Context, Role};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Component to act on
    #[arg(long, value_enum)]
    pub role: Role,
}

pub fn start(ctx: &Context, args: RoleArgs) -> Result<(), CliError> {
    let component = ComponentType::from(args.role);
    let services = ctx.services();
    services.start(component)?;
    success(format!("Started {}", component));
    println!("  Logs: {}", services.log_hint(component));
    Ok(())
}

pub fn stop(ctx: &Context, args: RoleArgs) -> Result<(), CliError> {
    let component = ComponentType::from(args.role);
    ctx.services().stop(component)?;
    success(format!("Stopped {}", component));
    Ok(())
}

pub fn uninstall(ctx: &Context, args: RoleArgs) -> Result<(), CliError> {
    let component = ComponentType::from(args.role);
    let services = ctx.services();
    info!(component = %component, backend = services.backend(), "Uninstalling service");
    services.uninstall(component)?;
    success(format!("Removed {} service", component));
    Ok(())
}

pub fn kill(ctx: &Context, args: RoleArgs) -> Result<(), CliError> {
    let component = ComponentType::from(args.role);
    kill_component(component, &ctx.paths, ctx.executor.as_ref())?;
    success(format!("Killed {}", component));
    Ok(())
}
