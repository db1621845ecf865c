//! Forceful teardown of a running component.

use std::collections::HashSet;
use std::fs;

use tracing::{debug, info, warn};

use crate::error::{InstallerError, InstallerResult};
use crate::exec::CommandExecutor;
use crate::platform::PlatformPaths;
use crate::types::ComponentType;

/// Unit names edgecore has been registered under, in increasing precedence.
const EDGE_UNIT_NAMES: [&str; 2] = ["edge", "edgecore"];

/// Names of the enabled systemd units (without the `.service` suffix).
pub fn enabled_units(executor: &dyn CommandExecutor) -> InstallerResult<HashSet<String>> {
    let output = executor
        .run(
            "systemctl",
            &[
                "list-unit-files",
                "--type=service",
                "--state=enabled",
                "--no-legend",
            ],
        )?
        .check()?;

    Ok(output
        .stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|unit| unit.strip_suffix(".service"))
        .map(str::to_string)
        .collect())
}

/// Stop a component regardless of how it was started.
///
/// cloudcore is always killed by process name. edgecore registered as an
/// enabled systemd unit (`edge` or `edgecore`) is stopped, disabled and
/// unregistered instead; otherwise it is killed by process name as well.
pub fn kill_component(
    component: ComponentType,
    paths: &PlatformPaths,
    executor: &dyn CommandExecutor,
) -> InstallerResult<()> {
    if cfg!(windows) {
        let image = component.executable_name();
        executor.run("taskkill", &["/F", "/IM", &image])?.check()?;
        info!(component = %component, "Process stopped");
        return Ok(());
    }

    let unit = match component {
        ComponentType::CloudCore => None,
        ComponentType::EdgeCore if paths.has_systemd() => enabled_edge_unit(executor),
        ComponentType::EdgeCore => None,
    };

    match unit {
        Some(name) => remove_unit(name, paths, executor)?,
        None => pkill(component, executor)?,
    }

    info!(component = %component, "Process stopped");
    Ok(())
}

fn enabled_edge_unit(executor: &dyn CommandExecutor) -> Option<&'static str> {
    let enabled = match enabled_units(executor) {
        Ok(units) => units,
        Err(e) => {
            warn!(error = %e, "Failed to list enabled systemd units");
            return None;
        }
    };
    EDGE_UNIT_NAMES
        .iter()
        .rev()
        .find(|name| enabled.contains(**name))
        .copied()
}

fn remove_unit(
    name: &str,
    paths: &PlatformPaths,
    executor: &dyn CommandExecutor,
) -> InstallerResult<()> {
    let unit = format!("{}.service", name);
    info!(unit = %unit, "Removing systemd unit");

    executor.run("systemctl", &["stop", &unit])?.check()?;
    executor.run("systemctl", &["disable", &unit])?.check()?;

    let unit_file = paths.unit_file_named(name);
    if unit_file.exists() {
        fs::remove_file(&unit_file).map_err(|e| InstallerError::WriteFailed {
            path: unit_file.clone(),
            source: e,
        })?;
    }

    executor.run("systemctl", &["daemon-reload"])?.check()?;
    Ok(())
}

/// `pkill` by exact process name; "nothing matched" is not an error.
fn pkill(component: ComponentType, executor: &dyn CommandExecutor) -> InstallerResult<()> {
    let output = executor.run("pkill", &["-x", component.binary_name()])?;
    match output.exit_code {
        Some(0) => Ok(()),
        Some(1) => {
            debug!(component = %component, "No matching process to kill");
            Ok(())
        }
        _ => output.check().map(|_| ()),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::exec::testing::MockExecutor;
    use tempfile::TempDir;

    const LIST: &str = "systemctl list-unit-files";

    fn systemd_paths(temp: &TempDir) -> PlatformPaths {
        let paths = PlatformPaths::rooted(temp.path());
        fs::create_dir_all(&paths.systemd_boot_dir).unwrap();
        fs::create_dir_all(&paths.systemd_unit_dir).unwrap();
        paths
    }

    #[test]
    fn test_enabled_units_parsing() {
        let mock = MockExecutor::new().respond(
            LIST,
            0,
            "edgecore.service   enabled enabled\nsshd.service enabled enabled\nedge-proxy.service enabled enabled",
        );
        let units = enabled_units(&mock).unwrap();
        assert!(units.contains("edgecore"));
        assert!(units.contains("edge-proxy"));
        assert!(!units.contains("edge"));
    }

    #[test]
    fn test_cloudcore_is_pkilled() {
        let temp = TempDir::new().unwrap();
        let paths = systemd_paths(&temp);
        let mock = MockExecutor::new();

        kill_component(ComponentType::CloudCore, &paths, &mock).unwrap();

        assert_eq!(mock.calls(), vec!["pkill -x cloudcore".to_string()]);
    }

    #[test]
    fn test_edgecore_unit_is_removed() {
        let temp = TempDir::new().unwrap();
        let paths = systemd_paths(&temp);
        fs::write(paths.unit_file_named("edgecore"), "[Unit]\n").unwrap();
        let mock = MockExecutor::new().respond(LIST, 0, "edge.service enabled\nedgecore.service enabled");

        kill_component(ComponentType::EdgeCore, &paths, &mock).unwrap();

        assert!(mock.called("systemctl stop edgecore.service"));
        assert!(mock.called("systemctl disable edgecore.service"));
        assert!(mock.called("systemctl daemon-reload"));
        assert!(!mock.called("pkill"));
        assert!(!paths.unit_file_named("edgecore").exists());
    }

    #[test]
    fn test_legacy_edge_unit_without_file() {
        let temp = TempDir::new().unwrap();
        let paths = systemd_paths(&temp);
        let mock = MockExecutor::new().respond(LIST, 0, "edge.service enabled");

        kill_component(ComponentType::EdgeCore, &paths, &mock).unwrap();

        assert!(mock.called("systemctl stop edge.service"));
        assert!(mock.called("systemctl daemon-reload"));
    }

    #[test]
    fn test_edgecore_without_enabled_unit_is_pkilled() {
        let temp = TempDir::new().unwrap();
        let paths = systemd_paths(&temp);
        let mock = MockExecutor::new()
            .respond(LIST, 0, "sshd.service enabled")
            .respond("pkill", 1, "");

        kill_component(ComponentType::EdgeCore, &paths, &mock).unwrap();

        assert!(mock.called("pkill -x edgecore"));
    }

    #[test]
    fn test_edgecore_without_systemd_skips_unit_lookup() {
        let temp = TempDir::new().unwrap();
        let paths = PlatformPaths::rooted(temp.path());
        let mock = MockExecutor::new();

        kill_component(ComponentType::EdgeCore, &paths, &mock).unwrap();

        assert_eq!(mock.calls(), vec!["pkill -x edgecore".to_string()]);
    }

    #[test]
    fn test_pkill_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let paths = PlatformPaths::rooted(temp.path());
        let mock = MockExecutor::new().respond("pkill", 3, "");

        assert!(matches!(
            kill_component(ComponentType::CloudCore, &paths, &mock),
            Err(InstallerError::Execution { .. })
        ));
    }
}
