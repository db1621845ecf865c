//! Host filesystem layout.
//!
//! All paths the installer and service managers touch are resolved once per
//! process into a [`PlatformPaths`] value and passed down explicitly.
//! Tests and staging setups can re-root the Linux layout under any directory
//! with [`PlatformPaths::rooted`].

use std::path::{Path, PathBuf};

use crate::types::ComponentType;

/// Filesystem layout for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    /// KubeEdge base directory; also the default tarball directory.
    pub base_dir: PathBuf,
    /// Component configuration files.
    pub config_dir: PathBuf,
    /// Backups taken before upgrades.
    pub backup_dir: PathBuf,
    /// Staging area for upgrades.
    pub upgrade_dir: PathBuf,
    /// CRD manifests.
    pub crd_dir: PathBuf,
    /// Where component binaries are placed.
    pub bin_dir: PathBuf,
    /// Component log files.
    pub log_dir: PathBuf,
    /// Sockets and PID files.
    pub socket_dir: PathBuf,
    /// Root directory of the edge node runtime.
    pub edge_root_dir: PathBuf,
    /// Directory systemd loads administrator unit files from.
    pub systemd_unit_dir: PathBuf,
    /// Exists as a directory only when the host booted with systemd.
    pub systemd_boot_dir: PathBuf,
}

impl PlatformPaths {
    /// Standard Linux layout.
    pub fn linux() -> Self {
        Self::rooted(Path::new("/"))
    }

    /// Linux layout re-rooted under `root`.
    pub fn rooted(root: &Path) -> Self {
        let base_dir = root.join("etc/kubeedge");
        Self {
            config_dir: base_dir.join("config"),
            backup_dir: base_dir.join("backup"),
            upgrade_dir: base_dir.join("upgrade"),
            crd_dir: base_dir.join("crds"),
            bin_dir: root.join("usr/local/bin"),
            log_dir: root.join("var/log/kubeedge"),
            socket_dir: root.join("var/lib/kubeedge"),
            edge_root_dir: root.join("var/lib/edged"),
            systemd_unit_dir: root.join("etc/systemd/system"),
            systemd_boot_dir: root.join("run/systemd/system"),
            base_dir,
        }
    }

    /// Windows layout rooted at `C:\`.
    pub fn windows() -> Self {
        let base_dir = PathBuf::from(r"C:\etc\kubeedge");
        Self {
            config_dir: base_dir.join("config"),
            backup_dir: base_dir.join("backup"),
            upgrade_dir: base_dir.join("upgrade"),
            crd_dir: base_dir.join("crds"),
            bin_dir: PathBuf::from(r"C:\usr\local\bin"),
            log_dir: PathBuf::from(r"C:\var\log\kubeedge"),
            socket_dir: PathBuf::from(r"C:\var\lib\kubeedge"),
            edge_root_dir: PathBuf::from(r"C:\var\lib\edged"),
            systemd_unit_dir: PathBuf::from(r"C:\etc\systemd\system"),
            systemd_boot_dir: PathBuf::from(r"C:\run\systemd\system"),
            base_dir,
        }
    }

    /// Layout for the host this binary was built for.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::linux()
        }
    }

    /// Whether the host was booted with systemd (`sd_booted` semantics).
    pub fn has_systemd(&self) -> bool {
        self.systemd_boot_dir.is_dir()
    }

    /// Unit file staged next to the archives before it is linked.
    pub fn staged_unit_file(&self, component: ComponentType) -> PathBuf {
        self.base_dir.join(component.service_file_name())
    }

    /// Unit file registered with systemd.
    pub fn unit_file(&self, component: ComponentType) -> PathBuf {
        self.systemd_unit_dir.join(component.service_file_name())
    }

    /// Unit file for an arbitrary unit name (without `.service`).
    pub fn unit_file_named(&self, name: &str) -> PathBuf {
        self.systemd_unit_dir.join(format!("{}.service", name))
    }

    /// Installed binary.
    pub fn binary_path(&self, component: ComponentType) -> PathBuf {
        self.bin_dir.join(component.executable_name())
    }

    /// Log file used when running without a service manager.
    pub fn log_file(&self, component: ComponentType) -> PathBuf {
        self.log_dir.join(format!("{}.log", component.binary_name()))
    }

    /// PID file used when running without a service manager.
    pub fn pid_file(&self, component: ComponentType) -> PathBuf {
        self.socket_dir.join(format!("{}.pid", component.binary_name()))
    }
}
