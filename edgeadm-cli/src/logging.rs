//! Tracing setup for the `edgeadm` binary.
//!
//! Console output goes to stderr. When the log directory can be created a
//! second, non-blocking layer appends to `{log_dir}/edgeadm.log`.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file written inside the log directory.
pub const LOG_FILE_NAME: &str = "edgeadm.log";

/// Filter used when `RUST_LOG` is not set.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "edgeadm=debug,edgeadm_cli=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// The returned guard must be held until exit so buffered file output is
/// flushed.
pub fn init(verbose: bool, log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let (file_layer, guard) = match file_writer(log_dir) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

fn file_writer(log_dir: &Path) -> Option<RollingFileAppender> {
    fs::create_dir_all(log_dir).ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(log_dir)
        .ok()
}
