//! Optional debug trace.
//!
//! Stdout belongs to the editor channel, so nothing is logged unless the
//! debug switch is on, and then only to `sved_<pid>.log`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogOptions;

pub fn log_file_name(pid: u32) -> String {
    format!("sved_{}.log", pid)
}

pub fn log_path(dir: &Path, pid: u32) -> PathBuf {
    dir.join(log_file_name(pid))
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env("SVED_LOG").unwrap_or_else(|_| EnvFilter::new("debug"))
}

/// Install the file subscriber. Keep the guard alive until exit so the
/// writer thread flushes.
pub fn init(options: &LogOptions) -> Option<WorkerGuard> {
    if !options.enabled {
        return None;
    }

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_name(std::process::id()))
        .build(&options.dir)
        .ok()?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::registry()
        .with(log_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init();

    if installed.is_err() {
        return None;
    }
    tracing::debug!(
        "tracing to {}",
        log_path(&options.dir, std::process::id()).display()
    );
    Some(guard)
}
