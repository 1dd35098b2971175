//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Log to stderr unless silent
//! - Append to a log file when one is configured
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Log level configurable via `RUST_LOG`, default `webrun=info`
//! - A log file that cannot be opened is reported and otherwise ignored

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "webrun=info,tower_http=info";

/// Where log output goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTargets<'a> {
    pub stderr: bool,
    pub file: Option<&'a Path>,
}

impl<'a> LogTargets<'a> {
    pub fn new(silent: bool, file: Option<&'a Path>) -> Self {
        Self {
            stderr: !silent,
            file,
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(targets: LogTargets<'_>) {
    let opened = targets.file.map(|path| (path, open_log_file(path)));
    let (file, open_error) = match opened {
        Some((_, Ok(file))) => (Some(file), None),
        Some((path, Err(e))) => (None, Some((path, e))),
        None => (None, None),
    };

    let stderr_layer = targets
        .stderr
        .then(|| fmt::layer().with_writer(std::io::stderr));
    let file_layer = file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if let Some((path, e)) = open_error {
        tracing::warn!(path = %path.display(), error = %e, "Cannot open log file, not logging to it");
    }
    if !installed {
        tracing::debug!("Logging already initialized");
    }
}

/// Open a log file for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_targets() {
        let path = Path::new("/tmp/webrun.log");
        let targets = LogTargets::new(true, Some(path));
        assert!(!targets.stderr);
        assert_eq!(targets.file, Some(path));
        assert!(LogTargets::new(false, None).stderr);
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webrun.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_in_missing_dir_fails() {
        assert!(open_log_file(Path::new("/definitely/not/here/webrun.log")).is_err());
    }

    #[test]
    fn test_init_idempotent() {
        init_logging(LogTargets::new(true, None));
        init_logging(LogTargets::new(true, None));
    }
}
