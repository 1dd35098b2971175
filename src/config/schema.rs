//! Configuration schema definitions.
//!
//! `ServerConfig` is the resolved, plain-value configuration handed to every
//! subsystem. It is produced by `loader.rs` from command-line flags and
//! `WEBRUN_*` environment overrides and never changes after startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Route file read when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "webrun.config";

/// Path serving the help menu when no `--menu` is given.
pub const DEFAULT_MENU_PATH: &str = "/menu";

/// Listening port when no `--port` is given.
pub const DEFAULT_PORT: u16 = 8080;

/// Root configuration for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Line-oriented route file (`<path> <command tokens>` per line).
    pub config_file: PathBuf,

    /// Execute unmatched request paths as commands.
    pub god_mode: bool,

    /// Optional file that log output is appended to.
    pub log_file: Option<PathBuf>,

    /// Path serving the HTML help menu. Always starts with `/`.
    pub menu_path: String,

    /// Listening port, fixed for the process lifetime.
    pub port: u16,

    /// Suppress log output on stderr.
    pub silent: bool,

    /// Forward the child's stderr after its stdout.
    pub show_errors: bool,

    /// Rebuild the route table when the route file changes on disk.
    pub watch: bool,

    /// Prometheus exporter address. Metrics are not exported when unset.
    pub metrics_address: Option<SocketAddr>,

    /// Per-dispatch deadline in seconds. Zero disables the deadline.
    pub timeout_secs: u64,

    /// Command bound to `/` from trailing command-line words.
    pub pinned_command: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            god_mode: false,
            log_file: None,
            menu_path: DEFAULT_MENU_PATH.to_string(),
            port: DEFAULT_PORT,
            silent: false,
            show_errors: false,
            watch: false,
            metrics_address: None,
            timeout_secs: 0,
            pinned_command: None,
        }
    }
}

impl ServerConfig {
    /// Address the listener binds to (all interfaces).
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }

    /// Whether dispatched commands also stream their stderr.
    ///
    /// God mode always shows errors, since the caller typed the command.
    pub fn include_stderr(&self) -> bool {
        self.show_errors || self.god_mode
    }

    /// Deadline applied to each dispatched child, if any.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Ensure a menu path starts with a single leading slash.
pub fn normalize_menu_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
