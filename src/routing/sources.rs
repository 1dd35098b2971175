//! Route sources: the route file, the environment, and the pinned `/` command.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ServerConfig;
use crate::routing::table::{config_lines, env_route_lines, RouteTable};

/// Path the pinned command-line route is bound to.
pub const PINNED_ROUTE_PATH: &str = "/";

/// A key/value environment that route lines are selected from.
pub trait EnvSource: Send + Sync {
    /// Snapshot the current variables.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn vars(&self) -> Vec<(String, String)> {
        utf8_vars(std::env::vars_os())
    }
}

/// Keep the entries whose key and value are both valid UTF-8.
///
/// `std::env::vars` panics on the first non-UTF-8 entry, even an unrelated
/// one; reading through `vars_os` and filtering skips such entries instead.
pub fn utf8_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv(pub Vec<(String, String)>);

impl EnvSource for StaticEnv {
    fn vars(&self) -> Vec<(String, String)> {
        self.0.clone()
    }
}

/// Everything a route table is rebuilt from.
pub struct RouteSources {
    config_file: PathBuf,
    env: Box<dyn EnvSource>,
    pinned_command: Option<String>,
}

impl RouteSources {
    pub fn new(config_file: impl Into<PathBuf>, env: impl EnvSource + 'static) -> Self {
        Self {
            config_file: config_file.into(),
            env: Box::new(env),
            pinned_command: None,
        }
    }

    /// Sources described by the server configuration, reading the process environment.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.config_file.clone(), ProcessEnv)
            .with_pinned_command(config.pinned_command.clone())
    }

    /// Bind a command to `/` on top of whatever the file and environment provide.
    pub fn with_pinned_command(mut self, command: Option<String>) -> Self {
        self.pinned_command = command.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Read both sources and build a fresh table.
    ///
    /// A missing or unreadable route file contributes no routes.
    pub fn load(&self) -> RouteTable {
        let file_lines = read_config_lines(&self.config_file);
        let env_lines = env_route_lines(self.env.vars());
        let mut table = RouteTable::build(file_lines, env_lines);

        if let Some(command) = &self.pinned_command {
            let tokens: Vec<&str> = command.split_whitespace().collect();
            table.insert(PINNED_ROUTE_PATH, tokens.join(" "));
        }

        table
    }
}

impl fmt::Debug for RouteSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSources")
            .field("config_file", &self.config_file)
            .field("pinned_command", &self.pinned_command)
            .finish_non_exhaustive()
    }
}

/// Read the non-blank lines of a route file, or nothing if it cannot be read.
pub fn read_config_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => config_lines(&content),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Route file not readable, using no file routes");
            Vec::new()
        }
    }
}
