//! Route table construction.
//!
//! # Responsibilities
//! - Parse raw `<path> <command tokens...>` lines
//! - Merge the file pool and the environment pool into one table
//!
//! # Merge order
//! Each pool is sorted lexicographically (byte order) by its raw line text
//! and applied in that order, file pool first, environment pool second. A
//! later entry overwrites an earlier one for the same path, so:
//! - environment routes always win over file routes for a shared path
//! - within a pool, the duplicate whose *full line* sorts last wins, which is
//!   neither "most specific" nor "most recently read"
//!
//! For a fixed set of raw lines the resulting table never depends on the
//! order the sources were read in.
//!
//! # Malformed lines
//! Blank lines, lines whose first token does not start with `/`, and lines
//! with no command token after the path are skipped. A skipped line never
//! overwrites an existing entry.

use std::collections::HashMap;

/// Prefix of environment variables carrying route lines (`WEBRUN_ROUTE_<digits>`).
pub const ROUTE_ENV_PREFIX: &str = "WEBRUN_ROUTE_";

/// Mapping from request path to command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the file pool and then the environment pool into a new table.
    pub fn build(file_lines: Vec<String>, env_lines: Vec<String>) -> Self {
        let mut table = Self::new();
        table.apply_pool(file_lines);
        table.apply_pool(env_lines);
        table
    }

    /// Sort a pool of raw lines and apply it in order.
    pub fn apply_pool(&mut self, mut lines: Vec<String>) {
        lines.sort();
        for line in &lines {
            if let Some((path, command)) = parse_route_line(line) {
                self.routes.insert(path, command);
            }
        }
    }

    /// Bind a path to a command, replacing any existing binding.
    pub fn insert(&mut self, path: impl Into<String>, command: impl Into<String>) {
        self.routes.insert(path.into(), command.into());
    }

    /// Look up the command bound to a path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over `(path, command)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for RouteTable {
    fn from_iter<T: IntoIterator<Item = (P, C)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (path, command) in iter {
            table.insert(path, command);
        }
        table
    }
}

/// Split a raw route line into `(path, command)`.
///
/// Tokens are separated by whitespace; the command keeps its tokens joined by
/// single spaces. Returns `None` for malformed lines.
pub fn parse_route_line(line: &str) -> Option<(String, String)> {
    let mut tokens = line.split_whitespace();
    let path = tokens.next()?;
    if !path.starts_with('/') {
        return None;
    }

    let command = tokens.collect::<Vec<_>>().join(" ");
    if command.is_empty() {
        return None;
    }

    Some((path.to_string(), command))
}

/// Whether an environment key names a route (`WEBRUN_ROUTE_` followed by digits only).
pub fn is_route_env_key(key: &str) -> bool {
    key.strip_prefix(ROUTE_ENV_PREFIX)
        .map(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Select the route lines from an environment snapshot.
pub fn env_route_lines<I>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(key, _)| is_route_env_key(key))
        .map(|(_, value)| value)
        .collect()
}

/// Split file content into non-blank raw lines.
pub fn config_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
