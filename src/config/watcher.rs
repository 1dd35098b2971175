//! Route file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by replacing the file (write to temp, rename over) keep
//! triggering reloads, and a route file created after startup is picked up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::routing::RouteState;

/// Error starting the watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Rebuilds the route table whenever the route file changes.
pub struct RouteWatcher {
    path: PathBuf,
    routes: Arc<RouteState>,
}

impl RouteWatcher {
    pub fn new(path: &Path, routes: Arc<RouteState>) -> Self {
        Self {
            path: path.to_path_buf(),
            routes,
        }
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, WatchError> {
        let dir = watch_dir(&self.path);
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let routes = self.routes;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant && touches_file {
                        tracing::info!(kind = ?event.kind, "Route file change detected, reloading...");
                        routes.reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|source| WatchError::Notify {
            path: dir.clone(),
            source,
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: dir.clone(),
                source,
            })?;

        tracing::info!(path = ?self.path, "Route file watcher started");
        Ok(watcher)
    }
}

/// Directory containing the route file; `.` for bare file names.
fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
