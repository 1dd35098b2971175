//! Process-wide route table cell.
//!
//! The table is built once at startup and replaced wholesale on reload. A
//! rebuild happens off to the side and is swapped in with `ArcSwap`, so a
//! request always sees either the old or the new table, never a partial one,
//! and never waits for a rebuild. A dispatch that already loaded the old table
//! keeps its `Arc` and runs to completion unaffected.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::observability::metrics;
use crate::routing::sources::RouteSources;
use crate::routing::table::RouteTable;

#[derive(Debug)]
pub struct RouteState {
    table: ArcSwap<RouteTable>,
    sources: RouteSources,
}

impl RouteState {
    /// Build the initial table from the sources.
    pub fn load(sources: RouteSources) -> Self {
        let table = sources.load();
        metrics::set_route_count(table.len());
        Self {
            table: ArcSwap::from_pointee(table),
            sources,
        }
    }

    /// The table currently in effect.
    pub fn current(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Rebuild from the sources and swap the result in.
    pub fn reload(&self) -> Arc<RouteTable> {
        let table = Arc::new(self.sources.load());
        self.table.store(Arc::clone(&table));

        metrics::set_route_count(table.len());
        tracing::info!(
            routes = table.len(),
            config_file = %self.sources.config_file().display(),
            "Route table reloaded"
        );
        table
    }

    /// Rebuild on Tokio's blocking pool so the route file read never stalls an
    /// async worker. Returns `None` if the rebuild task panicked; the previous
    /// table then stays in effect.
    pub async fn reload_blocking(self: Arc<Self>) -> Option<Arc<RouteTable>> {
        match tokio::task::spawn_blocking(move || self.reload()).await {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::error!(error = %e, "Route reload task failed, keeping previous table");
                None
            }
        }
    }

    pub fn sources(&self) -> &RouteSources {
        &self.sources
    }
}
