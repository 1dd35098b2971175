//! webrun
//!
//! Serves a table of local commands over HTTP. A request path that matches a
//! route runs its command and streams the output back as it is produced.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                        WEBRUN                        │
//!                    │                                                      │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ routing  │───▶│    process     │   │
//!                    │  │ server  │    │  router  │    │    streamer    │   │
//!                    │  └─────────┘    └────┬─────┘    └───────┬────────┘   │
//!                    │                      │                  │            │
//!                    │                      ▼                  ▼            │
//!                    │               ┌─────────────┐    ┌─────────────┐     │
//!   Live Output      │               │ route table │    │    child    │     │
//!   ◀────────────────┼───────────────│  (ArcSwap)  │    │   process   │     │
//!                    │               └──────▲──────┘    └─────────────┘     │
//!                    │                      │                               │
//!                    │      /reload, SIGHUP, file watcher (rebuild + swap)  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use webrun::config::{load_config, RouteWatcher};
use webrun::lifecycle::{signals, Shutdown};
use webrun::observability::logging::{init_logging, LogTargets};
use webrun::observability::metrics;
use webrun::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();

    init_logging(LogTargets::new(config.silent, config.log_file.as_deref()));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "webrun starting");

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(&config);
    let routes = server.routes();
    let table = routes.current();
    let mut loaded: Vec<String> = table.iter().map(|(p, c)| format!("{} --> {}", p, c)).collect();
    loaded.sort();
    tracing::info!(count = table.len(), routes = ?loaded, "Routes loaded");

    if config.god_mode {
        tracing::warn!("God mode enabled: any unmatched request path is executed as a command");
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_shutdown_on_signal(shutdown.clone());
    signals::spawn_reload_on_hangup(routes.clone(), &shutdown);

    let _watcher = if config.watch {
        match RouteWatcher::new(&config.config_file, routes.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(error = %e, "Route file watcher disabled");
                None
            }
        }
    } else {
        None
    };

    let listener = match HttpServer::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Cannot listen, exiting");
            std::process::exit(1);
        }
    };
    tracing::info!(
        url = %format!("http://{}", listener.local_addr()?),
        menu = %config.menu_path,
        "Server started"
    );

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
