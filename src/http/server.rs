//! HTTP server setup and the catch-all dispatch handler.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing)
//! - Resolve each request to an `Action` against the current route table
//! - Hand dispatches to the process streamer
//!
//! No request timeout layer is installed: responses stay open for as long as
//! the child keeps its stdout open, unless a dispatch deadline is configured.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::menu::render_menu;
use crate::http::request::{decode_path, request_id, MakeRequestUuid};
use crate::http::response::redirect_to_menu;
use crate::observability::metrics;
use crate::process::{self, StreamOptions};
use crate::routing::{route, Action, RouteSources, RouteState};

/// Errors from binding or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteState>,
    pub god_mode: bool,
    pub menu_path: Arc<str>,
    pub stream_options: StreamOptions,
}

impl AppState {
    pub fn new(config: &ServerConfig, routes: Arc<RouteState>) -> Self {
        Self {
            routes,
            god_mode: config.god_mode,
            menu_path: Arc::from(config.menu_path.as_str()),
            stream_options: StreamOptions {
                include_stderr: config.include_stderr(),
                deadline: config.dispatch_timeout(),
            },
        }
    }
}

/// HTTP server exposing the route table.
pub struct HttpServer {
    router: Router,
    routes: Arc<RouteState>,
}

impl HttpServer {
    /// Create a server, loading routes from the configured file and the process environment.
    pub fn new(config: &ServerConfig) -> Self {
        let routes = Arc::new(RouteState::load(RouteSources::from_config(config)));
        Self::with_routes(config, routes)
    }

    /// Create a server around an existing route state.
    pub fn with_routes(config: &ServerConfig, routes: Arc<RouteState>) -> Self {
        let state = AppState::new(config, Arc::clone(&routes));
        Self {
            router: Self::build_router(state),
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Shared route state, for reload triggers outside HTTP.
    pub fn routes(&self) -> Arc<RouteState> {
        Arc::clone(&self.routes)
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: route the path, then act on the decision.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(request.headers()).to_string();
    let path = decode_path(request.uri().path());

    let table = state.routes.current();
    let action = route(&path, &table, state.god_mode, &state.menu_path);
    metrics::record_request(action.name());

    match action {
        Action::Ignore => {
            tracing::trace!(request_id = %request_id, path = %path, "Ignoring request");
            StatusCode::OK.into_response()
        }
        Action::Dispatch(command) => {
            tracing::info!(
                request_id = %request_id,
                path = %path,
                command = ?command.split_whitespace().collect::<Vec<_>>(),
                "--> dispatching route"
            );
            process::stream(&command, state.stream_options)
        }
        Action::Reload => {
            tracing::info!(request_id = %request_id, path = %path, "~~> reloading routes");
            Arc::clone(&state.routes).reload_blocking().await;
            redirect_to_menu(&state.menu_path)
        }
        Action::ShowMenu => {
            tracing::info!(request_id = %request_id, path = %path, "~~> showing help menu");
            Html(render_menu(&table)).into_response()
        }
        Action::GodDispatch(command) => {
            tracing::warn!(
                request_id = %request_id,
                path = %path,
                command = ?command.split_whitespace().collect::<Vec<_>>(),
                "==> god mode dispatch"
            );
            process::stream(&command, state.stream_options)
        }
        Action::RedirectToMenu => {
            tracing::info!(
                request_id = %request_id,
                path = %path,
                menu = %state.menu_path,
                "~~> redirecting to menu"
            );
            redirect_to_menu(&state.menu_path)
        }
    }
}
