//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;
use webrun::routing::{RouteSources, RouteState, StaticEnv};
use webrun::{HttpServer, ServerConfig, Shutdown};

/// A running server on a loopback port, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub config_path: PathBuf,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Replace the route file contents.
    #[allow(dead_code)]
    pub fn write_routes(&self, lines: &[&str]) {
        std::fs::write(&self.config_path, lines.join("\n")).unwrap();
    }

    /// Write a shell script into the server's temp dir and return its path.
    #[allow(dead_code)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        write_script(self.dir.path(), name, body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with the given route file lines and no environment routes.
#[allow(dead_code)]
pub async fn start_server(routes: &[&str], config: ServerConfig) -> TestServer {
    start_server_with_env(routes, Vec::new(), config).await
}

/// Start a server with route file lines and a fixed environment.
#[allow(dead_code)]
pub async fn start_server_with_env(
    routes: &[&str],
    env: Vec<(&str, &str)>,
    mut config: ServerConfig,
) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("webrun.config");
    std::fs::write(&config_path, routes.join("\n")).unwrap();
    config.config_file = config_path.clone();

    let env = StaticEnv(
        env.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    let sources = RouteSources::new(&config_path, env).with_pinned_command(config.pinned_command.clone());
    let server = HttpServer::with_routes(&config, Arc::new(RouteState::load(sources)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        dir,
        config_path,
        shutdown,
    }
}

/// A client that neither follows redirects nor uses a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Write a shell script run as `sh <path>`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}
