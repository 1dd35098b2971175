//! webrun: run local commands from HTTP requests and stream their output.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod routing;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
