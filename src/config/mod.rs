//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags
//!     → loader.rs (clap parse)
//!     → WEBRUN_* environment overrides (win over flags)
//!     → ServerConfig (plain values, fixed for the process lifetime)
//!
//! Route file (separate from the server settings):
//!     read by routing::sources at startup and on every reload
//!     watcher.rs rebuilds the route table when it changes (--watch)
//! ```

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_config, load_config_from, Cli};
pub use schema::ServerConfig;
pub use watcher::RouteWatcher;
