//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single catch-all handler)
//!     → request.rs (request ID, percent-decoded path)
//!     → routing::route (decide Action)
//!     → process::stream | menu.rs | response.rs (redirects)
//!     → Send to client
//! ```

pub mod menu;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
