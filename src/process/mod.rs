//! Local process execution.
//!
//! # Data Flow
//! ```text
//! command line (from a route or a god-mode path)
//!     → command.rs (whitespace tokenizer, no shell)
//!     → streamer.rs (spawn, pump stdout/stderr into body frames)
//!     → streaming HTTP response
//! ```

pub mod command;
pub mod streamer;

pub use command::CommandLine;
pub use streamer::{spawn, stream, ChildOutput, StreamError, StreamOptions};
