//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stderr and/or log file)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Operators (stderr, appended log file)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through dispatch logs
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
