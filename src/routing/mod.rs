//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route file lines ─┐
//!                   ├→ table.rs (sort each pool, apply file then env)
//! WEBRUN_ROUTE_<n> ─┘        → RouteTable
//!                            → state.rs (ArcSwap, replaced on reload)
//!
//! Incoming request path
//!     → router.rs (favicon / route / reload / menu / god mode / redirect)
//!     → Action
//! ```
//!
//! # Design Decisions
//! - Exact path matches only, no prefixes or patterns
//! - Deterministic: the same raw lines always build the same table
//! - Rebuilds are wholesale; readers never see a partial table

pub mod router;
pub mod sources;
pub mod state;
pub mod table;

pub use router::{route, Action, FAVICON_PATH, RELOAD_PATH};
pub use sources::{utf8_vars, EnvSource, ProcessEnv, RouteSources, StaticEnv};
pub use state::RouteState;
pub use table::RouteTable;
