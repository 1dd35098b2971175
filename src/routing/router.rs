//! Request routing decisions.
//!
//! # Decision order
//! First match wins:
//! 1. `/favicon.ico` → `Ignore`
//! 2. path bound in the table to a non-empty command → `Dispatch`
//! 3. `/reload` → `Reload`
//! 4. the configured menu path → `ShowMenu`
//! 5. god mode and a non-empty path after the leading slash → `GodDispatch`
//! 6. anything else → `RedirectToMenu`
//!
//! Table routes are checked before `/reload` and the menu path, so a route
//! file can shadow both. `/favicon.ico` cannot be shadowed.

use crate::routing::table::RouteTable;

/// Path browsers request for the site icon.
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Path that rebuilds the route table.
pub const RELOAD_PATH: &str = "/reload";

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Answer with an empty 200.
    Ignore,
    /// Run a command bound in the route table.
    Dispatch(String),
    /// Rebuild the route table, then redirect to the menu.
    Reload,
    /// Render the help menu.
    ShowMenu,
    /// Run the request path itself as a command.
    GodDispatch(String),
    /// 303 to the menu path.
    RedirectToMenu,
}

impl Action {
    /// Short label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Ignore => "ignore",
            Action::Dispatch(_) => "dispatch",
            Action::Reload => "reload",
            Action::ShowMenu => "menu",
            Action::GodDispatch(_) => "god_dispatch",
            Action::RedirectToMenu => "redirect",
        }
    }

    /// The command line to run, for dispatching actions.
    pub fn command(&self) -> Option<&str> {
        match self {
            Action::Dispatch(command) | Action::GodDispatch(command) => Some(command),
            _ => None,
        }
    }
}

/// Decide how to handle a (percent-decoded) request path.
pub fn route(path: &str, table: &RouteTable, god_mode: bool, menu_path: &str) -> Action {
    if path == FAVICON_PATH {
        return Action::Ignore;
    }

    if let Some(command) = table.get(path).filter(|c| !c.trim().is_empty()) {
        return Action::Dispatch(command.to_string());
    }

    if path == RELOAD_PATH {
        return Action::Reload;
    }

    if path == menu_path {
        return Action::ShowMenu;
    }

    if god_mode {
        let command = path.strip_prefix('/').unwrap_or(path);
        if !command.is_empty() {
            return Action::GodDispatch(command.to_string());
        }
    }

    Action::RedirectToMenu
}
