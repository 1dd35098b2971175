//! HTML help menu.

use crate::routing::{RouteTable, RELOAD_PATH};

/// Render the route table as a plain HTML fragment.
///
/// A reload button comes first, then one line per route sorted by the full
/// rendered line. Paths and commands are written as-is.
pub fn render_menu(table: &RouteTable) -> String {
    let mut html = format!(
        "<p><a href='{}'><button>Reload routes</button></a></p>\n",
        RELOAD_PATH
    );

    if table.is_empty() {
        html.push_str("<code>No routes loaded</code>\n");
        return html;
    }

    let mut items: Vec<String> = table
        .iter()
        .map(|(path, command)| {
            format!(
                "<div><code><a href='{path}'>{path}</a> --> {command}</code></div>"
            )
        })
        .collect();
    items.sort();

    html.push_str(&items.join("\n"));
    html.push('\n');
    html
}
