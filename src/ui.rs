//! Terminal UI for rove.
//!
//! - [render]: the frame layout: header, entry list, preview pane and footer.
//! - [widgets]: modal overlays drawn on top of the layout (prompts, confirm, help,
//!   bookmarks, deep search).
//!
//! Drawing only reads the [AppState](crate::app::AppState); it never changes it.

pub mod render;
pub mod widgets;

pub use render::{list_rows, render};
