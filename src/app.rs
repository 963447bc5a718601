//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the view, cursors, filter
//! and prompt state of the terminal UI.

mod model;

pub use model::*;
