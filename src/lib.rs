//! rxkcd - shows the newest xkcd strip, or a pinned one, in the terminal.

pub mod app;
pub mod attributes;
pub mod comic;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod selection;
pub mod ui;

pub use comic::{Comic, ComicId};
pub use error::ComicError;
pub use reconcile::{Applied, Reconciler, View};
pub use selection::{Mode, SelectionState};
