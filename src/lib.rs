//! Thread section view.
//!
//! Keeps a thread's rendered section in sync with its model on a board or
//! thread page: bumping, locking, hiding, removal, and abbreviation of the
//! reply list with an "N replies omitted" indicator.
//!
//! The view layer renders into an in-memory [`dom::Document`]. The `replay`
//! module and the `section-view` binary drive it from JSON scripts.

pub mod config;
pub mod dom;
pub mod logging;
pub mod model;
pub mod replay;
pub mod store;
pub mod view;
