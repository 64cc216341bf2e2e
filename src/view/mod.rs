//! View layer: the thread section view and its collaborators.
//!
//! # Module Structure
//!
//! - `section`: SectionView - keeps one thread's element in sync with its model
//! - `board`: Board / Host - thread list container and render targets
//! - `context`: collaborator traits, ViewMode, ViewContext
//! - `markup`: HtmlMarkup - default markup generator
//! - `format`: EnglishFormatter - omission message and relative times
//! - `images`: ImageCapability - image handling composed into views

pub mod board;
pub mod context;
pub mod format;
pub mod images;
pub mod markup;
pub mod section;

pub use board::{Board, Host, SharedDocument};
pub use context::{
    Clock, FixedClock, Formatter, MarkupGenerator, Page, PageContext, SettingsProvider,
    SystemClock, ViewContext, ViewMode,
};
pub use format::EnglishFormatter;
pub use images::{ImageCapability, LazyImages, NoImages};
pub use markup::HtmlMarkup;
pub use section::SectionView;

use crate::dom::MarkupError;
use thiserror::Error;

/// A view could not be rendered.
///
/// Generated markup is trusted input; these errors mean a collaborator broke
/// its contract and are not expected to be recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Markup could not be parsed.
    #[error("Generated markup is malformed: {0}")]
    Markup(#[from] MarkupError),

    /// Markup must have exactly one root element.
    #[error("Generated markup must have exactly one root element, found {count} root nodes")]
    RootCount {
        /// Top-level nodes found.
        count: usize,
    },
}
