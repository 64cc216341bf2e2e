//! Collaborators injected into a section view.
//!
//! Everything the view needs from the outside world arrives through
//! [`ViewContext`]: markup generation, the post store, page state, settings,
//! formatting, image handling and a clock. Nothing is read from globals.

use super::format::EnglishFormatter;
use super::images::{ImageCapability, NoImages};
use super::markup::HtmlMarkup;
use crate::model::{PostId, ThreadAttributes};
use crate::store::{OwnPosts, PostStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Which kind of page the view lives on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Board index: many threads, replies abbreviated.
    #[default]
    Board,
    /// Single-thread page: full reply history, never truncated.
    Thread,
}

/// Turns model attributes into markup.
pub trait MarkupGenerator {
    /// Markup of a whole thread. Must have exactly one root element.
    fn thread(&self, attrs: &ThreadAttributes) -> String;

    /// Markup of the reply affordance placed after a thread.
    fn reply_box(&self) -> String;
}

/// Read-only page state.
pub trait PageContext {
    /// URL of the page being viewed.
    fn current_url(&self) -> String;
    /// Whether the viewer started thread `id`.
    fn is_own_thread(&self, id: PostId) -> bool;
    /// Whether the viewer's reply form is open.
    fn is_composer_open(&self) -> bool;
}

/// Page-level configuration.
pub trait SettingsProvider {
    /// Number of most recent replies shown per thread on board pages.
    /// Zero or negative values hide every reply.
    fn abbreviation_limit(&self) -> i64;
}

/// Human-readable formatting routines.
pub trait Formatter {
    /// Human-readable distance from `time` to `now`, such as `5 minutes ago`.
    fn relative_time(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> String;

    /// Markup for the omitted-replies indicator.
    fn omission_message(&self, omit: u32, image_omit: u32, see_all: Option<&str>) -> String;
}

/// Source of the current time.
pub trait Clock {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory [`PageContext`].
#[derive(Debug)]
pub struct Page {
    url: RefCell<String>,
    own_posts: Rc<OwnPosts>,
    composer_open: Cell<bool>,
}

impl Page {
    /// Page at `url` with no composer open.
    pub fn new(url: impl Into<String>, own_posts: Rc<OwnPosts>) -> Self {
        Self {
            url: RefCell::new(url.into()),
            own_posts,
            composer_open: Cell::new(false),
        }
    }

    /// Navigate to `url`.
    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.borrow_mut() = url.into();
    }

    /// Open or close the viewer's reply form.
    pub fn set_composer_open(&self, open: bool) {
        self.composer_open.set(open);
    }
}

impl PageContext for Page {
    fn current_url(&self) -> String {
        self.url.borrow().clone()
    }

    fn is_own_thread(&self, id: PostId) -> bool {
        self.own_posts.contains(id)
    }

    fn is_composer_open(&self) -> bool {
        self.composer_open.get()
    }
}

/// Bundle of collaborators shared by every view on a page.
#[derive(Clone)]
pub struct ViewContext {
    /// Page kind.
    pub mode: ViewMode,
    /// Markup generator.
    pub markup: Rc<dyn MarkupGenerator>,
    /// Reply post store.
    pub posts: Rc<dyn PostStore>,
    /// Page state.
    pub page: Rc<dyn PageContext>,
    /// Page-level settings.
    pub settings: Rc<dyn SettingsProvider>,
    /// Text formatting.
    pub format: Rc<dyn Formatter>,
    /// Image handling composed into every view.
    pub images: Rc<dyn ImageCapability>,
    /// Time source for relative times.
    pub clock: Rc<dyn Clock>,
}

impl ViewContext {
    /// Context with the default markup, formatter, clock and no image
    /// handling.
    pub fn new(
        mode: ViewMode,
        posts: Rc<dyn PostStore>,
        page: Rc<dyn PageContext>,
        settings: Rc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            mode,
            markup: Rc::new(HtmlMarkup),
            posts,
            page,
            settings,
            format: Rc::new(EnglishFormatter),
            images: Rc::new(NoImages),
            clock: Rc::new(SystemClock),
        }
    }

    /// Replace the markup generator.
    pub fn with_markup(mut self, markup: Rc<dyn MarkupGenerator>) -> Self {
        self.markup = markup;
        self
    }

    /// Replace the formatter.
    pub fn with_formatter(mut self, format: Rc<dyn Formatter>) -> Self {
        self.format = format;
        self
    }

    /// Replace the image handling.
    pub fn with_images(mut self, images: Rc<dyn ImageCapability>) -> Self {
        self.images = images;
        self
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("mode", &self.mode)
            .field("url", &self.page.current_url())
            .field("limit", &self.settings.abbreviation_limit())
            .finish_non_exhaustive()
    }
}
