//! Thread section view.
//!
//! Keeps one thread's `section` element in sync with its [`Thread`] model:
//! renders it, moves it to the top on bump, toggles the locked marker,
//! hides it, tracks omitted replies, and tears itself down when the thread
//! is removed.
//!
//! On board pages only the most recent replies are kept. When a reply is
//! appended and the thread exceeds the abbreviation limit, the oldest
//! replies are shifted out of the thread, counted into `omit` (and
//! `image_omit` for posts with images) and deregistered from the post store.
//!
//! # Known quirks
//!
//! - `image_omit` is only ever incremented here. Nothing recomputes it if a
//!   post's image changes after it was shifted out.
//! - The omission indicator is never removed once created, even if `omit`
//!   drops back to zero; a zero `omit` simply leaves the last text in place.
//!
//! [`Thread`]: crate::model::Thread

use super::board::{Host, SharedDocument};
use super::context::{ViewContext, ViewMode};
use super::ViewError;
use crate::dom::{Document, NodeId};
use crate::model::{Subscription, ThreadEvent, ThreadHandle};
use crate::store::PostStore;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, error, trace, warn};

/// View bound to a single thread.
///
/// Dropping the view releases its subscriptions but leaves its elements in
/// the document; call [`remove`](Self::remove) (or remove the thread from
/// its registry) to excise them.
pub struct SectionView {
    state: Rc<RefCell<SectionState>>,
}

struct SectionState {
    thread: ThreadHandle,
    ctx: ViewContext,
    doc: SharedDocument,
    container: NodeId,
    node: NodeId,
    reply_box: Option<NodeId>,
    separator: Option<NodeId>,
    omit_node: Option<NodeId>,
    subscriptions: Vec<Subscription>,
    removed: bool,
}

impl SectionView {
    /// Bind a view to `thread` and render it into `host`.
    ///
    /// An empty host element gets a full render. A populated one is assumed
    /// to hold markup rendered ahead of time; only the omission indicator is
    /// rendered from the thread's current `omit`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if generated markup is malformed.
    pub fn mount(thread: ThreadHandle, host: Host, ctx: ViewContext) -> Result<Self, ViewError> {
        let populated = !host.doc.borrow().is_empty(host.element);
        let state = Rc::new(RefCell::new(SectionState {
            thread: Rc::clone(&thread),
            ctx,
            doc: host.doc,
            container: host.container,
            node: host.element,
            reply_box: None,
            separator: None,
            omit_node: None,
            subscriptions: Vec::new(),
            removed: false,
        }));

        {
            let mut state = state.borrow_mut();
            if populated {
                state.adopt_trailing_nodes();
                let omit = thread.omit();
                state.render_omit(omit)?;
            } else {
                state.render()?;
            }
            state.attach_images();
        }

        let view = Self { state };
        view.listen(&thread);
        debug!(thread = %thread.id(), hydrated = populated, "section view mounted");
        Ok(view)
    }

    fn listen(&self, thread: &ThreadHandle) {
        let weak = Rc::downgrade(&self.state);
        let lifetime = thread.subscribe(move |event| Self::handle(&weak, event));

        let weak = Rc::downgrade(&self.state);
        let first_add = thread.subscribe_once_matching(
            |event| matches!(event, ThreadEvent::Added),
            move |_| {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().render_relative_time();
                }
            },
        );

        self.state.borrow_mut().subscriptions = vec![lifetime, first_add];
    }

    fn handle(state: &Weak<RefCell<SectionState>>, event: &ThreadEvent) {
        let Some(state) = state.upgrade() else {
            return;
        };
        if let ThreadEvent::ShiftReplies { own_composer } = *event {
            // Runs unborrowed: the post store may call back into this view.
            let trim = state.borrow().trim(own_composer);
            if let Some(trim) = trim {
                trim.run();
            }
            return;
        }
        let mut state = state.borrow_mut();
        match *event {
            ThreadEvent::LockedChanged { locked } => state.render_locked(locked),
            ThreadEvent::HideChanged { hidden } => state.render_hide(hidden),
            ThreadEvent::Removed => state.remove(),
            ThreadEvent::ShiftReplies { .. } => {}
            ThreadEvent::OmitChanged { omit } => {
                if let Err(err) = state.render_omit(omit) {
                    error!(thread = %state.thread.id(), %err, "omission message is not valid markup");
                    panic!("omission message is not valid markup: {err}");
                }
            }
            ThreadEvent::Bumped => state.bump_thread(),
            ThreadEvent::Added => {}
        }
    }

    /// Excise the view's elements and release every subscription.
    /// Calling it again is a no-op.
    pub fn remove(&self) -> &Self {
        self.state.borrow_mut().remove();
        self
    }

    /// The thread this view renders.
    pub fn thread(&self) -> ThreadHandle {
        Rc::clone(&self.state.borrow().thread)
    }

    /// The thread's `section` element.
    pub fn node(&self) -> NodeId {
        self.state.borrow().node
    }

    /// Reply affordance placed after the section, if any.
    pub fn reply_box(&self) -> Option<NodeId> {
        self.state.borrow().reply_box
    }

    /// `hr` separator after the section, if any.
    pub fn separator(&self) -> Option<NodeId> {
        self.state.borrow().separator
    }

    /// The omission indicator, once rendered.
    pub fn omit_indicator(&self) -> Option<NodeId> {
        self.state.borrow().omit_node
    }

    /// Whether [`remove`](Self::remove) ran, directly or through the thread registry.
    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    /// Whether the view still receives thread events.
    pub fn is_listening(&self) -> bool {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .any(Subscription::is_active)
    }
}

impl fmt::Debug for SectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SectionView")
            .field("thread", &state.thread.id())
            .field("node", &state.node)
            .field("separator", &state.separator)
            .field("omit_node", &state.omit_node)
            .field("removed", &state.removed)
            .finish()
    }
}

impl SectionState {
    /// Full render into an empty host.
    fn render(&mut self) -> Result<(), ViewError> {
        let attrs = self.thread.attributes();
        let thread_html = self.ctx.markup.thread(&attrs);
        let reply_html = self.ctx.markup.reply_box();
        let hide_reply =
            self.ctx.page.is_own_thread(attrs.id) || self.ctx.page.is_composer_open();

        let mut doc = self.doc.borrow_mut();
        let section = single_root(&mut doc, &thread_html)?;
        let reply = single_root(&mut doc, &reply_html)?;
        let separator = doc.create_element("hr");

        // The generated element replaces the placeholder host.
        doc.remove(self.node);
        self.node = section;

        insert_to_top(&mut doc, self.container, section);
        doc.set_hidden(reply, hide_reply);
        doc.insert_after(section, reply);
        doc.insert_after(reply, separator);
        self.reply_box = Some(reply);
        self.separator = Some(separator);

        trace!(thread = %attrs.id, hide_reply, "section rendered");
        Ok(())
    }

    /// Pick up the reply box and separator that pre-rendered markup placed
    /// after the section.
    fn adopt_trailing_nodes(&mut self) {
        let doc = self.doc.borrow();
        let mut next = doc.next_sibling(self.node);
        if let Some(node) = next.filter(|&n| doc.tag(n) == Some("aside")) {
            self.reply_box = Some(node);
            next = doc.next_sibling(node);
        }
        self.separator = next.filter(|&n| doc.tag(n) == Some("hr"));
    }

    fn attach_images(&self) {
        let mut doc = self.doc.borrow_mut();
        self.ctx.images.attach(&mut doc, self.node);
    }

    /// Move the thread right below the new-thread `aside`.
    fn bump_thread(&mut self) {
        if self.removed {
            return;
        }
        let mut doc = self.doc.borrow_mut();
        doc.detach(self.node);
        insert_to_top(&mut doc, self.container, self.node);

        let mut anchor = self.node;
        for trailing in [self.reply_box, self.separator].into_iter().flatten() {
            doc.insert_after(anchor, trailing);
            anchor = trailing;
        }
        trace!(thread = %self.thread.id(), "section bumped");
    }

    fn render_locked(&mut self, locked: bool) {
        if self.removed {
            return;
        }
        self.doc
            .borrow_mut()
            .toggle_class(self.node, "locked", locked);
    }

    /// Section, reply box and separator change visibility together.
    fn render_hide(&mut self, hide: bool) {
        if self.removed {
            return;
        }
        let mut doc = self.doc.borrow_mut();
        for node in [Some(self.node), self.reply_box, self.separator]
            .into_iter()
            .flatten()
        {
            doc.set_hidden(node, hide);
        }
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        {
            let mut doc = self.doc.borrow_mut();
            for node in [Some(self.node), self.reply_box, self.separator]
                .into_iter()
                .flatten()
            {
                doc.remove(node);
            }
        }
        self.ctx.images.detach(self.node);
        // Dropping the handles unsubscribes; safe mid-dispatch.
        self.subscriptions.clear();
        debug!(thread = %self.thread.id(), "section view removed");
    }

    /// What a `ShiftReplies` event needs once the state borrow is released.
    /// `None` on thread pages and for removed views.
    fn trim(&self, own_composer: bool) -> Option<Trim> {
        if self.removed || self.ctx.mode == ViewMode::Thread {
            return None;
        }
        let mut limit = self.ctx.settings.abbreviation_limit();
        if own_composer {
            limit -= 1;
        }
        Some(Trim {
            thread: Rc::clone(&self.thread),
            posts: Rc::clone(&self.ctx.posts),
            limit,
            own_composer,
        })
    }

    /// Render the "N replies omitted" indicator. Zero is ignored.
    fn render_omit(&mut self, omit: u32) -> Result<(), ViewError> {
        if omit == 0 || self.removed {
            return Ok(());
        }

        let see_all = match self.ctx.mode {
            ViewMode::Thread => Some(strip_query(&self.ctx.page.current_url()).to_string()),
            ViewMode::Board => None,
        };
        let html =
            self.ctx
                .format
                .omission_message(omit, self.thread.image_omit(), see_all.as_deref());

        let mut doc = self.doc.borrow_mut();
        let indicator = match self.omit_node {
            Some(node) => node,
            None => {
                let span = doc.create_element("span");
                doc.toggle_class(span, "omit", true);
                match doc.find_child(self.node, "blockquote") {
                    Some(quote) => doc.insert_after(quote, span),
                    None => doc.append_child(self.node, span),
                }
                self.omit_node = Some(span);
                span
            }
        };
        doc.set_inner_html(indicator, &html)?;
        trace!(thread = %self.thread.id(), omit, "omission indicator rendered");
        Ok(())
    }

    /// Replace the text of every `time[datetime]` with a relative form.
    fn render_relative_time(&mut self) {
        if self.removed {
            return;
        }
        let now = self.ctx.clock.now();
        let mut doc = self.doc.borrow_mut();
        for time in doc.descendants_by_tag(self.node, "time") {
            let Some(raw) = doc.attribute(time, "datetime").map(str::to_string) else {
                continue;
            };
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(stamp) => {
                    let text = self
                        .ctx
                        .format
                        .relative_time(stamp.with_timezone(&Utc), now);
                    doc.set_text(time, &text);
                }
                Err(err) => warn!(datetime = %raw, %err, "unparseable timestamp left as is"),
            }
        }
    }
}

/// Reply truncation for one `ShiftReplies` event. Board pages only.
///
/// Holds neither the view state nor the document: deregistering a post may
/// tear down this view or others synchronously.
struct Trim {
    thread: ThreadHandle,
    posts: Rc<dyn PostStore>,
    limit: i64,
    own_composer: bool,
}

impl Trim {
    fn run(self) {
        let Self {
            thread,
            posts,
            limit,
            own_composer,
        } = self;

        let mut shifted = 0_u32;
        while i64::try_from(thread.reply_count()).unwrap_or(i64::MAX) > limit {
            let Some(id) = thread.shift_reply() else {
                break;
            };
            let Some(post) = posts.lookup(id) else {
                warn!(thread = %thread.id(), post = %id, "shifted reply missing from post store");
                continue;
            };
            if post.has_image {
                thread.increment_image_omit();
            }
            thread.set_omit(thread.omit().saturating_add(1));
            posts.remove(id);
            shifted += 1;
        }

        debug!(
            thread = %thread.id(),
            limit,
            own_composer,
            shifted,
            omit = thread.omit(),
            image_omit = thread.image_omit(),
            "replies shifted"
        );
    }
}

/// Parse `html` and return its only root element.
fn single_root(doc: &mut Document, html: &str) -> Result<NodeId, ViewError> {
    let roots = doc.parse_fragment(html)?;
    match roots.as_slice() {
        [root] if doc.tag(*root).is_some() => Ok(*root),
        _ => Err(ViewError::RootCount { count: roots.len() }),
    }
}

/// Insert right after the container's first `aside`, or first if it has none.
fn insert_to_top(doc: &mut Document, container: NodeId, node: NodeId) {
    match doc.find_child(container, "aside") {
        Some(aside) => doc.insert_after(aside, node),
        None => doc.insert_first(container, node),
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
#[path = "section_tests.rs"]
mod tests;
