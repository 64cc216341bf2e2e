//! Thread model with change events.
//!
//! A [`Thread`] is shared (`Rc`) between the registry that owns it and the
//! views bound to it. All mutation goes through `&self` methods that raise a
//! [`ThreadEvent`] on the thread's channel.

use super::event::{EventChannel, Subscription};
use super::identifiers::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// Shared handle to a thread model.
pub type ThreadHandle = Rc<Thread>;

/// Cross-reference map passed through to the markup generator untouched:
/// quoted post number -> number of the thread that post belongs to.
pub type Links = BTreeMap<PostId, PostId>;

/// Events raised by a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadEvent {
    /// The thread was added to a tracked collection.
    Added,
    /// The thread was removed from its collection.
    Removed,
    /// The lock flag changed.
    LockedChanged {
        /// New value.
        locked: bool,
    },
    /// The hide flag changed.
    HideChanged {
        /// New value.
        hidden: bool,
    },
    /// The omitted-reply count changed.
    OmitChanged {
        /// New count.
        omit: u32,
    },
    /// A reply was appended; `own_composer` is set when it came from the
    /// viewer's own open reply form.
    ShiftReplies {
        /// The reply came from the viewer's open reply form.
        own_composer: bool,
    },
    /// The thread received activity and should move to the top of the list.
    Bumped,
}

/// Full attribute set of a thread, as handed to the markup generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadAttributes {
    /// Number of the opening post.
    pub id: PostId,
    /// Subject line, if any.
    #[serde(default)]
    pub subject: Option<String>,
    /// Body text of the opening post.
    #[serde(default)]
    pub body: String,
    /// Creation time of the opening post.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// File name of the opening post's image, if any.
    #[serde(default)]
    pub image: Option<String>,
    /// Reply post IDs shown in this view of the thread.
    #[serde(default)]
    pub replies: VecDeque<PostId>,
    /// Replies dropped from this page's view of the thread.
    #[serde(default)]
    pub omit: u32,
    /// How many of the omitted replies carried images.
    #[serde(default)]
    pub image_omit: u32,
    /// Whether the thread is locked.
    #[serde(default)]
    pub locked: bool,
    /// Whether the viewer hid the thread.
    #[serde(default)]
    pub hidden: bool,
    /// Reply links from the opening post.
    #[serde(default)]
    pub links: Links,
}

impl ThreadAttributes {
    /// Attributes of an empty thread opened by post `id`.
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            subject: None,
            body: String::new(),
            time: None,
            image: None,
            replies: VecDeque::new(),
            omit: 0,
            image_omit: 0,
            locked: false,
            hidden: false,
            links: Links::new(),
        }
    }

    /// Set the subject line.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the creation time.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the opening post's image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Replace the reply list, oldest first.
    pub fn with_replies(mut self, replies: impl IntoIterator<Item = PostId>) -> Self {
        self.replies = replies.into_iter().collect();
        self
    }

    /// Set the omitted-reply counters.
    pub fn with_omit(mut self, omit: u32, image_omit: u32) -> Self {
        self.omit = omit;
        self.image_omit = image_omit;
        self
    }

    /// Set the lock flag.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

/// Mutable thread model.
#[derive(Debug)]
pub struct Thread {
    attrs: RefCell<ThreadAttributes>,
    events: EventChannel<ThreadEvent>,
}

impl Thread {
    /// Wrap `attrs` in a shareable model.
    pub fn new(attrs: ThreadAttributes) -> ThreadHandle {
        Rc::new(Self {
            attrs: RefCell::new(attrs),
            events: EventChannel::new(),
        })
    }

    /// Number of the opening post.
    pub fn id(&self) -> PostId {
        self.attrs.borrow().id
    }

    /// Snapshot of every attribute.
    pub fn attributes(&self) -> ThreadAttributes {
        self.attrs.borrow().clone()
    }

    /// Reply ids, oldest first.
    pub fn replies(&self) -> Vec<PostId> {
        self.attrs.borrow().replies.iter().copied().collect()
    }

    /// Number of replies currently in the thread.
    pub fn reply_count(&self) -> usize {
        self.attrs.borrow().replies.len()
    }

    /// Replies omitted so far.
    pub fn omit(&self) -> u32 {
        self.attrs.borrow().omit
    }

    /// Image-bearing replies omitted so far.
    pub fn image_omit(&self) -> u32 {
        self.attrs.borrow().image_omit
    }

    /// Whether the thread is locked.
    pub fn locked(&self) -> bool {
        self.attrs.borrow().locked
    }

    /// Whether the thread is hidden.
    pub fn hidden(&self) -> bool {
        self.attrs.borrow().hidden
    }

    /// Reply links from the opening post.
    pub fn links(&self) -> Links {
        self.attrs.borrow().links.clone()
    }

    /// Subscribe to every event raised by this thread.
    pub fn subscribe(&self, handler: impl Fn(&ThreadEvent) + 'static) -> Subscription {
        self.events.subscribe(handler)
    }

    /// Subscribe to the next event only.
    pub fn subscribe_once(&self, handler: impl Fn(&ThreadEvent) + 'static) -> Subscription {
        self.events.subscribe_once(handler)
    }

    /// One-shot subscription for the first event accepted by `filter`.
    pub fn subscribe_once_matching(
        &self,
        filter: impl Fn(&ThreadEvent) -> bool + 'static,
        handler: impl Fn(&ThreadEvent) + 'static,
    ) -> Subscription {
        self.events.subscribe_once_matching(filter, handler)
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Raises [`ThreadEvent::LockedChanged`] when the value changes.
    pub fn set_locked(&self, locked: bool) {
        let changed = self.replace(|attrs| std::mem::replace(&mut attrs.locked, locked) != locked);
        if changed {
            self.events.emit(ThreadEvent::LockedChanged { locked });
        }
    }

    /// Raises [`ThreadEvent::HideChanged`] when the value changes.
    pub fn set_hidden(&self, hidden: bool) {
        let changed = self.replace(|attrs| std::mem::replace(&mut attrs.hidden, hidden) != hidden);
        if changed {
            self.events.emit(ThreadEvent::HideChanged { hidden });
        }
    }

    /// Raises [`ThreadEvent::OmitChanged`] when the value changes.
    pub fn set_omit(&self, omit: u32) {
        let changed = self.replace(|attrs| std::mem::replace(&mut attrs.omit, omit) != omit);
        if changed {
            self.events.emit(ThreadEvent::OmitChanged { omit });
        }
    }

    /// Bumps the image omission count. No event: nothing observes it
    /// directly, it is read when the omit indicator re-renders.
    pub fn increment_image_omit(&self) {
        let mut attrs = self.attrs.borrow_mut();
        attrs.image_omit = attrs.image_omit.saturating_add(1);
    }

    /// Append a reply and raise [`ThreadEvent::ShiftReplies`].
    pub fn append_reply(&self, id: PostId, own_composer: bool) {
        self.attrs.borrow_mut().replies.push_back(id);
        self.events.emit(ThreadEvent::ShiftReplies { own_composer });
    }

    /// Remove and return the oldest reply id.
    pub fn shift_reply(&self) -> Option<PostId> {
        self.attrs.borrow_mut().replies.pop_front()
    }

    /// Raise [`ThreadEvent::Bumped`].
    pub fn bump(&self) {
        self.events.emit(ThreadEvent::Bumped);
    }

    pub(crate) fn notify_added(&self) {
        self.events.emit(ThreadEvent::Added);
    }

    pub(crate) fn notify_removed(&self) {
        self.events.emit(ThreadEvent::Removed);
    }

    fn replace<T>(&self, f: impl FnOnce(&mut ThreadAttributes) -> T) -> T {
        let mut attrs = self.attrs.borrow_mut();
        f(&mut attrs)
    }
}
