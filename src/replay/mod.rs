//! JSON replay scripts.
//!
//! A script describes a board (threads, registered reply posts, the viewer's
//! own threads, optional pre-rendered markup) and a sequence of events to
//! apply to it. [`run`] mounts a section view per thread, replays the events
//! and returns the outline of the resulting document.
//!
//! ```json
//! {
//!   "url": "board?page=1",
//!   "own_posts": [1],
//!   "posts": [{ "id": 2, "image": true }],
//!   "threads": [{ "id": 1, "body": "hello", "replies": [2] }],
//!   "events": [
//!     { "op": "reply", "thread": 1, "post": 3 },
//!     { "op": "lock", "thread": 1 },
//!     { "op": "bump", "thread": 1 }
//!   ]
//! }
//! ```

use crate::config::ResolvedConfig;
use crate::dom::MarkupError;
use crate::model::{Post, PostId, Thread, ThreadAttributes, ThreadHandle};
use crate::store::{OwnPosts, PostRegistry, ThreadRegistry};
use crate::view::{Board, FixedClock, Page, SectionView, ViewContext, ViewError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or running a replay script.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The script file could not be read.
    #[error("Failed to read replay script {path:?}: {source}")]
    Read {
        /// Script path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The script is not valid JSON or has the wrong shape.
    #[error("Invalid replay script: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two threads share an id.
    #[error("Thread {0} is declared more than once")]
    DuplicateThread(PostId),

    /// An event names a thread the script never declares.
    #[error("Event {index} refers to unknown thread {thread}")]
    UnknownThread {
        /// Position of the event in the script.
        index: usize,
        /// The undeclared thread.
        thread: PostId,
    },

    /// Pre-rendered markup could not be parsed.
    #[error("Pre-rendered markup is malformed: {0}")]
    Markup(#[from] MarkupError),

    /// A view failed to mount.
    #[error(transparent)]
    View(#[from] ViewError),
}

fn default_url() -> String {
    "board".to_string()
}

fn default_true() -> bool {
    true
}

/// A parsed replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// URL of the page the board lives on.
    #[serde(default = "default_url")]
    pub url: String,
    /// Threads started by the viewer.
    #[serde(default)]
    pub own_posts: Vec<PostId>,
    /// Whether the reply composer is open.
    #[serde(default)]
    pub composer_open: bool,
    /// Fixed "now" for relative times; the system clock when absent.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Markup already present in the thread container.
    #[serde(default)]
    pub markup: Option<String>,
    /// Reply posts registered before any event runs.
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Threads in mount order; the last one ends up on top.
    #[serde(default)]
    pub threads: Vec<ThreadAttributes>,
    /// Events to replay, in order.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One step of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    /// Register `post` and append it to the thread's replies.
    Reply {
        /// Thread receiving the reply.
        thread: PostId,
        /// Number of the new reply.
        post: PostId,
        /// Whether the reply carries an image.
        #[serde(default)]
        image: bool,
        /// Whether it was sent from the viewer's open reply form.
        #[serde(default)]
        own_composer: bool,
    },
    /// Set the lock flag.
    Lock {
        /// Target thread.
        thread: PostId,
        /// New value; defaults to `true`.
        #[serde(default = "default_true")]
        locked: bool,
    },
    /// Set the hide flag.
    Hide {
        /// Target thread.
        thread: PostId,
        /// New value; defaults to `true`.
        #[serde(default = "default_true")]
        hidden: bool,
    },
    /// Move the thread to the top.
    Bump {
        /// Target thread.
        thread: PostId,
    },
    /// Remove the thread from the registry.
    Remove {
        /// Target thread.
        thread: PostId,
    },
    /// Overwrite the omitted-reply count.
    Omit {
        /// Target thread.
        thread: PostId,
        /// New count.
        omit: u32,
    },
}

impl Event {
    /// Thread the event targets.
    pub fn thread(&self) -> PostId {
        match *self {
            Event::Reply { thread, .. }
            | Event::Lock { thread, .. }
            | Event::Hide { thread, .. }
            | Event::Bump { thread }
            | Event::Remove { thread }
            | Event::Omit { thread, .. } => thread,
        }
    }
}

/// Parse a script from JSON text.
///
/// # Errors
///
/// Returns [`ReplayError::Parse`] for malformed JSON, unknown fields or zero
/// post ids.
pub fn parse_script(json: &str) -> Result<Script, ReplayError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a script file.
///
/// # Errors
///
/// Returns [`ReplayError::Read`] if the file cannot be read, otherwise as
/// [`parse_script`].
pub fn load_script(path: &Path) -> Result<Script, ReplayError> {
    let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&json)
}

/// Run `script` against a fresh board and return the document outline.
///
/// # Errors
///
/// Fails on duplicate thread ids, events naming undeclared threads, and
/// malformed pre-rendered or generated markup. Validation happens before
/// anything is mounted.
pub fn run(script: &Script, config: &ResolvedConfig) -> Result<String, ReplayError> {
    let mut threads: BTreeMap<PostId, ThreadHandle> = BTreeMap::new();
    for attrs in &script.threads {
        if threads.contains_key(&attrs.id) {
            return Err(ReplayError::DuplicateThread(attrs.id));
        }
        threads.insert(attrs.id, Thread::new(attrs.clone()));
    }
    for (index, event) in script.events.iter().enumerate() {
        let thread = event.thread();
        if !threads.contains_key(&thread) {
            return Err(ReplayError::UnknownThread { index, thread });
        }
    }

    let board = match &script.markup {
        Some(html) => Board::with_markup(html)?,
        None => Board::new(),
    };
    let posts: Rc<PostRegistry> = Rc::new(script.posts.iter().cloned().collect());
    let own_posts: Rc<OwnPosts> = Rc::new(script.own_posts.iter().copied().collect());
    let page = Rc::new(Page::new(script.url.clone(), own_posts));
    page.set_composer_open(script.composer_open);

    let mut ctx = ViewContext::new(
        config.mode,
        posts.clone(),
        page,
        Rc::new(config.clone()),
    );
    if let Some(now) = script.now {
        ctx = ctx.with_clock(Rc::new(FixedClock(now)));
    }

    let registry = ThreadRegistry::new();
    let mut views = Vec::with_capacity(script.threads.len());
    for attrs in &script.threads {
        let thread = Rc::clone(&threads[&attrs.id]);
        let view = SectionView::mount(Rc::clone(&thread), board.host_for(attrs.id), ctx.clone())?;
        registry.add(thread);
        views.push(view);
    }
    info!(
        threads = views.len(),
        events = script.events.len(),
        mode = ?config.mode,
        limit = config.abbreviated_replies,
        "replay started"
    );

    for event in &script.events {
        let thread = &threads[&event.thread()];
        debug!(?event, "replaying");
        match *event {
            Event::Reply {
                post,
                image,
                own_composer,
                ..
            } => {
                posts.insert(Post::new(post, image));
                thread.append_reply(post, own_composer);
            }
            Event::Lock { locked, .. } => thread.set_locked(locked),
            Event::Hide { hidden, .. } => thread.set_hidden(hidden),
            Event::Bump { .. } => thread.bump(),
            Event::Remove { thread } => {
                registry.remove(thread);
            }
            Event::Omit { omit, .. } => thread.set_omit(omit),
        }
    }

    let removed = views.iter().filter(|view| view.is_removed()).count();
    info!(removed, remaining_posts = posts.len(), "replay finished");
    Ok(board.outline())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewMode;

    fn config(limit: i64, mode: ViewMode) -> ResolvedConfig {
        ResolvedConfig {
            abbreviated_replies: limit,
            mode,
            ..ResolvedConfig::default()
        }
    }

    #[test]
    fn parse_script_fills_defaults() {
        let script = parse_script(r#"{"threads": [{"id": 1}]}"#).expect("valid script");

        assert_eq!(script.url, "board");
        assert!(!script.composer_open);
        assert!(script.events.is_empty());
        assert_eq!(script.threads[0].id, PostId::new(1).expect("non-zero id"));
    }

    #[test]
    fn parse_script_reads_tagged_events() {
        let script = parse_script(
            r#"{"events": [
                {"op": "reply", "thread": 1, "post": 2, "own_composer": true},
                {"op": "lock", "thread": 1},
                {"op": "hide", "thread": 1, "hidden": false},
                {"op": "omit", "thread": 1, "omit": 4}
            ]}"#,
        )
        .expect("valid script");
        let one = PostId::new(1).expect("non-zero id");

        assert_eq!(
            script.events,
            vec![
                Event::Reply {
                    thread: one,
                    post: PostId::new(2).expect("non-zero id"),
                    image: false,
                    own_composer: true,
                },
                Event::Lock {
                    thread: one,
                    locked: true
                },
                Event::Hide {
                    thread: one,
                    hidden: false
                },
                Event::Omit { thread: one, omit: 4 },
            ]
        );
    }

    #[test]
    fn parse_script_rejects_zero_ids_and_unknown_ops() {
        assert!(matches!(
            parse_script(r#"{"threads": [{"id": 0}]}"#),
            Err(ReplayError::Parse(_))
        ));
        assert!(matches!(
            parse_script(r#"{"events": [{"op": "sticky", "thread": 1}]}"#),
            Err(ReplayError::Parse(_))
        ));
    }

    #[test]
    fn load_script_reports_missing_file() {
        let path = Path::new("/nonexistent/section-view/script.json");
        match load_script(path) {
            Err(ReplayError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("Expected Read error, got {:?}", other),
        }
    }

    #[test]
    fn run_rejects_events_on_undeclared_threads() {
        let script = parse_script(
            r#"{"threads": [{"id": 1}], "events": [{"op": "bump", "thread": 1}, {"op": "bump", "thread": 9}]}"#,
        )
        .expect("valid script");

        let result = run(&script, &config(5, ViewMode::Board));

        assert!(
            matches!(result, Err(ReplayError::UnknownThread { index: 1, .. })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn run_rejects_duplicate_threads() {
        let script = parse_script(r#"{"threads": [{"id": 1}, {"id": 1}]}"#).expect("valid script");

        let result = run(&script, &config(5, ViewMode::Board));

        assert!(matches!(result, Err(ReplayError::DuplicateThread(_))));
    }

    #[test]
    fn run_replays_truncation_lock_and_bump() {
        let script = parse_script(
            r#"{
                "posts": [{"id": 11}, {"id": 12, "image": true}],
                "threads": [
                    {"id": 1, "body": "first", "replies": [11, 12]},
                    {"id": 2, "body": "second"}
                ],
                "events": [
                    {"op": "reply", "thread": 1, "post": 13},
                    {"op": "lock", "thread": 1},
                    {"op": "bump", "thread": 1},
                    {"op": "remove", "thread": 2}
                ]
            }"#,
        )
        .expect("valid script");

        let outline = run(&script, &config(1, ViewMode::Board)).expect("replay succeeds");

        insta::assert_snapshot!(outline, @r#"
        div#threads
          aside.act
            "New thread"
          section#p1.locked
            header
              a.quote
                "No.1"
            blockquote
              "first"
            span.omit
              "2 replies and 1 image omitted"
          aside.act.posting
            a
              "Reply"
          hr
        "#);
    }

    #[test]
    fn run_hydrates_prerendered_markup() {
        let script = parse_script(
            r#"{
                "markup": "<section id=\"p5\"><blockquote>old</blockquote></section><hr>",
                "threads": [{"id": 5, "omit": 2}],
                "events": [{"op": "hide", "thread": 5}]
            }"#,
        )
        .expect("valid script");

        let outline = run(&script, &config(5, ViewMode::Board)).expect("replay succeeds");

        insta::assert_snapshot!(outline, @r#"
        div#threads
          aside.act
            "New thread"
          section#p5 (hidden)
            blockquote
              "old"
            span.omit
              "2 replies omitted"
          hr (hidden)
        "#);
    }
}
