//! Key-addressable stores shared between views.
//!
//! Stores use interior mutability and take `&self` everywhere: they are
//! shared through `Rc` and may be called back into while another handler
//! is running. No borrow is held across a call that raises events.

pub mod threads;

pub use threads::ThreadRegistry;

use crate::model::{Post, PostId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Registry of live reply posts.
pub trait PostStore {
    /// Post registered under `id`, if any.
    fn lookup(&self, id: PostId) -> Option<Post>;

    /// Deregister a post. Returns the removed post, if it was present.
    fn remove(&self, id: PostId) -> Option<Post>;
}

/// In-memory [`PostStore`].
#[derive(Debug, Default)]
pub struct PostRegistry {
    posts: RefCell<HashMap<PostId, Post>>,
}

impl PostRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a post, replacing any with the same id.
    pub fn insert(&self, post: Post) {
        self.posts.borrow_mut().insert(post.id, post);
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: PostId) -> bool {
        self.posts.borrow().contains_key(&id)
    }

    /// Number of registered posts.
    pub fn len(&self) -> usize {
        self.posts.borrow().len()
    }

    /// Whether no post is registered.
    pub fn is_empty(&self) -> bool {
        self.posts.borrow().is_empty()
    }
}

impl FromIterator<Post> for PostRegistry {
    fn from_iter<I: IntoIterator<Item = Post>>(iter: I) -> Self {
        let registry = Self::new();
        for post in iter {
            registry.insert(post);
        }
        registry
    }
}

impl PostStore for PostRegistry {
    fn lookup(&self, id: PostId) -> Option<Post> {
        self.posts.borrow().get(&id).cloned()
    }

    fn remove(&self, id: PostId) -> Option<Post> {
        let removed = self.posts.borrow_mut().remove(&id);
        trace!(post = %id, found = removed.is_some(), "post deregistered");
        removed
    }
}

/// Threads started by the viewing user, keyed by thread id.
#[derive(Debug, Default)]
pub struct OwnPosts {
    ids: RefCell<HashSet<PostId>>,
}

impl OwnPosts {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark thread `id` as the viewer's.
    pub fn insert(&self, id: PostId) {
        self.ids.borrow_mut().insert(id);
    }

    /// Whether the viewer started thread `id`.
    pub fn contains(&self, id: PostId) -> bool {
        self.ids.borrow().contains(&id)
    }
}

impl FromIterator<PostId> for OwnPosts {
    fn from_iter<I: IntoIterator<Item = PostId>>(iter: I) -> Self {
        Self {
            ids: RefCell::new(iter.into_iter().collect()),
        }
    }
}
