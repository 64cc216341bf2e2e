//! Domain model types.
//!
//! Identifiers and posts are plain data; [`Thread`] is the reactive model
//! that views subscribe to through its [`event`] channel.

pub mod error;
pub mod event;
pub mod identifiers;
pub mod post;
pub mod thread;

// Re-export for convenience
pub use error::AppError;
pub use event::{EventChannel, Subscription};
pub use identifiers::{InvalidPostId, PostId};
pub use post::Post;
pub use thread::{Links, Thread, ThreadAttributes, ThreadEvent, ThreadHandle};
