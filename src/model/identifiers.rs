//! Post identifier newtype.
//!
//! Threads are addressed by the number of their opening post, so a single
//! identifier type covers both threads and replies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board-wide post number.
///
/// Post numbers start at 1; zero is rejected by the smart constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PostId(u64);

impl PostId {
    /// Smart constructor: validates a non-zero post number.
    pub fn new(raw: u64) -> Result<Self, InvalidPostId> {
        if raw == 0 {
            return Err(InvalidPostId::Zero);
        }
        Ok(Self(raw))
    }

    /// Raw post number.
    pub fn get(self) -> u64 {
        self.0
    }

    /// DOM id of the element that renders this post (`p123`).
    pub fn element_id(self) -> String {
        format!("p{}", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for PostId {
    type Error = InvalidPostId;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PostId> for u64 {
    fn from(id: PostId) -> Self {
        id.0
    }
}

/// Rejected post number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPostId {
    /// Post numbers start at 1.
    #[error("Post number cannot be zero")]
    Zero,
}
