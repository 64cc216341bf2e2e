//! Reply post as held by the post registry.

use super::identifiers::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply registered in the post store.
///
/// The section view only cares whether a post exists and whether it carries
/// an image; everything else about a reply is rendered by its own view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post number.
    pub id: PostId,
    /// Whether the post carries an image.
    #[serde(default, rename = "image")]
    pub has_image: bool,
    /// Creation time, if known.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

impl Post {
    /// Post without a timestamp.
    pub fn new(id: PostId, has_image: bool) -> Self {
        Self {
            id,
            has_image,
            time: None,
        }
    }

    /// Set the creation time.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }
}
