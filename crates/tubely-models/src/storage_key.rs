//! Object storage keys for ingested videos.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::GeometryClass;
use crate::video::VideoId;

/// Address of an ingested video inside the object store.
///
/// Derived only from the geometry class and the video ID, so re-ingesting
/// the same video overwrites the same object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key for a video: `{prefix}/{video_id}.mp4`, or `{video_id}.mp4` when
    /// the class has no prefix.
    pub fn for_video(class: GeometryClass, video_id: &VideoId) -> Self {
        match class.prefix() {
            Some(prefix) => Self(format!("{}/{}.mp4", prefix, video_id)),
            None => Self(format!("{}.mp4", video_id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
