//! Content-Type parsing.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The only media type accepted for video ingestion.
pub const VIDEO_MP4: &str = "video/mp4";

/// Error returned for malformed Content-Type values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid Content-Type: {0}")]
pub struct MediaTypeError(String);

/// A parsed `type/subtype` pair. Parameters after `;` are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    type_: String,
    subtype: String,
}

impl MediaType {
    /// Top-level type, e.g. `video`.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Subtype, e.g. `mp4`.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    pub fn is_video_mp4(&self) -> bool {
        self.essence() == VIDEO_MP4
    }

    pub fn is_image(&self) -> bool {
        self.type_ == "image"
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        let (type_, subtype) = essence
            .split_once('/')
            .ok_or_else(|| MediaTypeError(s.to_string()))?;

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
        };

        if !valid(type_) || !valid(subtype) {
            return Err(MediaTypeError(s.to_string()));
        }

        Ok(Self {
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)
    }
}
