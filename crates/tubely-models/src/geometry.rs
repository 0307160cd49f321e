//! Frame geometry classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance applied to the 16:9 cross products.
///
/// Absorbs integer rounding in common resolutions such as 1920x1080 or 854x480.
const RATIO_TOLERANCE: i64 = 16;

/// Pixel dimensions of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Orientation category of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryClass {
    /// Approximately 16:9
    Landscape,
    /// Approximately 9:16
    Portrait,
    /// Anything else
    Other,
}

impl GeometryClass {
    /// Classify a frame size.
    ///
    /// Landscape is checked first, so degenerate sizes that satisfy both
    /// tolerances classify as landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let w = i64::from(width);
        let h = i64::from(height);

        if (w * 9 - h * 16).abs() < RATIO_TOLERANCE {
            GeometryClass::Landscape
        } else if (h * 9 - w * 16).abs() < RATIO_TOLERANCE {
            GeometryClass::Portrait
        } else {
            GeometryClass::Other
        }
    }

    /// Storage prefix for this class. `Other` is stored unprefixed.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            GeometryClass::Landscape => Some("landscape"),
            GeometryClass::Portrait => Some("portrait"),
            GeometryClass::Other => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryClass::Landscape => "landscape",
            GeometryClass::Portrait => "portrait",
            GeometryClass::Other => "other",
        }
    }
}

impl From<Dimensions> for GeometryClass {
    fn from(dims: Dimensions) -> Self {
        Self::from_dimensions(dims.width, dims.height)
    }
}

impl fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_resolutions() {
        assert_eq!(GeometryClass::from_dimensions(1920, 1080), GeometryClass::Landscape);
        assert_eq!(GeometryClass::from_dimensions(1280, 720), GeometryClass::Landscape);
        assert_eq!(GeometryClass::from_dimensions(854, 480), GeometryClass::Landscape);
        assert_eq!(GeometryClass::from_dimensions(1080, 1920), GeometryClass::Portrait);
        assert_eq!(GeometryClass::from_dimensions(720, 1280), GeometryClass::Portrait);
        assert_eq!(GeometryClass::from_dimensions(1000, 1000), GeometryClass::Other);
        assert_eq!(GeometryClass::from_dimensions(640, 480), GeometryClass::Other);
    }

    #[test]
    fn test_matches_cross_product_rule() {
        for width in (0..400u32).step_by(7) {
            for height in (0..400u32).step_by(5) {
                let w = width as i64;
                let h = height as i64;
                let expected = if (w * 9 - h * 16).abs() < 16 {
                    GeometryClass::Landscape
                } else if (h * 9 - w * 16).abs() < 16 {
                    GeometryClass::Portrait
                } else {
                    GeometryClass::Other
                };
                assert_eq!(GeometryClass::from_dimensions(width, height), expected);
            }
        }
    }

    #[test]
    fn test_degenerate_size_prefers_landscape() {
        // Both cross products are zero
        assert_eq!(GeometryClass::from_dimensions(0, 0), GeometryClass::Landscape);
        assert_eq!(GeometryClass::from_dimensions(1, 1), GeometryClass::Landscape);
    }

    #[test]
    fn test_large_dimensions_do_not_overflow() {
        assert_eq!(
            GeometryClass::from_dimensions(u32::MAX, u32::MAX),
            GeometryClass::Other
        );
    }

    #[test]
    fn test_prefix() {
        assert_eq!(GeometryClass::Landscape.prefix(), Some("landscape"));
        assert_eq!(GeometryClass::Portrait.prefix(), Some("portrait"));
        assert_eq!(GeometryClass::Other.prefix(), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&GeometryClass::Portrait).unwrap();
        assert_eq!(json, "\"portrait\"");
    }
}
