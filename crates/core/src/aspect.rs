//! Aspect-ratio table: the six supported ratios and their pixel dimensions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Dimensions used for any ratio outside the table.
pub const DEFAULT_DIMENSIONS: (u32, u32) = (1024, 576);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    #[default]
    Widescreen,
    Portrait,
    Square,
    Standard,
    StandardPortrait,
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        AspectRatio::Widescreen,
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Standard,
        AspectRatio::StandardPortrait,
        AspectRatio::Ultrawide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Widescreen => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
            Self::Ultrawide => "21:9",
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Widescreen => (1024, 576),
            Self::Portrait => (576, 1024),
            Self::Square => (768, 768),
            Self::Standard => (896, 672),
            Self::StandardPortrait => (672, 896),
            Self::Ultrawide => (1024, 440),
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value.trim())
    }

    /// Strict parse for user input.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::from_value(value).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
            CoreError::Validation(format!(
                "Unknown aspect ratio '{value}'. Valid ratios: {}",
                valid.join(", ")
            ))
        })
    }
}

/// Pixel dimensions for a ratio string; unknown ratios get [`DEFAULT_DIMENSIONS`].
pub fn dimensions_for(ratio: &str) -> (u32, u32) {
    AspectRatio::from_value(ratio)
        .map(AspectRatio::dimensions)
        .unwrap_or(DEFAULT_DIMENSIONS)
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unknown persisted ratios load as 16:9.
impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_value(&raw).unwrap_or_else(|| {
            tracing::warn!(aspect_ratio = %raw, "Unknown aspect ratio, using 16:9");
            Self::Widescreen
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ratios_map_to_exact_pixels() {
        assert_eq!(dimensions_for("16:9"), (1024, 576));
        assert_eq!(dimensions_for("9:16"), (576, 1024));
        assert_eq!(dimensions_for("1:1"), (768, 768));
        assert_eq!(dimensions_for("4:3"), (896, 672));
        assert_eq!(dimensions_for("3:4"), (672, 896));
        assert_eq!(dimensions_for("21:9"), (1024, 440));
    }

    #[test]
    fn unknown_ratio_falls_back() {
        assert_eq!(dimensions_for("5:4"), DEFAULT_DIMENSIONS);
        assert_eq!(dimensions_for(""), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!(AspectRatio::parse("21:9").unwrap(), AspectRatio::Ultrawide);
        assert!(matches!(AspectRatio::parse("2:1"), Err(CoreError::Validation(_))));
    }

    #[test]
    fn lenient_deserialize_defaults_to_widescreen() {
        let ratio: AspectRatio = serde_json::from_str("\"2.39:1\"").unwrap();
        assert_eq!(ratio, AspectRatio::Widescreen);
    }
}
