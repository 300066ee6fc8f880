//! Project-wide visual style.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which part of the style configuration is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StyleMode {
    #[default]
    Preset,
    ReferenceImage,
    CustomText,
}

impl StyleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preset => "preset",
            Self::ReferenceImage => "reference_image",
            Self::CustomText => "custom_text",
        }
    }

    /// Parse a persisted mode; unknown values fall back to [`StyleMode::Preset`].
    pub fn parse(value: &str) -> Self {
        match value {
            "reference_image" => Self::ReferenceImage,
            "custom_text" => Self::CustomText,
            "preset" => Self::Preset,
            other => {
                tracing::warn!(mode = other, "Unknown style mode, using preset");
                Self::Preset
            }
        }
    }
}

impl Serialize for StyleMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StyleMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Default overall style weight.
pub const DEFAULT_STYLE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub mode: StyleMode,
    /// `Cartoon2D`, `Anime`, `Comic`, `Watercolor`, `Realistic3D`, `Cinematic`,
    /// `GameCG`, `Cyberpunk`, or anything else (ignored by the preset map).
    pub preset_name: String,
    pub ref_image: String,
    pub custom_description: String,
    pub render_type: String,
    pub color_tone: String,
    pub lighting_style: String,
    pub texture: String,
    /// Recommended at or below 0.5.
    pub weight: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            mode: StyleMode::Preset,
            preset_name: String::new(),
            ref_image: String::new(),
            custom_description: String::new(),
            render_type: "realistic".to_string(),
            color_tone: "neutral".to_string(),
            lighting_style: "natural".to_string(),
            texture: "digital_clean".to_string(),
            weight: DEFAULT_STYLE_WEIGHT,
        }
    }
}

impl StyleConfig {
    /// A style with every descriptive field blank.
    pub fn empty() -> Self {
        Self {
            render_type: String::new(),
            color_tone: String::new(),
            lighting_style: String::new(),
            texture: String::new(),
            ..Default::default()
        }
    }
}
