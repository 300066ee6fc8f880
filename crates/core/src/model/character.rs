//! Character reference slot: appearance, outfit and the consistency descriptor.

use serde::{Deserialize, Serialize};

use crate::text::join_non_empty;

/// Default features a character keeps fixed across shots.
pub const DEFAULT_LOCKED_FEATURES: &[&str] = &["face", "body_type", "hair"];

/// Default per-character consistency weight.
pub const DEFAULT_CHARACTER_WEIGHT: f64 = 0.8;

/// Structured appearance record. Every field is optional free text.
///
/// `nose` and `lips` are persisted but do not contribute to the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterAppearance {
    pub gender: String,
    pub age: String,
    pub ethnicity: String,
    pub skin_tone: String,
    pub height: String,
    pub body_type: String,
    pub face_shape: String,
    pub eye_color: String,
    pub eye_shape: String,
    pub nose: String,
    pub lips: String,
    pub hair_color: String,
    pub hair_style: String,
    pub hair_texture: String,
    pub facial_hair: String,
    pub glasses: String,
    pub scars: String,
    pub tattoos: String,
    pub other_features: String,
}

impl CharacterAppearance {
    /// Render the populated fields, in fixed order, as a comma-joined phrase.
    pub fn to_prompt_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        push_raw(&mut parts, &self.gender);
        if !self.age.is_empty() {
            parts.push(age_phrase(&self.age).to_string());
        }
        push_fmt(&mut parts, &self.ethnicity, "ethnicity");
        push_fmt(&mut parts, &self.skin_tone, "skin");
        push_fmt(&mut parts, &self.height, "height");
        push_fmt(&mut parts, &self.body_type, "build");
        push_fmt(&mut parts, &self.face_shape, "face");
        push_fmt(&mut parts, &self.eye_color, "eyes");
        push_fmt(&mut parts, &self.eye_shape, "eye shape");

        match (self.hair_color.is_empty(), self.hair_style.is_empty()) {
            (false, false) => parts.push(format!("{} {} hair", self.hair_color, self.hair_style)),
            (false, true) => parts.push(format!("{} hair", self.hair_color)),
            (true, false) => parts.push(format!("{} hair", self.hair_style)),
            (true, true) => {}
        }
        push_fmt(&mut parts, &self.hair_texture, "hair texture");

        if !self.facial_hair.is_empty() && self.facial_hair != "none" {
            parts.push(format!("with {}", self.facial_hair));
        }
        if !self.glasses.is_empty() && self.glasses != "none" {
            parts.push(format!("wearing {} glasses", self.glasses));
        }
        if !self.scars.is_empty() {
            parts.push(format!("scar: {}", self.scars));
        }
        if !self.tattoos.is_empty() {
            parts.push(format!("tattoo: {}", self.tattoos));
        }
        push_raw(&mut parts, &self.other_features);

        parts.join(", ")
    }
}

/// Map an age bracket to its descriptive phrase. Unknown brackets pass through.
fn age_phrase(age: &str) -> &str {
    match age {
        "child" => "young child",
        "teen" => "teenager",
        "young_adult" => "young adult in their 20s",
        "adult" => "adult in their 30s",
        "middle_aged" => "middle-aged person in their 40s-50s",
        "elderly" => "elderly person",
        other => other,
    }
}

fn push_raw(parts: &mut Vec<String>, value: &str) {
    if !value.is_empty() {
        parts.push(value.to_string());
    }
}

fn push_fmt(parts: &mut Vec<String>, value: &str, suffix: &str) {
    if !value.is_empty() {
        parts.push(format!("{value} {suffix}"));
    }
}

/// Clothing record, only rendered when the character's costume is locked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterOutfit {
    pub top: String,
    pub top_color: String,
    pub bottom: String,
    pub bottom_color: String,
    pub outerwear: String,
    pub outerwear_color: String,
    pub footwear: String,
    pub accessories: String,
    pub style_keywords: String,
}

impl CharacterOutfit {
    pub fn to_prompt_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.style_keywords.is_empty() {
            parts.push(format!("{} style", self.style_keywords));
        }
        if !self.top.is_empty() {
            parts.push(format!("wearing {}", colored(&self.top_color, &self.top)));
        }
        if !self.bottom.is_empty() {
            parts.push(colored(&self.bottom_color, &self.bottom));
        }
        if !self.outerwear.is_empty() {
            parts.push(colored(&self.outerwear_color, &self.outerwear));
        }
        push_raw(&mut parts, &self.footwear);
        if !self.accessories.is_empty() {
            parts.push(format!("accessories: {}", self.accessories));
        }

        parts.join(", ")
    }
}

fn colored(color: &str, item: &str) -> String {
    if color.is_empty() {
        item.to_string()
    } else {
        format!("{color} {item}")
    }
}

/// A character in the project's reference library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Reference image paths; three to five are recommended.
    pub ref_images: Vec<String>,
    pub features_locked: Vec<String>,
    pub costume_locked: bool,
    /// Recommended range 0.5..=1.0, not enforced.
    pub consistency_weight: f64,
    pub description: String,
    pub appearance: CharacterAppearance,
    pub outfit: CharacterOutfit,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            id: super::new_entity_id("char"),
            name: String::new(),
            ref_images: Vec::new(),
            features_locked: DEFAULT_LOCKED_FEATURES.iter().map(|s| s.to_string()).collect(),
            costume_locked: false,
            consistency_weight: DEFAULT_CHARACTER_WEIGHT,
            description: String::new(),
            appearance: CharacterAppearance::default(),
            outfit: CharacterOutfit::default(),
        }
    }
}

impl Character {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Build the `[{name}: ...]` descriptor used to keep the character stable.
    ///
    /// Appearance comes first, then the outfit when the costume is locked. With
    /// no appearance fields the free-text description stands in. With nothing at
    /// all the result is `[{name}: ]`, see [`Self::has_consistency_info`].
    pub fn consistency_descriptor(&self) -> String {
        let appearance = self.appearance.to_prompt_string();
        let outfit = if self.costume_locked {
            self.outfit.to_prompt_string()
        } else {
            String::new()
        };

        let body = if appearance.is_empty() {
            join_non_empty(&[self.description.as_str(), outfit.as_str()], ", ")
        } else {
            join_non_empty(&[appearance.as_str(), outfit.as_str()], ", ")
        };

        format!("[{}: {}]", self.name, body)
    }

    /// The descriptor a character with no usable information degenerates to.
    pub fn empty_descriptor(&self) -> String {
        format!("[{}: ]", self.name)
    }

    /// Whether the descriptor carries anything beyond the name.
    pub fn has_consistency_info(&self) -> bool {
        self.consistency_descriptor() != self.empty_descriptor()
    }
}
