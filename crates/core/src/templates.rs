//! The nine fixed shot templates (T1..T9) and their lookup functions.
//!
//! Each template bundles default camera, composition and reference-slot
//! weights plus descriptive metadata. The catalog is built once and never
//! mutated.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{CameraSettings, CompositionSettings, SlotWeights};

// ---------------------------------------------------------------------------
// Template identifiers
// ---------------------------------------------------------------------------

/// One of the nine shot archetypes.
///
/// Persisted as its long string value (`T4_standard_medium`). Unknown strings
/// deserialize to [`ShotTemplate::FALLBACK`] instead of failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotTemplate {
    T1EstablishingWide,
    T2EnvironmentMedium,
    T3FramedShot,
    T4StandardMedium,
    T5OverShoulder,
    T6Closeup,
    T7LowAngle,
    T8Following,
    T9Pov,
}

impl ShotTemplate {
    /// Template used when a persisted or imported value is not recognised.
    pub const FALLBACK: ShotTemplate = ShotTemplate::T4StandardMedium;

    /// All templates in catalog order.
    pub const ALL: [ShotTemplate; 9] = [
        ShotTemplate::T1EstablishingWide,
        ShotTemplate::T2EnvironmentMedium,
        ShotTemplate::T3FramedShot,
        ShotTemplate::T4StandardMedium,
        ShotTemplate::T5OverShoulder,
        ShotTemplate::T6Closeup,
        ShotTemplate::T7LowAngle,
        ShotTemplate::T8Following,
        ShotTemplate::T9Pov,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::T1EstablishingWide => "T1_establishing_wide",
            Self::T2EnvironmentMedium => "T2_environment_medium",
            Self::T3FramedShot => "T3_framed_shot",
            Self::T4StandardMedium => "T4_standard_medium",
            Self::T5OverShoulder => "T5_over_shoulder",
            Self::T6Closeup => "T6_closeup",
            Self::T7LowAngle => "T7_low_angle",
            Self::T8Following => "T8_following",
            Self::T9Pov => "T9_pov",
        }
    }

    /// Strict parse of a persisted value.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Lenient parse of a persisted value; unknown strings map to the fallback.
    pub fn parse_lenient(value: &str) -> Self {
        Self::from_value(value).unwrap_or_else(|| {
            tracing::warn!(template = value, "Unknown shot template, using T4_standard_medium");
            Self::FALLBACK
        })
    }

    /// Resolve the shorthands used by imports and examples (`wide`, `closeup`,
    /// ...), a persisted value, or a short code. Anything else maps to T4.
    pub fn from_shorthand(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "wide" => return Self::T1EstablishingWide,
            "medium" => return Self::T4StandardMedium,
            "closeup" | "close_up" | "close-up" => return Self::T6Closeup,
            "over_shoulder" => return Self::T5OverShoulder,
            "low_angle" => return Self::T7LowAngle,
            "following" => return Self::T8Following,
            _ => {}
        }
        if let Some(template) = Self::from_value(trimmed) {
            return template;
        }
        match get_by_code(trimmed) {
            Some(def) => def.template_type,
            None => Self::FALLBACK,
        }
    }

    /// The catalog entry for this template.
    pub fn definition(self) -> &'static TemplateDefinition {
        &CATALOG[self as usize]
    }

    /// Cinematic-grammar suggestions for the shot that follows this one.
    pub fn suggest_next(self) -> [ShotTemplate; 3] {
        use ShotTemplate::*;
        match self {
            T1EstablishingWide => [T2EnvironmentMedium, T4StandardMedium, T8Following],
            T2EnvironmentMedium => [T4StandardMedium, T3FramedShot, T6Closeup],
            T3FramedShot => [T4StandardMedium, T2EnvironmentMedium, T9Pov],
            T4StandardMedium => [T5OverShoulder, T6Closeup, T7LowAngle],
            T5OverShoulder => [T5OverShoulder, T6Closeup, T4StandardMedium],
            T6Closeup => [T4StandardMedium, T5OverShoulder, T9Pov],
            T7LowAngle => [T4StandardMedium, T6Closeup, T2EnvironmentMedium],
            T8Following => [T9Pov, T2EnvironmentMedium, T3FramedShot],
            T9Pov => [T6Closeup, T4StandardMedium, T5OverShoulder],
        }
    }
}

impl Default for ShotTemplate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for ShotTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShotTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShotTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// Template grouping used by the UI and `list_by_category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Establishing,
    Focus,
    Dynamic,
}

impl TemplateCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Establishing => "establishing",
            Self::Focus => "focus",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "establishing" => Some(Self::Establishing),
            "focus" => Some(Self::Focus),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Template definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TemplateDefinition {
    pub template_type: ShotTemplate,
    pub name: &'static str,
    pub short_code: &'static str,
    pub category: TemplateCategory,
    pub description: &'static str,
    pub typical_use: &'static str,
    pub camera: CameraSettings,
    pub composition: CompositionSettings,
    pub slot_weights: SlotWeights,
    pub special_requirements: &'static [&'static str],
    pub prompt_keywords: &'static [&'static str],
}

impl TemplateDefinition {
    /// First keyword, the one woven into every compiled prompt.
    pub fn primary_keyword(&self) -> &'static str {
        self.prompt_keywords.first().copied().unwrap_or("")
    }
}

fn camera(distance: &str, vertical: f64, horizontal: f64, focal: f64) -> CameraSettings {
    CameraSettings {
        distance: distance.to_string(),
        vertical_angle: vertical,
        horizontal_angle: horizontal,
        focal_length: focal,
    }
}

#[allow(clippy::too_many_arguments)]
fn composition(
    subject_scale: f64,
    horizon: &str,
    depth_layers: u32,
    rule_of_thirds: bool,
    position: &str,
    foreground_blur: bool,
    background_blur: bool,
) -> CompositionSettings {
    CompositionSettings {
        subject_scale,
        horizon_position: horizon.to_string(),
        depth_layers,
        rule_of_thirds,
        subject_position: position.to_string(),
        foreground_blur,
        background_blur,
    }
}

fn weights(character: f64, scene: f64, props: f64, style: f64) -> SlotWeights {
    SlotWeights {
        character,
        scene,
        props,
        style,
    }
}

/// The catalog, indexed by `ShotTemplate as usize`.
static CATALOG: LazyLock<Vec<TemplateDefinition>> = LazyLock::new(|| {
    use ShotTemplate::*;
    use TemplateCategory::*;
    vec![
        TemplateDefinition {
            template_type: T1EstablishingWide,
            name: "Establishing Wide",
            short_code: "EST-W",
            category: Establishing,
            description: "God's-eye view that establishes the environment and sense of space",
            typical_use: "Opening, scene transitions, passage of time",
            camera: camera("extreme_wide", -45.0, 0.0, 24.0),
            composition: composition(0.15, "upper_third", 3, true, "center", false, false),
            slot_weights: weights(0.5, 0.9, 0.3, 0.4),
            special_requirements: &[],
            prompt_keywords: &[
                "establishing shot",
                "bird's eye view",
                "overhead angle",
                "wide landscape",
                "environmental context",
                "aerial perspective",
            ],
        },
        TemplateDefinition {
            template_type: T2EnvironmentMedium,
            name: "Medium Wide / Environment Medium",
            short_code: "ENV-M",
            category: Establishing,
            description: "Character and environment in balance, equally important",
            typical_use: "Character entrance, interaction with the environment, group shots",
            camera: camera("wide", 0.0, 10.0, 35.0),
            composition: composition(0.35, "middle", 2, true, "left_third", false, false),
            slot_weights: weights(0.7, 0.7, 0.5, 0.4),
            special_requirements: &[],
            prompt_keywords: &[
                "medium wide shot",
                "full body",
                "environmental context",
                "character in scene",
                "establishing character",
            ],
        },
        TemplateDefinition {
            template_type: T3FramedShot,
            name: "Framed Shot",
            short_code: "FRM",
            category: Establishing,
            description: "Spatial layering through doors or windows forming a frame within the frame",
            typical_use: "Spatial transitions, voyeur view, adding depth",
            camera: camera("medium_wide", 0.0, 0.0, 50.0),
            composition: composition(0.3, "middle", 3, true, "center", true, false),
            slot_weights: weights(0.7, 0.8, 0.8, 0.4),
            special_requirements: &["frame_element: door/window/arch/foliage"],
            prompt_keywords: &[
                "framed composition",
                "frame within frame",
                "doorway shot",
                "window frame",
                "through the door",
                "layered depth",
                "foreground framing element",
            ],
        },
        TemplateDefinition {
            template_type: T4StandardMedium,
            name: "Standard Medium Shot",
            short_code: "STD-M",
            category: Focus,
            description: "The narrative workhorse, framed from the waist up",
            typical_use: "Dialogue, monologue, regular narrative",
            camera: camera("medium", 0.0, 5.0, 50.0),
            composition: composition(0.55, "middle", 2, true, "center", false, true),
            slot_weights: weights(0.85, 0.5, 0.6, 0.4),
            special_requirements: &["framing: waist_up", "headroom: 10%"],
            prompt_keywords: &[
                "medium shot",
                "waist up",
                "mid shot",
                "standard framing",
                "conversational distance",
                "narrative shot",
            ],
        },
        TemplateDefinition {
            template_type: T5OverShoulder,
            name: "Over-the-Shoulder Shot",
            short_code: "OTS",
            category: Focus,
            description: "Foreground character blurred, focus character sharp",
            typical_use: "Two-person dialogue, confrontation, interview",
            camera: camera("medium", 3.0, 25.0, 50.0),
            composition: composition(0.4, "middle", 2, true, "right_third", true, true),
            slot_weights: weights(0.85, 0.4, 0.5, 0.4),
            special_requirements: &[
                "requires two characters",
                "foreground_character: back_shoulder_visible",
                "foreground_blur: slight",
                "focus_character: face_clear",
            ],
            prompt_keywords: &[
                "over the shoulder shot",
                "OTS",
                "dialogue framing",
                "two-shot",
                "conversation",
                "shoulder in foreground",
                "blurred foreground figure",
            ],
        },
        TemplateDefinition {
            template_type: T6Closeup,
            name: "Close-up",
            short_code: "CU",
            category: Focus,
            description: "Emotional emphasis on a face or a prop",
            typical_use: "Emotion, key prop, suspense reveal",
            camera: camera("close", 3.0, 10.0, 85.0),
            composition: composition(0.8, "middle", 1, true, "center", false, true),
            slot_weights: weights(0.95, 0.2, 0.8, 0.3),
            special_requirements: &["framing: face/object", "background_blur: heavy"],
            prompt_keywords: &[
                "close-up",
                "closeup shot",
                "face detail",
                "emotional closeup",
                "tight framing",
                "portrait shot",
                "shallow depth of field",
                "bokeh background",
            ],
        },
        TemplateDefinition {
            template_type: T7LowAngle,
            name: "Low Angle Shot",
            short_code: "LA",
            category: Dynamic,
            description: "Power and oppression, the camera looks up",
            typical_use: "Hero entrance, authority, menace",
            camera: camera("medium", 22.0, 0.0, 35.0),
            composition: composition(0.6, "lower_third", 2, true, "center", false, false),
            slot_weights: weights(0.85, 0.6, 0.5, 0.4),
            special_requirements: &["sky_visible: often", "power_dynamic: subject_dominant"],
            prompt_keywords: &[
                "low angle shot",
                "worm's eye view",
                "looking up",
                "heroic angle",
                "power shot",
                "imposing figure",
                "sky in background",
            ],
        },
        TemplateDefinition {
            template_type: T8Following,
            name: "Following Shot",
            short_code: "FOL",
            category: Dynamic,
            description: "Immersive tracking from behind the subject",
            typical_use: "Movement, exploring the unknown, suspense",
            camera: camera("medium", 8.0, 0.0, 35.0),
            composition: composition(0.4, "middle", 3, true, "center", false, false),
            slot_weights: weights(0.75, 0.8, 0.5, 0.4),
            special_requirements: &[
                "subject_visibility: back_view",
                "environment_reveal: progressive",
            ],
            prompt_keywords: &[
                "following shot",
                "tracking shot",
                "from behind",
                "back view",
                "walking forward",
                "into the scene",
                "character back",
                "exploration",
            ],
        },
        TemplateDefinition {
            template_type: T9Pov,
            name: "POV Shot (Point of View)",
            short_code: "POV",
            category: Dynamic,
            description: "First-person view, the owner of the eyes stays unseen",
            typical_use: "Discovering a scene, reading documents, observing others",
            camera: camera("medium", 0.0, 0.0, 40.0),
            composition: composition(0.5, "middle", 2, true, "center", false, false),
            slot_weights: weights(0.3, 0.85, 0.8, 0.4),
            special_requirements: &[
                "pov_owner: specified_character (not visible)",
                "hand_visible: optional",
                "focus_target: scene/other_character/object",
            ],
            prompt_keywords: &[
                "POV shot",
                "point of view",
                "first person view",
                "subjective camera",
                "through someone's eyes",
                "hands in frame optional",
                "looking at",
            ],
        },
    ]
});

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub fn get_template(template: ShotTemplate) -> Option<&'static TemplateDefinition> {
    CATALOG.iter().find(|def| def.template_type == template)
}

/// Look up a template by short code (`CU`, `OTS`, ...).
pub fn get_by_code(code: &str) -> Option<&'static TemplateDefinition> {
    CATALOG.iter().find(|def| def.short_code == code)
}

pub fn list_by_category(category: TemplateCategory) -> Vec<&'static TemplateDefinition> {
    CATALOG.iter().filter(|def| def.category == category).collect()
}

pub fn all_templates() -> &'static [TemplateDefinition] {
    CATALOG.as_slice()
}

/// Human-readable overview of the catalog grouped by category.
pub fn catalog_summary() -> String {
    let mut lines = Vec::new();
    for category in [
        TemplateCategory::Establishing,
        TemplateCategory::Focus,
        TemplateCategory::Dynamic,
    ] {
        lines.push(format!("=== {} ===", category.as_str()));
        for def in list_by_category(category) {
            lines.push(format!("  {}: {}", def.short_code, def.name));
            lines.push(format!("       {}", def.description));
            lines.push(format!("       Typical use: {}", def.typical_use));
        }
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- catalog integrity --

    #[test]
    fn every_template_resolves_to_itself() {
        for template in ShotTemplate::ALL {
            let def = get_template(template).expect("template in catalog");
            assert_eq!(def.template_type, template);
            assert_eq!(template.definition().template_type, template);
        }
    }

    #[test]
    fn slot_weights_are_within_unit_range() {
        for def in all_templates() {
            let w = &def.slot_weights;
            for value in [w.character, w.scene, w.props, w.style] {
                assert!((0.0..=1.0).contains(&value), "{} has {value}", def.short_code);
            }
        }
    }

    #[test]
    fn catalog_has_three_per_category() {
        assert_eq!(list_by_category(TemplateCategory::Establishing).len(), 3);
        assert_eq!(list_by_category(TemplateCategory::Focus).len(), 3);
        assert_eq!(list_by_category(TemplateCategory::Dynamic).len(), 3);
    }

    #[test]
    fn reference_tuples_are_verbatim() {
        let t1 = ShotTemplate::T1EstablishingWide.definition();
        assert_eq!(t1.camera.distance, "extreme_wide");
        assert_eq!(t1.camera.vertical_angle, -45.0);
        assert_eq!(t1.camera.focal_length, 24.0);
        assert_eq!(t1.composition.horizon_position, "upper_third");

        let t6 = ShotTemplate::T6Closeup.definition();
        assert_eq!(t6.camera.focal_length, 85.0);
        assert_eq!(t6.slot_weights.character, 0.95);
        assert_eq!(t6.composition.depth_layers, 1);

        let t7 = ShotTemplate::T7LowAngle.definition();
        assert_eq!(t7.camera.vertical_angle, 22.0);
        assert_eq!(t7.primary_keyword(), "low angle shot");
    }

    // -- lookups --

    #[test]
    fn get_by_code_finds_short_codes() {
        assert_eq!(
            get_by_code("OTS").map(|d| d.template_type),
            Some(ShotTemplate::T5OverShoulder)
        );
        assert!(get_by_code("XYZ").is_none());
    }

    #[test]
    fn category_parse_rejects_unknown() {
        assert_eq!(TemplateCategory::parse("focus"), Some(TemplateCategory::Focus));
        assert_eq!(TemplateCategory::parse("other"), None);
    }

    // -- parsing --

    #[test]
    fn unknown_persisted_value_falls_back_to_t4() {
        let template: ShotTemplate = serde_json::from_str("\"T99_legacy\"").unwrap();
        assert_eq!(template, ShotTemplate::T4StandardMedium);
    }

    #[test]
    fn persisted_value_round_trips() {
        let json = serde_json::to_string(&ShotTemplate::T9Pov).unwrap();
        assert_eq!(json, "\"T9_pov\"");
        assert_eq!(serde_json::from_str::<ShotTemplate>(&json).unwrap(), ShotTemplate::T9Pov);
    }

    #[test]
    fn shorthands_map_to_templates() {
        assert_eq!(ShotTemplate::from_shorthand("wide"), ShotTemplate::T1EstablishingWide);
        assert_eq!(ShotTemplate::from_shorthand("closeup"), ShotTemplate::T6Closeup);
        assert_eq!(ShotTemplate::from_shorthand("following"), ShotTemplate::T8Following);
        assert_eq!(ShotTemplate::from_shorthand("FRM"), ShotTemplate::T3FramedShot);
        assert_eq!(ShotTemplate::from_shorthand("T7_low_angle"), ShotTemplate::T7LowAngle);
        assert_eq!(ShotTemplate::from_shorthand("dolly"), ShotTemplate::T4StandardMedium);
    }

    // -- suggestions --

    #[test]
    fn suggestions_follow_cinematic_grammar() {
        assert_eq!(
            ShotTemplate::T1EstablishingWide.suggest_next(),
            [
                ShotTemplate::T2EnvironmentMedium,
                ShotTemplate::T4StandardMedium,
                ShotTemplate::T8Following
            ]
        );
        assert_eq!(ShotTemplate::T5OverShoulder.suggest_next()[0], ShotTemplate::T5OverShoulder);
    }

    #[test]
    fn summary_lists_every_code() {
        let summary = catalog_summary();
        for def in all_templates() {
            assert!(summary.contains(def.short_code));
        }
    }
}
