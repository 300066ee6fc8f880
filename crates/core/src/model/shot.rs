//! A single storyboard shot and its camera, composition and weighting data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::templates::ShotTemplate;

// ---------------------------------------------------------------------------
// Camera and composition
// ---------------------------------------------------------------------------

/// Camera parameters. `distance` is one of `extreme_wide`, `wide`,
/// `medium_wide`, `medium`, `close`; other values render as a medium shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub distance: String,
    /// Degrees; negative looks down, positive looks up.
    pub vertical_angle: f64,
    pub horizontal_angle: f64,
    /// Millimetres.
    pub focal_length: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: "medium".to_string(),
            vertical_angle: 0.0,
            horizontal_angle: 0.0,
            focal_length: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionSettings {
    /// Share of the frame the subject occupies, 0..=1.
    pub subject_scale: f64,
    pub horizon_position: String,
    pub depth_layers: u32,
    pub rule_of_thirds: bool,
    /// `left_third`, `right_third` or `center`.
    pub subject_position: String,
    pub foreground_blur: bool,
    pub background_blur: bool,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            subject_scale: 0.5,
            horizon_position: "middle".to_string(),
            depth_layers: 2,
            rule_of_thirds: true,
            subject_position: "center".to_string(),
            foreground_blur: false,
            background_blur: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Slot weights
// ---------------------------------------------------------------------------

/// Cap on the summed slot weights handed to a backend.
pub const MAX_TOTAL_WEIGHT: f64 = 2.5;

/// Relative pull of each reference slot on the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotWeights {
    pub character: f64,
    pub scene: f64,
    pub props: f64,
    pub style: f64,
}

impl Default for SlotWeights {
    fn default() -> Self {
        Self {
            character: 0.8,
            scene: 0.6,
            props: 0.5,
            style: 0.4,
        }
    }
}

impl SlotWeights {
    pub fn total(&self) -> f64 {
        self.character + self.scene + self.props + self.style
    }

    /// Scale all four weights down proportionally so their sum equals
    /// `max_total`. Weights already at or under the cap are returned unchanged.
    pub fn normalize(&self, max_total: f64) -> Self {
        let total = self.total();
        if total <= max_total || total <= 0.0 {
            return *self;
        }
        let factor = max_total / total;
        Self {
            character: self.character * factor,
            scene: self.scene * factor,
            props: self.props * factor,
            style: self.style * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Standard prompt breakdown
// ---------------------------------------------------------------------------

/// Ten-field structured description of a shot, for presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardShotPrompt {
    pub subject: String,
    pub shot_type: String,
    pub atmosphere: String,
    pub environment: String,
    pub camera_movement: String,
    pub angle: String,
    pub special_technique: String,
    pub composition: String,
    pub style_consistency: String,
    pub dynamic_control: String,
}

impl StandardShotPrompt {
    /// Render the non-empty fields as labelled lines.
    pub fn to_formatted_string(&self) -> String {
        let rows = [
            ("Subject", &self.subject),
            ("Shot type", &self.shot_type),
            ("Atmosphere", &self.atmosphere),
            ("Environment", &self.environment),
            ("Camera movement", &self.camera_movement),
            ("Angle", &self.angle),
            ("Special technique", &self.special_technique),
            ("Composition", &self.composition),
            ("Style consistency", &self.style_consistency),
            ("Dynamic control", &self.dynamic_control),
        ];
        rows.iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Generation state: `pending -> generating -> completed | failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShotStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl ShotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Serialize for ShotStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A persisted `generating` can only come from an interrupted process, so it
/// loads as `pending`. Unknown values also load as `pending`.
impl<'de> Deserialize<'de> for ShotStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        })
    }
}

// ---------------------------------------------------------------------------
// Shot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shot {
    /// 1-based; dense across the project.
    pub shot_number: u32,
    pub template: ShotTemplate,
    pub description: String,
    pub characters_in_shot: Vec<String>,
    /// Empty when the shot has no scene.
    pub scene_id: String,
    pub props_in_shot: Vec<String>,
    pub camera: CameraSettings,
    pub composition: CompositionSettings,
    pub slot_weights: SlotWeights,
    pub dialogue: String,
    pub action: String,
    pub generated_prompt: String,
    pub standard_prompt: StandardShotPrompt,
    pub output_image: String,
    pub output_video: String,
    pub consistency_score: f64,
    pub status: ShotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Default for Shot {
    fn default() -> Self {
        Self {
            shot_number: 1,
            template: ShotTemplate::FALLBACK,
            description: String::new(),
            characters_in_shot: Vec::new(),
            scene_id: String::new(),
            props_in_shot: Vec::new(),
            camera: CameraSettings::default(),
            composition: CompositionSettings::default(),
            slot_weights: SlotWeights::default(),
            dialogue: String::new(),
            action: String::new(),
            generated_prompt: String::new(),
            standard_prompt: StandardShotPrompt::default(),
            output_image: String::new(),
            output_video: String::new(),
            consistency_score: 0.0,
            status: ShotStatus::Pending,
            last_error: None,
        }
    }
}

impl Shot {
    /// A shot with camera, composition and slot weights taken from `template`.
    pub fn from_template(shot_number: u32, template: ShotTemplate) -> Self {
        let def = template.definition();
        Self {
            shot_number,
            template,
            camera: def.camera.clone(),
            composition: def.composition.clone(),
            slot_weights: def.slot_weights,
            ..Default::default()
        }
    }

    pub fn scene_id(&self) -> Option<&str> {
        if self.scene_id.is_empty() {
            None
        } else {
            Some(&self.scene_id)
        }
    }

    pub fn has_output(&self) -> bool {
        !self.output_image.is_empty()
    }

    /// Derive the status of a freshly loaded shot: a pending shot that already
    /// has an output image is completed.
    pub fn reconcile_status(&mut self) {
        if self.status == ShotStatus::Pending && self.has_output() {
            self.status = ShotStatus::Completed;
        }
    }

    pub fn mark_generating(&mut self) {
        self.status = ShotStatus::Generating;
        self.last_error = None;
    }

    /// Record a successful generation. Only reachable with a non-empty path.
    pub fn mark_completed(&mut self, output_image: String, consistency_score: f64) {
        if output_image.is_empty() {
            self.mark_failed("backend returned an empty output path".to_string());
            return;
        }
        self.output_image = output_image;
        self.consistency_score = consistency_score;
        self.status = ShotStatus::Completed;
        self.last_error = None;
    }

    /// Record a failure. The previous output, if any, is left untouched.
    pub fn mark_failed(&mut self, error: String) {
        self.status = ShotStatus::Failed;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- slot weights --

    #[test]
    fn normalize_leaves_weights_under_cap() {
        let weights = SlotWeights {
            character: 0.85,
            scene: 0.5,
            props: 0.6,
            style: 0.4,
        };
        assert_eq!(weights.normalize(MAX_TOTAL_WEIGHT), weights);
    }

    #[test]
    fn normalize_scales_to_cap_exactly() {
        let weights = SlotWeights {
            character: 1.0,
            scene: 1.0,
            props: 1.0,
            style: 1.0,
        };
        let normalized = weights.normalize(MAX_TOTAL_WEIGHT);
        assert!((normalized.total() - MAX_TOTAL_WEIGHT).abs() < 1e-9);
        assert!((normalized.character - 0.625).abs() < 1e-9);
    }

    #[test]
    fn normalize_never_exceeds_cap() {
        for scale in [1.0, 3.0, 10.0, 100.0] {
            let weights = SlotWeights {
                character: 0.9 * scale,
                scene: 0.3 * scale,
                props: 0.7 * scale,
                style: 0.2 * scale,
            };
            assert!(weights.normalize(MAX_TOTAL_WEIGHT).total() <= MAX_TOTAL_WEIGHT + 1e-9);
        }
    }

    // -- status --

    #[test]
    fn generating_loads_as_pending() {
        let status: ShotStatus = serde_json::from_str("\"generating\"").unwrap();
        assert_eq!(status, ShotStatus::Pending);
    }

    #[test]
    fn missing_status_with_output_reconciles_to_completed() {
        let mut shot: Shot =
            serde_json::from_str(r#"{"shot_number":2,"output_image":"out.png"}"#).unwrap();
        shot.reconcile_status();
        assert_eq!(shot.status, ShotStatus::Completed);
    }

    #[test]
    fn failure_keeps_previous_output() {
        let mut shot = Shot::default();
        shot.mark_completed("a.png".into(), 0.85);
        shot.mark_generating();
        shot.mark_failed("timeout".into());
        assert_eq!(shot.output_image, "a.png");
        assert_eq!(shot.status, ShotStatus::Failed);
        assert_eq!(shot.last_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn empty_output_cannot_complete() {
        let mut shot = Shot::default();
        shot.mark_completed(String::new(), 0.9);
        assert_eq!(shot.status, ShotStatus::Failed);
    }

    // -- defaults --

    #[test]
    fn loaded_shot_defaults() {
        let shot: Shot = serde_json::from_str("{}").unwrap();
        assert_eq!(shot.camera.distance, "medium");
        assert_eq!(shot.camera.focal_length, 50.0);
        assert_eq!(shot.composition.depth_layers, 2);
        assert_eq!(shot.slot_weights, SlotWeights::default());
        assert_eq!(shot.template, ShotTemplate::T4StandardMedium);
    }

    #[test]
    fn from_template_copies_template_defaults() {
        let shot = Shot::from_template(3, ShotTemplate::T6Closeup);
        assert_eq!(shot.shot_number, 3);
        assert_eq!(shot.camera.distance, "close");
        assert!(shot.composition.background_blur);
        assert_eq!(shot.slot_weights.character, 0.95);
    }

    #[test]
    fn formatted_breakdown_skips_empty_fields() {
        let prompt = StandardShotPrompt {
            subject: "Ming".into(),
            angle: "eye level".into(),
            ..Default::default()
        };
        assert_eq!(prompt.to_formatted_string(), "Subject: Ming\nAngle: eye level");
    }
}
