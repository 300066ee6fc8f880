//! Scene and prop reference slots.

use serde::{Deserialize, Serialize};

/// Default per-scene consistency weight.
pub const DEFAULT_SCENE_WEIGHT: f64 = 0.6;

/// Default per-prop consistency weight.
pub const DEFAULT_PROP_WEIGHT: f64 = 0.7;

/// A location with optional spatial-layout and atmosphere reference images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub space_ref_image: String,
    pub atmosphere_ref_image: String,
    pub description: String,
    pub locked_features: Vec<String>,
    pub light_direction: String,
    /// `warm`, `cool`, `neutral` or free text.
    pub color_temperature: String,
    pub consistency_weight: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            id: super::new_entity_id("scene"),
            name: String::new(),
            space_ref_image: String::new(),
            atmosphere_ref_image: String::new(),
            description: String::new(),
            locked_features: vec!["space_structure".to_string()],
            light_direction: String::new(),
            color_temperature: String::new(),
            consistency_weight: DEFAULT_SCENE_WEIGHT,
        }
    }
}

impl Scene {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}

/// An object with a single reference image and size/material hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prop {
    pub id: String,
    pub name: String,
    pub ref_image: String,
    pub size_reference: String,
    pub material: String,
    pub consistency_weight: f64,
}

impl Default for Prop {
    fn default() -> Self {
        Self {
            id: super::new_entity_id("prop"),
            name: String::new(),
            ref_image: String::new(),
            size_reference: String::new(),
            material: String::new(),
            consistency_weight: DEFAULT_PROP_WEIGHT,
        }
    }
}

impl Prop {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_defaults() {
        let scene = Scene::new("Kitchen", "bright");
        assert!(scene.id.starts_with("scene_"));
        assert_eq!(scene.locked_features, vec!["space_structure"]);
        assert_eq!(scene.consistency_weight, DEFAULT_SCENE_WEIGHT);
    }

    #[test]
    fn prop_deserializes_with_missing_fields() {
        let prop: Prop = serde_json::from_str(r#"{"id":"prop_1","name":"Cup"}"#).unwrap();
        assert_eq!(prop.id, "prop_1");
        assert_eq!(prop.consistency_weight, DEFAULT_PROP_WEIGHT);
        assert_eq!(prop.material, "");
    }
}
