//! Story outlines: the portable shape shared by built-in examples and imports.

use serde::{Deserialize, Serialize};

use crate::aspect::AspectRatio;
use crate::error::CoreError;
use crate::model::{Character, Scene, Shot, SlotWeights, StoryboardProject};
use crate::prompt::refresh_shot;
use crate::service::characters::SERVICE_CHARACTER_WEIGHT;
use crate::service::scenes::SERVICE_SCENE_WEIGHT;
use crate::service::{preset_style, project_stats, ProjectStats};
use crate::templates::ShotTemplate;

/// Slot weights applied to every shot built from an outline.
pub const OUTLINE_SHOT_WEIGHTS: SlotWeights = SlotWeights {
    character: 0.85,
    scene: 0.5,
    props: 0.6,
    style: 0.4,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryOutline {
    pub project_name: String,
    pub description: String,
    pub aspect_ratio: String,
    pub style: String,
    pub characters: Vec<OutlineCharacter>,
    pub scenes: Vec<OutlineScene>,
    pub shots: Vec<OutlineShot>,
}

impl Default for StoryOutline {
    fn default() -> Self {
        Self {
            project_name: "Imported Project".to_string(),
            description: String::new(),
            aspect_ratio: "16:9".to_string(),
            style: "cinematic".to_string(),
            characters: Vec::new(),
            scenes: Vec::new(),
            shots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineCharacter {
    pub name: String,
    pub description: String,
}

impl Default for OutlineCharacter {
    fn default() -> Self {
        Self {
            name: "Unnamed Character".to_string(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineScene {
    pub name: String,
    pub description: String,
}

impl Default for OutlineScene {
    fn default() -> Self {
        Self {
            name: "Unnamed Scene".to_string(),
            description: String::new(),
        }
    }
}

/// Characters and scene are referenced by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineShot {
    pub template: String,
    pub description: String,
    pub characters: Vec<String>,
    pub scene: String,
}

/// Short description of a built-in or imported story.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineSummary {
    pub name: String,
    pub description: String,
    pub stats: ProjectStats,
}

impl StoryOutline {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a fresh project: preset style, characters and scenes by name,
    /// shots with template camera and composition and compiled prompts.
    /// Names that resolve to nothing are dropped from the shot.
    pub fn to_project(&self) -> StoryboardProject {
        let ratio = AspectRatio::from_value(&self.aspect_ratio).unwrap_or_default();
        let mut project = StoryboardProject::new(self.project_name.clone(), ratio);
        project.narrative_text = self.description.clone();
        project.style = preset_style(&self.style);

        project.characters = self
            .characters
            .iter()
            .map(|c| Character {
                consistency_weight: SERVICE_CHARACTER_WEIGHT,
                ..Character::new(c.name.clone(), c.description.clone())
            })
            .collect();
        project.scenes = self
            .scenes
            .iter()
            .map(|s| Scene {
                consistency_weight: SERVICE_SCENE_WEIGHT,
                ..Scene::new(s.name.clone(), s.description.clone())
            })
            .collect();

        for outline_shot in &self.shots {
            let template = ShotTemplate::from_shorthand(&outline_shot.template);
            let mut shot = Shot::from_template(project.next_shot_number(), template);
            shot.description = outline_shot.description.clone();
            shot.characters_in_shot = outline_shot
                .characters
                .iter()
                .filter_map(|name| project.characters.iter().find(|c| &c.name == name))
                .map(|c| c.id.clone())
                .collect();
            shot.scene_id = project
                .scenes
                .iter()
                .find(|s| s.name == outline_shot.scene)
                .map(|s| s.id.clone())
                .unwrap_or_default();
            shot.slot_weights = OUTLINE_SHOT_WEIGHTS;
            refresh_shot(&mut shot, &project);
            project.shots.push(shot);
        }

        tracing::info!(
            project = %project.name,
            shots = project.shots.len(),
            "Project built from outline"
        );
        project
    }

    pub fn summary(&self) -> OutlineSummary {
        OutlineSummary {
            name: self.project_name.clone(),
            description: self.description.clone(),
            stats: project_stats(&self.to_project()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_resolves_names_and_drops_unknowns() {
        let outline = StoryOutline::from_json(
            r#"{
                "project_name": "Test",
                "aspect_ratio": "1:1",
                "style": "anime",
                "characters": [{"name": "A", "description": "hero"}],
                "scenes": [{"name": "Park"}],
                "shots": [
                    {"template": "wide", "description": "open", "scene": "Park"},
                    {"template": "closeup", "characters": ["A", "Nobody"], "scene": "Moon"}
                ]
            }"#,
        )
        .unwrap();
        let project = outline.to_project();

        assert_eq!(project.name, "Test");
        assert_eq!(project.aspect_ratio, AspectRatio::Square);
        assert_eq!(project.style.preset_name, "Anime");
        assert_eq!(project.shots.len(), 2);
        assert_eq!(project.shots[0].scene_id, project.scenes[0].id);
        assert_eq!(project.shots[1].characters_in_shot, vec![project.characters[0].id.clone()]);
        assert_eq!(project.shots[1].scene_id, "");
        assert_eq!(project.shots[1].template, ShotTemplate::T6Closeup);
        assert_eq!(project.shots[1].slot_weights, OUTLINE_SHOT_WEIGHTS);
        assert!(project.shots.iter().all(|s| !s.generated_prompt.is_empty()));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let outline = StoryOutline::from_json(r#"{"characters":[{}]}"#).unwrap();
        assert_eq!(outline.project_name, "Imported Project");
        assert_eq!(outline.characters[0].name, "Unnamed Character");
        assert_eq!(outline.to_project().aspect_ratio, AspectRatio::Widescreen);
    }
}
