//! Project service: CRUD over an explicit [`StoryboardProject`].
//!
//! Every operation takes the project it mutates; there is no ambient
//! "current project". Operations that change what a prompt would say
//! recompile the stored prompts of the affected shots.

pub mod characters;
pub mod props;
pub mod scenes;
pub mod shots;

use serde::Serialize;

use crate::aspect::AspectRatio;
use crate::error::CoreError;
use crate::model::{StoryboardProject, StyleConfig, StyleMode};
use crate::prompt::refresh_shot;

pub use characters::{add_character, delete_character, list_characters, update_character, CharacterSummary};
pub use props::{add_prop, delete_prop, list_props};
pub use scenes::{add_scene, delete_scene, list_scenes, update_scene, SceneSummary};
pub use shots::{
    add_shot, delete_shot, list_shots, move_shot, update_shot, MoveDirection, ShotListing,
    ShotUpdate,
};

/// Weight applied to every style preset.
pub const PRESET_STYLE_WEIGHT: f64 = 0.4;

// ---------------------------------------------------------------------------
// Project lifecycle
// ---------------------------------------------------------------------------

/// Create a project. The aspect ratio must be one of the six supported ones.
pub fn create_project(name: &str, aspect_ratio: &str) -> Result<StoryboardProject, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("project name must not be empty".to_string()));
    }
    let ratio = AspectRatio::parse(aspect_ratio)?;
    tracing::info!(project = %name, aspect_ratio = %ratio, "Project created");
    Ok(StoryboardProject::new(name, ratio))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub character_count: usize,
    pub scene_count: usize,
    pub prop_count: usize,
    pub shot_count: usize,
    pub completed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub aspect_ratio: AspectRatio,
    pub created_at: String,
    pub updated_at: String,
    pub lock_seed: bool,
    pub generation_seed: i64,
    pub style: StyleConfig,
    pub stats: ProjectStats,
}

pub fn project_stats(project: &StoryboardProject) -> ProjectStats {
    ProjectStats {
        character_count: project.characters.len(),
        scene_count: project.scenes.len(),
        prop_count: project.props.len(),
        shot_count: project.shots.len(),
        completed_count: project.completed_count(),
    }
}

pub fn project_summary(project: &StoryboardProject) -> ProjectSummary {
    ProjectSummary {
        name: project.name.clone(),
        aspect_ratio: project.aspect_ratio,
        created_at: project.created_at.clone(),
        updated_at: project.updated_at.clone(),
        lock_seed: project.lock_seed,
        generation_seed: project.generation_seed,
        style: project.style.clone(),
        stats: project_stats(project),
    }
}

// ---------------------------------------------------------------------------
// Style and seed
// ---------------------------------------------------------------------------

/// Resolve a preset name to `(preset_name, render_type, lighting_style)`.
/// Unknown names resolve to cinematic.
fn style_preset(name: &str) -> (&'static str, &'static str, &'static str) {
    match name.trim().to_ascii_lowercase().as_str() {
        "anime" => ("Anime", "anime", "natural"),
        "comic" => ("Comic", "comic", "natural"),
        "realistic" => ("Realistic", "realistic", "natural"),
        "watercolor" => ("Watercolor", "watercolor", "natural"),
        _ => ("Cinematic", "realistic", "cinematic"),
    }
}

/// Build the style for a named preset without touching a project.
pub fn preset_style(name: &str) -> StyleConfig {
    let (preset, render, lighting) = style_preset(name);
    StyleConfig {
        mode: StyleMode::Preset,
        preset_name: preset.to_string(),
        render_type: render.to_string(),
        lighting_style: lighting.to_string(),
        weight: PRESET_STYLE_WEIGHT,
        ..Default::default()
    }
}

pub fn apply_style_preset(project: &mut StoryboardProject, name: &str) -> StyleConfig {
    update_style(project, preset_style(name));
    project.style.clone()
}

/// Replace the style wholesale.
pub fn update_style(project: &mut StoryboardProject, style: StyleConfig) {
    project.style = style;
    recompile_all(project);
}

/// Set the seed policy. A non-positive seed means "unset".
pub fn update_seed(project: &mut StoryboardProject, lock_seed: bool, generation_seed: i64) {
    project.lock_seed = lock_seed;
    project.generation_seed = if generation_seed > 0 { generation_seed } else { -1 };
    project.touch();
}

/// Recompile the stored prompt and breakdown of every shot.
pub fn recompile_all(project: &mut StoryboardProject) {
    let snapshot = project.clone();
    for shot in &mut project.shots {
        refresh_shot(shot, &snapshot);
    }
    project.touch();
}
