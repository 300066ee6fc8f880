//! Shot operations. Numbering is kept dense (`1..=N`) after every mutation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{
    CameraSettings, CompositionSettings, Shot, ShotStatus, SlotWeights, StoryboardProject,
};
use crate::prompt::refresh_shot;
use crate::templates::ShotTemplate;

/// Props slot weight for shots added through the service.
pub const SERVICE_PROPS_WEIGHT: f64 = 0.6;

/// Style slot weight for shots added through the service.
pub const SERVICE_STYLE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Partial update; `None` fields are left as they are.
///
/// Changing the template without supplying camera or composition resets them
/// to the new template's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShotUpdate {
    pub template: Option<ShotTemplate>,
    pub description: Option<String>,
    pub characters_in_shot: Option<Vec<String>>,
    pub scene_id: Option<String>,
    pub props_in_shot: Option<Vec<String>>,
    pub dialogue: Option<String>,
    pub action: Option<String>,
    pub camera: Option<CameraSettings>,
    pub composition: Option<CompositionSettings>,
    pub slot_weights: Option<SlotWeights>,
}

/// A shot as shown in listings, with ids resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotListing {
    pub shot_number: u32,
    pub template: ShotTemplate,
    pub template_name: &'static str,
    pub scene: String,
    pub characters: Vec<String>,
    pub description: String,
    pub status: ShotStatus,
    pub output_image: String,
}

/// Append a shot built from `template` (a persisted value, short code or
/// shorthand such as `closeup`) and compile its prompt.
pub fn add_shot(
    project: &mut StoryboardProject,
    template: &str,
    description: &str,
    character_ids: &[String],
    scene_id: &str,
) -> Shot {
    let template = ShotTemplate::from_shorthand(template);
    let def = template.definition();

    let mut shot = Shot::from_template(project.next_shot_number(), template);
    shot.description = description.to_string();
    shot.characters_in_shot = character_ids.to_vec();
    shot.scene_id = scene_id.to_string();
    shot.slot_weights = SlotWeights {
        character: def.slot_weights.character,
        scene: def.slot_weights.scene,
        props: SERVICE_PROPS_WEIGHT,
        style: SERVICE_STYLE_WEIGHT,
    };
    refresh_shot(&mut shot, project);

    tracing::info!(
        project = %project.name,
        shot_number = shot.shot_number,
        template = %template,
        "Shot added"
    );
    project.shots.push(shot.clone());
    project.touch();
    shot
}

pub fn update_shot(
    project: &mut StoryboardProject,
    shot_number: u32,
    update: ShotUpdate,
) -> Result<Shot, CoreError> {
    let idx = index_of(project, shot_number)?;
    let mut shot = project.shots[idx].clone();

    if let Some(template) = update.template {
        if template != shot.template {
            let def = template.definition();
            shot.template = template;
            shot.camera = def.camera.clone();
            shot.composition = def.composition.clone();
        }
    }
    if let Some(description) = update.description {
        shot.description = description;
    }
    if let Some(ids) = update.characters_in_shot {
        shot.characters_in_shot = ids;
    }
    if let Some(scene_id) = update.scene_id {
        shot.scene_id = scene_id;
    }
    if let Some(ids) = update.props_in_shot {
        shot.props_in_shot = ids;
    }
    if let Some(dialogue) = update.dialogue {
        shot.dialogue = dialogue;
    }
    if let Some(action) = update.action {
        shot.action = action;
    }
    if let Some(camera) = update.camera {
        shot.camera = camera;
    }
    if let Some(composition) = update.composition {
        shot.composition = composition;
    }
    if let Some(weights) = update.slot_weights {
        shot.slot_weights = weights;
    }

    refresh_shot(&mut shot, project);
    project.shots[idx] = shot.clone();
    project.touch();
    Ok(shot)
}

/// Renumbering while a generation is in flight would attach its result to
/// the wrong shot.
fn ensure_not_generating(project: &StoryboardProject) -> Result<(), CoreError> {
    match project.shots.iter().find(|s| s.status == ShotStatus::Generating) {
        Some(shot) => Err(CoreError::Conflict(format!(
            "shot {} is generating; reordering is unavailable until it finishes",
            shot.shot_number
        ))),
        None => Ok(()),
    }
}

pub fn delete_shot(project: &mut StoryboardProject, shot_number: u32) -> Result<Shot, CoreError> {
    let idx = index_of(project, shot_number)?;
    ensure_not_generating(project)?;
    let removed = project.shots.remove(idx);
    project.renumber_shots();
    project.touch();
    tracing::info!(project = %project.name, shot_number, "Shot deleted");
    Ok(removed)
}

/// Swap a shot with its neighbour. Moving past either end is rejected.
pub fn move_shot(
    project: &mut StoryboardProject,
    shot_number: u32,
    direction: MoveDirection,
) -> Result<(), CoreError> {
    let idx = index_of(project, shot_number)?;
    ensure_not_generating(project)?;
    let target = match direction {
        MoveDirection::Up if idx > 0 => idx - 1,
        MoveDirection::Down if idx + 1 < project.shots.len() => idx + 1,
        _ => {
            return Err(CoreError::Validation(format!(
                "cannot move shot {shot_number} {}",
                match direction {
                    MoveDirection::Up => "up",
                    MoveDirection::Down => "down",
                }
            )))
        }
    };
    project.shots.swap(idx, target);
    project.renumber_shots();
    project.touch();
    Ok(())
}

pub fn list_shots(project: &StoryboardProject) -> Vec<ShotListing> {
    project
        .shots
        .iter()
        .map(|shot| ShotListing {
            shot_number: shot.shot_number,
            template: shot.template,
            template_name: shot.template.definition().name,
            scene: project
                .scene_of(shot)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            characters: project.characters_in(shot).map(|c| c.name.clone()).collect(),
            description: shot.description.clone(),
            status: shot.status,
            output_image: shot.output_image.clone(),
        })
        .collect()
}

fn index_of(project: &StoryboardProject, shot_number: u32) -> Result<usize, CoreError> {
    project
        .shots
        .iter()
        .position(|s| s.shot_number == shot_number)
        .ok_or_else(|| CoreError::not_found("shot", shot_number))
}
