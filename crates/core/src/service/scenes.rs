//! Scene operations.

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Scene, StoryboardProject};

use super::recompile_all;

/// Weight given to scenes added through the service.
pub const SERVICE_SCENE_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub fn add_scene(
    project: &mut StoryboardProject,
    name: &str,
    description: &str,
    space_ref_image: &str,
) -> Result<Scene, CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("scene name must not be empty".to_string()));
    }
    let scene = Scene {
        space_ref_image: space_ref_image.to_string(),
        consistency_weight: SERVICE_SCENE_WEIGHT,
        ..Scene::new(name.trim(), description)
    };
    tracing::info!(project = %project.name, scene = %scene.name, id = %scene.id, "Scene added");
    project.scenes.push(scene.clone());
    project.touch();
    Ok(scene)
}

pub fn update_scene(
    project: &mut StoryboardProject,
    id: &str,
    mut update: Scene,
) -> Result<Scene, CoreError> {
    if update.name.trim().is_empty() {
        return Err(CoreError::Validation("scene name must not be empty".to_string()));
    }
    let slot = project
        .scenes
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| CoreError::not_found("scene", id))?;
    update.id = slot.id.clone();
    *slot = update.clone();
    recompile_all(project);
    Ok(update)
}

pub fn delete_scene(project: &mut StoryboardProject, id_or_name: &str) -> Result<Scene, CoreError> {
    let idx = project
        .scenes
        .iter()
        .position(|s| s.id == id_or_name)
        .or_else(|| project.scenes.iter().position(|s| s.name == id_or_name))
        .ok_or_else(|| CoreError::not_found("scene", id_or_name))?;
    let removed = project.scenes.remove(idx);
    tracing::info!(project = %project.name, scene = %removed.name, "Scene deleted");
    recompile_all(project);
    Ok(removed)
}

pub fn list_scenes(project: &StoryboardProject) -> Vec<SceneSummary> {
    project
        .scenes
        .iter()
        .map(|s| SceneSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::add_shot;
    use assert_matches::assert_matches;

    #[test]
    fn add_and_list() {
        let mut project = StoryboardProject::default();
        let cafe = add_scene(&mut project, "Cafe", "sunny", "space.png").unwrap();
        assert_eq!(cafe.consistency_weight, SERVICE_SCENE_WEIGHT);
        assert_eq!(cafe.space_ref_image, "space.png");
        assert_eq!(list_scenes(&project)[0].name, "Cafe");
        assert_matches!(add_scene(&mut project, "", "", ""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn update_recompiles_referencing_shots() {
        let mut project = StoryboardProject::default();
        let cafe = add_scene(&mut project, "Cafe", "sunny", "").unwrap();
        add_shot(&mut project, "wide", "", &[], &cafe.id);
        assert!(project.shots[0].generated_prompt.contains("in Cafe"));

        let renamed = Scene {
            name: "Diner".into(),
            ..cafe.clone()
        };
        update_scene(&mut project, &cafe.id, renamed).unwrap();
        assert!(project.shots[0].generated_prompt.contains("in Diner"));
    }

    #[test]
    fn delete_by_id() {
        let mut project = StoryboardProject::default();
        let cafe = add_scene(&mut project, "Cafe", "", "").unwrap();
        delete_scene(&mut project, &cafe.id).unwrap();
        assert!(project.scenes.is_empty());
        assert_matches!(delete_scene(&mut project, "Cafe"), Err(CoreError::NotFound { .. }));
    }
}
