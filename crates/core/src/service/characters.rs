//! Character operations.

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Character, StoryboardProject};

use super::recompile_all;

/// Weight given to characters added through the service.
pub const SERVICE_CHARACTER_WEIGHT: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ref_image_count: usize,
}

pub fn add_character(
    project: &mut StoryboardProject,
    name: &str,
    description: &str,
    ref_images: Vec<String>,
) -> Result<Character, CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("character name must not be empty".to_string()));
    }
    let character = Character {
        ref_images,
        consistency_weight: SERVICE_CHARACTER_WEIGHT,
        ..Character::new(name.trim(), description)
    };
    tracing::info!(project = %project.name, character = %character.name, id = %character.id, "Character added");
    project.characters.push(character.clone());
    project.touch();
    Ok(character)
}

/// Replace the character with `id`, keeping its id.
pub fn update_character(
    project: &mut StoryboardProject,
    id: &str,
    mut update: Character,
) -> Result<Character, CoreError> {
    if update.name.trim().is_empty() {
        return Err(CoreError::Validation("character name must not be empty".to_string()));
    }
    let slot = project
        .characters
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| CoreError::not_found("character", id))?;
    update.id = slot.id.clone();
    *slot = update.clone();
    recompile_all(project);
    Ok(update)
}

/// Delete by id or, failing that, by name. Shots keep the dangling id.
pub fn delete_character(project: &mut StoryboardProject, id_or_name: &str) -> Result<Character, CoreError> {
    let idx = project
        .characters
        .iter()
        .position(|c| c.id == id_or_name)
        .or_else(|| project.characters.iter().position(|c| c.name == id_or_name))
        .ok_or_else(|| CoreError::not_found("character", id_or_name))?;
    let removed = project.characters.remove(idx);
    tracing::info!(project = %project.name, character = %removed.name, "Character deleted");
    recompile_all(project);
    Ok(removed)
}

pub fn list_characters(project: &StoryboardProject) -> Vec<CharacterSummary> {
    project
        .characters
        .iter()
        .map(|c| CharacterSummary {
            id: c.id.clone(),
            name: c.name.clone(),
            description: c.description.clone(),
            ref_image_count: c.ref_images.len(),
        })
        .collect()
}
