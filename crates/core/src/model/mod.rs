//! Entity model: the objects a storyboard project owns.
//!
//! Shots reference characters, scenes and props by id only. Every lookup
//! returns `Option` so a dangling id is treated as absent.

pub mod character;
pub mod project;
pub mod scene;
pub mod shot;
pub mod style;

pub use character::{Character, CharacterAppearance, CharacterOutfit};
pub use project::{ProjectDocument, ProjectMeta, References, StoryboardProject};
pub use scene::{Prop, Scene};
pub use shot::{
    CameraSettings, CompositionSettings, Shot, ShotStatus, SlotWeights, StandardShotPrompt,
};
pub use style::{StyleConfig, StyleMode};

/// Generate an entity id of the form `{prefix}_{8 hex}`.
pub fn new_entity_id(prefix: &str) -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &simple[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_prefixed_and_unique() {
        let a = new_entity_id("scene");
        let b = new_entity_id("scene");
        assert!(a.starts_with("scene_"));
        assert_eq!(a.len(), 14);
        assert!(a["scene_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
