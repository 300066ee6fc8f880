//! Project-level consistency prefix for backends without structured references.

use crate::model::{StoryboardProject, StyleConfig};
use crate::text::truncate_chars;

/// Characters considered for the prefix, in project order.
pub const PREFIX_CHARACTER_LIMIT: usize = 3;

const PREFIX_CUSTOM_CHARS: usize = 80;

fn style_parts(style: &StyleConfig) -> Vec<&str> {
    let mut parts = Vec::new();

    let render = match style.render_type.as_str() {
        "realistic" => "photorealistic",
        "illustration" => "digital illustration",
        "3d_render" => "3D rendered",
        "watercolor" => "watercolor style",
        "anime" => "anime style",
        "comic" => "comic book style",
        other => other,
    };
    if !render.is_empty() {
        parts.push(render);
    }

    match style.color_tone.as_str() {
        "warm" => parts.push("warm color palette"),
        "cool" => parts.push("cool color palette"),
        "high_saturation" => parts.push("vibrant colors"),
        "low_saturation" => parts.push("muted colors"),
        _ => {}
    }

    match style.lighting_style.as_str() {
        "natural" => parts.push("natural lighting"),
        "studio" => parts.push("studio lighting"),
        "cinematic" => parts.push("cinematic lighting"),
        "neon" => parts.push("neon lighting"),
        _ => {}
    }

    let custom = truncate_chars(&style.custom_description, PREFIX_CUSTOM_CHARS);
    if !custom.is_empty() {
        parts.push(custom);
    }
    parts
}

/// `[Style: ...]` followed by the descriptors of the first three characters
/// that carry consistency information, space separated. Empty when there is
/// nothing to say.
pub fn consistency_prefix(project: &StoryboardProject) -> String {
    let mut parts = Vec::new();

    let style = style_parts(&project.style);
    if !style.is_empty() {
        parts.push(format!("[Style: {}]", style.join(", ")));
    }

    parts.extend(
        project
            .characters
            .iter()
            .take(PREFIX_CHARACTER_LIMIT)
            .filter(|c| c.has_consistency_info())
            .map(|c| c.consistency_descriptor()),
    );

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Character;

    #[test]
    fn prefix_combines_style_and_characters() {
        let mut project = StoryboardProject::default();
        project.characters.push(Character::new("A", "tall"));
        project.characters.push(Character::new("B", ""));
        project.characters.push(Character::new("C", "short"));
        project.characters.push(Character::new("D", "hidden"));

        assert_eq!(
            consistency_prefix(&project),
            "[Style: photorealistic, natural lighting] [A: tall] [C: short]"
        );
    }

    #[test]
    fn empty_project_has_empty_prefix() {
        let project = StoryboardProject {
            style: StyleConfig::empty(),
            ..Default::default()
        };
        assert_eq!(consistency_prefix(&project), "");
    }

    #[test]
    fn unknown_render_type_passes_through() {
        let project = StoryboardProject {
            style: StyleConfig {
                render_type: "pixel_art".into(),
                color_tone: "high_saturation".into(),
                ..StyleConfig::empty()
            },
            ..Default::default()
        };
        assert_eq!(consistency_prefix(&project), "[Style: pixel_art, vibrant colors]");
    }
}
