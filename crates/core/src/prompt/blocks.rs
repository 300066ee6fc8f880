//! The ordered blocks that make up a positive prompt.
//!
//! Each builder returns an empty string when it has nothing to say; the
//! caller drops empty blocks before joining.

use crate::model::{
    CameraSettings, Character, CompositionSettings, Prop, Scene, Shot, StyleConfig,
};
use crate::templates::ShotTemplate;
use crate::text::{join_non_empty, truncate_chars};

/// Appended when technical parameters are requested.
pub const TECHNICAL_SUFFIX: &str = "8K resolution, highly detailed";

const SCENE_DESCRIPTION_CHARS: usize = 150;
const DIALOGUE_CHARS: usize = 80;
const STYLE_CUSTOM_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

fn preset_phrase(preset: &str) -> Option<&'static str> {
    Some(match preset {
        "Cartoon2D" => "2D cartoon style, flat colors, clean lines, cel shading",
        "Anime" => "anime style, vibrant colors, cel shading, Japanese animation",
        "Comic" => "comic book style, bold outlines, halftone dots",
        "Watercolor" => "watercolor painting style, soft edges, flowing colors",
        "Realistic3D" => "3D realistic render, photorealistic 3D, high detail",
        "Cinematic" => "cinematic style, film grain, dramatic lighting, movie quality",
        "GameCG" => "game CG style, high quality 3D render, video game graphics",
        "Cyberpunk" => "cyberpunk style, neon lights, futuristic, sci-fi atmosphere",
        _ => return None,
    })
}

fn render_phrase(render: &str) -> &str {
    match render {
        "realistic" => "photorealistic rendering",
        "illustration" => "digital illustration style",
        "3d_render" => "3D rendered",
        "watercolor" => "watercolor painting style",
        "anime" => "anime style",
        "comic" => "comic book style",
        "cartoon" => "2D cartoon style, flat colors, clean lines",
        other => other,
    }
}

fn tone_phrase(tone: &str) -> Option<&'static str> {
    Some(match tone {
        "warm" => "warm color palette",
        "cool" => "cool color palette",
        "high_saturation" => "vibrant saturated colors",
        "low_saturation" => "muted desaturated colors",
        "neutral" => "balanced natural colors",
        _ => return None,
    })
}

fn lighting_phrase(lighting: &str) -> Option<&'static str> {
    Some(match lighting {
        "natural" => "natural lighting",
        "studio" => "studio lighting setup",
        "neon" => "neon lighting, cyberpunk atmosphere",
        "backlit" => "dramatic backlighting, rim light",
        "cinematic" => "cinematic lighting, film-like",
        _ => return None,
    })
}

fn texture_phrase(texture: &str) -> Option<&'static str> {
    Some(match texture {
        "film_grain" => "film grain texture, analog look",
        "digital_clean" => "clean digital render",
        "noise" => "subtle noise texture",
        _ => return None,
    })
}

/// A known preset name wins over the render type. Unknown tone, lighting and
/// texture values are dropped; an unknown render type passes through.
pub fn style_block(style: &StyleConfig) -> String {
    let lead = match preset_phrase(&style.preset_name) {
        Some(phrase) => phrase,
        None => render_phrase(&style.render_type),
    };
    let parts = [
        lead,
        tone_phrase(&style.color_tone).unwrap_or(""),
        lighting_phrase(&style.lighting_style).unwrap_or(""),
        texture_phrase(&style.texture).unwrap_or(""),
        truncate_chars(&style.custom_description, STYLE_CUSTOM_CHARS),
    ];
    join_non_empty(&parts, ", ")
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

pub fn camera_block(camera: &CameraSettings) -> String {
    let distance = match camera.distance.as_str() {
        "extreme_wide" => "extreme wide shot",
        "wide" => "wide shot",
        "medium_wide" => "medium wide shot",
        "close" => "close-up shot",
        _ => "medium shot",
    };
    let mut parts = vec![distance];

    let vertical = camera.vertical_angle;
    if vertical < -20.0 {
        parts.push("high angle overhead view");
    } else if vertical < -5.0 {
        parts.push("high angle shot");
    } else if vertical > 20.0 {
        parts.push("low angle heroic shot");
    } else if vertical > 5.0 {
        parts.push("slightly low angle");
    }

    if camera.horizontal_angle.abs() > 15.0 {
        parts.push("angled perspective");
    }

    if camera.focal_length <= 24.0 {
        parts.push("wide lens perspective");
    } else if camera.focal_length >= 85.0 {
        parts.push("telephoto compression, shallow depth of field");
    }

    parts.join(", ")
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

fn character_phrase(character: &Character) -> String {
    if character.has_consistency_info() {
        return character.consistency_descriptor();
    }
    if character.description.is_empty() {
        character.name.clone()
    } else {
        format!("{} ({})", character.name, character.description)
    }
}

/// `characters` must already be resolved in shot order.
pub fn character_block(characters: &[&Character], template: ShotTemplate) -> String {
    let descriptions: Vec<String> = characters
        .iter()
        .enumerate()
        .map(|(idx, character)| {
            let mut parts = vec![character_phrase(character)];
            match template {
                ShotTemplate::T5OverShoulder if idx == 0 => {
                    parts.push("in foreground (back/shoulder visible, slightly blurred)".into())
                }
                ShotTemplate::T5OverShoulder => parts.push("in focus, facing camera".into()),
                ShotTemplate::T9Pov => parts.push("(hands may be visible in frame)".into()),
                ShotTemplate::T8Following => parts.push("seen from behind, back view".into()),
                _ => {}
            }
            join_non_empty(&parts, " ")
        })
        .collect();
    join_non_empty(&descriptions, ", ")
}

// ---------------------------------------------------------------------------
// Action, scene, props, composition
// ---------------------------------------------------------------------------

pub fn action_block(shot: &Shot) -> String {
    let dialogue = if shot.dialogue.is_empty() {
        String::new()
    } else {
        format!(
            "during dialogue: '{}...'",
            truncate_chars(&shot.dialogue, DIALOGUE_CHARS)
        )
    };
    join_non_empty(
        &[shot.action.as_str(), dialogue.as_str(), shot.description.as_str()],
        ", ",
    )
}

pub fn color_temperature_phrase(temperature: &str) -> &str {
    match temperature {
        "warm" => "warm golden tones",
        "cool" => "cool blue tones",
        "neutral" => "neutral balanced lighting",
        other => other,
    }
}

pub fn scene_block(scene: Option<&Scene>) -> String {
    let Some(scene) = scene else {
        return String::new();
    };
    let name = if scene.name.is_empty() {
        String::new()
    } else {
        format!("in {}", scene.name)
    };
    let light = if scene.light_direction.is_empty() {
        String::new()
    } else {
        format!("lighting from {}", scene.light_direction)
    };
    join_non_empty(
        &[
            name.as_str(),
            truncate_chars(&scene.description, SCENE_DESCRIPTION_CHARS),
            light.as_str(),
            color_temperature_phrase(&scene.color_temperature),
        ],
        ", ",
    )
}

pub fn props_block(props: &[&Prop], template: ShotTemplate) -> String {
    let descriptions: Vec<String> = props
        .iter()
        .map(|prop| {
            let mut desc = prop.name.clone();
            if !prop.material.is_empty() {
                desc.push_str(&format!(" ({})", prop.material));
            }
            if !prop.size_reference.is_empty() {
                desc.push_str(&format!(", {}", prop.size_reference));
            }
            if template == ShotTemplate::T6Closeup {
                desc = format!("focus on {desc}, detailed view");
            }
            desc
        })
        .collect();

    if descriptions.is_empty() {
        String::new()
    } else {
        format!("featuring {}", descriptions.join(", "))
    }
}

pub fn composition_block(composition: &CompositionSettings) -> String {
    let mut parts = Vec::new();
    if composition.rule_of_thirds {
        match composition.subject_position.as_str() {
            "left_third" => parts.push("subject positioned left third"),
            "right_third" => parts.push("subject positioned right third"),
            "center" => parts.push("centered composition"),
            _ => {}
        }
    }
    if composition.foreground_blur {
        parts.push("foreground blur");
    }
    if composition.background_blur {
        parts.push("background bokeh");
    }
    if composition.depth_layers >= 3 {
        parts.push("layered depth, foreground-midground-background");
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- style --

    #[test]
    fn preset_takes_precedence_over_render_type() {
        let style = StyleConfig {
            preset_name: "Anime".into(),
            render_type: "realistic".into(),
            color_tone: "warm".into(),
            lighting_style: "unknown".into(),
            texture: String::new(),
            ..StyleConfig::empty()
        };
        assert_eq!(
            style_block(&style),
            "anime style, vibrant colors, cel shading, Japanese animation, warm color palette"
        );
    }

    #[test]
    fn unknown_render_type_passes_through() {
        let style = StyleConfig {
            render_type: "claymation".into(),
            ..StyleConfig::empty()
        };
        assert_eq!(style_block(&style), "claymation");
    }

    #[test]
    fn empty_render_type_leaves_no_leading_separator() {
        let style = StyleConfig {
            color_tone: "cool".into(),
            ..StyleConfig::empty()
        };
        assert_eq!(style_block(&style), "cool color palette");
        assert_eq!(style_block(&StyleConfig::empty()), "");
    }

    #[test]
    fn custom_description_is_truncated() {
        let style = StyleConfig {
            custom_description: "x".repeat(150),
            ..StyleConfig::empty()
        };
        assert_eq!(style_block(&style).chars().count(), 100);
    }

    // -- camera --

    #[test]
    fn camera_angle_thresholds() {
        let mut camera = CameraSettings::default();
        assert_eq!(camera_block(&camera), "medium shot");

        camera.vertical_angle = -45.0;
        camera.focal_length = 24.0;
        camera.distance = "extreme_wide".into();
        assert_eq!(
            camera_block(&camera),
            "extreme wide shot, high angle overhead view, wide lens perspective"
        );

        camera.vertical_angle = 22.0;
        camera.horizontal_angle = -25.0;
        camera.focal_length = 85.0;
        camera.distance = "dolly".into();
        assert_eq!(
            camera_block(&camera),
            "medium shot, low angle heroic shot, angled perspective, \
             telephoto compression, shallow depth of field"
        );
    }

    #[test]
    fn camera_boundaries_are_exclusive() {
        let camera = CameraSettings {
            vertical_angle: 5.0,
            horizontal_angle: 15.0,
            ..Default::default()
        };
        assert_eq!(camera_block(&camera), "medium shot");
    }

    // -- characters --

    #[test]
    fn over_shoulder_marks_first_character_foreground() {
        let a = Character::new("A", "");
        let b = Character::new("B", "tall");
        let block = character_block(&[&a, &b], ShotTemplate::T5OverShoulder);
        assert_eq!(
            block,
            "A in foreground (back/shoulder visible, slightly blurred), \
             [B: tall] in focus, facing camera"
        );
    }

    #[test]
    fn following_and_pov_modifiers() {
        let a = Character::new("A", "");
        assert_eq!(
            character_block(&[&a], ShotTemplate::T8Following),
            "A seen from behind, back view"
        );
        assert_eq!(
            character_block(&[&a], ShotTemplate::T9Pov),
            "A (hands may be visible in frame)"
        );
        assert_eq!(character_block(&[], ShotTemplate::T9Pov), "");
    }

    // -- action --

    #[test]
    fn action_block_orders_action_dialogue_description() {
        let shot = Shot {
            action: "runs".into(),
            dialogue: "Wait for me".into(),
            description: "rain".into(),
            ..Default::default()
        };
        assert_eq!(action_block(&shot), "runs, during dialogue: 'Wait for me...', rain");
    }

    // -- scene and props --

    #[test]
    fn scene_block_maps_temperature() {
        let scene = Scene {
            name: "Cafe".into(),
            description: "sunny".into(),
            light_direction: "left".into(),
            color_temperature: "warm".into(),
            ..Scene::new("", "")
        };
        assert_eq!(
            scene_block(Some(&scene)),
            "in Cafe, sunny, lighting from left, warm golden tones"
        );
        assert_eq!(scene_block(None), "");
    }

    #[test]
    fn closeup_wraps_props() {
        let cup = Prop {
            material: "ceramic".into(),
            size_reference: "palm-sized".into(),
            ..Prop::new("Cup")
        };
        assert_eq!(
            props_block(&[&cup], ShotTemplate::T6Closeup),
            "featuring focus on Cup (ceramic), palm-sized, detailed view"
        );
        assert_eq!(props_block(&[&cup], ShotTemplate::T4StandardMedium), "featuring Cup (ceramic), palm-sized");
        assert_eq!(props_block(&[], ShotTemplate::T6Closeup), "");
    }

    // -- composition --

    #[test]
    fn composition_position_requires_rule_of_thirds() {
        let mut composition = CompositionSettings {
            subject_position: "left_third".into(),
            foreground_blur: true,
            depth_layers: 3,
            ..Default::default()
        };
        assert_eq!(
            composition_block(&composition),
            "subject positioned left third, foreground blur, \
             layered depth, foreground-midground-background"
        );
        composition.rule_of_thirds = false;
        composition.depth_layers = 1;
        assert_eq!(composition_block(&composition), "foreground blur");
    }
}
