//! The ten-field standard shot breakdown, built from per-template tables.

use crate::model::{Scene, Shot, StandardShotPrompt, StoryboardProject, StyleConfig};
use crate::templates::ShotTemplate;
use crate::text::{join_non_empty, truncate_chars};

use ShotTemplate::*;

fn shot_type(template: ShotTemplate) -> &'static str {
    match template {
        T1EstablishingWide => "extreme wide/full shot",
        T2EnvironmentMedium => "full/medium-wide shot",
        T3FramedShot => "medium shot (framed)",
        T4StandardMedium => "medium shot",
        T5OverShoulder => "medium close-up (over-the-shoulder)",
        T6Closeup => "close-up/near shot",
        T7LowAngle => "medium shot (low angle)",
        T8Following => "medium-wide (tracking)",
        T9Pov => "subjective view",
    }
}

fn camera_movement(template: ShotTemplate) -> &'static str {
    match template {
        T1EstablishingWide => "static/slow pan",
        T2EnvironmentMedium => "static/slight push-pull",
        T3FramedShot => "static",
        T4StandardMedium => "static/slight push-in",
        T5OverShoulder => "static/slight lateral move",
        T6Closeup => "static/slow push-in",
        T7LowAngle => "static/slow crane up",
        T8Following => "tracking/stabilizer follow",
        T9Pov => "handheld/subjective movement",
    }
}

fn angle(template: ShotTemplate) -> &'static str {
    match template {
        T1EstablishingWide => "high angle overhead (god's-eye)",
        T2EnvironmentMedium => "eye level/slightly high",
        T3FramedShot | T4StandardMedium => "eye level",
        T5OverShoulder | T6Closeup => "eye level/slightly low",
        T7LowAngle => "low angle looking up",
        T8Following => "mid-low/slightly high",
        T9Pov => "first-person subjective",
    }
}

fn composition(template: ShotTemplate) -> &'static str {
    match template {
        T1EstablishingWide => "symmetry/rule of thirds/leading lines",
        T2EnvironmentMedium => "rule of thirds/character-environment balance",
        T3FramedShot => "frame composition/layered composition",
        T4StandardMedium => "rule of thirds/centered",
        T5OverShoulder => "rule of thirds/foreground blur",
        T6Closeup => "centered/rule of thirds",
        T7LowAngle => "diagonal/rule of thirds/low-angle perspective",
        T8Following => "centered/depth leading",
        T9Pov => "subjective gaze/focal composition",
    }
}

fn dynamic_control(template: ShotTemplate) -> &'static str {
    match template {
        T1EstablishingWide => "static/slight motion",
        T2EnvironmentMedium => "slight motion",
        T3FramedShot => "static",
        T4StandardMedium => "slight/moderate motion",
        T5OverShoulder => "slight motion",
        T6Closeup => "static/micro-expression",
        T7LowAngle => "moderate motion/static dominance",
        T8Following => "moderate/dynamic motion",
        T9Pov => "dynamic/subjective motion",
    }
}

fn template_technique(template: ShotTemplate) -> Option<&'static str> {
    match template {
        T1EstablishingWide => Some("aerial/wide fixed position"),
        T3FramedShot => Some("door/window/architecture as frame"),
        T5OverShoulder => Some("shallow depth of field foreground blur"),
        T6Closeup => Some("shallow depth of field/background blur"),
        T7LowAngle => Some("wide lens exaggerated perspective"),
        T8Following => Some("stabilizer/steadicam follow"),
        T9Pov => Some("handheld simulating subjective view"),
        T2EnvironmentMedium | T4StandardMedium => None,
    }
}

// ---------------------------------------------------------------------------
// Field builders
// ---------------------------------------------------------------------------

fn subject(shot: &Shot, project: &StoryboardProject) -> String {
    let names: Vec<&str> = project
        .characters_in(shot)
        .map(|c| c.name.as_str())
        .chain(project.props_in(shot).map(|p| p.name.as_str()))
        .collect();
    if names.is_empty() {
        "environment/empty shot".to_string()
    } else {
        names.join(", ")
    }
}

fn atmosphere(scene: Option<&Scene>, style: &StyleConfig) -> String {
    let tone = match style.color_tone.as_str() {
        "warm" => "warm",
        "cool" => "cold",
        "high_saturation" => "vivid",
        "low_saturation" => "restrained",
        "neutral" => "plain natural",
        _ => "",
    };
    let light = match style.lighting_style.as_str() {
        "natural" => "natural comfortable",
        "studio" => "polished",
        "neon" => "cyberpunk/futuristic",
        "backlit" => "mysterious/dramatic",
        "cinematic" => "cinematic",
        _ => "",
    };
    let temperature = match scene.map(|s| s.color_temperature.as_str()) {
        Some("warm") => "cozy",
        Some("cool") => "chilly",
        Some("neutral") => "neutral",
        _ => "",
    };
    let joined = join_non_empty(&[tone, light, temperature], "/");
    if joined.is_empty() {
        "natural".to_string()
    } else {
        joined
    }
}

fn environment(scene: Option<&Scene>) -> String {
    let Some(scene) = scene else {
        return "unspecified scene".to_string();
    };
    let light = if scene.light_direction.is_empty() {
        String::new()
    } else {
        format!("light: {}", scene.light_direction)
    };
    let joined = join_non_empty(
        &[
            scene.name.as_str(),
            truncate_chars(&scene.description, 60),
            light.as_str(),
        ],
        ", ",
    );
    if joined.is_empty() {
        "unspecified".to_string()
    } else {
        joined
    }
}

fn special_technique(shot: &Shot) -> String {
    let mut techniques: Vec<&str> = template_technique(shot.template).into_iter().collect();
    if shot.composition.foreground_blur {
        techniques.push("foreground blur");
    }
    if shot.composition.background_blur {
        techniques.push("background blur");
    }
    if shot.composition.depth_layers >= 3 {
        techniques.push("multi-layer depth");
    }
    if techniques.is_empty() {
        "standard shooting".to_string()
    } else {
        techniques.join(", ")
    }
}

fn style_consistency(style: &StyleConfig) -> String {
    let render = match style.render_type.as_str() {
        "realistic" => "realistic style",
        "illustration" => "illustration style",
        "3d_render" => "3D render",
        "watercolor" => "watercolor style",
        "anime" => "anime style",
        "comic" => "comic style",
        _ => "",
    };
    let tone = match style.color_tone.as_str() {
        "warm" => "warm tones",
        "cool" => "cool tones",
        "high_saturation" => "high saturation",
        "low_saturation" => "low saturation",
        "neutral" => "neutral tones",
        _ => "",
    };
    let light = match style.lighting_style.as_str() {
        "natural" => "natural light",
        "studio" => "studio lighting",
        "neon" => "neon lighting",
        "backlit" => "backlight",
        "cinematic" => "cinematic lighting",
        _ => "",
    };
    let texture = match style.texture.as_str() {
        "film_grain" => "film grain",
        "digital_clean" => "digital clean",
        "noise" => "slight noise",
        _ => "",
    };
    let joined = join_non_empty(&[render, tone, light, texture], ", ");
    if joined.is_empty() {
        "standard style".to_string()
    } else {
        joined
    }
}

/// Build the breakdown. Like the positive prompt this never fails.
pub fn standard_breakdown(shot: &Shot, project: &StoryboardProject) -> StandardShotPrompt {
    let template = shot.template;
    let scene = project.scene_of(shot);

    let shot_type_text = if shot.description.is_empty() {
        shot_type(template).to_string()
    } else {
        format!("{} - {}", shot_type(template), shot.description)
    };
    let angle_text = if shot.action.is_empty() {
        angle(template).to_string()
    } else {
        format!("{}, {}", angle(template), shot.action)
    };
    let dynamic_text = if !shot.action.is_empty() {
        shot.action.clone()
    } else if !shot.description.is_empty() {
        format!(
            "{} - {}",
            dynamic_control(template),
            truncate_chars(&shot.description, 50)
        )
    } else {
        dynamic_control(template).to_string()
    };

    StandardShotPrompt {
        subject: subject(shot, project),
        shot_type: shot_type_text,
        atmosphere: atmosphere(scene, &project.style),
        environment: environment(scene),
        camera_movement: camera_movement(template).to_string(),
        angle: angle_text,
        special_technique: special_technique(shot),
        composition: composition(template).to_string(),
        style_consistency: style_consistency(&project.style),
        dynamic_control: dynamic_text,
    }
}
