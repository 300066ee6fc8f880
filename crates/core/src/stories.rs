//! Built-in example stories.

use std::sync::LazyLock;

use crate::error::CoreError;
use crate::model::StoryboardProject;
use crate::outline::{OutlineCharacter, OutlineScene, OutlineShot, StoryOutline};

fn character(name: &str, description: &str) -> OutlineCharacter {
    OutlineCharacter {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn scene(name: &str, description: &str) -> OutlineScene {
    OutlineScene {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn shot(template: &str, description: &str, characters: &[&str], scene: &str) -> OutlineShot {
    OutlineShot {
        template: template.to_string(),
        description: description.to_string(),
        characters: characters.iter().map(|c| c.to_string()).collect(),
        scene: scene.to_string(),
    }
}

static STORIES: LazyLock<Vec<StoryOutline>> = LazyLock::new(|| {
    vec![
        StoryOutline {
            project_name: "Coffee Shop".to_string(),
            description: "A warm romance opening: two strangers meet by chance in a cafe".to_string(),
            aspect_ratio: "16:9".to_string(),
            style: "cinematic".to_string(),
            characters: vec![
                character(
                    "Li Ming",
                    "28, young writer, black-rimmed glasses, dark blue sweater, literary air",
                ),
                character(
                    "Wang Wei",
                    "26, designer, long hair over the shoulders, white dress, fresh and elegant",
                ),
            ],
            scenes: vec![
                scene(
                    "Cafe Interior",
                    "modern minimalist cafe, floor-to-ceiling windows, afternoon sun slanting in, \
                     wooden tables and chairs, green plants",
                ),
                scene(
                    "Cafe Entrance",
                    "glass door with a vintage sign above it, the street visible outside",
                ),
            ],
            shots: vec![
                shot("wide", "cafe exterior, sunny, a warm afternoon", &[], "Cafe Entrance"),
                shot(
                    "medium",
                    "Li Ming sits alone by the window writing at his laptop, occasionally looking up in thought",
                    &["Li Ming"],
                    "Cafe Interior",
                ),
                shot(
                    "wide",
                    "Wang Wei pushes the door open, sunlight forming a halo behind her",
                    &["Wang Wei"],
                    "Cafe Entrance",
                ),
                shot(
                    "medium",
                    "Wang Wei looks around for a seat, her gaze sweeping the cafe",
                    &["Wang Wei"],
                    "Cafe Interior",
                ),
                shot(
                    "over_shoulder",
                    "from behind Li Ming, Wang Wei walking toward him",
                    &["Li Ming", "Wang Wei"],
                    "Cafe Interior",
                ),
                shot(
                    "closeup",
                    "Li Ming looks up, surprise and admiration in his eyes",
                    &["Li Ming"],
                    "Cafe Interior",
                ),
                shot(
                    "closeup",
                    "Wang Wei smiles and politely asks to share the table",
                    &["Wang Wei"],
                    "Cafe Interior",
                ),
                shot(
                    "medium",
                    "the two sit face to face, the conversation slowly warming up",
                    &["Li Ming", "Wang Wei"],
                    "Cafe Interior",
                ),
            ],
        },
        StoryOutline {
            project_name: "City Chase".to_string(),
            description: "A tense action sequence: a detective chases a stranger through the city".to_string(),
            aspect_ratio: "16:9".to_string(),
            style: "cinematic".to_string(),
            characters: vec![
                character("Officer Chen", "35, detective, short practical hair, dark jacket, sharp eyes"),
                character("The Stranger", "black trench coat, hat, blurred face, agile"),
            ],
            scenes: vec![
                scene(
                    "Night Street",
                    "city at night, flickering neon, wet street after the rain reflecting the lights",
                ),
                scene("Back Alley", "narrow back alley piled with clutter, dim lights, deep shadows"),
            ],
            shots: vec![
                shot(
                    "wide",
                    "the city at night after rain, neon reflected on the wet pavement",
                    &[],
                    "Night Street",
                ),
                shot(
                    "following",
                    "Officer Chen runs down the street chasing a figure ahead",
                    &["Officer Chen"],
                    "Night Street",
                ),
                shot(
                    "low_angle",
                    "the Stranger vaults over an obstacle with ease",
                    &["The Stranger"],
                    "Back Alley",
                ),
                shot(
                    "over_shoulder",
                    "Officer Chen bursts into the alley and sees a fork ahead",
                    &["Officer Chen"],
                    "Back Alley",
                ),
                shot(
                    "closeup",
                    "Officer Chen catches his breath, eyes scanning warily",
                    &["Officer Chen"],
                    "Back Alley",
                ),
                shot(
                    "wide",
                    "at the end of the alley the Stranger vanishes into the dark",
                    &["The Stranger"],
                    "Back Alley",
                ),
            ],
        },
        StoryOutline {
            project_name: "Family Morning".to_string(),
            description: "A tender everyday family scene".to_string(),
            aspect_ratio: "16:9".to_string(),
            style: "cinematic".to_string(),
            characters: vec![
                character("Mom", "38, gentle and caring, wearing an apron, kind smile"),
                character("Mei", "8-year-old girl, twin pigtails, pink dress, lively and cute"),
            ],
            scenes: vec![
                scene("Kitchen", "bright cozy kitchen, sunlight through the window, neat and tidy"),
                scene(
                    "Dining Room",
                    "wooden dining table set with fine tableware, a family photo on the wall",
                ),
            ],
            shots: vec![
                shot("wide", "a sunny kitchen, Mom preparing breakfast", &["Mom"], "Kitchen"),
                shot("medium", "Mei runs into the kitchen and hugs Mom's legs", &["Mom", "Mei"], "Kitchen"),
                shot("closeup", "Mom looks down at Mei, eyes full of love", &["Mom"], "Kitchen"),
                shot(
                    "medium",
                    "Mom leads Mei by the hand toward the table",
                    &["Mom", "Mei"],
                    "Dining Room",
                ),
                shot(
                    "wide",
                    "mother and daughter share a warm breakfast at the table",
                    &["Mom", "Mei"],
                    "Dining Room",
                ),
            ],
        },
    ]
});

pub fn example_stories() -> &'static [StoryOutline] {
    STORIES.as_slice()
}

/// Look up an example by name, ignoring ASCII case.
pub fn example_story(name: &str) -> Option<&'static StoryOutline> {
    STORIES
        .iter()
        .find(|s| s.project_name.eq_ignore_ascii_case(name.trim()))
}

/// Build a fresh project from a built-in example.
pub fn load_example(name: &str) -> Result<StoryboardProject, CoreError> {
    example_story(name)
        .map(StoryOutline::to_project)
        .ok_or_else(|| CoreError::not_found("example", name))
}
