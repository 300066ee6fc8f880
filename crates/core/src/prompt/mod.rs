//! Prompt compiler: a pure function from a shot and its project to prompts.
//!
//! Block order is fixed because diffusion text encoders weight early tokens
//! more heavily:
//!
//! 1. style
//! 2. camera
//! 3. the template's primary keyword
//! 4. characters
//! 5. action and description
//! 6. scene
//! 7. props
//! 8. composition
//! 9. technical suffix (optional)
//!
//! Empty blocks are dropped before joining with `", "`. Dangling character,
//! scene and prop ids contribute nothing. The framing blocks (2, 3 and 8) are
//! dropped only when both the shot content and the style are empty, so such a
//! shot compiles to the technical suffix alone.

pub mod blocks;
pub mod breakdown;
pub mod negative;
pub mod prefix;

use serde::Serialize;

use crate::consistency::{collect_references, ReferenceImage};
use crate::model::{Character, Prop, Shot, StandardShotPrompt, StoryboardProject};
use crate::text::join_non_empty;

pub use blocks::TECHNICAL_SUFFIX;
pub use breakdown::standard_breakdown;
pub use negative::negative_prompt;
pub use prefix::consistency_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub include_technical: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_technical: true,
        }
    }
}

/// Everything the compiler derives for one shot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPrompt {
    pub positive: String,
    pub negative: String,
    pub references: Vec<ReferenceImage>,
    pub breakdown: StandardShotPrompt,
}

pub fn positive_prompt(shot: &Shot, project: &StoryboardProject, options: CompileOptions) -> String {
    let template = shot.template;
    let def = template.definition();
    let characters: Vec<&Character> = project.characters_in(shot).collect();
    let props: Vec<&Prop> = project.props_in(shot).collect();

    let scene = project.scene_of(shot);
    let action = blocks::action_block(shot);
    let style = blocks::style_block(&project.style);
    let has_content = !characters.is_empty() || scene.is_some() || !props.is_empty() || !action.is_empty();
    let framed = has_content || !style.is_empty();

    let mut parts = vec![style];
    if framed {
        parts.push(blocks::camera_block(&shot.camera));
        parts.push(def.primary_keyword().to_string());
    }
    parts.push(blocks::character_block(&characters, template));
    parts.push(action);
    parts.push(blocks::scene_block(scene));
    parts.push(blocks::props_block(&props, template));
    if framed {
        parts.push(blocks::composition_block(&shot.composition));
    }
    if options.include_technical {
        parts.push(TECHNICAL_SUFFIX.to_string());
    }

    join_non_empty(&parts, ", ")
}

pub fn compile(shot: &Shot, project: &StoryboardProject, options: CompileOptions) -> CompiledPrompt {
    CompiledPrompt {
        positive: positive_prompt(shot, project, options),
        negative: negative_prompt(shot.template),
        references: collect_references(shot, project),
        breakdown: standard_breakdown(shot, project),
    }
}

/// Recompile the stored prompt and breakdown of `shot` in place.
pub fn refresh_shot(shot: &mut Shot, project: &StoryboardProject) {
    shot.generated_prompt = positive_prompt(shot, project, CompileOptions::default());
    shot.standard_prompt = standard_breakdown(shot, project);
}
