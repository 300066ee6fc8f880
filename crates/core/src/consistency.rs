//! Consistency policy: weighted reference images and per-session seeds.

use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::model::shot::MAX_TOTAL_WEIGHT;
use crate::model::{Shot, StoryboardProject};

pub use crate::model::SlotWeights;

/// Reference images taken per character.
pub const MAX_IMAGES_PER_CHARACTER: usize = 2;

/// Share of the scene slot weight given to the atmosphere image.
pub const ATMOSPHERE_WEIGHT_FACTOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// Reference images
// ---------------------------------------------------------------------------

/// Which reference slot an image was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSlot {
    Character,
    SceneSpace,
    SceneAtmosphere,
    Prop,
    Style,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceImage {
    pub path: String,
    pub weight: f64,
    pub slot: ReferenceSlot,
}

fn existing(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    let found = Path::new(path).exists();
    if !found {
        tracing::warn!(path, "Reference image missing on disk, skipping");
    }
    found
}

/// Gather the weighted reference images for `shot`.
///
/// The shot's slot weights are normalised first. Images that do not exist on
/// disk are skipped, so the list may be empty.
pub fn collect_references(shot: &Shot, project: &StoryboardProject) -> Vec<ReferenceImage> {
    let weights = shot.slot_weights.normalize(MAX_TOTAL_WEIGHT);
    let mut refs = Vec::new();

    for character in project.characters_in(shot) {
        for path in character
            .ref_images
            .iter()
            .take(MAX_IMAGES_PER_CHARACTER)
            .filter(|p| existing(p))
        {
            refs.push(ReferenceImage {
                path: path.clone(),
                weight: weights.character * character.consistency_weight,
                slot: ReferenceSlot::Character,
            });
        }
    }

    if let Some(scene) = project.scene_of(shot) {
        if existing(&scene.space_ref_image) {
            refs.push(ReferenceImage {
                path: scene.space_ref_image.clone(),
                weight: weights.scene * scene.consistency_weight,
                slot: ReferenceSlot::SceneSpace,
            });
        }
        // Secondary cue: not ramped by the scene's own weight.
        if existing(&scene.atmosphere_ref_image) {
            refs.push(ReferenceImage {
                path: scene.atmosphere_ref_image.clone(),
                weight: weights.scene * ATMOSPHERE_WEIGHT_FACTOR,
                slot: ReferenceSlot::SceneAtmosphere,
            });
        }
    }

    for prop in project.props_in(shot) {
        if existing(&prop.ref_image) {
            refs.push(ReferenceImage {
                path: prop.ref_image.clone(),
                weight: weights.props * prop.consistency_weight,
                slot: ReferenceSlot::Prop,
            });
        }
    }

    if existing(&project.style.ref_image) {
        refs.push(ReferenceImage {
            path: project.style.ref_image.clone(),
            weight: weights.style * project.style.weight,
            slot: ReferenceSlot::Style,
        });
    }

    refs
}

/// First existing reference image of the first referenced character.
pub fn primary_character_reference(shot: &Shot, project: &StoryboardProject) -> Option<String> {
    project
        .characters_in(shot)
        .next()
        .and_then(|c| c.ref_images.iter().find(|p| existing(p)).cloned())
}

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

/// Seed decision for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeedChoice {
    /// The project's stored seed, carried unchanged, or the session seed.
    Fixed(i64),
    Random,
}

impl SeedChoice {
    /// The value passed to a backend; `-1` asks it to pick randomly.
    pub fn as_backend_value(self) -> i64 {
        match self {
            Self::Fixed(seed) => seed,
            Self::Random => -1,
        }
    }
}

/// Chooses seeds so a locked project renders every shot with the same one.
///
/// When a locked project has no explicit seed, one is derived from the clock
/// on first use and cached for the lifetime of this policy.
#[derive(Debug, Default)]
pub struct SeedPolicy {
    session_seed: Mutex<Option<u32>>,
}

impl SeedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, project: &StoryboardProject) -> SeedChoice {
        if !project.lock_seed {
            return SeedChoice::Random;
        }
        if project.generation_seed > 0 {
            return SeedChoice::Fixed(project.generation_seed);
        }

        let mut cached = match self.session_seed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let seed = *cached.get_or_insert_with(|| {
            let millis = chrono::Utc::now().timestamp_millis();
            let seed = (millis & 0xFFFF_FFFF) as u32;
            tracing::debug!(seed, "Generated session seed");
            seed
        });
        SeedChoice::Fixed(i64::from(seed))
    }

    /// The cached session seed, if one has been generated.
    pub fn session_seed(&self) -> Option<u32> {
        match self.session_seed.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
