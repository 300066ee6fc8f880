//! The storyboard project and its persisted document shape.
//!
//! The document has four top-level keys: `project_meta`, `references`,
//! `narrative` and `storyboard`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aspect::AspectRatio;

use super::{Character, Prop, Scene, Shot, ShotStatus, StyleConfig};

/// Document format version written by this crate.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Name given to projects created without one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Sentinel for "no seed chosen".
pub const UNSET_SEED: i64 = -1;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// In-memory project
// ---------------------------------------------------------------------------

/// A project exclusively owns its references and shots.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryboardProject {
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub version: String,
    pub aspect_ratio: AspectRatio,
    pub characters: Vec<Character>,
    pub scenes: Vec<Scene>,
    pub props: Vec<Prop>,
    pub style: StyleConfig,
    pub narrative_text: String,
    pub shots: Vec<Shot>,
    /// `-1` means unset; see the seed policy.
    pub generation_seed: i64,
    pub lock_seed: bool,
}

impl Default for StoryboardProject {
    fn default() -> Self {
        let now = now_rfc3339();
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            created_at: now.clone(),
            updated_at: now,
            version: DOCUMENT_VERSION.to_string(),
            aspect_ratio: AspectRatio::default(),
            characters: Vec::new(),
            scenes: Vec::new(),
            props: Vec::new(),
            style: StyleConfig::default(),
            narrative_text: String::new(),
            shots: Vec::new(),
            generation_seed: UNSET_SEED,
            lock_seed: true,
        }
    }
}

impl StoryboardProject {
    pub fn new(name: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            name: name.into(),
            aspect_ratio,
            ..Default::default()
        }
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn prop(&self, id: &str) -> Option<&Prop> {
        self.props.iter().find(|p| p.id == id)
    }

    pub fn shot(&self, shot_number: u32) -> Option<&Shot> {
        self.shots.iter().find(|s| s.shot_number == shot_number)
    }

    pub fn shot_mut(&mut self, shot_number: u32) -> Option<&mut Shot> {
        self.shots.iter_mut().find(|s| s.shot_number == shot_number)
    }

    /// Characters referenced by `shot`, in shot order, skipping dangling ids.
    pub fn characters_in<'a>(&'a self, shot: &'a Shot) -> impl Iterator<Item = &'a Character> {
        shot.characters_in_shot
            .iter()
            .filter_map(move |id| self.character(id))
    }

    pub fn props_in<'a>(&'a self, shot: &'a Shot) -> impl Iterator<Item = &'a Prop> {
        shot.props_in_shot.iter().filter_map(move |id| self.prop(id))
    }

    pub fn scene_of(&self, shot: &Shot) -> Option<&Scene> {
        shot.scene_id().and_then(|id| self.scene(id))
    }

    /// Restore the dense `1..=N` numbering in current list order.
    pub fn renumber_shots(&mut self) {
        for (idx, shot) in self.shots.iter_mut().enumerate() {
            shot.shot_number = idx as u32 + 1;
        }
    }

    pub fn next_shot_number(&self) -> u32 {
        self.shots.len() as u32 + 1
    }

    pub fn completed_count(&self) -> usize {
        self.shots
            .iter()
            .filter(|s| s.status == ShotStatus::Completed)
            .count()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    /// Snapshot the project as a persistable document with a fresh `updated_at`.
    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument {
            project_meta: ProjectMeta {
                name: self.name.clone(),
                created_at: self.created_at.clone(),
                updated_at: now_rfc3339(),
                version: self.version.clone(),
                aspect_ratio: self.aspect_ratio,
                generation_seed: self.generation_seed,
                lock_seed: self.lock_seed,
            },
            references: References {
                characters: self.characters.clone(),
                scenes: self.scenes.clone(),
                props: self.props.clone(),
                style: self.style.clone(),
            },
            narrative: self.narrative_text.clone(),
            storyboard: self.shots.clone(),
        }
    }

    pub fn from_document(document: ProjectDocument) -> Self {
        let ProjectDocument {
            project_meta: meta,
            references,
            narrative,
            mut storyboard,
        } = document;

        for shot in &mut storyboard {
            shot.reconcile_status();
        }

        Self {
            name: meta.name,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            version: meta.version,
            aspect_ratio: meta.aspect_ratio,
            characters: references.characters,
            scenes: references.scenes,
            props: references.props,
            style: references.style,
            narrative_text: narrative,
            shots: storyboard,
            generation_seed: meta.generation_seed,
            lock_seed: meta.lock_seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDocument {
    pub project_meta: ProjectMeta,
    pub references: References,
    pub narrative: String,
    pub storyboard: Vec<Shot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub version: String,
    pub aspect_ratio: AspectRatio,
    pub generation_seed: i64,
    pub lock_seed: bool,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        let now = now_rfc3339();
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            created_at: now.clone(),
            updated_at: now,
            version: DOCUMENT_VERSION.to_string(),
            aspect_ratio: AspectRatio::default(),
            generation_seed: UNSET_SEED,
            lock_seed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct References {
    pub characters: Vec<Character>,
    pub scenes: Vec<Scene>,
    pub props: Vec<Prop>,
    pub style: StyleConfig,
}
