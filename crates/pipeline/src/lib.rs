//! Image generation for storyboard shots.
//!
//! An [`ImageBackend`] turns a compiled prompt into image bytes. Three
//! implementations exist: a hosted [`cloud`] API, a local [`comfyui`] server
//! and a [`mock`] renderer for offline use. [`BackendConfig::build`] picks one,
//! and the [`Orchestrator`] drives it over a project's shots.

pub mod backend;
pub mod cloud;
pub mod comfyui;
pub mod config;
pub mod mock;
pub mod orchestrator;
pub mod progress;

pub use backend::{
    BackendError, BackendKind, ErrorKind, GeneratedImage, GenerationRequest, ImageBackend,
    ImageToImageRequest, SamplerDefaults, TextToImageRequest,
};
pub use config::BackendConfig;
pub use orchestrator::{BatchResult, Orchestrator, OrchestratorError, ShotGenerationResult};
