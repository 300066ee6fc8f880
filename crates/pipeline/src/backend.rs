//! The image backend seam.
//!
//! Backends receive fully resolved requests: prompt text, pixel size, seed and
//! reference images. They never see the project.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storyboard_core::consistency::ReferenceImage;

use crate::progress::StepHook;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Api,
    ComfyUI,
    Mock,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::ComfyUI => "comfyui",
            Self::Mock => "mock",
        }
    }

    /// Case-insensitive; `None` for anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "api" => Some(Self::Api),
            "comfyui" => Some(Self::ComfyUI),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Coarse classification reported alongside a failed shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Retrying will not help until the deployment changes.
    Configuration,
    /// The call may succeed if repeated.
    Transient,
    Timeout,
    /// The image could not be persisted.
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Disabled(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Api(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Disabled(_) | Self::Unavailable(_) => ErrorKind::Configuration,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Api(_) | Self::InvalidResponse(_) => ErrorKind::Transient,
            Self::Io(_) => ErrorKind::Storage,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Sampler settings a backend runs with unless told otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDefaults {
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: String,
    /// Denoise used when a reference image seeds the latent.
    pub reference_denoise: f64,
}

impl Default for SamplerDefaults {
    fn default() -> Self {
        Self {
            steps: 20,
            cfg_scale: 7.0,
            sampler: "euler".to_string(),
            reference_denoise: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextToImageRequest {
    /// Used for logging and by the mock renderer.
    pub shot_number: u32,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: String,
    /// `-1` lets the backend choose.
    pub seed: i64,
    /// Weighted conditioning images, for backends that accept several.
    pub references: Vec<ReferenceImage>,
    pub on_step: StepHook,
}

impl TextToImageRequest {
    pub fn new(prompt: impl Into<String>, width: u32, height: u32, defaults: &SamplerDefaults) -> Self {
        Self {
            shot_number: 0,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            width,
            height,
            steps: defaults.steps,
            cfg_scale: defaults.cfg_scale,
            sampler: defaults.sampler.clone(),
            seed: -1,
            references: Vec::new(),
            on_step: StepHook::none(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageToImageRequest {
    pub base: TextToImageRequest,
    /// Local path of the image that seeds the latent.
    pub reference_path: String,
    pub denoise: f64,
}

#[derive(Debug, Clone)]
pub enum GenerationRequest {
    TextToImage(TextToImageRequest),
    ImageToImage(ImageToImageRequest),
}

impl GenerationRequest {
    pub fn base(&self) -> &TextToImageRequest {
        match self {
            Self::TextToImage(request) => request,
            Self::ImageToImage(request) => &request.base,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// Encoded image, PNG unless the backend says otherwise.
    pub bytes: Vec<u8>,
    pub consistency_score: f64,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One image generation service.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether the primary character image should seed an image-to-image run.
    fn takes_reference_images(&self) -> bool {
        false
    }

    /// Whether the project's consistency prefix should lead the prompt.
    fn wants_consistency_prefix(&self) -> bool {
        false
    }

    fn sampler_defaults(&self) -> SamplerDefaults {
        SamplerDefaults::default()
    }

    /// Probe whether the backend can currently serve requests.
    async fn check_availability(&self) -> Result<(), BackendError>;

    async fn text_to_image(&self, request: &TextToImageRequest) -> Result<GeneratedImage, BackendError>;

    async fn image_to_image(&self, request: &ImageToImageRequest) -> Result<GeneratedImage, BackendError>;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, BackendError> {
        match request {
            GenerationRequest::TextToImage(request) => self.text_to_image(request).await,
            GenerationRequest::ImageToImage(request) => self.image_to_image(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(BackendKind::parse(" ComfyUI "), Some(BackendKind::ComfyUI));
        assert_eq!(BackendKind::parse("MOCK"), Some(BackendKind::Mock));
        assert_eq!(BackendKind::parse("dalle"), None);
        assert_eq!(BackendKind::ComfyUI.to_string(), "comfyui");
    }

    #[test]
    fn errors_are_classified() {
        assert_eq!(BackendError::Disabled("off".into()).kind(), ErrorKind::Configuration);
        assert_eq!(BackendError::Unavailable("down".into()).kind(), ErrorKind::Configuration);
        assert_eq!(BackendError::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Timeout);
        assert_eq!(BackendError::Api("500".into()).kind(), ErrorKind::Transient);
    }

    #[test]
    fn request_takes_sampler_defaults() {
        let defaults = SamplerDefaults {
            steps: 30,
            cfg_scale: 7.5,
            ..Default::default()
        };
        let request = TextToImageRequest::new("a cat", 1024, 576, &defaults);
        assert_eq!(request.steps, 30);
        assert_eq!(request.cfg_scale, 7.5);
        assert_eq!(request.seed, -1);
        let wrapped = GenerationRequest::TextToImage(request);
        assert_eq!(wrapped.base().prompt, "a cat");
    }
}
