//! Hosted generation API with weighted reference conditioning.
//!
//! `POST {base_url}/generate` with a bearer token. Reference images are sent
//! inline as base64 with their weights; the response carries the image as
//! base64 under `image`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use storyboard_core::consistency::{ReferenceImage, ReferenceSlot};

use crate::backend::{
    BackendError, BackendKind, GeneratedImage, ImageBackend, ImageToImageRequest, SamplerDefaults,
    TextToImageRequest,
};

pub const DEFAULT_BASE_URL: &str = "https://api.nanabanana.pro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const CONSISTENCY_SCORE: f64 = 0.9;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    references: Vec<EncodedReference>,
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f64,
}

#[derive(Debug, Serialize)]
struct EncodedReference {
    image: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloudBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl CloudBackend {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Missing or unreadable files are skipped.
    async fn encode_references(references: &[ReferenceImage]) -> Vec<EncodedReference> {
        let mut encoded = Vec::with_capacity(references.len());
        for reference in references {
            match tokio::fs::read(&reference.path).await {
                Ok(bytes) => encoded.push(EncodedReference {
                    image: STANDARD.encode(bytes),
                    weight: reference.weight,
                }),
                Err(e) => {
                    tracing::warn!(path = %reference.path, error = %e, "Skipping unreadable reference image");
                }
            }
        }
        encoded
    }

    fn map_request_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if error.is_connect() {
            BackendError::Unavailable(format!("Generation API unreachable: {error}"))
        } else {
            BackendError::Api(format!("Generation failed: {error}"))
        }
    }
}

#[async_trait]
impl ImageBackend for CloudBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Api
    }

    fn sampler_defaults(&self) -> SamplerDefaults {
        SamplerDefaults {
            steps: 30,
            cfg_scale: 7.5,
            ..Default::default()
        }
    }

    async fn check_availability(&self) -> Result<(), BackendError> {
        if self.api_key.trim().is_empty() {
            return Err(BackendError::Disabled("No API key configured".to_string()));
        }
        Ok(())
    }

    async fn text_to_image(&self, request: &TextToImageRequest) -> Result<GeneratedImage, BackendError> {
        self.check_availability().await?;

        let body = GenerateBody {
            prompt: &request.prompt,
            negative_prompt: &request.negative_prompt,
            references: Self::encode_references(&request.references).await,
            width: request.width,
            height: request.height,
            num_inference_steps: request.steps,
            guidance_scale: request.cfg_scale,
        };
        tracing::debug!(
            shot_number = request.shot_number,
            references = body.references.len(),
            "Calling generation API",
        );

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!("API error: {} - {text}", status.as_u16())));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let encoded = parsed
            .image
            .ok_or_else(|| BackendError::InvalidResponse("No image in response".to_string()))?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BackendError::InvalidResponse(format!("image is not base64: {e}")))?;

        Ok(GeneratedImage {
            bytes,
            consistency_score: CONSISTENCY_SCORE,
        })
    }

    /// The reference joins the weighted list at strength `1 - denoise`.
    async fn image_to_image(&self, request: &ImageToImageRequest) -> Result<GeneratedImage, BackendError> {
        let mut base = request.base.clone();
        base.references.insert(
            0,
            ReferenceImage {
                path: request.reference_path.clone(),
                weight: (1.0 - request.denoise).clamp(0.0, 1.0),
                slot: ReferenceSlot::Character,
            },
        );
        self.text_to_image(&base).await
    }
}
