//! Local ComfyUI server as an image backend.
//!
//! Each call probes `/system_stats`, builds the graph (custom file or built-in
//! template), queues it, waits for the outputs under the configured timeout
//! and downloads the first image. The primary character reference, when the
//! shot has one, is uploaded and seeds an image-to-image run.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use storyboard_comfyui::api::ComfyUIApiError;
use storyboard_comfyui::client::{ComfyUIClient, ComfyUIClientError};
use storyboard_comfyui::workflow::{prepare, Workflow, WorkflowParams};
use tokio::sync::OnceCell;

use crate::backend::{
    BackendError, BackendKind, GeneratedImage, ImageBackend, ImageToImageRequest, SamplerDefaults,
    TextToImageRequest,
};

pub const DISABLED_MESSAGE: &str =
    "ComfyUI is not enabled. Set IMAGE_BACKEND=comfyui and COMFYUI_ENABLED=true";

const CONSISTENCY_SCORE: f64 = 0.85;

pub struct ComfyUIBackend {
    client: ComfyUIClient,
    enabled: bool,
    timeout: Duration,
    /// Configured checkpoint; empty means use the first one the server lists.
    model: String,
    detected_model: OnceCell<String>,
    custom_workflow: Option<Workflow>,
}

impl ComfyUIBackend {
    pub fn new(client: ComfyUIClient, enabled: bool, timeout: Duration) -> Self {
        Self {
            client,
            enabled,
            timeout,
            model: String::new(),
            detected_model: OnceCell::new(),
            custom_workflow: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        self.custom_workflow = Some(workflow);
        self
    }

    /// Load a custom workflow file, falling back to the built-in graphs when
    /// it cannot be read.
    pub fn with_workflow_file(self, path: &Path) -> Self {
        match Workflow::load(path) {
            Ok(workflow) => {
                tracing::info!(path = %path.display(), nodes = workflow.node_count(), "Loaded custom ComfyUI workflow");
                self.with_workflow(workflow)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load workflow file, using built-in graph");
                self
            }
        }
    }

    pub fn client(&self) -> &ComfyUIClient {
        &self.client
    }

    /// The checkpoint to inject, detected once per backend when not configured.
    async fn resolve_model(&self) -> Result<String, BackendError> {
        if !self.model.is_empty() {
            return Ok(self.model.clone());
        }
        let model = self
            .detected_model
            .get_or_try_init(|| async {
                let names = self.client.api().list_checkpoints().await.map_err(map_api_error)?;
                let first = names.into_iter().next().unwrap_or_default();
                if first.is_empty() {
                    tracing::warn!("ComfyUI reports no checkpoints, keeping the graph's own");
                } else {
                    tracing::info!(model = %first, "Auto-detected ComfyUI checkpoint");
                }
                Ok::<_, BackendError>(first)
            })
            .await?;
        Ok(model.clone())
    }

    async fn params_for(&self, request: &TextToImageRequest) -> Result<WorkflowParams, BackendError> {
        Ok(WorkflowParams {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            width: request.width,
            height: request.height,
            steps: request.steps,
            cfg_scale: request.cfg_scale,
            sampler: request.sampler.clone(),
            seed: request.seed,
            model: self.resolve_model().await?,
            ..Default::default()
        })
    }

    async fn run(&self, request: &TextToImageRequest, params: &WorkflowParams) -> Result<GeneratedImage, BackendError> {
        let (workflow, seed) = prepare(self.custom_workflow.as_ref(), params);
        tracing::info!(
            shot_number = request.shot_number,
            seed,
            img2img = params.reference_image.is_some(),
            "Submitting ComfyUI generation",
        );

        let on_step = |current: u32, total: u32| request.on_step.report(current, total);
        let output = self
            .client
            .run_workflow(&workflow, self.timeout, Some(&on_step))
            .await
            .map_err(map_client_error)?;

        let first = output
            .files
            .first()
            .ok_or_else(|| BackendError::InvalidResponse("No output files generated".to_string()))?;
        let bytes = self.client.download(first).await.map_err(map_client_error)?;

        Ok(GeneratedImage {
            bytes,
            consistency_score: CONSISTENCY_SCORE,
        })
    }
}

fn map_api_error(error: ComfyUIApiError) -> BackendError {
    match error {
        ComfyUIApiError::Request(e) if e.is_connect() || e.is_timeout() => {
            BackendError::Unavailable(format!("ComfyUI connection failed: {e}"))
        }
        ComfyUIApiError::Io(e) => BackendError::Io(e),
        other => BackendError::Api(other.to_string()),
    }
}

fn map_client_error(error: ComfyUIClientError) -> BackendError {
    match error {
        ComfyUIClientError::Timeout(after) => BackendError::Timeout(after),
        ComfyUIClientError::Connection(msg) => BackendError::Unavailable(msg),
        ComfyUIClientError::Api(e) => map_api_error(e),
        other => BackendError::Api(other.to_string()),
    }
}

#[async_trait]
impl ImageBackend for ComfyUIBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ComfyUI
    }

    fn takes_reference_images(&self) -> bool {
        true
    }

    fn wants_consistency_prefix(&self) -> bool {
        true
    }

    fn sampler_defaults(&self) -> SamplerDefaults {
        SamplerDefaults::default()
    }

    async fn check_availability(&self) -> Result<(), BackendError> {
        if !self.enabled {
            return Err(BackendError::Disabled(DISABLED_MESSAGE.to_string()));
        }
        self.client
            .api()
            .system_stats()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Unavailable(format!("ComfyUI connection failed: {e}")))
    }

    async fn text_to_image(&self, request: &TextToImageRequest) -> Result<GeneratedImage, BackendError> {
        self.check_availability().await?;
        let params = self.params_for(request).await?;
        self.run(request, &params).await
    }

    async fn image_to_image(&self, request: &ImageToImageRequest) -> Result<GeneratedImage, BackendError> {
        self.check_availability().await?;
        let uploaded = self
            .client
            .api()
            .upload_image(Path::new(&request.reference_path))
            .await
            .map_err(map_api_error)?;
        tracing::debug!(name = %uploaded.name, "Uploaded reference image");

        let mut params = self.params_for(&request.base).await?;
        params.reference_image = Some(uploaded.name);
        params.denoise = request.denoise;
        self.run(&request.base, &params).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn backend_for(server: &MockServer, enabled: bool) -> ComfyUIBackend {
        let client = ComfyUIClient::new("ws://127.0.0.1:9", server.uri());
        ComfyUIBackend::new(client, enabled, Duration::from_secs(5))
    }

    fn request() -> TextToImageRequest {
        TextToImageRequest::new("a harbor at dawn", 1024, 576, &SamplerDefaults::default())
    }

    // -- availability --

    #[tokio::test]
    async fn disabled_backend_refuses_with_instructions() {
        let server = MockServer::start().await;
        let backend = backend_for(&server, false);
        let err = backend.text_to_image(&request()).await.unwrap_err();
        assert_matches!(&err, BackendError::Disabled(_));
        assert_eq!(err.to_string(), DISABLED_MESSAGE);
    }

    #[tokio::test]
    async fn availability_probes_system_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "system": {} })))
            .expect(1)
            .mount(&server)
            .await;
        backend_for(&server, true).check_availability().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let client = ComfyUIClient::new("ws://127.0.0.1:9", "http://127.0.0.1:9");
        let backend = ComfyUIBackend::new(client, true, Duration::from_secs(1));
        let err = backend.check_availability().await.unwrap_err();
        assert_matches!(&err, BackendError::Unavailable(msg) if msg.starts_with("ComfyUI connection failed"));
    }

    // -- model detection --

    #[tokio::test]
    async fn first_checkpoint_is_detected_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/object_info/CheckpointLoaderSimple"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "CheckpointLoaderSimple": {
                    "input": { "required": { "ckpt_name": [["sdxl.safetensors", "sd15.ckpt"]] } }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, true);
        assert_eq!(backend.resolve_model().await.unwrap(), "sdxl.safetensors");
        assert_eq!(backend.resolve_model().await.unwrap(), "sdxl.safetensors");
    }

    #[tokio::test]
    async fn configured_model_skips_detection() {
        let server = MockServer::start().await;
        let backend = backend_for(&server, true).with_model("custom.safetensors");
        assert_eq!(backend.resolve_model().await.unwrap(), "custom.safetensors");
    }

    // -- image to image --

    #[tokio::test]
    async fn missing_reference_file_fails_before_queueing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let backend = backend_for(&server, true);
        let request = ImageToImageRequest {
            base: request(),
            reference_path: "/nonexistent/ming.png".into(),
            denoise: 0.7,
        };
        assert_matches!(backend.image_to_image(&request).await, Err(BackendError::Io(_)));
    }

    #[test]
    fn bad_workflow_file_keeps_builtin_graph() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, "not json").unwrap();
        let client = ComfyUIClient::new("ws://127.0.0.1:9", "http://127.0.0.1:9");
        let backend = ComfyUIBackend::new(client, true, Duration::from_secs(1)).with_workflow_file(&file);
        assert!(backend.custom_workflow.is_none());
    }

    #[test]
    fn client_errors_map_to_backend_errors() {
        assert_matches!(
            map_client_error(ComfyUIClientError::Timeout(Duration::from_secs(3))),
            BackendError::Timeout(d) if d == Duration::from_secs(3)
        );
        assert_matches!(
            map_client_error(ComfyUIClientError::Connection("refused".into())),
            BackendError::Unavailable(_)
        );
        assert_matches!(map_client_error(ComfyUIClientError::NoOutputs), BackendError::Api(_));
    }
}
