//! Backend selection.
//!
//! [`BackendConfig`] is plain data filled in by the application's config
//! layer. [`BackendConfig::build`] applies the selection rules and returns a
//! ready backend; it never fails, falling back to the mock renderer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use storyboard_comfyui::client::ComfyUIClient;

use crate::backend::{BackendKind, ImageBackend};
use crate::cloud::{self, CloudBackend};
use crate::comfyui::ComfyUIBackend;
use crate::mock::MockBackend;

#[derive(Debug, Clone, PartialEq)]
pub struct ComfyUISettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub use_https: bool,
    pub timeout: Duration,
    pub workflow_file: Option<PathBuf>,
    /// Empty means auto-detect the first checkpoint.
    pub model: String,
}

impl Default for ComfyUISettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 8188,
            use_https: false,
            timeout: Duration::from_secs(300),
            workflow_file: None,
            model: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Raw selector, e.g. `api`, `comfyui` or `mock`.
    pub backend: String,
    pub api_key: String,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub comfyui: ComfyUISettings,
    /// Artificial latency of the mock renderer.
    pub mock_delay: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock.as_str().to_string(),
            api_key: String::new(),
            api_base_url: cloud::DEFAULT_BASE_URL.to_string(),
            api_timeout: cloud::DEFAULT_TIMEOUT,
            comfyui: ComfyUISettings::default(),
            mock_delay: Duration::ZERO,
        }
    }
}

impl BackendConfig {
    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The backend [`Self::build`] will construct.
    ///
    /// Unknown selectors mean `api` when a key is present, else `mock`. The
    /// `api` selector without a key also degrades to `mock`.
    pub fn resolve_kind(&self) -> BackendKind {
        match BackendKind::parse(&self.backend) {
            Some(BackendKind::Api) | None if self.has_key() => BackendKind::Api,
            Some(BackendKind::ComfyUI) => BackendKind::ComfyUI,
            _ => BackendKind::Mock,
        }
    }

    pub fn build(&self) -> Arc<dyn ImageBackend> {
        let kind = self.resolve_kind();
        match BackendKind::parse(&self.backend) {
            None => tracing::warn!(backend = %self.backend, resolved = %kind, "Unknown image backend"),
            Some(BackendKind::Api) if kind == BackendKind::Mock => {
                tracing::warn!("API backend selected but no API key provided, using mock generator");
            }
            _ => {}
        }
        tracing::info!(backend = %kind, "Image backend selected");

        match kind {
            BackendKind::Api => Arc::new(CloudBackend::new(
                self.api_key.clone(),
                self.api_base_url.clone(),
                self.api_timeout,
            )),
            BackendKind::ComfyUI => {
                let settings = &self.comfyui;
                let client = ComfyUIClient::for_server(&settings.host, settings.port, settings.use_https);
                let mut backend = ComfyUIBackend::new(client, settings.enabled, settings.timeout)
                    .with_model(settings.model.clone());
                if let Some(path) = &settings.workflow_file {
                    backend = backend.with_workflow_file(path);
                }
                Arc::new(backend)
            }
            BackendKind::Mock => Arc::new(MockBackend::with_delay(self.mock_delay)),
        }
    }
}
