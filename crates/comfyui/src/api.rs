//! REST API client for the ComfyUI HTTP endpoints.
//!
//! Covers what generation needs: health probe, checkpoint discovery, image
//! upload, workflow submission, output download and interruption.

use std::path::Path;

use serde::Deserialize;

/// HTTP client for a single ComfyUI server.
#[derive(Debug, Clone)]
pub struct ComfyUIApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response of `POST /prompt` for an accepted workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub prompt_id: String,
    #[serde(default)]
    pub number: i64,
}

/// Response of `POST /upload/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default, rename = "type")]
    pub folder_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ComfyUI API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The server refused to queue the workflow.
    #[error("Workflow rejected: {0}")]
    QueueRejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComfyUIApi {
    /// * `api_url` - base HTTP URL, e.g. `http://127.0.0.1:8188`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET /system_stats`; used as the availability probe.
    pub async fn system_stats(&self) -> Result<serde_json::Value, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/system_stats", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Checkpoint names reported by the `CheckpointLoaderSimple` node.
    pub async fn list_checkpoints(&self) -> Result<Vec<String>, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/object_info/CheckpointLoaderSimple", self.api_url))
            .send()
            .await?;
        let info: serde_json::Value = Self::parse_response(response).await?;
        let names = info
            .pointer("/CheckpointLoaderSimple/input/required/ckpt_name/0")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    /// Upload a local image so a `LoadImage` node can reference it.
    pub async fn upload_image(&self, path: &Path) -> Result<UploadResponse, ComfyUIApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reference.png".to_string());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("overwrite", "true");

        let response = self
            .client
            .post(format!("{}/upload/image", self.api_url))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Queue a workflow graph under `client_id`.
    ///
    /// A 400 carrying node validation errors becomes
    /// [`ComfyUIApiError::QueueRejected`] with the first error per node.
    pub async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match rejection_message(&body) {
                Some(message) => ComfyUIApiError::QueueRejected(message),
                None => ComfyUIApiError::ApiError {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let value: serde_json::Value = response.json().await?;
        if let Some(error) = value.get("error") {
            return Err(ComfyUIApiError::QueueRejected(error.to_string()));
        }
        serde_json::from_value(value).map_err(|e| {
            ComfyUIApiError::QueueRejected(format!("unexpected submit response: {e}"))
        })
    }

    /// Download an output file through `GET /view`.
    pub async fn view_image(
        &self,
        filename: &str,
        subfolder: &str,
        folder_type: &str,
    ) -> Result<Vec<u8>, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/view", self.api_url))
            .query(&[
                ("filename", filename),
                ("subfolder", subfolder),
                ("type", folder_type),
            ])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Interrupt whatever is executing right now.
    pub async fn interrupt(&self) -> Result<(), ComfyUIApiError> {
        let response = self
            .client
            .post(format!("{}/interrupt", self.api_url))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    pub async fn queue_status(&self) -> Result<serde_json::Value, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/queue", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComfyUIApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComfyUIApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComfyUIApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Summarise a `/prompt` error body: the top-level message followed by
/// `Node {id}: {message} - {details}` for each failing node.
fn rejection_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let mut message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());

    if let Some(nodes) = value.get("node_errors").and_then(|n| n.as_object()) {
        for (node_id, node_error) in nodes {
            if let Some(first) = node_error.pointer("/errors/0") {
                let text = first.get("message").and_then(|m| m.as_str()).unwrap_or_default();
                let details = first.get("details").and_then(|d| d.as_str()).unwrap_or_default();
                message.push_str(&format!(" | Node {node_id}: {text} - {details}"));
            }
        }
    }
    Some(message)
}
