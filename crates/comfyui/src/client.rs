//! WebSocket client and end-to-end workflow execution.
//!
//! [`ComfyUIClient`] owns the REST wrapper plus the WebSocket address of one
//! server. [`ComfyUIClient::run_workflow`] connects, queues, and waits for the
//! prompt under a bounded timeout.

use std::time::Duration;

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::messages::OutputFile;
use crate::processor::{await_completion, StepCallback};
use crate::workflow::Workflow;

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ComfyUIClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Node {node_id} ({node_type}): {message}")]
    Execution {
        node_id: String,
        node_type: String,
        message: String,
    },

    #[error("Timed out after {0:?} waiting for completion")]
    Timeout(Duration),

    #[error("No output files generated")]
    NoOutputs,

    #[error(transparent)]
    Api(#[from] ComfyUIApiError),
}

pub struct ComfyUIConnection {
    /// Sent during the handshake so the server routes our prompt's frames here.
    pub client_id: String,
    pub ws_stream: WsStream,
}

impl std::fmt::Debug for ComfyUIConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComfyUIConnection")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Outputs of one finished prompt.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub prompt_id: String,
    pub files: Vec<OutputFile>,
}

#[derive(Debug, Clone)]
pub struct ComfyUIClient {
    api: ComfyUIApi,
    ws_url: String,
}

impl ComfyUIClient {
    /// `ws_url` and `api_url` are base URLs such as `ws://host:8188` and
    /// `http://host:8188`.
    pub fn new(ws_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api: ComfyUIApi::new(api_url),
            ws_url: ws_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Derive both URLs from host, port and scheme.
    pub fn for_server(host: &str, port: u16, use_https: bool) -> Self {
        let (http, ws) = if use_https { ("https", "wss") } else { ("http", "ws") };
        Self::new(format!("{ws}://{host}:{port}"), format!("{http}://{host}:{port}"))
    }

    pub fn api(&self) -> &ComfyUIApi {
        &self.api
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub async fn connect(&self) -> Result<ComfyUIConnection, ComfyUIClientError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/ws?clientId={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            ComfyUIClientError::Connection(format!(
                "Failed to connect to ComfyUI at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(client_id = %client_id, ws_url = %self.ws_url, "Connected to ComfyUI");
        Ok(ComfyUIConnection {
            client_id,
            ws_stream,
        })
    }

    /// Queue `workflow` and wait for its outputs.
    ///
    /// The socket is opened before queueing so no frame of the prompt is
    /// missed. On timeout the server is asked to interrupt.
    pub async fn run_workflow(
        &self,
        workflow: &Workflow,
        timeout: Duration,
        on_step: Option<StepCallback<'_>>,
    ) -> Result<ExecutionOutput, ComfyUIClientError> {
        let mut connection = self.connect().await?;
        let submitted = self
            .api
            .submit_workflow(&workflow.to_value(), &connection.client_id)
            .await?;
        let prompt_id = submitted.prompt_id;
        tracing::info!(prompt_id = %prompt_id, queue_position = submitted.number, "Workflow queued");

        let waited = tokio::time::timeout(
            timeout,
            await_completion(&mut connection.ws_stream, &prompt_id, on_step),
        )
        .await;

        let files = match waited {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(prompt_id = %prompt_id, ?timeout, "Timed out waiting for ComfyUI");
                if let Err(e) = self.api.interrupt().await {
                    tracing::warn!(error = %e, "Failed to interrupt timed-out prompt");
                }
                return Err(ComfyUIClientError::Timeout(timeout));
            }
        };

        Ok(ExecutionOutput { prompt_id, files })
    }

    /// Fetch the bytes of one output file.
    pub async fn download(&self, file: &OutputFile) -> Result<Vec<u8>, ComfyUIClientError> {
        Ok(self
            .api
            .view_image(&file.filename, &file.subfolder, &file.folder_type)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn server_urls_follow_scheme() {
        let plain = ComfyUIClient::for_server("127.0.0.1", 8188, false);
        assert_eq!(plain.ws_url(), "ws://127.0.0.1:8188");
        assert_eq!(plain.api().api_url(), "http://127.0.0.1:8188");

        let secure = ComfyUIClient::for_server("gpu.local", 443, true);
        assert_eq!(secure.ws_url(), "wss://gpu.local:443");
        assert_eq!(secure.api().api_url(), "https://gpu.local:443");
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_connection_error() {
        let client = ComfyUIClient::for_server("127.0.0.1", 9, false);
        assert_matches!(client.connect().await, Err(ComfyUIClientError::Connection(_)));
        assert_matches!(
            client
                .run_workflow(&Workflow::text_to_image(), Duration::from_secs(1), None)
                .await,
            Err(ComfyUIClientError::Connection(_))
        );
    }
}
