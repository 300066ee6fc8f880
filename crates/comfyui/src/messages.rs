//! ComfyUI WebSocket message types.
//!
//! Frames are JSON objects shaped `{"type": "<kind>", "data": {...}}`.

use serde::Deserialize;

/// Every frame kind the completion waiter understands.
///
/// Tagged by `"type"`, with the payload under `"data"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ComfyUIMessage {
    /// Queue broadcast, sent on connect and whenever the queue changes.
    Status(StatusData),

    /// A prompt left the queue and began running.
    ExecutionStart(PromptRef),

    /// Nodes skipped because their outputs were cached.
    ExecutionCached(CachedData),

    /// The node now running. `node: None` marks the end of a prompt.
    Executing(ExecutingData),

    /// Sampler step progress from a long-running node.
    Progress(ProgressData),

    /// A node finished and reported its output files.
    Executed(ExecutedData),

    /// The whole prompt finished without error.
    ExecutionSuccess(PromptRef),

    /// The prompt failed inside a node.
    ExecutionError(ErrorData),

    /// The prompt was cancelled on the server.
    ExecutionInterrupted(PromptRef),
}

impl ComfyUIMessage {
    /// Prompt the message belongs to, when it names one.
    pub fn prompt_id(&self) -> Option<&str> {
        match self {
            Self::Status(_) => None,
            Self::ExecutionStart(d) | Self::ExecutionSuccess(d) | Self::ExecutionInterrupted(d) => {
                Some(&d.prompt_id)
            }
            Self::ExecutionCached(d) => Some(&d.prompt_id),
            Self::Executing(d) => d.prompt_id.as_deref(),
            Self::Progress(d) => d.prompt_id.as_deref(),
            Self::Executed(d) => Some(&d.prompt_id),
            Self::ExecutionError(d) => Some(&d.prompt_id),
        }
    }
}

/// Payload of `status` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub status: QueueStatus,
}

/// Current queue state.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub exec_info: ExecInfo,
}

/// Queue statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecInfo {
    /// Prompts still waiting, including the one running.
    pub queue_remaining: u32,
}

/// Payload of frames that only name their prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRef {
    pub prompt_id: String,
}

/// Payload of `execution_cached` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct CachedData {
    pub prompt_id: String,
    /// Node ids served from cache.
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Payload of `executing` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutingData {
    /// Node id, or `None` once the prompt is done.
    pub node: Option<String>,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

/// Sampler step progress within one node.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressData {
    /// Step just completed.
    pub value: u32,
    /// Total steps for the node.
    pub max: u32,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

/// Payload of `executed` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutedData {
    pub node: String,
    /// Raw node output; see [`ExecutedData::output_files`].
    #[serde(default)]
    pub output: serde_json::Value,
    pub prompt_id: String,
}

impl ExecutedData {
    /// Files the node wrote, across its `images`, `videos` and `gifs` lists.
    pub fn output_files(&self) -> Vec<OutputFile> {
        ["images", "videos", "gifs"]
            .iter()
            .filter_map(|key| self.output.get(key))
            .filter_map(|list| serde_json::from_value::<Vec<OutputFile>>(list.clone()).ok())
            .flatten()
            .filter(|file| !file.filename.is_empty())
            .collect()
    }
}

/// One file a node produced, addressable through `GET /view`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputFile {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    /// `output`, `temp` or `input`.
    #[serde(default = "default_folder_type", rename = "type")]
    pub folder_type: String,
}

fn default_folder_type() -> String {
    "output".to_string()
}

/// Payload of `execution_error` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    pub prompt_id: String,
    /// Id of the node that raised.
    #[serde(default)]
    pub node_id: String,
    /// Class name of that node, for example `KSampler`.
    #[serde(default)]
    pub node_type: String,
    /// Human-readable error text from the server.
    #[serde(default)]
    pub exception_message: String,
    #[serde(default)]
    pub exception_type: String,
}

/// Outcome of reading one text frame.
#[derive(Debug)]
pub enum ParsedFrame {
    Message(ComfyUIMessage),
    /// Well-formed frame of a type this client does not handle.
    Unhandled(String),
    Malformed(serde_json::Error),
}

pub fn parse_message(text: &str) -> Result<ComfyUIMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parse a frame, telling unknown message types apart from broken JSON.
pub fn parse_frame(text: &str) -> ParsedFrame {
    match parse_message(text) {
        Ok(message) => ParsedFrame::Message(message),
        Err(e) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => match value.get("type").and_then(|t| t.as_str()) {
                Some(kind) if !known_type(kind) => ParsedFrame::Unhandled(kind.to_string()),
                _ => ParsedFrame::Malformed(e),
            },
            Err(_) => ParsedFrame::Malformed(e),
        },
    }
}

fn known_type(kind: &str) -> bool {
    matches!(
        kind,
        "status"
            | "execution_start"
            | "execution_cached"
            | "executing"
            | "progress"
            | "executed"
            | "execution_success"
            | "execution_error"
            | "execution_interrupted"
    )
}
