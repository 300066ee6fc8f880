//! Story analysis: turning parsed text into outline JSON.
//!
//! The [`StoryAnalyzer`] seam lets the API plug in an external command. When no
//! analyzer is configured, or it fails, [`default_outline`] provides a
//! deterministic placeholder outline instead.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::parser::DocumentKind;
use crate::model::project::DEFAULT_PROJECT_NAME;
use crate::outline::{OutlineCharacter, OutlineScene, OutlineShot, StoryOutline};
use crate::text::truncate_chars;

/// Characters of source text included in the analysis prompt.
pub const ANALYSIS_CONTENT_LIMIT: usize = 8000;

/// Characters of the first line used as the fallback title.
pub const FALLBACK_TITLE_LIMIT: usize = 50;

/// Captured stdout cap per stream (4 MiB).
const MAX_OUTPUT_BYTES: u64 = 4 * 1024 * 1024;

const ANALYSIS_PROMPT: &str = r#"Analyze the following content and turn it into a storyboard plan.

Input content:
{content}

Output the plan in this JSON format:
```json
{
    "project_name": "project name",
    "description": "project description",
    "aspect_ratio": "16:9",
    "style": "cinematic",
    "characters": [
        {"name": "character name", "description": "appearance, clothing, distinguishing features"}
    ],
    "scenes": [
        {"name": "scene name", "description": "environment, lighting, atmosphere"}
    ],
    "shots": [
        {
            "template": "wide/medium/closeup/over_shoulder/low_angle/following",
            "description": "shot description",
            "characters": ["names of characters in shot"],
            "scene": "scene name"
        }
    ]
}
```

Requirements:
1. Identify the characters and extract their appearance.
2. Identify the locations and describe their atmosphere.
3. Break the story into a suitable sequence of shots.
4. Pick shot types deliberately: wide to establish, medium for dialogue, closeup for emotion.
5. Keep narrative continuity between consecutive shots.

Output only the JSON, without any explanation."#;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("failed to run analyzer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("analyzer timed out after {0:?}")]
    Timeout(Duration),

    #[error("analyzer exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("analyzer did not return valid JSON: {0}")]
    InvalidJson(String),
}

#[async_trait]
pub trait StoryAnalyzer: Send + Sync {
    /// Produce outline JSON for `text`.
    async fn analyze(&self, text: &str, kind: DocumentKind) -> Result<String, AnalyzerError>;
}

/// Build the analysis prompt with the content cut to [`ANALYSIS_CONTENT_LIMIT`].
pub fn analysis_prompt(text: &str) -> String {
    ANALYSIS_PROMPT.replace("{content}", truncate_chars(text, ANALYSIS_CONTENT_LIMIT))
}

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid regex"));

/// Pull the JSON payload out of analyzer output: the first fenced json block,
/// or the whole trimmed output. The payload must parse.
pub fn extract_json(output: &str) -> Result<String, AnalyzerError> {
    let candidate = FENCED_JSON_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| output.trim());

    serde_json::from_str::<serde_json::Value>(candidate)
        .map(|_| candidate.to_string())
        .map_err(|e| AnalyzerError::InvalidJson(e.to_string()))
}

// ---------------------------------------------------------------------------
// External command
// ---------------------------------------------------------------------------

/// Runs an external program that reads the analysis prompt on stdin and
/// writes the outline to stdout.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Split a whitespace-separated command line. `None` when blank.
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), timeout))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl StoryAnalyzer for CommandAnalyzer {
    async fn analyze(&self, text: &str, kind: DocumentKind) -> Result<String, AnalyzerError> {
        let prompt = analysis_prompt(text);
        let start = Instant::now();

        // The child is killed if dropped on timeout.
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(AnalyzerError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // The program may exit without reading everything.
            let _ = stdin.write_all(prompt.as_bytes()).await;
            drop(stdin);
        }

        let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(AnalyzerError::Spawn(e)),
            Err(_) => {
                tracing::warn!(program = %self.program, timeout = ?self.timeout, "Story analyzer timed out");
                return Err(AnalyzerError::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

        tracing::debug!(
            program = %self.program,
            kind = %kind,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Story analyzer finished"
        );

        if !status.success() {
            return Err(AnalyzerError::Failed {
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
        extract_json(&stdout)
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Placeholder outline: the first line as title, two characters, one scene
/// and two shots to edit.
pub fn default_outline(text: &str, kind: DocumentKind) -> StoryOutline {
    let first_line = text.lines().next().map(str::trim).unwrap_or_default();
    let title = if first_line.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        truncate_chars(first_line, FALLBACK_TITLE_LIMIT).to_string()
    };

    let character = |name: &str| OutlineCharacter {
        name: name.to_string(),
        description: "Please fill in the character description".to_string(),
    };

    StoryOutline {
        project_name: title,
        description: format!("Imported from {kind} file"),
        aspect_ratio: "16:9".to_string(),
        style: "cinematic".to_string(),
        characters: vec![character("Character 1"), character("Character 2")],
        scenes: vec![OutlineScene {
            name: "Scene 1".to_string(),
            description: "Please fill in the scene description".to_string(),
        }],
        shots: vec![
            OutlineShot {
                template: "wide".to_string(),
                description: "Opening shot - please edit the description".to_string(),
                characters: Vec::new(),
                scene: "Scene 1".to_string(),
            },
            OutlineShot {
                template: "medium".to_string(),
                description: "Main shot - please edit the description".to_string(),
                characters: vec!["Character 1".to_string()],
                scene: "Scene 1".to_string(),
            },
        ],
    }
}
