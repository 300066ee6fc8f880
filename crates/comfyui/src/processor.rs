//! Completion waiter: reads frames until one prompt finishes.
//!
//! Works over any stream of WebSocket messages so the loop can be driven by
//! a live connection or by a scripted stream in tests.

use futures::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::client::ComfyUIClientError;
use crate::messages::{parse_frame, ComfyUIMessage, OutputFile, ParsedFrame};

/// Step progress callback: `(current_step, total_steps)`.
pub type StepCallback<'a> = &'a (dyn Fn(u32, u32) + Send + Sync);

/// Consume `stream` until `prompt_id` completes, fails or the stream ends.
///
/// Output files are gathered from `executed` frames. Frames for other
/// prompts are ignored; progress frames without a prompt id are attributed
/// to ours. Completion without any output file is an error.
pub async fn await_completion<S>(
    stream: &mut S,
    prompt_id: &str,
    on_step: Option<StepCallback<'_>>,
) -> Result<Vec<OutputFile>, ComfyUIClientError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut outputs = Vec::new();

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                tracing::trace!(prompt_id, "Ignoring binary frame (preview image)");
                continue;
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(prompt_id, ?frame, "ComfyUI WebSocket closed");
                break;
            }
            Ok(_) => continue,
            Err(e) => return Err(ComfyUIClientError::Protocol(e.to_string())),
        };

        let message = match parse_frame(&text) {
            ParsedFrame::Message(message) => message,
            ParsedFrame::Unhandled(kind) => {
                tracing::trace!(prompt_id, kind = %kind, "Ignoring unhandled message type");
                continue;
            }
            ParsedFrame::Malformed(e) => {
                tracing::warn!(prompt_id, error = %e, raw_message = %text, "Failed to parse ComfyUI message");
                continue;
            }
        };

        if message.prompt_id().is_some_and(|id| id != prompt_id) {
            continue;
        }

        match message {
            ComfyUIMessage::Progress(data) => {
                tracing::debug!(prompt_id, value = data.value, max = data.max, "Generation progress");
                if let Some(callback) = on_step {
                    callback(data.value, data.max);
                }
            }
            ComfyUIMessage::Executed(data) => {
                let files = data.output_files();
                tracing::debug!(prompt_id, node = %data.node, files = files.len(), "Node executed");
                outputs.extend(files);
            }
            ComfyUIMessage::Executing(data) if data.node.is_none() => {
                return finish(prompt_id, outputs);
            }
            ComfyUIMessage::ExecutionSuccess(_) => return finish(prompt_id, outputs),
            ComfyUIMessage::ExecutionError(data) => {
                tracing::error!(
                    prompt_id,
                    node_id = %data.node_id,
                    error_type = %data.exception_type,
                    error_message = %data.exception_message,
                    "Execution error",
                );
                return Err(ComfyUIClientError::Execution {
                    node_id: data.node_id,
                    node_type: data.node_type,
                    message: data.exception_message,
                });
            }
            ComfyUIMessage::ExecutionInterrupted(_) => {
                return Err(ComfyUIClientError::Protocol("execution was interrupted".into()));
            }
            ComfyUIMessage::ExecutionStart(_) => tracing::debug!(prompt_id, "Execution started"),
            ComfyUIMessage::Executing(_) | ComfyUIMessage::ExecutionCached(_) | ComfyUIMessage::Status(_) => {}
        }
    }

    Err(ComfyUIClientError::Protocol(
        "connection closed before the prompt finished".into(),
    ))
}

fn finish(prompt_id: &str, outputs: Vec<OutputFile>) -> Result<Vec<OutputFile>, ComfyUIClientError> {
    tracing::info!(prompt_id, files = outputs.len(), "Execution completed");
    if outputs.is_empty() {
        return Err(ComfyUIClientError::NoOutputs);
    }
    Ok(outputs)
}
