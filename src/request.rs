//! Request and response handling for the model service.
//!
//! This module defines the two request payload shapes (generate and chat),
//! the streaming and single-document response parsers, and the per-chunk
//! result type produced by the pipeline.

use crate::config::ApiMode;
use crate::error::{Result, SqueezeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instruction prepended to every chunk before it is sent to the model.
pub const COMPRESS_INSTRUCTION: &str =
    "Compress this text fragment without losing important information:";

/// Request body for the streaming generate endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model identifier.
    pub model: String,
    /// Full prompt including the compression instruction.
    pub prompt: String,
}

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages; always a single user message here.
    pub messages: Vec<ChatMessage>,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role (`user`, `assistant`, ...).
    pub role: String,
    /// Message content.
    pub content: String,
}

/// Build the request body for a chunk of text.
pub fn build_body(mode: ApiMode, model: &str, chunk_text: &str) -> Result<Value> {
    let prompt = format!("{COMPRESS_INSTRUCTION} {chunk_text}");
    let body = match mode {
        ApiMode::Generate => serde_json::to_value(GenerateRequest {
            model: model.to_string(),
            prompt,
        })?,
        ApiMode::Chat => serde_json::to_value(ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        })?,
    };
    Ok(body)
}

/// One line of the streaming generate response.
#[derive(Debug, Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Incremental parser for the newline-delimited generate stream.
///
/// Feed raw body bytes with [`push`](Self::push) as they arrive; partial
/// lines are buffered across calls. Once a line with `done: true` has been
/// consumed, everything after it is ignored. A malformed line fails the
/// whole response.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buf: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next piece of the response body.
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        if self.done {
            return Ok(());
        }

        self.buf.extend_from_slice(bytes);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.consume_line(&line[..line.len() - 1])?;
            if self.done {
                self.buf.clear();
                break;
            }
        }
        Ok(())
    }

    /// Whether a `done: true` line has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Finish the stream and return the accumulated text.
    ///
    /// A trailing line without a newline terminator is parsed here.
    pub fn finish(mut self) -> Result<String> {
        if !self.done {
            let rest = std::mem::take(&mut self.buf);
            self.consume_line(&rest)?;
        }
        Ok(self.text)
    }

    fn consume_line(&mut self, line: &[u8]) -> Result<()> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let parsed: GenerateLine =
            serde_json::from_slice(line).map_err(|e| SqueezeError::InvalidResponse {
                message: format!("malformed stream line: {e}"),
            })?;

        self.text.push_str(&parsed.response);
        if parsed.done {
            self.done = true;
        }
        Ok(())
    }
}

/// Strict shape of a chat endpoint response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Extract the generated text from a chat endpoint response body.
///
/// Tries the canonical `{message: {role, content}}` shape first; if that
/// does not match (the service's response shape has varied across
/// versions), falls back to a generic key lookup of `message.content`
/// before giving up.
pub fn parse_chat(body: &str) -> Result<String> {
    if let Ok(parsed) = serde_json::from_str::<ChatResponse>(body) {
        if !parsed.message.content.is_empty() {
            return Ok(parsed.message.content);
        }
    }

    let value: Value = serde_json::from_str(body).map_err(|e| SqueezeError::InvalidResponse {
        message: format!("chat response is not valid JSON: {e}"),
    })?;

    if let Some(content) = value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        return Ok(content.to_string());
    }

    Err(SqueezeError::InvalidResponse {
        message: format!("no message content in chat response: {}", truncate(body, 200)),
    })
}

/// Truncate a string for inclusion in error messages.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

/// Result of processing a single chunk.
///
/// Exactly one is produced per chunk. When processing failed after all
/// retries, `content` holds the original chunk text and `error` records
/// the last failure.
#[derive(Debug)]
pub struct ChunkResult {
    /// Index of the originating chunk.
    pub index: usize,
    /// Compressed text, or the original chunk text on failure.
    pub content: String,
    /// The last error, if all attempts failed.
    pub error: Option<SqueezeError>,
}

impl ChunkResult {
    /// Whether the chunk was compressed successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
