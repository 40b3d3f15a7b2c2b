//! Inference capabilities
//!
//! Two seams separate the orchestration core from any model vendor:
//! - [`InferenceProvider`]: single-shot text, vision, transcription and image
//!   generation calls used by the modality processors
//! - [`Reasoner`]: the tool-selecting reasoning layer driven by the
//!   orchestrator loop
//!
//! [`OpenAiClient`] implements both against an OpenAI-compatible HTTP API.
//! [`FakeInference`] and [`ScriptedReasoner`] are deterministic stand-ins for
//! tests and offline development.

mod fake;
mod openai;

pub use fake::{last_tool_result, FakeCall, FakeInference, ScriptedReasoner};
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for inference operations
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference request failed: {0}")]
    RequestFailed(String),

    #[error("Inference API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse inference response: {0}")]
    Parse(String),

    #[error("{0} returned empty output")]
    EmptyOutput(String),

    #[error("Inference provider not configured: {0}")]
    NotConfigured(String),
}

/// Single-shot model calls
#[async_trait]
pub trait InferenceProvider: Send + Sync + fmt::Debug {
    /// Text in, text out
    async fn complete_text(&self, instructions: &str, input: &str) -> Result<String, InferenceError>;

    /// Describe an image given as a `data:image/...;base64,` URI
    async fn describe_image(&self, instructions: &str, image_data_uri: &str) -> Result<String, InferenceError>;

    /// Speech to text, biased by `prompt`
    async fn transcribe_audio(
        &self,
        prompt: &str,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<String, InferenceError>;

    /// Generate an image and return its URL
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, InferenceError>;

    /// Provider name (e.g., "openai", "fake")
    fn provider_name(&self) -> &'static str;
}

/// Reject blank model output
pub fn require_output(source: &str, output: String) -> Result<String, InferenceError> {
    if output.trim().is_empty() {
        return Err(InferenceError::EmptyOutput(source.to_string()));
    }
    Ok(output)
}

/// A tool invocation requested by the reasoning layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id echoed back with the result
    pub id: String,
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

/// Tool declaration offered to the reasoning layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object
    pub parameters: serde_json::Value,
}

/// Conversation entry exchanged with the reasoning layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool { tool_call_id: String, content: String },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }
}

/// What the reasoning layer wants next
#[derive(Debug, Clone, PartialEq)]
pub enum ReasonerStep {
    /// Run these tools, in order, and report back
    ToolCalls(Vec<ToolCall>),
    /// Finished; the final answer
    Final(String),
}

/// The tool-selecting reasoning layer
#[async_trait]
pub trait Reasoner: Send + Sync + fmt::Debug {
    async fn next_step(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ReasonerStep, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_output() {
        assert_eq!(require_output("voice", "eggs".to_string()).unwrap(), "eggs");
        assert!(matches!(
            require_output("voice", "  \n".to_string()),
            Err(InferenceError::EmptyOutput(source)) if source == "voice"
        ));
    }

    #[test]
    fn test_chat_message_serializes_role() {
        let value = serde_json::to_value(ChatMessage::user("hello")).unwrap();
        assert_eq!(value, serde_json::json!({"role": "user", "content": "hello"}));
    }
}
