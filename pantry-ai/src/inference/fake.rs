//! Deterministic inference doubles
//!
//! Both types record what they were asked so tests can assert on prompts and
//! tool conversations without network access.

use super::{ChatMessage, InferenceError, InferenceProvider, Reasoner, ReasonerStep, ToolCall, ToolSpec};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A call received by [`FakeInference`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Text { instructions: String, input: String },
    Image { instructions: String, data_uri: String },
    Audio { prompt: String, bytes: usize, file_name: String },
    GenerateImage { prompt: String, size: String },
}

/// Fake single-shot provider
///
/// Each capability answers with its configured response. An unconfigured
/// capability fails with [`InferenceError::RequestFailed`].
#[derive(Debug, Default)]
pub struct FakeInference {
    text: Option<String>,
    image: Option<String>,
    transcript: Option<String>,
    generated_url: Option<String>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, response: &str) -> Self {
        self.text = Some(response.to_string());
        self
    }

    pub fn with_image_description(mut self, response: &str) -> Self {
        self.image = Some(response.to_string());
        self
    }

    pub fn with_transcript(mut self, response: &str) -> Self {
        self.transcript = Some(response.to_string());
        self
    }

    pub fn with_generated_image(mut self, url: &str) -> Self {
        self.generated_url = Some(url.to_string());
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        lock(&self.calls).clone()
    }

    fn answer(&self, call: FakeCall, response: &Option<String>) -> Result<String, InferenceError> {
        lock(&self.calls).push(call);
        response
            .clone()
            .ok_or_else(|| InferenceError::RequestFailed("fake provider has no response".to_string()))
    }
}

#[async_trait]
impl InferenceProvider for FakeInference {
    async fn complete_text(&self, instructions: &str, input: &str) -> Result<String, InferenceError> {
        let call = FakeCall::Text {
            instructions: instructions.to_string(),
            input: input.to_string(),
        };
        self.answer(call, &self.text)
    }

    async fn describe_image(&self, instructions: &str, image_data_uri: &str) -> Result<String, InferenceError> {
        let call = FakeCall::Image {
            instructions: instructions.to_string(),
            data_uri: image_data_uri.to_string(),
        };
        self.answer(call, &self.image)
    }

    async fn transcribe_audio(
        &self,
        prompt: &str,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<String, InferenceError> {
        let call = FakeCall::Audio {
            prompt: prompt.to_string(),
            bytes: audio.len(),
            file_name: file_name.to_string(),
        };
        self.answer(call, &self.transcript)
    }

    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, InferenceError> {
        let call = FakeCall::GenerateImage {
            prompt: prompt.to_string(),
            size: size.to_string(),
        };
        self.answer(call, &self.generated_url)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

type ScriptedStep = Box<dyn Fn(&[ChatMessage]) -> Result<ReasonerStep, InferenceError> + Send + Sync>;

/// Reasoner that replays a fixed script of steps
///
/// Each step sees the conversation so far, so later steps can read earlier
/// tool results (for example a generated recipe id). When the script runs
/// out, the reasoner fails.
#[derive(Default)]
pub struct ScriptedReasoner {
    steps: Mutex<VecDeque<ScriptedStep>>,
    conversations: Mutex<Vec<Vec<ChatMessage>>>,
    call_ids: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step computed from the conversation
    pub fn then<F>(self, step: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<ReasonerStep, InferenceError> + Send + Sync + 'static,
    {
        lock(&self.steps).push_back(Box::new(step));
        self
    }

    /// Append a fixed step
    pub fn then_step(self, step: ReasonerStep) -> Self {
        self.then(move |_| Ok(step.clone()))
    }

    /// Append a single tool call with fixed arguments
    pub fn then_tool(self, name: &str, arguments: serde_json::Value) -> Self {
        let id = self.call_ids.fetch_add(1, Ordering::SeqCst) + 1;
        self.then_step(ReasonerStep::ToolCalls(vec![ToolCall {
            id: format!("call_{}", id),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }]))
    }

    /// Append the final answer
    pub fn then_final(self, output: &str) -> Self {
        self.then_step(ReasonerStep::Final(output.to_string()))
    }

    /// Append a transport failure
    pub fn then_fail(self, message: &str) -> Self {
        let message = message.to_string();
        self.then(move |_| Err(InferenceError::RequestFailed(message.clone())))
    }

    /// Conversations observed at each step
    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.conversations).clone()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }
}

impl fmt::Debug for ScriptedReasoner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedReasoner")
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn next_step(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ReasonerStep, InferenceError> {
        lock(&self.conversations).push(messages.to_vec());
        let step = lock(&self.steps).pop_front();
        match step {
            Some(step) => step(messages),
            None => Err(InferenceError::RequestFailed("reasoner script exhausted".to_string())),
        }
    }
}

/// Latest tool result in a conversation, parsed as JSON
pub fn last_tool_result(messages: &[ChatMessage]) -> Option<serde_json::Value> {
    messages.iter().rev().find_map(|m| match m {
        ChatMessage::Tool { content, .. } => serde_json::from_str(content).ok(),
        _ => None,
    })
}
