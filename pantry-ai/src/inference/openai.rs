//! OpenAI-compatible HTTP client
//!
//! Endpoints used:
//! - `POST /responses` for text and vision
//! - `POST /audio/transcriptions` for speech to text
//! - `POST /images/generations` for recipe pictures
//! - `POST /chat/completions` with function tools for the reasoning layer

use super::{ChatMessage, InferenceError, InferenceProvider, Reasoner, ReasonerStep, ToolCall, ToolSpec};
use async_trait::async_trait;
use pantry_common::config::OpenAiConfig;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    vision_model: String,
    voice_model: String,
    image_model: String,
}

impl OpenAiClient {
    /// Build a client from configuration; the API key is required
    pub fn new(config: &OpenAiConfig) -> Result<Self, InferenceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InferenceError::NotConfigured("OPENAI_API_KEY not set".to_string()))?;

        // No request timeout: inference latency is left to the provider
        let client = reqwest::Client::builder()
            .user_agent(concat!("pantry-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InferenceError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            voice_model: config.voice_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, InferenceError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(api_error(status, text));
        }

        serde_json::from_str(&text).map_err(|e| InferenceError::Parse(e.to_string()))
    }

    async fn respond(&self, model: &str, instructions: &str, input: Value) -> Result<String, InferenceError> {
        let body = json!({
            "model": model,
            "instructions": instructions,
            "input": input,
        });
        let value = self.post_json("/responses", &body).await?;
        let response: ResponsesResponse =
            serde_json::from_value(value).map_err(|e| InferenceError::Parse(e.to_string()))?;
        Ok(response.output_text())
    }
}

/// Error body shape shared by all endpoints
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error(status: u16, body: String) -> InferenceError {
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    InferenceError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Vec<ResponsesContent>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenated `output_text` parts
    fn output_text(self) -> String {
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.content_type == "output_text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn wire_message(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::System { content } => json!({"role": "system", "content": content}),
        ChatMessage::User { content } => json!({"role": "user", "content": content}),
        ChatMessage::Assistant { content, tool_calls } => {
            let mut value = json!({"role": "assistant", "content": content});
            if !tool_calls.is_empty() {
                value["tool_calls"] = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {"name": call.name, "arguments": call.arguments},
                        })
                    })
                    .collect();
            }
            value
        }
        ChatMessage::Tool {
            tool_call_id,
            content,
        } => json!({"role": "tool", "tool_call_id": tool_call_id, "content": content}),
    }
}

fn wire_tool(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.parameters,
        }
    })
}

#[async_trait]
impl InferenceProvider for OpenAiClient {
    async fn complete_text(&self, instructions: &str, input: &str) -> Result<String, InferenceError> {
        self.respond(&self.text_model, instructions, Value::String(input.to_string()))
            .await
    }

    async fn describe_image(&self, instructions: &str, image_data_uri: &str) -> Result<String, InferenceError> {
        let input = json!([{
            "role": "user",
            "content": [{"type": "input_image", "image_url": image_data_uri}],
        }]);
        self.respond(&self.vision_model, instructions, input).await
    }

    async fn transcribe_audio(
        &self,
        prompt: &str,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<String, InferenceError> {
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;
        let form = Form::new()
            .text("model", self.voice_model.clone())
            .text("prompt", prompt.to_string())
            .text("response_format", "text")
            .part("file", part);

        let response = self
            .client
            .post(self.url("/audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(api_error(status, text));
        }
        Ok(text.trim().to_string())
    }

    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, InferenceError> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "size": size,
            "n": 1,
        });
        let value = self.post_json("/images/generations", &body).await?;
        let response: ImagesResponse =
            serde_json::from_value(value).map_err(|e| InferenceError::Parse(e.to_string()))?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Parse("No image in response".to_string()))?;

        // Models without hosted URLs return inline base64
        match (image.url, image.b64_json) {
            (Some(url), _) => Ok(url),
            (None, Some(b64)) => Ok(format!("data:image/png;base64,{}", b64)),
            (None, None) => Ok(String::new()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl Reasoner for OpenAiClient {
    async fn next_step(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ReasonerStep, InferenceError> {
        let mut body = json!({
            "model": self.text_model,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
        });
        if !tools.is_empty() {
            body["tools"] = tools.iter().map(wire_tool).collect();
            // Tool calls run strictly one after another
            body["parallel_tool_calls"] = Value::Bool(false);
        }

        let value = self.post_json("/chat/completions", &body).await?;
        let response: ChatCompletionResponse =
            serde_json::from_value(value).map_err(|e| InferenceError::Parse(e.to_string()))?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| InferenceError::Parse("No choices in response".to_string()))?;

        if !message.tool_calls.is_empty() {
            debug!(count = message.tool_calls.len(), "Reasoner requested tool calls");
            let calls = message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments: c.function.arguments,
                })
                .collect();
            return Ok(ReasonerStep::ToolCalls(calls));
        }

        Ok(ReasonerStep::Final(message.content.unwrap_or_default()))
    }
}
