//! Multi-modal orchestrator
//!
//! One pass per request:
//! 1. Dispatch: text passes through, image/audio payloads become a
//!    [`TemporaryAsset`]
//! 2. Compose a task naming the user and the text or asset path
//! 3. Drive the reasoning layer with the full tool set until it answers,
//!    bounded by `max_iterations` reasoning turns
//! 4. Release the asset, whatever happened in step 3
//!
//! Tool calls within a request run strictly in sequence.

use crate::assets::{AssetKind, ResourceError, TempAssetManager, TemporaryAsset};
use crate::inference::{ChatMessage, InferenceError, Reasoner, ReasonerStep};
use crate::processors::TextPassthrough;
use crate::tools::{ToolCallRecord, ToolContext, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Input category of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl Modality {
    fn asset_kind(self) -> Option<AssetKind> {
        match self {
            Modality::Text => None,
            Modality::Image => Some(AssetKind::Image),
            Modality::Audio => Some(AssetKind::Audio),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Image => write!(f, "image"),
            Modality::Audio => write!(f, "audio"),
        }
    }
}

/// One inbound orchestration request
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub modality: Modality,
    /// Plain text, or base64 for image/audio
    pub payload: String,
    pub user_id: String,
}

/// Orchestration failures, by kind
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Reasoning did not finish within {0} iterations")]
    IterationLimit(usize),
}

/// Successful orchestration result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestrationOutcome {
    /// Final answer of the reasoning layer
    pub output: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Control-flow hub between requests, the reasoning layer and the tools
#[derive(Debug)]
pub struct Orchestrator {
    reasoner: Arc<dyn Reasoner>,
    tools: ToolRegistry,
    assets: TempAssetManager,
    instructions: String,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        tools: ToolRegistry,
        assets: TempAssetManager,
        instructions: String,
        max_iterations: usize,
    ) -> Self {
        Self {
            reasoner,
            tools,
            assets,
            instructions,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Handle one request end to end
    pub async fn run(&self, envelope: RequestEnvelope) -> Result<OrchestrationOutcome, OrchestrationError> {
        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            user_id = %envelope.user_id,
            modality = %envelope.modality,
            "Orchestrating request"
        );

        let (task, asset) = self.dispatch(&envelope)?;
        if let Some(asset) = &asset {
            debug!(%request_id, kind = %asset.kind(), path = %asset.path().display(), "Materialized asset");
        }

        let ctx = ToolContext {
            user_id: envelope.user_id.clone(),
            asset: asset.as_ref().map(|a| a.path().to_path_buf()),
        };
        let result = self.execute(request_id, &ctx, task).await;

        // Teardown; also runs on drop if the future is cancelled
        if let Some(asset) = asset {
            asset.release();
        }

        match &result {
            Ok(outcome) => info!(%request_id, tool_calls = outcome.tool_calls.len(), "Orchestration finished"),
            Err(e) => error!(%request_id, error = %e, "Orchestration failed"),
        }
        result
    }

    fn dispatch(&self, envelope: &RequestEnvelope) -> Result<(String, Option<TemporaryAsset>), OrchestrationError> {
        let user_id = &envelope.user_id;

        match envelope.modality.asset_kind() {
            None => {
                if envelope.payload.trim().is_empty() {
                    return Err(OrchestrationError::InvalidInput("text content is empty".to_string()));
                }
                let text = TextPassthrough.process(&envelope.payload);
                Ok((text_task(user_id, &text), None))
            }
            Some(kind) => {
                let asset = self.assets.materialize(&envelope.payload, kind)?;
                let task = asset_task(user_id, envelope.modality, asset.path().display());
                Ok((task, Some(asset)))
            }
        }
    }

    async fn execute(
        &self,
        request_id: Uuid,
        ctx: &ToolContext,
        task: String,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let specs = self.tools.specs();
        let mut messages = vec![ChatMessage::system(self.instructions.clone()), ChatMessage::user(task)];
        let mut tool_calls = Vec::new();

        for iteration in 1..=self.max_iterations {
            debug!(%request_id, iteration, max = self.max_iterations, "Reasoning turn");

            match self.reasoner.next_step(&messages, &specs).await? {
                ReasonerStep::Final(output) => {
                    if output.trim().is_empty() {
                        return Err(InferenceError::EmptyOutput("orchestrator".to_string()).into());
                    }
                    return Ok(OrchestrationOutcome { output, tool_calls });
                }
                ReasonerStep::ToolCalls(calls) => {
                    messages.push(ChatMessage::Assistant {
                        content: None,
                        tool_calls: calls.clone(),
                    });
                    for call in &calls {
                        let invocation = self.tools.invoke(ctx, call).await;
                        messages.push(ChatMessage::Tool {
                            tool_call_id: call.id.clone(),
                            content: invocation.output.to_string(),
                        });
                        tool_calls.push(invocation.record());
                    }
                }
            }
        }

        Err(OrchestrationError::IterationLimit(self.max_iterations))
    }
}

fn text_task(user_id: &str, text: &str) -> String {
    format!(
        "The user {} is trying to generate a recipe providing the following ingredients or data: {}",
        user_id, text
    )
}

fn asset_task(user_id: &str, modality: Modality, path: impl fmt::Display) -> String {
    format!(
        "The user {} is trying to generate a recipe using {} data, stored temporarily at: {}",
        user_id, modality, path
    )
}
