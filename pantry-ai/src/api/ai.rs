//! Orchestration endpoints
//!
//! `POST /ai` and `POST /mcp` accept `{tool, content}` where `tool` names the
//! input modality. Both routes run the same orchestration.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::{Modality, RequestEnvelope};
use crate::tools::ToolCallRecord;
use crate::AppState;

/// Orchestration request body
#[derive(Debug, Deserialize)]
pub struct AiRequest {
    /// Input modality: text, image or audio
    pub tool: Modality,
    /// Plain text, or base64 for image/audio
    pub content: String,
    /// Sent by the web client; not used
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiResponse {
    pub status: &'static str,
    pub output: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// POST /ai, POST /mcp
pub async fn orchestrate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<AiRequest>, JsonRejection>,
) -> ApiResult<Json<AiResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let envelope = RequestEnvelope {
        modality: request.tool,
        payload: request.content,
        user_id: user.id,
    };
    let outcome = state.orchestrator.run(envelope).await?;

    Ok(Json(AiResponse {
        status: "success",
        output: outcome.output,
        tool_calls: outcome.tool_calls,
    }))
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai", post(orchestrate))
        .route("/mcp", post(orchestrate))
}
