//! Shared fixtures for pantry-ai integration tests
//!
//! Every fixture runs fully offline: in-memory SQLite, a private temp
//! directory, fake inference and a scripted reasoning layer.

#![allow(dead_code)]

use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pantry_ai::assets::TempAssetManager;
use pantry_ai::config::AgentInstructions;
use pantry_ai::inference::{ChatMessage, FakeInference, ScriptedReasoner};
use pantry_ai::orchestrator::Orchestrator;
use pantry_ai::tools::{standard_tools, ToolDependencies};
use pantry_ai::AppState;
use pantry_common::auth::StaticAuthenticator;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Bearer token accepted for user "42"
pub const TOKEN_42: &str = "token-42";
/// Bearer token accepted for user "7"
pub const TOKEN_7: &str = "token-7";

/// Orchestrator plus handles to everything it was built from
pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub db: SqlitePool,
    pub assets: TempAssetManager,
    pub inference: Arc<FakeInference>,
    pub reasoner: Arc<ScriptedReasoner>,
    pub temp_dir: TempDir,
}

impl Harness {
    /// Files currently present in the asset directory
    pub fn temp_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .expect("temp dir readable")
            .map(|e| e.expect("dir entry").path())
            .collect()
    }
}

pub fn test_instructions() -> AgentInstructions {
    AgentInstructions {
        orchestrator: "You are the pantry orchestrator.".to_string(),
        image_reader: "List the ingredients in this image.".to_string(),
        voice: "Cooking ingredients and quantities.".to_string(),
        recipe: "Write numbered cooking steps.".to_string(),
    }
}

pub async fn harness(inference: FakeInference, reasoner: ScriptedReasoner) -> Harness {
    harness_with_limit(inference, reasoner, 12).await
}

pub async fn harness_with_limit(
    inference: FakeInference,
    reasoner: ScriptedReasoner,
    max_iterations: usize,
) -> Harness {
    let db = pantry_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let assets = TempAssetManager::new(temp_dir.path()).expect("Failed to create asset manager");
    let inference = Arc::new(inference);
    let reasoner = Arc::new(reasoner);

    let tools = standard_tools(ToolDependencies {
        db: db.clone(),
        inference: inference.clone(),
        assets: assets.clone(),
        instructions: test_instructions(),
        image_size: "1024x1024".to_string(),
    });

    let orchestrator = Orchestrator::new(
        reasoner.clone(),
        tools,
        assets.clone(),
        test_instructions().orchestrator,
        max_iterations,
    );

    Harness {
        orchestrator: Arc::new(orchestrator),
        db,
        assets,
        inference,
        reasoner,
        temp_dir,
    }
}

/// Router over a harness, with two known users
pub fn router(harness: &Harness) -> Router {
    let authenticator = StaticAuthenticator::new()
        .with_user(TOKEN_42, "42")
        .with_user(TOKEN_7, "7");

    let state = AppState::new(
        harness.db.clone(),
        harness.orchestrator.clone(),
        Arc::new(authenticator),
        1024 * 1024,
    );
    pantry_ai::build_router(state)
}

/// Minimal WAV payload, base64 encoded
pub fn wav_base64() -> String {
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&36u32.to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&[0u8; 24]);
    STANDARD.encode(bytes)
}

/// Minimal PNG header, base64 encoded
pub fn png_base64() -> String {
    STANDARD.encode(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01")
}

/// Asset path embedded in the task message of a conversation
pub fn task_asset_path(messages: &[ChatMessage]) -> Option<String> {
    messages.iter().find_map(|m| match m {
        ChatMessage::User { content } => content
            .split("stored temporarily at: ")
            .nth(1)
            .map(|p| p.trim().to_string()),
        _ => None,
    })
}

/// Text of the task message
pub fn task_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .find_map(|m| match m {
            ChatMessage::User { content } => Some(content.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
