//! pantry-ai - Recipe orchestration service
//!
//! Accepts text, image or audio descriptions of ingredients, lets the
//! reasoning layer turn them into recipes through agent tools, and serves
//! the stored recipes and nutritional preferences of each user.

use anyhow::{Context, Result};
use clap::Parser;
use pantry_common::config::TomlConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use pantry_ai::assets::TempAssetManager;
use pantry_ai::config::AgentInstructions;
use pantry_ai::inference::{InferenceProvider, OpenAiClient};
use pantry_ai::orchestrator::Orchestrator;
use pantry_ai::services::SupabaseAuthenticator;
use pantry_ai::tools::{standard_tools, ToolDependencies};
use pantry_ai::AppState;

#[derive(Parser, Debug)]
#[command(version, about = "Pantry recipe orchestration service")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PANTRY_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config and PANTRY_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database file (overrides config and PANTRY_DATABASE)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Priority: CLI > environment > TOML > defaults
    let mut config = TomlConfig::load(args.config.as_deref())?;
    config.apply_env_overrides();
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Build identification first, before any slow startup step
    info!(
        "Starting Pantry AI (pantry-ai) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let instructions_dir = config.require_agent_instructions_dir()?;
    let instructions = AgentInstructions::load(instructions_dir)?;

    info!("Database: {}", config.database_path.display());
    let db = pantry_common::db::init_database(&config.database_path).await?;
    info!("Database connection established");

    let openai = Arc::new(OpenAiClient::new(&config.openai).context("Inference provider setup failed")?);
    info!(
        provider = openai.provider_name(),
        model = %config.openai.text_model,
        "Inference provider ready"
    );
    let authenticator = Arc::new(SupabaseAuthenticator::from_config(&config.auth)?);
    let assets = TempAssetManager::new(&config.temp_dir)
        .with_context(|| format!("Temporary directory {} unusable", config.temp_dir.display()))?;
    info!("Temporary assets: {}", assets.dir().display());

    let tools = standard_tools(ToolDependencies {
        db: db.clone(),
        inference: openai.clone(),
        assets: assets.clone(),
        instructions: instructions.clone(),
        image_size: config.openai.image_size.clone(),
    });
    info!(tools = ?tools.names(), "Tool registry ready");

    let orchestrator = Orchestrator::new(
        openai,
        tools,
        assets,
        instructions.orchestrator,
        config.max_tool_iterations,
    );

    let state = AppState::new(
        db,
        Arc::new(orchestrator),
        authenticator,
        config.max_request_bytes,
    );
    let app = pantry_ai::build_router(state).layer(pantry_ai::cors_layer(&config.cors_origins));

    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_address, e);
            return Err(e.into());
        }
    };
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
