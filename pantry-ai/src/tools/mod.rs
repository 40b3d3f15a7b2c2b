//! Tools offered to the reasoning layer
//!
//! A [`Tool`] is a named capability with a JSON argument schema. The
//! [`ToolRegistry`] keeps tools in declaration order, advertises their specs
//! and runs one call at a time. Tool failures never escape the registry: they
//! come back as `{"status": "error", "message": ...}` so the reasoning layer
//! can react to them.

mod modality;
mod persistence;
mod schema;

pub use modality::{ImageReaderTool, ImageRecipeGeneratorTool, RecipeInstructionsTool, VoiceProcessorTool};
pub use persistence::{InsertRecipeImageTool, InsertRecipeIngredientTool, InsertRecipeStepTool, InsertRecipeTool};
pub use schema::TableSchemasTool;

use crate::assets::TempAssetManager;
use crate::config::AgentInstructions;
use crate::inference::{InferenceError, InferenceProvider, ToolCall, ToolSpec};
use crate::processors::{ImageGenerator, ImageReader, ProcessorError, RecipeInstructions, VoiceTranscriber};
use crate::services::PersistenceWriter;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Tool failures, reported back to the reasoning layer
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{} is not the file attached to this request", .0.display())]
    ForeignAsset(PathBuf),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Common(#[from] pantry_common::Error),
}

/// Per-request facts every tool may rely on
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Authenticated caller; persistence tools write on behalf of this user only
    pub user_id: String,
    /// Temporary file materialized for this request, if any
    pub asset: Option<PathBuf>,
}

impl ToolContext {
    /// Accept `path` only if it names this request's own asset
    pub fn require_asset(&self, path: &Path) -> Result<(), ToolError> {
        match &self.asset {
            Some(asset) if asset.as_path() == path => Ok(()),
            _ => Err(ToolError::ForeignAsset(path.to_path_buf())),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the argument object
    fn parameters(&self) -> Value;

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Deserialize tool arguments into a typed payload
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Outcome of one tool call
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: String,
    pub success: bool,
    pub elapsed_ms: u64,
    /// JSON handed back to the reasoning layer
    pub output: Value,
}

/// Summary of a tool call returned to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub success: bool,
    pub elapsed_ms: u64,
}

impl ToolInvocation {
    pub fn record(&self) -> ToolCallRecord {
        ToolCallRecord {
            tool: self.tool.clone(),
            success: self.success,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Ordered tool collection
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; a later tool with the same name replaces the earlier one
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run one call; never fails
    pub async fn invoke(&self, ctx: &ToolContext, call: &ToolCall) -> ToolInvocation {
        let started = Instant::now();
        let result = self.dispatch(ctx, call).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (success, output) = match result {
            Ok(output) => {
                // Persistence tools report their own failures in-band
                let success = output.get("status").and_then(Value::as_str) != Some("error");
                (success, output)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                (false, json!({"status": "error", "message": e.to_string()}))
            }
        };

        info!(tool = %call.name, success, elapsed_ms, "Tool call finished");

        ToolInvocation {
            tool: call.name.clone(),
            success,
            elapsed_ms,
            output,
        }
    }

    async fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let args = if call.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))?
        };

        tool.invoke(ctx, args).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

/// Everything the standard tool set needs
#[derive(Debug, Clone)]
pub struct ToolDependencies {
    pub db: SqlitePool,
    pub inference: Arc<dyn InferenceProvider>,
    pub assets: TempAssetManager,
    pub instructions: AgentInstructions,
    pub image_size: String,
}

/// Modality processors, extraction, schema introspection and persistence writes
pub fn standard_tools(deps: ToolDependencies) -> ToolRegistry {
    let writer = PersistenceWriter::new(deps.db.clone());

    ToolRegistry::new()
        .with(ImageReaderTool::new(ImageReader::new(
            deps.inference.clone(),
            deps.assets.clone(),
            deps.instructions.image_reader.clone(),
        )))
        .with(VoiceProcessorTool::new(VoiceTranscriber::new(
            deps.inference.clone(),
            deps.assets.clone(),
            deps.instructions.voice.clone(),
        )))
        .with(RecipeInstructionsTool::new(RecipeInstructions::new(
            deps.inference.clone(),
            deps.instructions.recipe.clone(),
        )))
        .with(ImageRecipeGeneratorTool::new(ImageGenerator::new(
            deps.inference.clone(),
            deps.image_size,
        )))
        .with(TableSchemasTool::new(deps.db))
        .with(InsertRecipeTool::new(writer.clone()))
        .with(InsertRecipeIngredientTool::new(writer.clone()))
        .with(InsertRecipeStepTool::new(writer.clone()))
        .with(InsertRecipeImageTool::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the arguments"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
            if args.get("fail").is_some() {
                return Err(ToolError::InvalidArguments("fail requested".to_string()));
            }
            Ok(json!({"user": ctx.user_id, "args": args}))
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            user_id: "u1".to_string(),
            asset: None,
        }
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let registry = ToolRegistry::new().with(Echo);
        let invocation = registry.invoke(&ctx(), &call("echo", r#"{"x": 1}"#)).await;

        assert!(invocation.success);
        assert_eq!(invocation.output["user"], "u1");
        assert_eq!(invocation.output["args"]["x"], 1);
    }

    #[tokio::test]
    async fn test_failures_become_tagged_errors() {
        let registry = ToolRegistry::new().with(Echo);

        for invocation in [
            registry.invoke(&ctx(), &call("missing", "{}")).await,
            registry.invoke(&ctx(), &call("echo", "{not json")).await,
            registry.invoke(&ctx(), &call("echo", r#"{"fail": true}"#)).await,
        ] {
            assert!(!invocation.success);
            assert_eq!(invocation.output["status"], "error");
            assert!(invocation.output["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_empty_arguments_are_empty_object() {
        let registry = ToolRegistry::new().with(Echo);
        let invocation = registry.invoke(&ctx(), &call("echo", "")).await;
        assert_eq!(invocation.output["args"], json!({}));
    }

    #[test]
    fn test_require_asset_matches_own_file_only() {
        let own = PathBuf::from("/tmp/pantry/pantry-own.wav");
        let ctx = ToolContext {
            user_id: "u1".to_string(),
            asset: Some(own.clone()),
        };

        assert!(ctx.require_asset(&own).is_ok());
        assert!(matches!(
            ctx.require_asset(Path::new("/tmp/pantry/pantry-other.wav")),
            Err(ToolError::ForeignAsset(_))
        ));
        assert!(matches!(
            ToolContext { asset: None, ..ctx }.require_asset(&own),
            Err(ToolError::ForeignAsset(_))
        ));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = ToolRegistry::new().with(Echo).with(Echo);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.specs()[0].name, "echo");
    }
}
