//! Modality processors and recipe extraction exposed as tools

use super::{parse_args, Tool, ToolContext, ToolError};
use crate::processors::{ImageGenerator, ImageReader, RecipeInstructions, VoiceTranscriber};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct ImageReaderArgs {
    image_path: PathBuf,
    #[serde(default)]
    image_type: Option<String>,
}

/// `image_reader`: ingredients visible in a temporary image file
pub struct ImageReaderTool {
    reader: ImageReader,
}

impl ImageReaderTool {
    pub fn new(reader: ImageReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ImageReaderTool {
    fn name(&self) -> &'static str {
        "image_reader"
    }

    fn description(&self) -> &'static str {
        "Read a temporary image file and list the ingredients or recipe it shows."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_path": {"type": "string", "description": "Path of the temporary image file"},
                "image_type": {"type": "string", "description": "Image subtype such as jpeg or png"}
            },
            "required": ["image_path"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let args: ImageReaderArgs = parse_args(args)?;
        ctx.require_asset(&args.image_path)?;
        let text = self
            .reader
            .process(&args.image_path, args.image_type.as_deref())
            .await?;
        Ok(json!({"status": "success", "text": text}))
    }
}

#[derive(Debug, Deserialize)]
struct VoiceArgs {
    voice_data_file_path: PathBuf,
}

/// `voice_processor`: transcript of a temporary audio file
pub struct VoiceProcessorTool {
    transcriber: VoiceTranscriber,
}

impl VoiceProcessorTool {
    pub fn new(transcriber: VoiceTranscriber) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl Tool for VoiceProcessorTool {
    fn name(&self) -> &'static str {
        "voice_processor"
    }

    fn description(&self) -> &'static str {
        "Transcribe a temporary audio file in which the user describes ingredients or a dish. \
         The file is consumed by the call."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "voice_data_file_path": {"type": "string", "description": "Path of the temporary audio file"}
            },
            "required": ["voice_data_file_path"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let args: VoiceArgs = parse_args(args)?;
        ctx.require_asset(&args.voice_data_file_path)?;
        let text = self.transcriber.process(&args.voice_data_file_path).await?;
        Ok(json!({"status": "success", "text": text}))
    }
}

#[derive(Debug, Deserialize)]
struct RecipeDescriptionArgs {
    recipe_description: String,
}

/// `recipe_instructions_processor`: ordered steps for a described recipe
pub struct RecipeInstructionsTool {
    extractor: RecipeInstructions,
}

impl RecipeInstructionsTool {
    pub fn new(extractor: RecipeInstructions) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for RecipeInstructionsTool {
    fn name(&self) -> &'static str {
        "recipe_instructions_processor"
    }

    fn description(&self) -> &'static str {
        "Provide step-by-step cooking instructions for the given recipe description."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipe_description": {"type": "string"}
            },
            "required": ["recipe_description"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let args: RecipeDescriptionArgs = parse_args(args)?;
        let steps = self.extractor.instructions_for(&args.recipe_description).await?;

        let instructions: Vec<Value> = steps
            .into_iter()
            .enumerate()
            .map(|(i, instruction)| json!({"step_number": i + 1, "instruction": instruction}))
            .collect();
        Ok(json!({"status": "success", "instructions": instructions}))
    }
}

#[derive(Debug, Deserialize)]
struct ImagePromptArgs {
    prompt: String,
}

/// `image_recipe_generator`: picture URL for a finished recipe
pub struct ImageRecipeGeneratorTool {
    generator: ImageGenerator,
}

impl ImageRecipeGeneratorTool {
    pub fn new(generator: ImageGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tool for ImageRecipeGeneratorTool {
    fn name(&self) -> &'static str {
        "image_recipe_generator"
    }

    fn description(&self) -> &'static str {
        "Generate a picture of the finished recipe and return its URL."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {"type": "string", "description": "Description of the finished dish"}
            },
            "required": ["prompt"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let args: ImagePromptArgs = parse_args(args)?;
        let url = self.generator.process(&args.prompt).await?;
        Ok(json!({"status": "success", "image_url": url}))
    }
}
