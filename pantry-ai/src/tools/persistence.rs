//! Persistence writer operations exposed as tools
//!
//! The owner of every write is the authenticated caller. A `user_id` sent by
//! the reasoning layer is overwritten, and child rows may only reference the
//! caller's own recipes.

use super::{parse_args, Tool, ToolContext, ToolError};
use crate::services::PersistenceWriter;
use async_trait::async_trait;
use pantry_common::models::{NewIngredient, NewRecipe, NewRecipeImage, NewRecipeSteps};
use serde_json::{json, Value};

fn step_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "step_number": {"type": "integer", "minimum": 1},
            "instruction": {"type": "string"}
        },
        "required": ["step_number", "instruction"]
    })
}

pub struct InsertRecipeTool {
    writer: PersistenceWriter,
}

impl InsertRecipeTool {
    pub fn new(writer: PersistenceWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Tool for InsertRecipeTool {
    fn name(&self) -> &'static str {
        "insert_recipe"
    }

    fn description(&self) -> &'static str {
        "Insert a new recipe. Optional ingredients, steps and image_url are saved together with it. \
         Returns the new recipe id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "recipe_metadata": {
                    "type": "object",
                    "properties": {
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "calories": {"type": "integer"}
                    },
                    "required": ["tags", "calories"]
                },
                "source_type": {"type": "string", "enum": ["text", "image", "audio"]},
                "source_data": {"type": "string"},
                "ingredients": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "quantity": {"type": "string"},
                            "unit": {"type": "string"}
                        },
                        "required": ["name", "quantity", "unit"]
                    }
                },
                "steps": {"type": "array", "items": step_schema()},
                "image_url": {"type": "string"}
            },
            "required": ["title", "source_type", "source_data"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, mut args: Value) -> Result<Value, ToolError> {
        match args.as_object_mut() {
            Some(object) => {
                object.insert("user_id".to_string(), Value::String(ctx.user_id.clone()));
            }
            None => return Err(ToolError::InvalidArguments("expected an object".to_string())),
        }

        let recipe: NewRecipe = parse_args(args)?;
        let outcome = self.writer.insert_recipe(&recipe).await;
        Ok(serde_json::to_value(outcome).map_err(pantry_common::Error::from)?)
    }
}

pub struct InsertRecipeIngredientTool {
    writer: PersistenceWriter,
}

impl InsertRecipeIngredientTool {
    pub fn new(writer: PersistenceWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Tool for InsertRecipeIngredientTool {
    fn name(&self) -> &'static str {
        "insert_recipe_ingredient"
    }

    fn description(&self) -> &'static str {
        "Insert one ingredient associated with a recipe"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipe_id": {"type": "integer"},
                "name": {"type": "string"},
                "quantity": {"type": "string"},
                "unit": {"type": "string"}
            },
            "required": ["recipe_id", "name", "quantity", "unit"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let ingredient: NewIngredient = parse_args(args)?;
        let outcome = self.writer.insert_recipe_ingredient(&ctx.user_id, &ingredient).await;
        Ok(serde_json::to_value(outcome).map_err(pantry_common::Error::from)?)
    }
}

pub struct InsertRecipeStepTool {
    writer: PersistenceWriter,
}

impl InsertRecipeStepTool {
    pub fn new(writer: PersistenceWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Tool for InsertRecipeStepTool {
    fn name(&self) -> &'static str {
        "insert_recipe_step"
    }

    fn description(&self) -> &'static str {
        "Insert the ordered list of preparation steps of a recipe"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipe_id": {"type": "integer"},
                "instructions": {"type": "array", "items": step_schema()}
            },
            "required": ["recipe_id", "instructions"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let steps: NewRecipeSteps = parse_args(args)?;
        let outcome = self.writer.insert_recipe_step(&ctx.user_id, &steps).await;
        Ok(serde_json::to_value(outcome).map_err(pantry_common::Error::from)?)
    }
}

pub struct InsertRecipeImageTool {
    writer: PersistenceWriter,
}

impl InsertRecipeImageTool {
    pub fn new(writer: PersistenceWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Tool for InsertRecipeImageTool {
    fn name(&self) -> &'static str {
        "insert_recipe_image"
    }

    fn description(&self) -> &'static str {
        "Insert the image URL of a recipe (one image per recipe)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipe_id": {"type": "integer"},
                "image_url": {"type": "string"}
            },
            "required": ["recipe_id", "image_url"]
        })
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let image: NewRecipeImage = parse_args(args)?;
        let outcome = self.writer.insert_recipe_image(&ctx.user_id, &image).await;
        Ok(serde_json::to_value(outcome).map_err(pantry_common::Error::from)?)
    }
}
