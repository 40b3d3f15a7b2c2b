//! Recipe and preference data model
//!
//! Row types mirror the SQLite tables created by [`crate::db::init_database`].
//! `New*` types are the validated insert payloads accepted at the boundary
//! (HTTP handlers and agent tools).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Recipe classification metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    /// Older clients send the Spanish key
    #[serde(alias = "calorias")]
    pub calories: i64,
}

/// Stored recipe row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "recipe_metadata")]
    pub metadata: Option<RecipeMetadata>,
    pub created_at: DateTime<Utc>,
    pub source_type: String,
    pub source_data: String,
}

/// Stored ingredient row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

/// One numbered cooking instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInstruction {
    pub step_number: u32,
    pub instruction: String,
}

/// Stored instruction list for a recipe (one row holds the ordered list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSteps {
    pub id: i64,
    pub recipe_id: i64,
    pub instructions: Vec<StepInstruction>,
}

/// Stored recipe picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImage {
    pub id: i64,
    pub recipe_id: i64,
    pub image_url: String,
}

/// A recipe with all its dependent rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeSteps>,
    pub image: Option<RecipeImage>,
}

/// Ingredient fields without a parent reference (nested in [`NewRecipe`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    /// Empty when the amount is implied ("salt to taste")
    pub quantity: String,
    /// Empty for countable items ("2 eggs")
    pub unit: String,
}

/// Recipe insert payload
///
/// `ingredients`, `steps` and `image_url` are optional nested children. When
/// any of them is present the write is performed as one composite unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub user_id: String,
    pub title: String,
    #[serde(default, alias = "recipe_metadata")]
    pub metadata: Option<RecipeMetadata>,
    pub source_type: String,
    pub source_data: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub steps: Vec<StepInstruction>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Ingredient insert payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub recipe_id: i64,
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

/// Instruction list insert payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipeSteps {
    pub recipe_id: i64,
    pub instructions: Vec<StepInstruction>,
}

/// Image insert payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipeImage {
    pub recipe_id: i64,
    pub image_url: String,
}

/// Nutritional preferences stored per user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionPreferences {
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub diet_type: Vec<String>,
    #[serde(default)]
    pub preferred_foods: Vec<String>,
    #[serde(default)]
    pub avoid_foods: Vec<String>,
    #[serde(default)]
    pub favorite_dishes: Vec<String>,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_recipe_id(recipe_id: i64) -> Result<()> {
    if recipe_id <= 0 {
        return Err(Error::InvalidInput(format!(
            "recipe_id must be a positive id, got {}",
            recipe_id
        )));
    }
    Ok(())
}

/// Validate an instruction list and return it sorted by step number
pub fn ordered_instructions(instructions: &[StepInstruction]) -> Result<Vec<StepInstruction>> {
    if instructions.is_empty() {
        return Err(Error::InvalidInput("instructions must not be empty".to_string()));
    }

    let mut sorted = instructions.to_vec();
    sorted.sort_by_key(|s| s.step_number);

    for (i, step) in sorted.iter().enumerate() {
        if step.step_number == 0 {
            return Err(Error::InvalidInput("step_number starts at 1".to_string()));
        }
        if i > 0 && sorted[i - 1].step_number == step.step_number {
            return Err(Error::InvalidInput(format!(
                "duplicate step_number {}",
                step.step_number
            )));
        }
        require_text("instruction", &step.instruction)?;
    }

    Ok(sorted)
}

impl NewRecipe {
    /// Check required fields of the recipe and all nested children
    pub fn validate(&self) -> Result<()> {
        require_text("user_id", &self.user_id)?;
        require_text("title", &self.title)?;
        require_text("source_type", &self.source_type)?;

        for ingredient in &self.ingredients {
            require_text("ingredient name", &ingredient.name)?;
        }
        if !self.steps.is_empty() {
            ordered_instructions(&self.steps)?;
        }
        if let Some(url) = &self.image_url {
            require_text("image_url", url)?;
        }
        Ok(())
    }

    /// True when the payload carries dependent rows
    pub fn has_children(&self) -> bool {
        !self.ingredients.is_empty() || !self.steps.is_empty() || self.image_url.is_some()
    }
}

impl NewIngredient {
    pub fn validate(&self) -> Result<()> {
        require_recipe_id(self.recipe_id)?;
        require_text("name", &self.name)
    }
}

impl NewRecipeSteps {
    pub fn validate(&self) -> Result<()> {
        require_recipe_id(self.recipe_id)?;
        ordered_instructions(&self.instructions).map(|_| ())
    }
}

impl NewRecipeImage {
    pub fn validate(&self) -> Result<()> {
        require_recipe_id(self.recipe_id)?;
        require_text("image_url", &self.image_url)
    }
}
