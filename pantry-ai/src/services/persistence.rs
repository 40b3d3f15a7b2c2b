//! Persistence writer
//!
//! Write operations offered to the reasoning layer. None of them return an
//! error: every failure becomes [`WriteOutcome::Error`] so the caller can
//! retry or adjust its next call.

use crate::db::recipes;
use pantry_common::models::{NewIngredient, NewRecipe, NewRecipeImage, NewRecipeSteps};
use pantry_common::Error;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

/// Tagged result of a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WriteOutcome {
    Success {
        id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Error {
        message: String,
    },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success { .. })
    }

    fn from_result(operation: &str, result: pantry_common::Result<i64>, title: Option<String>) -> Self {
        match result {
            Ok(id) => WriteOutcome::Success { id, title },
            Err(e) => {
                warn!(operation, error = %e, "Write rejected");
                WriteOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Recipe writes scoped to the database pool
#[derive(Debug, Clone)]
pub struct PersistenceWriter {
    db: SqlitePool,
}

impl PersistenceWriter {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a recipe; nested ingredients/steps/image are written atomically with it
    pub async fn insert_recipe(&self, recipe: &NewRecipe) -> WriteOutcome {
        let result = if recipe.has_children() {
            recipes::insert_complete_recipe(&self.db, recipe).await
        } else {
            recipes::insert_recipe(&self.db, recipe).await
        };
        WriteOutcome::from_result("insert_recipe", result, Some(recipe.title.clone()))
    }

    pub async fn insert_recipe_ingredient(&self, user_id: &str, ingredient: &NewIngredient) -> WriteOutcome {
        let result = match self.check_owner(ingredient.recipe_id, user_id).await {
            Ok(()) => recipes::insert_ingredient(&self.db, ingredient).await,
            Err(e) => Err(e),
        };
        WriteOutcome::from_result("insert_recipe_ingredient", result, None)
    }

    pub async fn insert_recipe_step(&self, user_id: &str, steps: &NewRecipeSteps) -> WriteOutcome {
        let result = match self.check_owner(steps.recipe_id, user_id).await {
            Ok(()) => recipes::insert_steps(&self.db, steps).await,
            Err(e) => Err(e),
        };
        WriteOutcome::from_result("insert_recipe_step", result, None)
    }

    pub async fn insert_recipe_image(&self, user_id: &str, image: &NewRecipeImage) -> WriteOutcome {
        let result = match self.check_owner(image.recipe_id, user_id).await {
            Ok(()) => recipes::insert_image(&self.db, image).await,
            Err(e) => Err(e),
        };
        WriteOutcome::from_result("insert_recipe_image", result, None)
    }

    /// Children may only be attached to the caller's own recipes
    async fn check_owner(&self, recipe_id: i64, user_id: &str) -> pantry_common::Result<()> {
        if recipes::recipe_owned_by(&self.db, recipe_id, user_id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Recipe {} not found for user {}", recipe_id, user_id)))
        }
    }
}
