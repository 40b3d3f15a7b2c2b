//! Recipe store
//!
//! Recipes own their ingredients, instruction list and optional image. Child
//! rows are removed with the parent, both by explicit deletes here and by
//! `ON DELETE CASCADE` in the schema.

use chrono::{DateTime, SecondsFormat, Utc};
use pantry_common::models::{
    ordered_instructions, CompleteRecipe, NewIngredient, NewRecipe, NewRecipeImage, NewRecipeSteps,
    Recipe, RecipeImage, RecipeIngredient, RecipeMetadata, RecipeSteps, StepInstruction,
};
use pantry_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe> {
    let metadata: Option<String> = row.get("recipe_metadata");
    let metadata = metadata
        .map(|m| serde_json::from_str::<RecipeMetadata>(&m))
        .transpose()?;
    let created_at: String = row.get("created_at");

    Ok(Recipe {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        metadata,
        created_at: parse_timestamp(&created_at)?,
        source_type: row.get("source_type"),
        source_data: row.get("source_data"),
    })
}

fn steps_from_row(row: &SqliteRow) -> Result<RecipeSteps> {
    let instructions: String = row.get("instructions");
    let mut instructions: Vec<StepInstruction> = serde_json::from_str(&instructions)?;
    instructions.sort_by_key(|s| s.step_number);

    Ok(RecipeSteps {
        id: row.get("id"),
        recipe_id: row.get("recipe_id"),
        instructions,
    })
}

async fn insert_recipe_row(conn: &mut SqliteConnection, recipe: &NewRecipe) -> Result<i64> {
    let metadata = recipe
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO recipes (user_id, title, recipe_metadata, created_at, source_type, source_data)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&recipe.user_id)
    .bind(&recipe.title)
    .bind(metadata)
    .bind(now_timestamp())
    .bind(&recipe.source_type)
    .bind(&recipe.source_data)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_ingredient_row(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    name: &str,
    quantity: &str,
    unit: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit) VALUES (?, ?, ?, ?)",
    )
    .bind(recipe_id)
    .bind(name)
    .bind(quantity)
    .bind(unit)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_steps_row(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    instructions: &[StepInstruction],
) -> Result<i64> {
    let ordered = ordered_instructions(instructions)?;
    let json = serde_json::to_string(&ordered)?;

    let result = sqlx::query("INSERT INTO recipe_steps (recipe_id, instructions) VALUES (?, ?)")
        .bind(recipe_id)
        .bind(json)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_image_row(conn: &mut SqliteConnection, recipe_id: i64, image_url: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO recipe_images (recipe_id, image_url) VALUES (?, ?)")
        .bind(recipe_id)
        .bind(image_url)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert the recipe row only; nested children are ignored
pub async fn insert_recipe(pool: &SqlitePool, recipe: &NewRecipe) -> Result<i64> {
    recipe.validate()?;
    let mut conn = pool.acquire().await?;
    let id = insert_recipe_row(&mut conn, recipe).await?;

    info!(recipe_id = id, user_id = %recipe.user_id, "Inserted recipe");
    Ok(id)
}

/// Insert a recipe with all nested children in one transaction
///
/// Any failing child rolls back the parent row.
pub async fn insert_complete_recipe(pool: &SqlitePool, recipe: &NewRecipe) -> Result<i64> {
    recipe.validate()?;
    let mut tx = pool.begin().await?;

    let id = insert_recipe_row(&mut tx, recipe).await?;
    for ingredient in &recipe.ingredients {
        insert_ingredient_row(&mut tx, id, &ingredient.name, &ingredient.quantity, &ingredient.unit).await?;
    }
    if !recipe.steps.is_empty() {
        insert_steps_row(&mut tx, id, &recipe.steps).await?;
    }
    if let Some(url) = &recipe.image_url {
        insert_image_row(&mut tx, id, url).await?;
    }

    tx.commit().await?;

    info!(
        recipe_id = id,
        user_id = %recipe.user_id,
        ingredients = recipe.ingredients.len(),
        steps = recipe.steps.len(),
        image = recipe.image_url.is_some(),
        "Inserted complete recipe"
    );
    Ok(id)
}

pub async fn insert_ingredient(pool: &SqlitePool, ingredient: &NewIngredient) -> Result<i64> {
    ingredient.validate()?;
    let mut conn = pool.acquire().await?;
    let id = insert_ingredient_row(
        &mut conn,
        ingredient.recipe_id,
        &ingredient.name,
        &ingredient.quantity,
        &ingredient.unit,
    )
    .await?;

    debug!(recipe_id = ingredient.recipe_id, ingredient_id = id, "Inserted ingredient");
    Ok(id)
}

/// Store the instruction list for a recipe, sorted by step number
///
/// A recipe holds one list; a second insert fails on the unique `recipe_id`.
pub async fn insert_steps(pool: &SqlitePool, steps: &NewRecipeSteps) -> Result<i64> {
    steps.validate()?;
    let mut conn = pool.acquire().await?;
    let id = insert_steps_row(&mut conn, steps.recipe_id, &steps.instructions).await?;

    debug!(recipe_id = steps.recipe_id, count = steps.instructions.len(), "Inserted steps");
    Ok(id)
}

/// Attach an image; a recipe holds at most one
pub async fn insert_image(pool: &SqlitePool, image: &NewRecipeImage) -> Result<i64> {
    image.validate()?;
    let mut conn = pool.acquire().await?;
    let id = insert_image_row(&mut conn, image.recipe_id, &image.image_url).await?;

    debug!(recipe_id = image.recipe_id, "Inserted recipe image");
    Ok(id)
}

/// Recipes of a user, newest first
pub async fn get_recipes_by_user_id(pool: &SqlitePool, user_id: &str) -> Result<Vec<Recipe>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, title, recipe_metadata, created_at, source_type, source_data
        FROM recipes
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(recipe_from_row).collect()
}

/// One recipe, only if owned by `user_id`
pub async fn get_recipe(pool: &SqlitePool, recipe_id: i64, user_id: &str) -> Result<Option<Recipe>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, recipe_metadata, created_at, source_type, source_data
        FROM recipes
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(recipe_from_row).transpose()
}

pub async fn get_recipe_ingredients(pool: &SqlitePool, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
    let rows = sqlx::query(
        "SELECT id, recipe_id, name, quantity, unit FROM recipe_ingredients WHERE recipe_id = ? ORDER BY id",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| RecipeIngredient {
            id: row.get("id"),
            recipe_id: row.get("recipe_id"),
            name: row.get("name"),
            quantity: row.get("quantity"),
            unit: row.get("unit"),
        })
        .collect())
}

/// Instruction lists of a recipe, each ordered by step number
pub async fn get_recipe_steps(pool: &SqlitePool, recipe_id: i64) -> Result<Vec<RecipeSteps>> {
    let rows = sqlx::query("SELECT id, recipe_id, instructions FROM recipe_steps WHERE recipe_id = ? ORDER BY id")
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(steps_from_row).collect()
}

/// The recipe image, `None` when the recipe has none
pub async fn get_recipe_image(pool: &SqlitePool, recipe_id: i64) -> Result<Option<RecipeImage>> {
    let row = sqlx::query("SELECT id, recipe_id, image_url FROM recipe_images WHERE recipe_id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| RecipeImage {
        id: row.get("id"),
        recipe_id: row.get("recipe_id"),
        image_url: row.get("image_url"),
    }))
}

pub async fn recipe_owned_by(pool: &SqlitePool, recipe_id: i64, user_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE id = ? AND user_id = ?")
        .bind(recipe_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

async fn complete(pool: &SqlitePool, recipe: Recipe) -> Result<CompleteRecipe> {
    let ingredients = get_recipe_ingredients(pool, recipe.id).await?;
    let steps = get_recipe_steps(pool, recipe.id).await?;
    let image = get_recipe_image(pool, recipe.id).await?;

    Ok(CompleteRecipe {
        recipe,
        ingredients,
        steps,
        image,
    })
}

/// All recipes of a user with their children, newest first
pub async fn load_complete_recipes(pool: &SqlitePool, user_id: &str) -> Result<Vec<CompleteRecipe>> {
    let recipes = get_recipes_by_user_id(pool, user_id).await?;
    let mut complete_recipes = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        complete_recipes.push(complete(pool, recipe).await?);
    }
    Ok(complete_recipes)
}

pub async fn load_complete_recipe(
    pool: &SqlitePool,
    recipe_id: i64,
    user_id: &str,
) -> Result<Option<CompleteRecipe>> {
    match get_recipe(pool, recipe_id, user_id).await? {
        Some(recipe) => Ok(Some(complete(pool, recipe).await?)),
        None => Ok(None),
    }
}

/// Delete a recipe and its children if `user_id` owns it
///
/// Returns `false` without deleting anything when the recipe is absent or
/// owned by someone else. Children go first: ingredients, steps, image,
/// then the recipe row, all in one transaction.
pub async fn delete_by_id(pool: &SqlitePool, recipe_id: i64, user_id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE id = ? AND user_id = ?")
        .bind(recipe_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
    if owned == 0 {
        debug!(recipe_id, user_id, "Delete skipped: recipe not owned by user");
        return Ok(false);
    }

    for statement in [
        "DELETE FROM recipe_ingredients WHERE recipe_id = ?",
        "DELETE FROM recipe_steps WHERE recipe_id = ?",
        "DELETE FROM recipe_images WHERE recipe_id = ?",
        "DELETE FROM recipes WHERE id = ?",
    ] {
        sqlx::query(statement).bind(recipe_id).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    info!(recipe_id, user_id, "Deleted recipe");
    Ok(true)
}
