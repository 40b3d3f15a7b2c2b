//! Recipe retrieval and deletion for the authenticated user

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use pantry_common::models::CompleteRecipe;
use serde::Serialize;

use crate::api::AuthUser;
use crate::db::recipes;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<CompleteRecipe>>> {
    let recipes = recipes::load_complete_recipes(&state.db, &user.id).await?;
    Ok(Json(recipes))
}

/// GET /recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Json<CompleteRecipe>> {
    recipes::load_complete_recipe(&state.db, recipe_id, &user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {} not found", recipe_id)))
}

/// DELETE /recipes/:id
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = recipes::delete_by_id(&state.db, recipe_id, &user.id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
}
