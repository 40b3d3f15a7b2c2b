//! Nutritional preferences of the authenticated user

use axum::{extract::State, routing::get, Json, Router};
use pantry_common::models::NutritionPreferences;
use serde::Serialize;

use crate::api::AuthUser;
use crate::db::preferences;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SavedPreferences {
    pub message: String,
    pub data: NutritionPreferences,
}

/// GET /user/nutritional-preferences
///
/// Users who never saved preferences get empty lists.
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<NutritionPreferences>> {
    let stored = preferences::get_preferences(&state.db, &user.id).await?;
    Ok(Json(stored.unwrap_or_default()))
}

/// POST /user/nutritional-preferences
pub async fn save_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(data): Json<NutritionPreferences>,
) -> ApiResult<Json<SavedPreferences>> {
    preferences::set_preferences(&state.db, &user.id, &data).await?;
    Ok(Json(SavedPreferences {
        message: "Nutritional preferences saved".to_string(),
        data,
    }))
}

pub fn preference_routes() -> Router<AppState> {
    Router::new().route(
        "/user/nutritional-preferences",
        get(get_preferences).post(save_preferences),
    )
}
