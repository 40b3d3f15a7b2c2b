//! Nutritional preferences keyed by user id

use chrono::Utc;
use pantry_common::models::NutritionPreferences;
use pantry_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Stored preferences, `None` if the user never saved any
pub async fn get_preferences(pool: &SqlitePool, user_id: &str) -> Result<Option<NutritionPreferences>> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT preferences FROM user_preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(stored.map(|json| serde_json::from_str(&json)).transpose()?)
}

/// Insert or replace the user's preferences
pub async fn set_preferences(pool: &SqlitePool, user_id: &str, preferences: &NutritionPreferences) -> Result<()> {
    let json = serde_json::to_string(preferences)?;

    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, preferences, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            preferences = excluded.preferences,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    debug!(user_id, "Saved nutritional preferences");
    Ok(())
}
