//! Tests for database initialization
//!
//! Covers first-run creation, reopening an existing file and the relational
//! guarantees the recipe tables rely on: foreign keys, cascade, and at most
//! one image and one step list per recipe.

use pantry_common::db::{init_database, init_memory_database, RECIPE_TABLES};
use sqlx::Row;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("pantry.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());

    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pantry.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO recipes (user_id, title, created_at, source_type, source_data)
         VALUES ('u1', 'Soup', '2025-01-01T00:00:00Z', 'text', 'leeks')",
    )
    .execute(&pool1)
    .await
    .unwrap();
    pool1.close().await;

    // Second open must keep existing rows
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_all_tables_created() {
    let pool = init_memory_database().await.unwrap();

    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(&pool)
        .await
        .unwrap();
    let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

    for table in RECIPE_TABLES.iter().chain(["user_preferences"].iter()) {
        assert!(names.iter().any(|n| n == table), "missing table {}", table);
    }
}

#[tokio::test]
async fn test_child_rows_require_existing_recipe() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit) VALUES (999, 'salt', '1', 'g')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "foreign key should reject orphan ingredient");
}

#[tokio::test]
async fn test_recipe_image_is_unique_per_recipe() {
    let pool = init_memory_database().await.unwrap();

    let recipe_id = sqlx::query(
        "INSERT INTO recipes (user_id, title, created_at, source_type, source_data)
         VALUES ('u1', 'Pie', '2025-01-01T00:00:00Z', 'text', 'apples')",
    )
    .execute(&pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query("INSERT INTO recipe_images (recipe_id, image_url) VALUES (?, 'https://a')")
        .bind(recipe_id)
        .execute(&pool)
        .await
        .unwrap();

    let second = sqlx::query("INSERT INTO recipe_images (recipe_id, image_url) VALUES (?, 'https://b')")
        .bind(recipe_id)
        .execute(&pool)
        .await;
    assert!(second.is_err());
}

#[tokio::test]
async fn test_recipe_steps_single_list_per_recipe() {
    let pool = init_memory_database().await.unwrap();

    let recipe_id = sqlx::query(
        "INSERT INTO recipes (user_id, title, created_at, source_type, source_data)
         VALUES ('u1', 'Bread', '2025-01-01T00:00:00Z', 'text', 'flour')",
    )
    .execute(&pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query("INSERT INTO recipe_steps (recipe_id, instructions) VALUES (?, '[]')")
        .bind(recipe_id)
        .execute(&pool)
        .await
        .unwrap();

    let second = sqlx::query("INSERT INTO recipe_steps (recipe_id, instructions) VALUES (?, '[]')")
        .bind(recipe_id)
        .execute(&pool)
        .await;
    assert!(second.is_err());
}

#[tokio::test]
async fn test_recipe_delete_cascades() {
    let pool = init_memory_database().await.unwrap();

    let recipe_id = sqlx::query(
        "INSERT INTO recipes (user_id, title, created_at, source_type, source_data)
         VALUES ('u1', 'Stew', '2025-01-01T00:00:00Z', 'text', 'beef')",
    )
    .execute(&pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query("INSERT INTO recipe_steps (recipe_id, instructions) VALUES (?, '[]')")
        .bind(recipe_id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&pool)
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_steps")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let pool = init_memory_database().await.unwrap();
    assert!(pantry_common::db::create_schema(&pool).await.is_ok());
}
