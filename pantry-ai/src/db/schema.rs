//! Recipe table introspection
//!
//! Gives the reasoning layer the stored column layout so it can shape
//! insert arguments.

use pantry_common::db::RECIPE_TABLES;
use pantry_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

/// One column as reported by SQLite
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
    pub primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Column name to schema, in table order
pub type TableSchema = Vec<(String, ColumnSchema)>;

/// Columns of one table in declaration order
pub async fn table_schema(pool: &SqlitePool, table: &str) -> Result<TableSchema> {
    let rows = sqlx::query("SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let name: String = row.get("name");
            let column = ColumnSchema {
                type_name: row.get::<String, _>("type").to_lowercase(),
                nullable: row.get::<i64, _>("notnull") == 0,
                primary_key: row.get::<i64, _>("pk") != 0,
                default: row.get("dflt_value"),
            };
            (name, column)
        })
        .collect())
}

/// Schemas of every recipe table, as a JSON object keyed by table then column
pub async fn all_table_schemas(pool: &SqlitePool) -> Result<serde_json::Value> {
    let mut tables = BTreeMap::new();
    for table in RECIPE_TABLES {
        let columns: serde_json::Map<String, serde_json::Value> = table_schema(pool, table)
            .await?
            .into_iter()
            .map(|(name, column)| -> Result<(String, serde_json::Value)> {
                Ok((name, serde_json::to_value(column)?))
            })
            .collect::<Result<_>>()?;
        tables.insert(table.to_string(), serde_json::Value::Object(columns));
    }
    Ok(serde_json::to_value(tables)?)
}
