use super::{Tool, ToolContext, ToolError};
use crate::db::schema::all_table_schemas;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// `get_all_table_schemas`: column layout of the recipe tables
pub struct TableSchemasTool {
    db: SqlitePool,
}

impl TableSchemasTool {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for TableSchemasTool {
    fn name(&self) -> &'static str {
        "get_all_table_schemas"
    }

    fn description(&self) -> &'static str {
        "Get the schema of all tables in the database"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _ctx: &ToolContext, _args: Value) -> Result<Value, ToolError> {
        Ok(all_table_schemas(&self.db).await?)
    }
}
