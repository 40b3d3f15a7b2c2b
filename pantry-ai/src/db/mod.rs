//! Database access for pantry-ai
//!
//! Free functions over the shared [`sqlx::SqlitePool`] created at startup by
//! [`pantry_common::db::init_database`].

pub mod preferences;
pub mod recipes;
pub mod schema;
