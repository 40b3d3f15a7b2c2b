//! # Pantry Common Library
//!
//! Shared code for the Pantry recipe services including:
//! - Error types
//! - Bootstrap configuration (TOML + environment)
//! - Database initialization and the recipe data model
//! - The authentication capability consumed by HTTP handlers

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
