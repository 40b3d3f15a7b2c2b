//! HTTP API handlers for pantry-ai

pub mod ai;
pub mod auth;
pub mod health;
pub mod preferences;
pub mod recipes;

pub use ai::ai_routes;
pub use auth::AuthUser;
pub use health::health_routes;
pub use preferences::preference_routes;
pub use recipes::recipe_routes;
