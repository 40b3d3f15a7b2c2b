//! Authentication capability
//!
//! Token issuance lives outside Pantry. Services only need to turn a bearer
//! token into a [`UserIdentity`], so the capability is a single trait method.
//!
//! This module contains no HTTP framework dependencies; extractors live in the
//! service crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id (owner key for recipes and preferences)
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token supplied
    #[error("Missing bearer token")]
    MissingToken,

    /// Token rejected by the identity provider
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    /// Identity provider could not be reached
    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

/// Resolve a bearer token to a user identity
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// Fixed token table
///
/// Used for local development and tests where no identity provider runs.
#[derive(Debug, Default, Clone)]
pub struct StaticAuthenticator {
    tokens: HashMap<String, UserIdentity>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user id
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            UserIdentity {
                id: user_id.to_string(),
                email: None,
            },
        );
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_authenticator() {
        let auth = StaticAuthenticator::new().with_user("token-a", "user-a");

        let identity = auth.authenticate("token-a").await.unwrap();
        assert_eq!(identity.id, "user-a");

        assert!(matches!(
            auth.authenticate("token-b").await,
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(auth.authenticate("").await, Err(AuthError::MissingToken)));
    }
}
