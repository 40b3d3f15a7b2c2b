//! Supabase token validation

use async_trait::async_trait;
use pantry_common::auth::{AuthError, Authenticator, UserIdentity};
use pantry_common::config::AuthConfig;
use pantry_common::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// Resolves bearer tokens through the Supabase auth API (`GET /auth/v1/user`)
#[derive(Debug, Clone)]
pub struct SupabaseAuthenticator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseAuthenticator {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build from configuration; both URL and key are required
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match (config.supabase_url.as_deref(), config.supabase_key.as_deref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Ok(Self::new(url, key))
            }
            _ => Err(Error::Config(
                "Supabase auth not configured. Set SUPABASE_URL and SUPABASE_KEY".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Authenticator for SupabaseAuthenticator {
    async fn authenticate(&self, token: &str) -> std::result::Result<UserIdentity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken("User not found in Supabase".to_string()));
        }
        if !status.is_success() {
            return Err(AuthError::Unavailable(format!("auth service returned {}", status)));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        debug!(user_id = %user.id, "Authenticated user");
        Ok(UserIdentity {
            id: user.id,
            email: user.email,
        })
    }
}
