//! Bearer token extractor

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use pantry_common::auth::{AuthError, UserIdentity};

use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AuthError::MissingToken)?;

        let identity = state.authenticator.authenticate(token).await?;
        Ok(AuthUser(identity))
    }
}
