//! Session authentication extractor.
//!
//! Resolves the signed-in user once at the boundary. The session token is
//! read from `Authorization: Bearer <jwt>` or, failing that, from the auth
//! platform's session cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use shared::jwt::{extract_user_id, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user from the session token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Pulls the raw session token out of the request headers.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;
        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            });
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let token = session_token(&parts.headers, &state.config.auth.session_cookie)?;

        let claims = state.session_keys.validate(&token).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            match e {
                JwtError::TokenExpired => ApiError::Unauthorized("Session expired".to_string()),
                _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
            }
        })?;

        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let auth = UserAuth {
            user_id,
            email: claims.email,
        };
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}
