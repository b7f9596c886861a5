//! Session extractor.
//!
//! Reads the session token from the `token` cookie, falling back to an
//! `Authorization: Bearer <token>` header, and resolves it through the
//! session manager on every request.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use campuschat_types::account::Identity;
use campuschat_types::error::AuthError;

use crate::http::cookie::{SESSION_COOKIE, read_cookie};
use crate::http::error::AppError;
use crate::state::AppState;

/// The identity behind a valid, unrevoked session.
pub struct CurrentSession(pub Identity);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AuthError::MissingToken)?;
        let identity = state.sessions.validate_token(&token).await?;
        Ok(CurrentSession(identity))
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    read_cookie(&parts.headers, SESSION_COOKIE).or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}
