//! Passwordless authentication handlers.
//!
//! Endpoints:
//! - POST /auth/signup        - Start a signup, mails a code
//! - POST /auth/login         - Start a login, mails a code
//! - GET  /auth/verify/{id}   - Whether a challenge is still live
//! - POST /auth/verify/{id}   - Redeem a code; sets the session cookie, 303 to `/`
//! - POST /auth/logout        - Revoke the current session
//! - POST /auth/logout-all    - Revoke every session of the account
//! - GET  /api/me             - The identity behind the current session

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campuschat_types::account::Identity;
use campuschat_types::challenge::ChallengeStatus;

use super::parse_uuid;
use crate::http::cookie::{cleared_cookie, session_cookie};
use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::session::CurrentSession;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub display_name: String,
    pub student_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeIssued {
    pub challenge_id: Uuid,
    /// Where the code should be submitted.
    pub verify: String,
}

#[derive(Debug, Serialize)]
pub struct Revoked {
    pub revoked: u64,
}

fn issued(challenge_id: Uuid, start: Instant) -> (StatusCode, Json<ApiResponse<ChallengeIssued>>) {
    let verify = format!("/auth/verify/{challenge_id}");
    let resp = ApiResponse::success(
        ChallengeIssued {
            challenge_id,
            verify: verify.clone(),
        },
        Uuid::now_v7().to_string(),
        start.elapsed().as_millis() as u64,
    )
    .with_link("verify", &verify);
    (StatusCode::ACCEPTED, Json(resp))
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    let challenge_id = state
        .verification
        .issue_signup_challenge(&body.email, &body.display_name, &body.student_id)
        .await?;
    Ok(issued(challenge_id, start))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    let challenge_id = state.verification.issue_login_challenge(&body.email).await?;
    Ok(issued(challenge_id, start))
}

/// GET /auth/verify/{id}
pub async fn challenge_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ChallengeStatus>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let status = state.verification.challenge_status(&id).await?;
    Ok(Json(ApiResponse::success(
        status,
        Uuid::now_v7().to_string(),
        start.elapsed().as_millis() as u64,
    )))
}

/// POST /auth/verify/{id}
pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<VerifyRequest>,
) -> Result<Response, AppError> {
    let id = parse_uuid(&id)?;
    let session = state.verification.redeem_challenge(&id, &body.code).await?;

    Ok((
        StatusCode::SEE_OTHER,
        [
            (LOCATION, "/".to_string()),
            (SET_COOKIE, session_cookie(&session.token, &state.cookies)),
        ],
    )
        .into_response())
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Response, AppError> {
    let start = Instant::now();
    let removed = state.sessions.revoke_session(&identity).await?;
    let resp = ApiResponse::success(
        Revoked {
            revoked: u64::from(removed),
        },
        Uuid::now_v7().to_string(),
        start.elapsed().as_millis() as u64,
    );
    Ok(([(SET_COOKIE, cleared_cookie())], Json(resp)).into_response())
}

/// POST /auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Response, AppError> {
    let start = Instant::now();
    let revoked = state.sessions.revoke_all_sessions(&identity.email).await?;
    let resp = ApiResponse::success(
        Revoked { revoked },
        Uuid::now_v7().to_string(),
        start.elapsed().as_millis() as u64,
    );
    Ok(([(SET_COOKIE, cleared_cookie())], Json(resp)).into_response())
}

/// GET /api/me
pub async fn me(CurrentSession(identity): CurrentSession) -> Json<ApiResponse<Identity>> {
    Json(
        ApiResponse::success(identity, Uuid::now_v7().to_string(), 0)
            .with_link("conversations", "/api/conversations"),
    )
}
