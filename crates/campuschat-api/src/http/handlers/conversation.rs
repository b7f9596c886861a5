//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/conversations         - Summaries, newest first
//! - GET    /api/conversations/newest  - The most recent conversation
//! - GET    /api/conversations/{id}    - One conversation with its turns
//! - DELETE /api/conversations/{id}    - Delete an owned conversation

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use campuschat_types::conversation::{Conversation, ConversationSummary};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::session::CurrentSession;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: Uuid,
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let summaries = state.conversations.list_conversations(&identity).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(summaries, request_id, elapsed).with_link("self", "/api/conversations"),
    ))
}

/// GET /api/conversations/newest
pub async fn newest_conversation(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversation = state.conversations.newest_conversation(&identity).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/conversations/{}", conversation.id);
    Ok(Json(
        ApiResponse::success(conversation, request_id, elapsed).with_link("self", &link),
    ))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let id = parse_uuid(&id)?;

    let conversation = state.conversations.get_conversation(&identity, &id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

/// DELETE /api/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let id = parse_uuid(&id)?;

    state.conversations.delete_conversation(&identity, &id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(Deleted { deleted: id }, request_id, elapsed)))
}
