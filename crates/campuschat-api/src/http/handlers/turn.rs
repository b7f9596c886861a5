//! Streaming turn endpoint.
//!
//! POST /api/ask
//!
//! Streams the model's answer as a chunked `text/plain` body, flushed per
//! chunk. The conversation id is returned in `X-Conversation-Id` before the
//! first byte. A backend failure mid-stream appends `\n[error] <message>`
//! and closes the body. Persistence completes on its own task; its outcome
//! is only logged.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderName, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::Instrument;

use campuschat_core::conversation::pipeline::TurnRequest;
use campuschat_observe::genai_attrs::{CAMPUSCHAT_TURN_OUTCOME, OP_CHAT, PROVIDER_GEMINI};
use campuschat_types::conversation::{ConversationRef, TurnChunk};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::session::CurrentSession;
use crate::state::AppState;

pub const CONVERSATION_ID_HEADER: HeaderName = HeaderName::from_static("x-conversation-id");

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub model: Option<String>,
    /// An existing conversation id, or `"new"` (the default).
    #[serde(default)]
    pub conversation: Option<String>,
}

/// Wire form of a chunk.
fn render_chunk(chunk: TurnChunk) -> String {
    match chunk {
        TurnChunk::Text(text) => text,
        TurnChunk::Error(message) => format!("\n[error] {message}"),
    }
}

/// POST /api/ask
pub async fn ask(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    ApiJson(body): ApiJson<AskRequest>,
) -> Result<Response, AppError> {
    let conversation: ConversationRef = body
        .conversation
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::Validation)?;

    let turn = state
        .conversations
        .run_turn(
            &identity,
            TurnRequest {
                conversation,
                question: body.question,
                model: body.model,
            },
        )
        .await?;

    let span = tracing::info_span!(
        "chat",
        gen_ai.operation.name = OP_CHAT,
        gen_ai.provider.name = PROVIDER_GEMINI,
        gen_ai.request.model = %turn.model,
        gen_ai.conversation.id = %turn.conversation_id,
        campuschat.turn.outcome = tracing::field::Empty,
    );

    let outcome = turn.outcome;
    let outcome_span = span.clone();
    tokio::spawn(
        async move {
            match outcome.await {
                Ok(outcome) => {
                    outcome_span.record(
                        CAMPUSCHAT_TURN_OUTCOME,
                        tracing::field::display(outcome.state()),
                    );
                    tracing::info!(outcome = %outcome.state(), "turn finished");
                }
                Err(_) => tracing::warn!("turn outcome dropped without a result"),
            }
        }
        .instrument(span),
    );

    let stream = turn
        .chunks
        .map(|chunk| Ok::<String, Infallible>(render_chunk(chunk)));

    let conversation_id = HeaderValue::from_str(&turn.conversation_id.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (CONVERSATION_ID_HEADER, conversation_id),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chunk_is_inline_marker() {
        assert_eq!(render_chunk(TurnChunk::Text("hi".into())), "hi");
        assert_eq!(
            render_chunk(TurnChunk::Error("backend down".into())),
            "\n[error] backend down"
        );
    }
}
