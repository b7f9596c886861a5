//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use campuschat_types::error::{AuthError, ConversationError, VerificationError};

use crate::http::cookie::cleared_cookie;
use crate::http::response::ApiResponse;

#[derive(Debug)]
pub enum AppError {
    Verification(VerificationError),
    Auth(AuthError),
    Conversation(ConversationError),
    /// Malformed request input caught in the HTTP layer.
    Validation(String),
    Internal(String),
}

impl From<VerificationError> for AppError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Session(auth) => AppError::Auth(auth),
            other => AppError::Verification(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

const UPSTREAM_MESSAGE: &str = "upstream service unavailable, please try again";
const INTERNAL_MESSAGE: &str = "internal server error";

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        use ConversationError as C;
        use VerificationError as V;

        match self {
            AppError::Verification(e) => match e {
                V::Validation(_) | V::InvalidEmail(_) | V::DomainNotAllowed(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                V::InvalidCode => (StatusCode::BAD_REQUEST, "INVALID_CODE", e.to_string()),
                V::AccountExists(_) => (StatusCode::CONFLICT, "ACCOUNT_EXISTS", e.to_string()),
                V::UnknownAccount(_) => (StatusCode::NOT_FOUND, "UNKNOWN_ACCOUNT", e.to_string()),
                V::NotFound | V::Expired => {
                    (StatusCode::NOT_FOUND, "CHALLENGE_NOT_FOUND", e.to_string())
                }
                V::Delivery(_) => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    UPSTREAM_MESSAGE.to_string(),
                ),
                V::Session(_) | V::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                ),
            },
            AppError::Auth(e) => match e {
                AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string())
                }
                AuthError::UnknownAccount(_) => {
                    (StatusCode::NOT_FOUND, "UNKNOWN_ACCOUNT", e.to_string())
                }
                AuthError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                ),
            },
            AppError::Conversation(e) => match e {
                C::Validation(_) | C::InvalidModel(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                C::NotFound => (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND", e.to_string()),
                C::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
                C::Upstream(_) => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    UPSTREAM_MESSAGE.to_string(),
                ),
                C::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                ),
            },
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            ),
        }
    }

    /// Unauthorized responses also drop the session cookie.
    fn clears_cookie(&self) -> bool {
        matches!(
            self,
            AppError::Auth(AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let request_id = Uuid::now_v7().to_string();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, code, error = ?self, "request failed");
        } else {
            tracing::debug!(request_id = %request_id, code, "request rejected");
        }

        let body = Json(ApiResponse::error(code, &message, request_id));
        if self.clears_cookie() {
            (status, [(SET_COOKIE, cleared_cookie())], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
