//! JSON body extractor whose rejections use the error envelope.

use axum::extract::FromRequest;

use crate::http::error::AppError;

/// `axum::Json` with malformed or mistyped bodies mapped to 400 `VALIDATION_ERROR`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
