//! HTTP layer for campuschat.
//!
//! Axum routes for passwordless auth, streaming turns, and conversation
//! management, with a cookie-based session extractor and envelope
//! responses.

pub mod cookie;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
