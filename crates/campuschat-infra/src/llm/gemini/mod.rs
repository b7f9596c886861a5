//! Google Gemini generation backend.
//!
//! [`GeminiProvider`] implements the
//! [`LlmProvider`](campuschat_core::llm::provider::LlmProvider) trait over
//! the `generateContent` and `streamGenerateContent` endpoints.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::GeminiProvider;
