//! Infrastructure layer for campuschat.
//!
//! Implements the traits defined in `campuschat-core`: SQLite storage,
//! HS256 session tokens, code hashing, mail delivery, and the Gemini
//! generation backend.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod notify;
pub mod sqlite;
