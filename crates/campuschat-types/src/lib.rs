//! Shared domain types for campuschat.
//!
//! Accounts, verification challenges, session claims, conversations, LLM
//! request shapes, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod challenge;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod session;
