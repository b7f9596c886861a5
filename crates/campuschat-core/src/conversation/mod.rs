//! Conversation pipeline: streaming turns with deferred persistence.

pub mod pipeline;
pub mod repository;
pub mod title;
