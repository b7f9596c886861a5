//! Business logic and repository trait definitions for campuschat.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements, plus the three services built on
//! them: the verification engine, the session manager, and the conversation
//! pipeline. It depends only on `campuschat-types` -- never on
//! `campuschat-infra` or any database/IO crate.

pub mod auth;
pub mod conversation;
pub mod llm;
pub mod notify;
pub mod repository;

#[cfg(test)]
mod testing;
