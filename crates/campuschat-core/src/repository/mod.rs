//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (campuschat-infra) implements. The core crate never depends on any
//! specific storage technology. The conversation store lives next to the
//! pipeline in `crate::conversation::repository`.

pub mod account;
pub mod challenge;
