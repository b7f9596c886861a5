//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod account;
pub mod challenge;
pub mod conversation;
pub mod pool;
