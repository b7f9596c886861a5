//! Passwordless authentication: verification challenges and sessions.

pub mod code;
pub mod email;
pub mod session;
pub mod verification;
