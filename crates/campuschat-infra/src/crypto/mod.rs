//! Cryptographic operations for campuschat.
//!
//! - `jwt`: HS256 session token signing
//! - `otp`: salted SHA-256 digests for verification codes

pub mod jwt;
pub mod otp;
