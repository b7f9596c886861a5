//! Session token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of the `iss` claim on every session token.
pub const SESSION_ISSUER: &str = "campuschat";

/// Claims carried inside a signed session token.
///
/// `sub` is the account email and `jti` the session id that must still be
/// present in the account's allow-list for the token to be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly minted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}
