//! Account and resolved identity types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, keyed by email.
///
/// `session_ids` is the allow-list of currently valid session identifiers.
/// A signed token is only honoured while its session id is a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub student_id: Option<String>,
    pub verified: bool,
    #[serde(default)]
    pub session_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Whether `session_id` is currently in the allow-list.
    pub fn has_session(&self, session_id: &str) -> bool {
        self.session_ids.contains(session_id)
    }
}

/// The caller behind a validated session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}
