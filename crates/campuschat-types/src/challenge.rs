//! Email verification challenge types.
//!
//! A challenge binds a short numeric code to an email address. Only a salted
//! digest of the code is stored; the plaintext leaves the process once, through
//! the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// What redeeming the challenge does.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (purpose IN ('signup', 'login'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengePurpose {
    Signup,
    Login,
}

impl fmt::Display for ChallengePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengePurpose::Signup => write!(f, "signup"),
            ChallengePurpose::Login => write!(f, "login"),
        }
    }
}

impl FromStr for ChallengePurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signup" => Ok(ChallengePurpose::Signup),
            "login" => Ok(ChallengePurpose::Login),
            other => Err(format!("invalid challenge purpose: '{other}'")),
        }
    }
}

/// Profile fields collected at signup, applied when the account is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupProfile {
    pub display_name: String,
    pub student_id: String,
}

/// A pending, single-use verification challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationChallenge {
    pub id: Uuid,
    pub email: String,
    pub purpose: ChallengePurpose,
    /// Present for signup challenges only.
    pub profile: Option<SignupProfile>,
    /// Hex-encoded SHA-256 of `salt || code`.
    pub code_hash: String,
    pub code_salt: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationChallenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn status(&self) -> ChallengeStatus {
        ChallengeStatus {
            id: self.id,
            email: self.email.clone(),
            purpose: self.purpose,
            expires_at: self.expires_at,
        }
    }
}

/// Public view of a live challenge (never carries the code digest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeStatus {
    pub id: Uuid,
    pub email: String,
    pub purpose: ChallengePurpose,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn challenge(expires_in: Duration) -> VerificationChallenge {
        let now = Utc::now();
        VerificationChallenge {
            id: Uuid::now_v7(),
            email: "a@inst.edu".to_string(),
            purpose: ChallengePurpose::Login,
            profile: None,
            code_hash: "00".to_string(),
            code_salt: "11".to_string(),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_purpose_parse() {
        assert_eq!("signup".parse::<ChallengePurpose>().unwrap(), ChallengePurpose::Signup);
        assert_eq!("LOGIN".parse::<ChallengePurpose>().unwrap(), ChallengePurpose::Login);
        assert!("reset".parse::<ChallengePurpose>().is_err());
    }

    #[test]
    fn test_is_expired() {
        let live = challenge(Duration::minutes(10));
        assert!(!live.is_expired(Utc::now()));
        let stale = challenge(Duration::minutes(-1));
        assert!(stale.is_expired(Utc::now()));
    }

    #[test]
    fn test_status_hides_digest() {
        let c = challenge(Duration::minutes(10));
        let json = serde_json::to_string(&c.status()).unwrap();
        assert!(!json.contains("code_hash"));
        assert!(json.contains("\"purpose\":\"login\""));
    }
}
