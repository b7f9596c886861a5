//! Conversation, turn, and streaming-turn lifecycle types.
//!
//! A conversation belongs to exactly one account. Its history is an ordered
//! list of turns; the stored copy is replaced wholesale after each completed
//! turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Speaker of a turn, in the generation backend's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Model => write!(f, "model"),
        }
    }
}

/// One entry in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            parts: vec![text.into()],
        }
    }

    /// All parts joined into one string.
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

/// A stored conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub model: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            model: self.model.clone(),
            turn_count: self.turns.len(),
            created_at: self.created_at,
        }
    }
}

/// Listing view of a conversation, without its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Which conversation a turn targets. Parsed from `"new"` or a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationRef {
    #[default]
    New,
    Existing(Uuid),
}

impl FromStr for ConversationRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("new") {
            return Ok(ConversationRef::New);
        }
        Uuid::parse_str(s)
            .map(ConversationRef::Existing)
            .map_err(|_| format!("invalid conversation reference: '{s}'"))
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationRef::New => write!(f, "new"),
            ConversationRef::Existing(id) => write!(f, "{id}"),
        }
    }
}

/// Lifecycle of a single turn.
///
/// `Idle -> Authorizing -> {Rejected | Streaming}`, then
/// `Streaming -> {Persisted | PersistFailed | Aborted}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    Authorizing,
    Rejected,
    Streaming,
    Persisted,
    PersistFailed,
    Aborted,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnState::Rejected | TurnState::Persisted | TurnState::PersistFailed | TurnState::Aborted
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: TurnState) -> bool {
        use TurnState::*;
        matches!(
            (self, next),
            (Idle, Authorizing)
                | (Authorizing, Rejected)
                | (Authorizing, Streaming)
                | (Streaming, Persisted)
                | (Streaming, PersistFailed)
                | (Streaming, Aborted)
        )
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::Authorizing => "authorizing",
            TurnState::Rejected => "rejected",
            TurnState::Streaming => "streaming",
            TurnState::Persisted => "persisted",
            TurnState::PersistFailed => "persist_failed",
            TurnState::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// A piece of the caller-facing turn stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnChunk {
    /// Generated text, forwarded as soon as the backend yields it.
    Text(String),
    /// Mid-stream failure. Always the last chunk when present.
    Error(String),
}

/// How a turn ended once streaming started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Persisted {
        conversation_id: Uuid,
        created: bool,
    },
    PersistFailed {
        conversation_id: Uuid,
        error: String,
    },
    Aborted {
        conversation_id: Uuid,
        reason: String,
    },
}

impl TurnOutcome {
    pub fn state(&self) -> TurnState {
        match self {
            TurnOutcome::Persisted { .. } => TurnState::Persisted,
            TurnOutcome::PersistFailed { .. } => TurnState::PersistFailed,
            TurnOutcome::Aborted { .. } => TurnState::Aborted,
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        match self {
            TurnOutcome::Persisted { conversation_id, .. }
            | TurnOutcome::PersistFailed { conversation_id, .. }
            | TurnOutcome::Aborted { conversation_id, .. } => *conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_ref_parse() {
        assert_eq!("new".parse::<ConversationRef>().unwrap(), ConversationRef::New);
        assert_eq!("".parse::<ConversationRef>().unwrap(), ConversationRef::New);

        let id = Uuid::now_v7();
        assert_eq!(
            id.to_string().parse::<ConversationRef>().unwrap(),
            ConversationRef::Existing(id)
        );
        assert!("not-a-uuid".parse::<ConversationRef>().is_err());
    }

    #[test]
    fn test_turn_role_serde_matches_backend_vocabulary() {
        let json = serde_json::to_string(&Turn::model("hi")).unwrap();
        assert_eq!(json, r#"{"role":"model","parts":["hi"]}"#);
    }

    #[test]
    fn test_turn_state_transitions() {
        assert!(TurnState::Idle.can_transition_to(TurnState::Authorizing));
        assert!(TurnState::Authorizing.can_transition_to(TurnState::Rejected));
        assert!(TurnState::Streaming.can_transition_to(TurnState::Aborted));
        assert!(!TurnState::Rejected.can_transition_to(TurnState::Streaming));
        assert!(!TurnState::Idle.can_transition_to(TurnState::Persisted));
        assert!(TurnState::PersistFailed.is_terminal());
        assert!(!TurnState::Streaming.is_terminal());
    }

    #[test]
    fn test_outcome_state() {
        let id = Uuid::now_v7();
        let outcome = TurnOutcome::Persisted {
            conversation_id: id,
            created: true,
        };
        assert_eq!(outcome.state(), TurnState::Persisted);
        assert_eq!(outcome.conversation_id(), id);
    }

    #[test]
    fn test_turn_text_joins_parts() {
        let turn = Turn {
            role: TurnRole::Model,
            parts: vec!["Hel".to_string(), "lo".to_string()],
        };
        assert_eq!(turn.text(), "Hello");
    }
}
