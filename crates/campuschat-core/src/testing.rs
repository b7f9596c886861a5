//! In-memory collaborators shared by the service tests in this crate.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use campuschat_types::account::Account;
use campuschat_types::challenge::{SignupProfile, VerificationChallenge};
use campuschat_types::conversation::{Conversation, ConversationSummary, Turn};
use campuschat_types::error::{AuthError, NotifyError, RepositoryError};
use campuschat_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};
use campuschat_types::session::SessionClaims;

use crate::auth::code::CodeHasher;
use crate::auth::session::TokenCodec;
use crate::conversation::repository::ConversationRepository;
use crate::llm::provider::{LlmEventStream, LlmProvider};
use crate::notify::Notifier;
use crate::repository::account::AccountRepository;
use crate::repository::challenge::ChallengeRepository;

// --- Accounts ---

#[derive(Default)]
pub struct MemoryAccounts {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccounts {
    pub fn insert_verified(&self, email: &str, display_name: &str) -> Account {
        let account = Account {
            id: Uuid::now_v7(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            student_id: None,
            verified: true,
            session_ids: BTreeSet::new(),
            created_at: Utc::now(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), account.clone());
        account
    }

    pub fn get(&self, email: &str) -> Option<Account> {
        self.accounts.lock().unwrap().get(email).cloned()
    }

    pub fn remove(&self, email: &str) {
        self.accounts.lock().unwrap().remove(email);
    }
}

impl AccountRepository for MemoryAccounts {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send {
        let found = self.get(email);
        async move { Ok(found) }
    }

    fn find_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send {
        let found = self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.id == *id)
            .cloned();
        async move { Ok(found) }
    }

    fn upsert_verified(
        &self,
        email: &str,
        profile: Option<&SignupProfile>,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send {
        let mut accounts = self.accounts.lock().unwrap();
        let result = if let Some(account) = accounts.get_mut(email) {
            account.verified = true;
            Ok(account.clone())
        } else if let Some(profile) = profile {
            let account = Account {
                id: Uuid::now_v7(),
                email: email.to_string(),
                display_name: profile.display_name.clone(),
                student_id: Some(profile.student_id.clone()),
                verified: true,
                session_ids: BTreeSet::new(),
                created_at: Utc::now(),
            };
            accounts.insert(email.to_string(), account.clone());
            Ok(account)
        } else {
            Err(RepositoryError::NotFound)
        };
        drop(accounts);
        async move { result }
    }

    fn add_session_id(
        &self,
        email: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = match self.accounts.lock().unwrap().get_mut(email) {
            Some(account) => {
                account.session_ids.insert(session_id.to_string());
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        };
        async move { result }
    }

    fn remove_session_id(
        &self,
        email: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        let removed = self
            .accounts
            .lock()
            .unwrap()
            .get_mut(email)
            .is_some_and(|a| a.session_ids.remove(session_id));
        async move { Ok(removed) }
    }

    fn clear_session_ids(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        let removed = self
            .accounts
            .lock()
            .unwrap()
            .get_mut(email)
            .map(|a| std::mem::take(&mut a.session_ids).len() as u64)
            .unwrap_or(0);
        async move { Ok(removed) }
    }
}

// --- Challenges ---

#[derive(Clone, Default)]
pub struct MemoryChallenges {
    challenges: Arc<Mutex<HashMap<Uuid, VerificationChallenge>>>,
}

impl MemoryChallenges {
    pub fn contains(&self, id: &Uuid) -> bool {
        self.challenges.lock().unwrap().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.challenges.lock().unwrap().len()
    }
}

impl ChallengeRepository for MemoryChallenges {
    fn create(
        &self,
        challenge: &VerificationChallenge,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.challenges
            .lock()
            .unwrap()
            .insert(challenge.id, challenge.clone());
        async { Ok(()) }
    }

    fn get(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<VerificationChallenge>, RepositoryError>> + Send {
        let found = self.challenges.lock().unwrap().get(id).cloned();
        async move { Ok(found) }
    }

    fn delete(&self, id: &Uuid) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        let removed = self.challenges.lock().unwrap().remove(id).is_some();
        async move { Ok(removed) }
    }

    fn purge_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        let mut challenges = self.challenges.lock().unwrap();
        let before = challenges.len();
        challenges.retain(|_, c| !c.is_expired(now));
        let removed = (before - challenges.len()) as u64;
        drop(challenges);
        async move { Ok(removed) }
    }
}

// --- Conversations ---

#[derive(Clone, Default)]
pub struct MemoryConversations {
    conversations: Arc<Mutex<HashMap<Uuid, Conversation>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryConversations {
    pub fn all(&self) -> Vec<Conversation> {
        self.conversations.lock().unwrap().values().cloned().collect()
    }

    pub fn put(&self, conversation: Conversation) {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn write_error(&self) -> Option<RepositoryError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| RepositoryError::Query("disk full".to_string()))
    }
}

impl ConversationRepository for MemoryConversations {
    fn get(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Conversation>, RepositoryError>> + Send {
        let found = self.conversations.lock().unwrap().get(id).cloned();
        async move { Ok(found) }
    }

    fn insert(
        &self,
        conversation: &Conversation,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = match self.write_error() {
            Some(e) => Err(e),
            None => {
                self.put(conversation.clone());
                Ok(())
            }
        };
        async move { result }
    }

    fn replace_turns(
        &self,
        id: &Uuid,
        turns: &[Turn],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = match self.write_error() {
            Some(e) => Err(e),
            None => match self.conversations.lock().unwrap().get_mut(id) {
                Some(c) => {
                    c.turns = turns.to_vec();
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            },
        };
        async move { result }
    }

    fn list_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> impl Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send {
        let mut owned: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == *owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.id.cmp(&a.id));
        let summaries = owned.iter().map(Conversation::summary).collect();
        async move { Ok(summaries) }
    }

    fn newest_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> impl Future<Output = Result<Option<Conversation>, RepositoryError>> + Send {
        let newest = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == *owner_id)
            .max_by_key(|c| c.id)
            .cloned();
        async move { Ok(newest) }
    }

    fn delete(&self, id: &Uuid) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        let removed = self.conversations.lock().unwrap().remove(id).is_some();
        async move { Ok(removed) }
    }
}

// --- Notifier ---

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// The code from the most recent message (its last line).
    pub fn last_code(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, body)| body.lines().last().map(str::to_string))
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl Notifier for RecordingNotifier {
    fn send(
        &self,
        to: &str,
        _subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<String, NotifyError>> + Send {
        let result = if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(NotifyError::Transport("connection refused".to_string()))
        } else {
            let mut sent = self.sent.lock().unwrap();
            sent.push((to.to_string(), body.to_string()));
            Ok(format!("msg-{}", sent.len()))
        };
        async move { result }
    }
}

// --- Hashing and tokens ---

pub struct PlainHasher;

impl CodeHasher for PlainHasher {
    fn generate_salt(&self) -> String {
        "salt".to_string()
    }

    fn hash(&self, salt: &str, code: &str) -> String {
        format!("{salt}:{code}")
    }

    fn verify(&self, salt: &str, code: &str, expected_hash: &str) -> bool {
        self.hash(salt, code) == expected_hash
    }
}

/// Unsigned `fake.iss|sub|jti|iat|exp` tokens.
pub struct FakeCodec;

impl TokenCodec for FakeCodec {
    fn encode(&self, c: &SessionClaims) -> Result<String, AuthError> {
        Ok(format!("fake.{}|{}|{}|{}|{}", c.iss, c.sub, c.jti, c.iat, c.exp))
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let body = token.strip_prefix("fake.").ok_or(AuthError::InvalidToken)?;
        let parts: Vec<&str> = body.split('|').collect();
        let [iss, sub, jti, iat, exp] = parts.as_slice() else {
            return Err(AuthError::InvalidToken);
        };
        Ok(SessionClaims {
            iss: iss.to_string(),
            sub: sub.to_string(),
            jti: jti.to_string(),
            iat: iat.parse().map_err(|_| AuthError::InvalidToken)?,
            exp: exp.parse().map_err(|_| AuthError::InvalidToken)?,
        })
    }
}

// --- Generation backend ---

/// Scripted provider: fixed title reply, fixed stream of text chunks.
#[derive(Clone)]
pub struct ScriptedProvider {
    title: Result<String, String>,
    chunks: Vec<String>,
    fail_with: Option<String>,
    fail_open: bool,
    connected: bool,
    stall: bool,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new(title: &str, chunks: &[&str]) -> Self {
        Self {
            title: Ok(title.to_string()),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail_with: None,
            fail_open: false,
            connected: true,
            stall: false,
            requests: Arc::default(),
        }
    }

    pub fn failing_title(mut self, message: &str) -> Self {
        self.title = Err(message.to_string());
        self
    }

    /// Emit an error after the scripted chunks.
    pub fn failing_stream(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Reject the stream before any event, as a refused key would.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Start with the first text delta instead of a `Connected` event.
    pub fn without_connected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Never finish after the scripted chunks.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let model = request.model.clone();
        let title = self.title.clone();
        async move {
            match title {
                Ok(content) => Ok(CompletionResponse {
                    content,
                    model,
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Err(message) => Err(LlmError::Provider { message }),
            }
        }
    }

    fn stream(&self, request: CompletionRequest) -> LlmEventStream {
        self.requests.lock().unwrap().push(request);
        let chunks = self.chunks.clone();
        let fail_with = self.fail_with.clone();
        let stall = self.stall;
        let fail_open = self.fail_open;
        let connected = self.connected;
        Box::pin(async_stream::stream! {
            if fail_open {
                yield Err(LlmError::AuthenticationFailed);
                return;
            }
            if connected {
                yield Ok(StreamEvent::Connected);
            }
            for text in chunks {
                yield Ok(StreamEvent::TextDelta { text });
            }
            if let Some(message) = fail_with {
                yield Err(LlmError::Stream(message));
                return;
            }
            if stall {
                futures_util::future::pending::<()>().await;
            }
            yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
            yield Ok(StreamEvent::Done);
        })
    }
}
