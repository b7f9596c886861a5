//! Streaming turn execution with deferred persistence.
//!
//! `run_turn` authorizes the turn, derives a title for new conversations,
//! and opens the backend stream. It returns a [`TurnStream`] with two parts:
//!
//! - `chunks`: text forwarded as soon as the backend yields it, ending with
//!   at most one [`TurnChunk::Error`].
//! - `outcome`: a one-shot signal resolved once the turn is persisted, fails
//!   to persist, or is aborted.
//!
//! Persistence runs on a spawned task after the backend drains, so a slow
//! write never holds up the caller. If the caller drops `chunks` early the
//! backend request is dropped with it and the turn ends `Aborted`.

use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures_util::{Stream, StreamExt};
use tokio::sync::oneshot;
use uuid::Uuid;

use campuschat_types::account::Identity;
use campuschat_types::conversation::{
    Conversation, ConversationRef, ConversationSummary, Turn, TurnChunk, TurnOutcome,
};
use campuschat_types::error::ConversationError;
use campuschat_types::llm::{CompletionRequest, Message, StreamEvent};

use crate::conversation::repository::ConversationRepository;
use crate::conversation::title::{fallback_title, generate_title};
use crate::llm::box_provider::BoxLlmProvider;

/// Text of the inline marker sent when the backend fails mid-stream.
pub const STREAM_FAILURE_MESSAGE: &str = "generation failed before the answer was complete";

pub type TurnChunkStream = Pin<Box<dyn Stream<Item = TurnChunk> + Send + 'static>>;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub allowed_models: Vec<String>,
    pub default_model: String,
    pub title_model: String,
    pub timezone: Tz,
    pub max_output_tokens: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            allowed_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-8b".to_string(),
                "gemini-2.0-flash-exp".to_string(),
            ],
            default_model: "gemini-1.5-flash".to_string(),
            title_model: "gemini-1.5-flash-8b".to_string(),
            timezone: Tz::UTC,
            max_output_tokens: 8192,
        }
    }
}

/// Input to a single turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation: ConversationRef,
    pub question: String,
    /// Ignored for existing conversations, which keep their stored model.
    pub model: Option<String>,
}

/// A turn that passed authorization and is now streaming.
pub struct TurnStream {
    pub conversation_id: Uuid,
    pub created: bool,
    pub title: String,
    pub model: String,
    pub chunks: TurnChunkStream,
    pub outcome: oneshot::Receiver<TurnOutcome>,
}

pub struct ConversationPipeline<C: ConversationRepository> {
    conversations: Arc<C>,
    provider: Arc<BoxLlmProvider>,
    settings: PipelineSettings,
}

impl<C: ConversationRepository + 'static> ConversationPipeline<C> {
    pub fn new(conversations: Arc<C>, provider: Arc<BoxLlmProvider>, settings: PipelineSettings) -> Self {
        Self {
            conversations,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Execute one turn for `identity`.
    ///
    /// Errors returned here mean the turn was rejected before any output.
    #[tracing::instrument(
        name = "run_turn",
        skip(self, identity, request),
        fields(account_id = %identity.account_id, conversation = %request.conversation)
    )]
    pub async fn run_turn(
        &self,
        identity: &Identity,
        request: TurnRequest,
    ) -> Result<TurnStream, ConversationError> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(ConversationError::Validation(
                "question must not be empty".to_string(),
            ));
        }

        let (existing, model) = match request.conversation {
            ConversationRef::Existing(id) => {
                let conversation = self.load_owned(identity, &id).await?;
                let model = conversation.model.clone();
                (Some(conversation), model)
            }
            ConversationRef::New => {
                let model = request
                    .model
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| self.settings.default_model.clone());
                (None, model)
            }
        };

        if !self.settings.allowed_models.contains(&model) {
            return Err(ConversationError::InvalidModel(model));
        }

        let pending = match existing {
            Some(conversation) => PendingTurn {
                conversation_id: conversation.id,
                owner_id: conversation.owner_id,
                title: conversation.title,
                model: model.clone(),
                prior_turns: conversation.turns,
                question,
                created: false,
            },
            None => {
                let mut title =
                    generate_title(&self.provider, &question, &self.settings.title_model).await?;
                if title.is_empty() {
                    title = fallback_title(&question);
                }
                PendingTurn {
                    conversation_id: Uuid::now_v7(),
                    owner_id: identity.account_id,
                    title,
                    model: model.clone(),
                    prior_turns: Vec::new(),
                    question,
                    created: true,
                }
            }
        };

        let mut messages: Vec<Message> = pending.prior_turns.iter().map(Message::from).collect();
        messages.push(Message::user(pending.question.clone()));

        let mut backend = self.provider.stream(CompletionRequest {
            model: model.clone(),
            messages,
            system: Some(system_instruction(Utc::now(), self.settings.timezone)),
            max_tokens: self.settings.max_output_tokens,
            temperature: None,
            stream: true,
        });

        // Failures before the first event still reach the caller as an error status.
        let first = match backend.next().await {
            Some(Ok(event)) => Some(Ok(event)),
            Some(Err(e)) => {
                tracing::warn!(
                    conversation_id = %pending.conversation_id,
                    error = %e,
                    "backend stream failed to open"
                );
                return Err(ConversationError::Upstream(e));
            }
            None => None,
        };
        let backend = futures_util::stream::iter(first).chain(backend);

        tracing::info!(
            conversation_id = %pending.conversation_id,
            created = pending.created,
            model = %model,
            "turn streaming"
        );

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let conversation_id = pending.conversation_id;
        let created = pending.created;
        let title = pending.title.clone();
        let conversations = Arc::clone(&self.conversations);

        let chunks = async_stream::stream! {
            let mut backend = backend;
            let mut guard = OutcomeGuard::new(outcome_tx, conversation_id);
            let mut answer = String::new();

            loop {
                match backend.next().await {
                    Some(Ok(StreamEvent::TextDelta { text })) => {
                        if text.is_empty() {
                            continue;
                        }
                        answer.push_str(&text);
                        yield TurnChunk::Text(text);
                    }
                    Some(Ok(StreamEvent::Done)) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conversation_id = %conversation_id, error = %e, "backend stream failed");
                        guard.abort(e.to_string());
                        yield TurnChunk::Error(STREAM_FAILURE_MESSAGE.to_string());
                        return;
                    }
                }
            }

            drop(backend);
            if let Some(tx) = guard.disarm() {
                tokio::spawn(commit(conversations, pending, answer, tx));
            }
        };

        Ok(TurnStream {
            conversation_id,
            created,
            title,
            model,
            chunks: Box::pin(chunks),
            outcome: outcome_rx,
        })
    }

    pub async fn get_conversation(
        &self,
        identity: &Identity,
        id: &Uuid,
    ) -> Result<Conversation, ConversationError> {
        self.load_owned(identity, id).await
    }

    pub async fn list_conversations(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ConversationSummary>, ConversationError> {
        Ok(self.conversations.list_for_owner(&identity.account_id).await?)
    }

    pub async fn newest_conversation(
        &self,
        identity: &Identity,
    ) -> Result<Conversation, ConversationError> {
        self.conversations
            .newest_for_owner(&identity.account_id)
            .await?
            .ok_or(ConversationError::NotFound)
    }

    pub async fn delete_conversation(
        &self,
        identity: &Identity,
        id: &Uuid,
    ) -> Result<(), ConversationError> {
        self.load_owned(identity, id).await?;
        if !self.conversations.delete(id).await? {
            return Err(ConversationError::NotFound);
        }
        tracing::info!(conversation_id = %id, account_id = %identity.account_id, "conversation deleted");
        Ok(())
    }

    async fn load_owned(
        &self,
        identity: &Identity,
        id: &Uuid,
    ) -> Result<Conversation, ConversationError> {
        let conversation = self
            .conversations
            .get(id)
            .await?
            .ok_or(ConversationError::NotFound)?;
        if conversation.owner_id != identity.account_id {
            tracing::warn!(conversation_id = %id, account_id = %identity.account_id, "conversation owned by another account");
            return Err(ConversationError::Forbidden);
        }
        Ok(conversation)
    }
}

/// System instruction stating the current local time and date.
pub fn system_instruction(now: DateTime<Utc>, timezone: Tz) -> String {
    let local = now.with_timezone(&timezone);
    format!(
        "The current time is {} on {}.",
        local.format("%-I:%M%p"),
        local.format("%Y-%m-%d")
    )
}

/// Everything needed to persist the turn once the backend drains.
struct PendingTurn {
    conversation_id: Uuid,
    owner_id: Uuid,
    title: String,
    model: String,
    prior_turns: Vec<Turn>,
    question: String,
    created: bool,
}

/// Resolves the outcome as `Aborted` if the stream ends without handing the
/// sender to the persistence task (caller disconnect or backend error).
struct OutcomeGuard {
    tx: Option<oneshot::Sender<TurnOutcome>>,
    conversation_id: Uuid,
}

impl OutcomeGuard {
    fn new(tx: oneshot::Sender<TurnOutcome>, conversation_id: Uuid) -> Self {
        Self {
            tx: Some(tx),
            conversation_id,
        }
    }

    fn abort(&mut self, reason: String) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(TurnOutcome::Aborted {
                conversation_id: self.conversation_id,
                reason,
            });
        }
    }

    fn disarm(&mut self) -> Option<oneshot::Sender<TurnOutcome>> {
        self.tx.take()
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::info!(conversation_id = %self.conversation_id, "turn abandoned by caller");
            self.abort("caller disconnected".to_string());
        }
    }
}

async fn commit<C: ConversationRepository>(
    conversations: Arc<C>,
    pending: PendingTurn,
    answer: String,
    tx: oneshot::Sender<TurnOutcome>,
) {
    let PendingTurn {
        conversation_id,
        owner_id,
        title,
        model,
        mut prior_turns,
        question,
        created,
    } = pending;
    prior_turns.push(Turn::user(question));
    prior_turns.push(Turn::model(answer));

    let result = if created {
        conversations
            .insert(&Conversation {
                id: conversation_id,
                owner_id,
                title,
                model,
                turns: prior_turns,
                created_at: Utc::now(),
            })
            .await
    } else {
        conversations.replace_turns(&conversation_id, &prior_turns).await
    };

    let outcome = match result {
        Ok(()) => {
            tracing::info!(conversation_id = %conversation_id, created, "turn persisted");
            TurnOutcome::Persisted {
                conversation_id,
                created,
            }
        }
        Err(e) => {
            tracing::error!(conversation_id = %conversation_id, error = %e, "failed to persist turn");
            TurnOutcome::PersistFailed {
                conversation_id,
                error: e.to_string(),
            }
        }
    };
    let _ = tx.send(outcome);
}
