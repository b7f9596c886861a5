//! Conversation repository trait definition.

use campuschat_types::conversation::{Conversation, ConversationSummary, Turn};
use campuschat_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation persistence.
///
/// Implementations live in campuschat-infra (e.g., SqliteConversationRepository).
pub trait ConversationRepository: Send + Sync {
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Insert a new conversation with its full history.
    fn insert(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the stored history. Nothing else about the row changes.
    fn replace_turns(
        &self,
        id: &Uuid,
        turns: &[Turn],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Summaries of the owner's conversations, newest first.
    fn list_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send;

    fn newest_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Returns whether a row was removed.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
