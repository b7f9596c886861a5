//! SQLite conversation repository implementation.
//!
//! The turn history is a JSON array in the `turns` column and is rewritten as
//! a whole after each completed turn.

use campuschat_core::conversation::repository::ConversationRepository;
use campuschat_types::conversation::{Conversation, ConversationSummary, Turn};
use campuschat_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ConversationRow {
    id: String,
    owner_id: String,
    title: String,
    model: String,
    turns: String,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            model: row.try_get("model")?,
            turns: row.try_get("turns")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| RepositoryError::Query(format!("invalid owner_id: {e}")))?;
        let turns: Vec<Turn> = serde_json::from_str(&self.turns)
            .map_err(|e| RepositoryError::Query(format!("invalid turns JSON: {e}")))?;

        Ok(Conversation {
            id,
            owner_id,
            title: self.title,
            model: self.model,
            turns,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn encode_turns(turns: &[Turn]) -> Result<String, RepositoryError> {
    serde_json::to_string(turns)
        .map_err(|e| RepositoryError::Query(format!("failed to encode turns: {e}")))
}

impl ConversationRepository for SqliteConversationRepository {
    async fn get(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, owner_id, title, model, turns, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.owner_id.to_string())
        .bind(&conversation.title)
        .bind(&conversation.model)
        .bind(encode_turns(&conversation.turns)?)
        .bind(format_datetime(&conversation.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn replace_turns(&self, id: &Uuid, turns: &[Turn]) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET turns = ? WHERE id = ?")
            .bind(encode_turns(turns)?)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        // v7 ids sort by creation time.
        let rows = sqlx::query(
            r#"SELECT id, title, model, json_array_length(turns) AS turn_count, created_at
               FROM conversations WHERE owner_id = ? ORDER BY id DESC"#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(query_error)?;
            let turn_count: i64 = row.try_get("turn_count").map_err(query_error)?;
            let created_at: String = row.try_get("created_at").map_err(query_error)?;
            summaries.push(ConversationSummary {
                id: Uuid::parse_str(&id)
                    .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
                title: row.try_get("title").map_err(query_error)?,
                model: row.try_get("model").map_err(query_error)?,
                turn_count: turn_count as usize,
                created_at: parse_datetime(&created_at)?,
            });
        }

        Ok(summaries)
    }

    async fn newest_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE owner_id = ? ORDER BY id DESC LIMIT 1")
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_error)?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
