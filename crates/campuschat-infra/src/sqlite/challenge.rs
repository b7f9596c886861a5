//! SQLite verification challenge repository implementation.

use campuschat_core::repository::challenge::ChallengeRepository;
use campuschat_types::challenge::{ChallengePurpose, SignupProfile, VerificationChallenge};
use campuschat_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ChallengeRepository`.
pub struct SqliteChallengeRepository {
    pool: DatabasePool,
}

impl SqliteChallengeRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChallengeRow {
    id: String,
    email: String,
    purpose: String,
    display_name: Option<String>,
    student_id: Option<String>,
    code_hash: String,
    code_salt: String,
    created_at: String,
    expires_at: String,
}

impl ChallengeRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            purpose: row.try_get("purpose")?,
            display_name: row.try_get("display_name")?,
            student_id: row.try_get("student_id")?,
            code_hash: row.try_get("code_hash")?,
            code_salt: row.try_get("code_salt")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn into_challenge(self) -> Result<VerificationChallenge, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid challenge id: {e}")))?;
        let purpose: ChallengePurpose = self
            .purpose
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let profile = match (self.display_name, self.student_id) {
            (Some(display_name), Some(student_id)) => Some(SignupProfile {
                display_name,
                student_id,
            }),
            _ => None,
        };

        Ok(VerificationChallenge {
            id,
            email: self.email,
            purpose,
            profile,
            code_hash: self.code_hash,
            code_salt: self.code_salt,
            created_at: parse_datetime(&self.created_at)?,
            expires_at: parse_datetime(&self.expires_at)?,
        })
    }
}

impl ChallengeRepository for SqliteChallengeRepository {
    async fn create(&self, challenge: &VerificationChallenge) -> Result<(), RepositoryError> {
        let profile = challenge.profile.as_ref();
        sqlx::query(
            r#"INSERT INTO verification_challenges
                 (id, email, purpose, display_name, student_id, code_hash, code_salt, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(challenge.id.to_string())
        .bind(&challenge.email)
        .bind(challenge.purpose.to_string())
        .bind(profile.map(|p| p.display_name.as_str()))
        .bind(profile.map(|p| p.student_id.as_str()))
        .bind(&challenge.code_hash)
        .bind(&challenge.code_salt)
        .bind(format_datetime(&challenge.created_at))
        .bind(format_datetime(&challenge.expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<VerificationChallenge>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM verification_challenges WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let challenge_row = ChallengeRow::from_row(&row).map_err(query_error)?;
                Ok(Some(challenge_row.into_challenge()?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM verification_challenges WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM verification_challenges WHERE expires_at <= ?")
            .bind(format_datetime(&now))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected())
    }
}
