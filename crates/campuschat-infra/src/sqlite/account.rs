//! SQLite account repository implementation.
//!
//! Session ids live one-per-row in `account_sessions`, so adding or removing a
//! session is a single INSERT or DELETE and concurrent logins never overwrite
//! each other.

use std::collections::BTreeSet;

use campuschat_core::repository::account::AccountRepository;
use campuschat_types::account::Account;
use campuschat_types::challenge::SignupProfile;
use campuschat_types::error::RepositoryError;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `AccountRepository`.
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct AccountRow {
    id: String,
    email: String,
    display_name: String,
    student_id: Option<String>,
    verified: bool,
    created_at: String,
}

impl AccountRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            student_id: row.try_get("student_id")?,
            verified: row.try_get("verified")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_account(self, session_ids: BTreeSet<String>) -> Result<Account, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))?;
        Ok(Account {
            id,
            email: self.email,
            display_name: self.display_name,
            student_id: self.student_id,
            verified: self.verified,
            session_ids,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Load one account plus its session ids through `pool`.
async fn fetch_account(
    pool: &SqlitePool,
    column: &str,
    value: String,
) -> Result<Option<Account>, RepositoryError> {
    let sql = format!("SELECT * FROM accounts WHERE {column} = ?");
    let Some(row) = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .map_err(query_error)?
    else {
        return Ok(None);
    };
    let account_row = AccountRow::from_row(&row).map_err(query_error)?;

    let session_ids: Vec<(String,)> =
        sqlx::query_as("SELECT session_id FROM account_sessions WHERE account_id = ?")
            .bind(&account_row.id)
            .fetch_all(pool)
            .await
            .map_err(query_error)?;

    let session_ids = session_ids.into_iter().map(|(id,)| id).collect();
    Ok(Some(account_row.into_account(session_ids)?))
}

impl AccountRepository for SqliteAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        fetch_account(&self.pool.reader, "email", email.to_string()).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Account>, RepositoryError> {
        fetch_account(&self.pool.reader, "id", id.to_string()).await
    }

    async fn upsert_verified(
        &self,
        email: &str,
        profile: Option<&SignupProfile>,
    ) -> Result<Account, RepositoryError> {
        match profile {
            Some(profile) => {
                sqlx::query(
                    r#"INSERT INTO accounts (id, email, display_name, student_id, verified, created_at)
                       VALUES (?, ?, ?, ?, 1, ?)
                       ON CONFLICT(email) DO UPDATE SET verified = 1"#,
                )
                .bind(Uuid::now_v7().to_string())
                .bind(email)
                .bind(&profile.display_name)
                .bind(&profile.student_id)
                .bind(format_datetime(&Utc::now()))
                .execute(&self.pool.writer)
                .await
                .map_err(query_error)?;
            }
            None => {
                let result = sqlx::query("UPDATE accounts SET verified = 1 WHERE email = ?")
                    .bind(email)
                    .execute(&self.pool.writer)
                    .await
                    .map_err(query_error)?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
            }
        }

        // Read back through the writer so the row just written is visible.
        fetch_account(&self.pool.writer, "email", email.to_string())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn add_session_id(&self, email: &str, session_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO account_sessions (session_id, account_id, created_at)
               SELECT ?, id, ? FROM accounts WHERE email = ?"#,
        )
        .bind(session_id)
        .bind(format_datetime(&Utc::now()))
        .bind(email)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return RepositoryError::Conflict(format!(
                        "session id '{session_id}' already exists"
                    ));
                }
            }
            query_error(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn remove_session_id(&self, email: &str, session_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"DELETE FROM account_sessions
               WHERE session_id = ?
                 AND account_id = (SELECT id FROM accounts WHERE email = ?)"#,
        )
        .bind(session_id)
        .bind(email)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_session_ids(&self, email: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM account_sessions WHERE account_id = (SELECT id FROM accounts WHERE email = ?)",
        )
        .bind(email)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected())
    }
}
