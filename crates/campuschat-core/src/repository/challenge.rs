//! Verification challenge repository trait definition.

use campuschat_types::challenge::VerificationChallenge;
use campuschat_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for pending verification challenges.
pub trait ChallengeRepository: Send + Sync {
    fn create(
        &self,
        challenge: &VerificationChallenge,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<VerificationChallenge>, RepositoryError>> + Send;

    /// Delete a challenge. Returns `true` only for the caller that actually
    /// removed the row, which makes redemption single-use under concurrency.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every challenge with `expires_at <= now`. Returns the count.
    fn purge_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
