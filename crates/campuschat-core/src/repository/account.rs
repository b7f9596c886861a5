//! Account repository trait definition.

use campuschat_types::account::Account;
use campuschat_types::challenge::SignupProfile;
use campuschat_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for accounts and their session allow-lists.
///
/// Session-id mutations are single-row atomic operations. Implementations must
/// never rewrite the whole set, so concurrent logins for one account cannot
/// lose each other's session ids.
pub trait AccountRepository: Send + Sync {
    /// Look up an account (with its current session ids) by email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Mark the account for `email` verified.
    ///
    /// With a profile, creates the account if it does not exist yet. Without
    /// one, the account must already exist (`RepositoryError::NotFound`).
    fn upsert_verified(
        &self,
        email: &str,
        profile: Option<&SignupProfile>,
    ) -> impl std::future::Future<Output = Result<Account, RepositoryError>> + Send;

    /// Add one session id to the account's allow-list.
    fn add_session_id(
        &self,
        email: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove one session id. Returns whether it was present.
    fn remove_session_id(
        &self,
        email: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove every session id of the account. Returns how many were removed.
    fn clear_session_ids(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
