//! Session manager: mints, validates, and revokes session tokens.
//!
//! A token is honoured only while two independent checks hold: its signed
//! expiry is in the future, and its session id is still in the account's
//! allow-list. The allow-list is re-read on every validation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use campuschat_types::account::Identity;
use campuschat_types::error::{AuthError, RepositoryError};
use campuschat_types::session::{SESSION_ISSUER, SessionClaims, SessionToken};

use crate::repository::account::AccountRepository;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 28;

/// Signs and verifies session claims.
///
/// The `JwtTokenCodec` adapter (HS256) lives in campuschat-infra. `decode`
/// checks signature and issuer only; expiry is judged by the session manager
/// so that expired and revoked tokens report the same error.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &SessionClaims) -> Result<String, AuthError>;

    fn decode(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

pub struct SessionManager<A: AccountRepository, T: TokenCodec> {
    accounts: Arc<A>,
    codec: T,
    ttl: Duration,
}

impl<A: AccountRepository, T: TokenCodec> SessionManager<A, T> {
    pub fn new(accounts: Arc<A>, codec: T) -> Self {
        Self::with_ttl(accounts, codec, Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(accounts: Arc<A>, codec: T, ttl: Duration) -> Self {
        Self {
            accounts,
            codec,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a new session for the account owning `email`.
    ///
    /// The session id is added to the allow-list with a single atomic insert,
    /// so concurrent logins each keep their own session.
    pub async fn mint_session(&self, email: &str) -> Result<SessionToken, AuthError> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            iss: SESSION_ISSUER.to_string(),
            sub: email.to_string(),
            jti: session_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.codec.encode(&claims)?;

        self.accounts
            .add_session_id(email, &session_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UnknownAccount(email.to_string()),
                other => AuthError::Storage(other),
            })?;

        tracing::info!(session_id = %session_id, "session minted");

        Ok(SessionToken {
            token,
            session_id,
            expires_at,
        })
    }

    /// Resolve a token into the identity behind it.
    pub async fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.codec.decode(token)?;
        if claims.iss != SESSION_ISSUER {
            return Err(AuthError::InvalidToken);
        }
        let expires_at = claims.expires_at().ok_or(AuthError::InvalidToken)?;
        if expires_at <= Utc::now() {
            return Err(AuthError::ExpiredToken);
        }

        let account = self
            .accounts
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::ExpiredToken)?;
        if !account.has_session(&claims.jti) {
            tracing::debug!(account_id = %account.id, "session id not in allow-list");
            return Err(AuthError::ExpiredToken);
        }

        Ok(Identity {
            account_id: account.id,
            email: account.email,
            display_name: account.display_name,
            session_id: claims.jti,
            expires_at,
        })
    }

    /// Revoke one session (logout). Idempotent.
    pub async fn revoke_session(&self, identity: &Identity) -> Result<bool, AuthError> {
        let removed = self
            .accounts
            .remove_session_id(&identity.email, &identity.session_id)
            .await?;
        if removed {
            tracing::info!(account_id = %identity.account_id, "session revoked");
        }
        Ok(removed)
    }

    /// Revoke every session of the account owning `email`.
    pub async fn revoke_all_sessions(&self, email: &str) -> Result<u64, AuthError> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::UnknownAccount(email.to_string()))?;
        let removed = self.accounts.clear_session_ids(&account.email).await?;
        tracing::info!(account_id = %account.id, removed, "all sessions revoked");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCodec, MemoryAccounts};

    async fn manager_with_account(email: &str) -> (Arc<MemoryAccounts>, SessionManager<MemoryAccounts, FakeCodec>) {
        let accounts = Arc::new(MemoryAccounts::default());
        accounts.insert_verified(email, "Ada");
        let manager = SessionManager::new(accounts.clone(), FakeCodec);
        (accounts, manager)
    }

    #[tokio::test]
    async fn test_mint_then_validate() {
        let (_, manager) = manager_with_account("a@inst.edu").await;
        let session = manager.mint_session("a@inst.edu").await.unwrap();

        let identity = manager.validate_token(&session.token).await.unwrap();
        assert_eq!(identity.email, "a@inst.edu");
        assert_eq!(identity.session_id, session.session_id);
        assert_eq!(identity.display_name, "Ada");
    }

    #[tokio::test]
    async fn test_mint_for_unknown_account() {
        let (_, manager) = manager_with_account("a@inst.edu").await;
        let err = manager.mint_session("b@inst.edu").await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownAccount(_)));
    }

    #[tokio::test]
    async fn test_removed_session_id_is_expired_even_with_valid_signature() {
        let (accounts, manager) = manager_with_account("a@inst.edu").await;
        let session = manager.mint_session("a@inst.edu").await.unwrap();

        accounts
            .remove_session_id("a@inst.edu", &session.session_id)
            .await
            .unwrap();

        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_past_expiry_is_expired_even_when_listed() {
        let (accounts, manager) = manager_with_account("a@inst.edu").await;
        accounts
            .add_session_id("a@inst.edu", "old-session")
            .await
            .unwrap();

        let now = Utc::now().timestamp();
        let token = FakeCodec
            .encode(&SessionClaims {
                iss: SESSION_ISSUER.to_string(),
                sub: "a@inst.edu".to_string(),
                jti: "old-session".to_string(),
                iat: now - 100,
                exp: now - 1,
            })
            .unwrap();

        let err = manager.validate_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let (_, manager) = manager_with_account("a@inst.edu").await;
        let err = manager.validate_token("not-a-token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_deleted_account_is_expired() {
        let (accounts, manager) = manager_with_account("a@inst.edu").await;
        let session = manager.mint_session("a@inst.edu").await.unwrap();
        accounts.remove("a@inst.edu");

        let err = manager.validate_token(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_revoke_session_only_affects_that_session() {
        let (_, manager) = manager_with_account("a@inst.edu").await;
        let first = manager.mint_session("a@inst.edu").await.unwrap();
        let second = manager.mint_session("a@inst.edu").await.unwrap();

        let identity = manager.validate_token(&first.token).await.unwrap();
        assert!(manager.revoke_session(&identity).await.unwrap());
        assert!(!manager.revoke_session(&identity).await.unwrap());

        assert!(manager.validate_token(&first.token).await.is_err());
        assert!(manager.validate_token(&second.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_all_sessions() {
        let (_, manager) = manager_with_account("a@inst.edu").await;
        let a = manager.mint_session("a@inst.edu").await.unwrap();
        let b = manager.mint_session("a@inst.edu").await.unwrap();

        assert_eq!(manager.revoke_all_sessions("a@inst.edu").await.unwrap(), 2);
        assert!(manager.validate_token(&a.token).await.is_err());
        assert!(manager.validate_token(&b.token).await.is_err());

        let err = manager.revoke_all_sessions("nobody@inst.edu").await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownAccount(_)));
    }

    #[tokio::test]
    async fn test_ttl_is_applied() {
        let accounts = Arc::new(MemoryAccounts::default());
        accounts.insert_verified("a@inst.edu", "Ada");
        let manager = SessionManager::with_ttl(accounts, FakeCodec, Duration::days(1));
        let session = manager.mint_session("a@inst.edu").await.unwrap();
        let remaining = session.expires_at - Utc::now();
        assert!(remaining <= Duration::days(1));
        assert!(remaining > Duration::hours(23));
    }
}
