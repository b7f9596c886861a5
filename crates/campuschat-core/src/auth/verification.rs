//! Verification engine: issues and redeems single-use email codes.
//!
//! The same flow serves signup and login. Issuing stores a salted digest of a
//! fresh numeric code and mails the plaintext. Redeeming checks the code,
//! deletes the challenge, marks the account verified (creating it on signup),
//! and mints the first session.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use campuschat_types::challenge::{
    ChallengePurpose, ChallengeStatus, SignupProfile, VerificationChallenge,
};
use campuschat_types::error::{RepositoryError, VerificationError};
use campuschat_types::session::SessionToken;

use crate::auth::code::{CodeHasher, generate_code};
use crate::auth::email::{email_domain, validate_email};
use crate::auth::session::{SessionManager, TokenCodec};
use crate::notify::Notifier;
use crate::repository::account::AccountRepository;
use crate::repository::challenge::ChallengeRepository;

const CODE_SUBJECT: &str = "Your verification code";

#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub challenge_ttl: Duration,
    pub code_length: usize,
    /// Signup is restricted to this email domain when set.
    pub allowed_domain: Option<String>,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::minutes(10),
            code_length: 6,
            allowed_domain: None,
        }
    }
}

pub struct VerificationEngine<A, C, N, H, T>
where
    A: AccountRepository,
    C: ChallengeRepository,
    N: Notifier,
    H: CodeHasher,
    T: TokenCodec,
{
    accounts: Arc<A>,
    challenges: C,
    notifier: N,
    hasher: H,
    sessions: Arc<SessionManager<A, T>>,
    settings: VerificationSettings,
}

impl<A, C, N, H, T> VerificationEngine<A, C, N, H, T>
where
    A: AccountRepository,
    C: ChallengeRepository,
    N: Notifier,
    H: CodeHasher,
    T: TokenCodec,
{
    pub fn new(
        accounts: Arc<A>,
        challenges: C,
        notifier: N,
        hasher: H,
        sessions: Arc<SessionManager<A, T>>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            accounts,
            challenges,
            notifier,
            hasher,
            sessions,
            settings,
        }
    }

    /// Start a signup for a new address.
    ///
    /// Fails `AccountExists` when a verified account already owns the email.
    pub async fn issue_signup_challenge(
        &self,
        email: &str,
        display_name: &str,
        student_id: &str,
    ) -> Result<Uuid, VerificationError> {
        let display_name = display_name.trim();
        let student_id = student_id.trim();
        if email.trim().is_empty() || display_name.is_empty() || student_id.is_empty() {
            return Err(VerificationError::Validation(
                "an email, name, and student ID must be provided".to_string(),
            ));
        }

        let email = validate_email(email)?;
        if let Some(domain) = &self.settings.allowed_domain {
            if !email_domain(&email).eq_ignore_ascii_case(domain) {
                return Err(VerificationError::DomainNotAllowed(
                    email_domain(&email).to_string(),
                ));
            }
        }

        if let Some(existing) = self.accounts.find_by_email(&email).await? {
            if existing.verified {
                return Err(VerificationError::AccountExists(email));
            }
        }

        let profile = SignupProfile {
            display_name: display_name.to_string(),
            student_id: student_id.to_string(),
        };
        let greeting = profile.display_name.clone();
        self.issue(email, ChallengePurpose::Signup, Some(profile), &greeting)
            .await
    }

    /// Start a login for an existing account.
    pub async fn issue_login_challenge(&self, email: &str) -> Result<Uuid, VerificationError> {
        let email = validate_email(email)?;
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(|| VerificationError::UnknownAccount(email.clone()))?;

        self.issue(email, ChallengePurpose::Login, None, &account.display_name)
            .await
    }

    async fn issue(
        &self,
        email: String,
        purpose: ChallengePurpose,
        profile: Option<SignupProfile>,
        greeting: &str,
    ) -> Result<Uuid, VerificationError> {
        let code = generate_code(self.settings.code_length);
        let salt = self.hasher.generate_salt();
        let now = Utc::now();

        let challenge = VerificationChallenge {
            id: Uuid::now_v7(),
            email,
            purpose,
            profile,
            code_hash: self.hasher.hash(&salt, &code),
            code_salt: salt,
            created_at: now,
            expires_at: now + self.settings.challenge_ttl,
        };
        self.challenges.create(&challenge).await?;

        // The challenge stays stored on delivery failure; expiry reaps it.
        let body = format!("Hi {greeting},\nYour one-time login code is:\n{code}");
        let delivery_id = self
            .notifier
            .send(&challenge.email, CODE_SUBJECT, &body)
            .await
            .inspect_err(|e| {
                tracing::warn!(challenge_id = %challenge.id, error = %e, "verification code delivery failed");
            })?;

        tracing::info!(
            challenge_id = %challenge.id,
            purpose = %purpose,
            delivery_id = %delivery_id,
            "verification challenge issued"
        );
        Ok(challenge.id)
    }

    /// Redeem a challenge with the code the user received.
    ///
    /// A wrong code leaves the challenge in place for another attempt. Only
    /// the caller whose delete removes the row goes on to mint a session.
    pub async fn redeem_challenge(
        &self,
        id: &Uuid,
        submitted_code: &str,
    ) -> Result<SessionToken, VerificationError> {
        let challenge = self
            .challenges
            .get(id)
            .await?
            .ok_or(VerificationError::NotFound)?;

        if challenge.is_expired(Utc::now()) {
            self.challenges.delete(id).await?;
            return Err(VerificationError::Expired);
        }

        let submitted_code = submitted_code.trim();
        if submitted_code.is_empty()
            || !self
                .hasher
                .verify(&challenge.code_salt, submitted_code, &challenge.code_hash)
        {
            tracing::warn!(challenge_id = %id, "incorrect verification code");
            return Err(VerificationError::InvalidCode);
        }

        if !self.challenges.delete(id).await? {
            return Err(VerificationError::NotFound);
        }

        let account = self
            .accounts
            .upsert_verified(&challenge.email, challenge.profile.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    VerificationError::UnknownAccount(challenge.email.clone())
                }
                other => VerificationError::Storage(other),
            })?;

        let session = self.sessions.mint_session(&account.email).await?;
        tracing::info!(
            challenge_id = %id,
            account_id = %account.id,
            purpose = %challenge.purpose,
            "challenge redeemed"
        );
        Ok(session)
    }

    /// Whether a challenge id is live.
    pub async fn challenge_status(&self, id: &Uuid) -> Result<ChallengeStatus, VerificationError> {
        let challenge = self
            .challenges
            .get(id)
            .await?
            .ok_or(VerificationError::NotFound)?;
        if challenge.is_expired(Utc::now()) {
            return Err(VerificationError::Expired);
        }
        Ok(challenge.status())
    }

    /// Remove every expired challenge.
    pub async fn purge_expired(&self) -> Result<u64, VerificationError> {
        let removed = self.challenges.purge_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired challenges purged");
        }
        Ok(removed)
    }
}
