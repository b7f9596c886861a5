//! Application state wiring all services together.
//!
//! Services are generic over repository, notifier, hasher, and codec
//! traits; AppState pins them to the concrete infra implementations and is
//! shared by the CLI and the HTTP handlers.

use std::sync::Arc;

use chrono::Duration;
use secrecy::SecretString;

use campuschat_core::auth::session::SessionManager;
use campuschat_core::auth::verification::{VerificationEngine, VerificationSettings};
use campuschat_core::conversation::pipeline::{ConversationPipeline, PipelineSettings};
use campuschat_core::llm::box_provider::BoxLlmProvider;
use campuschat_infra::config::{resolve_timezone, validate_config};
use campuschat_infra::crypto::jwt::JwtTokenCodec;
use campuschat_infra::crypto::otp::{Sha256CodeHasher, generate_secret};
use campuschat_infra::llm::gemini::GeminiProvider;
use campuschat_infra::notify::ConfiguredNotifier;
use campuschat_infra::sqlite::account::SqliteAccountRepository;
use campuschat_infra::sqlite::challenge::SqliteChallengeRepository;
use campuschat_infra::sqlite::conversation::SqliteConversationRepository;
use campuschat_infra::sqlite::pool::DatabasePool;
use campuschat_types::config::AppConfig;

use crate::http::cookie::CookieSettings;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteSessionManager = SessionManager<SqliteAccountRepository, JwtTokenCodec>;

pub type ConcreteVerificationEngine = VerificationEngine<
    SqliteAccountRepository,
    SqliteChallengeRepository,
    ConfiguredNotifier,
    Sha256CodeHasher,
    JwtTokenCodec,
>;

pub type ConcreteConversationPipeline = ConversationPipeline<SqliteConversationRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ConcreteSessionManager>,
    pub verification: Arc<ConcreteVerificationEngine>,
    pub conversations: Arc<ConcreteConversationPipeline>,
    pub cookies: CookieSettings,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the database and build every collaborator from `config`.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&config.database.url).await?;

        let notifier = ConfiguredNotifier::from_config(config.smtp.as_ref())?;

        let api_key = match &config.generation.api_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!("no Gemini API key configured; turns will fail upstream");
                String::new()
            }
        };
        let provider = GeminiProvider::new(
            SecretString::from(api_key),
            config.generation.base_url.clone(),
        )?;

        Self::from_parts(config, db_pool, notifier, BoxLlmProvider::new(provider))
    }

    /// Wire services around an open pool and pre-built collaborators.
    pub fn from_parts(
        config: &AppConfig,
        db_pool: DatabasePool,
        notifier: ConfiguredNotifier,
        provider: BoxLlmProvider,
    ) -> anyhow::Result<Self> {
        validate_config(config)?;

        let secret = match &config.auth.session_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!(
                    "no session secret configured; using an ephemeral one, sessions end on restart"
                );
                generate_secret(32)
            }
        };
        let codec = JwtTokenCodec::new(secret.as_bytes())?;

        let accounts = Arc::new(SqliteAccountRepository::new(db_pool.clone()));
        let session_ttl = Duration::days(config.auth.session_ttl_days);
        let sessions = Arc::new(SessionManager::with_ttl(
            Arc::clone(&accounts),
            codec,
            session_ttl,
        ));

        let verification = VerificationEngine::new(
            accounts,
            SqliteChallengeRepository::new(db_pool.clone()),
            notifier,
            Sha256CodeHasher,
            Arc::clone(&sessions),
            VerificationSettings {
                challenge_ttl: Duration::minutes(config.auth.challenge_ttl_minutes),
                code_length: config.auth.otp_length,
                allowed_domain: config.auth.allowed_email_domain.clone(),
            },
        );

        let generation = &config.generation;
        let pipeline = ConversationPipeline::new(
            Arc::new(SqliteConversationRepository::new(db_pool.clone())),
            Arc::new(provider),
            PipelineSettings {
                allowed_models: generation.allowed_models.clone(),
                default_model: generation.default_model.clone(),
                title_model: generation.title_model.clone(),
                timezone: resolve_timezone(&generation.timezone)?,
                max_output_tokens: generation.max_output_tokens,
            },
        );

        Ok(Self {
            sessions,
            verification: Arc::new(verification),
            conversations: Arc::new(pipeline),
            cookies: CookieSettings {
                secure: config.server.secure_cookies,
                max_age_secs: session_ttl.num_seconds(),
            },
            db_pool,
        })
    }
}
