use thiserror::Error;

/// Errors from repository operations (used by trait definitions in campuschat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the outbound notification collaborator.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors resolving a session token into an identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("invalid session token")]
    InvalidToken,

    /// Past its expiry, revoked, or its account no longer exists.
    #[error("session expired or revoked")]
    ExpiredToken,

    #[error("no account for '{0}'")]
    UnknownAccount(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from issuing or redeeming verification challenges.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("email domain not allowed: '{0}'")]
    DomainNotAllowed(String),

    #[error("an account already exists for '{0}'")]
    AccountExists(String),

    #[error("no account for '{0}'")]
    UnknownAccount(String),

    #[error("challenge not found")]
    NotFound,

    #[error("challenge expired")]
    Expired,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("delivery failed: {0}")]
    Delivery(#[from] NotifyError),

    #[error(transparent)]
    Session(#[from] AuthError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from the conversation pipeline.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid model: '{0}'")]
    InvalidModel(String),

    #[error("conversation not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("upstream error: {0}")]
    Upstream(#[from] crate::llm::LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
