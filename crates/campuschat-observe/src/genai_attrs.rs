//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! Used as span field names on generation calls so traces line up with other
//! GenAI-instrumented services. Span naming: `"{operation} {model}"`.

pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

/// Outcome of the turn once persistence finishes.
pub const CAMPUSCHAT_TURN_OUTCOME: &str = "campuschat.turn.outcome";

// --- Operation name values ---

/// Streaming chat turn.
pub const OP_CHAT: &str = "chat";

// --- Provider name values ---

pub const PROVIDER_GEMINI: &str = "gemini";
