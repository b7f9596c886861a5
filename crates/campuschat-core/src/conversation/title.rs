//! Conversation title generation via LLM.
//!
//! `generate_title` asks a small model for a short title based on the first
//! question of a new conversation. It runs before the turn's stream opens.

use campuschat_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::box_provider::BoxLlmProvider;

/// System prompt for the title generation LLM call.
const TITLE_SYSTEM_PROMPT: &str = "You are a title generator for conversations between humans. \
Create concise, engaging, and relevant titles based on the provided conversation content. \
Do not provide titles in Markdown. Do not return multiple responses. \
Do not provide anything related to that it is a conversation. \
Do not answer or reply to the initial statement.";

/// Titles longer than this many words are cut down.
pub const MAX_TITLE_WORDS: usize = 5;

/// Length of the question prefix used when the model returns nothing usable.
const FALLBACK_TITLE_CHARS: usize = 48;

/// Generate a title for a conversation that starts with `question`.
///
/// The result is trimmed of whitespace, quotes, and markdown emphasis. An
/// empty reply yields an empty string; callers pick a fallback.
#[tracing::instrument(name = "generate_title", skip(provider, question), fields(model = %model))]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    question: &str,
    model: &str,
) -> Result<String, LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user(format!(
            "Write a max {MAX_TITLE_WORDS} word title for an AI chat with this as the first question: {question}"
        ))],
        system: Some(TITLE_SYSTEM_PROMPT.to_string()),
        max_tokens: 32,
        temperature: Some(0.3),
        stream: false,
    };

    let response = provider.complete(&request).await?;
    Ok(clean_title(&response.content))
}

/// Normalize a raw model reply into a single-line title.
pub fn clean_title(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let trimmed = line
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '*' | '#' | '`'))
        .trim();
    trimmed
        .split_whitespace()
        .take(MAX_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title derived from the question itself.
pub fn fallback_title(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(FALLBACK_TITLE_CHARS)
        .collect()
}
