//! GeminiProvider: concrete [`LlmProvider`] for the Gemini REST API.
//!
//! The API key is held as a [`SecretString`] and only exposed when building
//! the `x-goog-api-key` header.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use campuschat_core::llm::provider::{LlmEventStream, LlmProvider};
use campuschat_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason};

use super::streaming::create_gemini_stream;
use super::types::{GeminiErrorEnvelope, GeminiRequest, GeminiResponse};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }
}

/// Map a non-2xx status and body to an [`LlmError`].
pub(super) fn status_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            retry_after_ms: None,
        },
        StatusCode::BAD_REQUEST => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GeminiRequest::from(request);
        let url = self.url(&request.model, "generateContent");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(60))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_body));
        }

        let gemini_resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        if let Some(reason) = gemini_resp.block_reason() {
            return Err(LlmError::Provider {
                message: format!("prompt blocked: {reason}"),
            });
        }

        Ok(CompletionResponse {
            content: gemini_resp.text(),
            model: gemini_resp
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            stop_reason: gemini_resp.finish_reason().unwrap_or(StopReason::EndTurn),
            usage: gemini_resp.usage().unwrap_or_default(),
        })
    }

    fn stream(&self, request: CompletionRequest) -> LlmEventStream {
        let body = GeminiRequest::from(&request);
        let url = format!("{}?alt=sse", self.url(&request.model, "streamGenerateContent"));
        create_gemini_stream(self.client.clone(), url, body, self.api_key.clone())
    }
}
