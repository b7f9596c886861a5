//! SSE stream adapter for `streamGenerateContent?alt=sse`.
//!
//! Each SSE `data:` payload is a complete [`GeminiResponse`] carrying the
//! next slice of text. The final chunk carries `finishReason` and usage.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use campuschat_core::llm::provider::LlmEventStream;
use campuschat_types::llm::{LlmError, StreamEvent};

use super::client::status_error;
use super::types::{GeminiRequest, GeminiResponse};

/// Open a streaming request and map Gemini chunks to [`StreamEvent`]s.
///
/// The HTTP request is sent lazily on first poll; dropping the returned
/// stream drops the connection.
pub fn create_gemini_stream(
    client: reqwest::Client,
    url: String,
    body: GeminiRequest,
    api_key: SecretString,
) -> LlmEventStream {
    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let never: std::convert::Infallible = Err(status_error(status, &error_body))?;
            match never {}
        }

        yield StreamEvent::Connected;

        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
            if event.data.trim().is_empty() {
                continue;
            }

            let chunk: GeminiResponse = serde_json::from_str(&event.data).map_err(|e| {
                LlmError::Deserialization(format!("invalid stream chunk: {e}"))
            })?;

            if let Some(error) = &chunk.error {
                Err::<(), _>(LlmError::Stream(format!("{} {}", error.status, error.message)))?;
            }
            if let Some(reason) = chunk.block_reason() {
                Err::<(), _>(LlmError::Provider {
                    message: format!("prompt blocked: {reason}"),
                })?;
            }

            let text = chunk.text();
            if !text.is_empty() {
                yield StreamEvent::TextDelta { text };
            }
            if let Some(stop_reason) = chunk.finish_reason() {
                yield StreamEvent::MessageDelta { stop_reason };
            }
            if let Some(usage) = chunk.usage() {
                yield StreamEvent::Usage(usage);
            }
        }

        yield StreamEvent::Done;
    })
}
