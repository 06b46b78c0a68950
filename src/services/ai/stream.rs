use std::time::Duration;

use async_openai::{Client, config::OpenAIConfig};
use futures_util::StreamExt;
use serde_json::Value as JsonValue;

use crate::services::retry::RetryConfig;

use super::retry_policy::should_retry_openai_error;
use super::types::{ByotChatCompletionStreamResponse, StreamSink};

/// Forward streaming deltas to `sink` as they arrive.
///
/// Returns the full text. Transient errors are retried only while nothing has
/// been emitted yet, so the receiver never sees a fragment twice.
pub(super) async fn run_chunk_stream(
    client: &Client<OpenAIConfig>,
    request: &JsonValue,
    retry: RetryConfig,
    sink: &StreamSink,
) -> Result<String, String> {
    let mut last_error: Option<String> = None;

    'attempts: for attempt in 1..=retry.max_attempts {
        let mut stream = match client
            .chat()
            .create_stream_byot::<_, ByotChatCompletionStreamResponse>(request)
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                let msg = err.to_string();
                last_error = Some(msg.clone());
                if attempt < retry.max_attempts && should_retry_openai_error(&err) {
                    log::warn!(
                        "Retry attempt {}/{} after error: {}",
                        attempt + 1,
                        retry.max_attempts,
                        msg
                    );
                    tokio::time::sleep(retry.backoff(attempt)).await;
                    continue;
                }
                return Err(msg);
            }
        };

        let mut text = String::new();
        let mut index = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    let msg = err.to_string();
                    last_error = Some(msg.clone());
                    if attempt < retry.max_attempts
                        && index == 0
                        && should_retry_openai_error(&err)
                    {
                        log::warn!(
                            "Retry attempt {}/{} after stream error: {}",
                            attempt + 1,
                            retry.max_attempts,
                            msg
                        );
                        tokio::time::sleep(retry.backoff(attempt)).await;
                        continue 'attempts;
                    }
                    return Err(msg);
                }
            };

            for choice in chunk.choices {
                if let Some(reason) = choice.finish_reason.as_deref() {
                    log::debug!("stream finished: {}", reason);
                }
                let Some(content) = choice.delta.content else {
                    continue;
                };
                if content.is_empty() {
                    continue;
                }
                text.push_str(&content);
                if !sink.fragment(content, index, None) {
                    log::debug!("stream receiver closed after {} fragments", index);
                    return Ok(text);
                }
                index += 1;
            }
        }

        return Ok(text);
    }

    Err(last_error.unwrap_or_else(|| "Retry limit exceeded".to_string()))
}

/// Fetch the whole answer, then replay it one character at a time.
pub(super) async fn run_typewriter(
    client: &Client<OpenAIConfig>,
    request: &JsonValue,
    retry: RetryConfig,
    delay: Duration,
    sink: &StreamSink,
) -> Result<String, String> {
    let text = fetch_completion(client, request, retry).await?;

    let total = text.chars().count();
    for (index, ch) in text.chars().enumerate() {
        if !sink.fragment(ch.to_string(), index, Some(total)) {
            log::debug!("typewriter receiver closed at {}/{}", index, total);
            break;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(text)
}

async fn fetch_completion(
    client: &Client<OpenAIConfig>,
    request: &JsonValue,
    retry: RetryConfig,
) -> Result<String, String> {
    let mut last_error: Option<String> = None;

    for attempt in 1..=retry.max_attempts {
        match client.chat().create_byot::<_, JsonValue>(request).await {
            Ok(response) => return Ok(completion_text(&response)),
            Err(err) => {
                let msg = err.to_string();
                last_error = Some(msg.clone());
                if attempt < retry.max_attempts && should_retry_openai_error(&err) {
                    log::warn!(
                        "Retry attempt {}/{} after error: {}",
                        attempt + 1,
                        retry.max_attempts,
                        msg
                    );
                    tokio::time::sleep(retry.backoff(attempt)).await;
                    continue;
                }
                return Err(msg);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| "Retry limit exceeded".to_string()))
}

fn completion_text(response: &JsonValue) -> String {
    response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}
