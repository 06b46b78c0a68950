use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use arc_swap::ArcSwap;
use async_openai::{Client, config::OpenAIConfig};

use crate::plugins::chat::ChatError;
use crate::services::config::{AiConfig, AiPublicConfig, ChatConfig, StreamMode};
use crate::services::prompts;
use crate::services::retry::RetryConfig;

use super::collaborator::StreamingCollaborator;
use super::stream::{run_chunk_stream, run_typewriter};
use super::types::{ContextMessage, StreamRequest, StreamSink};

/// Remembered turns plus an epoch bumped on every reset, so a task started
/// before the reset cannot write into the fresh conversation.
#[derive(Debug, Default)]
pub(super) struct Conversation {
    pub(super) epoch: u64,
    pub(super) messages: VecDeque<ContextMessage>,
}

impl Conversation {
    fn recent(&self, n: usize) -> Vec<ContextMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    fn record(&mut self, epoch: u64, user: &str, assistant: &str, keep: usize) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.messages.push_back(ContextMessage::user(user));
        self.messages.push_back(ContextMessage::assistant(assistant));
        while self.messages.len() > keep {
            self.messages.pop_front();
        }
        true
    }
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAiCollaborator {
    http_client: reqwest::Client,
    config: ArcSwap<AiConfig>,
    retry: RetryConfig,
    stream_mode: StreamMode,
    typewriter_delay: Duration,
    context_messages: usize,
    cache_messages: usize,
    // NOTE: std::sync::Mutex; the lock is never held across .await.
    conversation: Arc<Mutex<Conversation>>,
}

impl OpenAiCollaborator {
    pub fn new(config: AiConfig, chat: &ChatConfig, retry: RetryConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            config: ArcSwap::from_pointee(config),
            retry,
            stream_mode: chat.stream_mode,
            typewriter_delay: chat.typewriter_delay,
            context_messages: chat.context_messages,
            cache_messages: chat.cache_messages,
            conversation: Arc::new(Mutex::new(Conversation::default())),
        }
    }

    /// Swap in new credentials; requests already in flight keep their snapshot.
    pub fn reload_config(&self, config: AiConfig) {
        log::info!(
            "AI config reloaded: provider={:?} model={}",
            config.provider,
            config.model
        );
        self.config.store(Arc::new(config));
    }

    pub fn public_config(&self) -> AiPublicConfig {
        self.config.load().public()
    }

    /// Remembered turns, oldest first.
    pub fn context(&self) -> Vec<ContextMessage> {
        self.conversation
            .lock()
            .map(|c| c.messages.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl StreamingCollaborator for OpenAiCollaborator {
    fn is_configured(&self) -> bool {
        self.config.load().has_api_key()
    }

    fn reset_conversation(&self) {
        match self.conversation.lock() {
            Ok(mut conversation) => {
                conversation.epoch += 1;
                conversation.messages.clear();
            }
            Err(_) => log::warn!("conversation lock poisoned; reset skipped"),
        }
    }

    fn send_streaming_request(
        &self,
        request: StreamRequest,
        sink: StreamSink,
    ) -> Result<(), ChatError> {
        let config = self.config.load_full();
        if !config.has_api_key() {
            return Err(ChatError::configuration("AI API key is not configured"));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::internal(format!("no async runtime: {}", e)))?;

        let (epoch, context) = {
            let conversation = self
                .conversation
                .lock()
                .map_err(|_| ChatError::internal("conversation lock poisoned"))?;
            (conversation.epoch, conversation.recent(self.context_messages))
        };

        let typewriter = self.stream_mode == StreamMode::Typewriter;
        let body = serde_json::json!({
            "model": config.model,
            "messages": prompts::build_chat_messages(&context, &request.prompt),
            "stream": !typewriter,
        });

        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(config.base_url.clone())
                .with_api_key(config.api_key.clone()),
        )
        .with_http_client(self.http_client.clone());

        let retry = self.retry;
        let delay = self.typewriter_delay;
        let keep = self.cache_messages;
        let conversation = self.conversation.clone();
        let prompt = request.prompt;

        log::debug!(
            "starting request generation={} context={} mode={:?}",
            request.generation,
            context.len(),
            self.stream_mode
        );

        runtime.spawn(async move {
            let result = if typewriter {
                run_typewriter(&client, &body, retry, delay, &sink).await
            } else {
                run_chunk_stream(&client, &body, retry, &sink).await
            };

            match result {
                Ok(text) => {
                    if !text.trim().is_empty() {
                        let recorded = conversation
                            .lock()
                            .map(|mut c| c.record(epoch, &prompt, &text, keep))
                            .unwrap_or(false);
                        if !recorded {
                            log::debug!("conversation reset during request; turn not recorded");
                        }
                    }
                    sink.complete(text);
                }
                Err(message) => {
                    log::warn!("AI request failed: {}", message);
                    sink.fail(message);
                }
            }
        });

        Ok(())
    }
}
