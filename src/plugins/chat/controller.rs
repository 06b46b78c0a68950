use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use uuid::Uuid;

use crate::plugins::formatter::DisplayNode;
use crate::services::ai::{
    StreamEvent, StreamEventKind, StreamRequest, StreamSink, StreamingCollaborator,
};
use crate::services::config::ChatConfig;
use crate::services::prompts;

use super::buffer::{StreamingBuffer, StreamingState};
use super::error::ChatError;
use super::metadata::{extract_legal_categories, extract_legal_sources};
use super::title::{derive_preview, derive_title};
use super::types::{Author, ChatAnalytics, ChatSession, Message, ResponseMetadata};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

fn assistant_message(text: impl Into<String>) -> Message {
    Message {
        id: new_id("msg"),
        text: text.into(),
        author: Author::Assistant,
        created_at_ms: now_ms(),
        streaming: false,
        metadata: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty input, or a response is still streaming.
    Ignored,
    NotConfigured,
    Started { generation: u64 },
    /// The collaborator rejected the request; the fallback message is shown.
    Failed { error: ChatError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Stale,
    Progress { message_id: String, percent: u8 },
    Completed { message_id: String },
    Failed { message_id: String },
}

/// Owns the session list, the visible messages and the live stream.
///
/// All mutation goes through `&mut self`; stream events arrive through
/// [`ChatController::handle_event`] one at a time.
pub struct ChatController<C> {
    collaborator: C,
    config: ChatConfig,
    events: UnboundedSender<StreamEvent>,
    sessions: Vec<ChatSession>,
    current: Option<String>,
    messages: Vec<Message>,
    buffer: StreamingBuffer,
    error: Option<ChatError>,
    notice_shown: bool,
}

impl<C: StreamingCollaborator> ChatController<C> {
    /// Starts with one fresh session showing the greeting.
    pub fn new(collaborator: C, config: ChatConfig, events: UnboundedSender<StreamEvent>) -> Self {
        let mut controller = Self {
            collaborator,
            config,
            events,
            sessions: Vec::new(),
            current: None,
            messages: Vec::new(),
            buffer: StreamingBuffer::new(),
            error: None,
            notice_shown: false,
        };
        controller.new_chat();
        controller
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recently created first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        let id = self.current.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn streaming(&self) -> Option<&StreamingState> {
        self.buffer.state()
    }

    pub fn is_streaming(&self) -> bool {
        self.buffer.is_streaming()
    }

    /// Display tree of the in-flight response.
    pub fn streaming_render(&self) -> &[DisplayNode] {
        self.buffer.rendered()
    }

    pub fn error(&self) -> Option<&ChatError> {
        self.error.as_ref()
    }

    /// Totals and most frequent legal categories across all sessions.
    pub fn analytics(&self) -> ChatAnalytics {
        ChatAnalytics::from_sessions(&self.sessions)
    }

    fn current_session_mut(&mut self) -> Option<&mut ChatSession> {
        let id = self.current.as_deref()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn refresh_configuration(&mut self) {
        if self.collaborator.is_configured() {
            if matches!(self.error, Some(ChatError::Configuration { .. })) {
                self.error = None;
            }
        } else {
            self.error = Some(ChatError::configuration("AI service is not configured"));
        }
    }

    /// Append the notice unless the visible message list already holds it.
    fn show_not_configured(&mut self) {
        self.refresh_configuration();
        if !self.notice_shown {
            self.notice_shown = true;
            self.messages
                .push(assistant_message(prompts::NOT_CONFIGURED_MESSAGE));
        }
    }

    /// Abandon the live stream and drop its placeholder.
    fn abandon_stream(&mut self) {
        if let Some(state) = self.buffer.abandon() {
            log::debug!("abandoned stream generation {}", state.generation);
            self.messages.retain(|m| m.id != state.message_id);
        }
    }

    fn reset_to_greeting(&mut self) {
        self.abandon_stream();
        self.collaborator.reset_conversation();
        self.messages = vec![assistant_message(prompts::GREETING_MESSAGE)];
        self.notice_shown = false;
        self.error = None;
        if self.collaborator.is_configured() {
            self.refresh_configuration();
        } else {
            self.show_not_configured();
        }
    }

    /// Prepend a fresh session and make it current. Returns its id.
    pub fn new_chat(&mut self) -> String {
        let now = now_ms();
        let session = ChatSession {
            id: new_id("chat"),
            title: prompts::NEW_CHAT_TITLE.to_string(),
            preview: String::new(),
            created_at_ms: now,
            last_updated_ms: now,
            title_fixed: false,
            message_count: 0,
            legal_categories: Vec::new(),
        };
        let id = session.id.clone();
        log::info!("new chat {}", id);

        self.sessions.insert(0, session);
        self.current = Some(id.clone());
        self.reset_to_greeting();
        id
    }

    /// Resolve a 1-based list position or a session id to a session id.
    pub fn resolve_session(&self, arg: &str) -> Result<String, ChatError> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(ChatError::invalid_input("expected a chat number or id"));
        }
        let found = match arg.parse::<usize>() {
            Ok(0) => return Err(ChatError::invalid_input("chat numbers start at 1")),
            Ok(n) => self.sessions.get(n - 1),
            Err(_) => self.sessions.iter().find(|s| s.id == arg),
        };
        found
            .map(|s| s.id.clone())
            .ok_or_else(|| ChatError::not_found(format!("no chat matches {:?}", arg)))
    }

    pub fn select_chat(&mut self, id: &str) -> Result<(), ChatError> {
        if !self.sessions.iter().any(|s| s.id == id) {
            return Err(ChatError::not_found(format!("chat {} not found", id)));
        }
        log::info!("select chat {}", id);
        self.current = Some(id.to_string());
        self.reset_to_greeting();
        Ok(())
    }

    pub fn delete_chat(&mut self, id: &str) -> Result<(), ChatError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ChatError::not_found(format!("chat {} not found", id)))?;
        self.sessions.remove(index);
        log::info!("deleted chat {}", id);

        if self.current.as_deref() != Some(id) {
            return Ok(());
        }
        match self.sessions.first().map(|s| s.id.clone()) {
            Some(next) => self.select_chat(&next),
            None => {
                self.abandon_stream();
                self.collaborator.reset_conversation();
                self.current = None;
                self.messages.clear();
                self.notice_shown = false;
                Ok(())
            }
        }
    }

    pub fn send_message(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() || self.buffer.is_streaming() {
            return SendOutcome::Ignored;
        }

        if !self.collaborator.is_configured() {
            self.show_not_configured();
            return SendOutcome::NotConfigured;
        }
        self.refresh_configuration();

        if self.current.is_none() {
            self.new_chat();
        }

        let now = now_ms();
        let title_max = self.config.title_max_chars;
        if let Some(session) = self.current_session_mut() {
            if !session.title_fixed {
                session.title = derive_title(text, title_max);
                session.preview = derive_preview(text, title_max);
                session.title_fixed = true;
            }
            session.message_count += 1;
            session.last_updated_ms = now;
            session.add_categories(extract_legal_categories(text));
        }

        self.messages.push(Message {
            id: new_id("msg"),
            text: text.to_string(),
            author: Author::User,
            created_at_ms: now,
            streaming: false,
            metadata: None,
        });

        let placeholder = Message {
            streaming: true,
            ..assistant_message(String::new())
        };
        let generation = self
            .buffer
            .begin(placeholder.id.clone(), None, Instant::now());
        self.messages.push(placeholder);

        let request = StreamRequest {
            prompt: text.to_string(),
            generation,
        };
        let sink = StreamSink::new(generation, self.events.clone());
        match self.collaborator.send_streaming_request(request, sink) {
            Ok(()) => SendOutcome::Started { generation },
            Err(error) => {
                log::warn!("request rejected: {}", error);
                self.fail_stream(generation, error.clone());
                SendOutcome::Failed { error }
            }
        }
    }

    pub fn handle_event(&mut self, event: StreamEvent) -> EventOutcome {
        if !self.buffer.is_current(event.generation) {
            log::debug!("dropping stale event for generation {}", event.generation);
            return EventOutcome::Stale;
        }

        match event.kind {
            StreamEventKind::Fragment { text, index, total } => {
                self.buffer
                    .apply_fragment(event.generation, &text, index, total, Instant::now());
                let Some(state) = self.buffer.state() else {
                    return EventOutcome::Stale;
                };
                let (message_id, percent) = (state.message_id.clone(), state.progress_percent);
                let accumulated = state.accumulated.clone();
                if let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) {
                    message.text = accumulated;
                }
                EventOutcome::Progress {
                    message_id,
                    percent,
                }
            }
            StreamEventKind::Complete { final_text } => {
                self.complete_stream(event.generation, final_text)
            }
            StreamEventKind::Failed { message } => {
                self.fail_stream(event.generation, ChatError::transport(message))
            }
        }
    }

    /// Route a stream silent for longer than the configured timeout to the error path.
    pub fn check_stall(&mut self, now: Instant) -> Option<EventOutcome> {
        let timeout = self.config.stall_timeout?;
        if !self.buffer.stalled(now, timeout) {
            return None;
        }
        let generation = self.buffer.state()?.generation;
        log::warn!(
            "stream generation {} stalled for {}s",
            generation,
            timeout.as_secs()
        );
        Some(self.fail_stream(
            generation,
            ChatError::transport(format!("no response for {} seconds", timeout.as_secs())),
        ))
    }

    fn complete_stream(&mut self, generation: u64, final_text: String) -> EventOutcome {
        let Some(state) = self.buffer.complete(generation) else {
            return EventOutcome::Stale;
        };

        let text = if !state.accumulated.trim().is_empty() {
            state.accumulated
        } else if !final_text.trim().is_empty() {
            final_text
        } else {
            prompts::EMPTY_RESPONSE_MESSAGE.to_string()
        };

        let metadata = ResponseMetadata {
            legal_sources: extract_legal_sources(&text),
            elapsed_ms: state.started_at.elapsed().as_millis() as u64,
            fragments: state.fragments_received,
        };
        let categories = extract_legal_categories(&text);

        if let Some(message) = self.messages.iter_mut().find(|m| m.id == state.message_id) {
            message.text = text;
            message.streaming = false;
            message.metadata = Some(metadata);
        }
        if let Some(session) = self.current_session_mut() {
            session.message_count += 1;
            session.last_updated_ms = now_ms();
            session.add_categories(categories);
        }
        if matches!(self.error, Some(ChatError::Transport { .. })) {
            self.error = None;
        }

        EventOutcome::Completed {
            message_id: state.message_id,
        }
    }

    fn fail_stream(&mut self, generation: u64, error: ChatError) -> EventOutcome {
        let Some(state) = self.buffer.fail(generation) else {
            return EventOutcome::Stale;
        };
        log::warn!("stream failed: {}", error);

        if let Some(message) = self.messages.iter_mut().find(|m| m.id == state.message_id) {
            message.text = prompts::FALLBACK_ERROR_MESSAGE.to_string();
            message.streaming = false;
            message.metadata = None;
        }
        if let Some(session) = self.current_session_mut() {
            session.message_count += 1;
            session.last_updated_ms = now_ms();
        }
        self.error = Some(error);

        EventOutcome::Failed {
            message_id: state.message_id,
        }
    }
}
