use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    User,
    Assistant,
}

/// One remembered turn of the conversation sent back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: ContextRole,
    pub content: String,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub prompt: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamEventKind {
    Fragment {
        text: String,
        index: usize,
        total: Option<usize>,
    },
    Complete {
        final_text: String,
    },
    Failed {
        message: String,
    },
}

/// A collaborator callback, tagged with the generation it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub generation: u64,
    pub kind: StreamEventKind,
}

/// Write side of a stream: every event carries the request's generation.
///
/// Sends fail silently once the receiver is gone; the return value tells a
/// producer whether to keep going.
#[derive(Debug, Clone)]
pub struct StreamSink {
    generation: u64,
    tx: UnboundedSender<StreamEvent>,
}

impl StreamSink {
    pub fn new(generation: u64, tx: UnboundedSender<StreamEvent>) -> Self {
        Self { generation, tx }
    }

    fn send(&self, kind: StreamEventKind) -> bool {
        self.tx
            .send(StreamEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }

    pub fn fragment(&self, text: impl Into<String>, index: usize, total: Option<usize>) -> bool {
        self.send(StreamEventKind::Fragment {
            text: text.into(),
            index,
            total,
        })
    }

    pub fn complete(&self, final_text: impl Into<String>) -> bool {
        self.send(StreamEventKind::Complete {
            final_text: final_text.into(),
        })
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.send(StreamEventKind::Failed {
            message: message.into(),
        })
    }
}

/// BYOT stream chunk; tolerant of vendor extras such as `reasoning_content`.
#[derive(Debug, Deserialize)]
pub(super) struct ByotChatCompletionStreamResponse {
    #[serde(default)]
    pub(super) choices: Vec<ByotChatChoiceStream>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ByotChatChoiceStream {
    pub(super) delta: ByotChatCompletionStreamDelta,
    pub(super) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ByotChatCompletionStreamDelta {
    pub(super) content: Option<String>,
}
