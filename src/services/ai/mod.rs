//! Model collaborator for OpenAI-compatible chat completions.
//!
//! Notes:
//! - We use `async-openai` for its HTTP client and stream handling.
//! - Vendors (DeepSeek/Gemini/OpenRouter/etc.) add fields to streaming deltas,
//!   so requests go through async-openai's `byot` ("bring your own types")
//!   methods with tolerant response types.

mod collaborator;
mod manager;
mod retry_policy;
mod stream;
mod types;

pub use collaborator::StreamingCollaborator;
pub use manager::OpenAiCollaborator;
pub use types::{
    ContextMessage, ContextRole, StreamEvent, StreamEventKind, StreamRequest, StreamSink,
};
