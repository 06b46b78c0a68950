//! In-memory chat sessions and the streaming lifecycle of assistant replies.
//!
//! Nothing here is persisted; selecting a session starts it over from the greeting.

mod buffer;
mod controller;
mod error;
mod metadata;
mod title;
mod types;

pub use buffer::{StreamingBuffer, StreamingState};
pub use controller::{ChatController, EventOutcome, SendOutcome};
pub use error::ChatError;
pub use metadata::{LegalCategory, extract_legal_categories, extract_legal_sources};
pub use title::{derive_preview, derive_title};
pub use types::{Author, CategoryCount, ChatAnalytics, ChatSession, Message, ResponseMetadata};
