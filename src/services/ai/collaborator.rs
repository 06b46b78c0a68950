use crate::plugins::chat::ChatError;

use super::types::{StreamRequest, StreamSink};

/// The remote model, seen from the chat core.
///
/// `send_streaming_request` must return quickly: it either rejects the request
/// synchronously or arranges for zero or more `fragment` events followed by
/// exactly one `complete` or `fail` on `sink`.
pub trait StreamingCollaborator {
    fn is_configured(&self) -> bool;

    /// Forget remembered conversation context.
    fn reset_conversation(&self);

    fn send_streaming_request(
        &self,
        request: StreamRequest,
        sink: StreamSink,
    ) -> Result<(), ChatError>;
}
