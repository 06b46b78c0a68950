//! Accumulates one in-flight response and keeps a rendered snapshot of it.

use std::time::Duration;

use tokio::time::Instant;

use crate::plugins::formatter::{DisplayNode, render_document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingState {
    pub message_id: String,
    pub generation: u64,
    pub accumulated: String,
    pub fragments_received: usize,
    pub fragments_expected: Option<usize>,
    pub progress_percent: u8,
    pub started_at: Instant,
    pub last_activity: Instant,
}

/// Idle when `state` is `None`.
#[derive(Debug, Default)]
pub struct StreamingBuffer {
    generation: u64,
    state: Option<StreamingState>,
    rendered: Vec<DisplayNode>,
}

fn progress(index: usize, total: Option<usize>) -> u8 {
    match total {
        Some(total) if total > 0 => ((index + 1).saturating_mul(100) / total).min(100) as u8,
        _ => 0,
    }
}

impl StreamingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&StreamingState> {
        self.state.as_ref()
    }

    /// Display tree of the accumulated text; empty when idle.
    pub fn rendered(&self) -> &[DisplayNode] {
        &self.rendered
    }

    /// Whether events tagged `generation` belong to the live stream.
    pub fn is_current(&self, generation: u64) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.generation == generation)
    }

    /// Start a stream, abandoning any previous one. Returns its generation.
    pub fn begin(
        &mut self,
        message_id: impl Into<String>,
        expected: Option<usize>,
        now: Instant,
    ) -> u64 {
        self.generation += 1;
        self.rendered.clear();
        self.state = Some(StreamingState {
            message_id: message_id.into(),
            generation: self.generation,
            accumulated: String::new(),
            fragments_received: 0,
            fragments_expected: expected,
            progress_percent: 0,
            started_at: now,
            last_activity: now,
        });
        self.generation
    }

    /// Append a fragment and re-render. Stale fragments are dropped untouched.
    pub fn apply_fragment(
        &mut self,
        generation: u64,
        text: &str,
        index: usize,
        total: Option<usize>,
        now: Instant,
    ) -> bool {
        let Some(state) = self.state.as_mut().filter(|s| s.generation == generation) else {
            log::debug!("dropping stale fragment for generation {}", generation);
            return false;
        };

        state.accumulated.push_str(text);
        state.fragments_received += 1;
        if total.is_some() {
            state.fragments_expected = total;
        }
        state.progress_percent = progress(index, state.fragments_expected);
        state.last_activity = now;
        self.rendered = render_document(&state.accumulated);
        true
    }

    fn finish(&mut self, generation: u64) -> Option<StreamingState> {
        if !self.is_current(generation) {
            return None;
        }
        self.rendered.clear();
        self.state.take()
    }

    /// End the stream successfully, handing back its final state.
    pub fn complete(&mut self, generation: u64) -> Option<StreamingState> {
        self.finish(generation)
    }

    /// End the stream on error; the caller substitutes the fallback text.
    pub fn fail(&mut self, generation: u64) -> Option<StreamingState> {
        self.finish(generation)
    }

    /// Drop the live stream; anything still in flight for it becomes stale.
    pub fn abandon(&mut self) -> Option<StreamingState> {
        self.generation += 1;
        self.rendered.clear();
        self.state.take()
    }

    /// True when the live stream has been silent for at least `timeout`.
    pub fn stalled(&self, now: Instant, timeout: Duration) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| now.saturating_duration_since(state.last_activity) >= timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::formatter::{InlineNode, SpanKind};

    #[test]
    fn test_scenario_c_fragments() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let generation = buffer.begin("m1", None, now);

        for (i, fragment) in ["Pay ", "₹500", " fine."].iter().enumerate() {
            assert!(buffer.apply_fragment(generation, fragment, i, None, now));
        }

        let state = buffer.state().expect("streaming");
        assert_eq!(state.accumulated, "Pay ₹500 fine.");
        assert_eq!(state.fragments_received, 3);
        assert_eq!(state.progress_percent, 0);
        assert_eq!(
            buffer.rendered(),
            &[DisplayNode::Paragraph {
                content: vec![
                    InlineNode::text("Pay "),
                    InlineNode::Span {
                        kind: SpanKind::Amount,
                        children: vec![InlineNode::text("₹500")],
                    },
                    InlineNode::text(" fine."),
                ],
            }]
        );
    }

    #[test]
    fn test_progress_with_known_total() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let generation = buffer.begin("m1", None, now);

        buffer.apply_fragment(generation, "a", 0, Some(4), now);
        assert_eq!(buffer.state().map(|s| s.progress_percent), Some(25));
        assert_eq!(buffer.state().and_then(|s| s.fragments_expected), Some(4));

        buffer.apply_fragment(generation, "b", 1, None, now);
        assert_eq!(buffer.state().map(|s| s.progress_percent), Some(50));

        buffer.apply_fragment(generation, "cde", 9, Some(4), now);
        assert_eq!(buffer.state().map(|s| s.progress_percent), Some(100));
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let old = buffer.begin("m1", None, now);
        buffer.apply_fragment(old, "old ", 0, None, now);
        assert!(buffer.abandon().is_some());

        let current = buffer.begin("m2", None, now);
        assert_ne!(old, current);
        assert!(!buffer.apply_fragment(old, "late", 1, None, now));
        assert!(buffer.complete(old).is_none());

        let state = buffer.state().expect("streaming");
        assert_eq!(state.message_id, "m2");
        assert!(state.accumulated.is_empty());
    }

    #[test]
    fn test_abandon_invalidates_without_new_stream() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let generation = buffer.begin("m1", None, now);
        buffer.abandon();
        assert!(!buffer.is_streaming());
        assert!(!buffer.apply_fragment(generation, "x", 0, None, now));
        assert!(buffer.rendered().is_empty());
    }

    #[test]
    fn test_split_marker_resolves_when_closed() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let generation = buffer.begin("m1", None, now);

        buffer.apply_fragment(generation, "**What is a chal", 0, None, now);
        assert!(matches!(
            buffer.rendered(),
            [DisplayNode::Paragraph { .. }]
        ));

        buffer.apply_fragment(generation, "lan?**", 1, None, now);
        assert!(matches!(buffer.rendered(), [DisplayNode::Header { .. }]));
    }

    #[test]
    fn test_complete_returns_state_and_goes_idle() {
        let now = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let generation = buffer.begin("m1", Some(2), now);
        buffer.apply_fragment(generation, "Hi", 0, None, now);

        let state = buffer.complete(generation).expect("state");
        assert_eq!(state.accumulated, "Hi");
        assert_eq!(state.fragments_expected, Some(2));
        assert!(!buffer.is_streaming());
        assert!(buffer.rendered().is_empty());
    }

    #[test]
    fn test_stalled() {
        let start = Instant::now();
        let mut buffer = StreamingBuffer::new();
        let timeout = Duration::from_secs(90);
        assert!(!buffer.stalled(start + timeout, timeout));

        let generation = buffer.begin("m1", None, start);
        assert!(!buffer.stalled(start + Duration::from_secs(89), timeout));

        let later = start + Duration::from_secs(60);
        buffer.apply_fragment(generation, "x", 0, None, later);
        assert!(!buffer.stalled(start + timeout, timeout));
        assert!(buffer.stalled(later + timeout, timeout));
    }
}
