//! Response formatter: a small heuristic grammar for the assistant's output
//! conventions (bold headers, `*` bullets, numbered steps, disclaimers).
//!
//! The pipeline is stateless and always re-runs over the whole text:
//! segments → [`classify`] → [`parse_block`] → [`render_block`].

mod classify;
mod inline;
mod render;

pub use classify::{
    Block, BlockKind, HeaderIcon, NumberedItem, blocks, classify, parse_block, segments,
};
pub use inline::{
    InlineNode, SpanKind, format_inline, format_nodes, has_resolved_strong, parse_markup,
    plain_text,
};
pub use render::{DisplayNode, NumberedLine, render_block, render_document, render_plain};
