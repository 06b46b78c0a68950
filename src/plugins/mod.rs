//! Internal sub-systems with a stable boundary.
//!
//! `formatter` is pure text processing; `chat` owns session state and drives
//! the formatter as responses stream in.

pub mod chat;
pub mod formatter;
