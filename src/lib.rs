//! LawBuddy chat core: a streaming response formatter plus the session
//! state machine that feeds it.

pub mod plugins;
pub mod services;
