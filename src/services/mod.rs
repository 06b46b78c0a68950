pub mod ai;
pub mod config;
pub mod prompts;
pub mod retry;
