//! Centralized prompts and fixed assistant messages.
//!
//! The response formatter depends on the output conventions requested here
//! (bold headers, `*` bullets, numbered steps, blank-line separated sections),
//! so edit the two together.

use serde_json::json;

use crate::services::ai::{ContextMessage, ContextRole};

// ============================================================================
// SYSTEM PROMPTS
// ============================================================================

/// Persona and formatting rules for the assistant.
pub const SYSTEM_PROMPT_LAWBUDDY: &str = r#"You are LawBuddy, an AI legal assistant specialising in Indian traffic law and motor vehicle regulations: the Motor Vehicles Act, 1988 and its 2019 amendments, the Central Motor Vehicle Rules, 1989, state traffic rules and court rulings on traffic matters.

You help with driving licences, vehicle registration, fines and penalties, police stops, challans, accidents and insurance.

RESPONSE FORMAT:
1. Start with "Namaste! LawBuddy here." followed by a direct answer.
2. Use section headers in exactly two asterisks, phrased as a question or ending with a colon: **What are the legal requirements?**
3. Use a single asterisk for bullet points: * Point one
4. Use numbers for step-by-step procedures: 1. First step
5. Highlight key terms with two asterisks: **mandatory**, **₹5,000 fine**
6. Reference laws clearly: Section 183 of the Motor Vehicles Act, 1988
7. Separate sections with blank lines.
8. End with a disclaimer recommending a lawyer for specific cases.

Never use ***text*** or ****text****. Be reassuring, non-judgmental and encourage road safety and legal compliance."#;

// ============================================================================
// FIXED ASSISTANT MESSAGES
// ============================================================================

/// First message of every session.
pub const GREETING_MESSAGE: &str = "Namaste! LawBuddy here. Ask me anything about Indian traffic laws: fines, licences, documents, or what to do if the police stop you.";

/// Committed in place of a response whose stream failed.
pub const FALLBACK_ERROR_MESSAGE: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again in a moment.";

/// Shown once when no model credential is available.
pub const NOT_CONFIGURED_MESSAGE: &str = "I apologize, but AI services are currently unavailable. Set AI_API_KEY (or GEMINI_API_KEY / OPENAI_API_KEY) and restart to start chatting.";

/// Committed when a stream completes without any text.
pub const EMPTY_RESPONSE_MESSAGE: &str =
    "I apologize, but I couldn't generate a response. Please try rephrasing your question.";

/// Title used until the first user message arrives.
pub const NEW_CHAT_TITLE: &str = "New chat";

// ============================================================================
// REQUEST BUILDERS
// ============================================================================

/// Build the chat-completions `messages` array: persona, recent context, question.
pub fn build_chat_messages(context: &[ContextMessage], question: &str) -> Vec<serde_json::Value> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(json!({ "role": "system", "content": SYSTEM_PROMPT_LAWBUDDY }));
    for m in context {
        let role = match m.role {
            ContextRole::User => "user",
            ContextRole::Assistant => "assistant",
        };
        messages.push(json!({ "role": role, "content": m.content }));
    }
    messages.push(json!({ "role": "user", "content": question }));
    messages
}
