use async_openai::error::OpenAIError;

pub(super) fn should_retry_openai_error(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::Reqwest(e) => e.is_timeout() || e.is_connect(),
        OpenAIError::StreamError(_) => true,
        OpenAIError::JSONDeserialize(_, _) => true,
        OpenAIError::ApiError(api) => is_transient_api_error(
            &api.message,
            api.code.as_deref(),
            api.r#type.as_deref(),
        ),
        _ => false,
    }
}

/// Rate limits, overloads and upstream timeouts; Gemini reports these as
/// `RESOURCE_EXHAUSTED` / `UNAVAILABLE`.
fn is_transient_api_error(message: &str, code: Option<&str>, ty: Option<&str>) -> bool {
    let msg = message.to_ascii_lowercase();
    let code = code.unwrap_or("").to_ascii_lowercase();
    let ty = ty.unwrap_or("").to_ascii_lowercase();

    msg.contains("rate limit")
        || msg.contains("too many")
        || msg.contains("429")
        || msg.contains("503")
        || msg.contains("overload")
        || msg.contains("temporarily")
        || msg.contains("timeout")
        || msg.contains("resource_exhausted")
        || msg.contains("unavailable")
        || code.contains("rate")
        || code.contains("timeout")
        || code.contains("overload")
        || ty.contains("rate")
        || ty.contains("timeout")
}
