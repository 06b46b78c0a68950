//! Shared configuration loading for the model collaborator and chat core.
//!
//! Secrets never leave `AiConfig`; `AiPublicConfig` is safe to display.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    DeepSeek,
    Gemini,
    Compatible,
}

impl AiProvider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "deepseek" => Some(Self::DeepSeek),
            "gemini" | "google" => Some(Self::Gemini),
            "compatible" | "openai-compatible" | "openai_compatible" => Some(Self::Compatible),
            _ => None,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAI | Self::Compatible => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI | Self::Compatible => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Gemini => "gemini-1.5-flash",
        }
    }
}

/// AI configuration for OpenAI-compatible endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::OpenAI,
            base_url: AiProvider::OpenAI.default_base_url().to_string(),
            api_key: String::new(),
            model: AiProvider::OpenAI.default_model().to_string(),
        }
    }
}

impl AiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Build from a key lookup; the first non-empty key of each list wins.
    ///
    /// Reads:
    /// - `AI_BASE_URL` (fallback: `LLM_BASE_URL`)
    /// - `AI_PROVIDER` (fallback: `LLM_PROVIDER`)
    /// - `AI_API_KEY` (fallback: `GEMINI_API_KEY`, `OPENAI_API_KEY`, `LLM_API_KEY`)
    /// - `AI_MODEL` (fallback: `LLM_MODEL`)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let explicit_provider =
            first(&["AI_PROVIDER", "LLM_PROVIDER"]).and_then(|p| AiProvider::parse(&p));
        let api_key = first(&["AI_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY", "LLM_API_KEY"])
            .unwrap_or_default();

        let base_url = match first(&["AI_BASE_URL", "LLM_BASE_URL"]) {
            Some(url) => url,
            None => {
                // A bare Gemini key with no endpoint selects Google's compatible endpoint.
                let provider = explicit_provider.unwrap_or_else(|| {
                    if lookup("GEMINI_API_KEY").is_some_and(|k| !k.trim().is_empty())
                        && first(&["AI_API_KEY"]).is_none()
                    {
                        AiProvider::Gemini
                    } else {
                        AiProvider::OpenAI
                    }
                });
                provider.default_base_url().to_string()
            }
        };

        let provider = explicit_provider.unwrap_or_else(|| infer_provider(&base_url));
        let model = first(&["AI_MODEL", "LLM_MODEL"])
            .unwrap_or_else(|| provider.default_model().to_string());

        Self {
            provider,
            base_url: normalize_api_base(provider, &base_url),
            api_key,
            model,
        }
    }

    pub fn public(&self) -> AiPublicConfig {
        AiPublicConfig {
            provider: self.provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            has_api_key: self.has_api_key(),
        }
    }
}

fn infer_provider(base_url: &str) -> AiProvider {
    let base = base_url.trim().to_ascii_lowercase();
    if base.contains("api.deepseek.com") {
        return AiProvider::DeepSeek;
    }
    if base.contains("generativelanguage.googleapis.com") {
        return AiProvider::Gemini;
    }
    if base.contains("api.openai.com") {
        return AiProvider::OpenAI;
    }
    AiProvider::Compatible
}

fn normalize_api_base(provider: AiProvider, base_url: &str) -> String {
    let mut base = base_url.trim().trim_end_matches('/').to_string();

    match provider {
        AiProvider::OpenAI => {
            if !base.ends_with("/v1") {
                base.push_str("/v1");
            }
        }
        AiProvider::DeepSeek => {
            if base.ends_with("/v1") {
                base.truncate(base.len().saturating_sub(3));
            }
        }
        AiProvider::Gemini => {
            if !base.ends_with("/openai") {
                base.push_str("/openai");
            }
        }
        AiProvider::Compatible => {}
    }

    base
}

/// Load AI configuration from `.env`/environment.
pub fn load_ai_config() -> AiConfig {
    let _ = dotenvy::dotenv();
    AiConfig::from_lookup(|key| std::env::var(key).ok())
}

/// Public AI configuration (secrets omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPublicConfig {
    pub provider: AiProvider,
    pub base_url: String,
    pub model: String,
    pub has_api_key: bool,
}

/// How the collaborator delivers a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Forward streaming deltas as they arrive; total unknown.
    #[default]
    Chunks,
    /// Fetch the full answer, then replay it one character at a time.
    Typewriter,
}

/// Chat core tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub title_max_chars: usize,
    /// `None` disables stall detection.
    pub stall_timeout: Option<Duration>,
    pub stream_mode: StreamMode,
    pub typewriter_delay: Duration,
    /// Past messages sent with each request.
    pub context_messages: usize,
    /// Past messages kept by the collaborator.
    pub cache_messages: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_max_chars: 50,
            stall_timeout: Some(Duration::from_secs(90)),
            stream_mode: StreamMode::Chunks,
            typewriter_delay: Duration::from_millis(20),
            context_messages: 6,
            cache_messages: 12,
        }
    }
}

impl ChatConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let num = |key: &str, default: u64, min: u64, max: u64| {
            u64_clamped(lookup(key).as_deref(), default, min, max)
        };

        let stall_secs = num("LAWBUDDY_STALL_TIMEOUT_SECS", 90, 0, 3_600);
        let stream_mode = match lookup("LAWBUDDY_STREAM_MODE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "typewriter" | "char" | "chars" => StreamMode::Typewriter,
            _ => StreamMode::Chunks,
        };

        Self {
            title_max_chars: defaults.title_max_chars,
            stall_timeout: (stall_secs > 0).then(|| Duration::from_secs(stall_secs)),
            stream_mode,
            typewriter_delay: Duration::from_millis(num(
                "LAWBUDDY_TYPEWRITER_DELAY_MS",
                defaults.typewriter_delay.as_millis() as u64,
                0,
                1_000,
            )),
            context_messages: defaults.context_messages,
            cache_messages: defaults.cache_messages,
        }
    }

    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn u64_clamped(raw: Option<&str>, default: u64, min: u64, max: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

pub(crate) fn env_u64_clamped(key: &str, default: u64, min: u64, max: u64) -> u64 {
    u64_clamped(std::env::var(key).ok().as_deref(), default, min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_infer_provider() {
        assert_eq!(infer_provider("https://api.deepseek.com"), AiProvider::DeepSeek);
        assert_eq!(
            infer_provider("https://api.deepseek.com/beta"),
            AiProvider::DeepSeek
        );
        assert_eq!(infer_provider("https://api.openai.com/v1"), AiProvider::OpenAI);
        assert_eq!(
            infer_provider("https://generativelanguage.googleapis.com/v1beta/openai/"),
            AiProvider::Gemini
        );
        assert_eq!(infer_provider("https://unknown.com/v1"), AiProvider::Compatible);
    }

    #[test]
    fn test_normalize_api_base() {
        assert_eq!(
            normalize_api_base(AiProvider::OpenAI, "https://api.openai.com"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_api_base(AiProvider::DeepSeek, "https://api.deepseek.com/v1"),
            "https://api.deepseek.com"
        );
        assert_eq!(
            normalize_api_base(
                AiProvider::Gemini,
                "https://generativelanguage.googleapis.com/v1beta"
            ),
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
        assert_eq!(
            normalize_api_base(AiProvider::Compatible, "https://other.com/v1/"),
            "https://other.com/v1"
        );
    }

    #[test]
    fn test_empty_environment_is_unconfigured() {
        let config = AiConfig::from_lookup(lookup(&[]));
        assert_eq!(config.provider, AiProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.has_api_key());
        assert!(!config.public().has_api_key);
    }

    #[test]
    fn test_gemini_key_selects_gemini_endpoint() {
        let config = AiConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")]));
        assert_eq!(config.provider, AiProvider::Gemini);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(
            config.base_url,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
        assert!(config.has_api_key());
    }

    #[test]
    fn test_explicit_values_win() {
        let config = AiConfig::from_lookup(lookup(&[
            ("AI_BASE_URL", "https://api.deepseek.com/v1"),
            ("AI_API_KEY", "sk-1"),
            ("OPENAI_API_KEY", "sk-2"),
            ("LLM_MODEL", "deepseek-reasoner"),
        ]));
        assert_eq!(config.provider, AiProvider::DeepSeek);
        assert_eq!(config.base_url, "https://api.deepseek.com");
        assert_eq!(config.api_key, "sk-1");
        assert_eq!(config.model, "deepseek-reasoner");
    }

    #[test]
    fn test_blank_key_is_skipped() {
        let config =
            AiConfig::from_lookup(lookup(&[("AI_API_KEY", "  "), ("OPENAI_API_KEY", "sk-2")]));
        assert_eq!(config.api_key, "sk-2");
    }

    #[test]
    fn test_chat_config_defaults_and_overrides() {
        assert_eq!(ChatConfig::from_lookup(lookup(&[])), ChatConfig::default());

        let config = ChatConfig::from_lookup(lookup(&[
            ("LAWBUDDY_STALL_TIMEOUT_SECS", "0"),
            ("LAWBUDDY_STREAM_MODE", "Typewriter"),
            ("LAWBUDDY_TYPEWRITER_DELAY_MS", "99999"),
        ]));
        assert_eq!(config.stall_timeout, None);
        assert_eq!(config.stream_mode, StreamMode::Typewriter);
        assert_eq!(config.typewriter_delay, Duration::from_millis(1_000));
    }
}
