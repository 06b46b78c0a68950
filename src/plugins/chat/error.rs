use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatError {
    Configuration { message: String },
    Transport { message: String },
    NotFound { message: String },
    InvalidInput { message: String },
    Internal { message: String },
}

impl ChatError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message }
            | Self::Transport { message }
            | Self::NotFound { message }
            | Self::InvalidInput { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<async_openai::error::OpenAIError> for ChatError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::transport(err.to_string())
    }
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "Configuration: {}", message),
            Self::Transport { message } => write!(f, "Transport: {}", message),
            Self::NotFound { message } => write!(f, "NotFound: {}", message),
            Self::InvalidInput { message } => write!(f, "InvalidInput: {}", message),
            Self::Internal { message } => write!(f, "Internal: {}", message),
        }
    }
}

impl std::error::Error for ChatError {}
