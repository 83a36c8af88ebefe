//! Error types for the RoboForge generation pipeline

use thiserror::Error;

/// Fixed diagnostic returned by the gateway when no upstream credential is configured.
pub const MISSING_API_KEY_MESSAGE: &str = "API_KEY not configured on server";

/// Result type alias for generation operations
pub type ForgeResult<T> = Result<T, GenerationError>;

/// Errors raised while generating a robot design.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Backend has no upstream credential. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure or non-success HTTP status.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Upstream content could not be decoded into a design. `raw` is for logs only.
    #[error("Invalid response from design service")]
    ResponseFormat { raw: String },

    /// Transport succeeded but no usable payload came back.
    #[error("Upstream returned no usable payload: {0}")]
    UpstreamEmpty(String),

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("A generation is already in flight")]
    Busy,
}

impl GenerationError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        GenerationError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Text shown inline next to the prompt input. Never includes raw upstream output.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(msg) => msg.clone(),
            GenerationError::Transport { message, .. } => message.clone(),
            GenerationError::ResponseFormat { .. } => {
                "The design service returned an invalid response. Please try again.".to_string()
            }
            GenerationError::UpstreamEmpty(_) => {
                "The design service returned an empty response. Please try again.".to_string()
            }
            GenerationError::EmptyPrompt => "Describe the robot you want to build first.".to_string(),
            GenerationError::Busy => "A design is already being generated.".to_string(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_format_hides_raw_text() {
        let err = GenerationError::ResponseFormat {
            raw: "secret upstream prose".to_string(),
        };
        assert!(!err.user_message().contains("secret"));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn transport_message_is_verbatim() {
        let err = GenerationError::transport(Some(502), "Server Error (502): bad gateway");
        assert_eq!(err.user_message(), "Server Error (502): bad gateway");
    }
}
