//! Base trait for LLM providers

use async_trait::async_trait;
use kyros_core::session::Turn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for provider operations
///
/// Each failure mode is distinct so callers can decide retry vs abort.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network failure or request timeout. Retryable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credential rejected (401/403). Every further request will fail the same way.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Provider asked us to back off (429).
    #[error("Rate limited{}", .retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimit {
        /// Server-suggested wait in seconds, from the Retry-After header
        retry_after: Option<u64>,
    },

    /// Response body did not contain a usable completion.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Other non-success API status
    #[error("API error: {0}")]
    Api(String),

    /// Client-side configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether retrying the same request can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_) | ProviderError::RateLimit { .. }
        )
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A message in wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.text.clone(),
        }
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

/// A generated completion
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Why generation stopped
    pub finish_reason: String,
    /// Token usage, when reported
    pub usage: Usage,
}

/// Trait for LLM providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for an ordered message history.
    ///
    /// Blocks the caller for the network round-trip; the implementation
    /// holds no per-conversation state.
    async fn generate(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> ProviderResult<Completion>;

    /// Get the default model for this provider
    fn default_model(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyros_core::session::Session;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Transport("timeout".into()).is_retryable());
        assert!(ProviderError::RateLimit { retry_after: None }.is_retryable());
        assert!(!ProviderError::Auth("bad key".into()).is_retryable());
        assert!(!ProviderError::MalformedResponse("empty".into()).is_retryable());
        assert!(!ProviderError::Api("HTTP 500".into()).is_retryable());
    }

    #[test]
    fn test_message_from_turn() {
        let mut session = Session::new("persona");
        session.push_user("hello");

        let messages: Vec<Message> = session.turns().iter().map(Message::from).collect();
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_rate_limit_display_includes_hint() {
        let err = ProviderError::RateLimit {
            retry_after: Some(30),
        };
        assert!(err.to_string().contains("30"));
    }
}
