//! LLM provider integrations for kyros
//!
//! Defines the `CompletionProvider` trait the counselor loop talks to,
//! an OpenAI-compatible HTTP client, and a retry/backoff adapter.

pub mod base;
pub mod openai;
pub mod retry;

pub use base::{Completion, CompletionProvider, Message, ProviderError, ProviderResult, Usage};
pub use openai::OpenAiClient;
pub use retry::{RetryPolicy, RetryingProvider};
