//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default persona instruction for the counselor.
///
/// Exposed so the CLI and tests can tell whether the user customized it.
pub const DEFAULT_PERSONA: &str = "You are KYROS, a compassionate and knowledgeable AI college \
counselor available 24/7. You help students with college admissions, applications, and planning. \
Provide thoughtful, empathetic, and helpful guidance, and ensure that your responses are \
supportive and promote well-being.";

/// Root configuration for kyros
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Counselor behavior
    #[serde(default)]
    pub counselor: CounselorConfig,
    /// LLM provider connection
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Context window policy
    #[serde(default)]
    pub context: ContextConfig,
    /// Category routing
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Counselor behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounselorConfig {
    /// Persona instruction sent as the system turn
    #[serde(default = "default_persona")]
    pub persona: String,
    /// Default model
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for CounselorConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the provider
    #[serde(default)]
    pub api_key: String,
    /// Base URL for the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
    /// Retry policy for retryable provider failures
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            extra_headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per request (1 = no retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Context window policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Character budget for the serialized transcript sent per request
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

fn default_max_prompt_chars() -> usize {
    24_000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

/// Category routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Whether to classify each user message before answering
    #[serde(default = "default_routing_enabled")]
    pub enabled: bool,
    /// Model used for routing; falls back to the counselor model
    #[serde(default)]
    pub model: Option<String>,
}

fn default_routing_enabled() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: default_routing_enabled(),
            model: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
