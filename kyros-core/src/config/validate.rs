//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
///
/// A missing provider credential is treated as fatal here so the process
/// can refuse to start before any session exists.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.provider.api_key.trim().is_empty() {
        errors.push(
            "provider.api_key is required (set it in config.json or via KYROS_API_KEY)"
                .to_string(),
        );
    }
    if config.provider.api_base.trim().is_empty() {
        errors.push("provider.api_base must not be empty".to_string());
    }
    if config.provider.timeout_secs == 0 {
        errors.push("provider.timeout_secs must be > 0".to_string());
    }
    if config.provider.retry.max_attempts == 0 {
        errors.push("provider.retry.max_attempts must be >= 1".to_string());
    }
    if config.provider.retry.base_delay_ms > config.provider.retry.max_delay_ms {
        errors.push("provider.retry.base_delay_ms must be <= max_delay_ms".to_string());
    }

    if config.counselor.persona.trim().is_empty() {
        errors.push("counselor.persona must not be empty".to_string());
    }
    if config.counselor.model.trim().is_empty() {
        errors.push("counselor.model must not be empty".to_string());
    }
    if config.counselor.max_tokens == 0 {
        errors.push("counselor.max_tokens must be > 0".to_string());
    }
    if !(0.0..=2.0).contains(&config.counselor.temperature) {
        errors.push("counselor.temperature must be in [0.0, 2.0]".to_string());
    }

    if config.context.max_prompt_chars == 0 {
        errors.push("context.max_prompt_chars must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
