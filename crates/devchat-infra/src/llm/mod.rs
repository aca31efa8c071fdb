//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait
//! defined in `devchat-core` for Anthropic Claude, plus a factory that
//! builds it from configuration.
//!
//! [`LlmProvider`]: devchat_core::llm::provider::LlmProvider

pub mod anthropic;

use secrecy::SecretString;

use devchat_core::llm::box_provider::BoxLlmProvider;
use devchat_types::config::AnthropicConfig;
use devchat_types::llm::LlmError;

use self::anthropic::AnthropicProvider;

/// Create a [`BoxLlmProvider`] for `model` from the `[anthropic]` section.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] for an empty key, or a
/// provider error if the HTTP client cannot be built.
pub fn create_provider(
    config: &AnthropicConfig,
    model: &str,
    api_key: &str,
) -> Result<BoxLlmProvider, LlmError> {
    if api_key.trim().is_empty() {
        return Err(LlmError::AuthenticationFailed);
    }
    let secret = SecretString::from(api_key.trim().to_string());
    let provider =
        AnthropicProvider::new(secret, model.to_string())?.with_base_url(config.base_url.clone());
    Ok(BoxLlmProvider::new(provider))
}
