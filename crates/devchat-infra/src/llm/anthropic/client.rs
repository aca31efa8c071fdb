//! AnthropicProvider -- concrete [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends streaming requests to the Anthropic Messages API (`/v1/messages`)
//! with proper authentication headers.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use devchat_core::llm::provider::{LlmEventStream, LlmProvider};
use devchat_observe::genai_attrs::{OP_CHAT, PROVIDER_ANTHROPIC};
use devchat_types::llm::{CompletionRequest, LlmError, ProviderCapabilities};

use super::streaming::create_anthropic_stream;
use super::types::{AnthropicMessage, AnthropicRequest, AnthropicTool};

/// Anthropic Claude LLM provider.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. It never appears in Debug output,
/// Display output, or tracing logs.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Public API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Create a new Anthropic provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key wrapped in SecretString
    /// * `model` - Model identifier (e.g., "claude-3-sonnet-20240229")
    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let capabilities = Self::capabilities_for_model(&model);

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
            capabilities,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Determine capabilities based on model name.
    fn capabilities_for_model(model: &str) -> ProviderCapabilities {
        let (max_output_tokens, extended_thinking) = if model.starts_with("claude-3-")
            && !model.starts_with("claude-3-5")
            && !model.starts_with("claude-3-7")
        {
            (4_096, false)
        } else if model.contains("opus") {
            (32_000, true)
        } else if model.contains("sonnet") || model.contains("haiku") {
            (8_192, false)
        } else {
            // Conservative defaults for unknown models
            (4_096, false)
        };

        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
            vision: true,
            extended_thinking,
            max_context_tokens: 200_000,
            max_output_tokens,
        }
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        AnthropicRequest {
            model,
            max_tokens: request.max_tokens,
            messages,
            system: request.system.clone(),
            stream: true,
            temperature: request.temperature,
            tools: request.tools.iter().map(AnthropicTool::from).collect(),
        }
    }
}

// AnthropicProvider intentionally does NOT derive Debug. The SecretString
// field never prints the key, and the struct carries nothing else worth
// printing.

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_ANTHROPIC
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn stream(&self, request: CompletionRequest) -> LlmEventStream {
        let body = self.to_anthropic_request(&request);
        tracing::debug!(
            gen_ai.operation.name = OP_CHAT,
            gen_ai.request.model = %body.model,
            gen_ai.request.max_tokens = body.max_tokens,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "sending Anthropic streaming request"
        );

        let builder = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        create_anthropic_stream(builder)
    }
}
