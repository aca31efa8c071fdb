//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement. The
//! `stream` method returns `Pin<Box<dyn Stream>>` so the trait stays usable
//! behind the `BoxLlmProvider` wrapper.

use std::pin::Pin;

use futures_util::Stream;

use devchat_types::llm::{CompletionRequest, LlmError, ProviderCapabilities, StreamEvent};

/// Boxed stream of provider events.
pub type LlmEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for LLM provider backends.
///
/// Implementations live in devchat-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic").
    fn name(&self) -> &str;

    /// What this provider supports (streaming, tool calling, etc.).
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a streaming completion request. Returns a stream of events.
    fn stream(&self, request: CompletionRequest) -> LlmEventStream;
}
