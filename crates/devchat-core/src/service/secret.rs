//! Secret management service.
//!
//! SecretService resolves secrets through a chain of providers in priority
//! order. Resolution precedence: process env vars > env file.
//!
//! This service lives in `devchat-core` and depends only on `devchat-types`
//! and the `DynSecretProvider` abstraction -- never on concrete infra
//! implementations.

use std::future::Future;

use tracing::{debug, info};

use devchat_types::error::SecretError;
use devchat_types::secret::{Redacted, SecretKey};

use crate::repository::secret::DynSecretProvider;

/// Interactive source for a secret the provider chain does not have.
pub trait SecretPrompt: Send + Sync {
    /// Ask the operator for `key` and return what they entered.
    fn prompt(&self, key: &str) -> impl Future<Output = Result<String, SecretError>> + Send;
}

/// Where a resolved secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOrigin {
    /// Found in one of the providers.
    Stored,
    /// Entered at the prompt and persisted during this call.
    Entered,
}

/// A secret value together with its origin.
#[derive(Debug, Clone)]
pub struct ResolvedSecret {
    pub value: Redacted,
    pub origin: SecretOrigin,
}

/// Service for managing secrets across multiple storage backends.
///
/// Providers are ordered by precedence (first match wins).
/// Default chain: `[EnvSecretProvider, DotenvSecretProvider]`
pub struct SecretService {
    providers: Vec<DynSecretProvider>,
}

impl SecretService {
    /// Create a new SecretService with the given provider chain.
    ///
    /// Providers should be ordered by precedence (highest priority first).
    pub fn new(providers: Vec<DynSecretProvider>) -> Self {
        Self { providers }
    }

    /// Resolve a secret value by iterating through providers in priority order.
    pub async fn get_secret(&self, key: &str) -> Result<Option<String>, SecretError> {
        for provider in &self.providers {
            if let Some(value) = provider.get_boxed(key).await? {
                debug!(key, provider = provider.name(), "secret resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Store a secret value in the first writable provider.
    ///
    /// Read-only providers (e.g., env vars) reject the write and are skipped.
    pub async fn set_secret(&self, key: &str, value: &str) -> Result<(), SecretError> {
        if !SecretKey::new(key).is_valid() {
            return Err(SecretError::InvalidKey(key.to_string()));
        }

        for provider in &self.providers {
            match provider.set_boxed(key, value).await {
                Ok(()) => {
                    info!(key, provider = provider.name(), "secret stored");
                    return Ok(());
                }
                Err(SecretError::ReadOnly(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(SecretError::NoWritableProvider)
    }

    /// Resolve `key`, asking `prompt` for it when no provider has it.
    ///
    /// An entered value is persisted through [`set_secret`](Self::set_secret)
    /// and read back through the chain, so the next lookup in this run is
    /// served from storage without prompting again.
    pub async fn get_or_prompt<P: SecretPrompt>(
        &self,
        key: &str,
        prompt: &P,
    ) -> Result<ResolvedSecret, SecretError> {
        if let Some(value) = self.get_secret(key).await? {
            return Ok(ResolvedSecret {
                value: Redacted::new(value),
                origin: SecretOrigin::Stored,
            });
        }

        let entered = prompt.prompt(key).await?;
        let entered = entered.trim();
        if entered.is_empty() {
            return Err(SecretError::Empty(key.to_string()));
        }

        self.set_secret(key, entered).await?;

        let value = self.get_secret(key).await?.ok_or(SecretError::NotFound)?;
        Ok(ResolvedSecret {
            value: Redacted::new(value),
            origin: SecretOrigin::Entered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::secret::SecretProvider;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Mock providers for testing ---

    /// A mock provider backed by a map; counts writes.
    struct MockProvider {
        name: &'static str,
        values: Mutex<HashMap<String, String>>,
        writable: bool,
        writes: AtomicUsize,
    }

    impl MockProvider {
        fn new(name: &'static str, writable: bool) -> Self {
            Self {
                name,
                values: Mutex::new(HashMap::new()),
                writable,
                writes: AtomicUsize::new(0),
            }
        }

        fn with_value(self, key: &str, value: &str) -> Self {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            self
        }
    }

    impl SecretProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
            if !self.writable {
                return Err(SecretError::ReadOnly(self.name));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

    }

    /// A prompt that returns a fixed answer and counts how often it was asked.
    struct CountingPrompt {
        answer: String,
        calls: AtomicUsize,
    }

    impl CountingPrompt {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SecretPrompt for CountingPrompt {
        async fn prompt(&self, _key: &str) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_precedence_env_over_file() {
        let env = MockProvider::new("env", false).with_value("API_KEY", "env-value");
        let file = MockProvider::new("file", true).with_value("API_KEY", "file-value");

        let service = SecretService::new(vec![Arc::new(env), Arc::new(file)]);

        let result = service.get_secret("API_KEY").await.unwrap();
        assert_eq!(result, Some("env-value".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_to_file_when_env_missing() {
        let env = MockProvider::new("env", false);
        let file = MockProvider::new("file", true).with_value("API_KEY", "file-value");

        let service = SecretService::new(vec![Arc::new(env), Arc::new(file)]);

        let result = service.get_secret("API_KEY").await.unwrap();
        assert_eq!(result, Some("file-value".to_string()));
    }

    #[tokio::test]
    async fn test_set_skips_readonly_provider() {
        let env = Arc::new(MockProvider::new("env", false));
        let file = Arc::new(MockProvider::new("file", true));

        let providers: Vec<DynSecretProvider> = vec![env, file.clone()];
        let service = SecretService::new(providers);
        service.set_secret("NEW_KEY", "value").await.unwrap();

        assert_eq!(file.writes.load(Ordering::SeqCst), 1);
        assert_eq!(service.get_secret("NEW_KEY").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_set_fails_when_no_writable_provider() {
        let service = SecretService::new(vec![Arc::new(MockProvider::new("env", false))]);
        let result = service.set_secret("KEY", "value").await;
        assert!(matches!(result, Err(SecretError::NoWritableProvider)));
    }

    #[tokio::test]
    async fn test_set_rejects_invalid_key() {
        let service = SecretService::new(vec![Arc::new(MockProvider::new("file", true))]);
        let result = service.set_secret("BAD KEY", "value").await;
        assert!(matches!(result, Err(SecretError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_get_or_prompt_uses_stored_value_without_prompting() {
        let file = MockProvider::new("file", true).with_value("ANTHROPIC_API_KEY", "sk-stored");
        let service = SecretService::new(vec![Arc::new(file)]);
        let prompt = CountingPrompt::answering("sk-typed");

        let resolved = service.get_or_prompt("ANTHROPIC_API_KEY", &prompt).await.unwrap();

        assert_eq!(resolved.value.expose(), "sk-stored");
        assert_eq!(resolved.origin, SecretOrigin::Stored);
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_or_prompt_prompts_once_and_persists() {
        let env = Arc::new(MockProvider::new("env", false));
        let file = Arc::new(MockProvider::new("file", true));
        let providers: Vec<DynSecretProvider> = vec![env, file.clone()];
        let service = SecretService::new(providers);
        let prompt = CountingPrompt::answering("  sk-typed  ");

        let first = service.get_or_prompt("ANTHROPIC_API_KEY", &prompt).await.unwrap();
        assert_eq!(first.value.expose(), "sk-typed");
        assert_eq!(first.origin, SecretOrigin::Entered);

        let second = service.get_or_prompt("ANTHROPIC_API_KEY", &prompt).await.unwrap();
        assert_eq!(second.value.expose(), "sk-typed");
        assert_eq!(second.origin, SecretOrigin::Stored);

        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
        assert_eq!(file.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_prompt_rejects_empty_answer() {
        let file = Arc::new(MockProvider::new("file", true));
        let providers: Vec<DynSecretProvider> = vec![file.clone()];
        let service = SecretService::new(providers);
        let prompt = CountingPrompt::answering("   ");

        let result = service.get_or_prompt("ANTHROPIC_API_KEY", &prompt).await;

        assert!(matches!(result, Err(SecretError::Empty(_))));
        assert_eq!(file.writes.load(Ordering::SeqCst), 0);
    }
}
