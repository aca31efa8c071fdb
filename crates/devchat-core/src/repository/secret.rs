//! Secret provider trait definition.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use devchat_types::error::SecretError;

/// Trait for secret storage backends (environment, env file).
///
/// Each provider stores and retrieves secret values. `SecretService`
/// chains multiple providers in priority order.
pub trait SecretProvider: Send + Sync {
    /// Short provider label used in logs and errors.
    fn name(&self) -> &'static str;

    /// Retrieve a secret value by key.
    /// Returns None if the secret does not exist in this provider.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SecretError>> + Send;

    /// Store a secret value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), SecretError>> + Send;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`SecretProvider`] with boxed futures.
pub trait SecretProviderDyn: Send + Sync {
    fn name(&self) -> &'static str;

    fn get_boxed<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, SecretError>>;

    fn set_boxed<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), SecretError>>;
}

impl<T: SecretProvider> SecretProviderDyn for T {
    fn name(&self) -> &'static str {
        SecretProvider::name(self)
    }

    fn get_boxed<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, SecretError>> {
        Box::pin(self.get(key))
    }

    fn set_boxed<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), SecretError>> {
        Box::pin(self.set(key, value))
    }
}

/// Shared, type-erased secret provider as held by `SecretService`.
pub type DynSecretProvider = Arc<dyn SecretProviderDyn>;
