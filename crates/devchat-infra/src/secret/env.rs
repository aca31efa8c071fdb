//! Environment variable secret provider.
//!
//! A read-only secret provider that checks process environment variables.
//! This is the highest-priority provider in the resolution chain: an
//! exported `ANTHROPIC_API_KEY` wins over the env file.

use devchat_core::repository::secret::SecretProvider;
use devchat_types::error::SecretError;

const PROVIDER_NAME: &str = "environment variable provider";

/// Environment variable secret provider.
///
/// Read-only: `set()` returns [`SecretError::ReadOnly`]
/// because environment variables cannot be persistently modified.
#[derive(Debug, Default)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SecretProvider for EnvSecretProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(key) {
            Ok(val) if !val.is_empty() => Ok(Some(val)),
            // Set-but-empty counts as unset so the env file can still answer.
            Ok(_) => Ok(None),
            Err(std::env::VarError::NotPresent) => Ok(None),
            // Present but not valid Unicode: secrets must be strings.
            Err(std::env::VarError::NotUnicode(_)) => Ok(None),
        }
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), SecretError> {
        Err(SecretError::ReadOnly(PROVIDER_NAME))
    }
}
