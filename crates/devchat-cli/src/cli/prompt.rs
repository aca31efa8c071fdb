//! Terminal prompt for secrets the provider chain does not have.

use devchat_core::service::secret::SecretPrompt;
use devchat_types::error::SecretError;

/// Asks for a secret with hidden input via `dialoguer::Password`.
pub struct DialoguerPrompt;

impl SecretPrompt for DialoguerPrompt {
    async fn prompt(&self, key: &str) -> Result<String, SecretError> {
        let label = format!("Enter your {key}");
        tokio::task::spawn_blocking(move || {
            dialoguer::Password::new()
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(|e| SecretError::Prompt(e.to_string()))?
        .map_err(|e| SecretError::Prompt(e.to_string()))
    }
}
