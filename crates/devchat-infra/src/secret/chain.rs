//! Secret chain builder -- wires concrete providers in priority order.
//!
//! This module lives in `devchat-infra` because it assembles concrete
//! provider implementations. The resulting chain is passed to `SecretService`
//! in `devchat-core` via the `DynSecretProvider` abstraction.
//!
//! Chain order: `[EnvSecretProvider, DotenvSecretProvider]`

use std::path::PathBuf;
use std::sync::Arc;

use devchat_core::repository::secret::DynSecretProvider;
use devchat_types::error::SecretError;

use crate::secret::dotenv::DotenvSecretProvider;
use crate::secret::env::EnvSecretProvider;

/// Build the secret resolution chain.
///
/// The chain is ordered by precedence (first match wins):
/// 1. Process environment variables (read-only)
/// 2. The env file at `env_file` (readable and writable), read once here
pub async fn build_secret_chain(
    env_file: impl Into<PathBuf>,
) -> Result<Vec<DynSecretProvider>, SecretError> {
    let dotenv = DotenvSecretProvider::load(env_file).await?;
    Ok(vec![Arc::new(EnvSecretProvider::new()), Arc::new(dotenv)])
}
