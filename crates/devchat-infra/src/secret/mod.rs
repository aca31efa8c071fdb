//! Secret provider implementations.
//!
//! - `env`: Environment variable provider (read-only, highest priority)
//! - `dotenv`: Env-file provider (`.env`), the only writable backend
//! - `chain`: Secret chain builder wiring both providers together

pub mod chain;
pub mod dotenv;
pub mod env;

pub use chain::build_secret_chain;
pub use dotenv::DotenvSecretProvider;
pub use env::EnvSecretProvider;
