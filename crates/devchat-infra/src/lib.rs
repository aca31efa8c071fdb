//! Infrastructure layer for devchat.
//!
//! Contains implementations of the port traits defined in `devchat-core`:
//! the Anthropic streaming client, environment and env-file secret
//! providers, the Python and StackExchange tools, and the TOML config
//! loader.

pub mod config;
pub mod llm;
pub mod secret;
pub mod tool;
