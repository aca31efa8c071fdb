//! Shared domain types for devchat.
//!
//! Messages, stream events, tool and agent types, configuration, secrets,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod secret;
pub mod tool;
