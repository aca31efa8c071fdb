//! Business logic and port traits for devchat.
//!
//! This crate defines the "ports" (provider, tool and secret traits) that
//! the infrastructure layer implements, plus the agent loop and the tool
//! dispatch table. It depends on `devchat-types` and `devchat-observe`
//! only -- never on `devchat-infra` or any HTTP/filesystem crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;
pub mod tool;
