//! Storage ports implemented by devchat-infra.

pub mod secret;
