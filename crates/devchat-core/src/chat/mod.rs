//! Conversation state shared across turns.

pub mod session;
