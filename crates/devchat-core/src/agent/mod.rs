//! Conversation agent for devchat.
//!
//! - `ConversationAgent`: submit(message, session) -> stream of chunks
//! - `ReactAgent`: reason-act loop over an LLM provider with tool round-trips

pub mod chunk;
pub mod engine;

pub use chunk::{AgentChunk, AgentStream, ConversationAgent, ToolOutcome, ToolUseChunk};
pub use engine::ReactAgent;
