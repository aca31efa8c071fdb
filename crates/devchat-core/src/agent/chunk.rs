//! Response chunks and the conversation agent interface.
//!
//! A turn is a finite, non-restartable stream of [`AgentChunk`]s. Tool calls
//! travel as [`ToolUseChunk`]s: the consumer runs the tool and answers through
//! the chunk, and the agent waits for that answer before it continues.

use std::fmt;
use std::pin::Pin;

use futures_util::Stream;
use tokio::sync::oneshot;

use devchat_types::agent::SessionId;
use devchat_types::error::AgentError;
use devchat_types::tool::{ToolError, ToolInvocation};

/// Result of running one tool, as reported back to the agent.
pub type ToolOutcome = Result<String, ToolError>;

/// Stream of chunks produced by one turn.
pub type AgentStream = Pin<Box<dyn Stream<Item = Result<AgentChunk, AgentError>> + Send>>;

/// One unit of streamed response content.
#[derive(Debug)]
pub enum AgentChunk {
    /// Assistant text from one model step.
    Text(String),
    /// A tool the agent wants run before it continues.
    ToolUse(ToolUseChunk),
}

/// A pending tool call plus the channel for its result.
pub struct ToolUseChunk {
    invocation: ToolInvocation,
    responder: oneshot::Sender<ToolOutcome>,
}

impl ToolUseChunk {
    /// Create a chunk and the receiver the agent awaits.
    pub fn new(invocation: ToolInvocation) -> (Self, oneshot::Receiver<ToolOutcome>) {
        let (responder, receiver) = oneshot::channel();
        (
            Self {
                invocation,
                responder,
            },
            receiver,
        )
    }

    pub fn invocation(&self) -> &ToolInvocation {
        &self.invocation
    }

    /// Deliver the tool's result. Returns false if the turn was already dropped.
    pub fn respond(self, outcome: ToolOutcome) -> bool {
        self.responder.send(outcome).is_ok()
    }
}

impl fmt::Debug for ToolUseChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolUseChunk")
            .field("invocation", &self.invocation)
            .finish_non_exhaustive()
    }
}

/// An orchestrator that answers a message directly or through tools.
///
/// Implementors keep per-session history keyed by [`SessionId`].
pub trait ConversationAgent: Send + Sync {
    /// Start a turn for `message` in `session`.
    fn submit(&self, message: String, session: &SessionId) -> AgentStream;

    /// Forget everything retained for `session`.
    fn reset(&self, session: &SessionId);
}
