//! Tool adapter trait and its type-erased wrapper.
//!
//! Defines the [`Tool`] trait that every capability exposed to the agent
//! implements: a definition (name, description, input schema) and a single
//! `invoke(input) -> output` operation. Implementors include the Python
//! REPL and StackExchange tools in devchat-infra.

use std::future::Future;
use std::pin::Pin;

use devchat_types::tool::{ToolDefinition, ToolError};

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A uniform callable wrapping an external capability.
pub trait Tool: Send + Sync {
    /// Name, description, and input schema advertised to the model.
    fn definition(&self) -> &ToolDefinition;

    /// Run the tool on one input string and return its textual output.
    fn invoke(&self, input: &str) -> impl Future<Output = Result<String, ToolError>> + Send;
}

// ---------------------------------------------------------------------------
// Dynamic dispatch
// ---------------------------------------------------------------------------

/// Object-safe version of [`Tool`] with a boxed future.
pub trait ToolDyn: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    fn invoke_boxed<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>>;
}

impl<T: Tool> ToolDyn for T {
    fn definition(&self) -> &ToolDefinition {
        Tool::definition(self)
    }

    fn invoke_boxed<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'a>> {
        Box::pin(self.invoke(input))
    }
}

/// Type-erased tool, so adapters of different types can share one table.
pub struct BoxTool {
    inner: Box<dyn ToolDyn>,
}

impl BoxTool {
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self {
            inner: Box::new(tool),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.definition().name
    }

    pub fn definition(&self) -> &ToolDefinition {
        self.inner.definition()
    }

    pub async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        self.inner.invoke_boxed(input).await
    }
}

impl std::fmt::Debug for BoxTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTool").field("name", &self.name()).finish()
    }
}
