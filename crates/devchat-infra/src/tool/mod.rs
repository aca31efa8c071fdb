//! Tool adapter implementations.
//!
//! - `python_repl`: runs Python code in a fresh interpreter
//! - `stackexchange`: searches StackExchange question excerpts

pub mod python_repl;
pub mod stackexchange;

pub use python_repl::PythonReplTool;
pub use stackexchange::StackExchangeTool;

use devchat_core::tool::ToolRegistry;
use devchat_types::config::AppConfig;
use devchat_types::tool::ToolError;

/// Build the dispatch table with every built-in tool.
pub fn default_registry(config: &AppConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(PythonReplTool::new(&config.python))?;
    registry.register(StackExchangeTool::new(config.stackexchange.clone())?)?;
    Ok(registry)
}
