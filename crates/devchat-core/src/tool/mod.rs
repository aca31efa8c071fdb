//! Tool adapters and the name-based dispatch table.

pub mod adapter;
pub mod registry;

pub use adapter::{BoxTool, Tool};
pub use registry::ToolRegistry;
