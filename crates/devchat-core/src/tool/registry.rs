//! Tool dispatch table.
//!
//! [`ToolRegistry`] maps tool names to adapters. It is built once at
//! start-up, shared read-only afterwards, and resolves every invocation by
//! exact name. Unknown names are an explicit error.

use std::collections::HashMap;

use tracing::{debug, warn};

use devchat_types::tool::{ToolDefinition, ToolError, ToolInvocation};

use super::adapter::{BoxTool, Tool};

/// Name → adapter table, preserving registration order for the model.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<BoxTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names must be unique.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        self.register_boxed(BoxTool::new(tool))
    }

    pub fn register_boxed(&mut self, tool: BoxTool) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        debug!(tool = %name, "registered tool");
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BoxTool> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions in registration order, for the model request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve the invocation's tool by name and run it.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let Some(tool) = self.get(&invocation.name) else {
            warn!(tool = %invocation.name, "model requested an unregistered tool");
            return Err(ToolError::Unrecognized(invocation.name.clone()));
        };
        debug!(tool = %invocation.name, input_len = invocation.input.len(), "dispatching tool");
        tool.invoke(&invocation.input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        definition: ToolDefinition,
    }

    impl Echo {
        fn named(name: &str) -> Self {
            Self {
                definition: ToolDefinition::single_input(name, "Echoes its input.", "text"),
            }
        }
    }

    impl Tool for Echo {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn invoke(&self, input: &str) -> Result<String, ToolError> {
            Ok(format!("{}:{input}", self.definition.name))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_exact_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo::named("PythonREPL")).unwrap();
        registry.register(Echo::named("StackExchangeAPI")).unwrap();

        let out = registry
            .dispatch(&ToolInvocation::new("StackExchangeAPI", "lifetimes"))
            .await
            .unwrap();
        assert_eq!(out, "StackExchangeAPI:lifetimes");
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_an_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo::named("PythonREPL")).unwrap();

        let err = registry
            .dispatch(&ToolInvocation::new("pythonrepl", "print(1)"))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::Unrecognized("pythonrepl".into()));
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo::named("PythonREPL")).unwrap();
        let err = registry.register(Echo::named("PythonREPL")).unwrap_err();
        assert_eq!(err, ToolError::DuplicateName("PythonREPL".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo::named("b")).unwrap();
        registry.register(Echo::named("a")).unwrap();
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.names(), vec!["b", "a"]);
    }
}
