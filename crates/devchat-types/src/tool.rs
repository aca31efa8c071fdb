//! Tool domain types.
//!
//! Every devchat tool takes one string and returns one string. The model
//! sees each tool as a JSON object schema with a single `input` property.

use serde::{Deserialize, Serialize};

/// Name, description, and input schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Definition for a tool that accepts a single string argument.
    pub fn single_input(
        name: impl Into<String>,
        description: impl Into<String>,
        input_description: &str,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": input_description,
                    }
                },
                "required": ["input"],
            }),
        }
    }
}

/// A request to run one tool: the tool name plus its input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: String,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
        }
    }

    /// Build an invocation from the JSON arguments a model produced.
    ///
    /// Prefers the `input` field, then the first string-valued field, then
    /// the compact JSON text itself.
    pub fn from_model_input(name: impl Into<String>, input: &serde_json::Value) -> Self {
        let text = match input {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => match map.get("input") {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => map
                    .values()
                    .find_map(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| input.to_string()),
            },
            other => other.to_string(),
        };
        Self::new(name, text)
    }
}

/// Errors from resolving or running a tool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unrecognized tool: {0}")]
    Unrecognized(String),

    #[error("a tool named '{0}' is already registered")]
    DuplicateName(String),

    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("tool timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Http(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("tool result was never delivered")]
    Cancelled,

    #[error("invalid tool input: {0}")]
    InvalidInput(String),
}
