//! Configuration types for devchat.
//!
//! `AppConfig` represents the `config.toml` file. Every section and field
//! has a default, so an empty or missing file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Default model for the conversation agent.
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Default session identifier for the interactive loop.
pub const DEFAULT_SESSION_ID: &str = "main";

/// Top-level configuration for devchat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub anthropic: AnthropicConfig,
    pub credentials: CredentialsConfig,
    pub python: PythonConfig,
    pub stackexchange: StackExchangeConfig,
}

/// `[agent]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
    /// Upper bound on tool round-trips within one turn.
    pub max_tool_rounds: u32,
    pub session_id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: None,
            system_prompt: None,
            max_tool_rounds: 8,
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

/// `[anthropic]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub base_url: String,
    /// Name of the secret holding the API key.
    pub api_key_env: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: crate::secret::ANTHROPIC_API_KEY.to_string(),
        }
    }
}

/// `[credentials]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Env file consulted for secrets, relative to the working directory.
    pub env_file: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_file: ".env".to_string(),
        }
    }
}

/// `[python]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    pub interpreter: String,
    /// Kill the interpreter after this many seconds. No limit when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: None,
        }
    }
}

/// Which part of a question the StackExchange search matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    All,
    Title,
    Body,
}

impl QueryType {
    /// Query-string parameter used by the `search/excerpts` endpoint.
    pub fn param(self) -> &'static str {
        match self {
            QueryType::All => "q",
            QueryType::Title => "title",
            QueryType::Body => "body",
        }
    }
}

/// `[stackexchange]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackExchangeConfig {
    pub base_url: String,
    pub site: String,
    pub max_results: usize,
    pub query_type: QueryType,
}

impl Default for StackExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stackexchange.com".to_string(),
            site: "stackoverflow".to_string(),
            max_results: 3,
            query_type: QueryType::All,
        }
    }
}
