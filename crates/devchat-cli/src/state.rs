//! Application state wiring all services together.
//!
//! AppState resolves configuration and the API key, then pins the agent and
//! tool registry to the concrete infra implementations.

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use devchat_core::agent::ReactAgent;
use devchat_core::service::secret::{SecretOrigin, SecretService};
use devchat_core::tool::ToolRegistry;
use devchat_infra::config::{default_config_path, load_config, load_config_file};
use devchat_infra::llm::create_provider;
use devchat_infra::secret::chain::build_secret_chain;
use devchat_infra::tool::default_registry;
use devchat_types::agent::{AgentSettings, SessionId};
use devchat_types::config::AppConfig;

use crate::cli::Cli;
use crate::cli::prompt::DialoguerPrompt;

/// Everything the chat loop needs.
pub struct AppState {
    pub config: AppConfig,
    pub agent: ReactAgent,
    pub tools: ToolRegistry,
    pub session: SessionId,
}

impl AppState {
    /// Load configuration, resolve the API key (prompting once if needed),
    /// and build the agent and its tools.
    pub async fn init(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config_file(path)
                .await
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => match default_config_path() {
                Some(path) => load_config(&path).await,
                None => AppConfig::default(),
            },
        };
        cli.apply_overrides(&mut config);

        // Environment first, then the env file.
        let env_file = PathBuf::from(&config.credentials.env_file);
        let chain = build_secret_chain(env_file.clone())
            .await
            .with_context(|| format!("failed to read {}", env_file.display()))?;
        let secrets = SecretService::new(chain);

        let key_name = config.anthropic.api_key_env.as_str();
        let api_key = secrets
            .get_or_prompt(key_name, &DialoguerPrompt)
            .await
            .with_context(|| format!("failed to resolve {key_name}"))?;
        debug!(key = key_name, masked = %api_key.value.masked(), "API key resolved");
        if api_key.origin == SecretOrigin::Entered {
            println!("{key_name} saved to {} file.", env_file.display());
        }

        let provider = create_provider(&config.anthropic, &config.agent.model, api_key.value.expose())
            .context("failed to create the Anthropic provider")?;
        let tools = default_registry(&config).context("failed to register tools")?;
        let agent = ReactAgent::new(provider, tools.definitions(), AgentSettings::from(&config.agent));
        let session = SessionId::new(config.agent.session_id.clone());

        Ok(Self {
            config,
            agent,
            tools,
            session,
        })
    }
}
