//! CLI definitions for the `devchat` binary.
//!
//! Uses clap derive macros for argument parsing. Running `devchat` with no
//! subcommand starts the interactive chat loop; flags override the values
//! loaded from `config.toml`.

pub mod chat;
pub mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use devchat_types::config::AppConfig;

/// Chat with a tool-using coding assistant from the terminal.
#[derive(Debug, Parser)]
#[command(name = "devchat", version, about, long_about = None)]
pub struct Cli {
    /// Model to use for the conversation agent.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Env file holding secrets such as the API key.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Session id scoping the retained conversation history.
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Path to config.toml (defaults to the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed logs (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.agent.model = model.clone();
        }
        if let Some(env_file) = &self.env_file {
            config.credentials.env_file = env_file.display().to_string();
        }
        if let Some(session) = &self.session {
            config.agent.session_id = session.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_runs_chat() {
        let cli = Cli::try_parse_from(["devchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.otel);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "devchat",
            "--model",
            "claude-3-5-haiku-latest",
            "--env-file",
            "secrets.env",
            "--session",
            "work",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.agent.model, "claude-3-5-haiku-latest");
        assert_eq!(config.credentials.env_file, "secrets.env");
        assert_eq!(config.agent.session_id, "work");
    }

    #[test]
    fn test_overrides_keep_config_when_absent() {
        let cli = Cli::try_parse_from(["devchat", "--quiet"]).unwrap();
        let mut config = AppConfig::default();
        config.agent.model = "from-file".to_string();
        cli.apply_overrides(&mut config);
        assert_eq!(config.agent.model, "from-file");
        assert_eq!(config.credentials.env_file, ".env");
    }

    #[test]
    fn test_completions_subcommand() {
        let cli = Cli::try_parse_from(["devchat", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }
}
