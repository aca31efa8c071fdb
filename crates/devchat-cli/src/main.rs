//! devchat CLI entry point.
//!
//! Binary name: `devchat`
//!
//! Parses CLI arguments, sets up tracing, wires the agent and its tools,
//! then runs the interactive chat loop.

mod cli;
mod state;

use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tokio::io::BufReader;

use devchat_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::chat::PROMPT;
use cli::chat::banner::write_welcome_banner;
use cli::chat::input::{ChatInput, LineInput};
use cli::chat::loop_runner::ChatLoop;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "devchat", &mut io::stdout());
        return Ok(());
    }

    let result = run_chat(&cli).await;
    shutdown_tracing();
    result
}

async fn run_chat(cli: &Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli).await?;
    let session = state.session.clone();

    if io::stdin().is_terminal() {
        let (input, mut writer) =
            ChatInput::new(PROMPT).context("failed to initialize terminal input")?;
        write_welcome_banner(&mut writer, &state.config.agent.model, &session.0, &state.tools.names())?;

        let mut chat = ChatLoop::new(&state.agent, &state.tools, session, input, writer)
            .with_progress(io::stderr().is_terminal());
        chat.run().await?;
    } else {
        let input = LineInput::new(BufReader::new(tokio::io::stdin()));
        let mut chat = ChatLoop::new(&state.agent, &state.tools, session, input, io::stdout());
        chat.run().await?;
    }

    Ok(())
}
