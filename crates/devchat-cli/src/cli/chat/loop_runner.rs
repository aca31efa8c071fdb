//! Main chat loop orchestration.
//!
//! Coordinates the read-eval-print cycle: read a line, handle exit and slash
//! commands, stream the agent's turn, run requested tools through the
//! registry, and report per-turn failures without leaving the loop.

use std::io::{self, Write};
use std::ops::ControlFlow;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use devchat_core::agent::{AgentChunk, ConversationAgent};
use devchat_core::tool::ToolRegistry;
use devchat_types::agent::SessionId;

use super::PROMPT;
use super::commands::{self, ChatCommand};
use super::input::{InputEvent, PromptSource};

const EXIT_COMMAND: &str = "exit";
const EXIT_MESSAGE: &str = "Exiting the agent loop.";
const INTERRUPT_HINT: &str = "Press Ctrl+D or type 'exit' to quit.";
const TURN_SEPARATOR: &str = "----";

/// Thinking spinner on stderr, cleared when dropped.
struct Spinner(Option<ProgressBar>);

impl Spinner {
    fn start(enabled: bool) -> Self {
        if !enabled {
            return Self(None);
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("thinking...");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self(Some(bar))
    }

    fn stop(&mut self) {
        if let Some(bar) = self.0.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The interactive loop: one agent turn per operator line.
pub struct ChatLoop<'a, I, W> {
    agent: &'a dyn ConversationAgent,
    tools: &'a ToolRegistry,
    session: SessionId,
    input: I,
    out: W,
    show_progress: bool,
}

impl<'a, I: PromptSource, W: Write> ChatLoop<'a, I, W> {
    pub fn new(
        agent: &'a dyn ConversationAgent,
        tools: &'a ToolRegistry,
        session: SessionId,
        input: I,
        out: W,
    ) -> Self {
        Self {
            agent,
            tools,
            session,
            input,
            out,
            show_progress: false,
        }
    }

    /// Show a spinner while waiting for the agent.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Run until `exit`, `/exit` or end of input.
    ///
    /// Turn failures are printed and the loop keeps going; only a failure to
    /// write to the console ends it early.
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            let text = match self.input.read_line(PROMPT).await {
                InputEvent::Line(text) => text,
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    writeln!(self.out, "{INTERRUPT_HINT}")?;
                    continue;
                }
            };

            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case(EXIT_COMMAND) {
                break;
            }
            if let Some(command) = commands::parse(line) {
                match self.handle_command(command)? {
                    ControlFlow::Break(()) => break,
                    ControlFlow::Continue(()) => continue,
                }
            }

            // The prompt goes out as typed; trimming only decides control flow.
            if let Err(e) = self.run_turn(&text).await {
                warn!(session = %self.session, error = %e, "turn failed");
                writeln!(self.out, "Error: {e}")?;
            }
        }

        writeln!(self.out, "{EXIT_MESSAGE}")?;
        self.out.flush()?;
        self.input.finish()
    }

    fn handle_command(&mut self, command: ChatCommand) -> io::Result<ControlFlow<()>> {
        match command {
            ChatCommand::Help => commands::write_help(&mut self.out)?,
            ChatCommand::Tools => {
                for definition in self.tools.definitions() {
                    writeln!(self.out, "  {}: {}", definition.name, definition.description)?;
                }
            }
            ChatCommand::Clear => {
                self.agent.reset(&self.session);
                writeln!(self.out, "Conversation history cleared.")?;
            }
            ChatCommand::Exit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn run_turn(&mut self, message: &str) -> anyhow::Result<()> {
        info!(session = %self.session, "turn started");
        let mut stream = self.agent.submit(message.to_string(), &self.session);
        let mut spinner = Spinner::start(self.show_progress);

        while let Some(chunk) = stream.next().await {
            spinner.stop();
            match chunk? {
                AgentChunk::Text(text) => writeln!(self.out, "{text}")?,
                AgentChunk::ToolUse(tool_use) => {
                    let outcome = self.tools.dispatch(tool_use.invocation()).await;
                    match &outcome {
                        Ok(output) => {
                            writeln!(self.out, "{}", output.strip_suffix('\n').unwrap_or(output))?
                        }
                        Err(e) => writeln!(self.out, "Error: {e}")?,
                    }
                    if !tool_use.respond(outcome) {
                        debug!("turn ended before the tool result was delivered");
                    }
                    spinner = Spinner::start(self.show_progress);
                }
            }
        }

        spinner.stop();
        writeln!(self.out, "{TURN_SEPARATOR}")?;
        info!(session = %self.session, "turn finished");
        Ok(())
    }
}
