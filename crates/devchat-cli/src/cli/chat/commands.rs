//! Slash command parsing for the chat loop.
//!
//! A line is a command only when it is exactly one of the known names below.
//! Anything else, including other text starting with `/`, is a prompt.

use std::io::{self, Write};

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// List the registered tools.
    Tools,
    /// Forget the current session's history.
    Clear,
    /// Leave the chat loop.
    Exit,
}

/// Parse user input as a slash command.
///
/// Returns `None` unless the whole trimmed line names a known command.
pub fn parse(input: &str) -> Option<ChatCommand> {
    match input.trim().to_lowercase().as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/tools" => Some(ChatCommand::Tools),
        "/clear" | "/reset" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        _ => None,
    }
}

/// Write the help text listing all available commands.
pub fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    writeln!(out, "  {}   Show this help message", style("/help").cyan())?;
    writeln!(out, "  {}  List the tools the agent can use", style("/tools").cyan())?;
    writeln!(out, "  {}  Forget the conversation so far", style("/clear").cyan())?;
    writeln!(out, "  {}   Leave the chat (same as 'exit')", style("/exit").cyan())?;
    writeln!(out)?;
    writeln!(out, "  {}", style("Ctrl+D to exit, Ctrl+C is safe").dim())?;
    writeln!(out)
}
