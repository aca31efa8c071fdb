//! Welcome banner printed when the chat loop starts.

use std::io::{self, Write};

use console::style;

/// Write the welcome banner: model, session and the registered tools.
pub fn write_welcome_banner(
    out: &mut impl Write,
    model: &str,
    session_id: &str,
    tools: &[&str],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("devchat").cyan().bold())?;
    writeln!(out)?;
    writeln!(out, "  {}    {}", style("Model:").bold(), style(model).dim())?;
    writeln!(out, "  {}  {}", style("Session:").bold(), style(session_id).dim())?;
    writeln!(out, "  {}    {}", style("Tools:").bold(), style(tools.join(", ")).dim())?;
    writeln!(out)?;
    writeln!(out, "  {}", style("Type /help for commands, 'exit' to quit").dim())?;
    writeln!(out, "  {}", style("---").dim())?;
    writeln!(out)
}
