//! Line input for the chat loop.
//!
//! [`ChatInput`] wraps `rustyline_async::Readline` for interactive terminals,
//! with proper handling of EOF (Ctrl+D) and interrupt (Ctrl+C). [`LineInput`]
//! reads plain lines from any async reader, for piped stdin.

use std::future::Future;
use std::io::{self, Write};

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Events produced by an input source.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// The operator submitted a line.
    Line(String),
    /// End of input (Ctrl+D or a closed pipe).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Where the chat loop gets its lines from.
pub trait PromptSource {
    /// Show `prompt` and wait for the next line.
    fn read_line(&mut self, prompt: &str) -> impl Future<Output = InputEvent>;

    /// Flush anything still queued for display.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Async readline input for interactive terminals.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create the input handler.
    ///
    /// Returns the handler and a `SharedWriter` for printing output without
    /// interfering with the readline prompt.
    pub fn new(prompt: &str) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt.to_string())?;
        Ok((Self { rl }, stdout))
    }
}

impl PromptSource for ChatInput {
    async fn read_line(&mut self, prompt: &str) -> InputEvent {
        let _ = self.rl.update_prompt(prompt);
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                self.rl.add_history_entry(line.clone());
                InputEvent::Line(line)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.rl.flush().map_err(io::Error::other)
    }
}

/// Buffered line reads, with the prompt written to stdout.
pub struct LineInput<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> PromptSource for LineInput<R> {
    async fn read_line(&mut self, prompt: &str) -> InputEvent {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{prompt}");
        let _ = stdout.flush();

        match self.lines.next_line().await {
            Ok(Some(line)) => InputEvent::Line(line),
            Ok(None) | Err(_) => InputEvent::Eof,
        }
    }
}
