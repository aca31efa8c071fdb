//! Python code-execution tool.
//!
//! One interpreter process is started on first use and kept for the life of
//! the tool, so names defined by one call are visible to the next. A small
//! driver script runs inside the interpreter: it reads length-prefixed
//! snippets from stdin, executes them in a shared namespace with stdout
//! captured, and answers each with one JSON line.
//!
//! A timeout or a dead interpreter drops the session; the next call starts
//! a fresh one.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;
use tracing::{debug, info};

use devchat_core::tool::Tool;
use devchat_types::config::PythonConfig;
use devchat_types::tool::{ToolDefinition, ToolError};

pub const PYTHON_REPL_NAME: &str = "PythonREPL";

const PYTHON_REPL_DESCRIPTION: &str = "A Python shell. Use this to execute Python commands. \
Input should be a valid Python command. If you want to see the output of a value, you should \
print it out with `print(...)`.";

/// Runs inside the interpreter. The protocol stream is a private copy of
/// fd 1; fd 1 itself is pointed at stderr so stray writes cannot corrupt it.
const DRIVER: &str = r#"
import io, json, os, sys, traceback
from contextlib import redirect_stderr, redirect_stdout

reply = os.fdopen(os.dup(1), "w", encoding="utf-8")
os.dup2(2, 1)
source = sys.stdin.buffer
sys.stdin = io.StringIO()
namespace = {"__name__": "__main__", "__builtins__": __builtins__}

while True:
    header = source.readline()
    if not header:
        break
    code = source.read(int(header)).decode("utf-8", "replace")
    out = io.StringIO()
    err = None
    try:
        with redirect_stdout(out), redirect_stderr(io.StringIO()):
            exec(compile(code, "<input>", "exec"), namespace)
    except SystemExit:
        pass
    except BaseException:
        err = traceback.format_exc()
    reply.write(json.dumps({"out": out.getvalue(), "err": err}) + "\n")
    reply.flush()
"#;

/// Answer to one executed snippet.
#[derive(Debug, Deserialize)]
struct Reply {
    out: String,
    err: Option<String>,
}

/// A running interpreter and its pipes.
#[derive(Debug)]
struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    /// Send one snippet and wait for its reply. `None` means the interpreter
    /// exited before answering.
    async fn execute(&mut self, code: &str) -> io::Result<Option<Reply>> {
        let frame = format!("{}\n{code}", code.len());
        self.stdin.write_all(frame.as_bytes()).await?;
        self.stdin.flush().await?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        serde_json::from_str(&line).map(Some).map_err(io::Error::other)
    }
}

/// Runs Python code in a persistent external interpreter.
#[derive(Debug)]
pub struct PythonReplTool {
    definition: ToolDefinition,
    interpreter: String,
    timeout: Option<Duration>,
    session: Mutex<Option<Session>>,
}

impl PythonReplTool {
    pub fn new(config: &PythonConfig) -> Self {
        Self {
            definition: ToolDefinition::single_input(
                PYTHON_REPL_NAME,
                PYTHON_REPL_DESCRIPTION,
                "Python source code to execute.",
            ),
            interpreter: config.interpreter.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            session: Mutex::new(None),
        }
    }

    fn spawn_error(&self, e: impl ToString) -> ToolError {
        ToolError::Spawn {
            program: self.interpreter.clone(),
            message: e.to_string(),
        }
    }

    fn start(&self) -> Result<Session, ToolError> {
        let mut child = tokio::process::Command::new(&self.interpreter)
            .arg("-c")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(self.spawn_error("interpreter pipes unavailable"));
        };
        info!(interpreter = %self.interpreter, pid = ?child.id(), "python interpreter started");
        Ok(Session {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn run(&self, code: &str) -> Result<String, ToolError> {
        let mut slot = self.session.lock().await;
        let mut session = match slot.take() {
            Some(session) => session,
            None => self.start()?,
        };

        // Dropping the session on any early return kills the interpreter.
        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, session.execute(code))
                .await
                .map_err(|_| ToolError::Timeout(limit.as_secs()))?,
            None => session.execute(code).await,
        }
        .map_err(|e| self.spawn_error(e))?;

        let Some(reply) = reply else {
            let status = session.child.wait().await.map_err(|e| self.spawn_error(e))?;
            debug!(%status, "python interpreter exited");
            return Ok(format!("process exited with {status}"));
        };
        *slot = Some(session);

        match reply.err {
            // Execution faults are reported to the model as output, not as errors.
            Some(traceback) => {
                debug!("python code raised an exception");
                Ok(last_error_line(&traceback).unwrap_or(traceback.as_str()).to_string())
            }
            None => Ok(reply.out),
        }
    }
}

impl Tool for PythonReplTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let code = sanitize_input(input);
        if code.is_empty() {
            return Err(ToolError::InvalidInput("no Python code given".to_string()));
        }
        self.run(&code).await
    }
}

/// Strip Markdown code fences, an optional `python`/`py` tag, stray
/// backticks, and surrounding whitespace.
pub fn sanitize_input(input: &str) -> String {
    let is_fence = |c: char| c.is_whitespace() || c == '`';
    let mut code = input.trim_start_matches(is_fence);

    for tag in ["python", "py"] {
        if code.len() >= tag.len()
            && code.is_char_boundary(tag.len())
            && code[..tag.len()].eq_ignore_ascii_case(tag)
            && code[tag.len()..].starts_with(char::is_whitespace)
        {
            code = &code[tag.len()..];
            break;
        }
    }

    code.trim_start().trim_end_matches(is_fence).to_string()
}

/// The exception line of a traceback: its last non-empty line.
fn last_error_line(traceback: &str) -> Option<&str> {
    traceback.lines().map(str::trim_end).rfind(|line| !line.trim().is_empty())
}
