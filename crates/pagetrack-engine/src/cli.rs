use crate::form::CustomEventForm;
use crate::session::SessionContext;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read script {path}: {source}")]
    Script { path: PathBuf, source: io::Error },
    #[error("Line {number} ({line}): {message}")]
    Line {
        number: usize,
        line: String,
        message: String,
    },
    #[error("Input error: {0}")]
    Input(#[from] io::Error),
}

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct FileOptions {
    pub stop_on_error: bool,
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
    /// When set, Ctrl-C prints this and closes the prompt.
    pub interrupt_message: Option<&'a str>,
}

/// A line of host input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `goto <path>`
    GoTo(String),
    /// `event <type> [data...]`
    Event { event_type: String, data: String },
    /// `status`
    Status,
    /// `where`
    Where,
    /// `end-session`
    EndSession,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "goto" | "go" => {
                if rest.is_empty() {
                    Err("usage: goto <path>".to_string())
                } else {
                    Ok(ShellCommand::GoTo(rest.to_string()))
                }
            }
            // An empty type is passed through so the form can reject it.
            "event" => {
                let (event_type, data) = match rest.split_once(char::is_whitespace) {
                    Some((event_type, data)) => (event_type, data.trim()),
                    None => (rest, ""),
                };
                Ok(ShellCommand::Event {
                    event_type: event_type.to_string(),
                    data: data.to_string(),
                })
            }
            "status" => Ok(ShellCommand::Status),
            "where" => Ok(ShellCommand::Where),
            "end-session" => Ok(ShellCommand::EndSession),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

pub async fn execute_line(context: &mut SessionContext, line: &str) -> Result<String, String> {
    match ShellCommand::parse(line)? {
        ShellCommand::GoTo(path) => {
            context.navigate(&path).map_err(|e| e.to_string())?;
            Ok(format!("Now on {}", context.current_path()))
        }
        ShellCommand::Event { event_type, data } => {
            let mut form = CustomEventForm::new(event_type, data);
            match context.submit_event(&mut form).await {
                Ok(event) => Ok(format!(
                    "Sent '{}' from {}",
                    event.event_type, event.page
                )),
                Err(e) => Err(e.to_string()),
            }
        }
        ShellCommand::Status => Ok(format!("Collector: {}", context.connectivity())),
        ShellCommand::Where => Ok(format!(
            "Path: {} (stored: {})",
            context.current_path(),
            context.stored_page().as_deref().unwrap_or("-")
        )),
        ShellCommand::EndSession => {
            context.end();
            Ok("Session state cleared".to_string())
        }
    }
}

/// Outcome of a script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Run a script of shell commands, one per line. `#` starts a comment line.
pub async fn run_file(
    context: &mut SessionContext,
    output: OutputHandlers,
    path: impl AsRef<Path>,
    options: FileOptions,
) -> Result<ScriptSummary, CliError> {
    let path = path.as_ref();
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Script {
            path: path.to_path_buf(),
            source,
        })?;

    let mut summary = ScriptSummary::default();
    for (index, raw) in script.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        summary.executed += 1;
        match execute_line(context, line).await {
            Ok(reply) => (output.out)(&reply),
            Err(message) => {
                summary.failed += 1;
                (output.err)(&format!("{}:{}: {}", path.display(), index + 1, message));
                if options.stop_on_error {
                    return Err(CliError::Line {
                        number: index + 1,
                        line: line.to_string(),
                        message,
                    });
                }
            }
        }
    }
    debug!(
        "Script {} done: {} executed, {} failed",
        path.display(),
        summary.executed,
        summary.failed
    );
    Ok(summary)
}

/// One read from the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ShellInput {
    Command(String),
    Blank,
    /// Exit command or end of input.
    Exit,
}

impl ShellInput {
    /// `None` is end of input.
    pub(crate) fn classify(line: Option<&str>, exit_commands: &[&str]) -> Self {
        let Some(line) = line.map(str::trim) else {
            return ShellInput::Exit;
        };
        if line.is_empty() {
            ShellInput::Blank
        } else if exit_commands.contains(&line) {
            ShellInput::Exit
        } else {
            ShellInput::Command(line.to_string())
        }
    }
}

async fn next_input<R>(
    lines: &mut Lines<R>,
    options: &ReplOptions<'_>,
    output: OutputHandlers,
) -> io::Result<ShellInput>
where
    R: AsyncBufRead + Unpin,
{
    let line = match options.interrupt_message {
        Some(message) => tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                (output.out)(message);
                return Ok(ShellInput::Exit);
            }
        },
        None => lines.next_line().await?,
    };
    Ok(ShellInput::classify(line.as_deref(), options.exit_commands))
}

/// Interactive prompt on stdin. Command failures are reported and the loop
/// continues; only input errors end it early.
pub async fn run_repl(
    context: &mut SessionContext,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), CliError> {
    options.banner_lines.iter().for_each(|line| (output.out)(line));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{}", options.prompt)?;
        stdout.flush()?;

        match next_input(&mut lines, &options, output).await? {
            ShellInput::Command(line) => match execute_line(context, &line).await {
                Ok(reply) => (output.out)(&reply),
                Err(message) => (output.err)(&format!("Error: {}", message)),
            },
            ShellInput::Blank => {}
            ShellInput::Exit => return Ok(()),
        }
    }
}
