//! Line-oriented input source.
//!
//! Each line of input is one command:
//!
//! ```text
//! down <code> [key=<name>] [repeat]   key pressed (OS auto-repeat flagged)
//! up <code> [key=<name>]              key released
//! press <control>                     pad control pressed
//! release <control>                   pad control released (also: leave, cancel)
//! status                              print the status line
//! quit                                stop the client (also: exit)
//! ```
//!
//! `<code>` may be `-` when the keyboard reported no code, in which case the
//! `key=` name is used as the input id.  Blank lines and lines starting with
//! `#` are ignored.

use thiserror::Error;
use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use keyrelay_core::{Direction, InputCommand, InputId};

/// Why a line could not be turned into a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    /// Both the code and the key name were empty.
    #[error("input has neither a code nor a key name")]
    NoIdentifier,
}

/// Parses one input line.
///
/// Returns `Ok(None)` for blank lines and comments.
pub fn parse_input_line(line: &str) -> Result<Option<InputCommand>, InputParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let verb = verb.to_ascii_lowercase();
    if let Some(direction) = Direction::parse(&verb) {
        return parse_key(direction, words).map(Some);
    }

    let command = match verb.as_str() {
        "press" => InputCommand::Control {
            direction: Direction::Down,
            name: single_argument("press", "a control name", words)?,
        },
        "release" | "leave" | "cancel" => InputCommand::Control {
            direction: Direction::Up,
            name: single_argument("release", "a control name", words)?,
        },
        "status" => no_arguments(InputCommand::ShowStatus, words)?,
        "quit" | "exit" => no_arguments(InputCommand::Quit, words)?,
        _ => return Err(InputParseError::UnknownCommand(verb)),
    };
    Ok(Some(command))
}

fn parse_key<'a>(
    direction: Direction,
    mut words: impl Iterator<Item = &'a str>,
) -> Result<InputCommand, InputParseError> {
    let code = words.next().ok_or(InputParseError::MissingArgument {
        command: direction.as_str(),
        argument: "a key code",
    })?;
    let code = if code == "-" { "" } else { code };

    let mut key = "";
    let mut repeat = false;
    for word in words {
        match word.split_once('=') {
            Some(("key", name)) => key = name,
            None if word == "repeat" && direction == Direction::Down => repeat = true,
            _ => return Err(InputParseError::UnexpectedArgument(word.to_string())),
        }
    }

    let input = InputId::from_code_or_key(code, key).ok_or(InputParseError::NoIdentifier)?;
    Ok(InputCommand::Key {
        direction,
        input,
        repeat,
    })
}

fn single_argument<'a>(
    command: &'static str,
    argument: &'static str,
    mut words: impl Iterator<Item = &'a str>,
) -> Result<String, InputParseError> {
    let value = words
        .next()
        .ok_or(InputParseError::MissingArgument { command, argument })?;
    match words.next() {
        Some(extra) => Err(InputParseError::UnexpectedArgument(extra.to_string())),
        None => Ok(value.to_string()),
    }
}

fn no_arguments<'a>(
    command: InputCommand,
    mut words: impl Iterator<Item = &'a str>,
) -> Result<InputCommand, InputParseError> {
    match words.next() {
        Some(extra) => Err(InputParseError::UnexpectedArgument(extra.to_string())),
        None => Ok(command),
    }
}

// ── Reader thread ─────────────────────────────────────────────────────────────

/// Spawns a dedicated thread that reads commands from `reader`.
///
/// Stdin reads block and cannot be cancelled, so they stay off the Tokio
/// runtime.  The thread is detached: when the client shuts down while a read
/// is still waiting, the process exits without it.
///
/// # Errors
///
/// Returns an error if the OS refuses to create the thread.
pub fn spawn_input_reader<R>(
    reader: R,
    tx: mpsc::Sender<InputCommand>,
) -> std::io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("keyrelay-input".to_string())
        .spawn(move || read_commands(reader, tx))
}

/// Reads commands line by line and forwards them to the event loop.
///
/// Unparseable lines are reported and skipped.  End of input is forwarded as
/// [`InputCommand::Quit`].  Returns early if the event loop has gone away.
///
/// Blocks the calling thread; must not run on a Tokio worker.
pub fn read_commands<R: BufRead>(reader: R, tx: mpsc::Sender<InputCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("input read failed: {e}");
                break;
            }
        };

        match parse_input_line(&line) {
            Ok(Some(command)) => {
                if tx.blocking_send(command).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e}: {line:?}"),
        }
    }

    debug!("input source exhausted");
    let _ = tx.blocking_send(InputCommand::Quit);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
