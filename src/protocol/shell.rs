//! Line-oriented shell
//!
//! Parses one command per line into a [`Command`] and renders responses as
//! text. The same dispatcher runs against a local registry or a remote
//! server; only the executor closure differs.
//!
//! ```text
//! open <db>
//! get <db> <key>
//! set <db> <key> <value...>      (alias: add)
//! delete <db> <key>              (alias: del)
//! compact <db>
//! close <db>
//! ping
//! help
//! quit                           (alias: exit)
//! ```
//!
//! The value of `set` is the rest of the line, so it may contain spaces.

use std::io::{BufRead, Write};

use super::{Command, Response, Status};
use crate::error::{HashLogError, Result};

pub const HELP: &str = "\
commands:
  open <db>
  get <db> <key>
  set <db> <key> <value...>
  delete <db> <key>
  compact <db>
  close <db>
  ping
  quit";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Send a command to the store
    Run(Command),
    Help,
    Quit,
}

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let mut rest = line.trim();
    if rest.is_empty() || rest.starts_with('#') {
        return Ok(None);
    }

    let verb = next_token(&mut rest).unwrap_or_default().to_ascii_lowercase();
    let parsed = match verb.as_str() {
        "quit" | "exit" => ShellCommand::Quit,
        "help" | "?" => ShellCommand::Help,
        "ping" => ShellCommand::Run(Command::Ping),
        "open" => ShellCommand::Run(Command::Open {
            db: expect_token(&mut rest, &verb, "db")?,
        }),
        "close" => ShellCommand::Run(Command::Close {
            db: expect_token(&mut rest, &verb, "db")?,
        }),
        "compact" => ShellCommand::Run(Command::Compact {
            db: expect_token(&mut rest, &verb, "db")?,
        }),
        "get" => ShellCommand::Run(Command::Get {
            db: expect_token(&mut rest, &verb, "db")?,
            key: expect_token(&mut rest, &verb, "key")?.into_bytes(),
        }),
        "delete" | "del" => ShellCommand::Run(Command::Delete {
            db: expect_token(&mut rest, &verb, "db")?,
            key: expect_token(&mut rest, &verb, "key")?.into_bytes(),
        }),
        "set" | "add" => {
            let db = expect_token(&mut rest, &verb, "db")?;
            let key = expect_token(&mut rest, &verb, "key")?.into_bytes();
            if rest.is_empty() {
                return Err(usage(&verb, "value"));
            }
            ShellCommand::Run(Command::Set {
                db,
                key,
                value: rest.as_bytes().to_vec(),
            })
        }
        other => {
            return Err(HashLogError::Protocol(format!(
                "unknown command '{}' (try 'help')",
                other
            )))
        }
    };

    if let ShellCommand::Run(ref command) = parsed {
        if !matches!(command, Command::Set { .. }) && !rest.is_empty() {
            return Err(HashLogError::Protocol(format!(
                "{}: unexpected argument '{}'",
                verb, rest
            )));
        }
    }

    Ok(Some(parsed))
}

/// Render a response the way the shell prints it
pub fn render_response(response: &Response) -> String {
    match response.status {
        Status::Ok => match &response.payload {
            Some(payload) => String::from_utf8_lossy(payload).into_owned(),
            None => "OK".to_string(),
        },
        Status::NotFound => "(not found)".to_string(),
        Status::Error => format!("ERR {}", response.payload_text()),
    }
}

/// Read lines from `input` until EOF or `quit`, executing each command
pub fn run_shell<R, W, F>(input: R, output: &mut W, prompt: bool, mut execute: F) -> Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(Command) -> Response,
{
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(output, "hashlog> ")?;
            output.flush()?;
        }

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => return Ok(()),
            Ok(Some(ShellCommand::Help)) => writeln!(output, "{}", HELP)?,
            Ok(Some(ShellCommand::Run(command))) => {
                tracing::trace!(?command, "shell command");
                let response = execute(command);
                writeln!(output, "{}", render_response(&response))?;
            }
            Err(e) => writeln!(output, "ERR {}", e)?,
        }
    }
}

fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (token, tail) = trimmed.split_at(end);
    *rest = tail.trim_start();
    Some(token)
}

fn expect_token(rest: &mut &str, verb: &str, what: &str) -> Result<String> {
    next_token(rest)
        .map(str::to_string)
        .ok_or_else(|| usage(verb, what))
}

fn usage(verb: &str, what: &str) -> HashLogError {
    HashLogError::Protocol(format!("{}: missing <{}>", verb, what))
}
