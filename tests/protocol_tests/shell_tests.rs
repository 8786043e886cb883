//! Shell Tests
//!
//! Tests for line parsing, response rendering and the shell loop.

use std::io::Cursor;

use hashlog::protocol::shell::{parse_line, render_response, run_shell, ShellCommand, HELP};
use hashlog::protocol::{Command, Response};
use hashlog::{Config, Registry};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn parse(line: &str) -> ShellCommand {
    parse_line(line).unwrap().unwrap()
}

fn run(command: Command) -> ShellCommand {
    ShellCommand::Run(command)
}

/// Run `script` against a fresh local registry and return the output
fn run_script(script: &str) -> String {
    let temp_dir = TempDir::new().unwrap();
    let registry = Registry::new(Config::builder().data_dir(temp_dir.path()).build());

    let mut output = Vec::new();
    run_shell(Cursor::new(script), &mut output, false, |command| {
        Response::from_result(registry.execute(command))
    })
    .unwrap();

    String::from_utf8(output).unwrap()
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_every_verb() {
    assert_eq!(parse("open users"), run(Command::Open { db: "users".into() }));
    assert_eq!(
        parse("get users alice"),
        run(Command::Get {
            db: "users".into(),
            key: b"alice".to_vec()
        })
    );
    assert_eq!(
        parse("set users alice 42"),
        run(Command::Set {
            db: "users".into(),
            key: b"alice".to_vec(),
            value: b"42".to_vec()
        })
    );
    assert_eq!(
        parse("delete users alice"),
        run(Command::Delete {
            db: "users".into(),
            key: b"alice".to_vec()
        })
    );
    assert_eq!(parse("compact users"), run(Command::Compact { db: "users".into() }));
    assert_eq!(parse("close users"), run(Command::Close { db: "users".into() }));
    assert_eq!(parse("ping"), run(Command::Ping));
    assert_eq!(parse("help"), ShellCommand::Help);
    assert_eq!(parse("quit"), ShellCommand::Quit);
}

#[test]
fn test_parse_aliases_and_case() {
    assert_eq!(parse("add db k v"), parse("set db k v"));
    assert_eq!(parse("del db k"), parse("delete db k"));
    assert_eq!(parse("exit"), ShellCommand::Quit);
    assert_eq!(parse("?"), ShellCommand::Help);
    assert_eq!(parse("GET db k"), parse("get db k"));
}

#[test]
fn test_parse_set_value_keeps_spaces() {
    assert_eq!(
        parse("  set   db  greeting   hello big   world  "),
        run(Command::Set {
            db: "db".into(),
            key: b"greeting".to_vec(),
            value: b"hello big   world".to_vec()
        })
    );
}

#[test]
fn test_parse_blank_and_comment_lines() {
    assert_eq!(parse_line("").unwrap(), None);
    assert_eq!(parse_line("   \t").unwrap(), None);
    assert_eq!(parse_line("# set db k v").unwrap(), None);
}

#[test]
fn test_parse_missing_arguments() {
    assert!(parse_line("open").is_err());
    assert!(parse_line("get db").is_err());
    assert!(parse_line("set db").is_err());
    assert!(parse_line("set db key").is_err());
    assert!(parse_line("delete").is_err());
}

#[test]
fn test_parse_extra_arguments() {
    let err = parse_line("get db key extra").unwrap_err();
    assert!(err.to_string().contains("unexpected argument"));
    assert!(parse_line("ping now").is_err());
    assert!(parse_line("close a b").is_err());
}

#[test]
fn test_parse_unknown_verb() {
    let err = parse_line("frobnicate db").unwrap_err();
    assert!(err.to_string().contains("frobnicate"));
}

// =============================================================================
// Rendering Tests
// =============================================================================

#[test]
fn test_render_response() {
    assert_eq!(render_response(&Response::ok(None)), "OK");
    assert_eq!(render_response(&Response::ok(Some(b"value".to_vec()))), "value");
    assert_eq!(render_response(&Response::not_found()), "(not found)");
    assert_eq!(render_response(&Response::error("boom")), "ERR boom");
}

// =============================================================================
// Shell Loop Tests
// =============================================================================

#[test]
fn test_shell_session() {
    let output = run_script(
        "open db\n\
         set db a 1\n\
         set db b 2\n\
         delete db a\n\
         compact db\n\
         get db a\n\
         get db b\n\
         close db\n",
    );

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[..4], ["OK", "OK", "OK", "OK"]);
    assert!(lines[4].starts_with("1 keys, "));
    assert_eq!(lines[5..], ["(not found)", "2", "OK"]);
}

#[test]
fn test_shell_requires_open() {
    let output = run_script("get db a\nset db a 1\n");

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.starts_with("ERR ") && l.contains("db")));
}

#[test]
fn test_shell_reports_parse_errors_and_continues() {
    let output = run_script("bogus\nping\n");
    let lines: Vec<&str> = output.lines().collect();

    assert!(lines[0].starts_with("ERR "));
    assert_eq!(lines[1], "PONG");
}

#[test]
fn test_shell_stops_at_quit() {
    let output = run_script("ping\nquit\nping\n");
    assert_eq!(output, "PONG\n");
}

#[test]
fn test_shell_help_and_comments() {
    let output = run_script("# comment\n\nhelp\n");
    assert_eq!(output, format!("{}\n", HELP));
}

#[test]
fn test_shell_prompt() {
    let mut output = Vec::new();
    run_shell(Cursor::new("ping\n"), &mut output, true, |_| Response::ok(None)).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), "hashlog> OK\nhashlog> ");
}
