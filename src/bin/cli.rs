//! hashlog CLI Client
//!
//! Command-line interface for interacting with hashlog, either one command
//! per invocation against a server or as an interactive line shell.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hashlog::network::Client;
use hashlog::protocol::shell::{render_response, run_shell};
use hashlog::protocol::{Command, Response};
use hashlog::{Config, Registry};
use tracing_subscriber::{fmt, EnvFilter};

/// hashlog CLI
#[derive(Parser, Debug)]
#[command(name = "hashlog-cli")]
#[command(about = "CLI for the hashlog key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open (or create) a database
    Open {
        db: String,
    },

    /// Get a value by key
    Get {
        db: String,
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        db: String,
        /// The key to set
        key: String,
        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        db: String,
        /// The key to delete
        key: String,
    },

    /// Compact a database's log
    Compact {
        db: String,
    },

    /// Close a database
    Close {
        db: String,
    },

    /// Ping the server
    Ping,

    /// Interactive line shell
    Shell {
        /// Run against databases in this directory instead of a server
        #[arg(long, value_name = "DATA_DIR")]
        local: Option<String>,
    },
}

fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let command = match args.command {
        Commands::Shell { local } => return shell(&args.server, local),
        Commands::Open { db } => Command::Open { db },
        Commands::Get { db, key } => Command::Get {
            db,
            key: key.into_bytes(),
        },
        Commands::Set { db, key, value } => Command::Set {
            db,
            key: key.into_bytes(),
            value: value.into_bytes(),
        },
        Commands::Del { db, key } => Command::Delete {
            db,
            key: key.into_bytes(),
        },
        Commands::Compact { db } => Command::Compact { db },
        Commands::Close { db } => Command::Close { db },
        Commands::Ping => Command::Ping,
    };

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match client.execute(&command) {
        Ok(response) => {
            println!("{}", render_response(&response));
            if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn shell(server: &str, local: Option<String>) -> ExitCode {
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    let mut stdout = io::stdout();

    let result = match local {
        Some(data_dir) => {
            let registry = Registry::new(Config::builder().data_dir(data_dir).build());
            run_shell(stdin.lock(), &mut stdout, prompt, |command| {
                Response::from_result(registry.execute(command))
            })
        }
        None => match Client::connect(server) {
            Ok(mut client) => run_shell(stdin.lock(), &mut stdout, prompt, |command| {
                client
                    .execute(&command)
                    .unwrap_or_else(|e| Response::error(&e.to_string()))
            }),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
