//! kvcache CLI Client
//!
//! Command-line interface for interacting with kvcache.

use std::io::{BufReader, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kvcache::protocol::read_expression;
use kvcache::{CommandFrame, Expression};

/// kvcache CLI
#[derive(Parser, Debug)]
#[command(name = "kvcache-cli")]
#[command(about = "CLI for the kvcache key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Expire a key after some seconds
    Expire {
        key: String,

        /// Seconds until expiry (0 removes the expiry)
        seconds: u64,
    },

    /// Show a key's configured TTL in seconds
    Ttl {
        key: String,
    },

    /// List all keys
    Keys,

    /// Count keys
    Dbsize,

    /// Ping the server
    Ping,
}

impl Commands {
    fn to_args(&self) -> Vec<String> {
        match self {
            Commands::Get { key } => vec!["GET".into(), key.clone()],
            Commands::Set { key, value } => vec!["SET".into(), key.clone(), value.clone()],
            Commands::Del { key } => vec!["DEL".into(), key.clone()],
            Commands::Expire { key, seconds } => {
                vec!["EXPIRE".into(), key.clone(), seconds.to_string()]
            }
            Commands::Ttl { key } => vec!["TTL".into(), key.clone()],
            Commands::Keys => vec!["KEYS".into()],
            Commands::Dbsize => vec!["DBSIZE".into()],
            Commands::Ping => vec!["PING".into()],
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(&args) {
        Ok(reply) => {
            println!("{}", render(&reply, 0));
            if reply.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Could not talk to {}: {}", args.server, e);
            ExitCode::FAILURE
        }
    }
}

/// Send one command and read one reply
fn execute(args: &Args) -> kvcache::Result<Expression> {
    let mut stream = TcpStream::connect(&args.server)?;
    let frame = CommandFrame::from_args(args.command.to_args());
    stream.write_all(&frame.to_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    read_expression(&mut reader)
}

/// Format a reply the way redis-cli does
fn render(reply: &Expression, indent: usize) -> String {
    match reply {
        Expression::SimpleString(s) => s.clone(),
        Expression::Error(s) => format!("(error) {}", s),
        Expression::Integer(i) => format!("(integer) {}", i),
        Expression::BulkString(b) => format!("{:?}", String::from_utf8_lossy(b)),
        Expression::NullBulkString | Expression::NullArray => "(nil)".to_string(),
        Expression::Array(items) if items.is_empty() => "(empty array)".to_string(),
        Expression::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!("{:indent$}{}) {}", "", i + 1, render(item, indent + 3), indent = indent)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Expression::CarriageReturn => String::new(),
    }
}
