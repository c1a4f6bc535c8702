//! EmberKV CLI Client
//!
//! Command-line interface for interacting with EmberKV.

use clap::{Parser, Subcommand};
use emberkv::{Client, KvError, Value};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:31337")]
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
    Delete {
        /// The key to delete
        key: String,
    },

    /// Remove every key
    Flush,

    /// Get several keys at once
    Mget {
        /// Keys to look up
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Set several key-value pairs at once
    Mset {
        /// Alternating keys and values
        #[arg(required = true, num_args = 2..)]
        pairs: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(reply) => println!("{}", reply),
        Err(KvError::Server(message)) => {
            println!("(error) {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("emberkv-cli: {}", e);
            std::process::exit(2);
        }
    }
}

fn run(args: &Args) -> emberkv::Result<Value> {
    let mut client = Client::connect(args.server.as_str())?;

    // Raw execute keeps the server's reply shape for printing
    let request: Vec<&str> = match &args.command {
        Commands::Get { key } => vec!["GET", key.as_str()],
        Commands::Set { key, value } => vec!["SET", key.as_str(), value.as_str()],
        Commands::Delete { key } => vec!["DELETE", key.as_str()],
        Commands::Flush => vec!["FLUSH"],
        Commands::Mget { keys } => std::iter::once("MGET")
            .chain(keys.iter().map(String::as_str))
            .collect(),
        Commands::Mset { pairs } => std::iter::once("MSET")
            .chain(pairs.iter().map(String::as_str))
            .collect(),
    };

    client.execute(&request)
}
