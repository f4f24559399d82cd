//! Strata CLI
//!
//! Command-line interface for inspecting and editing a storage directory.

use std::process;

use clap::{Parser, Subcommand};
use strata::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// Strata CLI
#[derive(Parser, Debug)]
#[command(name = "strata-cli")]
#[command(about = "CLI for a Strata storage directory")]
#[command(version)]
struct Args {
    /// Storage directory
    #[arg(short, long, default_value = "./strata_data")]
    dir: String,

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
    Put {
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

    /// List live entries in [from, to)
    Scan {
        /// Inclusive lower bound
        #[arg(long)]
        from: Option<String>,

        /// Exclusive upper bound
        #[arg(long)]
        to: Option<String>,
    },

    /// Write buffered entries to a new generation
    Flush,

    /// Merge every generation into one
    Compact,

    /// List generations, newest first
    Generations,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder().base_path(&args.dir).build();
    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("Command failed: {}", e);
        process::exit(1);
    }

    // Persist whatever the command buffered
    if let Err(e) = engine.close() {
        tracing::error!("Failed to close storage: {}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> strata::Result<()> {
    match command {
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        },
        Commands::Put { key, value } => {
            engine.upsert(key, value)?;
            println!("OK");
        }
        Commands::Delete { key } => {
            engine.remove(key)?;
            println!("OK");
        }
        Commands::Scan { from, to } => {
            let entries = engine.range(from.as_deref().map(str::as_bytes), to.as_deref().map(str::as_bytes))?;
            for entry in entries {
                let value = entry.value.unwrap_or_default();
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&entry.key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Flush => match engine.flush()? {
            Some(info) => println!("flushed generation {} ({} entries)", info.index, info.entry_count),
            None => println!("nothing to flush"),
        },
        Commands::Compact => match engine.compact()? {
            Some(info) => println!(
                "compacted into generation {} ({} entries, {} bytes)",
                info.index, info.entry_count, info.values_bytes
            ),
            None => println!("nothing to compact"),
        },
        Commands::Generations => {
            for index in engine.generations() {
                println!("{}", index);
            }
        }
    }
    Ok(())
}
