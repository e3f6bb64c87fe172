//! bucketkv CLI
//!
//! Command-line interface for inspecting and mutating a local store.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use bucketkv::{Config, FileStore, KeyValueStorage};

/// bucketkv CLI
#[derive(Parser, Debug)]
#[command(name = "bucketkv")]
#[command(about = "Embedded hash-bucket key-value store")]
#[command(version)]
struct Args {
    /// Store root directory
    #[arg(short, long, default_value = "./bucketkv_data")]
    root: String,

    /// Bucket directory fan-out (must match the value the store was created with)
    #[arg(short, long, default_value = "1024")]
    buckets: u64,

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

    /// List all stored keys
    Keys,

    /// Print the number of stored entries
    Size,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,bucketkv=info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = Config::builder()
        .root_dir(&args.root)
        .bucket_count(args.buckets)
        .build();

    let store: FileStore<String, String> = match FileStore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("failed to open store at {}: {}", args.root, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&store, args.command) {
        tracing::error!("command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(store: &FileStore<String, String>, command: Commands) -> bucketkv::Result<()> {
    match command {
        Commands::Get { key } => match store.read(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(not found)"),
        },
        Commands::Set { key, value } => {
            store.write(&key, &value)?;
        }
        Commands::Del { key } => {
            store.delete(&key)?;
        }
        Commands::Keys => {
            for key in store.read_keys()? {
                println!("{}", key);
            }
        }
        Commands::Size => {
            println!("{}", store.size()?);
        }
    }

    store.close()
}
