use clap::{ArgGroup, Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub mod check_config;
pub mod convert;
pub mod init_config;
pub mod inspect;
pub mod version;

#[derive(Parser)]
#[command(name = "allocator")]
#[command(author = "Allocator Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the treasury allocation engine", long_about = None)]
pub struct Cli {
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default configuration file
    InitConfig {
        /// Output path (default: ~/.config/allocator/config.toml)
        #[arg(long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate a configuration file, print the resolved schedule
    CheckConfig {
        /// Path to config file (default: ~/.config/allocator/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Convert between asset units and 18-decimal shares
    #[command(group(ArgGroup::new("direction").required(true).args(["to_shares", "to_assets"])))]
    Convert {
        /// Asset precision
        #[arg(long)]
        decimals: u8,

        /// Asset amount to convert into shares
        #[arg(long)]
        to_shares: Option<u128>,

        /// Share amount to convert into assets
        #[arg(long)]
        to_assets: Option<u128>,

        /// Outstanding share supply (0 = bootstrap scaling)
        #[arg(long, default_value_t = 0)]
        total_supply: u128,

        /// Pooled asset balance
        #[arg(long, default_value_t = 0)]
        total_assets: u128,
    },

    /// Decode an instance snapshot and report its state
    Inspect {
        /// Snapshot file
        #[arg(long)]
        snapshot: String,

        /// Evaluate proposal states at this unix time (default: last seen time)
        #[arg(long)]
        now: Option<u64>,

        /// Number of recent events to list
        #[arg(long, default_value_t = 10)]
        events: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

pub fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = cli.log_level;
    match cli.command {
        Commands::InitConfig { path, force } => {
            init_tracing(log_level.as_deref().unwrap_or("warn"), None)?;
            init_config::execute(path, force)
        }
        Commands::CheckConfig { config } => check_config::execute(config, log_level),
        Commands::Convert {
            decimals,
            to_shares,
            to_assets,
            total_supply,
            total_assets,
        } => {
            init_tracing(log_level.as_deref().unwrap_or("warn"), None)?;
            convert::execute(decimals, to_shares, to_assets, total_supply, total_assets)
        }
        Commands::Inspect {
            snapshot,
            now,
            events,
            json,
        } => {
            init_tracing(log_level.as_deref().unwrap_or("warn"), None)?;
            inspect::execute(snapshot, now, events, json)
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str, file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // A subscriber may already be installed (tests, repeated calls); keep it.
    let _ = match file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    Ok(())
}
