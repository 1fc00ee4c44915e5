//! Allocator configuration file handling
//!
//! Operator configuration is TOML. The `[mechanism]` table describes one
//! allocation round; `[logging]` controls the binary's tracing output.
//!
//! Addresses are hex strings, durations accept humantime ("3d", "12h") or
//! integer seconds, and the quorum is a decimal string because TOML integers
//! stop at 64 bits.

use crate::error::AllocationError;
use crate::forwarding::ForwardingPolicy;
use crate::mechanism::MechanismConfig;
use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write config file '{path}': {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Invalid {field}: {reason}")]
    Field { field: &'static str, reason: String },

    #[error(transparent)]
    Invalid(#[from] AllocationError),
}

/// Allocator operator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    pub mechanism: MechanismSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One allocation round, as written by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismSettings {
    /// Underlying asset token (hex address)
    pub asset: String,
    pub asset_decimals: u8,
    #[serde(default = "default_share_name")]
    pub share_name: String,
    #[serde(default = "default_share_symbol")]
    pub share_symbol: String,
    pub voting_delay: String,
    pub voting_period: String,
    /// Minimum net votes in 18-decimal share units
    pub quorum_shares: String,
    pub timelock_delay: String,
    pub grace_period: String,
    pub controller: String,
    /// Account holding the pooled asset
    pub mechanism: String,
    /// Fixed creation time; the current time is used when unset.
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    #[serde(default)]
    pub forwarding_policy: ForwardingPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_share_name() -> String {
    "Allocation Shares".to_string()
}

fn default_share_symbol() -> String {
    "ALLOC".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl AllocatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        write_file(path, &contents)
    }

    /// Resolve into an engine config, validating every field.
    pub fn to_mechanism_config(&self, now: Timestamp) -> Result<MechanismConfig, ConfigError> {
        let settings = &self.mechanism;
        let config = MechanismConfig {
            asset: parse_address("asset", &settings.asset)?,
            asset_decimals: settings.asset_decimals,
            share_name: settings.share_name.clone(),
            share_symbol: settings.share_symbol.clone(),
            voting_delay: parse_field_duration("voting_delay", &settings.voting_delay)?,
            voting_period: parse_field_duration("voting_period", &settings.voting_period)?,
            quorum_shares: settings
                .quorum_shares
                .trim()
                .replace('_', "")
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::Field {
                    field: "quorum_shares",
                    reason: e.to_string(),
                })?,
            timelock_delay: parse_field_duration("timelock_delay", &settings.timelock_delay)?,
            grace_period: parse_field_duration("grace_period", &settings.grace_period)?,
            controller: parse_address("controller", &settings.controller)?,
            mechanism: parse_address("mechanism", &settings.mechanism)?,
            start_time: settings.start_time.unwrap_or(now),
            forwarding_policy: settings.forwarding_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        r#"# Allocator Configuration
#
# One allocation round: registration, proposals, a single voting window,
# finalization, share minting and timelocked redemption.

[mechanism]
# Underlying asset token
asset = "0x00000000000000000000000000000000000a55e7"

# Native precision of the asset (0..=36). Shares always use 18.
asset_decimals = 18

share_name = "Allocation Shares"
share_symbol = "ALLOC"

# Durations accept humantime ("3d", "12h") or integer seconds
voting_delay = "1d"
voting_period = "7d"
timelock_delay = "2d"
grace_period = "14d"

# Minimum net votes (for - against), in 18-decimal share units
quorum_shares = "1000000000000000000000"

# Controlling party: finalizes the tally and sweeps residuals
controller = "0x00000000000000000000000000000000000000c0"

# Account that holds the pooled asset
mechanism = "0x0000000000000000000000000000000000000011"

# Fixed creation time (unix seconds); defaults to now
# start_time = 1700000000

# Downstream vote forwarding for batches: "all-or-nothing" or "best-effort"
forwarding_policy = "all-or-nothing"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/allocator/allocator.log"
"#
        .to_string()
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::Field {
        field,
        reason: format!("{}", e),
    })
}

fn parse_field_duration(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    parse_duration_to_secs(value).map_err(|reason| ConfigError::Field { field, reason })
}

/// Parse a duration to seconds.
///
/// Accepts integer seconds ("3600") or humantime ("1h", "7 days").
///
/// ```
/// use allocator::config::parse_duration_to_secs;
///
/// assert_eq!(parse_duration_to_secs("0").unwrap(), 0);
/// assert_eq!(parse_duration_to_secs("3600").unwrap(), 3600);
/// assert_eq!(parse_duration_to_secs("1h").unwrap(), 3600);
/// assert_eq!(parse_duration_to_secs("7 days").unwrap(), 604800);
/// ```
pub fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(secs);
    }

    humantime::parse_duration(input)
        .map(|d| d.as_secs())
        .map_err(|e| format!("Invalid duration '{}': {}", input, e))
}

/// Get the default config file path
///
/// - Linux: ~/.config/allocator/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("allocator")
        .join("config.toml")
}
