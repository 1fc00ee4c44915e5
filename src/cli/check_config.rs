use super::init_tracing;
use allocator::config::{default_config_path, AllocatorConfig};
use allocator::mechanism::MechanismConfig;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Load and validate a configuration file
///
/// Tracing is initialized from the file's `[logging]` table unless
/// `--log-level` overrides it.
pub fn execute(
    config: Option<String>,
    log_level: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config.map(PathBuf::from).unwrap_or_else(default_config_path);
    let loaded = AllocatorConfig::load(&config_path)?;

    let level = log_level.unwrap_or_else(|| loaded.logging.level.clone());
    init_tracing(&level, loaded.logging.file.as_deref())?;

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let resolved = loaded.to_mechanism_config(now)?;
    tracing::debug!(path = %config_path.display(), "config validated");

    println!("✅ {} is valid", config_path.display());
    println!();
    print!("{}", render_schedule(&resolved));
    Ok(())
}

fn human(secs: u64) -> String {
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

/// Resolved schedule and parameters, one per line.
pub fn render_schedule(config: &MechanismConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  Shares:          {} ({}), 18 decimals\n",
        config.share_name, config.share_symbol
    ));
    out.push_str(&format!(
        "  Asset:           {} ({} decimals)\n",
        config.asset, config.asset_decimals
    ));
    out.push_str(&format!("  Controller:      {}\n", config.controller));
    out.push_str(&format!("  Mechanism:       {}\n", config.mechanism));
    out.push_str(&format!("  Start:           {}\n", config.start_time));
    out.push_str(&format!(
        "  Voting window:   ({}, {}) [delay {}, period {}]\n",
        config.voting_start(),
        config.voting_end(),
        human(config.voting_delay),
        human(config.voting_period)
    ));
    out.push_str(&format!("  Quorum:          {} shares\n", config.quorum_shares));
    out.push_str(&format!("  Timelock:        {}\n", human(config.timelock_delay)));
    out.push_str(&format!("  Grace period:    {}\n", human(config.grace_period)));
    out.push_str(&format!(
        "  Forwarding:      {:?}\n",
        config.forwarding_policy
    ));
    out
}
