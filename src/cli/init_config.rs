use allocator::config::{default_config_path, AllocatorConfig};
use std::path::PathBuf;

/// Write the commented default configuration
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn execute(path: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    AllocatorConfig::create_default(&config_path)?;
    tracing::info!(path = %config_path.display(), "default config written");

    println!("✅ Wrote default configuration to {}", config_path.display());
    println!("   Edit the [mechanism] table, then run `allocator check-config`.");
    Ok(())
}
