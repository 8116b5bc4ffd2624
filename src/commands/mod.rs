pub mod analyze;
pub mod serve;

use anyhow::{Context, Result};
use std::path::Path;

use stormwatch::config::Config;

// Re-export command functions for convenience
pub use analyze::analyze;
pub use serve::serve;

/// Load configuration from `path`, or from the environment when absent
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Print the effective configuration with secrets masked
pub fn check_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.ingest.api_key.is_some() {
        shown.ingest.api_key = Some(String::from("********"));
    }
    if shown.notifications.push_webhook_token.is_some() {
        shown.notifications.push_webhook_token = Some(String::from("********"));
    }

    let rendered = toml::to_string_pretty(&shown).context("Failed to render configuration")?;

    println!("Configuration OK");
    println!("================");
    println!("{rendered}");
    Ok(())
}
