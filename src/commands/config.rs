//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config path`: Print the config file location
//! - `config set`: Set a configuration value
//! - `config get`: Print a single value

use owo_colors::OwoColorize;
use serde_json::json;

use crate::config::{CONFIG_KEYS, Config};
use crate::error::{Result, StockdeskError};

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Reject `auth_client_id` style keys with a dot-notation hint
fn validate_config_key(key: &str) -> Result<&str> {
    if CONFIG_KEYS.contains(&key) {
        return Ok(key);
    }

    let dotted = key.replacen('_', ".", 1);
    if CONFIG_KEYS.contains(&dotted.as_str()) {
        return Err(StockdeskError::Config(format!(
            "invalid config key '{key}'. Use dot notation: '{dotted}'"
        )));
    }

    Err(StockdeskError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    )))
}

fn display_or_unset(value: Option<String>) -> String {
    match value {
        Some(v) => v,
        None => "not configured".dimmed().to_string(),
    }
}

/// Show current configuration
pub fn cmd_config_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let client_id = config.client_id();

    if output_json {
        let output = json!({
            "site_url": config.site_url(),
            "auth": {
                "authority": config.auth.authority,
                "tenant": config.auth.tenant,
                "client_id": client_id.as_deref().map(mask_sensitive_value),
            },
            "lists": {
                "inventory": config.lists.inventory,
                "tickets": config.lists.tickets,
            },
            "page_size": config.page_size,
            "request_timeout": config.request_timeout,
            "connect_timeout": config.connect_timeout,
            "log_level": config.log_level,
            "config_file": Config::config_path().to_string_lossy(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}\n", "Configuration:".cyan().bold());
    println!("{}: {}", "site_url".cyan(), display_or_unset(config.site_url()));
    println!();

    println!("{}:", "auth".cyan());
    println!("  authority: {}", config.auth.authority);
    println!("  tenant: {}", config.auth.tenant);
    println!(
        "  client_id: {}",
        display_or_unset(client_id.as_deref().map(mask_sensitive_value))
    );
    println!();

    println!("{}:", "lists".cyan());
    println!("  inventory: {}", config.lists.inventory);
    println!("  tickets: {}", config.lists.tickets);
    println!();

    println!("{}: {}", "page_size".cyan(), config.page_size);
    println!("{}: {}s", "request_timeout".cyan(), config.request_timeout);
    println!("{}: {}s", "connect_timeout".cyan(), config.connect_timeout);
    println!("{}: {}", "log_level".cyan(), config.log_level);
    println!();
    println!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    );
    Ok(())
}

/// Print the config file location
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path().display());
    Ok(())
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;

    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    let shown = if key == "auth.client_id" {
        mask_sensitive_value(value)
    } else {
        value.to_string()
    };
    println!("Set {} = {}", key.cyan(), shown);
    Ok(())
}

/// Print a single configuration value
pub fn cmd_config_get(key: &str) -> Result<()> {
    validate_config_key(key)?;

    let config = Config::load()?;
    match config.get_value(key)? {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Err(StockdeskError::Config(format!("{key} not set"))),
    }
}
