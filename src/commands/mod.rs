mod config;
mod inventory;
mod login;
mod report;

pub use config::{cmd_config_get, cmd_config_path, cmd_config_set, cmd_config_show};
pub use inventory::{cmd_find, cmd_ls, cmd_set, cmd_show};
pub use login::cmd_login;
pub use report::{ReportOptions, cmd_report};

use std::env;

use owo_colors::OwoColorize;

use crate::config::Config;
use crate::desk::Desk;
use crate::error::{Result, StockdeskError};
use crate::remote::SharePointStore;
use crate::types::InventoryRecord;

pub const USERNAME_ENV: &str = "STOCKDESK_USERNAME";
pub const PASSWORD_ENV: &str = "STOCKDESK_PASSWORD";

/// Resolve the principal and secret for this invocation.
///
/// `--user` wins over `STOCKDESK_USERNAME`; the password is only ever read
/// from `STOCKDESK_PASSWORD` so it never lands in shell history.
pub fn credentials(user: Option<&str>) -> Result<(String, String)> {
    let principal = match user {
        Some(user) if !user.is_empty() => user.to_string(),
        _ => env::var(USERNAME_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .ok_or(StockdeskError::NotAuthenticated)?,
    };

    let secret = env::var(PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            StockdeskError::Config(format!(
                "no password for '{principal}'. Set {PASSWORD_ENV} in the environment"
            ))
        })?;

    Ok((principal, secret))
}

/// Build a signed-in desk from configuration and the environment
pub fn open_desk(user: Option<&str>) -> Result<Desk<SharePointStore>> {
    let config = Config::load()?;
    let (principal, secret) = credentials(user)?;
    let mut desk = Desk::from_config(&config)?;
    desk.set_credentials(principal, secret);
    Ok(desk)
}

/// Format a record as `Name: value` lines
pub fn format_record(record: &InventoryRecord) -> String {
    let width = record.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    record
        .iter()
        .map(|(name, value)| {
            let label = format!("{:width$}", format!("{name}:"), width = width + 1);
            format!("{} {}", label.cyan(), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
