//! Application configuration.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory (or the path in `STOCKDESK_CONFIG`) and includes:
//! - The SharePoint site and list names
//! - The identity provider tenant and client id used to sign in
//! - Request timeouts, page size and log level

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StockdeskError};

pub const CONFIG_ENV: &str = "STOCKDESK_CONFIG";
pub const SITE_URL_ENV: &str = "STOCKDESK_SITE_URL";
pub const CLIENT_ID_ENV: &str = "STOCKDESK_CLIENT_ID";

/// Identity provider that issues tokens for SharePoint Online
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Keys accepted by `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "site_url",
    "auth.authority",
    "auth.tenant",
    "auth.client_id",
    "lists.inventory",
    "lists.tickets",
    "page_size",
    "request_timeout",
    "connect_timeout",
    "log_level",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SharePoint site, e.g. `https://contoso.sharepoint.com/sites/TechHelp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub lists: ListsConfig,

    /// Rows per inventory page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Log filter used when `RUST_LOG` is unset (default: warn)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    100
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: None,
            auth: AuthConfig::default(),
            lists: ListsConfig::default(),
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            log_level: default_log_level(),
        }
    }
}

/// Identity provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token issuer base URL (default: the Microsoft identity platform)
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Directory tenant (default: organizations)
    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// Public client application id registered for the site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_tenant() -> String {
    "organizations".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            tenant: default_tenant(),
            client_id: None,
        }
    }
}

/// List titles on the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListsConfig {
    #[serde(default = "default_inventory_list")]
    pub inventory: String,
    #[serde(default = "default_tickets_list")]
    pub tickets: String,
}

fn default_inventory_list() -> String {
    "Inventory".to_string()
}

fn default_tickets_list() -> String {
    "Tickets".to_string()
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            inventory: default_inventory_list(),
            tickets: default_tickets_list(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        ProjectDirs::from("", "", "stockdesk")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from(".stockdesk").join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            StockdeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StockdeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            StockdeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Owner read/write only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    /// Get the site URL from the environment or config file
    pub fn site_url(&self) -> Option<String> {
        if let Ok(url) = env::var(SITE_URL_ENV)
            && !url.is_empty()
        {
            return Some(url);
        }

        self.site_url.clone()
    }

    /// Get the client id from the environment or config file
    pub fn client_id(&self) -> Option<String> {
        if let Ok(id) = env::var(CLIENT_ID_ENV)
            && !id.is_empty()
        {
            return Some(id);
        }

        self.auth.client_id.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Set a value by dotted key, validating numeric settings
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "site_url" => {
                url::Url::parse(value).map_err(|e| {
                    StockdeskError::Config(format!("invalid site_url '{value}': {e}"))
                })?;
                self.site_url = Some(value.to_string());
            }
            "auth.authority" => {
                url::Url::parse(value).map_err(|e| {
                    StockdeskError::Config(format!("invalid auth.authority '{value}': {e}"))
                })?;
                self.auth.authority = value.to_string();
            }
            "auth.tenant" => self.auth.tenant = value.to_string(),
            "auth.client_id" => self.auth.client_id = Some(value.to_string()),
            "lists.inventory" => self.lists.inventory = value.to_string(),
            "lists.tickets" => self.lists.tickets = value.to_string(),
            "page_size" => self.page_size = parse_positive(key, value)?,
            "request_timeout" => self.request_timeout = parse_positive(key, value)?,
            "connect_timeout" => self.connect_timeout = parse_positive(key, value)?,
            "log_level" => self.log_level = value.to_string(),
            _ => {
                return Err(StockdeskError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Get a value by dotted key
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "site_url" => self.site_url(),
            "auth.authority" => Some(self.auth.authority.clone()),
            "auth.tenant" => Some(self.auth.tenant.clone()),
            "auth.client_id" => self.client_id(),
            "lists.inventory" => Some(self.lists.inventory.clone()),
            "lists.tickets" => Some(self.lists.tickets.clone()),
            "page_size" => Some(self.page_size.to_string()),
            "request_timeout" => Some(self.request_timeout.to_string()),
            "connect_timeout" => Some(self.connect_timeout.to_string()),
            "log_level" => Some(self.log_level.clone()),
            _ => {
                return Err(StockdeskError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        };
        Ok(value)
    }
}

/// Parse a setting that must be a whole number above zero
fn parse_positive<T: std::str::FromStr + Default + PartialEq>(key: &str, value: &str) -> Result<T> {
    let number: T = value
        .trim()
        .parse()
        .map_err(|_| StockdeskError::Config(format!("'{key}' expects a number, got '{value}'")))?;
    if number == T::default() {
        return Err(StockdeskError::Config(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.site_url.is_none());
        assert!(config.auth.client_id.is_none());
        assert_eq!(config.auth.tenant, "organizations");
        assert_eq!(config.auth.authority, DEFAULT_AUTHORITY);
        assert_eq!(config.lists.inventory, "Inventory");
        assert_eq!(config.lists.tickets, "Tickets");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let yaml = r#"
site_url: https://contoso.sharepoint.com/sites/TechHelp
auth:
  client_id: abc-123
"#;

        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            config.site_url.as_deref(),
            Some("https://contoso.sharepoint.com/sites/TechHelp")
        );
        assert_eq!(config.auth.client_id.as_deref(), Some("abc-123"));
        assert_eq!(config.auth.tenant, "organizations");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.connect_timeout, 10);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config
            .set_value("site_url", "https://contoso.sharepoint.com/sites/Help")
            .unwrap();
        config.set_value("lists.tickets", "Issues").unwrap();
        config.set_value("request_timeout", "45").unwrap();

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed: Config = serde_yaml_ng::from_str(&yaml).unwrap();

        assert_eq!(
            parsed.site_url.as_deref(),
            Some("https://contoso.sharepoint.com/sites/Help")
        );
        assert_eq!(parsed.lists.tickets, "Issues");
        assert_eq!(parsed.request_timeout, 45);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("page_size", "0").is_err());
        assert!(config.set_value("page_size", "lots").is_err());
        assert!(config.set_value("request_timeout", "0").is_err());
        assert!(config.set_value("connect_timeout", "0").is_err());
        assert!(config.set_value("auth.authority", "nowhere").is_err());
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.connect_timeout, 10);
        assert!(config.set_value("site_url", "not a url").is_err());
        assert!(config.set_value("github.token", "x").is_err());
    }

    #[test]
    fn test_get_value() {
        let mut config = Config::default();
        config.set_value("page_size", "25").unwrap();
        assert_eq!(config.get_value("page_size").unwrap().as_deref(), Some("25"));
        assert_eq!(
            config.get_value("lists.inventory").unwrap().as_deref(),
            Some("Inventory")
        );
        assert!(config.get_value("nope").is_err());
    }

    #[test]
    #[serial]
    fn test_site_url_env_overrides_file() {
        let config = Config {
            site_url: Some("https://contoso.sharepoint.com/sites/File".to_string()),
            ..Config::default()
        };
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { env::set_var(SITE_URL_ENV, "https://contoso.sharepoint.com/sites/Env") };
        assert_eq!(
            config.site_url().as_deref(),
            Some("https://contoso.sharepoint.com/sites/Env")
        );
        unsafe { env::remove_var(SITE_URL_ENV) };
        assert_eq!(
            config.site_url().as_deref(),
            Some("https://contoso.sharepoint.com/sites/File")
        );
    }

    #[test]
    #[serial]
    fn test_save_and_load_via_config_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { env::set_var(CONFIG_ENV, &path) };

        assert_eq!(Config::config_path(), path);
        assert_eq!(Config::load().unwrap().page_size, 100);

        let mut config = Config::default();
        config.set_value("auth.client_id", "abc-123").unwrap();
        config.set_value("page_size", "20").unwrap();
        config.save().unwrap();

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.auth.client_id.as_deref(), Some("abc-123"));
        assert_eq!(loaded.page_size, 20);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        unsafe { env::remove_var(CONFIG_ENV) };
    }
}
