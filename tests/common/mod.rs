#![allow(dead_code)]

pub mod http;

use std::collections::HashMap;
use std::process::{Command, Output};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tempfile::TempDir;

use stockdesk::credential::{Credential, Session};
use stockdesk::error::{Result, StockdeskError};
use stockdesk::remote::{ListStore, StoreFilter};
use stockdesk::types::{Fields, ItemId, StoreItem, UserId, UserIdentity};

pub const PRINCIPAL: &str = "tech@contoso.com";
pub const SECRET: &str = "correct horse";
pub const USER_ID: i64 = 17;

/// Failure the store should produce on the next sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The identity provider rejects the credential with an AADSTS code
    Rejected,
    /// The network gives up
    Timeout,
}

/// In-memory list store with one valid credential
pub struct MemoryStore {
    lists: Mutex<HashMap<String, Vec<StoreItem>>>,
    next_id: AtomicU64,
    auth_calls: AtomicUsize,
    failure: Mutex<Option<Failure>>,
    user: UserIdentity,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
            auth_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            user: UserIdentity {
                id: UserId(USER_ID),
                login_name: format!("i:0#.f|membership|{PRINCIPAL}"),
                title: "Tech Person".to_string(),
                email: Some(PRINCIPAL.to_string()),
            },
        }
    }

    pub fn seed(&self, list: &str, items: Vec<StoreItem>) {
        self.lists
            .lock()
            .unwrap()
            .entry(list.to_string())
            .or_default()
            .extend(items);
    }

    pub fn items(&self, list: &str) -> Vec<StoreItem> {
        self.lists
            .lock()
            .unwrap()
            .get(list)
            .cloned()
            .unwrap_or_default()
    }

    pub fn item(&self, list: &str, id: u64) -> Option<StoreItem> {
        self.items(list).into_iter().find(|i| i.id == ItemId(id))
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, failure: Failure) {
        *self.failure.lock().unwrap() = Some(failure);
    }
}

impl ListStore for MemoryStore {
    async fn authenticate(&self, credential: &Credential) -> Result<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);

        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(Failure::Rejected) => {
                return Err(StockdeskError::Api {
                    status: 400,
                    message: "AADSTS50126: Error validating credentials due to invalid username or password.".to_string(),
                });
            }
            Some(Failure::Timeout) => {
                return Err(StockdeskError::Transport("operation timed out".to_string()));
            }
            None => {}
        }

        if credential.principal() != PRINCIPAL || credential.secret().expose_secret() != SECRET {
            return Err(StockdeskError::InvalidCredentials(
                "AADSTS50126: Error validating credentials".to_string(),
            ));
        }
        Ok(Session::new(
            credential.principal(),
            SecretString::from("memory-token"),
        ))
    }

    async fn load_site(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    async fn list_items(
        &self,
        _session: &Session,
        list: &str,
        filter: Option<&StoreFilter>,
    ) -> Result<Vec<StoreItem>> {
        Ok(self
            .items(list)
            .into_iter()
            .filter(|item| filter.is_none_or(|f| f.matches(item)))
            .collect())
    }

    async fn get_item(&self, _session: &Session, list: &str, id: ItemId) -> Result<StoreItem> {
        self.item(list, id.0).ok_or_else(|| StockdeskError::NotFound {
            list: list.to_string(),
            id: id.to_string(),
        })
    }

    async fn create_item(&self, _session: &Session, list: &str, fields: &Fields) -> Result<ItemId> {
        let id = ItemId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut properties = fields.clone();
        properties.insert("ID".to_string(), Value::from(id.0));
        self.seed(list, vec![StoreItem { id, properties }]);
        Ok(id)
    }

    async fn update_item(
        &self,
        _session: &Session,
        list: &str,
        id: ItemId,
        fields: &Fields,
    ) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        let item = lists
            .get_mut(list)
            .and_then(|items| items.iter_mut().find(|i| i.id == id))
            .ok_or_else(|| StockdeskError::NotFound {
                list: list.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in fields {
            item.properties.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn current_user(&self, _session: &Session) -> Result<UserIdentity> {
        Ok(self.user.clone())
    }
}

/// An inventory row keyed by internal column names
pub fn inventory_item(id: u64, title: &str, serial: &str, location: &str) -> StoreItem {
    let properties = json!({
        "ID": id,
        "Title": title,
        "field_1": format!("{title} description"),
        "field_2": serial,
        "field_3": location,
        "Condition": "Good",
        "AssignedToId": null,
        "field_4": "2024-01-15T00:00:00Z",
        "field_5": 1299.5,
        "field_6": "Grant",
        "field_7": "Active",
    });
    StoreItem {
        id: ItemId(id),
        properties: properties.as_object().cloned().unwrap_or_default(),
    }
}

/// `count` items numbered from 1, every tenth one in the lab
pub fn inventory(count: u64) -> Vec<StoreItem> {
    (1..=count)
        .map(|id| {
            let location = if id % 10 == 0 { "Computer Lab" } else { "Office" };
            inventory_item(id, &format!("Laptop {id}"), &format!("SN-{id:04}"), location)
        })
        .collect()
}

/// Runs the stockdesk binary against a private config file
pub struct StockdeskTest {
    pub temp_dir: TempDir,
}

impl Default for StockdeskTest {
    fn default() -> Self {
        Self::new()
    }
}

impl StockdeskTest {
    pub fn new() -> Self {
        StockdeskTest {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], vars: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_stockdesk"));
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("STOCKDESK_CONFIG", self.config_path())
            .env_remove("STOCKDESK_USERNAME")
            .env_remove("STOCKDESK_PASSWORD")
            .env_remove("STOCKDESK_SITE_URL")
            .env_remove("STOCKDESK_CLIENT_ID")
            .env_remove("RUST_LOG");
        for (key, value) in vars {
            command.env(key, value);
        }
        command.output().expect("Failed to execute stockdesk command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed but succeeded\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
