//! Remote list store.
//!
//! This module defines the capability the desk needs from a list-oriented
//! store and provides the SharePoint implementation of it.

pub mod error;
pub mod sharepoint;

use crate::credential::{Credential, Session};
use crate::error::Result;
use crate::types::{Fields, ItemId, StoreItem, UserIdentity};

pub use sharepoint::SharePointStore;

/// Substring predicate on one internal column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFilter {
    pub field: String,
    pub value: String,
}

impl StoreFilter {
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a raw column value satisfies the predicate (case sensitive)
    pub fn matches(&self, item: &StoreItem) -> bool {
        match item.properties.get(&self.field) {
            Some(serde_json::Value::String(s)) => s.contains(&self.value),
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string().contains(&self.value),
        }
    }
}

/// Common interface for list stores.
///
/// Every method takes the session it runs under; implementations must not
/// hold on to a session past the call.
pub trait ListStore: Send + Sync {
    /// Exchange a credential for a session
    fn authenticate(
        &self,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<Session>> + Send;

    /// Load the site itself, proving the session is accepted
    fn load_site(&self, session: &Session) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch every item of a list, optionally filtered, in store order
    fn list_items(
        &self,
        session: &Session,
        list: &str,
        filter: Option<&StoreFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<StoreItem>>> + Send;

    /// Fetch one item, failing with `NotFound` when absent
    fn get_item(
        &self,
        session: &Session,
        list: &str,
        id: ItemId,
    ) -> impl std::future::Future<Output = Result<StoreItem>> + Send;

    /// Create an item and return its new id
    fn create_item(
        &self,
        session: &Session,
        list: &str,
        fields: &Fields,
    ) -> impl std::future::Future<Output = Result<ItemId>> + Send;

    /// Merge `fields` into an existing item (last write wins)
    fn update_item(
        &self,
        session: &Session,
        list: &str,
        id: ItemId,
        fields: &Fields,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// The user the session belongs to
    fn current_user(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<UserIdentity>> + Send;
}
