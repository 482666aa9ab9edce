//! Filtered list queries.

use crate::credential::Session;
use crate::error::Result;
use crate::fields::MappingTable;
use crate::remote::{ListStore, StoreFilter};
use crate::types::InventoryRecord;

/// A substring search on one display field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Build a filter from optional form input; a missing field or blank
    /// value means "no filter"
    pub fn from_parts(field: Option<&str>, value: Option<&str>) -> Option<Self> {
        match (field, value) {
            (Some(field), Some(value)) if !field.is_empty() && !value.is_empty() => {
                Some(Self::new(field, value))
            }
            _ => None,
        }
    }

    /// Translate into a store predicate on the internal column
    pub fn to_store_filter(&self, table: &MappingTable) -> StoreFilter {
        StoreFilter::contains(table.to_internal(&self.field).internal_name(), &self.value)
    }
}

/// Fetch every matching item of `list`, translated through `table`.
///
/// Records carry their id under `ID` and `Item ID` as well as every mapped
/// field.
pub async fn list_items<S: ListStore>(
    store: &S,
    session: &Session,
    table: &MappingTable,
    list: &str,
    filter: Option<&FieldFilter>,
) -> Result<Vec<InventoryRecord>> {
    let store_filter = filter.map(|f| f.to_store_filter(table));

    let items = store
        .list_items(session, list, store_filter.as_ref())
        .await
        .inspect_err(|e| {
            tracing::error!(list, filter = ?store_filter, "list_items failed: {e}")
        })?;

    tracing::debug!(list, count = items.len(), "retrieved items");
    Ok(items
        .iter()
        .map(|item| InventoryRecord::from_listed(table, item))
        .collect())
}

/// Find an inventory item by serial number, falling back to its name.
///
/// Returns the first match in store order.
pub async fn find_item<S: ListStore>(
    store: &S,
    session: &Session,
    table: &MappingTable,
    list: &str,
    value: &str,
) -> Result<Option<InventoryRecord>> {
    if value.trim().is_empty() {
        return Ok(None);
    }

    for field in ["S/N", "Item"] {
        let filter = FieldFilter::new(field, value);
        let mut matches = list_items(store, session, table, list, Some(&filter)).await?;
        if !matches.is_empty() {
            return Ok(Some(matches.swap_remove(0)));
        }
    }
    Ok(None)
}
