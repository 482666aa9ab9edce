//! Reading single items and applying partial updates.
//!
//! Updates arrive as raw form text keyed by display name. Each value is
//! coerced according to its column kind before anything is sent, so a bad
//! value in one field rejects the whole update.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::credential::Session;
use crate::error::{Result, StockdeskError};
use crate::fields::{FieldKind, FieldMapping, MappingTable, Resolved};
use crate::remote::ListStore;
use crate::types::{Fields, InventoryRecord, ItemId};

/// Raw form values keyed by display name
pub type Changes = BTreeMap<String, String>;

/// Coerce one raw value for a column.
///
/// - person: blank clears the lookup, otherwise an integer user id
/// - number: blank clears the value, otherwise a finite float
/// - date: blank clears the value, otherwise passed through unformatted
/// - text: verbatim
pub fn coerce_value(mapping: &FieldMapping, raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let coercion_error = || StockdeskError::Coercion {
        field: mapping.display_name.clone(),
        value: raw.to_string(),
        kind: mapping.kind,
    };

    match mapping.kind {
        FieldKind::PersonRef => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let id: i64 = trimmed.parse().map_err(|_| coercion_error())?;
            Ok(Value::from(id))
        }
        FieldKind::Number => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let number: f64 = trimmed.parse().map_err(|_| coercion_error())?;
            Number::from_f64(number)
                .map(Value::Number)
                .ok_or_else(coercion_error)
        }
        FieldKind::Date => {
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(raw.to_string()))
            }
        }
        FieldKind::Text => Ok(Value::String(raw.to_string())),
    }
}

/// Translate form changes into a write payload keyed by internal columns.
///
/// Unmapped and read-only fields are skipped.
pub fn coerce_changes(table: &MappingTable, changes: &Changes) -> Result<Fields> {
    let mut fields = Fields::new();
    for (display_name, raw) in changes {
        let mapping = match table.to_internal(display_name) {
            Resolved::Mapped(mapping) => mapping,
            Resolved::Passthrough(name) => {
                tracing::debug!(field = name, "ignoring unmapped field in update");
                continue;
            }
        };
        if !mapping.writable {
            tracing::debug!(field = %mapping.display_name, "ignoring read-only field in update");
            continue;
        }
        let value = coerce_value(mapping, raw)?;
        fields.insert(mapping.write_column().into_owned(), value);
    }
    Ok(fields)
}

/// Fetch one item by id
pub async fn get_item<S: ListStore>(
    store: &S,
    session: &Session,
    table: &MappingTable,
    list: &str,
    id: ItemId,
) -> Result<InventoryRecord> {
    let item = store
        .get_item(session, list, id)
        .await
        .inspect_err(|e| tracing::error!(list, %id, "get_item failed: {e}"))?;

    let record = InventoryRecord::from_store(table, &item);
    tracing::debug!(list, %id, "retrieved item");
    Ok(record)
}

/// Apply a partial update to one item
pub async fn update_item<S: ListStore>(
    store: &S,
    session: &Session,
    table: &MappingTable,
    list: &str,
    id: ItemId,
    changes: &Changes,
) -> Result<()> {
    let fields = coerce_changes(table, changes)?;
    if fields.is_empty() {
        tracing::debug!(list, %id, "no writable fields in update");
        return Ok(());
    }

    store
        .update_item(session, list, id, &fields)
        .await
        .inspect_err(|e| tracing::error!(list, %id, "update_item failed: {e}"))?;

    tracing::debug!(list, %id, fields = fields.len(), "updated item");
    Ok(())
}
