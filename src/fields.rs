//! Field mapping tables between display names and SharePoint internal names.
//!
//! SharePoint list columns keep the internal name they were created with
//! (`field_1`, `field_2`, ...) even after being renamed in the site UI, so
//! every list the desk talks to carries a table translating the names the
//! user sees into the names the REST API expects.
//!
//! Lookups are permissive: a display name with no mapping passes through
//! unchanged as [`Resolved::Passthrough`], which lets callers filter on
//! ad-hoc columns without touching the table.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StockdeskError};

/// Value kind of a mapped column, used to coerce raw form input on write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
    Number,
    /// Lookup into the site's user list, written as an integer id
    PersonRef,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::PersonRef => write!(f, "person"),
        }
    }
}

/// One column of a list as seen by both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub display_name: String,
    pub internal_name: String,
    pub kind: FieldKind,
    /// Read-only columns are returned on read but dropped from updates
    pub writable: bool,
}

impl FieldMapping {
    pub fn new(display_name: &str, internal_name: &str, kind: FieldKind) -> Self {
        Self {
            display_name: display_name.to_string(),
            internal_name: internal_name.to_string(),
            kind,
            writable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Column name to use in a write payload.
    ///
    /// Person columns are lookups; SharePoint only accepts them through the
    /// companion `<name>Id` column.
    pub fn write_column(&self) -> Cow<'_, str> {
        match self.kind {
            FieldKind::PersonRef => Cow::Owned(format!("{}Id", self.internal_name)),
            _ => Cow::Borrowed(&self.internal_name),
        }
    }
}

/// Result of translating a display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Mapped(&'a FieldMapping),
    /// No mapping exists; the name is used as-is
    Passthrough(&'a str),
}

impl<'a> Resolved<'a> {
    pub fn internal_name(&self) -> &'a str {
        match *self {
            Resolved::Mapped(mapping) => &mapping.internal_name,
            Resolved::Passthrough(name) => name,
        }
    }

    pub fn mapping(&self) -> Option<&'a FieldMapping> {
        match *self {
            Resolved::Mapped(mapping) => Some(mapping),
            Resolved::Passthrough(_) => None,
        }
    }
}

/// Ordered, bijective mapping for a single list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    fields: Vec<FieldMapping>,
}

impl MappingTable {
    /// Build a table, rejecting duplicate display or internal names
    pub fn new(fields: Vec<FieldMapping>) -> Result<Self> {
        let table = Self { fields };
        table.validate()?;
        Ok(table)
    }

    /// The inventory list. `Status` is maintained by a site workflow and is
    /// never written back.
    pub fn inventory() -> Self {
        Self {
            fields: vec![
                FieldMapping::new("Item", "Title", FieldKind::Text),
                FieldMapping::new("Description", "field_1", FieldKind::Text),
                FieldMapping::new("S/N", "field_2", FieldKind::Text),
                FieldMapping::new("Location", "field_3", FieldKind::Text),
                FieldMapping::new("Condition", "Condition", FieldKind::Text),
                FieldMapping::new("Assigned To", "AssignedTo", FieldKind::PersonRef),
                FieldMapping::new("Date", "field_4", FieldKind::Date),
                FieldMapping::new("Cost", "field_5", FieldKind::Number),
                FieldMapping::new("Funding", "field_6", FieldKind::Text),
                FieldMapping::new("Status", "field_7", FieldKind::Text).read_only(),
            ],
        }
    }

    /// The issue-ticket list
    pub fn tickets() -> Self {
        Self {
            fields: vec![
                FieldMapping::new("Title", "Title", FieldKind::Text),
                FieldMapping::new("Description", "Description", FieldKind::Text),
                FieldMapping::new("Priority", "Priority", FieldKind::Text),
                FieldMapping::new("Reported By", "PersonReportingIssue", FieldKind::PersonRef),
                FieldMapping::new("Related Item", "RelatedItem", FieldKind::Number),
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut display = HashSet::new();
        let mut internal = HashSet::new();
        for field in &self.fields {
            if !display.insert(field.display_name.as_str()) {
                return Err(StockdeskError::InvalidArgument(format!(
                    "duplicate display field '{}'",
                    field.display_name
                )));
            }
            if !internal.insert(field.internal_name.as_str()) {
                return Err(StockdeskError::InvalidArgument(format!(
                    "duplicate internal field '{}'",
                    field.internal_name
                )));
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.display_name.as_str())
    }

    /// Writable display names, in table order
    pub fn editable_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.writable)
            .map(|f| f.display_name.as_str())
    }

    pub fn get(&self, display_name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.display_name == display_name)
    }

    pub fn by_internal(&self, internal_name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.internal_name == internal_name)
    }

    pub fn to_internal<'a>(&'a self, display_name: &'a str) -> Resolved<'a> {
        match self.get(display_name) {
            Some(mapping) => Resolved::Mapped(mapping),
            None => Resolved::Passthrough(display_name),
        }
    }

    /// Reverse lookup, passing unknown internal names through
    pub fn to_display<'a>(&'a self, internal_name: &'a str) -> &'a str {
        self.by_internal(internal_name)
            .map(|f| f.display_name.as_str())
            .unwrap_or(internal_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_bijective() {
        assert!(MappingTable::inventory().validate().is_ok());
        assert!(MappingTable::tickets().validate().is_ok());
    }

    #[test]
    fn test_inventory_internal_names() {
        let table = MappingTable::inventory();
        assert_eq!(table.to_internal("Item").internal_name(), "Title");
        assert_eq!(table.to_internal("S/N").internal_name(), "field_2");
        assert_eq!(table.to_internal("Cost").internal_name(), "field_5");
        assert_eq!(table.to_internal("Status").internal_name(), "field_7");
        assert_eq!(table.fields().len(), 10);
    }

    #[test]
    fn test_unmapped_display_name_passes_through() {
        let table = MappingTable::inventory();
        let resolved = table.to_internal("Warranty");
        assert_eq!(resolved, Resolved::Passthrough("Warranty"));
        assert_eq!(resolved.internal_name(), "Warranty");
        assert!(resolved.mapping().is_none());
    }

    #[test]
    fn test_to_display_passthrough() {
        let table = MappingTable::inventory();
        assert_eq!(table.to_display("field_3"), "Location");
        assert_eq!(table.to_display("Modified"), "Modified");
    }

    #[test]
    fn test_round_trip_is_stable() {
        for table in [MappingTable::inventory(), MappingTable::tickets()] {
            for name in table.display_names() {
                let internal = table.to_internal(name).internal_name();
                let again = table.to_internal(table.to_display(internal)).internal_name();
                assert_eq!(again, internal, "round trip changed '{name}'");
            }
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dup_display = MappingTable::new(vec![
            FieldMapping::new("Item", "Title", FieldKind::Text),
            FieldMapping::new("Item", "field_1", FieldKind::Text),
        ]);
        assert!(matches!(
            dup_display,
            Err(StockdeskError::InvalidArgument(_))
        ));

        let dup_internal = MappingTable::new(vec![
            FieldMapping::new("Item", "Title", FieldKind::Text),
            FieldMapping::new("Name", "Title", FieldKind::Text),
        ]);
        assert!(dup_internal.is_err());
    }

    #[test]
    fn test_write_column_for_person_fields() {
        let table = MappingTable::inventory();
        assert_eq!(table.get("Assigned To").unwrap().write_column(), "AssignedToId");
        assert_eq!(table.get("Location").unwrap().write_column(), "field_3");
        let tickets = MappingTable::tickets();
        assert_eq!(
            tickets.get("Reported By").unwrap().write_column(),
            "PersonReportingIssueId"
        );
    }

    #[test]
    fn test_status_is_read_only() {
        let table = MappingTable::inventory();
        assert!(!table.get("Status").unwrap().writable);
        assert!(!table.editable_names().any(|n| n == "Status"));
        assert_eq!(table.editable_names().count(), 9);
    }
}
