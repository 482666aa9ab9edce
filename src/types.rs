use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, StockdeskError};
use crate::fields::{FieldKind, MappingTable};

/// Raw column payload keyed by internal field name
pub type Fields = serde_json::Map<String, Value>;

/// Key under which a listed record repeats its id
pub const ID_KEY: &str = "ID";
pub const ITEM_ID_KEY: &str = "Item ID";

/// Store-assigned list item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = StockdeskError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(ItemId)
            .map_err(|_| StockdeskError::InvalidArgument(format!("invalid item id '{s}'")))
    }
}

/// Site user identifier, as used by person columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed-in user as reported by the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub login_name: String,
    pub title: String,
    pub email: Option<String>,
}

/// A list item as returned by the store, keyed by internal names
#[derive(Debug, Clone, PartialEq)]
pub struct StoreItem {
    pub id: ItemId,
    pub properties: Fields,
}

/// Loosely typed column value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Empty),
            },
            // Expanded lookups come back as objects; keep their display title
            Value::Object(map) => map
                .get("Title")
                .and_then(Value::as_str)
                .map(|t| FieldValue::Text(t.to_string()))
                .unwrap_or_else(|| FieldValue::Text(value.to_string())),
            Value::Array(_) => FieldValue::Text(value.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_str(""),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// An item translated into display names, in mapping-table order
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub id: ItemId,
    fields: Vec<(String, FieldValue)>,
}

impl InventoryRecord {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    /// Translate a store item through `table`.
    ///
    /// Every mapped column appears in the result; columns the store did not
    /// return are empty. Person columns fall back to their `<name>Id`
    /// companion when the lookup itself was not expanded.
    pub fn from_store(table: &MappingTable, item: &StoreItem) -> Self {
        let mut record = Self::new(item.id);
        for mapping in table.fields() {
            let raw = item.properties.get(&mapping.internal_name).or_else(|| {
                if mapping.kind == FieldKind::PersonRef {
                    item.properties.get(mapping.write_column().as_ref())
                } else {
                    None
                }
            });
            let value = raw.map(FieldValue::from).unwrap_or(FieldValue::Empty);
            record.insert(&mapping.display_name, value);
        }
        record
    }

    /// Like [`from_store`](Self::from_store), with the id repeated under
    /// `ID` and `Item ID` ahead of the mapped columns
    pub fn from_listed(table: &MappingTable, item: &StoreItem) -> Self {
        let mut record = Self::new(item.id);
        let id = FieldValue::Integer(item.id.0 as i64);
        record.insert(ID_KEY, id.clone());
        record.insert(ITEM_ID_KEY, id);
        record
            .fields
            .extend(Self::from_store(table, item).fields);
        record
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Display text of a field, empty when absent
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for InventoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
