//! The user's library: saved recipes, pantry and shopping list.
//!
//! All three live in the hosted document store and are reached only through
//! the [`DocumentStore`](crate::ports::DocumentStore) port.

pub mod pantry;
pub mod saved;
pub mod shopping;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ports::{PortError, PortResult};

pub const FAVORITES_TABLE: &str = "favorites";
pub const PANTRY_TABLE: &str = "pantry_items";
pub const SHOPPING_TABLE: &str = "shopping_items";

/// Default and maximum number of saved recipes listed.
pub const SAVED_LIST_LIMIT: usize = 200;

/// A partial update of a pantry or shopping entry. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub qty: Option<String>,
    pub notes: Option<String>,
}

impl ItemPatch {
    fn into_document(self) -> PortResult<Value> {
        let mut patch = Map::new();
        if let Some(name) = self.name {
            patch.insert("name".to_string(), Value::String(required_name(&name)?));
        }
        if let Some(qty) = self.qty {
            patch.insert("qty".to_string(), Value::String(qty.trim().to_string()));
        }
        if let Some(notes) = self.notes {
            patch.insert("notes".to_string(), Value::String(notes.trim().to_string()));
        }
        if patch.is_empty() {
            return Err(PortError::Validation("Nothing to update".to_string()));
        }
        Ok(Value::Object(patch))
    }
}

fn required_name(name: &str) -> PortResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortError::Validation("name required".to_string()));
    }
    Ok(name.to_string())
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> PortResult<Vec<T>> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> PortResult<T> {
    serde_json::from_value(row)
        .map_err(|e| PortError::Unexpected(format!("Malformed {table} row: {e}")))
}

/// The first returned row, or `NotFound` naming what was looked up.
fn single_row<T: DeserializeOwned>(table: &str, rows: Vec<Value>, what: &str) -> PortResult<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| PortError::NotFound(what.to_string()))?;
    decode_row(table, row)
}
