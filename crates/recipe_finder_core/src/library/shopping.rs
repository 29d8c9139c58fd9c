//! Shopping list items, including bulk import from recipe ingredient lists.

use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{decode_rows, required_name, single_row, ItemPatch, PANTRY_TABLE, SHOPPING_TABLE};
use crate::domain::{NewListItem, PantryItem, ShoppingItem};
use crate::ports::{DocumentStore, Filter, Order, PortError, PortResult, SelectQuery};

const NAME_KEYS: [&str; 5] = ["name", "ingredient", "item", "food", "title"];
const QTY_KEYS: [&str; 3] = ["qty", "quantity", "amount"];
const UNIT_KEYS: [&str; 2] = ["unit", "measure"];
const NOTE_KEYS: [&str; 5] = ["notes", "prep", "preparation", "detail", "description"];

/// Unchecked items first, then newest first.
pub async fn list_shopping(docs: &dyn DocumentStore) -> PortResult<Vec<ShoppingItem>> {
    let query = SelectQuery::new()
        .order_by(Order::asc("checked"))
        .order_by(Order::desc("created_at"));
    let rows = docs.select(SHOPPING_TABLE, &query).await?;
    decode_rows(SHOPPING_TABLE, rows)
}

pub async fn add_shopping_item(docs: &dyn DocumentStore, item: NewListItem) -> PortResult<ShoppingItem> {
    let row = item_document(&NewListItem {
        name: required_name(&item.name)?,
        ..item
    });
    let rows = docs.insert(SHOPPING_TABLE, vec![row]).await?;
    single_row(SHOPPING_TABLE, rows, "inserted shopping item")
}

/// Adds every usable entry in one insert. Unusable entries are skipped silently.
pub async fn add_shopping_bulk(docs: &dyn DocumentStore, entries: &[Value]) -> PortResult<Vec<ShoppingItem>> {
    let rows: Vec<Value> = entries
        .iter()
        .filter_map(coerce_bulk_entry)
        .map(|item| item_document(&item))
        .collect();
    debug!(received = entries.len(), usable = rows.len(), "Bulk shopping insert");
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let inserted = docs.insert(SHOPPING_TABLE, rows).await?;
    decode_rows(SHOPPING_TABLE, inserted)
}

/// Coerces one loosely-shaped entry (a string, or an ingredient-like object).
pub fn coerce_bulk_entry(entry: &Value) -> Option<NewListItem> {
    match entry {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| NewListItem {
                name: name.to_string(),
                ..Default::default()
            })
        }
        Value::Object(object) => {
            let name = first_present(object, &NAME_KEYS)?.as_str()?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let qty = [first_present(object, &QTY_KEYS), first_present(object, &UNIT_KEYS)]
                .into_iter()
                .flatten()
                .filter_map(scalar_text)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let notes = NOTE_KEYS
                .iter()
                .filter_map(|key| object.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .find(|note| !note.is_empty())
                .unwrap_or_default()
                .to_string();
            Some(NewListItem { name, qty, notes })
        }
        _ => None,
    }
}

/// The first key whose value is present and not `null`.
fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn item_document(item: &NewListItem) -> Value {
    json!({
        "name": item.name.trim(),
        "qty": item.qty.trim(),
        "notes": item.notes.trim(),
        "checked": false,
    })
}

pub async fn update_shopping_item(docs: &dyn DocumentStore, id: Uuid, patch: ItemPatch) -> PortResult<ShoppingItem> {
    let rows = docs
        .update(SHOPPING_TABLE, &[Filter::eq("id", id.to_string())], patch.into_document()?)
        .await?;
    single_row(SHOPPING_TABLE, rows, &format!("shopping item {id}"))
}

pub async fn set_shopping_checked(docs: &dyn DocumentStore, id: Uuid, checked: bool) -> PortResult<ShoppingItem> {
    let rows = docs
        .update(SHOPPING_TABLE, &[Filter::eq("id", id.to_string())], json!({ "checked": checked }))
        .await?;
    single_row(SHOPPING_TABLE, rows, &format!("shopping item {id}"))
}

pub async fn remove_shopping_item(docs: &dyn DocumentStore, id: Uuid) -> PortResult<()> {
    docs.delete(SHOPPING_TABLE, &[Filter::eq("id", id.to_string())]).await
}

pub async fn clear_checked_shopping(docs: &dyn DocumentStore) -> PortResult<()> {
    docs.delete(SHOPPING_TABLE, &[Filter::eq("checked", true)]).await
}

/// Reads the item, adds it to the pantry, then removes it from the list.
///
/// The steps are not atomic: a failed delete leaves the item in both lists.
pub async fn move_to_pantry(docs: &dyn DocumentStore, id: Uuid) -> PortResult<PantryItem> {
    let filters = [Filter::eq("id", id.to_string())];
    let rows = docs
        .select(SHOPPING_TABLE, &SelectQuery { filters: filters.to_vec(), ..Default::default() })
        .await?;
    let item: ShoppingItem = single_row(SHOPPING_TABLE, rows, &format!("shopping item {id}"))?;

    let pantry_row = json!({ "name": item.name, "qty": item.qty, "notes": item.notes });
    let inserted = docs.insert(PANTRY_TABLE, vec![pantry_row]).await?;
    let pantry_item = single_row(PANTRY_TABLE, inserted, "inserted pantry item")?;

    docs.delete(SHOPPING_TABLE, &filters).await?;
    Ok(pantry_item)
}

/// Deletes every item and returns the removed ids.
pub async fn clear_shopping(docs: &dyn DocumentStore) -> PortResult<Vec<Uuid>> {
    let rows = docs.select(SHOPPING_TABLE, &SelectQuery::new()).await?;
    let ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|row| row.get("id").and_then(Value::as_str))
        .map(|id| Uuid::parse_str(id).map_err(|e| PortError::Unexpected(format!("Malformed shopping item id: {e}"))))
        .collect::<PortResult<_>>()?;
    if ids.is_empty() {
        return Ok(ids);
    }

    let values = ids.iter().map(|id| Value::String(id.to_string())).collect();
    docs.delete(SHOPPING_TABLE, &[Filter::is_in("id", values)]).await?;
    Ok(ids)
}
