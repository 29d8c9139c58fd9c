//! Pantry items: ingredients the user has on hand.

use serde_json::json;
use uuid::Uuid;

use super::{decode_rows, required_name, single_row, ItemPatch, PANTRY_TABLE};
use crate::domain::{NewListItem, PantryItem};
use crate::ports::{DocumentStore, Filter, Order, PortResult, SelectQuery};

/// Newest first.
pub async fn list_pantry(docs: &dyn DocumentStore) -> PortResult<Vec<PantryItem>> {
    let query = SelectQuery::new().order_by(Order::desc("created_at"));
    let rows = docs.select(PANTRY_TABLE, &query).await?;
    decode_rows(PANTRY_TABLE, rows)
}

pub async fn add_pantry_item(docs: &dyn DocumentStore, item: NewListItem) -> PortResult<PantryItem> {
    let row = json!({
        "name": required_name(&item.name)?,
        "qty": item.qty.trim(),
        "notes": item.notes.trim(),
    });
    let rows = docs.insert(PANTRY_TABLE, vec![row]).await?;
    single_row(PANTRY_TABLE, rows, "inserted pantry item")
}

pub async fn update_pantry_item(docs: &dyn DocumentStore, id: Uuid, patch: ItemPatch) -> PortResult<PantryItem> {
    let rows = docs
        .update(PANTRY_TABLE, &[Filter::eq("id", id.to_string())], patch.into_document()?)
        .await?;
    single_row(PANTRY_TABLE, rows, &format!("pantry item {id}"))
}

pub async fn remove_pantry_item(docs: &dyn DocumentStore, id: Uuid) -> PortResult<()> {
    docs.delete(PANTRY_TABLE, &[Filter::eq("id", id.to_string())]).await
}

/// Deletes every pantry item.
pub async fn clear_pantry(docs: &dyn DocumentStore) -> PortResult<()> {
    docs.delete(PANTRY_TABLE, &[]).await
}
