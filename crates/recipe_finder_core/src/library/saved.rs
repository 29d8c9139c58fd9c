//! Saved recipes ("favorites"): local dataset references and AI snapshots.

use bytes::Bytes;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::{decode_rows, FAVORITES_TABLE};
use crate::ai::normalize_instructions;
use crate::domain::{HydratedSavedRecipe, ImagePayload, Recipe, SavedRecipe};
use crate::image::saved_image_path;
use crate::ports::{BlobStore, DocumentStore, Filter, Order, PortError, PortResult, RecipeStore, SelectQuery};

/// The part of an AI recipe that is persisted as a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiRecipeSnapshot {
    pub name: Option<String>,
    pub ingredients: Option<Value>,
    pub steps: Option<Value>,
    pub image_url: Option<String>,
}

/// Newest first, at most `limit` rows.
pub async fn list_saved(docs: &dyn DocumentStore, limit: usize) -> PortResult<Vec<SavedRecipe>> {
    let query = SelectQuery::new().order_by(Order::desc("created_at")).limit(limit);
    let rows = docs.select(FAVORITES_TABLE, &query).await?;
    decode_rows(FAVORITES_TABLE, rows)
}

/// Saves the local recipe, or removes it if already saved. Returns whether it is now saved.
pub async fn toggle_local(docs: &dyn DocumentStore, recipe_id: i64) -> PortResult<bool> {
    let filters = [Filter::eq("is_ai_recipe", false), Filter::eq("recipe_id", recipe_id)];
    if exists(docs, &filters).await? {
        docs.delete(FAVORITES_TABLE, &filters).await?;
        info!(recipe_id, "Removed saved local recipe");
        return Ok(false);
    }

    let row = json!({
        "recipe_id": recipe_id,
        "is_ai_recipe": false,
        "name": null,
        "ingredients": null,
        "instructions": null,
    });
    docs.insert(FAVORITES_TABLE, vec![row]).await?;
    info!(recipe_id, "Saved local recipe");
    Ok(true)
}

/// Saves the AI snapshot, or removes the one with the same name. Returns whether it is now saved.
pub async fn toggle_ai(docs: &dyn DocumentStore, recipe: AiRecipeSnapshot) -> PortResult<bool> {
    let name = recipe
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PortError::Validation("Recipe name is required to save".to_string()))?
        .to_string();

    let filters = [Filter::eq("is_ai_recipe", true), Filter::eq("name", name.clone())];
    if exists(docs, &filters).await? {
        docs.delete(FAVORITES_TABLE, &filters).await?;
        info!(%name, "Removed saved AI recipe");
        return Ok(false);
    }

    let row = json!({
        "recipe_id": null,
        "is_ai_recipe": true,
        "name": name,
        "ingredients": recipe.ingredients.unwrap_or_else(|| json!([])),
        "instructions": recipe.steps.unwrap_or_else(|| json!([])),
        "image_url": recipe.image_url,
    });
    docs.insert(FAVORITES_TABLE, vec![row]).await?;
    info!(%name, "Saved AI recipe");
    Ok(true)
}

pub async fn delete_saved(docs: &dyn DocumentStore, id: Uuid) -> PortResult<()> {
    docs.delete(FAVORITES_TABLE, &[Filter::eq("id", id.to_string())]).await
}

async fn exists(docs: &dyn DocumentStore, filters: &[Filter]) -> PortResult<bool> {
    let query = SelectQuery {
        filters: filters.to_vec(),
        order: Vec::new(),
        limit: Some(1),
    };
    Ok(!docs.select(FAVORITES_TABLE, &query).await?.is_empty())
}

/// Uploads a generated image for a saved recipe and records its public URL on the row.
///
/// A failed row update leaves the uploaded image in place.
pub async fn store_saved_image(
    blobs: &dyn BlobStore,
    docs: &dyn DocumentStore,
    saved_id: &str,
    payload: ImagePayload,
) -> PortResult<String> {
    let path = saved_image_path(saved_id, &payload);
    let content_type = if payload.mime_type.is_empty() {
        "image/jpeg".to_string()
    } else {
        payload.mime_type.clone()
    };
    let data: Bytes = payload.data;
    let url = blobs.upload(&path, data, &content_type).await?;

    docs.update(
        FAVORITES_TABLE,
        &[Filter::eq("id", saved_id)],
        json!({ "image_url": url }),
    )
    .await?;
    info!(%saved_id, %path, "Stored saved recipe image");
    Ok(url)
}

/// Merges each local saved row with its live dataset recipe.
///
/// Distinct recipe ids are fetched concurrently. A failed fetch only marks the
/// affected rows with `local_error`; AI snapshots pass through with their
/// instructions normalized.
pub async fn hydrate_saved(recipes: &dyn RecipeStore, rows: Vec<SavedRecipe>) -> Vec<HydratedSavedRecipe> {
    let mut ids: Vec<i64> = rows
        .iter()
        .filter(|row| !row.is_ai_recipe)
        .filter_map(|row| row.recipe_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let fetched = join_all(ids.iter().map(|&id| async move { (id, recipes.get_recipe(id).await) })).await;
    let lookup: HashMap<i64, PortResult<Recipe>> = fetched.into_iter().collect();

    rows.into_iter()
        .map(|row| {
            let local = match (row.is_ai_recipe, row.recipe_id) {
                (false, Some(id)) => lookup.get(&id).map(|result| (id, result)),
                _ => None,
            };
            match local {
                Some((_, Ok(recipe))) => merge_local(row, recipe.clone()),
                Some((id, Err(e))) => {
                    warn!(recipe_id = id, error = %e, "Failed to load saved recipe");
                    HydratedSavedRecipe {
                        local_error: Some(format!("Failed to load recipe #{id}")),
                        ..passthrough(row)
                    }
                }
                None => passthrough(row),
            }
        })
        .collect()
}

fn passthrough(saved: SavedRecipe) -> HydratedSavedRecipe {
    let steps = saved.instructions.as_ref().map(normalize_instructions).unwrap_or_default();
    HydratedSavedRecipe {
        saved,
        description: None,
        steps,
        minutes: None,
        rating: None,
        cuisine: None,
        diet: None,
        local_recipe: None,
        local_error: None,
    }
}

fn merge_local(mut saved: SavedRecipe, recipe: Recipe) -> HydratedSavedRecipe {
    let from_recipe = recipe
        .steps
        .as_ref()
        .map(|steps| normalize_instructions(&Value::String(steps.clone())))
        .unwrap_or_default();
    let steps = if from_recipe.is_empty() {
        saved.instructions.as_ref().map(normalize_instructions).unwrap_or_default()
    } else {
        from_recipe
    };

    if let Some(name) = recipe.name.clone().filter(|n| !n.is_empty()) {
        saved.name = Some(name);
    }
    if !recipe.ingredients.is_empty() {
        saved.ingredients = Some(json!(recipe.ingredients));
    } else if saved.ingredients.is_none() {
        saved.ingredients = Some(json!([]));
    }
    saved.instructions = Some(json!(steps));

    HydratedSavedRecipe {
        saved,
        description: recipe.description.clone(),
        steps,
        minutes: recipe.minutes,
        rating: recipe.rating,
        cuisine: recipe.cuisine.clone(),
        diet: recipe.diet.clone(),
        local_recipe: Some(recipe),
        local_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{MemoryBlobStore, MemoryDocumentStore, MemoryRecipeStore};

    fn recipe(id: i64, name: &str) -> Recipe {
        Recipe {
            id,
            name: Some(name.to_string()),
            minutes: Some(30),
            rating: Some(4.5),
            popularity: Some(12),
            cuisine: Some("Italian".to_string()),
            diet: None,
            description: Some("classic".to_string()),
            steps: Some("['boil water', 'cook pasta']".to_string()),
            ingredients: vec!["pasta".to_string(), "salt".to_string()],
            nutrition: vec![],
            n_ingredients: Some(2),
            n_steps: Some(2),
            submitted: None,
        }
    }

    fn snapshot(name: &str) -> AiRecipeSnapshot {
        AiRecipeSnapshot {
            name: Some(name.to_string()),
            ingredients: Some(json!([{"ingredient": "rice", "quantity": 1, "unit": "cup"}])),
            steps: Some(json!(["1. Rinse", "2. Simmer"])),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_toggle_local_adds_then_removes() {
        let docs = MemoryDocumentStore::default();
        assert!(toggle_local(&docs, 7).await.unwrap());
        assert_eq!(docs.rows(FAVORITES_TABLE).len(), 1);

        assert!(!toggle_local(&docs, 7).await.unwrap());
        assert!(docs.rows(FAVORITES_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_local_dedups_by_recipe_id() {
        let docs = MemoryDocumentStore::default();
        toggle_local(&docs, 1).await.unwrap();
        toggle_local(&docs, 2).await.unwrap();
        toggle_local(&docs, 1).await.unwrap();

        let saved = list_saved(&docs, 200).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].recipe_id, Some(2));
        assert!(!saved[0].is_ai_recipe);
    }

    #[tokio::test]
    async fn test_toggle_ai_dedups_by_name() {
        let docs = MemoryDocumentStore::default();
        assert!(toggle_ai(&docs, snapshot("Rice Bowl")).await.unwrap());
        assert!(toggle_ai(&docs, snapshot("Soup")).await.unwrap());
        assert!(!toggle_ai(&docs, snapshot("  Rice Bowl ")).await.unwrap());

        let saved = list_saved(&docs, 200).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name.as_deref(), Some("Soup"));
        assert!(saved[0].is_ai_recipe);
    }

    #[tokio::test]
    async fn test_ai_snapshot_without_name_cannot_be_saved() {
        let docs = MemoryDocumentStore::default();
        let err = toggle_ai(&docs, snapshot("   ")).await.unwrap_err();
        assert_eq!(err, PortError::Validation("Recipe name is required to save".to_string()));
        assert!(docs.rows(FAVORITES_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_list_saved_newest_first_with_limit() {
        let docs = MemoryDocumentStore::default();
        for id in 1..=5 {
            toggle_local(&docs, id).await.unwrap();
        }
        let saved = list_saved(&docs, 3).await.unwrap();
        let ids: Vec<Option<i64>> = saved.iter().map(|s| s.recipe_id).collect();
        assert_eq!(ids, vec![Some(5), Some(4), Some(3)]);
    }

    #[tokio::test]
    async fn test_hydrate_merges_local_and_marks_failures() {
        let docs = MemoryDocumentStore::default();
        toggle_local(&docs, 1).await.unwrap();
        toggle_local(&docs, 99).await.unwrap();
        toggle_ai(&docs, snapshot("Rice Bowl")).await.unwrap();
        let rows = list_saved(&docs, 200).await.unwrap();

        let store = MemoryRecipeStore::default().with_recipe(recipe(1, "Pasta"));
        let hydrated = hydrate_saved(&store, rows).await;
        assert_eq!(hydrated.len(), 3);

        let ai = &hydrated[0];
        assert_eq!(ai.steps, vec!["Rinse", "Simmer"]);
        assert!(ai.local_recipe.is_none());

        let missing = &hydrated[1];
        assert_eq!(missing.local_error.as_deref(), Some("Failed to load recipe #99"));

        let local = &hydrated[2];
        assert_eq!(local.saved.name.as_deref(), Some("Pasta"));
        assert_eq!(local.steps, vec!["boil water", "cook pasta"]);
        assert_eq!(local.saved.ingredients, Some(json!(["pasta", "salt"])));
        assert_eq!(local.cuisine.as_deref(), Some("Italian"));
        assert_eq!(local.local_recipe.as_ref().map(|r| r.id), Some(1));
    }

    #[tokio::test]
    async fn test_hydrate_fetches_each_recipe_once() {
        let docs = MemoryDocumentStore::default();
        toggle_local(&docs, 1).await.unwrap();
        let mut rows = list_saved(&docs, 200).await.unwrap();
        rows.push(rows[0].clone());

        let store = MemoryRecipeStore::default().with_recipe(recipe(1, "Pasta"));
        let hydrated = hydrate_saved(&store, rows).await;
        assert_eq!(hydrated.len(), 2);
        assert_eq!(store.recipe_lookups(), vec![1]);
    }

    #[tokio::test]
    async fn test_store_saved_image_uploads_then_updates_row() {
        let docs = MemoryDocumentStore::default();
        toggle_ai(&docs, snapshot("Rice Bowl")).await.unwrap();
        let saved_id = list_saved(&docs, 1).await.unwrap()[0].id.to_string();
        let blobs = MemoryBlobStore::default();

        let payload = ImagePayload {
            mime_type: "image/png".to_string(),
            data: Bytes::from_static(b"png-bytes"),
        };
        let url = store_saved_image(&blobs, &docs, &saved_id, payload).await.unwrap();

        let path = format!("saved/{saved_id}.png");
        assert_eq!(blobs.uploads(), vec![(path.clone(), "image/png".to_string())]);
        assert!(url.ends_with(&path));
        let saved = list_saved(&docs, 1).await.unwrap();
        assert_eq!(saved[0].image_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_row_untouched() {
        let docs = MemoryDocumentStore::default();
        toggle_ai(&docs, snapshot("Rice Bowl")).await.unwrap();
        let saved_id = list_saved(&docs, 1).await.unwrap()[0].id.to_string();
        let blobs = MemoryBlobStore::failing(PortError::Storage("bucket missing".to_string()));

        let payload = ImagePayload {
            mime_type: "image/jpeg".to_string(),
            data: Bytes::new(),
        };
        let err = store_saved_image(&blobs, &docs, &saved_id, payload).await.unwrap_err();
        assert_eq!(err, PortError::Storage("bucket missing".to_string()));
        assert_eq!(list_saved(&docs, 1).await.unwrap()[0].image_url, None);
    }
}
