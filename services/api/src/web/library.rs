//! services/api/src/web/library.rs
//!
//! Handlers for the user's library: saved recipes, pantry and shopping list.

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use recipe_finder_core::domain::{HydratedSavedRecipe, NewListItem, PantryItem, ShoppingItem};
use recipe_finder_core::library::{pantry, saved, shopping, ItemPatch, SAVED_LIST_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// API Payload and Response Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveLocalRequest {
    pub recipe_id: i64,
}

/// Wraps an AI recipe as shown in the UI; only name, ingredients, steps and image are kept.
#[derive(Debug, Deserialize)]
pub struct SaveAiRequest {
    pub recipe: saved::AiRecipeSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedStateResponse {
    /// Whether the recipe is saved after the toggle.
    pub saved: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ListItemRequest {
    pub name: String,
    pub qty: String,
    pub notes: String,
}

impl From<ListItemRequest> for NewListItem {
    fn from(request: ListItemRequest) -> Self {
        Self {
            name: request.name,
            qty: request.qty,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ItemPatchRequest {
    pub name: Option<String>,
    pub qty: Option<String>,
    pub notes: Option<String>,
}

impl From<ItemPatchRequest> for ItemPatch {
    fn from(request: ItemPatchRequest) -> Self {
        Self {
            name: request.name,
            qty: request.qty,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkRequest {
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckedRequest {
    pub checked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedResponse {
    pub removed: Vec<Uuid>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation("invalid id"))
}

//=========================================================================================
// Saved Recipe Handlers
//=========================================================================================

/// Saved recipes, newest first, merged with their live dataset rows.
#[utoipa::path(
    get,
    path = "/api/saved",
    responses(
        (status = 200, description = "Up to 200 saved recipes"),
        (status = 500, description = "Document store error", body = ErrorBody)
    )
)]
pub async fn list_saved_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<HydratedSavedRecipe>>, ApiError> {
    let rows = saved::list_saved(app_state.docs.as_ref(), SAVED_LIST_LIMIT).await?;
    let hydrated = saved::hydrate_saved(app_state.recipes.as_ref(), rows).await;
    Ok(Json(hydrated))
}

/// Save a dataset recipe, or unsave it if already saved.
#[utoipa::path(
    post,
    path = "/api/saved/local",
    request_body = SaveLocalRequest,
    responses(
        (status = 200, description = "The new saved state", body = SavedStateResponse),
        (status = 400, description = "Malformed body", body = ErrorBody)
    )
)]
pub async fn save_local_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SaveLocalRequest>, JsonRejection>,
) -> Result<Json<SavedStateResponse>, ApiError> {
    let Json(request) = payload?;
    let saved = saved::toggle_local(app_state.docs.as_ref(), request.recipe_id).await?;
    Ok(Json(SavedStateResponse { saved }))
}

/// Save an AI recipe snapshot, or unsave it if one with the same name exists.
#[utoipa::path(
    post,
    path = "/api/saved/ai",
    request_body(content_type = "application/json", description = "`{recipe: {name, ingredients, steps, image_url?}}`"),
    responses(
        (status = 200, description = "The new saved state", body = SavedStateResponse),
        (status = 400, description = "Recipe has no name", body = ErrorBody)
    )
)]
pub async fn save_ai_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SaveAiRequest>, JsonRejection>,
) -> Result<Json<SavedStateResponse>, ApiError> {
    let Json(request) = payload?;
    let saved = saved::toggle_ai(app_state.docs.as_ref(), request.recipe).await?;
    Ok(Json(SavedStateResponse { saved }))
}

#[utoipa::path(
    delete,
    path = "/api/saved/{id}",
    params(("id" = Uuid, Path, description = "Saved row id.")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Invalid id", body = ErrorBody)
    )
)]
pub async fn delete_saved_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    saved::delete_saved(app_state.docs.as_ref(), parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Pantry Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/pantry",
    responses((status = 200, description = "Pantry items, newest first"))
)]
pub async fn list_pantry_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<PantryItem>>, ApiError> {
    Ok(Json(pantry::list_pantry(app_state.docs.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/pantry",
    request_body = ListItemRequest,
    responses(
        (status = 201, description = "The stored item"),
        (status = 400, description = "Blank name", body = ErrorBody)
    )
)]
pub async fn add_pantry_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ListItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PantryItem>), ApiError> {
    let Json(request) = payload?;
    let item = pantry::add_pantry_item(app_state.docs.as_ref(), request.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete,
    path = "/api/pantry",
    responses((status = 204, description = "Pantry emptied"))
)]
pub async fn clear_pantry_handler(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    pantry::clear_pantry(app_state.docs.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/pantry/{id}",
    params(("id" = Uuid, Path, description = "Pantry item id.")),
    request_body = ItemPatchRequest,
    responses(
        (status = 200, description = "The updated item"),
        (status = 400, description = "Invalid id or empty patch", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody)
    )
)]
pub async fn update_pantry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatchRequest>, JsonRejection>,
) -> Result<Json<PantryItem>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let item = pantry::update_pantry_item(app_state.docs.as_ref(), id, request.into()).await?;
    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/pantry/{id}",
    params(("id" = Uuid, Path, description = "Pantry item id.")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Invalid id", body = ErrorBody)
    )
)]
pub async fn remove_pantry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    pantry::remove_pantry_item(app_state.docs.as_ref(), parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Shopping List Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/shopping",
    responses((status = 200, description = "Unchecked items first, then newest first"))
)]
pub async fn list_shopping_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShoppingItem>>, ApiError> {
    Ok(Json(shopping::list_shopping(app_state.docs.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/shopping",
    request_body = ListItemRequest,
    responses(
        (status = 201, description = "The stored item"),
        (status = 400, description = "Blank name", body = ErrorBody)
    )
)]
pub async fn add_shopping_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ListItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShoppingItem>), ApiError> {
    let Json(request) = payload?;
    let item = shopping::add_shopping_item(app_state.docs.as_ref(), request.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove every item and report the removed ids.
#[utoipa::path(
    delete,
    path = "/api/shopping",
    responses((status = 200, description = "Ids of the removed items", body = ClearedResponse))
)]
pub async fn clear_shopping_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = shopping::clear_shopping(app_state.docs.as_ref()).await?;
    Ok(Json(ClearedResponse { removed }))
}

/// Add several items at once, e.g. a recipe's ingredient list.
///
/// Entries may be strings or ingredient-like objects; blank entries are skipped.
#[utoipa::path(
    post,
    path = "/api/shopping/bulk",
    request_body(content_type = "application/json", description = "`{items: [string | object]}`"),
    responses((status = 201, description = "The stored items"))
)]
pub async fn add_shopping_bulk_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<ShoppingItem>>), ApiError> {
    let Json(request) = payload?;
    let items = shopping::add_shopping_bulk(app_state.docs.as_ref(), &request.items).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[utoipa::path(
    patch,
    path = "/api/shopping/{id}",
    params(("id" = Uuid, Path, description = "Shopping item id.")),
    request_body = ItemPatchRequest,
    responses(
        (status = 200, description = "The updated item"),
        (status = 400, description = "Invalid id or empty patch", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody)
    )
)]
pub async fn update_shopping_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatchRequest>, JsonRejection>,
) -> Result<Json<ShoppingItem>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let item = shopping::update_shopping_item(app_state.docs.as_ref(), id, request.into()).await?;
    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/shopping/{id}",
    params(("id" = Uuid, Path, description = "Shopping item id.")),
    responses(
        (status = 204, description = "Removed"),
        (status = 400, description = "Invalid id", body = ErrorBody)
    )
)]
pub async fn remove_shopping_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    shopping::remove_shopping_item(app_state.docs.as_ref(), parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/shopping/{id}/checked",
    params(("id" = Uuid, Path, description = "Shopping item id.")),
    request_body = CheckedRequest,
    responses(
        (status = 200, description = "The updated item"),
        (status = 404, description = "No such item", body = ErrorBody)
    )
)]
pub async fn set_checked_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CheckedRequest>, JsonRejection>,
) -> Result<Json<ShoppingItem>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let item = shopping::set_shopping_checked(app_state.docs.as_ref(), id, request.checked).await?;
    Ok(Json(item))
}

/// Move a shopping item into the pantry.
#[utoipa::path(
    post,
    path = "/api/shopping/{id}/move-to-pantry",
    params(("id" = Uuid, Path, description = "Shopping item id.")),
    responses(
        (status = 200, description = "The new pantry item"),
        (status = 404, description = "No such item", body = ErrorBody)
    )
)]
pub async fn move_to_pantry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PantryItem>, ApiError> {
    let item = shopping::move_to_pantry(app_state.docs.as_ref(), parse_id(&id)?).await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/shopping/clear-checked",
    responses((status = 204, description = "Checked items removed"))
)]
pub async fn clear_checked_handler(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    shopping::clear_checked_shopping(app_state.docs.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
