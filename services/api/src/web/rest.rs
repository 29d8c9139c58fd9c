//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the recipe dataset endpoints (health, search,
//! recipe detail, facets) and the master definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::{ai, library, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use recipe_finder_core::domain::{FacetCounts, Recipe, SearchResult};
use recipe_finder_core::ports::PortError;
use recipe_finder_core::search::{self, RawSearchParams, SearchQuery};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        search_handler,
        recipe_handler,
        facets_handler,
        ai::ai_recipes_handler,
        ai::ai_search_handler,
        ai::ai_image_handler,
        ai::saved_image_handler,
        library::list_saved_handler,
        library::save_local_handler,
        library::save_ai_handler,
        library::delete_saved_handler,
        library::list_pantry_handler,
        library::add_pantry_handler,
        library::clear_pantry_handler,
        library::update_pantry_handler,
        library::remove_pantry_handler,
        library::list_shopping_handler,
        library::add_shopping_handler,
        library::clear_shopping_handler,
        library::add_shopping_bulk_handler,
        library::update_shopping_handler,
        library::remove_shopping_handler,
        library::set_checked_handler,
        library::move_to_pantry_handler,
        library::clear_checked_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            ai::AiRecipesRequest,
            ai::AiImageRequest,
            ai::SavedImageRequest,
            ai::ImageUrlResponse,
            library::SaveLocalRequest,
            library::SavedStateResponse,
            library::ListItemRequest,
            library::ItemPatchRequest,
            library::CheckedRequest,
            library::ClearedResponse,
        )
    ),
    tags(
        (name = "Recipe Finder API", description = "Recipe search, AI recipe generation and the user's library.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// Liveness probe result. `db` on success, `error` on failure.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Check that the recipe database answers.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    match app_state.recipes.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                db: Some(app_state.config.db_path.display().to_string()),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    ok: false,
                    db: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Full-text search with filters, sorting and pagination.
///
/// Every parameter is optional; malformed values fall back to their defaults.
#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("q" = Option<String>, Query, description = "Free text; up to 6 terms are matched."),
        ("cuisine" = Option<String>, Query, description = "Exact cuisine."),
        ("diet" = Option<String>, Query, description = "Exact diet."),
        ("min_rating" = Option<f64>, Query, description = "Minimum rating; 0 disables."),
        ("max_minutes" = Option<i64>, Query, description = "Maximum minutes; 0 disables."),
        ("page" = Option<u32>, Query, description = "1-based page number."),
        ("page_size" = Option<u32>, Query, description = "Between 1 and 50, default 20."),
        ("sort" = Option<String>, Query, description = "relevance, rating, minutes-asc, minutes-desc or popularity.")
    ),
    responses(
        (status = 200, description = "One page of results with `page`, `page_size`, `total`, `pages` and `items`"),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<SearchResult>, ApiError> {
    let query = SearchQuery::from_raw(&params);
    let result = search::run_search(app_state.recipes.as_ref(), &query).await?;
    Ok(Json(result))
}

/// Fetch one recipe from the dataset.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe id.")),
    responses(
        (status = 200, description = "The full recipe row"),
        (status = 400, description = "Non-numeric id", body = ErrorBody),
        (status = 404, description = "No recipe with that id", body = ErrorBody)
    )
)]
pub async fn recipe_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("invalid id"))?;

    match app_state.recipes.get_recipe(id).await {
        Ok(recipe) => Ok(Json(recipe)),
        Err(PortError::NotFound(_)) => Err(ApiError::NotFound("Not found".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Distinct cuisines and diets with their counts.
#[utoipa::path(
    get,
    path = "/api/facets",
    responses(
        (status = 200, description = "`cuisines` (top 40) and `diets` (top 20) by count"),
        (status = 500, description = "Database error", body = ErrorBody)
    )
)]
pub async fn facets_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<FacetCounts>, ApiError> {
    let counts = search::facet_counts(app_state.recipes.as_ref()).await?;
    Ok(Json(counts))
}
