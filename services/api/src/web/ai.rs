//! services/api/src/web/ai.rs
//!
//! Handlers for the LLM recipe endpoints and the two image endpoints.

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use recipe_finder_core::ai::{self, AiSearchRequest, GeneratedRecipes};
use recipe_finder_core::domain::ImagePayload;
use recipe_finder_core::image::{self, IngredientInput};
use recipe_finder_core::library::saved;
use recipe_finder_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AiRecipesRequest {
    pub prompt: Option<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AiImageRequest {
    pub name: Option<String>,
    /// Bare strings or `{ingredient, quantity, unit}` objects.
    #[schema(value_type = Option<Vec<Object>>)]
    pub ingredients: Option<Value>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SavedImageRequest {
    pub saved_id: Option<String>,
    pub name: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub ingredients: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub image_url: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// The image prompt for a name and a raw ingredient list.
fn image_prompt(name: Option<&str>, ingredients: Option<&Value>) -> String {
    let inputs: Vec<IngredientInput> = image::ingredient_inputs(ingredients).unwrap_or_default();
    image::build_image_prompt(name, &inputs)
}

async fn generate_image(app_state: &AppState, prompt: &str) -> Result<ImagePayload, ApiError> {
    image::generate_with_retry(
        app_state.images.as_ref(),
        app_state.pause.as_ref(),
        &app_state.retry_policy,
        prompt,
    )
    .await
    .map_err(|e| ApiError::Port(PortError::from(e)))
}

fn data_url(payload: &ImagePayload) -> String {
    let mime = if payload.mime_type.is_empty() {
        "image/jpeg"
    } else {
        payload.mime_type.as_str()
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(&payload.data))
}

//=========================================================================================
// AI Handlers
//=========================================================================================

/// Free-form recipe generation from a prompt.
///
/// Returns the raw model text and the recipes normalized from it.
#[utoipa::path(
    post,
    path = "/api/ai-recipes",
    request_body = AiRecipesRequest,
    responses(
        (status = 200, description = "`text` (raw model output) and `recipes` (normalized)"),
        (status = 400, description = "Missing prompt", body = ErrorBody),
        (status = 500, description = "LLM provider error", body = ErrorBody)
    )
)]
pub async fn ai_recipes_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<AiRecipesRequest>, JsonRejection>,
) -> Result<Json<GeneratedRecipes>, ApiError> {
    let Json(request) = payload?;
    let messages = ai::build_recipe_messages(
        request.prompt.as_deref().unwrap_or_default(),
        request.system_prompt.as_deref(),
    )?;
    let generated = ai::generate_recipes(app_state.llm.as_ref(), &messages).await?;
    Ok(Json(generated))
}

/// Structured recipe search: diet, cuisine, required ingredients and pantry.
#[utoipa::path(
    post,
    path = "/api/ai-search",
    request_body(
        content_type = "application/json",
        description = "`{q, diet, cuisine, ingredients[], pantry[], systemPrompt?, prompt?}`; every field optional."
    ),
    responses(
        (status = 200, description = "`text` (raw model output) and `recipes` (normalized)"),
        (status = 500, description = "LLM provider error", body = ErrorBody)
    )
)]
pub async fn ai_search_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<AiSearchRequest>, JsonRejection>,
) -> Result<Json<GeneratedRecipes>, ApiError> {
    let Json(request) = payload?;
    let messages = ai::build_search_messages(&request);
    let generated = ai::generate_recipes(app_state.llm.as_ref(), &messages).await?;
    Ok(Json(generated))
}

/// Generate a dish photo and return it inline as a data URL.
#[utoipa::path(
    post,
    path = "/api/ai-image",
    request_body = AiImageRequest,
    responses(
        (status = 200, description = "A `data:` URL of the image", body = ImageUrlResponse),
        (status = 400, description = "Neither name nor ingredients given", body = ErrorBody),
        (status = 500, description = "Image provider error or no image after all attempts", body = ErrorBody)
    )
)]
pub async fn ai_image_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<AiImageRequest>, JsonRejection>,
) -> Result<Json<ImageUrlResponse>, ApiError> {
    let Json(request) = payload?;
    let has_name = request.name.as_deref().is_some_and(|n| !n.is_empty());
    let has_ingredients = matches!(request.ingredients, Some(Value::Array(_)));
    if !has_name && !has_ingredients {
        return Err(ApiError::validation("name or ingredients required"));
    }

    let prompt = image_prompt(request.name.as_deref(), request.ingredients.as_ref());
    let payload = generate_image(&app_state, &prompt).await?;
    Ok(Json(ImageUrlResponse {
        image_url: data_url(&payload),
    }))
}

/// Generate a dish photo for a saved recipe, store it, and record its URL on the row.
#[utoipa::path(
    post,
    path = "/api/saved-image",
    request_body = SavedImageRequest,
    responses(
        (status = 200, description = "The public URL of the stored image", body = ImageUrlResponse),
        (status = 400, description = "Missing saved_id", body = ErrorBody),
        (status = 500, description = "Provider or storage error", body = ErrorBody)
    )
)]
pub async fn saved_image_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SavedImageRequest>, JsonRejection>,
) -> Result<Json<ImageUrlResponse>, ApiError> {
    let Json(request) = payload?;
    let saved_id = request
        .saved_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("saved_id required"))?;

    let prompt = image_prompt(request.name.as_deref(), request.ingredients.as_ref());
    let payload = generate_image(&app_state, &prompt).await?;
    let image_url =
        saved::store_saved_image(app_state.blobs.as_ref(), app_state.docs.as_ref(), saved_id, payload).await?;
    info!(%saved_id, "Saved recipe image ready");
    Ok(Json(ImageUrlResponse { image_url }))
}
