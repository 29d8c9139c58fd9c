//! crates/recipe_finder_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database or provider wire format; the
//! serde derives describe the JSON shape the HTTP layer returns.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

//=========================================================================================
// Recipe Dataset
//=========================================================================================

/// A full row of the local recipe dataset, as returned by `/api/recipes/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: Option<String>,
    pub minutes: Option<i64>,
    pub rating: Option<f64>,
    pub popularity: Option<i64>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub description: Option<String>,
    /// Free text as stored; may itself be a serialized list of steps.
    pub steps: Option<String>,
    pub ingredients: Vec<String>,
    pub nutrition: Vec<f64>,
    pub n_ingredients: Option<i64>,
    pub n_steps: Option<i64>,
    pub submitted: Option<String>,
}

/// The projection of a recipe returned in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: Option<String>,
    pub minutes: Option<i64>,
    pub rating: Option<f64>,
    pub popularity: Option<i64>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub description: Option<String>,
    pub steps: Option<String>,
    pub ingredients: Vec<String>,
    /// Relevance score. Lower is a better match.
    pub score: f64,
}

/// One page of rows plus the unpaginated count, as produced by a recipe store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub total: u64,
    pub items: Vec<RecipeSummary>,
}

/// The response body of `/api/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub pages: u64,
    pub items: Vec<RecipeSummary>,
}

/// A distinct categorical value with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    pub cuisines: Vec<Facet>,
    pub diets: Vec<Facet>,
}

//=========================================================================================
// AI Recipes
//=========================================================================================

/// A single ingredient line of an LLM-generated recipe in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiIngredient {
    pub ingredient: String,
    pub quantity: f64,
    pub unit: String,
    pub prep: Option<String>,
    pub notes: Option<String>,
}

impl AiIngredient {
    /// Wraps a bare ingredient name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            ingredient: name.into(),
            quantity: 0.0,
            unit: String::new(),
            prep: None,
            notes: None,
        }
    }
}

/// An LLM-generated recipe after normalization.
///
/// Only ever constructed with non-empty `ingredients` and `steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRecipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<f64>,
    #[serde(default)]
    pub total_time_minutes: Option<f64>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    pub ingredients: Vec<AiIngredient>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A message sent to the text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMessage {
    System(String),
    User(String),
}

/// A binary image returned by the image provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Bytes,
}

impl ImagePayload {
    /// File extension used when persisting the image.
    pub fn extension(&self) -> &'static str {
        if self.mime_type == "image/png" {
            "png"
        } else {
            "jpg"
        }
    }
}

//=========================================================================================
// User Library (saved recipes, pantry, shopping list)
//=========================================================================================

/// A row of the saved-recipe (favorites) table.
///
/// Exactly one of `recipe_id` (local dataset recipe) or the AI snapshot fields
/// (`is_ai_recipe = true`) backs a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRecipe {
    pub id: Uuid,
    #[serde(default)]
    pub recipe_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_ai_recipe: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Value>,
    #[serde(default)]
    pub instructions: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A saved recipe merged with the live dataset row it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedSavedRecipe {
    #[serde(flatten)]
    pub saved: SavedRecipe,
    pub description: Option<String>,
    pub steps: Vec<String>,
    pub minutes: Option<i64>,
    pub rating: Option<f64>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub local_recipe: Option<Recipe>,
    pub local_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub qty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub qty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Name, quantity and notes of a new pantry or shopping entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListItem {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub qty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Document stores return `null` for unset columns; treat it like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
