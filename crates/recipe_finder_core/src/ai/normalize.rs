//! Normalization of LLM recipe output into [`AiRecipe`] values.
//!
//! Every AI surface (search assist, dinner inspiration, photo identification,
//! remix) passes its raw response text through [`normalize_ai_response`].

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::repair::{normalize_instructions, parse_loose_list, strip_code_fence};
use crate::domain::{AiIngredient, AiRecipe};

const INGREDIENT_NAME_KEYS: [&str; 5] = ["ingredient", "name", "item", "food", "title"];

/// Why a candidate entry was dropped from the normalized output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAiRecipe {
    #[error("recipe entry is not a JSON object")]
    NotAnObject,
    #[error("recipe '{name}' has no usable ingredients")]
    NoIngredients { name: String },
    #[error("recipe '{name}' has no usable steps")]
    NoSteps { name: String },
}

/// Parses raw LLM text and returns every entry that normalizes to a valid recipe.
///
/// A lone recipe object counts as a one-element list. Unparseable text yields an
/// empty list; the caller decides how to present that.
pub fn normalize_ai_response(text: &str) -> Vec<AiRecipe> {
    let Some(candidates) = recipe_candidates(text) else {
        warn!(chars = text.len(), "AI response could not be parsed as a recipe list");
        return Vec::new();
    };

    candidates
        .iter()
        .filter_map(|candidate| match normalize_recipe(candidate) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                debug!("Dropping AI recipe entry: {}", e);
                None
            }
        })
        .collect()
}

fn recipe_candidates(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(text)) {
        Ok(object @ Value::Object(_)) => Some(vec![object]),
        _ => parse_loose_list(text),
    }
}

/// Coerces one loosely-typed recipe object into canonical shape.
pub fn normalize_recipe(value: &Value) -> Result<AiRecipe, InvalidAiRecipe> {
    let object = value.as_object().ok_or(InvalidAiRecipe::NotAnObject)?;
    let name = text_field(object, "name").unwrap_or_default();

    let ingredients = match object.get("ingredients") {
        Some(Value::Array(entries)) => entries.iter().filter_map(coerce_ingredient).collect(),
        _ => Vec::new(),
    };
    if ingredients.is_empty() {
        return Err(InvalidAiRecipe::NoIngredients { name });
    }

    let steps = ["steps", "instructions"]
        .iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()))
        .map(normalize_instructions)
        .unwrap_or_default();
    if steps.is_empty() {
        return Err(InvalidAiRecipe::NoSteps { name });
    }

    let tags = match object.get("tags") {
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(AiRecipe {
        name,
        description: text_field(object, "description"),
        servings: number_field(object.get("servings")),
        total_time_minutes: number_field(object.get("total_time_minutes")),
        diet: text_field(object, "diet"),
        cuisine: text_field(object, "cuisine"),
        ingredients,
        steps,
        tags,
        image_url: text_field(object, "image_url"),
    })
}

/// A bare string becomes a zero-quantity ingredient. Objects are always kept; an
/// object with no recognizable name key gets an empty name.
fn coerce_ingredient(entry: &Value) -> Option<AiIngredient> {
    match entry {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| AiIngredient::named(name))
        }
        Value::Object(object) => {
            let ingredient = INGREDIENT_NAME_KEYS
                .iter()
                .find_map(|key| text_field(object, key))
                .unwrap_or_default();
            Some(AiIngredient {
                ingredient,
                quantity: number_field(object.get("quantity")).unwrap_or(0.0),
                unit: raw_text(object.get("unit")).unwrap_or_default(),
                prep: text_field(object, "prep"),
                notes: text_field(object, "notes"),
            })
        }
        _ => None,
    }
}

/// A non-blank string field, trimmed.
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    raw_text(object.get(key))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn raw_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Numbers pass through; numeric strings are parsed; anything else is absent.
fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
