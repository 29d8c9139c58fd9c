//! Prompt construction for the recipe-generation endpoints.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::{null_as_default, PromptMessage};
use crate::ports::{PortError, PortResult};

/// System prompt for free-form generation when the caller supplies none.
pub const DEFAULT_RECIPE_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates recipes based on \
dietary preferences, description and ingredients. Return a JSON array of recipes with fields: name, \
description, ingredients (array of strings), steps (array of strings).";

/// Fallback user prompt for a structured search with no inputs at all.
pub const NO_FILTERS_PROMPT: &str = "No filters provided. Propose 3 popular recipes.";

const LABEL_KEYS: [&str; 5] = ["ingredient", "name", "item", "food", "title"];

/// The body of a structured AI search request.
///
/// Every field is optional and `null` reads as empty. Ingredient and pantry
/// lists accept strings, numbers or objects carrying a name key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiSearchRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub q: String,
    #[serde(deserialize_with = "null_as_default")]
    pub diet: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cuisine: String,
    #[serde(deserialize_with = "lenient_labels")]
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "lenient_labels")]
    pub pantry: Vec<String>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
    pub prompt: Option<String>,
}

fn lenient_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(label).collect(),
        single => label(&single).into_iter().collect(),
    };
    Ok(labels)
}

fn label(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(object) => LABEL_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(|s| s.trim().to_string())?,
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Builds the `[system, user]` pair for free-form generation.
pub fn build_recipe_messages(prompt: &str, system_prompt: Option<&str>) -> PortResult<Vec<PromptMessage>> {
    if prompt.trim().is_empty() {
        return Err(PortError::Validation("Missing prompt".to_string()));
    }
    let system = non_empty(system_prompt).unwrap_or(DEFAULT_RECIPE_SYSTEM_PROMPT);
    Ok(vec![
        PromptMessage::System(system.to_string()),
        PromptMessage::User(prompt.to_string()),
    ])
}

/// Builds the `[system, user]` pair for a structured search.
///
/// An explicit `prompt` replaces the prompt derived from the filters; the pantry
/// line is always prepended.
pub fn build_search_messages(request: &AiSearchRequest) -> Vec<PromptMessage> {
    let user_prompt = match non_empty(request.prompt.as_deref()) {
        Some(prompt) => prompt.to_string(),
        None => search_prompt(request),
    };
    let system = match non_empty(request.system_prompt.as_deref()) {
        Some(system) => system.to_string(),
        None => strict_generator_prompt(&request.pantry),
    };
    vec![
        PromptMessage::System(system),
        PromptMessage::User(format!("{}\n\n{}", pantry_line(&request.pantry), user_prompt)),
    ]
}

fn search_prompt(request: &AiSearchRequest) -> String {
    let mut lines = Vec::new();
    if !request.diet.trim().is_empty() {
        lines.push(format!("Diet: {}", request.diet));
    }
    if !request.cuisine.trim().is_empty() {
        lines.push(format!("Cuisine: {}", request.cuisine));
    }
    if !request.ingredients.is_empty() {
        lines.push(format!("User-required ingredients: {}", request.ingredients.join(", ")));
    }
    if !request.q.trim().is_empty() {
        lines.push(format!("User query: {}", request.q));
    }

    if lines.is_empty() {
        NO_FILTERS_PROMPT.to_string()
    } else {
        format!(
            "Create exactly 3 recipes that satisfy ALL of the following:\n{}",
            lines.join("\n")
        )
    }
}

fn pantry_line(pantry: &[String]) -> String {
    if pantry.is_empty() {
        "Pantry items available for substitution: (none)".to_string()
    } else {
        format!("Pantry items available for substitution: {}", pantry.join(", "))
    }
}

/// The strict JSON-only generator prompt, with the pantry embedded as JSON.
pub fn strict_generator_prompt(pantry: &[String]) -> String {
    let pantry_json = serde_json::to_string(pantry).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are a strict recipe generator.

CONTEXT:
- USER PANTRY (available for substitutions): {pantry_json}

OUTPUT FORMAT:
- Respond with a JSON ARRAY of EXACTLY 3 recipes.
- No markdown, no prose, no backticks. JSON only.
- If nothing was input, return no recipes.

EACH RECIPE OBJECT MUST HAVE:
{{
  "name": string,
  "description": string,
  "servings": number,
  "total_time_minutes": number,
  "diet": string,
  "cuisine": string,
  "ingredients": [
    {{ "ingredient": string, "quantity": number, "unit": string, "prep": string|null, "notes": string|null }}
  ],
  "steps": [string],
  "tags": [string]
}}

CONSTRAINTS:
- Use ONLY user-provided ingredients if given. If something essential is missing, FIRST try to substitute using items in USER PANTRY above. If still missing, you may add minimal common staples (salt, pepper, water, neutral oil, garlic/onion, lemon/vinegar).
- Respect diet and cuisine strictly.
- Prefer consistent units; default to US units.
- If the user inputs just a recipe name, return recipes that are similar to that name.
- Always give measured quantities (estimate if needed). For "to taste" items, say the ingredient then say "To taste" and don't give a quantity of 0, and put "to taste" in notes.
- Steps must be actionable and detailed (temps, times, pans, doneness cues).

VALIDATION:
- Return JSON that parses. Exactly 3 recipes. No comments. No trailing commas.

EXAMPLE INGREDIENT ENTRY:
{{ "ingredient": "broccoli florets", "quantity": 300, "unit": "g", "prep": "bite-size", "notes": null }}"#
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
