//! LLM recipe generation: prompt construction, output repair and normalization.

pub mod normalize;
pub mod prompts;
pub mod repair;

pub use normalize::{normalize_ai_response, normalize_recipe, InvalidAiRecipe};
pub use prompts::{build_recipe_messages, build_search_messages, AiSearchRequest};
pub use repair::{normalize_instructions, parse_loose_list};

use serde::Serialize;
use tracing::info;

use crate::domain::{AiRecipe, PromptMessage};
use crate::ports::{PortResult, RecipeGenerationService};

/// Raw model output alongside the recipes normalized from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRecipes {
    pub text: String,
    pub recipes: Vec<AiRecipe>,
}

/// Invokes the LLM once and runs its output through the shared normalizer.
pub async fn generate_recipes(
    llm: &dyn RecipeGenerationService,
    messages: &[PromptMessage],
) -> PortResult<GeneratedRecipes> {
    let text = llm.invoke(messages).await?;
    let recipes = normalize_ai_response(&text);
    info!(chars = text.len(), recipes = recipes.len(), "Generated AI recipes");
    Ok(GeneratedRecipes { text, recipes })
}
