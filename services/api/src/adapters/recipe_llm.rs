//! services/api/src/adapters/recipe_llm.rs
//!
//! This module contains the adapter for the recipe-generating LLM.
//! It implements the `RecipeGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use recipe_finder_core::{
    domain::PromptMessage,
    ports::{PortError, PortResult, RecipeGenerationService},
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecipeGenerationService` using an OpenAI chat model.
#[derive(Clone)]
pub struct OpenAiRecipeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiRecipeAdapter {
    /// Creates a new `OpenAiRecipeAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn to_openai_message(message: &PromptMessage) -> PortResult<ChatCompletionRequestMessage> {
        match message {
            PromptMessage::System(text) => ChatCompletionRequestSystemMessageArgs::default()
                .content(text.as_str())
                .build()
                .map(Into::into)
                .map_err(|e| PortError::Unexpected(e.to_string())),
            PromptMessage::User(text) => ChatCompletionRequestUserMessageArgs::default()
                .content(text.as_str())
                .build()
                .map(Into::into)
                .map_err(|e| PortError::Unexpected(e.to_string())),
        }
    }
}

//=========================================================================================
// `RecipeGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeGenerationService for OpenAiRecipeAdapter {
    /// Sends the messages in one chat completion and returns the first choice's text.
    async fn invoke(&self, messages: &[PromptMessage]) -> PortResult<String> {
        let messages = messages
            .iter()
            .map(Self::to_openai_message)
            .collect::<PortResult<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, "Calling recipe LLM");
        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        // An empty completion is passed through; the normalizer turns it into "no recipes".
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
