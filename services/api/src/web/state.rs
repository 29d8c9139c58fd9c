//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use recipe_finder_core::image::RetryPolicy;
use recipe_finder_core::ports::{
    BlobStore, DocumentStore, ImageGenerationService, Pause, RecipeGenerationService, RecipeStore,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every external collaborator sits behind its port so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recipes: Arc<dyn RecipeStore>,
    pub llm: Arc<dyn RecipeGenerationService>,
    pub images: Arc<dyn ImageGenerationService>,
    pub pause: Arc<dyn Pause>,
    pub docs: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub retry_policy: RetryPolicy,
}

impl AppState {
    /// The retry policy follows the configured image settings.
    pub fn retry_policy_from(config: &Config) -> RetryPolicy {
        RetryPolicy {
            max_attempts: config.image_max_attempts,
            base_delay: config.image_retry_base_delay,
        }
    }
}
