//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiImageAdapter, OpenAiRecipeAdapter, SqliteRecipeStore, SupabaseAdapter, TokioPause, Unconfigured},
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use recipe_finder_core::ports::{BlobStore, DocumentStore, ImageGenerationService, RecipeGenerationService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Recipe Database ---
    let recipes = Arc::new(SqliteRecipeStore::open_read_only(&config.db_path, config.db_max_connections).await?);

    // --- 3. Initialize Service Adapters ---
    // A missing key only disables the endpoints that need it.
    let http_client = reqwest::Client::new();

    let llm: Arc<dyn RecipeGenerationService> = match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            Arc::new(OpenAiRecipeAdapter::new(openai_client, config.recipe_model.clone()))
        }
        None => {
            warn!("OPENAI_API_KEY is not set. AI recipe endpoints will fail.");
            Arc::new(Unconfigured::openai())
        }
    };

    let images: Arc<dyn ImageGenerationService> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiImageAdapter::new(
            http_client.clone(),
            key.clone(),
            config.image_model.clone(),
        )),
        None => {
            warn!("GEMINI_API_KEY is not set. Image generation will fail.");
            Arc::new(Unconfigured::gemini())
        }
    };

    let (docs, blobs): (Arc<dyn DocumentStore>, Arc<dyn BlobStore>) = match &config.supabase {
        Some(supabase) => {
            let adapter = Arc::new(SupabaseAdapter::new(
                http_client.clone(),
                supabase,
                config.image_bucket.clone(),
            ));
            (adapter.clone(), adapter)
        }
        None => {
            warn!("SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY are not set. Library endpoints will fail.");
            (Arc::new(Unconfigured::supabase()), Arc::new(Unconfigured::supabase()))
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        retry_policy: AppState::retry_policy_from(&config),
        config: config.clone(),
        recipes,
        llm,
        images,
        pause: Arc::new(TokioPause),
        docs,
        blobs,
    });

    // --- 5. Create the Web Router ---
    let app = web::router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
