pub mod ai;
pub mod library;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::rest::ApiDoc;
use self::state::AppState;

/// JSON bodies (ingredient lists, AI snapshots) stay well under this.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Builds the complete application: API routes, CORS, request tracing and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let recipe_routes = Router::new()
        .route("/api/health", get(rest::health_handler))
        .route("/api/search", get(rest::search_handler))
        .route("/api/recipes/{id}", get(rest::recipe_handler))
        .route("/api/facets", get(rest::facets_handler));

    let ai_routes = Router::new()
        .route("/api/ai-recipes", post(ai::ai_recipes_handler))
        .route("/api/ai-search", post(ai::ai_search_handler))
        .route("/api/ai-image", post(ai::ai_image_handler))
        .route("/api/saved-image", post(ai::saved_image_handler));

    let library_routes = Router::new()
        .route("/api/saved", get(library::list_saved_handler))
        .route("/api/saved/local", post(library::save_local_handler))
        .route("/api/saved/ai", post(library::save_ai_handler))
        .route("/api/saved/{id}", delete(library::delete_saved_handler))
        .route(
            "/api/pantry",
            get(library::list_pantry_handler)
                .post(library::add_pantry_handler)
                .delete(library::clear_pantry_handler),
        )
        .route(
            "/api/pantry/{id}",
            patch(library::update_pantry_handler).delete(library::remove_pantry_handler),
        )
        .route(
            "/api/shopping",
            get(library::list_shopping_handler)
                .post(library::add_shopping_handler)
                .delete(library::clear_shopping_handler),
        )
        .route("/api/shopping/bulk", post(library::add_shopping_bulk_handler))
        .route("/api/shopping/clear-checked", post(library::clear_checked_handler))
        .route(
            "/api/shopping/{id}",
            patch(library::update_shopping_handler).delete(library::remove_shopping_handler),
        )
        .route("/api/shopping/{id}/checked", post(library::set_checked_handler))
        .route("/api/shopping/{id}/move-to-pantry", post(library::move_to_pantry_handler));

    let api_router = Router::new()
        .merge(recipe_routes)
        .merge(ai_routes)
        .merge(library_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
