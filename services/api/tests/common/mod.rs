//! Shared setup for the router tests: an in-memory recipe database built from
//! the bundled schema, the core's in-memory fakes, and request helpers.

#![allow(dead_code)]

use api_lib::adapters::SqliteRecipeStore;
use api_lib::config::Config;
use api_lib::web::{self, state::AppState};
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use recipe_finder_core::fakes::{MemoryBlobStore, MemoryDocumentStore, RecordingPause, ScriptedImageProvider, ScriptedLlm};
use recipe_finder_core::image::RetryPolicy;
use recipe_finder_core::ports::RecipeStore;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SCHEMA: &str = include_str!("../../schema/recipes.sql");

//=========================================================================================
// Recipe Database
//=========================================================================================

/// A single-connection in-memory database; more connections would each see an empty database.
pub async fn recipe_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
    pool
}

/// One dataset row. Unset text columns are stored as empty strings.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub id: i64,
    pub name: &'static str,
    pub minutes: i64,
    pub rating: f64,
    pub popularity: i64,
    pub cuisine: &'static str,
    pub diet: &'static str,
    pub description: &'static str,
    pub steps: &'static str,
    pub ingredients: &'static [&'static str],
}

pub async fn insert_recipe(pool: &SqlitePool, seed: Seed) {
    let ingredients = serde_json::to_string(seed.ingredients).unwrap();
    sqlx::query(
        "INSERT INTO recipes (id, name, minutes, rating, popularity, cuisine, diet, description, steps, \
         ingredients, tags, nutrition, n_ingredients, n_steps, submitted) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', '[250.0, 12.0, 3.5]', ?, 1, '2010-05-01')",
    )
    .bind(seed.id)
    .bind(seed.name)
    .bind(seed.minutes)
    .bind(seed.rating)
    .bind(seed.popularity)
    .bind(seed.cuisine)
    .bind(seed.diet)
    .bind(seed.description)
    .bind(seed.steps)
    .bind(ingredients)
    .bind(seed.ingredients.len() as i64)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seeded_store(seeds: Vec<Seed>) -> Arc<SqliteRecipeStore> {
    let pool = recipe_pool().await;
    for seed in seeds {
        insert_recipe(&pool, seed).await;
    }
    Arc::new(SqliteRecipeStore::new(pool))
}

//=========================================================================================
// Application Under Test
//=========================================================================================

/// The router plus handles on every fake, for asserting on side effects.
pub struct TestApp {
    pub router: Router,
    pub llm: Arc<ScriptedLlm>,
    pub images: Arc<ScriptedImageProvider>,
    pub pause: Arc<RecordingPause>,
    pub docs: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

pub struct TestAppBuilder {
    recipes: Arc<dyn RecipeStore>,
    llm: ScriptedLlm,
    images: ScriptedImageProvider,
    blobs: MemoryBlobStore,
}

impl TestAppBuilder {
    pub fn new(recipes: Arc<dyn RecipeStore>) -> Self {
        Self {
            recipes,
            llm: ScriptedLlm::replying("[]"),
            images: ScriptedImageProvider::always_empty(),
            blobs: MemoryBlobStore::default(),
        }
    }

    pub fn llm(mut self, llm: ScriptedLlm) -> Self {
        self.llm = llm;
        self
    }

    pub fn images(mut self, images: ScriptedImageProvider) -> Self {
        self.images = images;
        self
    }

    pub fn blobs(mut self, blobs: MemoryBlobStore) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn build(self) -> TestApp {
        let llm = Arc::new(self.llm);
        let images = Arc::new(self.images);
        let pause = Arc::new(RecordingPause::default());
        let docs = Arc::new(MemoryDocumentStore::default());
        let blobs = Arc::new(self.blobs);

        let app_state = Arc::new(AppState {
            config: Arc::new(Config::from_lookup(|_| None).unwrap()),
            recipes: self.recipes,
            llm: llm.clone(),
            images: images.clone(),
            pause: pause.clone(),
            docs: docs.clone(),
            blobs: blobs.clone(),
            retry_policy: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1000),
            },
        });

        TestApp {
            router: web::router(app_state),
            llm,
            images,
            pause,
            docs,
            blobs,
        }
    }
}

//=========================================================================================
// Requests
//=========================================================================================

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bare(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

/// Sends one request and decodes the body as JSON (`null` when empty).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}
