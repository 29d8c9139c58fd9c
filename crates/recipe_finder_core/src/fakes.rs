//! In-memory implementations of every port, for tests without network or database access.
//!
//! Available to this crate's unit tests and, through the `fakes` feature, to
//! dependent crates' integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{Facet, ImagePayload, PromptMessage, Recipe, SearchPage};
use crate::ports::{
    BlobStore, DocumentStore, Filter, ImageGenerationService, Pause, PortError, PortResult, RecipeGenerationService,
    RecipeStore, SelectQuery,
};
use crate::search::{FacetField, SearchPlan};

/// A panicking test must not cascade into every later assertion on the same fake.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=========================================================================================
// Recipe Store
//=========================================================================================

/// Serves fixed recipes, a canned search page and canned facets, recording what it was asked.
#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    recipes: HashMap<i64, Recipe>,
    search_page: SearchPage,
    facets: HashMap<&'static str, Vec<Facet>>,
    unavailable: Option<PortError>,
    plans: Mutex<Vec<SearchPlan>>,
    lookups: Mutex<Vec<i64>>,
}

impl MemoryRecipeStore {
    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.insert(recipe.id, recipe);
        self
    }

    pub fn with_search_page(mut self, page: SearchPage) -> Self {
        self.search_page = page;
        self
    }

    pub fn with_facets(mut self, field: FacetField, facets: Vec<Facet>) -> Self {
        self.facets.insert(field.column(), facets);
        self
    }

    /// Every call fails with `error`.
    pub fn unavailable(error: PortError) -> Self {
        Self {
            unavailable: Some(error),
            ..Default::default()
        }
    }

    pub fn executed_plans(&self) -> Vec<SearchPlan> {
        lock(&self.plans).clone()
    }

    pub fn recipe_lookups(&self) -> Vec<i64> {
        lock(&self.lookups).clone()
    }

    fn check_available(&self) -> PortResult<()> {
        match &self.unavailable {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn ping(&self) -> PortResult<()> {
        self.check_available()
    }

    async fn execute_search(&self, plan: &SearchPlan) -> PortResult<SearchPage> {
        self.check_available()?;
        lock(&self.plans).push(plan.clone());
        Ok(self.search_page.clone())
    }

    async fn get_recipe(&self, id: i64) -> PortResult<Recipe> {
        self.check_available()?;
        lock(&self.lookups).push(id);
        self.recipes
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("recipe {id}")))
    }

    async fn facet_counts(&self, field: FacetField) -> PortResult<Vec<Facet>> {
        self.check_available()?;
        Ok(self.facets.get(field.column()).cloned().unwrap_or_default())
    }
}

//=========================================================================================
// Providers
//=========================================================================================

/// Replies to every invocation with the same scripted result.
#[derive(Debug)]
pub struct ScriptedLlm {
    reply: PortResult<String>,
    received: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: PortError) -> Self {
        Self {
            reply: Err(error),
            received: Mutex::new(Vec::new()),
        }
    }

    /// The message lists of every invocation, in order.
    pub fn received(&self) -> Vec<Vec<PromptMessage>> {
        lock(&self.received).clone()
    }
}

#[async_trait]
impl RecipeGenerationService for ScriptedLlm {
    async fn invoke(&self, messages: &[PromptMessage]) -> PortResult<String> {
        lock(&self.received).push(messages.to_vec());
        self.reply.clone()
    }
}

/// Plays back a script of responses; once it runs out every call returns "no image".
#[derive(Debug, Default)]
pub struct ScriptedImageProvider {
    script: Mutex<VecDeque<PortResult<Option<ImagePayload>>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImageProvider {
    pub fn new(script: Vec<PortResult<Option<ImagePayload>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_empty() -> Self {
        Self::default()
    }

    pub fn returning(payload: ImagePayload) -> Self {
        Self::new(vec![Ok(Some(payload))])
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl ImageGenerationService for ScriptedImageProvider {
    async fn generate(&self, prompt: &str) -> PortResult<Option<ImagePayload>> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.script).pop_front().unwrap_or(Ok(None))
    }
}

/// Records requested pauses without sleeping.
#[derive(Debug, Default)]
pub struct RecordingPause {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.recorded).clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        lock(&self.recorded).push(duration);
    }
}

//=========================================================================================
// Hosted Stores
//=========================================================================================

const BLOB_BASE_URL: &str = "https://blobs.test/recipe-images";

/// Keeps uploads in memory and hands out deterministic URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<Vec<(String, Bytes, String)>>,
    failure: Option<PortError>,
}

impl MemoryBlobStore {
    pub fn failing(error: PortError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    /// `(path, content_type)` of every upload, in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        lock(&self.objects)
            .iter()
            .map(|(path, _, content_type)| (path.clone(), content_type.clone()))
            .collect()
    }

    pub fn object(&self, path: &str) -> Option<Bytes> {
        lock(&self.objects)
            .iter()
            .rev()
            .find(|(p, _, _)| p == path)
            .map(|(_, data, _)| data.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> PortResult<String> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        lock(&self.objects).push((path.to_string(), data, content_type.to_string()));
        Ok(format!("{BLOB_BASE_URL}/{path}"))
    }
}

/// A table store over JSON rows.
///
/// Inserted rows get a generated `id` and a `created_at` one second after the
/// previous insert, so "newest first" ordering is deterministic.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    clock: Mutex<DateTime<Utc>>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            clock: Mutex::new(DateTime::<Utc>::default() + ChronoDuration::days(20_000)),
        }
    }
}

impl MemoryDocumentStore {
    /// Every row currently stored in `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    fn next_timestamp(&self) -> String {
        let mut clock = lock(&self.clock);
        *clock += ChronoDuration::seconds(1);
        clock.to_rfc3339()
    }
}

fn matches_all(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|filter| filter.matches(row))
}

/// `null` sorts first, then booleans, numbers and strings by their natural order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn select(&self, table: &str, query: &SelectQuery) -> PortResult<Vec<Value>> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| matches_all(&query.filters, row))
            .collect();

        rows.sort_by(|a, b| {
            query
                .order
                .iter()
                .map(|order| {
                    let ordering = compare_values(
                        a.get(&order.column).unwrap_or(&Value::Null),
                        b.get(&order.column).unwrap_or(&Value::Null),
                    );
                    if order.ascending {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> PortResult<Vec<Value>> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut fields) = row else {
                return Err(PortError::Storage(format!("Rows inserted into {table} must be objects")));
            };
            fields
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            let created_at = self.next_timestamp();
            fields.entry("created_at").or_insert(Value::String(created_at));
            stored.push(Value::Object(fields));
        }

        lock(&self.tables)
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> PortResult<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(PortError::Storage(format!("Patch for {table} must be an object")));
        };

        let mut tables = lock(&self.tables);
        let mut updated = Vec::new();
        for row in tables.entry(table.to_string()).or_default().iter_mut() {
            if !matches_all(filters, row) {
                continue;
            }
            if let Value::Object(fields) = row {
                merge(fields, &patch);
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> PortResult<()> {
        if let Some(rows) = lock(&self.tables).get_mut(table) {
            rows.retain(|row| !matches_all(filters, row));
        }
        Ok(())
    }
}

fn merge(fields: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
}
