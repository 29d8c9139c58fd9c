//! crates/recipe_finder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the recipe database, the LLM and image providers, and the
//! hosted document and blob stores.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;

use crate::domain::{Facet, ImagePayload, PromptMessage, Recipe, SearchPage};
use crate::search::{FacetField, SearchPlan};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Malformed input rejected before any external call.
    #[error("{0}")]
    Validation(String),
    /// The LLM or image provider failed or returned an unusable shape.
    #[error("{0}")]
    Upstream(String),
    /// A blob upload or document-store write failed.
    #[error("{0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document Store Query Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equality; an equality against `null` means "is null".
    Eq,
    /// Membership in a list of values.
    In,
}

/// A single column predicate. Multiple filters are joined by AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In,
            value: Value::Array(values),
        }
    }

    /// Evaluates the filter against a JSON row. A missing column reads as `null`.
    pub fn matches(&self, row: &Value) -> bool {
        let actual = row.get(&self.column).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|values| values.contains(actual)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }
}

/// A `select` against one document table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The read-only local recipe dataset.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Checks the store is reachable.
    async fn ping(&self) -> PortResult<()>;

    /// Executes a search plan, returning one page and the total match count.
    /// Both are computed from the plan's single shared predicate.
    async fn execute_search(&self, plan: &SearchPlan) -> PortResult<SearchPage>;

    async fn get_recipe(&self, id: i64) -> PortResult<Recipe>;

    async fn facet_counts(&self, field: FacetField) -> PortResult<Vec<Facet>>;
}

#[async_trait]
pub trait RecipeGenerationService: Send + Sync {
    /// Sends the messages to the LLM and returns its raw text output.
    async fn invoke(&self, messages: &[PromptMessage]) -> PortResult<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Requests one image. `Ok(None)` means the provider answered without an image.
    async fn generate(&self, prompt: &str) -> PortResult<Option<ImagePayload>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores (or overwrites) the bytes at `path` and returns their public URL.
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> PortResult<String>;
}

/// A hosted table store addressed by table name and column filters.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn select(&self, table: &str, query: &SelectQuery) -> PortResult<Vec<Value>>;

    /// Inserts the rows and returns them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Value>) -> PortResult<Vec<Value>>;

    /// Applies `patch` to every matching row and returns the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> PortResult<Vec<Value>>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> PortResult<()>;
}

/// Suspends the current task. Separated out so retry timing can be observed in tests.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}
