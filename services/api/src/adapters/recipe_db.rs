//! services/api/src/adapters/recipe_db.rs
//!
//! This module contains the recipe database adapter, the concrete implementation
//! of the `RecipeStore` port from the `core` crate. It executes search plans and
//! lookups against the local SQLite dataset (with its FTS5 index) using `sqlx`.

use async_trait::async_trait;
use recipe_finder_core::domain::{Facet, Recipe, RecipeSummary, SearchPage};
use recipe_finder_core::ports::{PortError, PortResult, RecipeStore};
use recipe_finder_core::search::{FacetField, PlanParam, SearchPlan};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecipeStore` port.
#[derive(Clone)]
pub struct SqliteRecipeStore {
    pool: SqlitePool,
}

impl SqliteRecipeStore {
    /// Creates a new `SqliteRecipeStore` over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the dataset file read-only. The pool is shared by every request.
    pub async fn open_read_only(path: &Path, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        info!(
            "Opened recipe database {} read-only with {} max connections",
            path.display(),
            max_connections
        );
        Ok(Self::new(pool))
    }
}

fn db_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Binds the plan's parameters, in order, to a query builder.
macro_rules! bind_plan_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                PlanParam::Text(value) => query.bind(value.as_str()),
                PlanParam::Int(value) => query.bind(*value),
                PlanParam::Float(value) => query.bind(*value),
            };
        }
        query
    }};
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SummaryRecord {
    id: i64,
    name: Option<String>,
    minutes: Option<i64>,
    rating: Option<f64>,
    popularity: Option<i64>,
    cuisine: Option<String>,
    diet: Option<String>,
    description: Option<String>,
    steps: Option<String>,
    ingredients: Option<String>,
    score: f64,
}
impl SummaryRecord {
    fn to_domain(self) -> RecipeSummary {
        RecipeSummary {
            id: self.id,
            name: self.name,
            minutes: self.minutes,
            rating: self.rating,
            popularity: self.popularity,
            cuisine: self.cuisine,
            diet: self.diet,
            description: self.description,
            steps: self.steps,
            ingredients: string_list(self.ingredients.as_deref()),
            score: self.score,
        }
    }
}

#[derive(FromRow)]
struct RecipeRecord {
    id: i64,
    name: Option<String>,
    minutes: Option<i64>,
    rating: Option<f64>,
    popularity: Option<i64>,
    cuisine: Option<String>,
    diet: Option<String>,
    description: Option<String>,
    steps: Option<String>,
    ingredients: Option<String>,
    nutrition: Option<String>,
    n_ingredients: Option<i64>,
    n_steps: Option<i64>,
    submitted: Option<String>,
}
impl RecipeRecord {
    fn to_domain(self) -> Recipe {
        Recipe {
            id: self.id,
            name: self.name,
            minutes: self.minutes,
            rating: self.rating,
            popularity: self.popularity,
            cuisine: self.cuisine,
            diet: self.diet,
            description: self.description,
            steps: self.steps,
            ingredients: string_list(self.ingredients.as_deref()),
            nutrition: number_list(self.nutrition.as_deref()),
            n_ingredients: self.n_ingredients,
            n_steps: self.n_steps,
            submitted: self.submitted,
        }
    }
}

#[derive(FromRow)]
struct FacetRecord {
    name: String,
    count: i64,
}

/// Stored JSON arrays; anything malformed decodes as empty.
fn json_list(raw: Option<&str>) -> Vec<Value> {
    match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Array(items))) => items,
        _ => Vec::new(),
    }
}

fn string_list(raw: Option<&str>) -> Vec<String> {
    json_list(raw)
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

fn number_list(raw: Option<&str>) -> Vec<f64> {
    json_list(raw).iter().filter_map(Value::as_f64).collect()
}

//=========================================================================================
// `RecipeStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1 AS ok")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn execute_search(&self, plan: &SearchPlan) -> PortResult<SearchPage> {
        debug!(sql = %plan.sql, params = plan.params.len(), "Executing recipe search");

        let page_query = bind_plan_params!(sqlx::query_as::<_, SummaryRecord>(&plan.sql), &plan.params)
            .bind(i64::from(plan.limit))
            .bind(i64::try_from(plan.offset).unwrap_or(i64::MAX));
        let records = page_query.fetch_all(&self.pool).await.map_err(db_error)?;

        let count_query = bind_plan_params!(sqlx::query_scalar::<_, i64>(&plan.count_sql), &plan.params);
        let total = count_query.fetch_one(&self.pool).await.map_err(db_error)?;

        Ok(SearchPage {
            total: u64::try_from(total).unwrap_or(0),
            items: records.into_iter().map(SummaryRecord::to_domain).collect(),
        })
    }

    async fn get_recipe(&self, id: i64) -> PortResult<Recipe> {
        let record = sqlx::query_as::<_, RecipeRecord>(
            "SELECT r.id, r.name, r.minutes, r.rating, r.popularity, r.cuisine, r.diet, \
             r.description, r.steps, r.ingredients, r.nutrition, r.n_ingredients, r.n_steps, \
             r.submitted FROM recipes AS r WHERE r.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        record
            .map(RecipeRecord::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("recipe {id}")))
    }

    async fn facet_counts(&self, field: FacetField) -> PortResult<Vec<Facet>> {
        let records = sqlx::query_as::<_, FacetRecord>(&field.sql())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(records
            .into_iter()
            .map(|r| Facet {
                name: r.name,
                count: r.count,
            })
            .collect())
    }
}
