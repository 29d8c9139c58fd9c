//! Search predicate builder.
//!
//! Converts a [`SearchQuery`] into SQL + params for the SQLite FTS5 recipe index:
//! - a full-text `MATCH` requiring every term, close together (`NEAR`)
//! - equality filters on cuisine and diet, range filters on rating and minutes
//! - one shared `FROM … WHERE …` used by both the page query and the count query
//!
//! The SQL text only ever contains `?` placeholders. Every user-supplied value,
//! including the match expression, travels in [`SearchPlan::params`].

use super::query::SearchQuery;
use super::ranking::order_clause;

/// FTS5 table joined to the recipe rows it indexes.
pub const FROM_CLAUSE: &str = "recipes_fts JOIN recipes AS r ON recipes_fts.rowid = r.id";

/// Column weights: name, description, ingredients, steps, tags, cuisine, diet.
pub const BM25_SCORE: &str = "bm25(recipes_fts, 1.5, 1.2, 1.1, 1.3, 0.5, 0.8, 0.6)";

/// Score used when there is no `MATCH`, where `bm25()` is undefined.
pub const NEUTRAL_SCORE: &str = "0.0";

const SUMMARY_COLUMNS: &str = "r.id, r.name, r.minutes, r.rating, r.popularity, r.cuisine, \
     r.diet, r.description, r.steps, r.ingredients";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMethod {
    /// Full-text match plus any filters.
    FullText,
    /// No text: always-true match predicate plus at least one filter.
    FilterOnly,
    /// No text and no filters: nothing is queried and the result is empty.
    Empty,
}

impl PlanMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullText => "fts5",
            Self::FilterOnly => "filter_only",
            Self::Empty => "empty",
        }
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanParam {
    Text(String),
    Int(i64),
    Float(f64),
}

/// An executable search: page SQL, count SQL and the parameters they share.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub method: PlanMethod,
    /// `WHERE` body shared verbatim by `sql` and `count_sql`.
    pub predicate: String,
    /// Page query. Bind `params`, then `limit`, then `offset`.
    pub sql: String,
    /// Count query. Bind `params` only.
    pub count_sql: String,
    pub params: Vec<PlanParam>,
    pub limit: u32,
    pub offset: u64,
    /// The FTS5 expression bound to the `MATCH` placeholder, if any.
    pub match_expression: Option<String>,
}

impl SearchPlan {
    pub fn is_empty(&self) -> bool {
        self.method == PlanMethod::Empty
    }
}

/// Plans a search. This does not execute anything.
pub fn build_plan(query: &SearchQuery) -> SearchPlan {
    let method = if query.has_text() {
        PlanMethod::FullText
    } else if !query.filters.is_empty() {
        PlanMethod::FilterOnly
    } else {
        PlanMethod::Empty
    };

    if method == PlanMethod::Empty {
        return SearchPlan {
            method,
            predicate: String::new(),
            sql: String::new(),
            count_sql: String::new(),
            params: Vec::new(),
            limit: query.page_size,
            offset: query.offset(),
            match_expression: None,
        };
    }

    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<PlanParam> = Vec::new();

    let match_expression = if method == PlanMethod::FullText {
        let expression = match_expression(&query.terms);
        clauses.push("recipes_fts MATCH ?");
        params.push(PlanParam::Text(expression.clone()));
        Some(expression)
    } else {
        clauses.push("1=1");
        None
    };

    let filters = &query.filters;
    if let Some(cuisine) = &filters.cuisine {
        clauses.push("r.cuisine = ?");
        params.push(PlanParam::Text(cuisine.clone()));
    }
    if let Some(diet) = &filters.diet {
        clauses.push("r.diet = ?");
        params.push(PlanParam::Text(diet.clone()));
    }
    if filters.min_rating > 0.0 {
        clauses.push("r.rating >= ?");
        params.push(PlanParam::Float(filters.min_rating));
    }
    if filters.max_minutes > 0 {
        clauses.push("r.minutes <= ?");
        params.push(PlanParam::Int(filters.max_minutes));
    }

    let predicate = clauses.join(" AND ");
    let score = if method == PlanMethod::FullText {
        BM25_SCORE
    } else {
        NEUTRAL_SCORE
    };

    let sql = format!(
        "SELECT {SUMMARY_COLUMNS}, {score} AS score FROM {FROM_CLAUSE} WHERE {predicate} {} LIMIT ? OFFSET ?",
        order_clause(query.sort)
    );
    let count_sql = format!("SELECT COUNT(*) AS c FROM {FROM_CLAUSE} WHERE {predicate}");

    SearchPlan {
        method,
        predicate,
        sql,
        count_sql,
        params,
        limit: query.page_size,
        offset: query.offset(),
        match_expression,
    }
}

/// Builds the FTS5 expression: each term quoted as a phrase, and several terms
/// grouped in a `NEAR` so all must appear close together.
pub fn match_expression(terms: &[String]) -> String {
    let phrases: Vec<String> = terms.iter().map(|t| format!("\"{t}\"")).collect();
    match phrases.len() {
        0 => String::new(),
        1 => phrases[0].clone(),
        _ => format!("NEAR({})", phrases.join(" ")),
    }
}
