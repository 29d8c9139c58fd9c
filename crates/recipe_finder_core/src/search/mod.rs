//! Recipe search: query normalization, predicate planning, ranking and facets.

pub mod facets;
pub mod predicate;
pub mod query;
pub mod ranking;

pub use facets::{facet_counts, FacetField};
pub use predicate::{build_plan, match_expression, PlanMethod, PlanParam, SearchPlan};
pub use query::{RawSearchParams, SearchFilters, SearchQuery, SortOrder};
pub use ranking::{order_clause, page_count};

use tracing::debug;

use crate::domain::{SearchPage, SearchResult};
use crate::ports::{PortResult, RecipeStore};

/// Runs a normalized query against the store and assembles the paginated result.
///
/// Nothing is cached: every call plans and executes from scratch.
pub async fn run_search(store: &dyn RecipeStore, query: &SearchQuery) -> PortResult<SearchResult> {
    let plan = build_plan(query);
    debug!(
        method = plan.method.as_str(),
        terms = query.terms.len(),
        sort = query.sort.as_str(),
        "Planned recipe search"
    );

    let SearchPage { total, mut items } = if plan.is_empty() {
        SearchPage::default()
    } else {
        store.execute_search(&plan).await?
    };
    items.truncate(query.page_size as usize);

    Ok(SearchResult {
        page: query.page,
        page_size: query.page_size,
        total,
        pages: page_count(total, query.page_size),
        items,
    })
}
