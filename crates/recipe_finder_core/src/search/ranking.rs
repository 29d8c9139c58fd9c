//! Ordering and pagination.

use super::query::SortOrder;

/// `ORDER BY` clause for a sort order. `r.id` breaks ties so pages don't overlap.
///
/// Relevance sorts by ascending score: bm25 returns more negative values for
/// better matches.
pub const fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Rating => "ORDER BY r.rating DESC, r.id ASC",
        SortOrder::MinutesAsc => "ORDER BY r.minutes ASC, r.id ASC",
        SortOrder::MinutesDesc => "ORDER BY r.minutes DESC, r.id ASC",
        SortOrder::Popularity => "ORDER BY r.popularity DESC, r.id ASC",
        SortOrder::Relevance => "ORDER BY score ASC, r.id ASC",
    }
}

/// `ceil(total / page_size)`; zero when there are no rows.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    let page_size = u64::from(page_size.max(1));
    total.div_ceil(page_size)
}
