//! Turns raw HTTP search parameters into a canonical [`SearchQuery`].
//!
//! Every field is coerced, never rejected: missing, non-numeric and
//! out-of-range values all map to the documented default for that field.

use serde::Deserialize;

/// Maximum number of free-text terms kept from the query string.
pub const MAX_TERMS: usize = 6;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Search parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub min_rating: Option<String>,
    pub max_minutes: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Relevance,
    Rating,
    MinutesAsc,
    MinutesDesc,
    Popularity,
}

impl SortOrder {
    /// Parses a sort name case-insensitively. Unknown names fall back to relevance.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "rating" => Self::Rating,
            "minutes-asc" => Self::MinutesAsc,
            "minutes-desc" => Self::MinutesDesc,
            "popularity" => Self::Popularity,
            _ => Self::Relevance,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Rating => "rating",
            Self::MinutesAsc => "minutes-asc",
            Self::MinutesDesc => "minutes-desc",
            Self::Popularity => "popularity",
        }
    }
}

/// Equality and range filters. A zero threshold means "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub min_rating: f64,
    pub max_minutes: i64,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.cuisine.is_none() && self.diet.is_none() && self.min_rating == 0.0 && self.max_minutes == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Up to [`MAX_TERMS`] whitespace-separated terms, with `"` removed.
    pub terms: Vec<String>,
    pub filters: SearchFilters,
    pub sort: SortOrder,
    /// 1-based page number, always >= 1.
    pub page: u32,
    /// Always within `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            filters: SearchFilters::default(),
            sort: SortOrder::Relevance,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn from_raw(raw: &RawSearchParams) -> Self {
        Self {
            terms: tokenize(raw.q.as_deref().unwrap_or_default()),
            filters: SearchFilters {
                cuisine: non_blank(raw.cuisine.as_deref()),
                diet: non_blank(raw.diet.as_deref()),
                min_rating: parse_number(raw.min_rating.as_deref())
                    .filter(|v| *v > 0.0)
                    .unwrap_or(0.0),
                max_minutes: parse_number(raw.max_minutes.as_deref())
                    .map(f64::floor)
                    .filter(|v| *v > 0.0)
                    .map_or(0, |v| v as i64),
            },
            sort: SortOrder::parse(raw.sort.as_deref().unwrap_or_default()),
            page: parse_number(raw.page.as_deref())
                .map_or(1, |v| v.floor().clamp(1.0, f64::from(u32::MAX)) as u32),
            page_size: parse_number(raw.page_size.as_deref()).map_or(DEFAULT_PAGE_SIZE, |v| {
                v.floor().clamp(1.0, f64::from(MAX_PAGE_SIZE)) as u32
            }),
        }
    }

    pub fn has_text(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Row offset of the first item on the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Splits on whitespace, keeps the first [`MAX_TERMS`] terms and strips `"`
/// so a term can never close the quoted phrase it is embedded in.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .take(MAX_TERMS)
        .map(|word| word.replace('"', ""))
        .filter(|word| !word.is_empty())
        .collect()
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
