//! Facet aggregation over the categorical recipe columns.

use futures::try_join;

use crate::domain::FacetCounts;
use crate::ports::{PortResult, RecipeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    Cuisine,
    Diet,
}

impl FacetField {
    pub const fn column(self) -> &'static str {
        match self {
            Self::Cuisine => "cuisine",
            Self::Diet => "diet",
        }
    }

    /// Number of distinct values returned.
    pub const fn limit(self) -> u32 {
        match self {
            Self::Cuisine => 40,
            Self::Diet => 20,
        }
    }

    /// Top non-empty values by count, independent of any search.
    pub fn sql(self) -> String {
        let column = self.column();
        format!(
            "SELECT r.{column} AS name, COUNT(*) AS count FROM recipes r \
             WHERE r.{column} IS NOT NULL AND r.{column} <> '' \
             GROUP BY r.{column} ORDER BY count DESC LIMIT {}",
            self.limit()
        )
    }
}

/// Loads both facet lists.
pub async fn facet_counts(store: &dyn RecipeStore) -> PortResult<FacetCounts> {
    let (cuisines, diets) = try_join!(
        store.facet_counts(FacetField::Cuisine),
        store.facet_counts(FacetField::Diet)
    )?;
    Ok(FacetCounts { cuisines, diets })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_sql_excludes_blank_values_and_caps() {
        let sql = FacetField::Cuisine.sql();
        assert!(sql.contains("r.cuisine <> ''"));
        assert!(sql.contains("r.cuisine IS NOT NULL"));
        assert!(sql.contains("ORDER BY count DESC"));
        assert!(sql.ends_with("LIMIT 40"));
        assert!(FacetField::Diet.sql().ends_with("LIMIT 20"));
    }
}
