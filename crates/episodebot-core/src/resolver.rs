//! Show resolver: free-text name to catalog candidates.

use std::sync::Arc;
use tracing::debug;

use crate::catalog::{CatalogAdapter, CatalogError, ShowCandidate};

pub struct ShowResolver {
    catalog: Arc<dyn CatalogAdapter>,
}

impl ShowResolver {
    pub fn new(catalog: Arc<dyn CatalogAdapter>) -> Self {
        Self { catalog }
    }

    /// Search the catalog and keep the candidates for `season`.
    ///
    /// Zero results means not found, one can be served straight away, more
    /// than one needs the user to pick.
    pub async fn resolve(
        &self,
        query: &str,
        season: i32,
    ) -> Result<Vec<ShowCandidate>, CatalogError> {
        let candidates = self.catalog.search_by_name(query).await?;
        let total = candidates.len();
        let matched = match_candidates(candidates, query, season);

        debug!(query, season, total, matched = matched.len(), "Resolved show");

        Ok(matched)
    }
}

/// Exact-then-season filter over a search result, keeping backend order.
///
/// The exact-name check runs over the whole result set. When any candidate,
/// in any season, carries the query as one of its names, only exact matches
/// survive the season filter.
pub fn match_candidates(
    candidates: Vec<ShowCandidate>,
    query: &str,
    season: i32,
) -> Vec<ShowCandidate> {
    let normalized = query.trim().to_lowercase();
    let has_exact = candidates.iter().any(|c| c.has_name(&normalized));

    candidates
        .into_iter()
        .filter(|c| c.season_number == season)
        .filter(|c| !has_exact || c.has_name(&normalized))
        .collect()
}
