//! Query-time retrieval: vector search, score normalization, threshold filter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::document::Metadata;
use super::scoring::{filter_results, ScoredResult, SearchHit};
use super::store::VectorSearch;
use crate::core::config::{defaults, RetrievalConfig};
use crate::core::errors::{RetrievalError, SearchError, SearchParamsError};

/// Parameters of one similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default)]
    pub filter: Option<Metadata>,
}

fn default_k() -> usize {
    defaults::SEARCH_K
}

fn default_min_score() -> f64 {
    defaults::MIN_SCORE
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: default_k(),
            min_score: default_min_score(),
            filter: None,
        }
    }

    /// Uses `k` and `min_score` from the retrieval config.
    pub fn with_config(query: impl Into<String>, config: &RetrievalConfig) -> Self {
        Self {
            k: config.k,
            min_score: config.min_score,
            ..Self::new(query)
        }
    }

    pub fn with_filter(mut self, filter: Metadata) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn validate(&self) -> Result<(), SearchParamsError> {
        if self.query.trim().is_empty() {
            return Err(SearchParamsError::EmptyQuery);
        }
        if self.k == 0 || self.k > defaults::SEARCH_K_MAX {
            return Err(SearchParamsError::KOutOfRange {
                value: self.k,
                max: defaults::SEARCH_K_MAX,
            });
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(SearchParamsError::MinScoreOutOfRange(self.min_score));
        }
        Ok(())
    }
}

/// Runs similarity queries against a `VectorSearch` backend.
#[derive(Clone)]
pub struct Retriever {
    search: Arc<dyn VectorSearch>,
}

impl Retriever {
    pub fn new(search: Arc<dyn VectorSearch>) -> Self {
        Self { search }
    }

    /// Returns normalized, thresholded results in backend order.
    ///
    /// When the backend cannot score, falls back to the unscored search and
    /// returns every hit with unknown scores. Any other backend failure propagates.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<ScoredResult>, RetrievalError> {
        params.validate()?;
        tracing::debug!(
            "Performing vector similarity search (k {}, min_score {}, filter {})",
            params.k,
            params.min_score,
            params.filter.is_some()
        );

        let filter = params.filter.as_ref();
        let scored = self
            .search
            .similarity_search_with_score(&params.query, params.k, filter)
            .await;

        let hits = match scored {
            Ok(pairs) => pairs
                .into_iter()
                .map(|(chunk, score)| SearchHit::scored(chunk, score))
                .collect::<Vec<_>>(),
            Err(SearchError::ScoresUnavailable) => {
                tracing::warn!("Scored search unavailable, falling back to unscored search");
                let chunks = self
                    .search
                    .similarity_search(&params.query, params.k, filter)
                    .await?;
                return Ok(filter_results(
                    chunks.into_iter().map(SearchHit::unscored).collect(),
                    params.min_score,
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let total = hits.len();
        let results = filter_results(hits, params.min_score);
        if results.is_empty() {
            tracing::warn!(
                "No results found above similarity threshold {} ({} candidates)",
                params.min_score,
                total
            );
        } else {
            tracing::info!(
                "Similarity search completed: {} of {} results kept",
                results.len(),
                total
            );
        }
        Ok(results)
    }
}
