//! Score normalization and threshold filtering for vector-search results.
//!
//! Backends disagree on what their score means. The rule below reads the value
//! itself to decide:
//! - `raw > 1`: a distance, mapped to `1 - raw`
//! - `raw < 0`: a signed cosine similarity, mapped to `(raw + 1) / 2`
//! - otherwise: already a similarity in `[0, 1]`

use serde::{Deserialize, Serialize};

use super::document::{Chunk, Metadata};

/// Maps a backend-specific relevance score onto the similarity scale.
///
/// Distances above 1 map below zero and are not clamped.
pub fn normalize_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    if raw > 1.0 {
        1.0 - raw
    } else if raw < 0.0 {
        (raw + 1.0) / 2.0
    } else {
        raw
    }
}

/// One raw result as returned by the vector-search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// `None` when the backend could not score the result.
    #[serde(default)]
    pub score: Option<f64>,
}

impl SearchHit {
    pub fn scored(chunk: Chunk, score: f64) -> Self {
        Self {
            content: chunk.content,
            metadata: chunk.metadata,
            score: Some(score),
        }
    }

    pub fn unscored(chunk: Chunk) -> Self {
        Self {
            content: chunk.content,
            metadata: chunk.metadata,
            score: None,
        }
    }
}

/// A result ready for the caller. Unknown scores stay `None` (serialized as `null`)
/// instead of being invented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub content: String,
    pub metadata: Metadata,
    pub raw_score: Option<f64>,
    pub normalized_score: Option<f64>,
}

impl ScoredResult {
    pub fn from_hit(hit: SearchHit) -> Self {
        Self {
            content: hit.content,
            metadata: hit.metadata,
            raw_score: hit.score,
            normalized_score: hit.score.map(normalize_score),
        }
    }

    /// True when the result carries no score at all (degraded mode).
    pub fn is_unscored(&self) -> bool {
        self.normalized_score.is_none()
    }
}

/// Normalizes every hit and keeps those scoring at least `min_score`, in input
/// order. Hits without a score bypass the threshold. Returns an empty list when
/// nothing passes.
pub fn filter_results(hits: Vec<SearchHit>, min_score: f64) -> Vec<ScoredResult> {
    hits.into_iter()
        .map(ScoredResult::from_hit)
        .filter(|result| match result.normalized_score {
            Some(score) => score >= min_score,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(content: &str, score: Option<f64>) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            metadata: Metadata::new(),
            score,
        }
    }

    fn approx_eq(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn distance_scores_are_inverted() {
        assert!(approx_eq(normalize_score(1.2), -0.2));
        assert!(approx_eq(normalize_score(1.5), -0.5));
    }

    #[test]
    fn signed_cosine_is_rescaled() {
        assert!(approx_eq(normalize_score(-0.4), 0.3));
        assert!(approx_eq(normalize_score(-1.0), 0.0));
    }

    #[test]
    fn similarities_pass_through() {
        assert_eq!(normalize_score(0.7), 0.7);
        assert_eq!(normalize_score(0.0), 0.0);
        assert_eq!(normalize_score(1.0), 1.0);
    }

    #[test]
    fn nan_maps_to_zero() {
        assert_eq!(normalize_score(f64::NAN), 0.0);
    }

    #[test]
    fn filter_keeps_input_order() {
        let hits = vec![
            hit("a", Some(0.9)),
            hit("b", Some(0.2)),
            hit("c", Some(0.6)),
            hit("d", Some(-0.2)),
        ];

        let kept = filter_results(hits, 0.35);
        let contents: Vec<&str> = kept.iter().map(|r| r.content.as_str()).collect();

        assert_eq!(contents, vec!["a", "c", "d"]);
        assert_eq!(kept[2].raw_score, Some(-0.2));
        assert!(approx_eq(kept[2].normalized_score.unwrap(), 0.4));
    }

    #[test]
    fn threshold_is_inclusive() {
        let kept = filter_results(vec![hit("edge", Some(0.5))], 0.5);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn all_below_threshold_yields_empty() {
        let kept = filter_results(vec![hit("a", Some(0.1)), hit("b", Some(1.7))], 0.5);
        assert!(kept.is_empty());
    }

    #[test]
    fn unscored_hits_bypass_the_threshold() {
        let kept = filter_results(vec![hit("a", None), hit("b", None)], 0.99);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(ScoredResult::is_unscored));
        assert!(kept.iter().all(|r| r.raw_score.is_none()));
    }

    #[test]
    fn unknown_scores_serialize_as_null() {
        let result = ScoredResult::from_hit(hit("a", None));
        let json = serde_json::to_value(&result).expect("serializable");
        assert!(json["normalized_score"].is_null());
        assert!(json["raw_score"].is_null());
    }
}
