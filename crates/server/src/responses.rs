//! Serializable results of the recommender operations.

use data_loader::{MediaId, UserId};
use models::ModelState;
use pipeline::{MergeWeights, Recommendation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub user_id: UserId,
    pub recommendations: Vec<Recommendation>,
    pub count: usize,
    /// Whether either sub-model was ready when the request was served
    pub model_ready: bool,
}

impl RecommendationsResponse {
    pub fn new(user_id: impl Into<UserId>, recommendations: Vec<Recommendation>, model_ready: bool) -> Self {
        Self {
            user_id: user_id.into(),
            count: recommendations.len(),
            recommendations,
            model_ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItemsResponse {
    pub media_id: MediaId,
    pub similar: Vec<Recommendation>,
    pub count: usize,
}

impl SimilarItemsResponse {
    pub fn new(media_id: impl Into<MediaId>, similar: Vec<Recommendation>) -> Self {
        Self {
            media_id: media_id.into(),
            count: similar.len(),
            similar,
        }
    }
}

/// What happened to one sub-model during a rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Built from fresh data
    Rebuilt,
    /// The store returned nothing; the sub-model is unbuilt
    Empty,
    /// The store failed; the previous build keeps serving
    KeptPrevious { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeSummary {
    pub ready: bool,
    pub users: usize,
    pub items: usize,
    pub outcome: BuildOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub ready: bool,
    pub items: usize,
    pub features: usize,
    pub outcome: BuildOutcome,
}

/// Result of `rebuild_models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildSummary {
    pub collaborative: CollaborativeSummary,
    pub content_based: ContentSummary,
    pub interactions_loaded: usize,
    pub media_items_loaded: usize,
    /// Rounded to milliseconds
    pub build_time_seconds: f64,
    /// Sequence number of the generation this build produced
    pub generation: u64,
    /// False when a newer generation was already installed
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeStatus {
    pub ready: bool,
    pub state: ModelState,
    pub users: usize,
    pub items: usize,
    pub interactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStatus {
    pub ready: bool,
    pub state: ModelState,
    pub items: usize,
    pub features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsStatus {
    pub collaborative: f32,
    pub content_based: f32,
}

impl From<MergeWeights> for WeightsStatus {
    fn from(weights: MergeWeights) -> Self {
        Self {
            collaborative: weights.collaborative,
            content_based: weights.content_based,
        }
    }
}

/// Result of `get_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Either sub-model is ready
    pub ready: bool,
    pub collaborative: CollaborativeStatus,
    pub content_based: ContentStatus,
    pub weights: WeightsStatus,
    /// RFC 3339 UTC timestamp of the installed generation, if any
    pub last_rebuild: Option<String>,
    pub rebuild_duration_seconds: Option<f64>,
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::Reason;

    #[test]
    fn test_counts_follow_lists() {
        let response = RecommendationsResponse::new(
            "alice",
            vec![Recommendation::new("m1", 1.0, Reason::Popular)],
            false,
        );
        assert_eq!(response.count, 1);
        assert_eq!(SimilarItemsResponse::new("m1", vec![]).count, 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let kept = BuildOutcome::KeptPrevious {
            error: "db down".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&kept).unwrap(),
            r#"{"status":"kept_previous","error":"db down"}"#
        );
        assert_eq!(
            serde_json::to_string(&BuildOutcome::Rebuilt).unwrap(),
            r#"{"status":"rebuilt"}"#
        );
    }
}
