//! Output records of the merge layer.

use data_loader::MediaId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an item was recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Collaborative signal dominated the merged score
    UsersLikeYou,
    /// Content signal dominated the merged score
    SimilarToWatched,
    /// Cold-start fallback by community rating
    Popular,
    /// Direct item-to-item lookup
    SimilarContent,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::UsersLikeYou => "users_like_you",
            Reason::SimilarToWatched => "similar_to_watched",
            Reason::Popular => "popular",
            Reason::SimilarContent => "similar_content",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub media_id: MediaId,
    /// Rounded to 4 decimals
    pub score: f32,
    pub reason: Reason,
}

impl Recommendation {
    pub fn new(media_id: impl Into<MediaId>, score: f32, reason: Reason) -> Self {
        Self {
            media_id: media_id.into(),
            score,
            reason,
        }
    }
}

/// Relative weight of each sub-model in the merged score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeWeights {
    pub collaborative: f32,
    pub content_based: f32,
}

impl Default for MergeWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.6,
            content_based: 0.4,
        }
    }
}

impl MergeWeights {
    pub fn new(collaborative: f32, content_based: f32) -> Self {
        Self {
            collaborative,
            content_based,
        }
    }
}
