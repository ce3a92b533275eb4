//! # Models Crate
//!
//! The two similarity-based predictors behind the hybrid recommender.
//!
//! ## Components
//!
//! ### CollaborativeFilter (user-based)
//! "Users who interacted like you also interacted with..."
//! - Sparse user x item relevance matrix built from the event stream
//! - User/user cosine similarity with low-activity users masked out
//! - Weighted-average prediction from the top 50 neighbours
//!
//! ### ContentBasedFilter (item-based)
//! "More like what you watched"
//! - TF-IDF over a short document per catalog item
//! - Item/item cosine similarity
//! - Mean similarity to the user's watch history
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{CollaborativeFilter, ContentBasedFilter};
//!
//! let mut cf = CollaborativeFilter::new();
//! cf.build_matrix(dataset.recent_interactions(10_000));
//! cf.compute_user_similarity();
//! let predictions = cf.predict_for_user("alice", 20);
//!
//! let mut cbf = ContentBasedFilter::new();
//! cbf.build_feature_matrix(dataset.media_items());
//! cbf.compute_item_similarity();
//! let similar = cbf.get_similar_items("m42", 10);
//! ```
//!
//! Both models are built once and then only read, so a finished model can
//! be shared behind an `Arc` without locking.

pub mod collaborative;
pub mod content_based;
pub mod mapping;
pub mod ranking;
pub mod similarity;
pub mod sparse;
pub mod tfidf;

pub use collaborative::{CollaborativeFilter, MAX_SIMILAR_USERS, MIN_USER_INTERACTIONS};
pub use content_based::{ContentBasedFilter, build_document};
pub use mapping::IndexMapping;
pub use similarity::SimilarityMatrix;
pub use sparse::CsrMatrix;
pub use tfidf::TfidfVectorizer;

use serde::{Deserialize, Serialize};

/// Lifecycle of a sub-model.
///
/// Only `Ready` serves predictions; the other states answer with empty lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    /// Nothing built, or the last build had no input
    Unbuilt,
    /// Matrix built, similarity not computed yet
    Built,
    Ready,
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready)
    }
}
