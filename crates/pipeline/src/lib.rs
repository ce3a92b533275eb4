//! Merge layer between the two sub-models and the caller.
//!
//! This crate provides:
//! - `Recommendation` and its `Reason` tag, the records the service returns
//! - `normalize` and `merge_scores` for blending collaborative and content
//!   predictions with configurable weights
//! - `popularity_fallback` for users neither model can serve
//!
//! ## Architecture
//! Predictions flow through in stages:
//! 1. Each sub-model returns `(media_id, score)` pairs on its own scale
//! 2. `merge_scores` normalises both lists to [0, 1] and takes a weighted sum
//! 3. An empty merge falls back to the catalog ranked by community rating
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{MergeWeights, merge_scores, popularity_fallback};
//!
//! let cf = collaborative.predict_for_user(user_id, limit * 3);
//! let cb = content.recommend_for_user(&watched, limit * 3);
//!
//! let mut merged = merge_scores(&cf, &cb, MergeWeights::default());
//! if merged.is_empty() {
//!     merged = popularity_fallback(content.media_items(), &watched, limit);
//! }
//! merged.truncate(limit);
//! ```

pub mod fallback;
pub mod merge;
pub mod types;

// Re-export main types
pub use fallback::popularity_fallback;
pub use merge::{merge_scores, normalize};
pub use types::{MergeWeights, Reason, Recommendation};
