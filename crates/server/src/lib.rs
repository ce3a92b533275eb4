//! Service layer of the hybrid recommender.
//!
//! [`HybridRecommender`] owns the live model generation, the result cache
//! and the store handles. [`RebuildScheduler`] keeps the models fresh off
//! the request path.

pub mod cache;
pub mod config;
pub mod recommender;
pub mod responses;
pub mod scheduler;
pub mod stores;

pub use cache::{InMemoryCache, ResultCache, cache_key};
pub use config::{ConfigError, RecommenderConfig};
pub use recommender::{Generation, HybridRecommender, PreparedBuild};
pub use responses::{
    BuildOutcome, RebuildSummary, RecommendationsResponse, SimilarItemsResponse, StatusReport,
};
pub use scheduler::{RebuildScheduler, rebuild_in_background};
pub use stores::{CatalogStore, DataSources, HistoryStore, InteractionStore};
