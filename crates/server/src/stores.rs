//! Read-only access to the persistent stores.
//!
//! The recommender only ever needs three queries, one per trait. Anything
//! that can answer them (a database pool, a file snapshot, a test double)
//! can back the recommender.

use anyhow::Result;
use data_loader::{Dataset, Interaction, MediaItem, WatchHistoryEntry};
use std::sync::Arc;

/// Source of the interaction event stream
pub trait InteractionStore: Send + Sync {
    /// Up to `limit` interactions, most recent first
    fn recent_interactions(&self, limit: usize) -> Result<Vec<Interaction>>;
}

/// Source of catalog metadata
pub trait CatalogStore: Send + Sync {
    /// Every catalog record
    fn media_items(&self) -> Result<Vec<MediaItem>>;
}

/// Source of per-user playback progress
pub trait HistoryStore: Send + Sync {
    /// The user's watch history; empty for unknown users
    fn watch_history(&self, user_id: &str) -> Result<Vec<WatchHistoryEntry>>;
}

impl InteractionStore for Dataset {
    fn recent_interactions(&self, limit: usize) -> Result<Vec<Interaction>> {
        Ok(Dataset::recent_interactions(self, limit).to_vec())
    }
}

impl CatalogStore for Dataset {
    fn media_items(&self) -> Result<Vec<MediaItem>> {
        Ok(Dataset::media_items(self).to_vec())
    }
}

impl HistoryStore for Dataset {
    fn watch_history(&self, user_id: &str) -> Result<Vec<WatchHistoryEntry>> {
        Ok(Dataset::watch_history(self, user_id).to_vec())
    }
}

/// The three stores a recommender reads from
#[derive(Clone)]
pub struct DataSources {
    pub interactions: Arc<dyn InteractionStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl DataSources {
    pub fn new(
        interactions: Arc<dyn InteractionStore>,
        catalog: Arc<dyn CatalogStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            interactions,
            catalog,
            history,
        }
    }

    /// Serve all three queries from one in-memory snapshot
    pub fn from_dataset(dataset: Arc<Dataset>) -> Self {
        Self {
            interactions: dataset.clone(),
            catalog: dataset.clone(),
            history: dataset,
        }
    }
}
