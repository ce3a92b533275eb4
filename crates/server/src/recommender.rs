//! # Hybrid Recommender
//!
//! Coordinates the two sub-models behind one service:
//! 1. Pull a bounded interaction snapshot and the catalog from the stores
//! 2. Build both sub-models off to the side as a new generation
//! 3. Swap the generation in atomically
//! 4. Serve requests from whichever generation is installed, through the
//!    result cache, the merge layer and the popularity fallback
//!
//! Readers clone the current `Arc<Generation>` under a short read lock and
//! never block on a rebuild in progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use data_loader::MediaId;
use models::{CollaborativeFilter, ContentBasedFilter};
use pipeline::{MergeWeights, Reason, Recommendation, merge_scores, popularity_fallback};

use crate::cache::{ResultCache, cache_key};
use crate::config::RecommenderConfig;
use crate::responses::{
    BuildOutcome, CollaborativeStatus, CollaborativeSummary, ContentStatus, ContentSummary,
    RebuildSummary, RecommendationsResponse, SimilarItemsResponse, StatusReport,
};
use crate::stores::DataSources;

// ============================================================================
// Generation
// ============================================================================

/// One complete, immutable set of sub-models
#[derive(Debug, Clone)]
pub struct Generation {
    /// Assigned when the build started; 0 is the empty initial generation
    pub sequence: u64,
    pub collaborative: Arc<CollaborativeFilter>,
    pub content: Arc<ContentBasedFilter>,
    pub built_at: Option<DateTime<Utc>>,
    pub build_seconds: Option<f64>,
}

impl Generation {
    fn initial() -> Self {
        Self {
            sequence: 0,
            collaborative: Arc::new(CollaborativeFilter::new()),
            content: Arc::new(ContentBasedFilter::new()),
            built_at: None,
            build_seconds: None,
        }
    }

    /// Either sub-model can serve
    pub fn is_ready(&self) -> bool {
        self.collaborative.is_ready() || self.content.is_ready()
    }
}

/// A finished build waiting to be published
#[derive(Debug)]
pub struct PreparedBuild {
    generation: Generation,
    summary: RebuildSummary,
}

impl PreparedBuild {
    pub fn sequence(&self) -> u64 {
        self.generation.sequence
    }

    pub fn summary(&self) -> &RebuildSummary {
        &self.summary
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// HybridRecommender
// ============================================================================

/// Hybrid collaborative + content recommender
pub struct HybridRecommender {
    config: RecommenderConfig,
    sources: DataSources,
    cache: Arc<dyn ResultCache>,
    current: RwLock<Arc<Generation>>,
    next_sequence: AtomicU64,
}

impl HybridRecommender {
    /// Create a recommender with no models built yet
    pub fn new(config: RecommenderConfig, sources: DataSources, cache: Arc<dyn ResultCache>) -> Self {
        Self {
            config,
            sources,
            cache,
            current: RwLock::new(Arc::new(Generation::initial())),
            next_sequence: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn weights(&self) -> MergeWeights {
        self.config.weights()
    }

    /// The generation currently serving requests
    pub fn generation(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.generation().is_ready()
    }

    // ------------------------------------------------------------------------
    // Model lifecycle
    // ------------------------------------------------------------------------

    /// Reload from the stores, rebuild both sub-models and publish them.
    pub fn rebuild_models(&self) -> RebuildSummary {
        let prepared = self.prepare_rebuild();
        self.publish(prepared)
    }

    /// Build a new generation without installing it.
    ///
    /// A store error keeps that sub-model's previous build; the other
    /// sub-model still rebuilds. An empty store gives an unbuilt sub-model.
    #[instrument(skip(self))]
    pub fn prepare_rebuild(&self) -> PreparedBuild {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let previous = self.generation();
        let start = Instant::now();
        info!("Rebuilding models (generation {})", sequence);

        let (collaborative, cf_outcome, interactions_loaded) =
            match self.sources.interactions.recent_interactions(self.config.max_interactions) {
                Ok(interactions) if interactions.is_empty() => {
                    warn!("Interaction store returned no data");
                    (Arc::new(CollaborativeFilter::new()), BuildOutcome::Empty, 0)
                }
                Ok(interactions) => {
                    let mut cf = CollaborativeFilter::new();
                    cf.build_matrix(&interactions);
                    cf.compute_user_similarity();
                    (Arc::new(cf), BuildOutcome::Rebuilt, interactions.len())
                }
                Err(e) => {
                    warn!("Failed to load interactions, keeping previous collaborative model: {:#}", e);
                    (
                        previous.collaborative.clone(),
                        BuildOutcome::KeptPrevious { error: format!("{e:#}") },
                        0,
                    )
                }
            };

        let (content, cb_outcome, media_items_loaded) = match self.sources.catalog.media_items() {
            Ok(items) if items.is_empty() => {
                warn!("Catalog store returned no data");
                (Arc::new(ContentBasedFilter::new()), BuildOutcome::Empty, 0)
            }
            Ok(items) => {
                let mut cbf = ContentBasedFilter::new();
                cbf.build_feature_matrix(&items);
                cbf.compute_item_similarity();
                (Arc::new(cbf), BuildOutcome::Rebuilt, items.len())
            }
            Err(e) => {
                warn!("Failed to load catalog, keeping previous content model: {:#}", e);
                (
                    previous.content.clone(),
                    BuildOutcome::KeptPrevious { error: format!("{e:#}") },
                    0,
                )
            }
        };

        let elapsed = round3(start.elapsed().as_secs_f64());

        // Rebuild timestamps only move when a sub-model was actually rebuilt
        let (built_at, build_seconds) =
            if cf_outcome == BuildOutcome::Rebuilt || cb_outcome == BuildOutcome::Rebuilt {
                (Some(Utc::now()), Some(elapsed))
            } else {
                (previous.built_at, previous.build_seconds)
            };

        let summary = RebuildSummary {
            collaborative: CollaborativeSummary {
                ready: collaborative.is_ready(),
                users: collaborative.user_count(),
                items: collaborative.item_count(),
                outcome: cf_outcome,
            },
            content_based: ContentSummary {
                ready: content.is_ready(),
                items: content.item_count(),
                features: content.feature_count(),
                outcome: cb_outcome,
            },
            interactions_loaded,
            media_items_loaded,
            build_time_seconds: elapsed,
            generation: sequence,
            published: false,
        };

        PreparedBuild {
            generation: Generation {
                sequence,
                collaborative,
                content,
                built_at,
                build_seconds,
            },
            summary,
        }
    }

    /// Install a prepared generation unless a newer one is already live.
    pub fn publish(&self, prepared: PreparedBuild) -> RebuildSummary {
        let PreparedBuild {
            generation,
            mut summary,
        } = prepared;
        let sequence = generation.sequence;

        {
            let mut current = self.current.write();
            if sequence > current.sequence {
                *current = Arc::new(generation);
                summary.published = true;
            }
        }

        if summary.published {
            info!(
                "Model rebuild complete in {:.3}s (generation {}): {} users, {} items, {} features",
                summary.build_time_seconds,
                sequence,
                summary.collaborative.users,
                summary.content_based.items,
                summary.content_based.features
            );
        } else {
            warn!("Discarding generation {}: a newer generation is installed", sequence);
        }
        summary
    }

    // ------------------------------------------------------------------------
    // Recommendations
    // ------------------------------------------------------------------------

    /// Ranked recommendations for a user.
    ///
    /// Served from the cache when possible; otherwise merged from both
    /// sub-models, falling back to popular items when they have nothing.
    #[instrument(skip(self))]
    pub fn get_recommendations(&self, user_id: &str, limit: usize) -> RecommendationsResponse {
        let generation = self.generation();
        let model_ready = generation.is_ready();
        let key = cache_key(user_id);

        if let Some(mut cached) = self.cached(&key) {
            debug!("Cache hit for user {}", user_id);
            cached.truncate(limit);
            return RecommendationsResponse::new(user_id, cached, model_ready);
        }

        let fetch = limit.saturating_mul(3);
        let collaborative = &generation.collaborative;
        let content = &generation.content;

        let cf_results = if collaborative.is_ready() {
            collaborative.predict_for_user(user_id, fetch)
        } else {
            Vec::new()
        };

        // Fetched at most once, and only when something needs it
        let mut watched: Option<Vec<MediaId>> = None;

        let mut cb_results = Vec::new();
        if content.is_ready() {
            let watched = watched.get_or_insert_with(|| self.watched_ids(user_id));
            if !watched.is_empty() {
                cb_results = content.recommend_for_user(watched.as_slice(), fetch);
            }
        }

        let mut merged = merge_scores(&cf_results, &cb_results, self.weights());

        if merged.is_empty() {
            let watched = watched.get_or_insert_with(|| self.watched_ids(user_id));
            merged = popularity_fallback(content.media_items(), watched.as_slice(), limit);
            debug!("Cold start for {}: {} popular items", user_id, merged.len());
        }

        merged.truncate(limit);

        if !merged.is_empty() {
            self.store_cached(&key, &merged);
        }

        debug!(
            "Served {} recommendations to {} (cf={}, cb={})",
            merged.len(),
            user_id,
            cf_results.len(),
            cb_results.len()
        );
        RecommendationsResponse::new(user_id, merged, model_ready)
    }

    /// Items most similar to `media_id` by content
    #[instrument(skip(self))]
    pub fn get_similar_items(&self, media_id: &str, limit: usize) -> SimilarItemsResponse {
        let generation = self.generation();
        if !generation.content.is_ready() {
            return SimilarItemsResponse::new(media_id, Vec::new());
        }

        let similar = generation
            .content
            .get_similar_items(media_id, limit)
            .into_iter()
            .map(|(id, score)| Recommendation::new(id, score, Reason::SimilarContent))
            .collect();
        SimilarItemsResponse::new(media_id, similar)
    }

    /// Drop a user's cached list, e.g. after new activity
    pub fn invalidate_user(&self, user_id: &str) {
        if let Err(e) = self.cache.delete(&cache_key(user_id)) {
            warn!("Cache delete failed for {}: {:#}", user_id, e);
        }
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    pub fn get_status(&self) -> StatusReport {
        let generation = self.generation();
        let cf = &generation.collaborative;
        let cbf = &generation.content;

        StatusReport {
            ready: generation.is_ready(),
            collaborative: CollaborativeStatus {
                ready: cf.is_ready(),
                state: cf.state(),
                users: cf.user_count(),
                items: cf.item_count(),
                interactions: cf.interaction_count(),
            },
            content_based: ContentStatus {
                ready: cbf.is_ready(),
                state: cbf.state(),
                items: cbf.item_count(),
                features: cbf.feature_count(),
            },
            weights: self.weights().into(),
            last_rebuild: generation
                .built_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            rebuild_duration_seconds: generation.build_seconds,
            generation: generation.sequence,
        }
    }

    // ------------------------------------------------------------------------
    // Collaborator boundaries
    // ------------------------------------------------------------------------

    fn watched_ids(&self, user_id: &str) -> Vec<MediaId> {
        match self.sources.history.watch_history(user_id) {
            Ok(history) => history.into_iter().map(|entry| entry.media_id).collect(),
            Err(e) => {
                warn!("Watch history unavailable for {}: {:#}", user_id, e);
                Vec::new()
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Vec<Recommendation>> {
        match self.cache.get(key) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(recommendations) => Some(recommendations),
                Err(e) => {
                    warn!("Ignoring undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    fn store_cached(&self, key: &str, recommendations: &[Recommendation]) {
        let payload = match serde_json::to_string(recommendations) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not encode recommendations for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.cache.set(key, &payload, self.config.cache_ttl()) {
            warn!("Cache write failed for {}: {:#}", key, e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
