//! Item-based content filtering
//!
//! Turns each catalog record into a short text document (genres, kind,
//! rating bucket), vectorizes the catalog with TF-IDF, and compares items
//! by cosine similarity. Users are served items that resemble what they
//! already watched.

use crate::ModelState;
use crate::mapping::IndexMapping;
use crate::ranking::rank_positive;
use crate::similarity::SimilarityMatrix;
use crate::sparse::CsrMatrix;
use crate::tfidf::TfidfVectorizer;
use data_loader::{MediaId, MediaItem};
use tracing::{debug, info, instrument, warn};

pub const TFIDF_MAX_FEATURES: usize = 5000;
pub const TFIDF_NGRAM_RANGE: (usize, usize) = (1, 2);
pub const TFIDF_MIN_DF: usize = 1;
/// Terms in more than 95% of documents carry no signal
pub const TFIDF_MAX_DF: f32 = 0.95;

/// Below this many documents the frequency thresholds are relaxed
const SMALL_CORPUS: usize = 3;

/// Compose the text document for one catalog record.
///
/// Genres come first and twice, so they dominate the weighting; then the
/// media kind; then a coarse quality bucket from the community rating.
pub fn build_document(item: &MediaItem) -> String {
    let mut parts: Vec<&str> = Vec::new();

    let genres = item.genres.replace([',', ';'], " ");
    let genres = genres.trim();
    if !genres.is_empty() {
        parts.push(genres);
        parts.push(genres);
    }

    if let Some(kind) = item.kind.token() {
        parts.push(kind);
    }

    if let Some(rating) = item.usable_rating() {
        parts.push(match rating {
            r if r >= 8.0 => "highly_rated",
            r if r >= 6.0 => "well_rated",
            r if r >= 4.0 => "average_rated",
            _ => "low_rated",
        });
    }

    if parts.is_empty() {
        "unknown".to_string()
    } else {
        parts.join(" ")
    }
}

/// TF-IDF item/item similarity model over the catalog
#[derive(Debug, Clone)]
pub struct ContentBasedFilter {
    max_features: usize,
    max_df: f32,

    items: IndexMapping,
    /// Catalog records in index order
    metadata: Vec<MediaItem>,

    /// Items are rows, TF-IDF terms are columns
    features: Option<CsrMatrix>,
    similarity: Option<SimilarityMatrix>,
}

impl Default for ContentBasedFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentBasedFilter {
    pub fn new() -> Self {
        Self {
            max_features: TFIDF_MAX_FEATURES,
            max_df: TFIDF_MAX_DF,
            items: IndexMapping::new(),
            metadata: Vec::new(),
            features: None,
            similarity: None,
        }
    }

    /// Configure the vocabulary cap (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Configure the document-frequency ceiling (default: 0.95)
    pub fn with_max_df(mut self, max_df: f32) -> Self {
        self.max_df = max_df;
        self
    }

    fn vectorizer(&self, n_docs: usize) -> TfidfVectorizer {
        let (min_n, max_n) = TFIDF_NGRAM_RANGE;
        let vectorizer = TfidfVectorizer::new()
            .with_max_features(self.max_features)
            .with_ngram_range(min_n, max_n);

        if n_docs < SMALL_CORPUS {
            vectorizer.with_min_df(1).with_max_df(1.0)
        } else {
            vectorizer.with_min_df(TFIDF_MIN_DF).with_max_df(self.max_df)
        }
    }

    // =========================================================================
    // Feature matrix
    // =========================================================================

    /// Build the TF-IDF feature matrix from the catalog.
    ///
    /// Items are indexed in catalog order; a repeated id keeps its first
    /// record. An empty catalog leaves the model `Unbuilt`.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn build_feature_matrix(&mut self, items: &[MediaItem]) {
        self.items = IndexMapping::new();
        self.metadata = Vec::new();
        self.features = None;
        self.similarity = None;

        if items.is_empty() {
            warn!("No media items provided; content model will be empty");
            return;
        }

        let mut documents = Vec::with_capacity(items.len());
        for item in items {
            if self.items.insert_new(&item.id).is_none() {
                debug!("Skipping duplicate catalog id {}", item.id);
                continue;
            }
            documents.push(build_document(item));
            self.metadata.push(item.clone());
        }

        let mut vectorizer = self.vectorizer(documents.len());
        let features = vectorizer.fit_transform(&documents);
        if features.n_cols() == 0 {
            warn!("Every TF-IDF term was pruned; item similarities will all be zero");
        }

        info!(
            "Content feature matrix built: {} items x {} features",
            features.n_rows(),
            features.n_cols()
        );
        self.features = Some(features);
    }

    // =========================================================================
    // Similarity
    // =========================================================================

    /// Compute pairwise cosine similarity between all items.
    #[instrument(skip(self))]
    pub fn compute_item_similarity(&mut self) {
        let Some(features) = self.features.as_ref() else {
            warn!("Cannot compute similarity: feature matrix not built");
            return;
        };

        let mut similarity = SimilarityMatrix::cosine(features);
        similarity.zero_diagonal();

        info!(
            "Item similarity matrix computed ({} x {})",
            similarity.n(),
            similarity.n()
        );
        self.similarity = Some(similarity);
    }

    // =========================================================================
    // Recommendations
    // =========================================================================

    /// Recommend items similar to the ones the user watched.
    ///
    /// Each candidate scores the mean of its similarity to every watched
    /// item. Unknown ids are ignored; a repeated id counts once per
    /// occurrence. Watched items are never returned.
    #[instrument(skip(self, watched), fields(watched = watched.len()))]
    pub fn recommend_for_user<S: AsRef<str>>(&self, watched: &[S], n: usize) -> Vec<(MediaId, f32)> {
        let Some(similarity) = self.similarity.as_ref() else {
            return Vec::new();
        };

        let watched_indices: Vec<usize> = watched
            .iter()
            .filter_map(|id| self.items.index_of(id.as_ref()))
            .collect();
        if watched_indices.is_empty() {
            return Vec::new();
        }

        let mut aggregated = vec![0.0f32; similarity.n()];
        for &idx in &watched_indices {
            for (total, &sim) in aggregated.iter_mut().zip(similarity.row(idx)) {
                *total += sim;
            }
        }
        let count = watched_indices.len() as f32;
        for total in aggregated.iter_mut() {
            *total /= count;
        }
        for &idx in &watched_indices {
            aggregated[idx] = f32::NEG_INFINITY;
        }

        self.resolve(rank_positive(&aggregated, n))
    }

    /// The `n` items most similar to `media_id`
    #[instrument(skip(self))]
    pub fn get_similar_items(&self, media_id: &str, n: usize) -> Vec<(MediaId, f32)> {
        let (Some(similarity), Some(idx)) = (self.similarity.as_ref(), self.items.index_of(media_id))
        else {
            return Vec::new();
        };
        self.resolve(rank_positive(&similarity.row(idx).to_vec(), n))
    }

    fn resolve(&self, ranked: Vec<(usize, f32)>) -> Vec<(MediaId, f32)> {
        ranked
            .into_iter()
            .filter_map(|(idx, score)| self.items.id_of(idx).map(|id| (id.to_string(), score)))
            .collect()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn state(&self) -> ModelState {
        match (&self.features, &self.similarity) {
            (None, _) => ModelState::Unbuilt,
            (Some(_), None) => ModelState::Built,
            (Some(_), Some(_)) => ModelState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.as_ref().map_or(0, CsrMatrix::n_cols)
    }

    /// Catalog metadata in index order
    pub fn media_items(&self) -> &[MediaItem] {
        &self.metadata
    }

    pub fn get_media(&self, media_id: &str) -> Option<&MediaItem> {
        self.items.index_of(media_id).map(|idx| &self.metadata[idx])
    }

    pub fn item_similarity(&self, a: &str, b: &str) -> Option<f32> {
        let similarity = self.similarity.as_ref()?;
        Some(similarity.get(self.items.index_of(a)?, self.items.index_of(b)?))
    }

    pub fn item_mapping(&self) -> &IndexMapping {
        &self.items
    }

    pub fn feature_matrix(&self) -> Option<&CsrMatrix> {
        self.features.as_ref()
    }

    pub fn similarity_matrix(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }
}
