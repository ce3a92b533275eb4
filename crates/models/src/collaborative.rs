//! User-based collaborative filtering
//!
//! "Users who interacted like you also interacted with these items"
//!
//! ## Algorithm
//! 1. Resolve every interaction to a relevance score and lay them out as a
//!    sparse user x item matrix (duplicate pairs keep the maximum score)
//! 2. Cosine similarity between all user rows; users with too few
//!    interactions are masked out so they neither get nor give neighbours
//! 3. For a target user, take the most similar users (positive similarity
//!    only) and predict each item as the similarity-weighted average of
//!    their scores
//! 4. Mask items the user already touched and return the top N

use crate::mapping::IndexMapping;
use crate::ModelState;
use crate::ranking::{rank_positive, select_top};
use crate::similarity::SimilarityMatrix;
use crate::sparse::CsrMatrix;
use data_loader::{Interaction, MediaId};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Maximum number of neighbours considered per prediction
pub const MAX_SIMILAR_USERS: usize = 50;

/// Users with fewer stored cells are excluded from the similarity matrix
pub const MIN_USER_INTERACTIONS: usize = 2;

/// User-based collaborative filter over a sparse interaction matrix
#[derive(Debug, Clone)]
pub struct CollaborativeFilter {
    max_similar_users: usize,
    min_user_interactions: usize,

    users: IndexMapping,
    items: IndexMapping,

    /// Users are rows, items are columns
    matrix: Option<CsrMatrix>,
    similarity: Option<SimilarityMatrix>,
}

impl Default for CollaborativeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CollaborativeFilter {
    pub fn new() -> Self {
        Self {
            max_similar_users: MAX_SIMILAR_USERS,
            min_user_interactions: MIN_USER_INTERACTIONS,
            users: IndexMapping::new(),
            items: IndexMapping::new(),
            matrix: None,
            similarity: None,
        }
    }

    /// Configure the neighbour cap (default: 50)
    pub fn with_max_similar_users(mut self, max: usize) -> Self {
        self.max_similar_users = max;
        self
    }

    /// Configure the minimum cells a user needs to take part in similarity (default: 2)
    pub fn with_min_user_interactions(mut self, min: usize) -> Self {
        self.min_user_interactions = min;
        self
    }

    // =========================================================================
    // Matrix construction
    // =========================================================================

    /// Build the user x item matrix from raw interactions.
    ///
    /// Replaces any previous matrix and drops the previous similarity. An
    /// empty input leaves the model `Unbuilt`.
    #[instrument(skip(self, interactions), fields(interactions = interactions.len()))]
    pub fn build_matrix(&mut self, interactions: &[Interaction]) {
        self.users = IndexMapping::new();
        self.items = IndexMapping::new();
        self.matrix = None;
        self.similarity = None;

        if interactions.is_empty() {
            warn!("No interactions provided; collaborative model will be empty");
            return;
        }

        // (user, item) -> best score seen so far
        let mut scores: HashMap<(usize, usize), f32> = HashMap::new();
        for interaction in interactions {
            let user = self.users.get_or_insert(&interaction.user_id);
            let item = self.items.get_or_insert(&interaction.media_id);
            let score = interaction.relevance();

            scores
                .entry((user, item))
                .and_modify(|best| {
                    if score > *best {
                        *best = score;
                    }
                })
                .or_insert(score);
        }

        let mut rows: Vec<Vec<(usize, f32)>> = vec![Vec::new(); self.users.len()];
        for ((user, item), score) in scores {
            rows[user].push((item, score));
        }

        let matrix = CsrMatrix::from_rows(self.items.len(), rows);
        info!(
            "Collaborative matrix built: {} users x {} items, {} stored entries",
            self.users.len(),
            self.items.len(),
            matrix.nnz()
        );
        self.matrix = Some(matrix);
    }

    // =========================================================================
    // Similarity
    // =========================================================================

    /// Compute pairwise cosine similarity between all users.
    #[instrument(skip(self))]
    pub fn compute_user_similarity(&mut self) {
        let Some(matrix) = self.matrix.as_ref() else {
            warn!("Cannot compute similarity: matrix not built");
            return;
        };

        let n_users = matrix.n_rows();
        let low: Vec<usize> = (0..n_users)
            .filter(|&u| matrix.row_nnz(u) < self.min_user_interactions)
            .collect();

        if low.len() == n_users {
            warn!(
                "All {} users below the {} interaction threshold",
                n_users, self.min_user_interactions
            );
            self.similarity = Some(SimilarityMatrix::zeros(n_users));
            return;
        }

        let mut similarity = SimilarityMatrix::cosine(matrix);
        similarity.zero_diagonal();
        for &u in &low {
            similarity.zero_row_and_column(u);
        }

        debug!("Masked {} low-activity users", low.len());
        info!("User similarity matrix computed ({} x {})", n_users, n_users);
        self.similarity = Some(similarity);
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict scores for items the user has not interacted with yet.
    ///
    /// Returns at most `n` `(media_id, score)` pairs, best first. Unknown
    /// users (cold start) and an unready model give an empty list.
    #[instrument(skip(self))]
    pub fn predict_for_user(&self, user_id: &str, n: usize) -> Vec<(MediaId, f32)> {
        let (Some(matrix), Some(similarity)) = (self.matrix.as_ref(), self.similarity.as_ref())
        else {
            return Vec::new();
        };
        let Some(target) = self.users.index_of(user_id) else {
            debug!("Cold start: {} has no interactions", user_id);
            return Vec::new();
        };

        let candidates: Vec<(usize, f32)> = similarity
            .row(target)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, sim)| sim > 0.0)
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let neighbours = select_top(candidates, self.max_similar_users);
        let sim_total: f32 = neighbours.iter().map(|&(_, sim)| sim).sum();
        if sim_total == 0.0 {
            return Vec::new();
        }

        let mut predicted = vec![0.0f32; matrix.n_cols()];
        for &(neighbour, sim) in &neighbours {
            for (item, score) in matrix.row_iter(neighbour) {
                predicted[item] += sim * score;
            }
        }
        for value in predicted.iter_mut() {
            *value /= sim_total;
        }

        for (item, score) in matrix.row_iter(target) {
            if score != 0.0 {
                predicted[item] = f32::NEG_INFINITY;
            }
        }

        debug!(
            "Predicting for {} from {} neighbours",
            user_id,
            neighbours.len()
        );

        rank_positive(&predicted, n)
            .into_iter()
            .filter_map(|(item, score)| self.items.id_of(item).map(|id| (id.to_string(), score)))
            .collect()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn state(&self) -> ModelState {
        match (&self.matrix, &self.similarity) {
            (None, _) => ModelState::Unbuilt,
            (Some(_), None) => ModelState::Built,
            (Some(_), Some(_)) => ModelState::Ready,
        }
    }

    /// Whether the matrix is built and similarity computed
    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of stored cells with a nonzero relevance
    pub fn interaction_count(&self) -> usize {
        self.matrix.as_ref().map_or(0, |m| {
            (0..m.n_rows())
                .map(|u| m.row_iter(u).filter(|&(_, v)| v != 0.0).count())
                .sum()
        })
    }

    /// Similarity between two users, if both are known and similarity is computed
    pub fn user_similarity(&self, a: &str, b: &str) -> Option<f32> {
        let similarity = self.similarity.as_ref()?;
        Some(similarity.get(self.users.index_of(a)?, self.users.index_of(b)?))
    }

    /// Relevance recorded for a (user, item) pair; zero when absent
    pub fn relevance(&self, user_id: &str, media_id: &str) -> Option<f32> {
        let matrix = self.matrix.as_ref()?;
        Some(matrix.get(self.users.index_of(user_id)?, self.items.index_of(media_id)?))
    }

    pub fn user_mapping(&self) -> &IndexMapping {
        &self.users
    }

    pub fn item_mapping(&self) -> &IndexMapping {
        &self.items
    }

    pub fn interaction_matrix(&self) -> Option<&CsrMatrix> {
        self.matrix.as_ref()
    }

    pub fn similarity_matrix(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::InteractionKind::{self, *};

    fn event(user: &str, media: &str, kind: InteractionKind) -> Interaction {
        Interaction::new(user, media, kind)
    }

    /// alice and bob share m1 (watch) and m2 (like); carol has neither.
    fn interactions() -> Vec<Interaction> {
        vec![
            event("alice", "m1", Watch),
            event("alice", "m2", Like),
            event("alice", "m4", Watch),
            event("bob", "m1", Watch),
            event("bob", "m2", Like),
            event("bob", "m3", Watch),
            event("carol", "m3", Watch),
            event("carol", "m4", Watch),
            event("carol", "m5", Like),
            event("dave", "m1", Like),
            event("dave", "m2", Like),
            event("dave", "m5", Watch),
        ]
    }

    fn built_model() -> CollaborativeFilter {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&interactions());
        cf.compute_user_similarity();
        cf
    }

    #[test]
    fn test_matrix_shape() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&interactions());

        assert_eq!(cf.interaction_matrix().unwrap().shape(), (4, 5));
        assert_eq!(cf.user_count(), 4);
        assert_eq!(cf.item_count(), 5);
        assert_eq!(cf.interaction_count(), 12);
        assert_eq!(cf.state(), ModelState::Built);
    }

    #[test]
    fn test_explicit_rating_normalized() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[
            Interaction::rated("u1", "i1", 10.0),
            Interaction::rated("u1", "i2", 5.0),
            Interaction::rated("u1", "i3", 1.0),
        ]);

        assert!((cf.relevance("u1", "i1").unwrap() - 2.0).abs() < 1e-6);
        assert!((cf.relevance("u1", "i2").unwrap() - 1.0).abs() < 1e-6);
        assert!((cf.relevance("u1", "i3").unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_pair_keeps_max() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[event("u1", "i1", Watch), event("u1", "i1", Like)]);
        assert_eq!(cf.relevance("u1", "i1"), Some(2.0));

        // Order does not matter
        cf.build_matrix(&[event("u1", "i1", Like), event("u1", "i1", Dislike)]);
        assert_eq!(cf.relevance("u1", "i1"), Some(2.0));
    }

    #[test]
    fn test_unrated_rate_is_stored_but_not_counted() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[event("u1", "i1", Rate), event("u1", "i2", Watch)]);

        assert_eq!(cf.interaction_matrix().unwrap().row_nnz(0), 2);
        assert_eq!(cf.interaction_count(), 1);
    }

    #[test]
    fn test_empty_interactions() {
        let mut cf = built_model();
        cf.build_matrix(&[]);

        assert_eq!(cf.state(), ModelState::Unbuilt);
        assert_eq!(cf.user_count(), 0);
        assert_eq!(cf.item_count(), 0);
        assert!(cf.predict_for_user("alice", 10).is_empty());
    }

    #[test]
    fn test_rebuild_invalidates_similarity() {
        let mut cf = built_model();
        assert!(cf.is_ready());

        cf.build_matrix(&interactions());
        assert_eq!(cf.state(), ModelState::Built);
        assert!(cf.user_similarity("alice", "bob").is_none());
    }

    #[test]
    fn test_similarity_without_build_is_noop() {
        let mut cf = CollaborativeFilter::new();
        cf.compute_user_similarity();
        assert_eq!(cf.state(), ModelState::Unbuilt);
    }

    #[test]
    fn test_similar_users_score_higher() {
        let cf = built_model();
        let ab = cf.user_similarity("alice", "bob").unwrap();
        let ac = cf.user_similarity("alice", "carol").unwrap();
        assert!(ab > ac, "alice-bob {ab} should exceed alice-carol {ac}");
    }

    #[test]
    fn test_similarity_properties() {
        let cf = built_model();
        let sim = cf.similarity_matrix().unwrap();

        assert!(sim.is_symmetric());
        for i in 0..sim.n() {
            assert_eq!(sim.get(i, i), 0.0);
            assert!(sim.row(i).iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_low_interaction_users_zeroed() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[
            event("u1", "i1", Watch),
            event("u2", "i1", Watch),
            event("u2", "i2", Watch),
            event("u3", "i1", Watch),
            event("u3", "i2", Watch),
        ]);
        cf.compute_user_similarity();

        let sim = cf.similarity_matrix().unwrap();
        let u1 = cf.user_mapping().index_of("u1").unwrap();
        assert!(sim.row(u1).iter().all(|&v| v == 0.0));
        assert!((0..sim.n()).all(|i| sim.get(i, u1) == 0.0));
        assert!(cf.user_similarity("u2", "u3").unwrap() > 0.99);
    }

    #[test]
    fn test_all_users_below_threshold() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[event("u1", "i1", Watch), event("u2", "i1", Watch)]);
        cf.compute_user_similarity();

        assert!(cf.is_ready());
        assert_eq!(cf.user_similarity("u1", "u2"), Some(0.0));
        assert!(cf.predict_for_user("u1", 5).is_empty());
    }

    #[test]
    fn test_predictions_exclude_interacted_items() {
        let cf = built_model();
        let preds = cf.predict_for_user("alice", 20);

        assert!(!preds.is_empty());
        for (media_id, score) in &preds {
            assert!(!["m1", "m2", "m4"].contains(&media_id.as_str()));
            assert!(*score > 0.0 && score.is_finite());
        }
        assert!(preds.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(preds.iter().any(|(id, _)| id == "m3" || id == "m5"));
    }

    #[test]
    fn test_disliked_item_is_still_masked() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[
            event("u1", "a", Like),
            event("u1", "b", Dislike),
            event("u2", "a", Like),
            event("u2", "b", Like),
            event("u2", "c", Like),
        ]);
        cf.compute_user_similarity();

        let preds = cf.predict_for_user("u1", 10);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].0, "c");
    }

    #[test]
    fn test_prediction_is_weighted_average() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[
            event("u1", "a", Watch),
            event("u1", "b", Watch),
            event("u2", "a", Watch),
            event("u2", "b", Watch),
            event("u2", "c", Like),
        ]);
        cf.compute_user_similarity();

        // A single neighbour: the prediction is that neighbour's own score
        let preds = cf.predict_for_user("u1", 5);
        assert_eq!(preds, vec![("c".to_string(), 2.0)]);
    }

    #[test]
    fn test_respects_limit_and_neighbour_cap() {
        let cf = built_model().with_max_similar_users(1);
        assert!(cf.predict_for_user("alice", 1).len() <= 1);
    }

    #[test]
    fn test_unknown_and_unready() {
        let cf = built_model();
        assert!(cf.predict_for_user("nobody", 20).is_empty());
        assert!(CollaborativeFilter::new().predict_for_user("alice", 20).is_empty());
    }

    #[test]
    fn test_single_user_gets_nothing() {
        let mut cf = CollaborativeFilter::new();
        cf.build_matrix(&[event("u1", "i1", Watch), event("u1", "i2", Watch)]);
        cf.compute_user_similarity();
        assert!(cf.predict_for_user("u1", 5).is_empty());
    }

    #[test]
    fn test_mappings_are_bijective() {
        let cf = built_model();
        for mapping in [cf.user_mapping(), cf.item_mapping()] {
            for (idx, id) in mapping.ids().iter().enumerate() {
                assert_eq!(mapping.index_of(id), Some(idx));
            }
        }
    }
}
