//! Properties that must hold for both models on a larger synthetic dataset.

use data_loader::{Interaction, InteractionKind, MediaItem, MediaKind};
use models::{CollaborativeFilter, ContentBasedFilter, ModelState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KINDS: &[InteractionKind] = &[
    InteractionKind::Watch,
    InteractionKind::Completed,
    InteractionKind::Like,
    InteractionKind::Dislike,
    InteractionKind::AddToWatchlist,
    InteractionKind::Skip,
    InteractionKind::Rate,
    InteractionKind::Unknown,
];

fn interactions(seed: u64) -> Vec<Interaction> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..600)
        .map(|_| {
            let user = format!("u{}", rng.random_range(0..40));
            let media = format!("m{}", rng.random_range(0..80));
            let kind = KINDS[rng.random_range(0..KINDS.len())];
            if kind == InteractionKind::Rate && rng.random_bool(0.7) {
                Interaction::rated(user, media, rng.random_range(1..=10) as f32)
            } else {
                Interaction::new(user, media, kind)
            }
        })
        .collect()
}

fn catalog() -> Vec<MediaItem> {
    let genres = ["action,adventure", "drama", "comedy;romance", "horror,thriller", "sci-fi"];
    (0..80)
        .map(|i| MediaItem {
            id: format!("m{i}"),
            title: format!("Title {i}"),
            genres: genres[i % genres.len()].to_string(),
            community_rating: if i % 7 == 0 { None } else { Some((i % 10) as f32 + 0.5) },
            kind: match i % 4 {
                0 => MediaKind::Series,
                1 => MediaKind::Unknown,
                _ => MediaKind::Movie,
            },
        })
        .collect()
}

fn collaborative(data: &[Interaction]) -> CollaborativeFilter {
    let mut cf = CollaborativeFilter::new();
    cf.build_matrix(data);
    cf.compute_user_similarity();
    cf
}

fn content(items: &[MediaItem]) -> ContentBasedFilter {
    let mut cbf = ContentBasedFilter::new();
    cbf.build_feature_matrix(items);
    cbf.compute_item_similarity();
    cbf
}

#[test]
fn test_collaborative_rebuild_is_deterministic() {
    let data = interactions(1);
    let first = collaborative(&data);
    let second = collaborative(&data);

    assert_eq!(first.interaction_matrix(), second.interaction_matrix());
    assert_eq!(first.similarity_matrix(), second.similarity_matrix());
    for user in first.user_mapping().ids() {
        assert_eq!(first.predict_for_user(user, 10), second.predict_for_user(user, 10));
    }
}

#[test]
fn test_content_rebuild_is_deterministic() {
    let items = catalog();
    let first = content(&items);
    let second = content(&items);

    assert_eq!(first.feature_matrix(), second.feature_matrix());
    assert_eq!(first.similarity_matrix(), second.similarity_matrix());
    assert_eq!(first.get_similar_items("m3", 10), second.get_similar_items("m3", 10));
}

#[test]
fn test_predictions_never_include_recorded_items() {
    let cf = collaborative(&interactions(2));
    assert_eq!(cf.state(), ModelState::Ready);

    for user in cf.user_mapping().ids() {
        let predictions = cf.predict_for_user(user, 80);
        for (media_id, score) in &predictions {
            assert_eq!(cf.relevance(user, media_id), Some(0.0));
            assert!(*score > 0.0 && score.is_finite());
        }
        assert!(predictions.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

#[test]
fn test_similarity_matrices_are_well_formed() {
    let cf = collaborative(&interactions(3));
    let user_sim = cf.similarity_matrix().unwrap();
    assert!(user_sim.is_symmetric());
    for i in 0..user_sim.n() {
        assert_eq!(user_sim.get(i, i), 0.0);
        assert!(user_sim.row(i).iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    let cbf = content(&catalog());
    let item_sim = cbf.similarity_matrix().unwrap();
    assert!(item_sim.is_symmetric());
    for i in 0..item_sim.n() {
        assert_eq!(item_sim.get(i, i), 0.0);
        assert!(item_sim.row(i).iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn test_mappings_are_bijective() {
    let cf = collaborative(&interactions(4));
    let cbf = content(&catalog());

    for mapping in [cf.user_mapping(), cf.item_mapping(), cbf.item_mapping()] {
        for idx in 0..mapping.len() {
            let id = mapping.id_of(idx).unwrap();
            assert_eq!(mapping.index_of(id), Some(idx));
        }
    }
}

#[test]
fn test_limits_are_respected() {
    let cf = collaborative(&interactions(5));
    let cbf = content(&catalog());

    for n in [0, 1, 3, 500] {
        assert!(cf.predict_for_user("u1", n).len() <= n);
        assert!(cbf.recommend_for_user(&["m0", "m5"], n).len() <= n);
        assert!(cbf.get_similar_items("m0", n).len() <= n);
    }
}
