//! Benchmarks for model builds and predictions
//!
//! Run with: cargo bench --package models
//!
//! Uses a synthetic catalog and interaction stream so no dataset is needed.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{Interaction, InteractionKind, MediaItem, MediaKind};
use models::{CollaborativeFilter, ContentBasedFilter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const USERS: usize = 500;
const ITEMS: usize = 1000;
const EVENTS_PER_USER: usize = 20;

const GENRES: &[&str] = &[
    "action", "adventure", "animation", "comedy", "crime", "documentary", "drama", "fantasy",
    "horror", "mystery", "romance", "sci-fi", "thriller", "western",
];

const KINDS: &[InteractionKind] = &[
    InteractionKind::Watch,
    InteractionKind::Completed,
    InteractionKind::Like,
    InteractionKind::Dislike,
    InteractionKind::AddToWatchlist,
    InteractionKind::Skip,
];

fn synthetic_interactions(rng: &mut StdRng) -> Vec<Interaction> {
    let mut interactions = Vec::with_capacity(USERS * EVENTS_PER_USER);
    for user in 0..USERS {
        for _ in 0..EVENTS_PER_USER {
            let media = rng.random_range(0..ITEMS);
            let kind = KINDS[rng.random_range(0..KINDS.len())];
            interactions.push(Interaction::new(format!("u{user}"), format!("m{media}"), kind));
        }
    }
    interactions
}

fn synthetic_catalog(rng: &mut StdRng) -> Vec<MediaItem> {
    (0..ITEMS)
        .map(|i| {
            let first = GENRES[rng.random_range(0..GENRES.len())];
            let second = GENRES[rng.random_range(0..GENRES.len())];
            MediaItem {
                id: format!("m{i}"),
                title: format!("Title {i}"),
                genres: format!("{first},{second}"),
                community_rating: Some(rng.random_range(1.0..10.0)),
                kind: if i % 3 == 0 { MediaKind::Series } else { MediaKind::Movie },
            }
        })
        .collect()
}

fn bench_collaborative(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let interactions = synthetic_interactions(&mut rng);

    c.bench_function("collaborative_build_and_similarity", |b| {
        b.iter(|| {
            let mut cf = CollaborativeFilter::new();
            cf.build_matrix(black_box(&interactions));
            cf.compute_user_similarity();
            black_box(cf)
        })
    });

    let mut cf = CollaborativeFilter::new();
    cf.build_matrix(&interactions);
    cf.compute_user_similarity();

    c.bench_function("collaborative_predict_for_user", |b| {
        b.iter(|| black_box(cf.predict_for_user(black_box("u7"), black_box(60))))
    });
}

fn bench_content_based(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let catalog = synthetic_catalog(&mut rng);

    c.bench_function("content_build_and_similarity", |b| {
        b.iter(|| {
            let mut cbf = ContentBasedFilter::new();
            cbf.build_feature_matrix(black_box(&catalog));
            cbf.compute_item_similarity();
            black_box(cbf)
        })
    });

    let mut cbf = ContentBasedFilter::new();
    cbf.build_feature_matrix(&catalog);
    cbf.compute_item_similarity();
    let watched = ["m1", "m10", "m100", "m500"];

    c.bench_function("content_recommend_for_user", |b| {
        b.iter(|| black_box(cbf.recommend_for_user(black_box(&watched), black_box(60))))
    });
}

criterion_group!(benches, bench_collaborative, bench_content_based);
criterion_main!(benches);
