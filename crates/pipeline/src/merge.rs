//! Blending collaborative and content scores into one ranked list.
//!
//! The two sources score on unrelated scales, so each list is min-max
//! normalised on its own before the weighted sum. The reason tag records
//! which normalised component was larger.

use crate::types::{MergeWeights, Reason, Recommendation};
use data_loader::MediaId;
use models::ranking::round4;
use std::collections::HashMap;
use tracing::debug;

/// Min-max normalise scores into [0, 1].
///
/// When every score is equal there is no spread to scale, so each item
/// gets 0.5. Order and ids are preserved.
pub fn normalize(scores: &[(MediaId, f32)]) -> Vec<(MediaId, f32)> {
    if scores.is_empty() {
        return Vec::new();
    }

    let (lo, hi) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, s)| {
            (lo.min(s), hi.max(s))
        });
    let span = hi - lo;

    scores
        .iter()
        .map(|(id, s)| {
            let normalized = if span == 0.0 { 0.5 } else { (s - lo) / span };
            (id.clone(), normalized)
        })
        .collect()
}

/// Merge both prediction lists into one ranked list.
///
/// An item missing from one source counts 0 for that component. Ties keep
/// first-seen order: collaborative items first, then content-only items.
pub fn merge_scores(
    collaborative: &[(MediaId, f32)],
    content: &[(MediaId, f32)],
    weights: MergeWeights,
) -> Vec<Recommendation> {
    let cf_norm = normalize(collaborative);
    let cb_norm = normalize(content);

    // media id -> slot in `combined`, which keeps first-seen order
    let mut slots: HashMap<MediaId, usize> = HashMap::new();
    let mut combined: Vec<(MediaId, f32, f32)> = Vec::new();

    for (media_id, score) in cf_norm {
        match slots.get(&media_id) {
            Some(&slot) => combined[slot].1 = score,
            None => {
                slots.insert(media_id.clone(), combined.len());
                combined.push((media_id, score, 0.0));
            }
        }
    }
    for (media_id, score) in cb_norm {
        match slots.get(&media_id) {
            Some(&slot) => combined[slot].2 = score,
            None => {
                slots.insert(media_id.clone(), combined.len());
                combined.push((media_id, 0.0, score));
            }
        }
    }

    let mut merged: Vec<Recommendation> = combined
        .into_iter()
        .map(|(media_id, cf, cb)| {
            let score = weights.collaborative * cf + weights.content_based * cb;
            let reason = if cf >= cb {
                Reason::UsersLikeYou
            } else {
                Reason::SimilarToWatched
            };
            Recommendation::new(media_id, round4(score), reason)
        })
        .collect();

    // Stable, so equal scores keep insertion order
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        "Merged {} collaborative and {} content predictions into {}",
        collaborative.len(),
        content.len(),
        merged.len()
    );
    merged
}
