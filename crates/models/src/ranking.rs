//! Partial top-K selection shared by both models.

use std::cmp::Ordering;

/// Descending by score, ties broken by the lower index.
fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Keep the `k` best `(index, score)` pairs, sorted descending.
///
/// Uses a partial selection first so only the survivors get fully sorted.
pub fn select_top(mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }
    if scored.len() > k {
        scored.select_nth_unstable_by(k - 1, by_score_desc);
        scored.truncate(k);
    }
    scored.sort_unstable_by(by_score_desc);
    scored
}

/// Rank a dense score vector and keep the leading strictly positive entries.
///
/// NaN is treated as negative infinity. Walking the top `n` in order, the
/// first score that is non-positive or infinite ends the list.
pub fn rank_positive(scores: &[f32], n: usize) -> Vec<(usize, f32)> {
    let scored: Vec<(usize, f32)> = scores
        .iter()
        .enumerate()
        .map(|(idx, &score)| (idx, if score.is_nan() { f32::NEG_INFINITY } else { score }))
        .collect();

    select_top(scored, n)
        .into_iter()
        .take_while(|&(_, score)| score > 0.0 && score.is_finite())
        .map(|(idx, score)| (idx, round4(score)))
        .collect()
}

/// Round to 4 decimal places
pub fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
