//! Cold-start fallback by community rating.
//!
//! Used when neither sub-model has anything to say about a user (new user,
//! no history, or models not ready). The community rating stands in for
//! popularity.

use crate::types::{Reason, Recommendation};
use data_loader::MediaItem;
use models::ranking::round4;
use std::collections::HashSet;

/// Rank unwatched catalog items by community rating.
///
/// Missing or non-finite ratings count as 0. Scores are divided by the top rating so the
/// best item scores 1.0; a non-positive top rating divides by 1 instead.
/// Equal ratings keep catalog order.
pub fn popularity_fallback<S: AsRef<str>>(
    items: &[MediaItem],
    watched: &[S],
    limit: usize,
) -> Vec<Recommendation> {
    let watched: HashSet<&str> = watched.iter().map(|id| id.as_ref()).collect();

    let mut rated: Vec<(&str, f32)> = items
        .iter()
        .filter(|item| !watched.contains(item.id.as_str()))
        .map(|item| (item.id.as_str(), item.usable_rating().unwrap_or(0.0)))
        .collect();
    rated.sort_by(|a, b| b.1.total_cmp(&a.1));

    let Some(&(_, top)) = rated.first() else {
        return Vec::new();
    };
    let max_rating = if top > 0.0 { top } else { 1.0 };

    rated
        .into_iter()
        .take(limit)
        .map(|(id, rating)| Recommendation::new(id, round4(rating / max_rating), Reason::Popular))
        .collect()
}
