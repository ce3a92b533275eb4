//! Core domain types for the media catalog and its event streams.
//!
//! Everything in here is an immutable fact pulled from an external store:
//! interactions from the event stream, catalog records, and per-user watch
//! progress. The model crates never mutate these records; they only read
//! them while building a new generation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// External user identifier (opaque string, usually a UUID)
pub type UserId = String;

/// External media identifier (opaque string, usually a UUID)
pub type MediaId = String;

// =============================================================================
// Interaction-related Types
// =============================================================================

/// What a user did with a media item.
///
/// This is a closed set. Anything the event stream sends that we don't
/// recognize becomes `Unknown` instead of failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Watch,
    Completed,
    Like,
    Dislike,
    AddToWatchlist,
    Skip,
    /// Explicit rating; the score comes from `Interaction::rating`
    Rate,
    Unknown,
}

impl InteractionKind {
    /// Parse the wire name used by the event stream.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "watch" => InteractionKind::Watch,
            "completed" => InteractionKind::Completed,
            "like" => InteractionKind::Like,
            "dislike" => InteractionKind::Dislike,
            "add_to_watchlist" => InteractionKind::AddToWatchlist,
            "skip" => InteractionKind::Skip,
            "rate" => InteractionKind::Rate,
            _ => InteractionKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Watch => "watch",
            InteractionKind::Completed => "completed",
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
            InteractionKind::AddToWatchlist => "add_to_watchlist",
            InteractionKind::Skip => "skip",
            InteractionKind::Rate => "rate",
            InteractionKind::Unknown => "unknown",
        }
    }

    /// Implicit relevance signal for this kind.
    ///
    /// `Rate` carries no implicit weight: an explicit rating replaces it
    /// (see [`Interaction::relevance`]).
    pub fn implicit_weight(&self) -> f32 {
        match self {
            InteractionKind::Watch => 1.0,
            InteractionKind::Completed => 1.5,
            InteractionKind::Like => 2.0,
            InteractionKind::Dislike => -1.0,
            InteractionKind::AddToWatchlist => 0.5,
            InteractionKind::Skip => -0.5,
            InteractionKind::Rate => 0.0,
            InteractionKind::Unknown => 0.5,
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-media interaction from the event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub media_id: MediaId,
    pub kind: InteractionKind,
    /// Explicit rating on a 1-10 scale, only meaningful for `Rate`
    pub rating: Option<f32>,
    /// Unix timestamp of the event
    pub timestamp: i64,
}

impl Interaction {
    /// Implicit interaction with no rating and a zero timestamp.
    pub fn new(
        user_id: impl Into<UserId>,
        media_id: impl Into<MediaId>,
        kind: InteractionKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            media_id: media_id.into(),
            kind,
            rating: None,
            timestamp: 0,
        }
    }

    /// Explicit rating interaction (1-10 scale).
    pub fn rated(user_id: impl Into<UserId>, media_id: impl Into<MediaId>, rating: f32) -> Self {
        Self {
            rating: Some(rating),
            ..Self::new(user_id, media_id, InteractionKind::Rate)
        }
    }

    /// Set the event timestamp (builder style).
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Resolve this interaction to a relevance score.
    ///
    /// An explicit rating maps the 1-10 scale onto roughly [0.2, 2.0] so it
    /// lines up with the implicit weights; everything else uses the kind's
    /// implicit weight.
    pub fn relevance(&self) -> f32 {
        match (self.kind, self.rating) {
            (InteractionKind::Rate, Some(rating)) => rating / 5.0,
            (kind, _) => kind.implicit_weight(),
        }
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Kind of media item in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
    Episode,
    Unknown,
    /// Any other kind the catalog knows about (e.g. "documentary")
    Other(String),
}

impl MediaKind {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "movie" => MediaKind::Movie,
            "series" => MediaKind::Series,
            "episode" => MediaKind::Episode,
            "" | "unknown" => MediaKind::Unknown,
            _ => MediaKind::Other(s.to_string()),
        }
    }

    /// Token contributed to the item's text document, `None` for `Unknown`.
    pub fn token(&self) -> Option<&str> {
        match self {
            MediaKind::Movie => Some("movie"),
            MediaKind::Series => Some("series"),
            MediaKind::Episode => Some("episode"),
            MediaKind::Unknown => None,
            MediaKind::Other(kind) => Some(kind.as_str()),
        }
    }
}

/// A catalog record, as used by content-based filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub title: String,
    /// Comma or semicolon separated genre names, e.g. "action,sci-fi"
    pub genres: String,
    /// Community rating on a 0-10 scale
    pub community_rating: Option<f32>,
    pub kind: MediaKind,
}

impl MediaItem {
    /// Community rating, `None` when absent or not a finite number
    pub fn usable_rating(&self) -> Option<f32> {
        self.community_rating.filter(|r| r.is_finite())
    }
}

// =============================================================================
// Watch History
// =============================================================================

/// A watch-progress record for a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    pub media_id: MediaId,
    /// Fraction watched, 0.0 ..= 1.0
    pub progress: f32,
    /// Unix timestamp of the last playback update
    pub last_watched: i64,
}

// =============================================================================
// Dataset - In-Memory Snapshot of the Stores
// =============================================================================

/// In-memory snapshot of the three record streams.
///
/// Interactions are kept most-recent-first so a bounded read always
/// returns the newest activity. Watch history is grouped by user for
/// O(1) lookups.
#[derive(Debug, Default)]
pub struct Dataset {
    pub(crate) interactions: Vec<Interaction>,
    pub(crate) media: Vec<MediaItem>,
    pub(crate) history: HashMap<UserId, Vec<WatchHistoryEntry>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// The newest `limit` interactions, most recent first
    pub fn recent_interactions(&self, limit: usize) -> &[Interaction] {
        &self.interactions[..limit.min(self.interactions.len())]
    }

    /// Every catalog record, in load order
    pub fn media_items(&self) -> &[MediaItem] {
        &self.media
    }

    /// Watch history for a user; empty slice for unknown users
    pub fn watch_history(&self, user_id: &str) -> &[WatchHistoryEntry] {
        self.history
            .get(user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_media(&self, media_id: &str) -> Option<&MediaItem> {
        self.media.iter().find(|item| item.id == media_id)
    }

    /// Distinct user ids seen in the interaction stream, first-seen order
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut seen = HashSet::new();
        self.interactions
            .iter()
            .filter(|i| seen.insert(i.user_id.as_str()))
            .map(|i| i.user_id.clone())
            .collect()
    }

    /// Insert an interaction, keeping the most-recent-first order.
    ///
    /// Among equal timestamps the earlier insert stays first.
    pub fn insert_interaction(&mut self, interaction: Interaction) {
        let pos = self
            .interactions
            .partition_point(|existing| existing.timestamp >= interaction.timestamp);
        self.interactions.insert(pos, interaction);
    }

    pub fn insert_media(&mut self, item: MediaItem) {
        self.media.push(item);
    }

    pub fn insert_history(&mut self, user_id: impl Into<UserId>, entry: WatchHistoryEntry) {
        self.history.entry(user_id.into()).or_default().push(entry);
    }

    /// (interactions, media items, users with history)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.interactions.len(), self.media.len(), self.history.len())
    }
}
