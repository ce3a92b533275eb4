//! # Data Loader Crate
//!
//! Domain records for the recommender and an in-memory snapshot of the
//! stores they come from.
//!
//! ## Main Components
//!
//! - **types**: Interaction, MediaItem, WatchHistoryEntry and the `Dataset` snapshot
//! - **parser**: Parse `::`-separated .dat files into those records
//! - **index**: Load, order and validate a `Dataset`
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_files(Path::new("data/sample"))?;
//! let newest = dataset.recent_interactions(10_000);
//! let history = dataset.watch_history("alice");
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    MediaId,
    // Core types
    Interaction,
    MediaItem,
    WatchHistoryEntry,
    Dataset,
    // Enums
    InteractionKind,
    MediaKind,
};
