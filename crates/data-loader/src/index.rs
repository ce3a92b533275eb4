//! Dataset loading and validation.
//!
//! Parses the three record files in parallel with Rayon, orders the
//! interaction stream newest-first, groups history by user, and checks
//! referential integrity before handing the snapshot out.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

impl Dataset {
    /// Load a dataset directory containing interactions.dat, media.dat and history.dat
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let interactions_path = data_dir.join(parser::INTERACTIONS_FILE);
        let media_path = data_dir.join(parser::MEDIA_FILE);
        let history_path = data_dir.join(parser::HISTORY_FILE);

        // Three-way parallel parse via nested joins
        let ((interactions, media), history) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_interactions(&interactions_path),
                    || parser::parse_media(&media_path),
                )
            },
            || parser::parse_history(&history_path),
        );

        let interactions = interactions?;
        let media = media?;
        let history = history?;

        info!(
            "Parsed {} interactions, {} media items, {} history rows",
            interactions.len(),
            media.len(),
            history.len()
        );

        let dataset = Self::from_records(interactions, media, history);
        dataset.validate()?;

        info!("Dataset loaded and validated");
        Ok(dataset)
    }

    /// Assemble a dataset from already-parsed records.
    pub fn from_records(
        mut interactions: Vec<Interaction>,
        media: Vec<MediaItem>,
        history: Vec<(UserId, WatchHistoryEntry)>,
    ) -> Self {
        // Stable: equal timestamps keep file order
        interactions.sort_by_key(|i| Reverse(i.timestamp));

        let mut dataset = Dataset {
            interactions,
            media,
            ..Dataset::default()
        };
        for (user_id, entry) in history {
            dataset.insert_history(user_id, entry);
        }
        dataset
    }

    /// Validate data integrity
    ///
    /// Checks that:
    /// - explicit ratings are on the 1-10 scale
    /// - community ratings are finite and on the 0-10 scale
    /// - watch progress is within 0.0 ..= 1.0
    /// - every history row points at a catalog item
    pub fn validate(&self) -> Result<()> {
        for interaction in &self.interactions {
            if let Some(rating) = interaction.rating {
                if !(1.0..=10.0).contains(&rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "rating".to_string(),
                        value: rating.to_string(),
                    });
                }
            }
        }

        for item in &self.media {
            if let Some(rating) = item.community_rating {
                if !(0.0..=10.0).contains(&rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "communityRating".to_string(),
                        value: rating.to_string(),
                    });
                }
            }
        }

        let catalog: HashSet<&str> = self.media.iter().map(|m| m.id.as_str()).collect();
        for entries in self.history.values() {
            for entry in entries {
                if !(0.0..=1.0).contains(&entry.progress) {
                    return Err(DataLoadError::InvalidValue {
                        field: "progress".to_string(),
                        value: entry.progress.to_string(),
                    });
                }
                if !catalog.contains(entry.media_id.as_str()) {
                    return Err(DataLoadError::MissingReference {
                        entity: "MediaItem".to_string(),
                        id: entry.media_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            genres: "drama".to_string(),
            community_rating: Some(7.0),
            kind: MediaKind::Movie,
        }
    }

    #[test]
    fn test_from_records_orders_newest_first() {
        let dataset = Dataset::from_records(
            vec![
                Interaction::new("a", "m1", InteractionKind::Watch).at(10),
                Interaction::new("b", "m1", InteractionKind::Like).at(30),
                Interaction::new("c", "m1", InteractionKind::Skip).at(20),
            ],
            vec![item("m1")],
            vec![],
        );

        let users: Vec<&str> = dataset
            .recent_interactions(10)
            .iter()
            .map(|i| i.user_id.as_str())
            .collect();
        assert_eq!(users, vec!["b", "c", "a"]);
        assert_eq!(dataset.recent_interactions(1).len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_progress() {
        let dataset = Dataset::from_records(
            vec![],
            vec![item("m1")],
            vec![(
                "a".to_string(),
                WatchHistoryEntry {
                    media_id: "m1".to_string(),
                    progress: 1.5,
                    last_watched: 0,
                },
            )],
        );
        assert!(matches!(
            dataset.validate(),
            Err(DataLoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_history_media() {
        let dataset = Dataset::from_records(
            vec![],
            vec![item("m1")],
            vec![(
                "a".to_string(),
                WatchHistoryEntry {
                    media_id: "ghost".to_string(),
                    progress: 0.5,
                    last_watched: 0,
                },
            )],
        );
        assert!(matches!(
            dataset.validate(),
            Err(DataLoadError::MissingReference { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_scale_rating() {
        let dataset = Dataset::from_records(
            vec![Interaction::rated("a", "m1", 11.0)],
            vec![item("m1")],
            vec![],
        );
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_community_rating() {
        let media = parser::parse_media_lines(&[
            "m8::Y::drama::NaN::movie".to_string(),
            "m9::X::drama::inf::movie".to_string(),
        ])
        .unwrap();

        for bad in media {
            let dataset = Dataset::from_records(vec![], vec![item("m1"), bad], vec![]);
            assert!(matches!(
                dataset.validate(),
                Err(DataLoadError::InvalidValue { ref field, .. }) if field == "communityRating"
            ));
        }

        let mut out_of_scale = item("m2");
        out_of_scale.community_rating = Some(10.5);
        let dataset = Dataset::from_records(vec![], vec![out_of_scale], vec![]);
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn test_load_from_files_validates() {
        let dir = std::env::temp_dir().join(format!("data-loader-invalid-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(parser::INTERACTIONS_FILE), "u1::m1::watch::::1717000000\n").unwrap();
        std::fs::write(dir.join(parser::MEDIA_FILE), "m1::Title::drama::NaN::movie\n").unwrap();
        std::fs::write(dir.join(parser::HISTORY_FILE), "u1::m1::0.5::1717000000\n").unwrap();

        let result = Dataset::load_from_files(&dir);
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(
            result,
            Err(DataLoadError::InvalidValue { ref field, .. }) if field == "communityRating"
        ));
    }

    #[test]
    fn test_load_dataset() {
        // Requires a dataset directory; skipped when absent
        let data_dir = Path::new("../../data/sample");

        if data_dir.exists() {
            let dataset = Dataset::load_from_files(data_dir).unwrap();
            let (interactions, media, _) = dataset.counts();
            assert!(interactions > 0);
            assert!(media > 0);
        }
    }
}
