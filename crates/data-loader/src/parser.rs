//! Parser for the `::`-separated dataset files.
//!
//! - interactions.dat: userId::mediaId::kind::rating::timestamp
//! - media.dat: mediaId::title::genres::communityRating::kind
//! - history.dat: userId::mediaId::progress::timestamp
//!
//! Optional numeric columns (ratings) may be left empty. Blank lines are
//! skipped. Every parse failure carries the file name and line number.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::Path;

pub const INTERACTIONS_FILE: &str = "interactions.dat";
pub const MEDIA_FILE: &str = "media.dat";
pub const HISTORY_FILE: &str = "history.dat";

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Split a trimmed line into exactly `expected` fields.
fn split_fields<'a>(
    line: &'a str,
    expected: usize,
    file: &str,
    line_no: usize,
) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = line.split("::").map(str::trim).collect();
    if parts.len() != expected {
        return Err(DataLoadError::FieldCountMismatch {
            file: file.to_string(),
            expected,
            found: parts.len(),
            line: line_no,
        });
    }
    Ok(parts)
}

fn parse_required<T>(value: &str, field: &str, file: &str, line_no: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if value.is_empty() {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!("Missing {}", field),
        });
    }
    value.parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line: line_no,
        reason: format!("Invalid {}: {}", field, e),
    })
}

fn parse_optional(value: &str, field: &str, file: &str, line_no: usize) -> Result<Option<f32>> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_required(value, field, file, line_no).map(Some)
}

fn parse_id(value: &str, field: &str, file: &str, line_no: usize) -> Result<String> {
    if value.is_empty() {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!("Missing {}", field),
        });
    }
    Ok(value.to_string())
}

/// Iterate over non-blank lines with their 1-based line numbers.
fn data_lines(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse interaction lines: userId::mediaId::kind::rating::timestamp
pub fn parse_interaction_lines(lines: &[String]) -> Result<Vec<Interaction>> {
    let file = INTERACTIONS_FILE;
    let mut interactions = Vec::new();

    for (line_no, line) in data_lines(lines) {
        let parts = split_fields(line, 5, file, line_no)?;

        let interaction = Interaction {
            user_id: parse_id(parts[0], "userId", file, line_no)?,
            media_id: parse_id(parts[1], "mediaId", file, line_no)?,
            kind: InteractionKind::parse(parts[2]),
            rating: parse_optional(parts[3], "rating", file, line_no)?,
            timestamp: parse_required(parts[4], "timestamp", file, line_no)?,
        };

        interactions.push(interaction);
    }

    Ok(interactions)
}

/// Parse catalog lines: mediaId::title::genres::communityRating::kind
pub fn parse_media_lines(lines: &[String]) -> Result<Vec<MediaItem>> {
    let file = MEDIA_FILE;
    let mut media = Vec::new();

    for (line_no, line) in data_lines(lines) {
        let parts = split_fields(line, 5, file, line_no)?;

        let item = MediaItem {
            id: parse_id(parts[0], "mediaId", file, line_no)?,
            title: parts[1].to_string(),
            genres: parts[2].to_string(),
            community_rating: parse_optional(parts[3], "communityRating", file, line_no)?,
            kind: MediaKind::parse(parts[4]),
        };

        media.push(item);
    }

    Ok(media)
}

/// Parse watch-history lines: userId::mediaId::progress::timestamp
pub fn parse_history_lines(lines: &[String]) -> Result<Vec<(UserId, WatchHistoryEntry)>> {
    let file = HISTORY_FILE;
    let mut history = Vec::new();

    for (line_no, line) in data_lines(lines) {
        let parts = split_fields(line, 4, file, line_no)?;

        let user_id = parse_id(parts[0], "userId", file, line_no)?;
        let entry = WatchHistoryEntry {
            media_id: parse_id(parts[1], "mediaId", file, line_no)?,
            progress: parse_required(parts[2], "progress", file, line_no)?,
            last_watched: parse_required(parts[3], "timestamp", file, line_no)?,
        };

        history.push((user_id, entry));
    }

    Ok(history)
}

pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    parse_interaction_lines(&read_lines(path)?)
}

pub fn parse_media(path: &Path) -> Result<Vec<MediaItem>> {
    parse_media_lines(&read_lines(path)?)
}

pub fn parse_history(path: &Path) -> Result<Vec<(UserId, WatchHistoryEntry)>> {
    parse_history_lines(&read_lines(path)?)
}
