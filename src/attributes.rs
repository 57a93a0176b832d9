//! Widget attributes as the host stores them.
//!
//! The on-disk shape is the block attribute schema (`isCurrentComicSelected`,
//! `selectedComicNumber`, ...), kept stable so files written by older builds
//! keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::comic::Comic;
use crate::selection::{Mode, SelectionState, clamp_number};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comic: Option<Comic>,
    #[serde(default = "default_current_selected")]
    pub is_current_comic_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_comic_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_comic_number: Option<u32>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
}

fn default_current_selected() -> bool {
    true
}

impl Default for WidgetAttributes {
    fn default() -> Self {
        Self {
            comic: None,
            is_current_comic_selected: default_current_selected(),
            selected_comic_number: None,
            last_comic_number: None,
            last_update: None,
        }
    }
}

impl From<WidgetAttributes> for SelectionState {
    fn from(attrs: WidgetAttributes) -> Self {
        // zero is not a strip
        let known_latest = attrs.last_comic_number.filter(|n| *n > 0);
        let pinned_number = attrs
            .selected_comic_number
            .filter(|n| *n > 0)
            .map(|n| clamp_number(i64::from(n), known_latest));
        Self {
            mode: if attrs.is_current_comic_selected { Mode::FollowLatest } else { Mode::Pinned },
            pinned_number,
            known_latest,
            last_refreshed_at: attrs.last_update.and_then(DateTime::from_timestamp_millis),
            loaded_comic: attrs.comic,
        }
    }
}

impl From<&SelectionState> for WidgetAttributes {
    fn from(state: &SelectionState) -> Self {
        Self {
            comic: state.loaded_comic.clone(),
            is_current_comic_selected: state.mode == Mode::FollowLatest,
            selected_comic_number: state.pinned_number,
            last_comic_number: state.known_latest,
            last_update: state.last_refreshed_at.map(|at| at.timestamp_millis()),
        }
    }
}

pub fn default_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rxkcd")
        .join("widget.json")
}

/// Reads attributes from `path`, or defaults when the file does not exist yet.
pub fn load(path: &Path) -> Result<WidgetAttributes> {
    if !path.exists() {
        return Ok(WidgetAttributes::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read widget attributes from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse widget attributes in {}", path.display()))
}

pub fn save(path: &Path, attrs: &WidgetAttributes) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(attrs).context("Failed to serialize widget attributes")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write widget attributes to {}", path.display()))?;
    tracing::debug!(path = %path.display(), "widget attributes saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn comic() -> Comic {
        Comic {
            identifier: 10,
            title: "Pi Equals".to_string(),
            image_url: "https://imgs.xkcd.com/comics/pi.jpg".to_string(),
            alt_text: "My most famous drawing".to_string(),
        }
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let attrs: WidgetAttributes = serde_json::from_str("{}").unwrap();
        assert_eq!(attrs, WidgetAttributes::default());
        assert_eq!(SelectionState::from(attrs), SelectionState::default());
    }

    #[test]
    fn test_reads_block_schema() {
        let json = r#"{
            "comic": {"num": 10, "title": "Pi Equals", "img": "https://imgs.xkcd.com/comics/pi.jpg", "alt": "My most famous drawing"},
            "isCurrentComicSelected": false,
            "selectedComicNumber": 10,
            "lastComicNumber": 2955,
            "lastUpdate": 1700000000000
        }"#;
        let state = SelectionState::from(serde_json::from_str::<WidgetAttributes>(json).unwrap());

        assert_eq!(state.mode, Mode::Pinned);
        assert_eq!(state.pinned_number, Some(10));
        assert_eq!(state.known_latest, Some(2955));
        assert_eq!(state.last_refreshed_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(state.loaded_comic, Some(comic()));
    }

    #[test]
    fn test_zero_numbers_are_dropped() {
        let attrs = WidgetAttributes {
            selected_comic_number: Some(0),
            last_comic_number: Some(0),
            ..WidgetAttributes::default()
        };
        let state = SelectionState::from(attrs);
        assert_eq!(state.pinned_number, None);
        assert_eq!(state.known_latest, None);
    }

    #[test]
    fn test_out_of_range_pin_is_clamped_to_stored_bound() {
        let json = r#"{
            "isCurrentComicSelected": false,
            "selectedComicNumber": 5000,
            "lastComicNumber": 2955,
            "lastUpdate": 1700000000000
        }"#;
        let state = SelectionState::from(serde_json::from_str::<WidgetAttributes>(json).unwrap());
        assert_eq!(state.pinned_number, Some(2955));
        assert_eq!(state.known_latest, Some(2955));
    }

    #[test]
    fn test_pin_without_bound_is_kept() {
        let attrs = WidgetAttributes {
            is_current_comic_selected: false,
            selected_comic_number: Some(5000),
            ..WidgetAttributes::default()
        };
        assert_eq!(SelectionState::from(attrs).pinned_number, Some(5000));
    }

    #[test]
    fn test_writes_camel_case_and_skips_absent() {
        let value = serde_json::to_value(WidgetAttributes::default()).unwrap();
        assert_eq!(value, serde_json::json!({"isCurrentComicSelected": true}));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("widget.json");

        let state = SelectionState {
            mode: Mode::Pinned,
            pinned_number: Some(10),
            known_latest: Some(2955),
            last_refreshed_at: DateTime::from_timestamp_millis(1_700_000_000_123),
            loaded_comic: Some(comic()),
        };
        save(&path, &WidgetAttributes::from(&state)).unwrap();

        let loaded = SelectionState::from(load(&path).unwrap());
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let attrs = load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(attrs, WidgetAttributes::default());
    }

    #[test]
    fn test_load_garbage_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widget.json");
        fs::write(&path, "not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
