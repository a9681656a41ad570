//! In-memory catalog snapshot.
//!
//! A snapshot is the ordered table of recommendable entries that a
//! similarity model is fit against. Row order is fixed at construction and
//! is the index space of the model's matrix.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Kind of entry that takes part in recommendations.
pub const DEFAULT_KIND: &str = "game";

/// One catalog item. Display fields (name, images, price) are owned by the
/// presentation layer and are not carried here.
///
/// Deserialization is lenient per field: `null` or a value of the wrong shape
/// becomes an empty string, an empty label list, or no release date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    #[serde(alias = "appid")]
    pub id: u64,
    #[serde(alias = "type", deserialize_with = "lenient_text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_labels")]
    pub genres: Vec<String>,
    #[serde(deserialize_with = "lenient_labels")]
    pub developers: Vec<String>,
    #[serde(deserialize_with = "lenient_labels")]
    pub categories: Vec<String>,
    #[serde(alias = "detailed_description", deserialize_with = "lenient_text")]
    pub description_long: String,
    #[serde(alias = "about_the_game", deserialize_with = "lenient_text")]
    pub description_about: String,
    #[serde(alias = "short_description", deserialize_with = "lenient_text")]
    pub description_short: String,
    #[serde(deserialize_with = "lenient_date")]
    pub release_date: Option<String>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(labels_from_value(&Value::deserialize(deserializer)?))
}

/// Labels of a JSON array: strings as-is, objects by their `description`.
/// Anything else yields no labels.
pub fn labels_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl CatalogEntry {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            kind: DEFAULT_KIND.to_string(),
            ..Default::default()
        }
    }

    /// Whether the release date string sorts at or before `today`. A missing
    /// date never qualifies; an empty one always does.
    pub fn is_released_by(&self, today: &str) -> bool {
        self.release_date.as_deref().is_some_and(|date| date <= today)
    }
}

/// Immutable view over all recommendable entries.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
    rows: HashMap<u64, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot from entries in storage order, keeping only `kind`.
    pub fn from_entries<I>(entries: I, kind: &str) -> Self
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut kept = Vec::new();
        let mut rows = HashMap::new();
        let mut skipped_kind = 0usize;

        for entry in entries {
            if entry.kind != kind {
                skipped_kind += 1;
                continue;
            }
            if rows.contains_key(&entry.id) {
                warn!(id = entry.id, "duplicate catalog id, keeping first row");
                continue;
            }
            rows.insert(entry.id, kept.len());
            kept.push(entry);
        }

        debug!(
            rows = kept.len(),
            skipped_kind, kind, "catalog snapshot assembled"
        );

        Self {
            entries: kept,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, row: usize) -> Option<&CatalogEntry> {
        self.entries.get(row)
    }

    /// Row index of `id`, if the id is part of this snapshot.
    pub fn row_of(&self, id: u64) -> Option<usize> {
        self.rows.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, kind: &str) -> CatalogEntry {
        CatalogEntry {
            kind: kind.to_string(),
            ..CatalogEntry::new(id)
        }
    }

    #[test]
    fn test_filters_kind_and_keeps_order() {
        let snapshot = CatalogSnapshot::from_entries(
            vec![entry(30, "game"), entry(10, "dlc"), entry(20, "game")],
            DEFAULT_KIND,
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.row_of(30), Some(0));
        assert_eq!(snapshot.row_of(20), Some(1));
        assert_eq!(snapshot.row_of(10), None);
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let mut second = entry(7, "game");
        second.description_short = "later".to_string();
        let snapshot =
            CatalogSnapshot::from_entries(vec![entry(7, "game"), second], DEFAULT_KIND);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entry(0).map(|e| e.description_short.as_str()), Some(""));
    }

    #[test]
    fn test_release_date_is_compared_as_string() {
        let dated = |date: Option<&str>| CatalogEntry {
            release_date: date.map(str::to_string),
            ..CatalogEntry::new(1)
        };

        assert!(!dated(None).is_released_by("2026-10-18"));
        assert!(dated(Some("")).is_released_by("2026-10-18"));
        assert!(dated(Some("2026-10-18")).is_released_by("2026-10-18"));
        assert!(!dated(Some("2026-10-19")).is_released_by("2026-10-18"));
        assert!(!dated(Some("21 Aug, 2012")).is_released_by("2026-10-18"));
    }

    #[test]
    fn test_null_and_mistyped_fields_normalize() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{"appid": 3, "type": "game", "short_description": null,
                "about_the_game": 17, "genres": null,
                "developers": ["Valve", null],
                "categories": [{"id": 2, "description": "Single-player"}],
                "release_date": null}"#,
        )
        .unwrap();

        assert_eq!(entry.id, 3);
        assert_eq!(entry.description_short, "");
        assert_eq!(entry.description_about, "");
        assert!(entry.genres.is_empty());
        assert_eq!(entry.developers, vec!["Valve"]);
        assert_eq!(entry.categories, vec!["Single-player"]);
        assert_eq!(entry.release_date, None);
    }
}
