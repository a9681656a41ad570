//! Loading catalog snapshots from persisted storage.
//!
//! Two sources are supported: the scraper's SQLite `games` table, and a
//! gzip-compressed JSON array of entries.

use crate::catalog::{labels_from_value, CatalogEntry, CatalogSnapshot};
use crate::config::ScoutConfig;
use crate::errors::Result;
use flate2::read::GzDecoder;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Create the tables the scraper and the store write to, if absent.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS games (
            appid INTEGER PRIMARY KEY,
            type TEXT,
            name TEXT,
            detailed_description TEXT,
            about_the_game TEXT,
            short_description TEXT,
            header_image TEXT,
            categories TEXT,
            genres TEXT,
            developers TEXT,
            price TEXT,
            release_date TEXT,
            parsed_successfully BOOLEAN DEFAULT 1
        );
        CREATE TABLE IF NOT EXISTS user_recommendations (
            user_id TEXT PRIMARY KEY,
            recommendations TEXT
        );",
    )?;
    Ok(())
}

/// Labels from a JSON column. Objects contribute their `description`,
/// strings themselves; anything unparseable yields no labels.
pub fn parse_labels(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .map(|value| labels_from_value(&value))
        .unwrap_or_default()
}

/// A text column; NULL and non-text storage classes read as absent.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    })
}

/// Successfully parsed rows of `kind`, ordered by appid.
pub fn load_catalog_snapshot(conn: &Connection, kind: &str) -> Result<CatalogSnapshot> {
    let mut stmt = conn.prepare(
        "SELECT appid, type, genres, developers, categories,
                detailed_description, about_the_game, short_description, release_date
         FROM games
         WHERE parsed_successfully = 1 AND type = ?1
         ORDER BY appid",
    )?;

    let rows = stmt
        .query_map([kind], |row| {
            let appid: i64 = row.get(0)?;
            let Ok(id) = u64::try_from(appid) else {
                return Ok(None);
            };
            let genres = text_column(row, 2)?;
            let developers = text_column(row, 3)?;
            let categories = text_column(row, 4)?;
            Ok(Some(CatalogEntry {
                id,
                kind: text_column(row, 1)?.unwrap_or_default(),
                genres: parse_labels(genres.as_deref()),
                developers: parse_labels(developers.as_deref()),
                categories: parse_labels(categories.as_deref()),
                description_long: text_column(row, 5)?.unwrap_or_default(),
                description_about: text_column(row, 6)?.unwrap_or_default(),
                description_short: text_column(row, 7)?.unwrap_or_default(),
                release_date: text_column(row, 8)?,
            }))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total = rows.len();
    let entries: Vec<CatalogEntry> = rows.into_iter().flatten().collect();
    if entries.len() < total {
        warn!(
            skipped = total - entries.len(),
            "skipped catalog rows with a negative appid"
        );
    }

    info!(rows = entries.len(), kind, "loaded catalog from sqlite");
    Ok(CatalogSnapshot::from_entries(entries, kind))
}

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    #[serde(flatten)]
    entry: CatalogEntry,
    #[serde(default = "parsed_default", deserialize_with = "lenient_flag")]
    parsed_successfully: bool,
}

fn parsed_default() -> bool {
    true
}

/// Accepts the flag as SQLite exports it: a bool, a 0/1 integer, or the
/// strings "1"/"true". `null` and anything else read as false.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True" | "TRUE"),
        _ => false,
    })
}

/// Load a `.json.gz` snapshot written by the catalog exporter.
pub fn load_catalog_json_gz<P: AsRef<Path>>(path: P, kind: &str) -> Result<CatalogSnapshot> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(GzDecoder::new(file));
    let records: Vec<SnapshotRecord> = serde_json::from_reader(reader)?;

    let total = records.len();
    let entries: Vec<CatalogEntry> = records
        .into_iter()
        .filter(|r| r.parsed_successfully)
        .map(|r| r.entry)
        .collect();

    info!(
        path = %path.as_ref().display(),
        total,
        parsed = entries.len(),
        "loaded catalog from json snapshot"
    );
    Ok(CatalogSnapshot::from_entries(entries, kind))
}

/// Load the snapshot from whichever source the config names.
pub fn open_catalog(config: &ScoutConfig) -> Result<CatalogSnapshot> {
    match &config.catalog_json {
        Some(path) => load_catalog_json_gz(path, &config.kind),
        None => {
            let conn = Connection::open(&config.database_path)?;
            create_schema(&conn)?;
            load_catalog_snapshot(&conn, &config.kind)
        }
    }
}
