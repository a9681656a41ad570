//! Service configuration with environment overrides.
//!
//! Every value has a default; `SCOUT_*` variables (optionally from a `.env`
//! file loaded by the binary) override them.

use crate::catalog::DEFAULT_KIND;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub host: String,
    pub port: u16,
    /// SQLite database holding the `games` and `user_recommendations` tables.
    pub database_path: PathBuf,
    /// Optional gzip JSON snapshot used instead of the database catalog.
    pub catalog_json: Option<PathBuf>,
    /// Recommendable entry kind.
    pub kind: String,
    /// Length of the list generated and stored per user.
    pub list_len: usize,
    /// Ids returned per page.
    pub page_size: usize,
    /// Hours between background refits; 0 disables the loop.
    pub refit_hours: u64,
    /// Allowed CORS origins (empty = any).
    pub cors_origins: Vec<String>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: PathBuf::from("steam_games.db"),
            catalog_json: None,
            kind: DEFAULT_KIND.to_string(),
            list_len: 100,
            page_size: 10,
            refit_hours: 24,
            cors_origins: Vec::new(),
        }
    }
}

impl ScoutConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("SCOUT_HOST") {
            config.host = host;
        }
        parse_var("SCOUT_PORT", &mut config.port);
        if let Ok(path) = env::var("SCOUT_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        config.catalog_json = env::var("SCOUT_CATALOG_JSON")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        if let Ok(kind) = env::var("SCOUT_KIND") {
            config.kind = kind;
        }
        parse_var("SCOUT_LIST_LEN", &mut config.list_len);
        parse_var("SCOUT_PAGE_SIZE", &mut config.page_size);
        parse_var("SCOUT_REFIT_HOURS", &mut config.refit_hours);
        if config.refit_hours.checked_mul(3600).is_none() {
            warn!(
                refit_hours = config.refit_hours,
                "SCOUT_REFIT_HOURS overflows a duration in seconds, clamping"
            );
        }
        if let Ok(origins) = env::var("SCOUT_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// Interval of the background refit loop, `None` when it is disabled.
    /// Saturates instead of overflowing for absurd hour counts.
    pub fn refit_period(&self) -> Option<Duration> {
        (self.refit_hours > 0).then(|| Duration::from_secs(self.refit_hours.saturating_mul(3600)))
    }
}

fn parse_var<T: FromStr>(name: &str, slot: &mut T) {
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!("{} has invalid value '{}', keeping default", name, raw),
        }
    }
}
