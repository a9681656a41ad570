//! A catalog snapshot paired with the model fit against it, and the
//! swappable handle the service reads through.

use crate::catalog::CatalogSnapshot;
use crate::errors::{Result, ScoutError};
use crate::features::composite_features;
use crate::recommend::{rank_as_of, today, Ranking, Window};
use crate::similarity::SimilarityModel;
use crate::store::RecommendationStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Snapshot and model are built and replaced together; row indices of the
/// model only mean something against this snapshot.
#[derive(Debug)]
pub struct Engine {
    snapshot: Arc<CatalogSnapshot>,
    model: Arc<SimilarityModel>,
    built_at: DateTime<Utc>,
}

impl Engine {
    /// Fit a model over `snapshot`. Blocks for the full fit.
    pub fn build(snapshot: CatalogSnapshot) -> Result<Self> {
        let features = composite_features(snapshot.entries());
        let model = SimilarityModel::fit(&features)?;
        Ok(Self {
            snapshot: Arc::new(snapshot),
            model: Arc::new(model),
            built_at: Utc::now(),
        })
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn model(&self) -> &SimilarityModel {
        &self.model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Rank against today's local date.
    pub fn rank(&self, owned_ids: &HashSet<u64>, window: Window) -> Ranking {
        rank_as_of(owned_ids, &self.model, &self.snapshot, window, &today())
    }
}

/// Shared slot for the live engine. Readers clone the `Arc` and keep using
/// it even if a refit installs a replacement meanwhile.
#[derive(Debug, Default)]
pub struct EngineHandle {
    current: RwLock<Option<Arc<Engine>>>,
}

impl EngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Result<Arc<Engine>> {
        self.current.read().clone().ok_or(ScoutError::NotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn install(&self, engine: Engine) -> Arc<Engine> {
        let engine = Arc::new(engine);
        info!(
            rows = engine.snapshot.len(),
            vocabulary = engine.model.vocabulary_size(),
            "installing recommendation engine"
        );
        *self.current.write() = Some(Arc::clone(&engine));
        engine
    }
}

/// Result of regenerating one user's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regenerated {
    /// First page of the stored list.
    pub page: Vec<u64>,
    /// Length of the stored list.
    pub total: usize,
    /// Owned ids that were not in the catalog snapshot.
    pub unmatched_owned: usize,
}

/// Rank `list_len` ids for the user, replace their stored list, and return
/// the first `page_size` of them.
pub fn regenerate_for_user(
    engine: &Engine,
    store: &dyn RecommendationStore,
    user_id: &str,
    owned_ids: &HashSet<u64>,
    list_len: usize,
    page_size: usize,
) -> Result<Regenerated> {
    let Ranking {
        ids,
        dropped_owned: unmatched_owned,
    } = engine.rank(owned_ids, Window::new(0, list_len));
    store.put(user_id, &ids)?;

    info!(
        user_id,
        owned = owned_ids.len(),
        unmatched_owned,
        total = ids.len(),
        "regenerated recommendations"
    );

    Ok(Regenerated {
        page: Window::new(0, page_size).slice(ids.as_slice()).to_vec(),
        total: ids.len(),
        unmatched_owned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::store::MemoryRecommendationStore;

    fn game(id: u64, genre: &str) -> CatalogEntry {
        CatalogEntry {
            genres: vec![genre.to_string()],
            release_date: Some("2010-01-01".to_string()),
            ..CatalogEntry::new(id)
        }
    }

    #[test]
    fn test_regenerate_stores_full_list_and_counts_unmatched() {
        let snapshot = CatalogSnapshot::from_entries(
            vec![game(1, "RPG"), game(2, "RPG"), game(3, "Puzzle"), game(4, "Racing")],
            "game",
        );
        let engine = Engine::build(snapshot).unwrap();
        let store = MemoryRecommendationStore::new();
        let owned: HashSet<u64> = [1, 77, 88].into_iter().collect();

        let regenerated = regenerate_for_user(&engine, &store, "u1", &owned, 10, 2).unwrap();

        assert_eq!(regenerated.unmatched_owned, 2);
        assert_eq!(regenerated.total, 3);
        assert_eq!(regenerated.page, vec![2, 3]);
        assert_eq!(store.get("u1", 100, 0).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn test_handle_not_ready_until_install() {
        let handle = EngineHandle::new();
        assert!(matches!(handle.current(), Err(ScoutError::NotReady)));

        let engine = Engine::build(CatalogSnapshot::from_entries(vec![game(1, "RPG")], "game"))
            .unwrap();
        handle.install(engine);
        assert!(handle.is_ready());
    }
}
