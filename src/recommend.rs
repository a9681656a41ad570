//! Ranking of unseen catalog entries for a set of owned ids.

use crate::catalog::CatalogSnapshot;
use crate::similarity::SimilarityModel;
use std::collections::HashSet;
use tracing::{debug, error};

/// Offset/count window over the ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub count: usize,
}

impl Window {
    pub fn new(offset: usize, count: usize) -> Self {
        Self { offset, count }
    }

    /// The `[offset, offset + count)` part of `items`, clamped to its end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = self.offset.saturating_add(self.count).min(items.len());
        &items[start..end]
    }
}

/// Owned ids resolved against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRows {
    pub rows: Vec<usize>,
    /// Owned ids with no row in the snapshot.
    pub dropped: usize,
}

pub fn resolve_owned(owned_ids: &HashSet<u64>, snapshot: &CatalogSnapshot) -> OwnedRows {
    let mut resolved = OwnedRows::default();
    for &id in owned_ids {
        match snapshot.row_of(id) {
            Some(row) => resolved.rows.push(row),
            None => resolved.dropped += 1,
        }
    }
    // HashSet order is arbitrary; sum in row order so scores are reproducible
    resolved.rows.sort_unstable();
    resolved
}

/// Ranked ids plus how many owned ids had no catalog row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    pub ids: Vec<u64>,
    pub dropped_owned: usize,
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Rank entries against today's local date.
pub fn recommend(
    owned_ids: &HashSet<u64>,
    model: &SimilarityModel,
    snapshot: &CatalogSnapshot,
    window: Window,
) -> Vec<u64> {
    recommend_as_of(owned_ids, model, snapshot, window, &today())
}

pub fn recommend_as_of(
    owned_ids: &HashSet<u64>,
    model: &SimilarityModel,
    snapshot: &CatalogSnapshot,
    window: Window,
    today: &str,
) -> Vec<u64> {
    rank_as_of(owned_ids, model, snapshot, window, today).ids
}

/// Rank entries by summed similarity to the owned rows.
///
/// Owned entries are excluded, as is every entry whose release date string
/// does not sort at or before `today`. The comparison is on raw strings: an
/// empty date is kept, a missing date is dropped, and a non-ISO date such as
/// "21 Aug, 2012" is dropped. Equal scores keep snapshot row order.
pub fn rank_as_of(
    owned_ids: &HashSet<u64>,
    model: &SimilarityModel,
    snapshot: &CatalogSnapshot,
    window: Window,
    today: &str,
) -> Ranking {
    if model.len() != snapshot.len() {
        error!(
            model_rows = model.len(),
            snapshot_rows = snapshot.len(),
            "similarity model was fit against a different snapshot"
        );
        return Ranking::default();
    }

    let owned = resolve_owned(owned_ids, snapshot);
    if owned.dropped > 0 {
        debug!(
            dropped = owned.dropped,
            matched = owned.rows.len(),
            "owned ids missing from catalog snapshot"
        );
    }

    let mut scores = vec![0.0f32; snapshot.len()];
    for &row in &owned.rows {
        for (score, sim) in scores.iter_mut().zip(model.row(row)) {
            *score += sim;
        }
    }

    let mut candidates: Vec<(usize, f32)> = snapshot
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| !owned_ids.contains(&entry.id))
        .filter(|(_, entry)| entry.is_released_by(today))
        .map(|(row, _)| (row, scores[row]))
        .collect();

    // sort_by is stable: ties stay in row order
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    let ids = window
        .slice(candidates.as_slice())
        .iter()
        .filter_map(|&(row, _)| snapshot.entry(row).map(|e| e.id))
        .collect();

    Ranking {
        ids,
        dropped_owned: owned.dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamps() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(Window::new(1, 2).slice(&items), &[2, 3]);
        assert_eq!(Window::new(3, 10).slice(&items), &[4, 5]);
        assert!(Window::new(9, 2).slice(&items).is_empty());
        assert_eq!(Window::new(2, usize::MAX).slice(&items), &[3, 4, 5]);
    }
}
