//! Composite text feature per catalog entry.

use crate::catalog::CatalogEntry;

/// Space-joined genres, developers, categories and the three descriptions,
/// in that order. Empty fields contribute empty segments.
pub fn composite_feature(entry: &CatalogEntry) -> String {
    [
        entry.genres.join(" "),
        entry.developers.join(" "),
        entry.categories.join(" "),
        entry.description_long.clone(),
        entry.description_about.clone(),
        entry.description_short.clone(),
    ]
    .join(" ")
}

/// Features for every entry, in row order.
pub fn composite_features(entries: &[CatalogEntry]) -> Vec<String> {
    entries.iter().map(composite_feature).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order() {
        let entry = CatalogEntry {
            genres: vec!["RPG".into(), "Action".into()],
            developers: vec!["Studio".into()],
            categories: vec!["Single-player".into()],
            description_long: "long".into(),
            description_about: "about".into(),
            description_short: "short".into(),
            ..CatalogEntry::new(1)
        };

        assert_eq!(
            composite_feature(&entry),
            "RPG Action Studio Single-player long about short"
        );
    }

    #[test]
    fn test_empty_entry_is_not_absent() {
        let feature = composite_feature(&CatalogEntry::new(1));
        assert!(feature.trim().is_empty());
    }
}
