//! Static item/group catalog
//!
//! Loaded once at startup and shared read-only by extraction, hydration and
//! search.

mod load;
mod search;
mod types;

pub use search::{SearchResult, MIN_SEARCH_LEN, SEARCH_RESULT_LIMIT};
pub use types::*;

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read SDE database: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("catalog contains no items")]
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<TypeId, CatalogItem>,
    groups: HashMap<TypeId, CatalogGroup>,
}

impl Catalog {
    pub fn new(
        items: impl IntoIterator<Item = CatalogItem>,
        groups: impl IntoIterator<Item = CatalogGroup>,
    ) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            groups: groups.into_iter().map(|group| (group.id, group)).collect(),
        }
    }

    pub fn item(&self, id: TypeId) -> Option<&CatalogItem> {
        self.items.get(&id)
    }

    pub fn group(&self, id: TypeId) -> Option<&CatalogGroup> {
        self.groups.get(&id)
    }

    /// Group owning the given item, if both are known
    pub fn item_group(&self, id: TypeId) -> Option<&CatalogGroup> {
        self.item(id).and_then(|item| self.group(item.group_id))
    }

    /// Display name of an item, empty when unknown
    pub fn name(&self, id: TypeId) -> &str {
        self.item(id).map(|item| item.name.as_str()).unwrap_or_default()
    }

    pub fn is_charge(&self, id: TypeId) -> bool {
        self.item_group(id).is_some_and(CatalogGroup::is_charge)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &CatalogGroup> {
        self.groups.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(
            [
                CatalogItem::new(587, "Rifter", 25),
                CatalogItem::new(179, "Fusion S", 83),
                CatalogItem::new(999, "Orphan", 4040),
            ],
            [
                CatalogGroup::new(25, "Frigate", Category::Ship),
                CatalogGroup::new(83, "Projectile Ammo", Category::Charge),
            ],
        )
    }

    #[test]
    fn test_lookups() {
        let catalog = catalog();
        assert_eq!(catalog.name(587), "Rifter");
        assert_eq!(catalog.name(1), "");
        assert_eq!(catalog.item_group(587).map(|g| g.id), Some(25));
        assert!(catalog.item_group(999).is_none());
        assert!(catalog.is_charge(179));
        assert!(!catalog.is_charge(587));
        assert!(!catalog.is_charge(999));
        assert_eq!(catalog.item_count(), 3);
        assert_eq!(catalog.group_count(), 2);
    }
}
