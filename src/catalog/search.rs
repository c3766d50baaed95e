use serde::Serialize;

use super::{Catalog, Category, TypeId};

/// Terms shorter than this return nothing
pub const MIN_SEARCH_LEN: usize = 3;

/// Item matching stops once more than this many results were collected
pub const SEARCH_RESULT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub id: TypeId,
}

fn search_kind(category: Category) -> Option<&'static str> {
    match category {
        Category::Ship => Some("ship"),
        Category::Module | Category::Charge | Category::Subsystem => Some("item"),
        Category::Other(_) => None,
    }
}

/// Matches if the name contains the whole term or every word of it
struct Matcher<'a> {
    term: &'a str,
    words: Vec<&'a str>,
}

impl<'a> Matcher<'a> {
    fn new(term: &'a str) -> Self {
        Self {
            term,
            words: term.split_whitespace().collect(),
        }
    }

    fn matches(&self, lower: &str) -> bool {
        lower.contains(self.term) || self.words.iter().all(|w| lower.contains(w))
    }
}

impl Catalog {
    /// Substring search over group and item names.
    ///
    /// Groups come first, then items typed by their group's category. Items
    /// outside the ship/module/charge/subsystem categories are never returned.
    pub fn search(&self, term: &str) -> Vec<SearchResult> {
        let term = term.trim().to_lowercase();
        if term.len() < MIN_SEARCH_LEN {
            return Vec::new();
        }
        let matcher = Matcher::new(&term);

        let mut groups: Vec<_> = self.groups().filter(|g| matcher.matches(&g.lower)).collect();
        groups.sort_by_key(|g| g.id);
        let mut results: Vec<SearchResult> = groups
            .into_iter()
            .map(|g| SearchResult {
                kind: "group",
                name: g.name.clone(),
                id: g.id,
            })
            .collect();

        let mut items: Vec<_> = self.items().filter(|i| matcher.matches(&i.lower)).collect();
        items.sort_by_key(|i| i.id);
        for item in items {
            let kind = self
                .group(item.group_id)
                .and_then(|g| search_kind(g.category));
            if let Some(kind) = kind {
                results.push(SearchResult {
                    kind,
                    name: item.name.clone(),
                    id: item.id,
                });
            }
            if results.len() > SEARCH_RESULT_LIMIT {
                break;
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogGroup, CatalogItem};

    fn catalog() -> Catalog {
        Catalog::new(
            [
                CatalogItem::new(587, "Rifter", 25),
                CatalogItem::new(2873, "200mm AutoCannon II", 55),
                CatalogItem::new(179, "Fusion S", 83),
                CatalogItem::new(34, "Tritanium", 18),
            ],
            [
                CatalogGroup::new(25, "Frigate", Category::Ship),
                CatalogGroup::new(55, "Projectile Weapon", Category::Module),
                CatalogGroup::new(83, "Projectile Ammo", Category::Charge),
                CatalogGroup::new(18, "Mineral", Category::Other(4)),
            ],
        )
    }

    #[test]
    fn test_short_term_returns_nothing() {
        assert!(catalog().search("  ri ").is_empty());
    }

    #[test]
    fn test_groups_then_items() {
        let results = catalog().search("Projectile");
        let kinds: Vec<_> = results.iter().map(|r| (r.kind, r.id)).collect();
        assert_eq!(kinds, vec![("group", 55), ("group", 83)]);

        let results = catalog().search("rifter");
        assert_eq!(
            results,
            vec![SearchResult {
                kind: "ship",
                name: "Rifter".to_string(),
                id: 587
            }]
        );
    }

    #[test]
    fn test_all_words_match() {
        let results = catalog().search("cannon 200mm");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 2873);
        assert_eq!(results[0].kind, "item");
    }

    #[test]
    fn test_other_categories_excluded() {
        assert!(catalog().search("tritanium").is_empty());
    }

    #[test]
    fn test_result_limit() {
        let items = (1..=100).map(|i| CatalogItem::new(i, format!("Widget {}", i), 1));
        let catalog = Catalog::new(items, [CatalogGroup::new(1, "Gadgets", Category::Module)]);
        assert_eq!(catalog.search("widget").len(), SEARCH_RESULT_LIMIT + 1);
    }
}
