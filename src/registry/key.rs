use std::fmt;

use super::RegistryError;
use crate::catalog::TypeId;

/// Canonical form of an item filter: distinct ids in ascending order,
/// serialized as a compact JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    encoded: String,
}

impl QueryKey {
    pub fn new(items: impl IntoIterator<Item = TypeId>) -> Result<Self, RegistryError> {
        let mut items: Vec<TypeId> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        let encoded = serde_json::to_string(&items)?;
        Ok(Self { encoded })
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_encoding() {
        let key = QueryKey::new([2873, 587, 179, 587]).unwrap();
        assert_eq!(key.as_str(), "[179,587,2873]");
    }

    #[test]
    fn test_order_and_duplicates_ignored() {
        let a = QueryKey::new([3, 1, 2]).unwrap();
        let b = QueryKey::new([1, 2, 3, 3, 1]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, QueryKey::new([1, 2]).unwrap());
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(QueryKey::new([]).unwrap().to_string(), "[]");
    }
}
