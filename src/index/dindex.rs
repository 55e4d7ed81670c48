//! A generic, insertion-ordered bijection between domain objects and matrix
//! positions.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// The identity under which an object is indexed. Two objects with equal keys
/// occupy the same position.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;
    fn key(&self) -> Self::Key;
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de> + Keyed"
))]
#[serde(from = "Vec<T>", into = "Vec<T>")]
pub struct Index<T: Keyed> {
    content: Vec<T>,
    positions: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for Index<T> {
    fn default() -> Self {
        Self { content: Vec::new(), positions: HashMap::new() }
    }
}

impl<T: Keyed + Debug> Debug for Index<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.content.iter()).finish()
    }
}

impl<T: Keyed> Index<T> {
    pub fn new() -> Self { Self::default() }

    /// Adds the item if its key is not yet indexed and returns its position.
    /// Repeated calls with an equal item return the original position.
    pub fn put(&mut self, item: T) -> usize {
        let key = item.key();
        if let Some(&pos) = self.positions.get(&key) {
            return pos;
        }
        let pos = self.content.len();
        self.positions.insert(key, pos);
        self.content.push(item);
        pos
    }

    pub fn of(&self, item: &T) -> Option<usize> {
        self.positions.get(&item.key()).copied()
    }

    pub fn of_key(&self, key: &T::Key) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn at(&self, position: usize) -> Option<&T> {
        self.content.get(position)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(&item.key())
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.positions.contains_key(key)
    }

    pub fn content(&self) -> &[T] { &self.content }
    pub fn size(&self) -> usize { self.content.len() }
    pub fn is_empty(&self) -> bool { self.content.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.content.iter().enumerate()
    }
}

impl<T: Keyed> From<Vec<T>> for Index<T> {
    fn from(items: Vec<T>) -> Self {
        let mut index = Index::new();
        for item in items {
            index.put(item);
        }
        index
    }
}

impl<T: Keyed> From<Index<T>> for Vec<T> {
    fn from(index: Index<T>) -> Self {
        index.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Category {
        id: u64,
        name: String,
    }

    impl Keyed for Category {
        type Key = u64;
        fn key(&self) -> u64 { self.id }
    }

    fn category(id: u64) -> Category {
        Category { id, name: format!("category {}", id) }
    }

    #[test]
    fn test_index_positions_follow_insertion_order() {
        let mut index = Index::new();
        assert!(index.is_empty());
        for i in 1..11 {
            index.put(category(i));
        }
        assert_eq!(index.size(), 10);
        for i in 1..11u64 {
            let pos = (i - 1) as usize;
            assert!(index.contains_key(&i));
            assert_eq!(index.of_key(&i), Some(pos));
            let c = index.at(pos).unwrap();
            assert_eq!(c.id, i);
            assert_eq!(index.of(c), Some(pos));
        }
    }

    #[test]
    fn test_absent_entries_are_none() {
        let mut index = Index::new();
        index.put(category(1));
        assert_eq!(index.of(&category(2)), None);
        assert_eq!(index.at(1), None);
    }

    #[test]
    fn test_put_is_idempotent_by_key() {
        let mut index = Index::new();
        let first = index.put(category(5));
        let again = index.put(Category { id: 5, name: "renamed".into() });
        assert_eq!(first, again);
        assert_eq!(index.size(), 1);
        assert_eq!(index.at(0).unwrap().name, "category 5");
    }

    #[test]
    fn test_serde_keeps_order() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Id(u32);
        impl Keyed for Id {
            type Key = u32;
            fn key(&self) -> u32 { self.0 }
        }
        let index: Index<Id> = vec![Id(3), Id(1), Id(2)].into();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, "[3,1,2]");
        let back: Index<Id> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.of_key(&2), Some(2));
    }

    proptest! {
        #[test]
        fn prop_index_is_a_bijection(ids in proptest::collection::vec(0u64..50, 0..100)) {
            let mut index = Index::new();
            for &id in &ids {
                let first = index.put(category(id));
                let second = index.put(category(id));
                prop_assert_eq!(first, second);
            }
            for i in 0..index.size() {
                let item = index.at(i).unwrap().clone();
                prop_assert_eq!(index.of(&item), Some(i));
            }
            let mut unique = ids.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(index.size(), unique.len());
        }
    }
}
