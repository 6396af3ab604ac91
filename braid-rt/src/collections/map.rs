//! Persistent maps, ordered or not, and their builders.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexMap;
use itertools::Itertools;

use super::{CollectionConversions, CollectionKind};
use crate::Conversions;

type OrderedMap<K, V> = IndexMap<K, V, FxBuildHasher>;

#[derive(Clone)]
enum MapRepr<K, V> {
    Hashed(FxHashMap<K, V>),
    Ordered(OrderedMap<K, V>),
}

impl<K, V> MapRepr<K, V> {
    fn new(ordered: bool) -> Self {
        if ordered {
            Self::Ordered(OrderedMap::default())
        } else {
            Self::Hashed(FxHashMap::default())
        }
    }

    fn is_ordered(&self) -> bool {
        matches!(self, Self::Ordered(_))
    }

    fn len(&self) -> usize {
        match self {
            Self::Hashed(map) => map.len(),
            Self::Ordered(map) => map.len(),
        }
    }

    fn iter(&self) -> Iter<'_, K, V> {
        match self {
            Self::Hashed(map) => Iter::Hashed(map.iter()),
            Self::Ordered(map) => Iter::Ordered(map.iter()),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Hashed(map) => map.clear(),
            Self::Ordered(map) => map.clear(),
        }
    }
}

impl<K: Hash + Eq, V> MapRepr<K, V> {
    fn get(&self, key: &K) -> Option<&V> {
        match self {
            Self::Hashed(map) => map.get(key),
            Self::Ordered(map) => map.get(key),
        }
    }

    /// Insert, keeping the position of an existing key in ordered maps.
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self {
            Self::Hashed(map) => map.insert(key, value),
            Self::Ordered(map) => map.insert(key, value),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            Self::Hashed(map) => map.remove(key),
            // Keep the relative order of the remaining entries.
            Self::Ordered(map) => map.shift_remove(key),
        }
    }
}

/// Iterator over the entries of a [`PersistentMap`] or [`MapBuilder`].
pub enum Iter<'a, K, V> {
    #[doc(hidden)]
    Hashed(std::collections::hash_map::Iter<'a, K, V>),
    #[doc(hidden)]
    Ordered(indexmap::map::Iter<'a, K, V>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Hashed(iter) => iter.next(),
            Self::Ordered(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Hashed(iter) => iter.size_hint(),
            Self::Ordered(iter) => iter.size_hint(),
        }
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An immutable, cheaply cloned map.
///
/// An ordered map iterates in first-insertion order of its keys; an
/// unordered one in an unspecified but stable order. Equality and hashing
/// ignore order.
pub struct PersistentMap<K, V> {
    repr: Arc<MapRepr<K, V>>,
}

impl<K, V> PersistentMap<K, V> {
    /// The empty unordered map.
    pub fn new() -> Self {
        Self::with_ordering(false)
    }

    /// The empty ordered map.
    pub fn new_ordered() -> Self {
        Self::with_ordering(true)
    }

    fn with_ordering(ordered: bool) -> Self {
        Self {
            repr: Arc::new(MapRepr::new(ordered)),
        }
    }

    /// Whether the map keeps insertion order.
    pub fn is_ordered(&self) -> bool {
        self.repr.is_ordered()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.repr.iter()
    }

    /// Iterate over the keys.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Iterate over the values.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Whether `self` and `other` share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr)
    }
}

impl<K: Hash + Eq, V> PersistentMap<K, V> {
    /// An ordered map of `entries`. A repeated key keeps its first position
    /// and its last value.
    pub fn ordered(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            repr: Arc::new(MapRepr::Ordered(entries.into_iter().collect())),
        }
    }

    /// The value associated with `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.repr.get(key)
    }

    /// Whether the map has an entry for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            repr: Arc::clone(&self.repr),
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for PersistentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len()
                && self
                    .iter()
                    .all(|(key, value)| other.get(key) == Some(value)))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for PersistentMap<K, V> {}

impl<K: Hash, V: Hash> Hash for PersistentMap<K, V> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let combined = self
            .iter()
            .fold(0u64, |acc, entry| acc.wrapping_add(fxhash::hash64(&entry)));
        self.len().hash(state);
        combined.hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .iter()
            .format_with(", ", |(key, value), f| f(&format_args!("{key}: {value}")));
        write!(f, "{{{entries}}}")
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for PersistentMap<K, V> {
    /// Collect into an unordered map; the last value of a repeated key wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            repr: Arc::new(MapRepr::Hashed(iter.into_iter().collect())),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The transient form of a [`PersistentMap`].
///
/// Shares storage with the map it was created from until the first write.
pub struct MapBuilder<K, V> {
    repr: Arc<MapRepr<K, V>>,
}

impl<K: Clone + Hash + Eq, V: Clone> MapBuilder<K, V> {
    /// An empty builder.
    pub fn new(ordered: bool) -> Self {
        Self {
            repr: Arc::new(MapRepr::new(ordered)),
        }
    }

    /// A builder starting from `map`, switching to the requested ordering if
    /// needed.
    pub fn from_map(map: &PersistentMap<K, V>, ordered: bool) -> Self {
        let repr = if map.is_ordered() == ordered {
            Arc::clone(&map.repr)
        } else {
            let entries = map.iter().map(|(k, v)| (k.clone(), v.clone()));
            if ordered {
                Arc::new(MapRepr::Ordered(entries.collect()))
            } else {
                Arc::new(MapRepr::Hashed(entries.collect()))
            }
        };
        Self { repr }
    }

    /// Associate `value` with `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        Arc::make_mut(&mut self.repr).insert(key, value)
    }

    /// Remove the entry for `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if self.repr.get(key).is_none() {
            return None;
        }
        Arc::make_mut(&mut self.repr).remove(key)
    }

    /// The value associated with `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.repr.get(key)
    }

    /// Remove every entry, keeping the ordering flag.
    pub fn clear(&mut self) {
        match Arc::get_mut(&mut self.repr) {
            Some(repr) => repr.clear(),
            None => self.repr = Arc::new(MapRepr::new(self.repr.is_ordered())),
        }
    }

    /// A snapshot of the current entries.
    pub fn freeze(&self) -> PersistentMap<K, V> {
        PersistentMap {
            repr: Arc::clone(&self.repr),
        }
    }
}

impl<K, V> MapBuilder<K, V> {
    /// Whether the builder keeps insertion order.
    pub fn is_ordered(&self) -> bool {
        self.repr.is_ordered()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Whether the builder has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.repr.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Extend<(K, V)> for MapBuilder<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let mut iter = iter.into_iter().peekable();
        if iter.peek().is_none() {
            return;
        }
        let repr = Arc::make_mut(&mut self.repr);
        for (key, value) in iter {
            repr.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapBuilder")
            .field("ordered", &self.is_ordered())
            .field("entries", &self.iter().collect_vec())
            .finish()
    }
}

/// [`Conversions`] between [`PersistentMap`] and [`MapBuilder`].
pub struct MapConversions<K, V> {
    ordered: bool,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V> MapConversions<K, V> {
    /// Create the strategy.
    pub const fn new(ordered: bool) -> Self {
        Self {
            ordered,
            _entries: PhantomData,
        }
    }

    /// Strategy for maps with no guaranteed order.
    pub const fn unordered() -> Self {
        Self::new(false)
    }

    /// Strategy for insertion-ordered maps.
    pub const fn ordered() -> Self {
        Self::new(true)
    }

    /// Whether produced maps keep insertion order.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

impl<K, V> fmt::Debug for MapConversions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConversions")
            .field("ordered", &self.ordered)
            .finish()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Conversions for MapConversions<K, V> {
    type Persistent = PersistentMap<K, V>;
    type Transient = MapBuilder<K, V>;
    type Error = Infallible;

    fn empty(&self) -> Result<MapBuilder<K, V>, Infallible> {
        Ok(MapBuilder::new(self.ordered))
    }

    fn from_persistent(&self, value: &PersistentMap<K, V>) -> Result<MapBuilder<K, V>, Infallible> {
        Ok(MapBuilder::from_map(value, self.ordered))
    }

    fn freeze(&self, builder: &mut MapBuilder<K, V>) -> Result<PersistentMap<K, V>, Infallible> {
        Ok(builder.freeze())
    }

    fn clear(&self, builder: &mut MapBuilder<K, V>) {
        builder.clear();
    }
}

impl<K: Clone + Hash + Eq, V: Clone> CollectionConversions for MapConversions<K, V> {
    type Item = (K, V);

    fn kind(&self) -> CollectionKind {
        if self.ordered {
            CollectionKind::OrderedMap
        } else {
            CollectionKind::Map
        }
    }

    fn empty_value(&self) -> PersistentMap<K, V> {
        PersistentMap::with_ordering(self.ordered)
    }

    fn insert(&self, builder: &mut MapBuilder<K, V>, (key, value): (K, V)) {
        builder.insert(key, value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordered_insert_keeps_first_position() {
        let mut builder = MapBuilder::new(true);
        builder.extend([("b", 1), ("a", 2), ("b", 3)]);
        let map = builder.freeze();
        assert_eq!(map.iter().collect_vec(), [(&"b", &3), (&"a", &2)]);
    }

    #[test]
    fn write_after_freeze_copies() {
        let mut builder = MapBuilder::new(false);
        builder.insert(1, "one");
        let frozen = builder.freeze();
        builder.insert(2, "two");
        assert_eq!(frozen.len(), 1);
        assert_eq!(builder.len(), 2);
        assert!(!builder.freeze().ptr_eq(&frozen));
    }

    #[test]
    fn remove_missing_key_does_not_copy() {
        let map = PersistentMap::ordered([(1, 'a')]);
        let mut builder = MapBuilder::from_map(&map, true);
        assert_eq!(builder.remove(&2), None);
        assert!(builder.freeze().ptr_eq(&map));
        assert_eq!(builder.remove(&1), Some('a'));
        assert!(builder.is_empty());
        assert_eq!(map.get(&1), Some(&'a'));
    }

    #[test]
    fn equality_ignores_order() {
        let ordered = PersistentMap::ordered([("a", 1), ("b", 2)]);
        let hashed: PersistentMap<_, _> = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(ordered, hashed);
        assert_ne!(ordered, PersistentMap::ordered([("a", 1), ("b", 3)]));
    }

    #[test]
    fn display_ordered() {
        let map = PersistentMap::ordered([("a", 1), ("b", 2)]);
        assert_eq!(map.to_string(), "{a: 1, b: 2}");
    }
}
