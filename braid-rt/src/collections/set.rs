//! Persistent sets, ordered or not, and their builders.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use fxhash::{FxBuildHasher, FxHashSet};
use indexmap::IndexSet;
use itertools::Itertools;

use super::{CollectionConversions, CollectionKind, ElementConversions};
use crate::Conversions;

type OrderedSet<E> = IndexSet<E, FxBuildHasher>;

/// Backing storage of a set. The variant is the set's ordering flag.
#[derive(Clone)]
enum SetRepr<E> {
    Hashed(FxHashSet<E>),
    Ordered(OrderedSet<E>),
}

impl<E> SetRepr<E> {
    fn new(ordered: bool) -> Self {
        if ordered {
            Self::Ordered(OrderedSet::default())
        } else {
            Self::Hashed(FxHashSet::default())
        }
    }

    fn is_ordered(&self) -> bool {
        matches!(self, Self::Ordered(_))
    }

    fn len(&self) -> usize {
        match self {
            Self::Hashed(set) => set.len(),
            Self::Ordered(set) => set.len(),
        }
    }

    fn iter(&self) -> Iter<'_, E> {
        match self {
            Self::Hashed(set) => Iter::Hashed(set.iter()),
            Self::Ordered(set) => Iter::Ordered(set.iter()),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Hashed(set) => set.clear(),
            Self::Ordered(set) => set.clear(),
        }
    }
}

impl<E: Hash + Eq> SetRepr<E> {
    fn contains(&self, value: &E) -> bool {
        match self {
            Self::Hashed(set) => set.contains(value),
            Self::Ordered(set) => set.contains(value),
        }
    }

    /// Insert `value`, keeping the position of an equal element already
    /// present.
    fn insert(&mut self, value: E) -> bool {
        match self {
            Self::Hashed(set) => set.insert(value),
            Self::Ordered(set) => set.insert(value),
        }
    }
}

impl<E: Hash + Eq> FromIterator<E> for SetRepr<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::Hashed(iter.into_iter().collect())
    }
}

/// Iterator over the elements of a [`PersistentSet`] or [`SetBuilder`].
pub enum Iter<'a, E> {
    #[doc(hidden)]
    Hashed(std::collections::hash_set::Iter<'a, E>),
    #[doc(hidden)]
    Ordered(indexmap::set::Iter<'a, E>),
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
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

impl<E> ExactSizeIterator for Iter<'_, E> {}

/// An immutable, cheaply cloned set.
///
/// An ordered set iterates in insertion order; an unordered one in an
/// unspecified but stable order. Equality and hashing ignore order.
pub struct PersistentSet<E> {
    repr: Arc<SetRepr<E>>,
}

impl<E> PersistentSet<E> {
    /// The empty unordered set.
    pub fn new() -> Self {
        Self::with_ordering(false)
    }

    /// The empty ordered set.
    pub fn new_ordered() -> Self {
        Self::with_ordering(true)
    }

    fn with_ordering(ordered: bool) -> Self {
        Self {
            repr: Arc::new(SetRepr::new(ordered)),
        }
    }

    /// Whether the set keeps insertion order.
    pub fn is_ordered(&self) -> bool {
        self.repr.is_ordered()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Whether the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> Iter<'_, E> {
        self.repr.iter()
    }

    /// Whether `self` and `other` share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr)
    }
}

impl<E: Hash + Eq> PersistentSet<E> {
    /// An ordered set of `values`, in first-occurrence order.
    pub fn ordered(values: impl IntoIterator<Item = E>) -> Self {
        Self {
            repr: Arc::new(SetRepr::Ordered(values.into_iter().collect())),
        }
    }

    /// Whether the set contains `value`.
    pub fn contains(&self, value: &E) -> bool {
        self.repr.contains(value)
    }
}

impl<E> Clone for PersistentSet<E> {
    fn clone(&self) -> Self {
        Self {
            repr: Arc::clone(&self.repr),
        }
    }
}

impl<E> Default for PersistentSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Hash + Eq> PartialEq for PersistentSet<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len() && self.iter().all(|value| other.contains(value)))
    }
}

impl<E: Hash + Eq> Eq for PersistentSet<E> {}

impl<E: Hash> Hash for PersistentSet<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Order-independent: combine per-element hashes commutatively.
        let combined = self
            .iter()
            .fold(0u64, |acc, value| acc.wrapping_add(fxhash::hash64(value)));
        self.len().hash(state);
        combined.hash(state);
    }
}

impl<E: fmt::Debug> fmt::Debug for PersistentSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<E: fmt::Display> fmt::Display for PersistentSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

impl<E: Hash + Eq> FromIterator<E> for PersistentSet<E> {
    /// Collect into an unordered set.
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            repr: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<'a, E> IntoIterator for &'a PersistentSet<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The transient form of a [`PersistentSet`].
///
/// Shares storage with the set it was created from until the first insertion
/// of an element that is not already present.
pub struct SetBuilder<E> {
    repr: Arc<SetRepr<E>>,
}

impl<E: Clone + Hash + Eq> SetBuilder<E> {
    /// An empty builder.
    pub fn new(ordered: bool) -> Self {
        Self {
            repr: Arc::new(SetRepr::new(ordered)),
        }
    }

    /// A builder starting from `set`, switching to the requested ordering if
    /// needed.
    pub fn from_set(set: &PersistentSet<E>, ordered: bool) -> Self {
        let repr = if set.is_ordered() == ordered {
            Arc::clone(&set.repr)
        } else if ordered {
            Arc::new(SetRepr::Ordered(set.iter().cloned().collect()))
        } else {
            Arc::new(SetRepr::Hashed(set.iter().cloned().collect()))
        };
        Self { repr }
    }

    /// Insert `value`. Returns `false`, leaving the set untouched, if an
    /// equal element is already present.
    pub fn insert(&mut self, value: E) -> bool {
        if self.repr.contains(&value) {
            return false;
        }
        Arc::make_mut(&mut self.repr).insert(value)
    }

    /// Whether the builder contains `value`.
    pub fn contains(&self, value: &E) -> bool {
        self.repr.contains(value)
    }

    /// Remove every element, keeping the ordering flag.
    pub fn clear(&mut self) {
        match Arc::get_mut(&mut self.repr) {
            Some(repr) => repr.clear(),
            None => self.repr = Arc::new(SetRepr::new(self.repr.is_ordered())),
        }
    }

    /// A snapshot of the current elements.
    pub fn freeze(&self) -> PersistentSet<E> {
        PersistentSet {
            repr: Arc::clone(&self.repr),
        }
    }
}

impl<E> SetBuilder<E> {
    /// Whether the builder keeps insertion order.
    pub fn is_ordered(&self) -> bool {
        self.repr.is_ordered()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Whether the builder has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> Iter<'_, E> {
        self.repr.iter()
    }
}

impl<E: Clone + Hash + Eq> Extend<E> for SetBuilder<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for SetBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetBuilder")
            .field("ordered", &self.is_ordered())
            .field("items", &DebugItems(self))
            .finish()
    }
}

struct DebugItems<'a, E>(&'a SetBuilder<E>);

impl<E: fmt::Debug> fmt::Debug for DebugItems<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

/// [`Conversions`] between [`PersistentSet`] and [`SetBuilder`].
///
/// The ordering flag selects the backing collection of the builders it
/// produces; it does not otherwise change how the set is edited.
pub struct SetConversions<E> {
    ordered: bool,
    _elements: PhantomData<fn() -> E>,
}

impl<E> SetConversions<E> {
    /// Create the strategy.
    pub const fn new(ordered: bool) -> Self {
        Self {
            ordered,
            _elements: PhantomData,
        }
    }

    /// Strategy for sets with no guaranteed order.
    pub const fn unordered() -> Self {
        Self::new(false)
    }

    /// Strategy for insertion-ordered sets.
    pub const fn ordered() -> Self {
        Self::new(true)
    }

    /// Whether produced sets keep insertion order.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

impl<E> fmt::Debug for SetConversions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetConversions")
            .field("ordered", &self.ordered)
            .finish()
    }
}

impl<E: Clone + Hash + Eq> Conversions for SetConversions<E> {
    type Persistent = PersistentSet<E>;
    type Transient = SetBuilder<E>;
    type Error = Infallible;

    fn empty(&self) -> Result<SetBuilder<E>, Infallible> {
        Ok(SetBuilder::new(self.ordered))
    }

    fn from_persistent(&self, value: &PersistentSet<E>) -> Result<SetBuilder<E>, Infallible> {
        Ok(SetBuilder::from_set(value, self.ordered))
    }

    fn freeze(&self, builder: &mut SetBuilder<E>) -> Result<PersistentSet<E>, Infallible> {
        Ok(builder.freeze())
    }

    fn clear(&self, builder: &mut SetBuilder<E>) {
        builder.clear();
    }
}

impl<E: Clone + Hash + Eq> CollectionConversions for SetConversions<E> {
    type Item = E;

    fn kind(&self) -> CollectionKind {
        if self.ordered {
            CollectionKind::OrderedSet
        } else {
            CollectionKind::Set
        }
    }

    fn empty_value(&self) -> PersistentSet<E> {
        PersistentSet::with_ordering(self.ordered)
    }

    fn insert(&self, builder: &mut SetBuilder<E>, item: E) {
        builder.insert(item);
    }
}

impl<E: Clone + Hash + Eq> ElementConversions for SetConversions<E> {}
