//! References to collection-typed members.
//!
//! All collection kinds share the state machine of [`Reference`]; a
//! [`CollectionReference`] only adds the bulk mutators and drops the error
//! channel, since collection conversions cannot fail.
//!
//! Persistent collections are `Arc`-backed snapshots. Their builders start
//! out sharing the snapshot's storage and copy it on the first write, and
//! only if the snapshot is still referenced elsewhere. Materializing and
//! freezing are therefore constant time.

use std::convert::Infallible;
use std::fmt;

use delegate::delegate;

use crate::{ClearPolicy, Conversions, Reference, ReferenceState};

pub mod list;
pub mod map;
#[cfg(feature = "serde")]
mod serial;
pub mod set;

pub use list::{ListBuilder, ListConversions, PersistentList};
pub use map::{MapBuilder, MapConversions, PersistentMap};
pub use set::{PersistentSet, SetBuilder, SetConversions};

/// A reference to a list member.
pub type ListReference<E> = CollectionReference<ListConversions<E>>;
/// A reference to a set member, ordered or not.
pub type SetReference<E> = CollectionReference<SetConversions<E>>;
/// A reference to a map member, ordered or not.
pub type MapReference<K, V> = CollectionReference<MapConversions<K, V>>;

/// The closed set of collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[non_exhaustive]
pub enum CollectionKind {
    /// Insertion-ordered, duplicates kept.
    #[display("list")]
    List,
    /// De-duplicated, canonical order.
    #[display("set")]
    Set,
    /// De-duplicated, insertion-ordered.
    #[display("ordered set")]
    OrderedSet,
    /// Keyed, canonical order.
    #[display("map")]
    Map,
    /// Keyed, insertion-ordered.
    #[display("ordered map")]
    OrderedMap,
}

impl CollectionKind {
    /// Whether the collection exposes insertion order.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::List | Self::OrderedSet | Self::OrderedMap)
    }

    /// Whether equal elements (or keys) are absorbed.
    pub fn is_unique(self) -> bool {
        !matches!(self, Self::List)
    }
}

/// Infallible [`Conversions`] for a collection kind.
pub trait CollectionConversions: Conversions<Error = Infallible> {
    /// What a single insertion adds: an element, or a key-value pair.
    type Item;

    /// The kind of collection produced by these conversions.
    fn kind(&self) -> CollectionKind;

    /// The canonical empty value of the kind.
    fn empty_value(&self) -> Self::Persistent;

    /// Insert `item` into `builder`, following the kind's duplicate policy.
    fn insert(&self, builder: &mut Self::Transient, item: Self::Item);
}

/// Collections of plain elements: lists and sets.
pub trait ElementConversions: CollectionConversions {}

/// A [`Reference`] to a collection.
pub struct CollectionReference<C: CollectionConversions> {
    inner: Reference<C>,
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

impl<C: CollectionConversions> CollectionReference<C> {
    /// Create a reference holding the empty collection of the kind.
    pub fn empty(conversions: C) -> Self {
        let empty_value = conversions.empty_value();
        Self {
            inner: Reference::of_empty(conversions, empty_value),
        }
    }

    /// Create a reference holding `value`.
    pub fn seeded(conversions: C, value: C::Persistent) -> Self {
        let empty_value = conversions.empty_value();
        Self {
            inner: Reference::of(conversions, value).with_empty_value(empty_value),
        }
    }

    /// Set what [`CollectionReference::clear`] does with a builder.
    pub fn with_clear_policy(self, clear_policy: ClearPolicy) -> Self {
        Self {
            inner: self.inner.with_clear_policy(clear_policy),
        }
    }

    /// The mutable form of the collection, materialized on first use.
    pub fn as_mutable(&mut self) -> &mut C::Transient {
        infallible(self.inner.as_mutable())
    }

    /// The current persistent collection, frozen and memoized if needed.
    pub fn current_value(&mut self) -> C::Persistent {
        infallible(self.inner.current_value())
    }

    /// Reset to the empty collection. A later insertion always starts from
    /// an empty collection, and any memoized freeze is dropped.
    pub fn clear(&mut self) {
        infallible(self.inner.clear())
    }

    /// Collapse the reference into its persistent collection.
    pub fn into_persistent(self) -> C::Persistent {
        infallible(self.inner.into_persistent())
    }

    /// Insert a single item, following the kind's duplicate policy.
    pub fn insert(&mut self, item: C::Item) {
        let (conversions, builder) = infallible(self.inner.materialize());
        conversions.insert(builder, item);
    }

    /// Insert every item of `items`, in iteration order.
    pub fn insert_all(&mut self, items: impl IntoIterator<Item = C::Item>) {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            // Nothing to add: keep the persistent form.
            return;
        }
        let (conversions, builder) = infallible(self.inner.materialize());
        for item in items {
            conversions.insert(builder, item);
        }
    }

    /// Replace the whole collection by `items`.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = C::Item>) {
        self.clear();
        self.insert_all(items);
    }

    /// The kind of the referenced collection.
    pub fn kind(&self) -> CollectionKind {
        self.inner.conversions().kind()
    }

    delegate! {
        to self.inner {
            /// Replace the collection wholesale, discarding pending edits.
            pub fn set_persistent(&mut self, value: C::Persistent);
            /// The state of the reference.
            pub fn state(&self) -> ReferenceState;
            /// Whether the reference holds a builder.
            pub fn is_transient(&self) -> bool;
            /// The persistent collection, if available without freezing.
            pub fn peek(&self) -> Option<&C::Persistent>;
            /// The clear policy of the reference.
            pub fn clear_policy(&self) -> ClearPolicy;
        }
    }
}

impl<C: ElementConversions> CollectionReference<C> {
    /// Append a single element.
    pub fn append(&mut self, value: C::Item) {
        self.insert(value);
    }

    /// Append every element of `values`, in iteration order.
    pub fn append_all(&mut self, values: impl IntoIterator<Item = C::Item>) {
        self.insert_all(values);
    }
}

impl<K: Clone + std::hash::Hash + Eq, V: Clone> MapReference<K, V> {
    /// Associate `value` with `key`, replacing any previous value.
    pub fn associate(&mut self, key: K, value: V) {
        self.insert((key, value));
    }

    /// Associate every pair of `entries`; the last value of a repeated key
    /// wins.
    pub fn associate_all(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.insert_all(entries);
    }
}

impl<E: Clone> ListReference<E> {
    /// An empty list reference.
    pub fn for_list() -> Self {
        Self::empty(ListConversions::new())
    }

    /// A list reference seeded with `value`.
    pub fn from_persistent_list(value: PersistentList<E>) -> Self {
        Self::seeded(ListConversions::new(), value)
    }
}

impl<E: Clone + std::hash::Hash + Eq> SetReference<E> {
    /// An empty set reference with no guaranteed iteration order.
    pub fn for_set() -> Self {
        Self::empty(SetConversions::unordered())
    }

    /// An empty set reference that keeps insertion order.
    pub fn for_ordered_set() -> Self {
        Self::empty(SetConversions::ordered())
    }

    /// A set reference seeded with `value`. Edits keep the ordering of
    /// `value`.
    pub fn from_persistent_set(value: PersistentSet<E>) -> Self {
        let conversions = SetConversions::new(value.is_ordered());
        Self::seeded(conversions, value)
    }

    /// A set reference seeded with `value` whose edits keep insertion order.
    pub fn from_persistent_ordered_set(value: PersistentSet<E>) -> Self {
        Self::seeded(SetConversions::ordered(), value)
    }
}

impl<K: Clone + std::hash::Hash + Eq, V: Clone> MapReference<K, V> {
    /// An empty map reference with no guaranteed iteration order.
    pub fn for_map() -> Self {
        Self::empty(MapConversions::unordered())
    }

    /// An empty map reference that keeps insertion order.
    pub fn for_ordered_map() -> Self {
        Self::empty(MapConversions::ordered())
    }

    /// A map reference seeded with `value`. Edits keep the ordering of
    /// `value`.
    pub fn from_persistent_map(value: PersistentMap<K, V>) -> Self {
        let conversions = MapConversions::new(value.is_ordered());
        Self::seeded(conversions, value)
    }
}

impl<C> fmt::Debug for CollectionReference<C>
where
    C: CollectionConversions,
    C::Persistent: fmt::Debug,
    C::Transient: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionReference")
            .field("kind", &self.kind())
            .field("inner", &self.inner)
            .finish()
    }
}
