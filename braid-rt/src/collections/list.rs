//! Persistent lists and their builders.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use itertools::Itertools;

use super::{CollectionConversions, CollectionKind, ElementConversions};
use crate::Conversions;

/// An immutable, cheaply cloned list.
pub struct PersistentList<E> {
    items: Arc<Vec<E>>,
}

impl<E> PersistentList<E> {
    /// The empty list.
    pub fn new() -> Self {
        Self {
            items: Arc::default(),
        }
    }

    /// The elements of the list.
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    /// Whether `self` and `other` share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<E> Deref for PersistentList<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.items
    }
}

impl<E> Clone for PersistentList<E> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<E> Default for PersistentList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PartialEq> PartialEq for PersistentList<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.items == other.items
    }
}

impl<E: Eq> Eq for PersistentList<E> {}

impl<E: std::hash::Hash> std::hash::Hash for PersistentList<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<E: fmt::Debug> fmt::Debug for PersistentList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E: fmt::Display> fmt::Display for PersistentList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().join(", "))
    }
}

impl<E> From<Vec<E>> for PersistentList<E> {
    fn from(items: Vec<E>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

impl<E> FromIterator<E> for PersistentList<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Vec::from_iter(iter).into()
    }
}

impl<'a, E> IntoIterator for &'a PersistentList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The transient form of a [`PersistentList`].
///
/// Shares storage with the list it was created from until the first write.
pub struct ListBuilder<E> {
    items: Arc<Vec<E>>,
}

impl<E: Clone> ListBuilder<E> {
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            items: Arc::default(),
        }
    }

    /// Append `item`.
    pub fn push(&mut self, item: E) {
        self.as_mut_vec().push(item);
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<E> {
        if self.items.is_empty() {
            return None;
        }
        self.as_mut_vec().pop()
    }

    /// Mutable access to the elements, copying shared storage first.
    pub fn as_mut_vec(&mut self) -> &mut Vec<E> {
        Arc::make_mut(&mut self.items)
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        match Arc::get_mut(&mut self.items) {
            Some(items) => items.clear(),
            None => self.items = Arc::default(),
        }
    }

    /// A snapshot of the current elements.
    pub fn freeze(&self) -> PersistentList<E> {
        PersistentList {
            items: Arc::clone(&self.items),
        }
    }
}

impl<E> Deref for ListBuilder<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.items
    }
}

impl<E: Clone> Default for ListBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Extend<E> for ListBuilder<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        let mut iter = iter.into_iter().peekable();
        if iter.peek().is_some() {
            self.as_mut_vec().extend(iter);
        }
    }
}

impl<E> From<PersistentList<E>> for ListBuilder<E> {
    fn from(list: PersistentList<E>) -> Self {
        Self { items: list.items }
    }
}

impl<E: fmt::Debug> fmt::Debug for ListBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListBuilder").field(&self.items).finish()
    }
}

/// [`Conversions`] between [`PersistentList`] and [`ListBuilder`].
pub struct ListConversions<E>(PhantomData<fn() -> E>);

impl<E> ListConversions<E> {
    /// Create the strategy.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for ListConversions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ListConversions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ListConversions")
    }
}

impl<E: Clone> Conversions for ListConversions<E> {
    type Persistent = PersistentList<E>;
    type Transient = ListBuilder<E>;
    type Error = Infallible;

    fn empty(&self) -> Result<ListBuilder<E>, Infallible> {
        Ok(ListBuilder::new())
    }

    fn from_persistent(&self, value: &PersistentList<E>) -> Result<ListBuilder<E>, Infallible> {
        Ok(value.clone().into())
    }

    fn freeze(&self, builder: &mut ListBuilder<E>) -> Result<PersistentList<E>, Infallible> {
        Ok(builder.freeze())
    }

    fn clear(&self, builder: &mut ListBuilder<E>) {
        builder.clear();
    }
}

impl<E: Clone> CollectionConversions for ListConversions<E> {
    type Item = E;

    fn kind(&self) -> CollectionKind {
        CollectionKind::List
    }

    fn empty_value(&self) -> PersistentList<E> {
        PersistentList::new()
    }

    fn insert(&self, builder: &mut ListBuilder<E>, item: E) {
        builder.push(item);
    }
}

impl<E: Clone> ElementConversions for ListConversions<E> {}
