//! Builders for tagged unions whose variants may hold references.
//!
//! A union builder holds a single variant at a time. Plain variants are set
//! wholesale with [`UnionBuilder::set`]. Variants backed by a reference are
//! edited through [`UnionBuilder::select`], which switches the discriminant
//! to the requested variant, starting from a fresh empty reference if a
//! different variant was active.

use std::fmt::Debug;

use tracing::debug;

use crate::error::UnionError;

/// The variants a [`UnionBuilder`] can hold.
///
/// Implemented by the builder-side enum of a union: one variant per member,
/// where collection and aggregate members hold a reference instead of a
/// persistent value.
pub trait UnionVariants: Sized {
    /// The discriminant.
    type Tag: Copy + Eq + Debug;
    /// The built union.
    type Persistent;
    /// Error raised when freezing a variant.
    type Error: From<UnionError<Self::Tag>>;

    /// The discriminant of this variant.
    fn tag(&self) -> Self::Tag;

    /// The builder-side variant of `value`. Reference-backed variants wrap
    /// the persistent member without materializing it.
    fn seed(value: &Self::Persistent) -> Self;

    /// A reference-backed variant for `tag` holding an empty reference, or
    /// `None` if `tag` names a plain variant.
    fn empty_reference(tag: Self::Tag) -> Option<Self>;

    /// The built union for this variant, freezing its reference if any.
    fn freeze(&mut self) -> Result<Self::Persistent, Self::Error>;
}

/// Builder-side storage of a tagged union.
#[derive(Debug)]
pub struct UnionBuilder<V> {
    value: Option<V>,
}

impl<V: UnionVariants> UnionBuilder<V> {
    /// A builder with no variant set.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// A builder holding the variant of `value`.
    pub fn from_persistent(value: &V::Persistent) -> Self {
        Self {
            value: Some(V::seed(value)),
        }
    }

    /// The discriminant of the current variant.
    pub fn tag(&self) -> Option<V::Tag> {
        self.value.as_ref().map(V::tag)
    }

    /// Whether any variant is set.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The current variant.
    pub fn variant(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Replace the current variant, discarding any pending edits of the
    /// previous one.
    pub fn set(&mut self, value: V) {
        debug!(tag = ?value.tag(), "setting union variant");
        self.value = Some(value);
    }

    /// The reference of the reference-backed variant `tag`.
    ///
    /// If another variant (or none) is active, the discriminant switches to
    /// `tag` with an empty reference. `project` extracts the reference from
    /// the variant.
    ///
    /// # Errors
    ///
    /// Returns [`UnionError::NotReferenceBacked`] if `tag` is a plain
    /// variant, whether active or not. The builder is left untouched.
    ///
    /// # Panics
    ///
    /// If `project` finds no reference in the reference-backed variant
    /// tagged `tag`.
    pub fn select<R>(
        &mut self,
        tag: V::Tag,
        project: impl FnOnce(&mut V) -> Option<&mut R>,
    ) -> Result<&mut R, UnionError<V::Tag>> {
        let value = match self.value.take() {
            Some(current) if current.tag() == tag => self.value.insert(current),
            previous => match V::empty_reference(tag) {
                Some(fresh) => {
                    debug!(?tag, "switching union discriminant");
                    self.value.insert(fresh)
                }
                None => {
                    self.value = previous;
                    return Err(UnionError::NotReferenceBacked(tag));
                }
            },
        };
        match project(value) {
            Some(reference) => Ok(reference),
            // Only reachable with `tag` already active.
            None if V::empty_reference(tag).is_none() => {
                Err(UnionError::NotReferenceBacked(tag))
            }
            None => panic!("union variant {tag:?} does not hold a reference"),
        }
    }

    /// The built union.
    ///
    /// # Errors
    ///
    /// Returns [`UnionError::Unset`] (converted into `V::Error`) if no
    /// variant is set, or the error of freezing the variant.
    pub fn build(&mut self) -> Result<V::Persistent, V::Error> {
        self.value
            .as_mut()
            .ok_or(UnionError::<V::Tag>::Unset)?
            .freeze()
    }
}

impl<V: UnionVariants> Default for UnionBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
