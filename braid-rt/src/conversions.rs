//! Conversion strategies between persistent values and transient builders.
//!
//! A [`Reference`](crate::Reference) knows nothing about the values it holds
//! besides the four conversions of its strategy. Strategies are supplied once,
//! when the reference is constructed.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

/// The conversions a [`Reference`](crate::Reference) relies on to toggle
/// between a persistent value and its transient builder.
///
/// Implementations must not mutate the persistent value handed to
/// [`Conversions::from_persistent`]: it may be aliased by any number of other
/// owners.
pub trait Conversions {
    /// The immutable snapshot type. Cloning it must be cheap (usually an
    /// `Arc` bump), as references hand out clones of their current value.
    type Persistent: Clone;
    /// The mutable working copy.
    type Transient;
    /// Error raised by a failing conversion.
    type Error;

    /// Produce a fresh, empty working copy.
    fn empty(&self) -> Result<Self::Transient, Self::Error>;

    /// Produce a working copy that starts equivalent to `value`.
    fn from_persistent(&self, value: &Self::Persistent) -> Result<Self::Transient, Self::Error>;

    /// Produce an immutable snapshot of the current contents of `builder`.
    ///
    /// The builder is passed mutably because freezing an aggregate builder
    /// may freeze (and memoize) the references it holds itself. The
    /// observable contents of `builder` must not change.
    fn freeze(&self, builder: &mut Self::Transient) -> Result<Self::Persistent, Self::Error>;

    /// Reset `builder` to an empty working copy, discarding its contents.
    fn clear(&self, builder: &mut Self::Transient);
}

type EmptyFn<B, E> = Box<dyn Fn() -> Result<B, E>>;
type FromPersistentFn<T, B, E> = Box<dyn Fn(&T) -> Result<B, E>>;
type FreezeFn<T, B, E> = Box<dyn Fn(&mut B) -> Result<T, E>>;
type ClearFn<B> = Box<dyn Fn(&mut B)>;

/// [`Conversions`] assembled from four closures.
///
/// Useful for owners that would otherwise have to declare a strategy type
/// for a single member.
pub struct FnConversions<T, B, E = Infallible> {
    empty: EmptyFn<B, E>,
    from_persistent: FromPersistentFn<T, B, E>,
    freeze: FreezeFn<T, B, E>,
    clear: ClearFn<B>,
}

impl<T, B, E> FnConversions<T, B, E> {
    /// Create a strategy from its four conversions.
    pub fn new(
        empty: impl Fn() -> Result<B, E> + 'static,
        from_persistent: impl Fn(&T) -> Result<B, E> + 'static,
        freeze: impl Fn(&mut B) -> Result<T, E> + 'static,
        clear: impl Fn(&mut B) + 'static,
    ) -> Self {
        Self {
            empty: Box::new(empty),
            from_persistent: Box::new(from_persistent),
            freeze: Box::new(freeze),
            clear: Box::new(clear),
        }
    }
}

impl<T, B, E> fmt::Debug for FnConversions<T, B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConversions").finish_non_exhaustive()
    }
}

impl<T: Clone, B, E> Conversions for FnConversions<T, B, E> {
    type Persistent = T;
    type Transient = B;
    type Error = E;

    fn empty(&self) -> Result<B, E> {
        (self.empty)()
    }

    fn from_persistent(&self, value: &T) -> Result<B, E> {
        (self.from_persistent)(value)
    }

    fn freeze(&self, builder: &mut B) -> Result<T, E> {
        (self.freeze)(builder)
    }

    fn clear(&self, builder: &mut B) {
        (self.clear)(builder)
    }
}

/// A built aggregate that can be edited through a builder.
///
/// This is the shape every generated aggregate type has: an empty builder,
/// a builder seeded from an existing value, and a (possibly failing) build.
pub trait Aggregate: Clone {
    /// The aggregate's builder.
    type Builder;
    /// Error raised when the builder cannot produce a valid aggregate.
    type Error;

    /// An empty builder.
    fn builder() -> Self::Builder;

    /// A builder seeded with the members of `self`.
    fn to_builder(&self) -> Self::Builder;

    /// Build an aggregate from the current members of `builder`, leaving the
    /// builder usable for further edits.
    fn build(builder: &mut Self::Builder) -> Result<Self, Self::Error>;
}

/// [`Conversions`] for any [`Aggregate`].
pub struct AggregateConversions<A>(PhantomData<fn() -> A>);

impl<A> AggregateConversions<A> {
    /// Create the strategy.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for AggregateConversions<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for AggregateConversions<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for AggregateConversions<A> {}

impl<A> fmt::Debug for AggregateConversions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateConversions<{}>", std::any::type_name::<A>())
    }
}

impl<A: Aggregate> Conversions for AggregateConversions<A> {
    type Persistent = A;
    type Transient = A::Builder;
    type Error = A::Error;

    fn empty(&self) -> Result<A::Builder, A::Error> {
        Ok(A::builder())
    }

    fn from_persistent(&self, value: &A) -> Result<A::Builder, A::Error> {
        Ok(value.to_builder())
    }

    fn freeze(&self, builder: &mut A::Builder) -> Result<A, A::Error> {
        A::build(builder)
    }

    fn clear(&self, builder: &mut A::Builder) {
        *builder = A::builder();
    }
}
