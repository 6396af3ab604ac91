//! The cell toggling a member between its persistent and transient forms.

use std::fmt;

use tracing::trace;

use crate::Conversions;
use crate::conversions::{Aggregate, AggregateConversions};

mod policy;
pub use policy::ClearPolicy;

/// A reference to a single nested value, held either as an immutable
/// persistent value or as a mutable transient builder.
///
/// A reference starts out persistent. The first call to
/// [`Reference::as_mutable`] materializes a builder from the persistent
/// value; later edits accumulate on that same builder. Reading the value back
/// with [`Reference::current_value`] freezes the builder and memoizes the
/// result until the next edit, without giving up the builder.
///
/// Exclusivity of the transient form is enforced by the borrow checker: the
/// builder is only ever handed out as a `&mut` borrow of the reference.
pub struct Reference<C: Conversions> {
    conversions: C,
    /// Canonical empty value, used by [`Reference::clear`].
    empty_value: Option<C::Persistent>,
    clear_policy: ClearPolicy,
    state: State<C::Persistent, C::Transient>,
}

enum State<T, B> {
    Persistent(T),
    /// `frozen` caches the last freeze of `builder`; it is dropped whenever
    /// the builder is handed out mutably.
    Transient { builder: B, frozen: Option<T> },
}

/// The externally observable state of a [`Reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ReferenceState {
    /// Holds a persistent value, no builder.
    Persistent,
    /// Holds a builder with no up-to-date frozen value.
    Transient,
    /// Holds a builder together with a memoized freeze of it.
    Frozen,
}

/// A reference to a nested [`Aggregate`].
pub type ScalarReference<A> = Reference<AggregateConversions<A>>;

impl<C: Conversions> Reference<C> {
    /// Create a reference holding `value`. No builder is created.
    ///
    /// The reference has no canonical empty value, so [`Reference::clear`]
    /// leaves it transient with an empty builder rather than persistent.
    /// Use [`Reference::of_empty`] or [`Reference::with_empty_value`] to
    /// clear back to a persistent empty value.
    pub fn of(conversions: C, value: C::Persistent) -> Self {
        Self {
            conversions,
            empty_value: None,
            clear_policy: ClearPolicy::default(),
            state: State::Persistent(value),
        }
    }

    /// Create a reference holding the canonical empty value of its type.
    ///
    /// `empty_value` is also what [`Reference::clear`] resets to.
    pub fn of_empty(conversions: C, empty_value: C::Persistent) -> Self {
        Self::of(conversions, empty_value.clone()).with_empty_value(empty_value)
    }

    /// Create a reference holding a fresh empty builder, for types with no
    /// meaningful empty persistent value.
    pub fn of_empty_transient(conversions: C) -> Result<Self, C::Error> {
        let builder = conversions.empty()?;
        Ok(Self::transient(conversions, builder))
    }

    /// Create a reference that already holds `builder`.
    pub fn transient(conversions: C, builder: C::Transient) -> Self {
        Self {
            conversions,
            empty_value: None,
            clear_policy: ClearPolicy::default(),
            state: State::Transient {
                builder,
                frozen: None,
            },
        }
    }

    /// Set the canonical empty value [`Reference::clear`] resets to.
    pub fn with_empty_value(mut self, empty_value: C::Persistent) -> Self {
        self.empty_value = Some(empty_value);
        self
    }

    /// Set what [`Reference::clear`] does with a transient builder.
    pub fn with_clear_policy(mut self, clear_policy: ClearPolicy) -> Self {
        self.clear_policy = clear_policy;
        self
    }

    /// The mutable form of the referenced value.
    ///
    /// Materializes a builder from the persistent value on first use. Later
    /// calls return the same builder until the reference is reset with
    /// [`Reference::set_persistent`] or [`Reference::clear`]. Any memoized
    /// freeze is dropped, as the caller may mutate the builder.
    ///
    /// If materialization fails the reference is left untouched.
    pub fn as_mutable(&mut self) -> Result<&mut C::Transient, C::Error> {
        self.materialize().map(|(_, builder)| builder)
    }

    /// Materialize the builder if needed, and borrow it alongside the
    /// conversions.
    pub(crate) fn materialize(&mut self) -> Result<(&C, &mut C::Transient), C::Error> {
        if let State::Persistent(value) = &self.state {
            trace!("materializing transient builder");
            let builder = self.conversions.from_persistent(value)?;
            self.state = State::Transient {
                builder,
                frozen: None,
            };
        }
        match &mut self.state {
            State::Transient { builder, frozen } => {
                *frozen = None;
                Ok((&self.conversions, builder))
            }
            State::Persistent(_) => unreachable!("reference was materialized above"),
        }
    }

    /// Run `edit` against the mutable form of the referenced value.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut C::Transient) -> R) -> Result<R, C::Error> {
        Ok(edit(self.as_mutable()?))
    }

    /// Replace the referenced value wholesale, discarding any builder and its
    /// pending edits.
    pub fn set_persistent(&mut self, value: C::Persistent) {
        if let State::Transient { .. } = self.state {
            trace!("discarding transient builder");
        }
        self.state = State::Persistent(value);
    }

    /// The current persistent value.
    ///
    /// Freezes the builder if there were edits since the last freeze. The
    /// reference keeps its builder, so further edits stay cheap. If freezing
    /// fails the reference is left untouched.
    pub fn current_value(&mut self) -> Result<C::Persistent, C::Error> {
        match &mut self.state {
            State::Persistent(value) => Ok(value.clone()),
            State::Transient {
                frozen: Some(value),
                ..
            } => Ok(value.clone()),
            State::Transient { builder, frozen } => {
                trace!("freezing transient builder");
                let value = self.conversions.freeze(builder)?;
                *frozen = Some(value.clone());
                Ok(value)
            }
        }
    }

    /// Reset the referenced value to empty.
    ///
    /// With a canonical empty value this goes back to the persistent form,
    /// unless the [`ClearPolicy`] asks to clear a builder in place.
    /// Without one, an existing builder is cleared in place and a persistent
    /// reference gets a fresh empty builder; only that last case can fail.
    pub fn clear(&mut self) -> Result<(), C::Error> {
        let in_place = self.clear_policy == ClearPolicy::InPlace || self.empty_value.is_none();
        if in_place {
            if let State::Transient { builder, frozen } = &mut self.state {
                self.conversions.clear(builder);
                *frozen = None;
                return Ok(());
            }
        }
        self.state = match &self.empty_value {
            Some(empty) => State::Persistent(empty.clone()),
            None => State::Transient {
                builder: self.conversions.empty()?,
                frozen: None,
            },
        };
        Ok(())
    }

    /// Collapse the reference into its persistent value.
    pub fn into_persistent(self) -> Result<C::Persistent, C::Error> {
        match self.state {
            State::Persistent(value)
            | State::Transient {
                frozen: Some(value),
                ..
            } => Ok(value),
            State::Transient {
                mut builder,
                frozen: None,
            } => self.conversions.freeze(&mut builder),
        }
    }

    /// The state of the reference.
    pub fn state(&self) -> ReferenceState {
        match &self.state {
            State::Persistent(_) => ReferenceState::Persistent,
            State::Transient { frozen: None, .. } => ReferenceState::Transient,
            State::Transient { frozen: Some(_), .. } => ReferenceState::Frozen,
        }
    }

    /// Whether the reference holds a builder.
    pub fn is_transient(&self) -> bool {
        matches!(self.state, State::Transient { .. })
    }

    /// The persistent value, if the reference holds one or an up-to-date
    /// freeze of its builder. Never freezes.
    pub fn peek(&self) -> Option<&C::Persistent> {
        match &self.state {
            State::Persistent(value) => Some(value),
            State::Transient { frozen, .. } => frozen.as_ref(),
        }
    }

    /// The conversion strategy of the reference.
    pub fn conversions(&self) -> &C {
        &self.conversions
    }

    /// The canonical empty value, if any.
    pub fn empty_value(&self) -> Option<&C::Persistent> {
        self.empty_value.as_ref()
    }

    /// The clear policy of the reference.
    pub fn clear_policy(&self) -> ClearPolicy {
        self.clear_policy
    }
}

impl<A: Aggregate> Reference<AggregateConversions<A>> {
    /// Create a reference to an existing aggregate.
    pub fn from_aggregate(value: A) -> Self {
        Self::of(AggregateConversions::new(), value)
    }

    /// Create a reference holding an empty aggregate builder, for aggregates
    /// that only make sense once built.
    pub fn for_aggregate() -> Self {
        Self::transient(AggregateConversions::new(), A::builder())
    }
}

impl<C> fmt::Debug for Reference<C>
where
    C: Conversions,
    C::Persistent: fmt::Debug,
    C::Transient: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Reference");
        match &self.state {
            State::Persistent(value) => s.field("persistent", value),
            State::Transient { builder, frozen } => {
                s.field("transient", builder).field("frozen", frozen)
            }
        };
        s.field("clear_policy", &self.clear_policy)
            .finish_non_exhaustive()
    }
}
