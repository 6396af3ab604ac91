//! Persistent/transient references for generated aggregate types.
//!
//! Generated aggregates are immutable. Editing one goes through its builder,
//! which holds one [`Reference`] per aggregate-typed member (nested
//! aggregates, lists, sets and maps). A reference:
//!  - starts out holding the member's persistent value, shared with the
//!    aggregate it was seeded from,
//!  - materializes a transient builder for the member on the first edit only,
//!  - freezes the builder back into a persistent value when the aggregate is
//!    built, memoizing the result until the next edit.
//!
//! Members that are never edited are therefore never copied: the rebuilt
//! aggregate shares them with the original.
//!
//! ## Summary of data types
//!
//! - [`Reference`] The cell toggling a member between its persistent and
//!   transient forms, generic over a [`Conversions`] strategy.
//! - [`ScalarReference`] A reference to a nested [`Aggregate`].
//! - [`CollectionReference`] A reference to a collection, with bulk mutators.
//!   See [`ListReference`], [`SetReference`] and [`MapReference`].
//! - [`PersistentList`], [`PersistentSet`], [`PersistentMap`] Immutable
//!   `Arc`-backed collections, with their copy-on-write builders.
//! - [`UnionBuilder`] Builder-side storage for tagged unions whose variants
//!   may hold references.
//!
//! ## Usage
//!
//! ```
//! use braid_rt::{ListReference, PersistentList};
//!
//! let names = PersistentList::from(vec!["a".to_string()]);
//! let mut reference = ListReference::from_persistent_list(names.clone());
//! // Untouched members come back as the very same value.
//! assert!(reference.current_value().ptr_eq(&names));
//!
//! reference.append("b".to_string());
//! assert_eq!(reference.current_value().len(), 2);
//! assert_eq!(names.len(), 1);
//! ```

pub mod collections;
pub mod conversions;
pub mod error;
pub mod reference;
pub mod union;

pub use collections::{
    CollectionConversions, CollectionKind, CollectionReference, ElementConversions, ListBuilder,
    ListReference, MapBuilder, MapReference, PersistentList, PersistentMap, PersistentSet,
    SetBuilder, SetReference,
};
pub use conversions::{Aggregate, AggregateConversions, Conversions, FnConversions};
pub use error::{BuildError, UnionError, require};
pub use reference::{ClearPolicy, Reference, ReferenceState, ScalarReference};
pub use union::{UnionBuilder, UnionVariants};
