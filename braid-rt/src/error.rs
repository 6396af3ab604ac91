//! Errors raised when finalizing owning aggregates.

use std::fmt::Debug;

use thiserror::Error;

/// An aggregate builder could not produce a valid aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// A required member was never set.
    #[error("{aggregate} is missing required member `{member}`")]
    MissingMember {
        /// Name of the aggregate being built.
        aggregate: &'static str,
        /// Name of the unset member.
        member: &'static str,
    },
}

/// Error raised by a [`UnionBuilder`](crate::UnionBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UnionError<Tag: Debug> {
    /// The union was finalized without any variant set.
    #[error("no union variant was set")]
    Unset,
    /// A reference was requested for a variant that holds a plain value.
    #[error("union variant {0:?} holds a plain value, not a reference")]
    NotReferenceBacked(Tag),
}

/// Unwrap a required member of an aggregate being built.
///
/// # Errors
///
/// Returns [`BuildError::MissingMember`] if `value` is `None`.
pub fn require<T>(
    value: Option<T>,
    aggregate: &'static str,
    member: &'static str,
) -> Result<T, BuildError> {
    value.ok_or(BuildError::MissingMember { aggregate, member })
}
