//! Per-reference configuration.

/// What [`Reference::clear`](crate::Reference::clear) does with a reference
/// that currently holds a transient builder.
///
/// References without a canonical empty value always clear their builder in
/// place, whatever the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, derive_more::Display)]
#[non_exhaustive]
pub enum ClearPolicy {
    /// Drop the builder and go back to the persistent empty value.
    #[default]
    #[display("discard")]
    Discard,
    /// Keep the builder and reset it with
    /// [`Conversions::clear`](crate::Conversions::clear). Cheaper for owners
    /// that repeatedly clear and refill the same member.
    #[display("in-place")]
    InPlace,
}
