//! Access filters for commands and parameters.
//!
//! A filter is consulted whenever its command is routed into, or its
//! parameter is considered as a match candidate. Rejection surfaces as
//! [`CommandError::Filter`](crate::CommandError::Filter) during execution;
//! during completion the rejected command or parameter is silently left out.

use crate::error::FilterError;
use crate::invocation::CommandInvocation;

/// A yes/no access check.
///
/// Implemented for closures:
///
/// ```rust
/// use cmdtree::{CommandInvocation, Filter, FilterError};
///
/// struct Operator;
///
/// let ops_only = |inv: &CommandInvocation| {
///     if inv.context().extensions.contains::<Operator>() {
///         Ok(())
///     } else {
///         Err(FilterError::new("operators only"))
///     }
/// };
/// # let _: &dyn Filter = &ops_only;
/// ```
pub trait Filter {
    fn run(&self, inv: &CommandInvocation) -> Result<(), FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&CommandInvocation) -> Result<(), FilterError>,
{
    fn run(&self, inv: &CommandInvocation) -> Result<(), FilterError> {
        self(inv)
    }
}

/// Builds a filter that passes while `predicate` holds and otherwise fails
/// with `message`.
pub fn require<P>(predicate: P, message: impl Into<String>) -> impl Filter
where
    P: Fn(&CommandInvocation) -> bool,
{
    let message = message.into();
    move |inv: &CommandInvocation| {
        if predicate(inv) {
            Ok(())
        } else {
            Err(FilterError::new(message.clone()))
        }
    }
}

/// Builds a filter that passes when the per-line extensions contain a `T`.
pub fn require_extension<T: 'static>(message: impl Into<String>) -> impl Filter {
    require(
        |inv: &CommandInvocation| inv.context().extensions.contains::<T>(),
        message,
    )
}
