//! Resolver error kinds.
//!
//! Expected lookup misses are not errors: they surface as `Ok(None)`.
//! The variants here cover the remaining failure classes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// An explicitly requested mode the resolver does not implement
    /// (currently: definition resolution).
    #[error("definition resolution is not supported")]
    Unsupported,

    /// A caller-side precondition was breached (empty symbol path, stale
    /// anchor node). Fatal to the current operation, never to the project.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// Unexpected failure while resolving, e.g. I/O or a parse failure when
    /// loading a sibling file mid-walk. Caught at the resolver's outermost
    /// boundary, logged, and reported to the caller as an absent result.
    #[error("internal resolver error: {0}")]
    Internal(String),
}

impl From<crate::project::ProjectError> for ResolveError {
    fn from(err: crate::project::ProjectError) -> Self {
        ResolveError::Internal(err.to_string())
    }
}
