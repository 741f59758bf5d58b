//! Semantic layer — reference types, tree queries, and the name resolver.

pub mod error;
pub mod helpers;
pub mod reference;
pub mod resolver;

pub use error::ResolveError;
pub use reference::{
    AbsoluteReference, RefKind, RelativeReference, ResolvedReference, UnresolvedReference,
};
pub use resolver::{reference_at, resolve_reference, Resolution};
