//! Reference value types
//!
//! An unresolved reference is a symbol path plus either nothing (absolute:
//! interpreted from the set of library roots) or an anchor (relative:
//! interpreted from the innermost lexical scope enclosing the anchor node).
//! A resolved reference pins a declaring node in a document.

use crate::base::DocumentId;
use crate::syntax::NodeId;

use super::error::ResolveError;

/// What a reference points at. Lookups prune on this: superclasses are only
/// traversed when searching for a variable, never for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Class,
    Variable,
}

/// A symbol path interpreted from the project's library roots: the first
/// component names a library, successive components descend into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsoluteReference {
    symbols: Vec<String>,
    kind: Option<RefKind>,
}

impl AbsoluteReference {
    pub fn new(symbols: Vec<String>, kind: Option<RefKind>) -> Result<Self, ResolveError> {
        if symbols.is_empty() {
            return Err(ResolveError::InvariantViolated(
                "absolute reference with empty symbol path".into(),
            ));
        }
        Ok(Self { symbols, kind })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn kind(&self) -> Option<RefKind> {
        self.kind
    }
}

impl std::fmt::Display for AbsoluteReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbols.join("."))
    }
}

/// A symbol path interpreted from the innermost lexical scope enclosing the
/// anchor node. The anchor must belong to the document's current tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeReference {
    symbols: Vec<String>,
    kind: Option<RefKind>,
    document: DocumentId,
    node: NodeId,
}

impl RelativeReference {
    pub fn new(
        symbols: Vec<String>,
        kind: Option<RefKind>,
        document: DocumentId,
        node: NodeId,
    ) -> Result<Self, ResolveError> {
        if symbols.is_empty() {
            return Err(ResolveError::InvariantViolated(
                "relative reference with empty symbol path".into(),
            ));
        }
        Ok(Self {
            symbols,
            kind,
            document,
            node,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn kind(&self) -> Option<RefKind> {
        self.kind
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl std::fmt::Display for RelativeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbols.join("."))
    }
}

/// Either flavor of unresolved reference. The resolver dispatches on the
/// variant instead of an inheritance hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReference {
    Absolute(AbsoluteReference),
    Relative(RelativeReference),
}

impl UnresolvedReference {
    pub fn is_absolute(&self) -> bool {
        matches!(self, UnresolvedReference::Absolute(_))
    }

    pub fn symbols(&self) -> &[String] {
        match self {
            UnresolvedReference::Absolute(r) => r.symbols(),
            UnresolvedReference::Relative(r) => r.symbols(),
        }
    }

    pub fn kind(&self) -> Option<RefKind> {
        match self {
            UnresolvedReference::Absolute(r) => r.kind(),
            UnresolvedReference::Relative(r) => r.kind(),
        }
    }
}

impl std::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReference::Absolute(r) => write!(f, "{r}"),
            UnresolvedReference::Relative(r) => write!(f, "{r}"),
        }
    }
}

/// A fully resolved reference: the document and node declaring the last
/// path component, the absolute path, and the (now known) kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub document: DocumentId,
    pub node: NodeId,
    pub symbols: Vec<String>,
    pub kind: RefKind,
}

impl ResolvedReference {
    pub fn new(
        document: DocumentId,
        node: NodeId,
        symbols: Vec<String>,
        kind: RefKind,
    ) -> Result<Self, ResolveError> {
        if symbols.is_empty() {
            return Err(ResolveError::InvariantViolated(
                "resolved reference with empty symbol path".into(),
            ));
        }
        Ok(Self {
            document,
            node,
            symbols,
            kind,
        })
    }
}

impl std::fmt::Display for ResolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbols.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(AbsoluteReference::new(vec![], None).is_err());
        assert!(RelativeReference::new(vec![], None, DocumentId::new(0), NodeId::default()).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = AbsoluteReference::new(path(&["A", "B"]), Some(RefKind::Class)).unwrap();
        let b = AbsoluteReference::new(path(&["A", "B"]), Some(RefKind::Class)).unwrap();
        let c = AbsoluteReference::new(path(&["A", "C"]), Some(RefKind::Class)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let r = AbsoluteReference::new(path(&["Lib", "Pkg", "Cls"]), None).unwrap();
        assert_eq!(r.to_string(), "Lib.Pkg.Cls");
    }

    #[test]
    fn test_is_absolute() {
        let abs = UnresolvedReference::Absolute(
            AbsoluteReference::new(path(&["A"]), None).unwrap(),
        );
        assert!(abs.is_absolute());
    }
}
