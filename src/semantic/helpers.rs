//! Pure queries over syntax nodes
//!
//! The closed vocabulary the resolver and outline use instead of touching
//! node kinds directly. Everything here is side-effect free and allocates
//! only result vectors.

use tracing::debug;

use crate::syntax::{Field, SyntaxKind, SyntaxNode};

// ----------------------------------------------------------------------
// Classification
// ----------------------------------------------------------------------

/// True iff the node is a class definition.
pub fn is_definition(node: SyntaxNode<'_>) -> bool {
    node.kind() == SyntaxKind::ClassDefinition
}

/// True for nodes that declare components: a component clause, a component
/// redeclaration, or a named element without a class-definition child.
pub fn is_variable_declaration(node: SyntaxNode<'_>) -> bool {
    match node.kind() {
        SyntaxKind::ComponentClause | SyntaxKind::ComponentRedeclaration => true,
        SyntaxKind::NamedElement => node.child_by_field(Field::ClassDefinition).is_none(),
        _ => false,
    }
}

/// True for any of the element-list variants.
pub fn is_element_list(node: SyntaxNode<'_>) -> bool {
    matches!(
        node.kind(),
        SyntaxKind::ElementList
            | SyntaxKind::PublicElementList
            | SyntaxKind::ProtectedElementList
    )
}

// ----------------------------------------------------------------------
// Identifier extraction
// ----------------------------------------------------------------------

/// The identifiers a declaration node introduces into its enclosing scope.
///
/// Unknown declaration kinds yield nothing (and are logged), so callers can
/// feed arbitrary nodes through without special-casing.
pub fn declared_identifiers(node: SyntaxNode<'_>) -> Vec<String> {
    match node.kind() {
        SyntaxKind::ClassDefinition => class_definition_identifier(node)
            .map(|n| vec![n.text().to_string()])
            .unwrap_or_default(),
        SyntaxKind::NamedElement => {
            let inner = node
                .child_by_field(Field::ClassDefinition)
                .or_else(|| node.child_by_field(Field::ComponentClause));
            inner.map(declared_identifiers).unwrap_or_default()
        }
        SyntaxKind::ComponentClause => node
            .child_by_field(Field::ComponentDeclarations)
            .map(declared_identifiers)
            .unwrap_or_default(),
        SyntaxKind::ComponentRedeclaration => node
            .child_by_field(Field::ComponentClause)
            .map(declared_identifiers)
            .unwrap_or_default(),
        SyntaxKind::ComponentList => node
            .children()
            .filter(|c| c.kind() == SyntaxKind::ComponentDeclaration)
            .flat_map(declared_identifiers)
            .collect(),
        SyntaxKind::ComponentDeclaration => node
            .child_by_field(Field::Declaration)
            .map(declared_identifiers)
            .unwrap_or_default(),
        SyntaxKind::Declaration => node
            .child_by_field(Field::Identifier)
            .map(|n| vec![n.text().to_string()])
            .unwrap_or_default(),
        SyntaxKind::StoredDefinitions
        | SyntaxKind::ElementList
        | SyntaxKind::PublicElementList
        | SyntaxKind::ProtectedElementList => node
            .named_children()
            .flat_map(declared_identifiers)
            .collect(),
        SyntaxKind::StoredDefinition => node
            .child_by_field(Field::ClassDefinition)
            .map(declared_identifiers)
            .unwrap_or_default(),
        other => {
            debug!(kind = other.name(), "no identifier extraction for node kind");
            Vec::new()
        }
    }
}

/// The identifier node a class definition declares, from its specifier.
pub fn class_definition_identifier<'t>(node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    node.child_by_field(Field::ClassSpecifier)?
        .child_by_field(Field::Identifier)
}

/// The ordered identifier subnodes making up a dotted `name` node.
pub fn name_identifiers<'t>(name: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    let mut out = Vec::new();
    collect_name_identifiers(name, &mut out);
    out
}

fn collect_name_identifiers<'t>(name: SyntaxNode<'t>, out: &mut Vec<SyntaxNode<'t>>) {
    if let Some(qualifier) = name.child_by_field(Field::Qualifier) {
        collect_name_identifiers(qualifier, out);
    }
    if let Some(ident) = name.child_by_field(Field::Identifier) {
        out.push(ident);
    }
}

/// The ordered identifier subnodes of a `component_reference` node.
pub fn component_reference_identifiers<'t>(node: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    node.children()
        .filter(|c| c.kind() == SyntaxKind::Ident)
        .collect()
}

// ----------------------------------------------------------------------
// Type specifier extraction
// ----------------------------------------------------------------------

/// The dotted path of the type specifier found at or under `node`, plus
/// whether it is rooted at the global scope (leading `.`).
pub fn type_specifier_path<'t>(node: SyntaxNode<'t>) -> Option<(Vec<SyntaxNode<'t>>, bool)> {
    let specifier = if node.kind() == SyntaxKind::TypeSpecifier {
        node
    } else {
        find_first(node, |n| n.kind() == SyntaxKind::TypeSpecifier)?
    };
    let global = specifier.child_by_field(Field::Global).is_some();
    let name = specifier.child_by_field(Field::Name)?;
    Some((name_identifiers(name), global))
}

// ----------------------------------------------------------------------
// Search
// ----------------------------------------------------------------------

/// Pre-order depth-first search for the first node satisfying `predicate`.
pub fn find_first<'t, P>(root: SyntaxNode<'t>, predicate: P) -> Option<SyntaxNode<'t>>
where
    P: Fn(SyntaxNode<'t>) -> bool,
{
    fn go<'t>(
        node: SyntaxNode<'t>,
        predicate: &dyn Fn(SyntaxNode<'t>) -> bool,
    ) -> Option<SyntaxNode<'t>> {
        if predicate(node) {
            return Some(node);
        }
        for child in node.children() {
            if let Some(found) = go(child, predicate) {
                return Some(found);
            }
        }
        None
    }
    go(root, &predicate)
}

/// Walk parent pointers upward until `predicate` holds. The starting node
/// itself is not considered.
pub fn find_parent<'t, P>(node: SyntaxNode<'t>, predicate: P) -> Option<SyntaxNode<'t>>
where
    P: Fn(SyntaxNode<'t>) -> bool,
{
    let mut current = node.parent();
    while let Some(n) = current {
        if predicate(n) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Pre-order walk; a visitor returning `false` prunes that subtree.
pub fn for_each<'t, V>(root: SyntaxNode<'t>, mut visit: V)
where
    V: FnMut(SyntaxNode<'t>) -> bool,
{
    fn go<'t>(node: SyntaxNode<'t>, visit: &mut dyn FnMut(SyntaxNode<'t>) -> bool) {
        if !visit(node) {
            return;
        }
        for child in node.children() {
            go(child, visit);
        }
    }
    go(root, &mut visit);
}

/// The deepest node containing `offset` for which `predicate` holds.
/// Containment is inclusive of node ends, so a cursor just past the last
/// character of an identifier still hits it.
pub fn deepest_at_offset<'t, P>(
    root: SyntaxNode<'t>,
    offset: usize,
    predicate: P,
) -> Option<SyntaxNode<'t>>
where
    P: Fn(SyntaxNode<'t>) -> bool,
{
    fn go<'t>(
        node: SyntaxNode<'t>,
        offset: usize,
        predicate: &dyn Fn(SyntaxNode<'t>) -> bool,
        depth: usize,
        best: &mut Option<(usize, SyntaxNode<'t>)>,
    ) {
        if !node.contains_offset(offset) {
            return;
        }
        if predicate(node) {
            // Deeper wins; on equal depth the later sibling wins, so a cursor
            // sitting exactly between two tokens identifies the one it is
            // about to extend.
            match best {
                Some((d, _)) if *d > depth => {}
                _ => *best = Some((depth, node)),
            }
        }
        for child in node.children() {
            go(child, offset, predicate, depth + 1, best);
        }
    }

    let mut best = None;
    go(root, offset, &predicate, 0, &mut best);
    best.map(|(_, node)| node)
}
