//! The name resolver
//!
//! Turns a cursor position into an unresolved reference, promotes relative
//! references into ordered candidate absolute references, and walks
//! absolute references symbol-by-symbol across the filesystem and the
//! syntax trees of the project's libraries.
//!
//! The walk is a bounded state machine: each transition consumes one symbol
//! and carries the current resolved step; variable→class promotion is a
//! transition that consumes no symbol but may fail (builtin types have no
//! declaring class anywhere).

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::base::constants::{is_builtin_type, MODELICA_EXT, PACKAGE_FILE};
use crate::base::{DocumentId, Position};
use crate::project::Project;
use crate::project::Document;
use crate::syntax::{Field, NodeId, SyntaxKind, SyntaxNode};

use super::error::ResolveError;
use super::helpers;
use super::reference::{
    AbsoluteReference, RefKind, RelativeReference, ResolvedReference, UnresolvedReference,
};

/// What the caller wants resolved. Only declaration lookup is implemented;
/// definition lookup is reserved and fails with a distinct error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Declaration,
    Definition,
}

/// Recursion budget for superclass and type-lookup chains. Cyclic `extends`
/// would otherwise recurse forever; exceeding the budget is reported as an
/// internal error and surfaces as not-found.
const MAX_DEPTH: usize = 64;

/// Resolve an unresolved reference against the project.
///
/// Lookup misses are `Ok(None)`. Internal failures (I/O or parse errors
/// while loading sibling files mid-walk) are caught here, logged, and
/// reported as `Ok(None)` so a single broken file cannot poison the caller.
pub fn resolve_reference(
    project: &mut Project,
    reference: &UnresolvedReference,
    resolution: Resolution,
) -> Result<Option<ResolvedReference>, ResolveError> {
    if resolution == Resolution::Definition {
        return Err(ResolveError::Unsupported);
    }
    match resolve_inner(project, reference, 0) {
        Err(ResolveError::Internal(message)) => {
            warn!(reference = %reference, error = %message, "resolution failed internally");
            Ok(None)
        }
        other => other,
    }
}

fn resolve_inner(
    project: &mut Project,
    reference: &UnresolvedReference,
    depth: usize,
) -> Result<Option<ResolvedReference>, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::Internal("resolution depth exceeded".into()));
    }
    match reference {
        UnresolvedReference::Absolute(abs) => {
            resolve_absolute(project, abs.symbols(), abs.kind(), depth)
        }
        UnresolvedReference::Relative(rel) => resolve_relative(project, rel, depth),
    }
}

// ----------------------------------------------------------------------
// Absolute walk
// ----------------------------------------------------------------------

/// One resolved step of the walk.
#[derive(Debug, Clone, Copy)]
struct Step {
    document: DocumentId,
    node: NodeId,
    kind: RefKind,
}

fn resolve_absolute(
    project: &mut Project,
    symbols: &[String],
    ref_kind: Option<RefKind>,
    depth: usize,
) -> Result<Option<ResolvedReference>, ResolveError> {
    let first = match symbols.first() {
        Some(s) => s.as_str(),
        None => {
            return Err(ResolveError::InvariantViolated(
                "absolute reference with empty symbol path".into(),
            ))
        }
    };
    let Some(library) = project.library_by_name(first) else {
        return Ok(None);
    };
    let library_root = library.root().to_path_buf();

    // The library's root package class. A library without a root package.mo
    // (a workspace of loose files, or a package directory that omits it) is
    // descended through virtually: the directory advances, no class node
    // does.
    let mut step: Option<Step> = None;
    let mut dir = library_root.clone();
    let root_package = library_root.join(PACKAGE_FILE);
    if root_package.is_file() {
        if let Some(doc_id) = project.get_or_load_document(&root_package)? {
            if let Some(node) = top_level_class_node(project, doc_id, first) {
                step = Some(Step {
                    document: doc_id,
                    node,
                    kind: RefKind::Class,
                });
            }
        }
    }

    for symbol in &symbols[1..] {
        // Variable steps are traversed through their declared type.
        if let Some(current) = step {
            if current.kind == RefKind::Variable {
                match type_lookup(project, current, depth)? {
                    Some(class_step) => {
                        step = Some(class_step);
                        dir = document_dir(project, class_step.document)?;
                    }
                    None => return Ok(None),
                }
            }
        }

        // Filesystem first: a class X may live as X.mo or X/package.mo next
        // to the current document.
        let single_file = dir.join(format!("{symbol}.{MODELICA_EXT}"));
        let package_file = dir.join(symbol).join(PACKAGE_FILE);
        let mut advanced = false;
        for candidate in [single_file, package_file] {
            if !candidate.is_file() {
                continue;
            }
            if let Some(doc_id) = project.get_or_load_document(&candidate)? {
                if let Some(node) = top_level_class_node(project, doc_id, symbol) {
                    step = Some(Step {
                        document: doc_id,
                        node,
                        kind: RefKind::Class,
                    });
                    dir = document_dir(project, doc_id)?;
                    advanced = true;
                    break;
                }
            }
        }
        if advanced {
            continue;
        }

        // A bare directory named after the symbol descends virtually.
        let sub_dir = dir.join(symbol);
        if sub_dir.is_dir() {
            step = None;
            dir = sub_dir;
            continue;
        }

        // Members, then superclasses (kind-gated), of the current class.
        let Some(current) = step else {
            return Ok(None);
        };
        match find_member(project, current, symbol, ref_kind, depth)? {
            Some(next) => {
                step = Some(next);
                // member steps stay within the same document; the directory
                // cursor follows the declaring document
                dir = document_dir(project, next.document)?;
            }
            None => return Ok(None),
        }
    }

    match step {
        Some(final_step) => Ok(Some(ResolvedReference::new(
            final_step.document,
            final_step.node,
            symbols.to_vec(),
            final_step.kind,
        )?)),
        None => Ok(None),
    }
}

fn document_dir(project: &Project, id: DocumentId) -> Result<PathBuf, ResolveError> {
    let document = project
        .document(id)
        .ok_or_else(|| ResolveError::Internal("document vanished during walk".into()))?;
    Ok(document
        .path()
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default())
}

fn top_level_class_node(project: &Project, doc: DocumentId, name: &str) -> Option<NodeId> {
    project
        .document(doc)
        .and_then(|d| d.top_level_class(name))
        .map(|n| n.id())
}

/// Search the members of a class step for `symbol`: every element list of
/// the class, then — unless the reference is searching for a class — the
/// members of its superclasses, in declaration order.
fn find_member(
    project: &mut Project,
    class: Step,
    symbol: &str,
    ref_kind: Option<RefKind>,
    depth: usize,
) -> Result<Option<Step>, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::Internal("member search depth exceeded".into()));
    }

    if let Some(found) = member_in_element_lists(project, class, symbol)? {
        return Ok(Some(found));
    }

    // Searching for a class name never traverses extends; searching for a
    // variable (or an unknown) does.
    if ref_kind == Some(RefKind::Class) {
        return Ok(None);
    }

    let extends_clauses = collect_extends_clauses(project, class)?;
    for clause in extends_clauses {
        let superclass = match resolve_superclass(project, class.document, clause, depth) {
            Ok(Some(s)) => s,
            Ok(None) => continue,
            Err(ResolveError::Internal(message)) => {
                debug!(error = %message, "skipping unresolvable superclass");
                continue;
            }
            Err(err) => return Err(err),
        };
        if let Some(found) = find_member(project, superclass, symbol, ref_kind, depth + 1)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn member_in_element_lists(
    project: &Project,
    class: Step,
    symbol: &str,
) -> Result<Option<Step>, ResolveError> {
    let document = project
        .document(class.document)
        .ok_or_else(|| ResolveError::Internal("document vanished during walk".into()))?;
    let Some(class_node) = document.node(class.node) else {
        return Err(ResolveError::InvariantViolated(
            "class node does not belong to its document tree".into(),
        ));
    };
    let Some(specifier) = class_node.child_by_field(Field::ClassSpecifier) else {
        return Ok(None);
    };
    for list in specifier.children().filter(|c| helpers::is_element_list(*c)) {
        for element in list
            .children()
            .filter(|c| c.kind() == SyntaxKind::NamedElement)
        {
            if !helpers::declared_identifiers(element)
                .iter()
                .any(|name| name == symbol)
            {
                continue;
            }
            // First match in document order wins.
            let step = match element.child_by_field(Field::ClassDefinition) {
                Some(class_def) => Step {
                    document: class.document,
                    node: class_def.id(),
                    kind: RefKind::Class,
                },
                None => match element.child_by_field(Field::ComponentClause) {
                    Some(clause) => Step {
                        document: class.document,
                        node: clause.id(),
                        kind: RefKind::Variable,
                    },
                    None => continue,
                },
            };
            return Ok(Some(step));
        }
    }
    Ok(None)
}

fn collect_extends_clauses(project: &Project, class: Step) -> Result<Vec<NodeId>, ResolveError> {
    let document = project
        .document(class.document)
        .ok_or_else(|| ResolveError::Internal("document vanished during walk".into()))?;
    let Some(class_node) = document.node(class.node) else {
        return Ok(Vec::new());
    };
    let Some(specifier) = class_node.child_by_field(Field::ClassSpecifier) else {
        return Ok(Vec::new());
    };
    let mut clauses = Vec::new();
    for list in specifier.children().filter(|c| helpers::is_element_list(*c)) {
        for element in list
            .children()
            .filter(|c| c.kind() == SyntaxKind::ExtendsClause)
        {
            clauses.push(element.id());
        }
    }
    Ok(clauses)
}

/// Resolve the type specifier of an `extends` clause to a class.
fn resolve_superclass(
    project: &mut Project,
    document_id: DocumentId,
    clause: NodeId,
    depth: usize,
) -> Result<Option<Step>, ResolveError> {
    let (symbols, global) = {
        let document = project
            .document(document_id)
            .ok_or_else(|| ResolveError::Internal("document vanished during walk".into()))?;
        let Some(node) = document.node(clause) else {
            return Ok(None);
        };
        let Some((idents, global)) = helpers::type_specifier_path(node) else {
            return Ok(None);
        };
        let symbols: Vec<String> = idents.iter().map(|n| n.text().to_string()).collect();
        (symbols, global)
    };
    if symbols.is_empty() {
        return Ok(None);
    }
    let reference = if global {
        UnresolvedReference::Absolute(AbsoluteReference::new(symbols, Some(RefKind::Class))?)
    } else {
        UnresolvedReference::Relative(RelativeReference::new(
            symbols,
            Some(RefKind::Class),
            document_id,
            clause,
        )?)
    };
    Ok(resolve_inner(project, &reference, depth + 1)?.map(|resolved| Step {
        document: resolved.document,
        node: resolved.node,
        kind: resolved.kind,
    }))
}

// ----------------------------------------------------------------------
// Type-lookup (variable → class promotion)
// ----------------------------------------------------------------------

/// Follow a variable step into its declared class, so member access can
/// continue. Fails for builtin scalar types, which no library declares.
fn type_lookup(
    project: &mut Project,
    variable: Step,
    depth: usize,
) -> Result<Option<Step>, ResolveError> {
    let (symbols, global, anchor) = {
        let document = project
            .document(variable.document)
            .ok_or_else(|| ResolveError::Internal("document vanished during walk".into()))?;
        let Some(node) = document.node(variable.node) else {
            return Err(ResolveError::InvariantViolated(
                "variable node does not belong to its document tree".into(),
            ));
        };
        let clause = match node.kind() {
            SyntaxKind::ComponentClause => Some(node),
            SyntaxKind::NamedElement | SyntaxKind::ComponentRedeclaration => {
                node.child_by_field(Field::ComponentClause)
            }
            SyntaxKind::Declaration | SyntaxKind::ComponentDeclaration => {
                helpers::find_parent(node, |n| n.kind() == SyntaxKind::ComponentClause)
            }
            _ => None,
        };
        let Some(clause) = clause else {
            return Ok(None);
        };
        let Some((idents, global)) = helpers::type_specifier_path(clause) else {
            return Ok(None);
        };
        let symbols: Vec<String> = idents.iter().map(|n| n.text().to_string()).collect();
        (symbols, global, clause.id())
    };
    if symbols.is_empty() {
        return Ok(None);
    }
    if symbols.len() == 1 && is_builtin_type(&symbols[0]) {
        debug!(type_name = %symbols[0], "builtin type stops the walk");
        return Ok(None);
    }
    let reference = if global {
        UnresolvedReference::Absolute(AbsoluteReference::new(symbols, Some(RefKind::Class))?)
    } else {
        UnresolvedReference::Relative(RelativeReference::new(
            symbols,
            Some(RefKind::Class),
            variable.document,
            anchor,
        )?)
    };
    Ok(resolve_inner(project, &reference, depth + 1)?.map(|resolved| Step {
        document: resolved.document,
        node: resolved.node,
        kind: resolved.kind,
    }))
}

// ----------------------------------------------------------------------
// Relative references: candidate generation and resolution
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Candidate {
    symbols: Vec<String>,
    kind: Option<RefKind>,
    from_wildcard: bool,
}

fn resolve_relative(
    project: &mut Project,
    reference: &RelativeReference,
    depth: usize,
) -> Result<Option<ResolvedReference>, ResolveError> {
    let candidates = generate_candidates(project, reference)?;
    for candidate in candidates {
        debug!(
            candidate = %candidate.symbols.join("."),
            wildcard = candidate.from_wildcard,
            "trying candidate"
        );
        match resolve_absolute(project, &candidate.symbols, candidate.kind, depth + 1) {
            Ok(Some(resolved)) => return Ok(Some(resolved)),
            Ok(None) => continue,
            // A broken sibling file fails this candidate, not the lookup.
            Err(ResolveError::Internal(message)) => {
                debug!(error = %message, "candidate failed internally");
                continue;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}

/// Enumerate candidate absolute references for a relative reference, in
/// resolution order: per scope level from the anchor outward, local
/// declarations, then the members of the innermost enclosing class, then
/// import clauses visible at that level; finally the enclosing-package
/// prefixes of the file's within path, longest first, down to the bare
/// symbols. Inner scopes shadow imports; imports shadow outer scopes.
///
/// Generation is pure over the anchor document's tree; superclass-inherited
/// members surface when the enclosing-class candidate is resolved by the
/// walk (which searches superclasses itself).
fn generate_candidates(
    project: &Project,
    reference: &RelativeReference,
) -> Result<Vec<Candidate>, ResolveError> {
    let document = project
        .document(reference.document())
        .ok_or_else(|| {
            ResolveError::InvariantViolated("relative reference to an unknown document".into())
        })?;
    let anchor = document.node(reference.node()).ok_or_else(|| {
        ResolveError::InvariantViolated("anchor node does not belong to the document tree".into())
    })?;

    let symbols = reference.symbols();
    let first = &symbols[0];
    let kind = reference.kind();
    let within = document.within_path();

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();

    // The anchor itself may be the declaration of the first symbol.
    if (helpers::is_definition(anchor) || helpers::is_variable_declaration(anchor))
        && declares(anchor, first)
    {
        let path = join_path(&scope_class_path(within, anchor), symbols);
        push_candidate(&mut candidates, &mut seen, path, kind, false);
    }

    let mut node = anchor;
    loop {
        // Direct children declaring the first symbol, honoring the kind
        // filter: class searches only consider class definitions, variable
        // searches only component declarations.
        if let Some(child) = node.children().find(|c| child_matches(*c, first, kind)) {
            let path = join_path(&scope_class_path(within, child), symbols);
            push_candidate(&mut candidates, &mut seen, path, kind, false);
        }

        // Members (own and inherited) of the innermost enclosing class.
        if let Some(class) = enclosing_class_inclusive(node) {
            let mut class_path = scope_class_path(within, class);
            if let Some(ident) = helpers::class_definition_identifier(class) {
                class_path.push(ident.text().to_string());
            }
            let path = join_path(&class_path, symbols);
            push_candidate(&mut candidates, &mut seen, path, kind, false);
        }

        // Import clauses that are siblings of this node.
        let Some(parent) = node.parent() else {
            break;
        };
        for import in parent
            .children()
            .filter(|c| c.kind() == SyntaxKind::ImportClause)
        {
            if let Some(candidate) = import_candidate(import, symbols, kind) {
                push_candidate(
                    &mut candidates,
                    &mut seen,
                    candidate.symbols,
                    candidate.kind,
                    candidate.from_wildcard,
                );
            }
        }
        node = parent;
    }

    // Enclosing package prefixes, innermost first, ending with the bare
    // symbols interpreted from the library roots.
    for len in (0..=within.len()).rev() {
        let path = join_path(&within[..len], symbols);
        push_candidate(&mut candidates, &mut seen, path, kind, false);
    }

    Ok(candidates)
}

fn push_candidate(
    candidates: &mut Vec<Candidate>,
    seen: &mut HashSet<Vec<String>>,
    symbols: Vec<String>,
    kind: Option<RefKind>,
    from_wildcard: bool,
) {
    if seen.insert(symbols.clone()) {
        candidates.push(Candidate {
            symbols,
            kind,
            from_wildcard,
        });
    }
}

fn join_path(prefix: &[String], symbols: &[String]) -> Vec<String> {
    let mut path = prefix.to_vec();
    path.extend(symbols.iter().cloned());
    path
}

fn declares(node: SyntaxNode<'_>, symbol: &str) -> bool {
    helpers::declared_identifiers(node)
        .iter()
        .any(|name| name == symbol)
}

fn child_matches(child: SyntaxNode<'_>, symbol: &str, kind: Option<RefKind>) -> bool {
    let kind_ok = match kind {
        Some(RefKind::Class) => helpers::is_definition(child),
        Some(RefKind::Variable) => helpers::is_variable_declaration(child),
        None => helpers::is_definition(child) || helpers::is_variable_declaration(child),
    };
    kind_ok && declares(child, symbol)
}

/// Names of the class definitions strictly enclosing `node`, prefixed with
/// the document's within path: the scope the node's declarations land in.
fn scope_class_path(within: &[String], node: SyntaxNode<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        if helpers::is_definition(n) {
            if let Some(ident) = helpers::class_definition_identifier(n) {
                names.push(ident.text().to_string());
            }
        }
        current = n.parent();
    }
    names.reverse();
    let mut path = within.to_vec();
    path.extend(names);
    path
}

fn enclosing_class_inclusive<'t>(node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if helpers::is_definition(node) {
        Some(node)
    } else {
        helpers::find_parent(node, helpers::is_definition)
    }
}

/// Interpret one import clause against the symbols being resolved. At most
/// one of the four forms matches per clause.
fn import_candidate(
    import: SyntaxNode<'_>,
    symbols: &[String],
    kind: Option<RefKind>,
) -> Option<Candidate> {
    let name = import.child_by_field(Field::Name)?;
    let target: Vec<String> = helpers::name_identifiers(name)
        .iter()
        .map(|n| n.text().to_string())
        .collect();
    if target.is_empty() {
        return None;
    }

    // `import A.B.*` — anything may come from A.B; existence is verified
    // when the candidate is resolved.
    if import.child_by_field(Field::Wildcard).is_some() {
        return Some(Candidate {
            symbols: join_path(&target, symbols),
            kind,
            from_wildcard: true,
        });
    }

    // `import z = A.B.C`
    if let Some(alias) = import.child_by_field(Field::Alias) {
        if alias.text() == symbols[0] {
            let mut path = target;
            path.extend(symbols[1..].iter().cloned());
            return Some(Candidate {
                symbols: path,
                kind,
                from_wildcard: false,
            });
        }
        return None;
    }

    // `import A.B.{x, y, z}`
    if let Some(imports) = import.child_by_field(Field::Imports) {
        if imports.named_children().any(|n| n.text() == symbols[0]) {
            return Some(Candidate {
                symbols: join_path(&target, symbols),
                kind,
                from_wildcard: false,
            });
        }
        return None;
    }

    // `import A.B.C` — the imported class is usable under its last name.
    if target.last().map(|s| s.as_str()) == Some(symbols[0].as_str()) {
        let mut path = target;
        path.extend(symbols[1..].iter().cloned());
        return Some(Candidate {
            symbols: path,
            kind,
            from_wildcard: false,
        });
    }
    None
}

// ----------------------------------------------------------------------
// Reference identification at a cursor
// ----------------------------------------------------------------------

/// Identify the reference under a cursor position, if any.
///
/// Identifiers starting strictly after the cursor are dropped, so a cursor
/// mid-way through `A.B.C` resolves the prefix it touches.
pub fn reference_at(document: &Document, position: Position) -> Option<UnresolvedReference> {
    let offset = document.offset_at(position);
    let root = document.tree().root();

    // Type-position names first.
    if let Some(name) =
        helpers::deepest_at_offset(root, offset, |n| n.kind() == SyntaxKind::Name)
    {
        let lifted = name
            .parent()
            .filter(|p| p.kind() == SyntaxKind::TypeSpecifier)
            .unwrap_or(name);
        let symbols = identifier_prefix(&helpers::name_identifiers(name), offset);
        if !symbols.is_empty() {
            let global = lifted.kind() == SyntaxKind::TypeSpecifier
                && lifted.child_by_field(Field::Global).is_some();
            return Some(if global {
                UnresolvedReference::Absolute(
                    AbsoluteReference::new(symbols, Some(RefKind::Class)).ok()?,
                )
            } else {
                UnresolvedReference::Relative(
                    RelativeReference::new(
                        symbols,
                        Some(RefKind::Class),
                        document.id(),
                        lifted.id(),
                    )
                    .ok()?,
                )
            });
        }
    }

    // Value-position component references.
    if let Some(reference) = helpers::deepest_at_offset(root, offset, |n| {
        n.kind() == SyntaxKind::ComponentReference
    }) {
        let symbols =
            identifier_prefix(&helpers::component_reference_identifiers(reference), offset);
        if !symbols.is_empty() {
            let global = reference.child_by_field(Field::Global).is_some();
            return Some(if global {
                UnresolvedReference::Absolute(
                    AbsoluteReference::new(symbols, Some(RefKind::Variable)).ok()?,
                )
            } else {
                UnresolvedReference::Relative(
                    RelativeReference::new(
                        symbols,
                        Some(RefKind::Variable),
                        document.id(),
                        reference.id(),
                    )
                    .ok()?,
                )
            });
        }
    }

    // Any other identifier (declaration names, enum literals).
    if let Some(ident) =
        helpers::deepest_at_offset(root, offset, |n| n.kind() == SyntaxKind::Ident)
    {
        return Some(UnresolvedReference::Relative(
            RelativeReference::new(
                vec![ident.text().to_string()],
                None,
                document.id(),
                ident.id(),
            )
            .ok()?,
        ));
    }

    None
}

/// The identifier texts whose start does not lie strictly after the cursor.
fn identifier_prefix(identifiers: &[SyntaxNode<'_>], offset: usize) -> Vec<String> {
    identifiers
        .iter()
        .filter(|n| n.start_byte() <= offset)
        .map(|n| n.text().to_string())
        .collect()
}
