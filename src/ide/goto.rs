//! Go-to-declaration implementation.

use std::path::{Path, PathBuf};

use crate::base::{Position, Span};
use crate::project::Project;
use crate::semantic::helpers;
use crate::semantic::{
    reference_at, resolve_reference, RefKind, Resolution, ResolveError,
};
use crate::syntax::{Field, SyntaxKind, SyntaxNode};

/// Where a declaration lives, as positions (not node handles): the result
/// stays valid after the originating trees are reparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationLocation {
    /// File containing the declaration.
    pub path: PathBuf,
    /// URI of that file.
    pub uri: String,
    /// Full range of the declaring node.
    pub span: Span,
    /// Range of the declared identifier within it.
    pub selection: Span,
    /// The absolute symbol path that was resolved.
    pub symbols: Vec<String>,
    /// Whether the declaration is a class or a variable.
    pub kind: RefKind,
}

/// Find the declaration of the symbol under the cursor.
///
/// Returns `Ok(None)` when there is no reference at the cursor or the
/// reference does not resolve.
pub fn find_declaration(
    project: &mut Project,
    path: &Path,
    position: Position,
) -> Result<Option<DeclarationLocation>, ResolveError> {
    let document_id = match project
        .get_or_load_document(path)
        .map_err(|e| ResolveError::Internal(e.to_string()))?
    {
        Some(id) => id,
        None => return Ok(None),
    };

    let reference = {
        let document = project
            .document(document_id)
            .ok_or_else(|| ResolveError::Internal("document vanished".into()))?;
        match reference_at(document, position) {
            Some(reference) => reference,
            None => return Ok(None),
        }
    };

    let Some(resolved) = resolve_reference(project, &reference, Resolution::Declaration)? else {
        return Ok(None);
    };

    let document = project
        .document(resolved.document)
        .ok_or_else(|| ResolveError::Internal("resolved document vanished".into()))?;
    let node = document.node(resolved.node).ok_or_else(|| {
        ResolveError::Internal("resolved node does not belong to its document".into())
    })?;
    let Some(last) = resolved.symbols.last() else {
        return Err(ResolveError::Internal(
            "resolved reference with empty path".into(),
        ));
    };
    let selection = declared_identifier(node, last)
        .map(|n| n.span())
        .unwrap_or_else(|| node.span());

    Ok(Some(DeclarationLocation {
        path: document.path().to_path_buf(),
        uri: document.uri().to_string(),
        span: node.span(),
        selection,
        symbols: resolved.symbols,
        kind: resolved.kind,
    }))
}

/// The identifier node within a declaring node that declares `name`.
fn declared_identifier<'t>(node: SyntaxNode<'t>, name: &str) -> Option<SyntaxNode<'t>> {
    match node.kind() {
        SyntaxKind::ClassDefinition => helpers::class_definition_identifier(node),
        SyntaxKind::ComponentClause | SyntaxKind::ComponentRedeclaration => {
            helpers::find_first(node, |n| {
                n.kind() == SyntaxKind::Declaration
                    && n.child_by_field(Field::Identifier)
                        .map(|i| i.text() == name)
                        .unwrap_or(false)
            })
            .and_then(|decl| decl.child_by_field(Field::Identifier))
        }
        _ => None,
    }
}
