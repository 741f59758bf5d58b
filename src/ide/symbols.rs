//! Declared-class listing for document outlines.

use std::path::Path;

use crate::base::Span;
use crate::project::Project;
use crate::semantic::helpers;
use crate::syntax::{Field, SyntaxKind, SyntaxNode};

/// A class declared in a document, for the outline view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSymbol {
    /// Simple class name.
    pub name: String,
    /// The Modelica class kind (package, model, function, …).
    pub kind: ClassKind,
    /// Full range of the class definition.
    pub span: Span,
    /// Range of the declared identifier.
    pub selection: Span,
}

/// The flavor of a class definition, from its class prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Block,
    Class,
    Connector,
    Function,
    Model,
    Operator,
    Package,
    Record,
    Type,
}

/// Flatten the class names declared in the document at `path`, in document
/// order, nested classes included. Returns `None` when the document is not
/// loaded.
pub fn declarations_for_path(project: &Project, path: &Path) -> Option<Vec<DeclaredSymbol>> {
    let document = project.get_document(path)?;
    let mut symbols = Vec::new();
    helpers::for_each(document.tree().root(), |node| {
        if node.kind() == SyntaxKind::ClassDefinition {
            if let Some(symbol) = declared_symbol(node) {
                symbols.push(symbol);
            }
        }
        true
    });
    Some(symbols)
}

fn declared_symbol(class: SyntaxNode<'_>) -> Option<DeclaredSymbol> {
    let identifier = helpers::class_definition_identifier(class)?;
    Some(DeclaredSymbol {
        name: identifier.text().to_string(),
        kind: class_kind(class),
        span: class.span(),
        selection: identifier.span(),
    })
}

fn class_kind(class: SyntaxNode<'_>) -> ClassKind {
    let Some(prefixes) = class.child_by_field(Field::ClassPrefixes) else {
        return ClassKind::Class;
    };
    let mut kind = ClassKind::Class;
    for token in prefixes.children() {
        kind = match token.kind() {
            SyntaxKind::PackageKw => ClassKind::Package,
            SyntaxKind::ModelKw => ClassKind::Model,
            SyntaxKind::RecordKw => ClassKind::Record,
            SyntaxKind::BlockKw => ClassKind::Block,
            SyntaxKind::ConnectorKw => ClassKind::Connector,
            SyntaxKind::TypeKw => ClassKind::Type,
            SyntaxKind::FunctionKw => ClassKind::Function,
            SyntaxKind::OperatorKw => ClassKind::Operator,
            _ => continue,
        };
        // `operator record` and `operator function` report the trailing kind
        if kind != ClassKind::Operator {
            break;
        }
    }
    kind
}
