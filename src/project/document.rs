//! A parsed text document
//!
//! Owns the text buffer (via its syntax tree, which carries the text it was
//! parsed from — the two can never drift apart), the package path implied
//! by the file's location under its library, and the update operations.
//! Syntax nodes are ephemeral: every update produces a fresh tree and
//! invalidates outstanding node ids.

use std::path::{Path, PathBuf};

use crate::base::{DocumentId, LibraryId, Position, Span};
use crate::semantic::helpers;
use crate::syntax::{Field, NodeId, Parse, ParseError, Parser, SyntaxKind, SyntaxNode, SyntaxTree};

#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    library: LibraryId,
    path: PathBuf,
    uri: String,
    package_path: Vec<String>,
    version: u64,
    tree: SyntaxTree,
    errors: Vec<ParseError>,
}

impl Document {
    pub(crate) fn new(
        parser: &mut Parser,
        id: DocumentId,
        library: LibraryId,
        path: PathBuf,
        package_path: Vec<String>,
        text: &str,
    ) -> Self {
        let Parse { tree, errors } = parser.parse(text, None);
        let uri = format!("file://{}", path.display());
        Self {
            id,
            library,
            path,
            uri,
            package_path,
            version: 0,
            tree,
            errors,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn library(&self) -> LibraryId {
        self.library
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn text(&self) -> &str {
        self.tree.text()
    }

    /// Monotonic update counter; strictly increasing across updates.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        self.tree.node(id)
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn line_count(&self) -> usize {
        self.tree.line_count()
    }

    pub fn offset_at(&self, position: Position) -> usize {
        self.tree.offset_at(position)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.tree.position_at(offset)
    }

    /// The dotted name of the class this file defines, derived from its
    /// location under the library root. Stable across edits.
    pub fn package_path(&self) -> &[String] {
        &self.package_path
    }

    /// The enclosing package of the file's top-level class: the package
    /// path minus its last component.
    pub fn within_path(&self) -> &[String] {
        &self.package_path[..self.package_path.len().saturating_sub(1)]
    }

    /// The dotted name written in the file's `within` clause, if any.
    /// Resolution trusts the filesystem-derived package path instead; this
    /// is only consulted when deciding whether a loose file can stand alone.
    pub fn within_clause(&self) -> Option<String> {
        let clause = self
            .tree
            .root()
            .children()
            .find(|c| c.kind() == SyntaxKind::WithinClause)?;
        clause
            .child_by_field(Field::Name)
            .map(|name| name.text().to_string())
    }

    /// Replace the whole buffer, or splice `text` into `range`, and reparse.
    /// The previous tree is handed to the parser as a reparse hint.
    pub fn update(&mut self, parser: &mut Parser, text: &str, range: Option<Span>) {
        let new_text = match range {
            None => text.to_string(),
            Some(span) => {
                let start_offset = self.tree.offset_at(span.start);
                let old_end_offset = self.tree.offset_at(span.end).max(start_offset);
                let mut buffer = self.tree.text().to_string();
                buffer.replace_range(start_offset..old_end_offset, text);
                buffer
            }
        };
        let Parse { tree, errors } = parser.parse(&new_text, Some(&self.tree));
        self.tree = tree;
        self.errors = errors;
        self.version += 1;
    }

    /// The class definition node at the top level of this file that declares
    /// `name`, if any.
    pub fn top_level_class(&self, name: &str) -> Option<SyntaxNode<'_>> {
        self.tree
            .root()
            .children()
            .filter(|c| c.kind() == SyntaxKind::StoredDefinition)
            .filter_map(|sd| sd.child_by_field(Field::ClassDefinition))
            .find(|class| {
                helpers::class_definition_identifier(*class)
                    .map(|ident| ident.text() == name)
                    .unwrap_or(false)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(text: &str) -> Document {
        let mut parser = Parser::new();
        Document::new(
            &mut parser,
            DocumentId::new(0),
            LibraryId::new(0),
            PathBuf::from("/lib/TestLibrary/Constants.mo"),
            vec!["TestLibrary".to_string(), "Constants".to_string()],
            text,
        )
    }

    #[test]
    fn test_within_path() {
        let doc = document("within TestLibrary;\npackage Constants\nend Constants;\n");
        assert_eq!(doc.package_path(), ["TestLibrary", "Constants"]);
        assert_eq!(doc.within_path(), ["TestLibrary"]);
        assert_eq!(doc.within_clause().as_deref(), Some("TestLibrary"));
    }

    #[test]
    fn test_full_update_bumps_version() {
        let mut parser = Parser::new();
        let mut doc = document("package Constants\nend Constants;\n");
        assert_eq!(doc.version(), 0);
        doc.update(&mut parser, "package Renamed\nend Renamed;\n", None);
        assert_eq!(doc.version(), 1);
        assert!(doc.top_level_class("Renamed").is_some());
        assert!(doc.top_level_class("Constants").is_none());
    }

    #[test]
    fn test_incremental_update_splices() {
        let mut parser = Parser::new();
        let mut doc = document("package Constants\n  constant Real e = 2.7;\nend Constants;\n");
        // replace "2.7" on line 1, columns 20..23
        doc.update(
            &mut parser,
            "2.71828",
            Some(Span::from_coords(1, 20, 1, 23)),
        );
        assert_eq!(doc.version(), 1);
        assert!(doc.text().contains("constant Real e = 2.71828;"));
        assert!(doc.parse_errors().is_empty());
    }

    #[test]
    fn test_top_level_class() {
        let doc = document("within TestLibrary;\npackage Constants\nend Constants;\n");
        let class = doc.top_level_class("Constants").unwrap();
        assert!(helpers::is_definition(class));
        assert!(doc.top_level_class("Other").is_none());
    }
}
