//! Arena-backed concrete syntax tree
//!
//! Nodes are stored in a flat arena owned by the tree; a [`SyntaxNode`] is a
//! cheap copyable handle (tree reference + index). Handles are valid only
//! for the tree that produced them — any reparse invalidates them, so
//! long-lived data must store positions, not handles.

use std::sync::Arc;

use crate::base::{Position, Span};

use super::field::Field;
use super::kind::SyntaxKind;

/// Index of a node within its tree's arena. The default id addresses the
/// root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(u32);

impl NodeId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct NodeData {
    kind: SyntaxKind,
    field: Option<Field>,
    start: usize,
    end: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed syntax tree together with the text it was parsed from.
#[derive(Debug)]
pub struct SyntaxTree {
    text: Arc<str>,
    nodes: Vec<NodeData>,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    /// The source text this tree was built from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The root node (always `stored_definitions`).
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Re-obtain a handle from a stored id. Returns `None` if the id does
    /// not belong to this tree.
    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        if (id.0 as usize) < self.nodes.len() {
            Some(SyntaxNode { tree: self, id })
        } else {
            None
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Map a (line, byte column) position to a byte offset. Positions past
    /// the end of a line or of the text clamp to the nearest valid offset.
    pub fn offset_at(&self, position: Position) -> usize {
        if position.line >= self.line_starts.len() {
            return self.text.len();
        }
        let line_start = self.line_starts[position.line];
        let line_end = self
            .line_starts
            .get(position.line + 1)
            .copied()
            .unwrap_or(self.text.len());
        (line_start + position.column).min(line_end)
    }

    /// Map a byte offset to a (line, byte column) position.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line, offset - self.line_starts[line])
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }
}

/// A handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    /// The field tag this node carries within its parent, if any.
    pub fn field(&self) -> Option<Field> {
        self.tree.data(self.id).field
    }

    pub fn start_byte(&self) -> usize {
        self.tree.data(self.id).start
    }

    pub fn end_byte(&self) -> usize {
        self.tree.data(self.id).end
    }

    pub fn start_position(&self) -> Position {
        self.tree.position_at(self.start_byte())
    }

    pub fn end_position(&self) -> Position {
        self.tree.position_at(self.end_byte())
    }

    pub fn span(&self) -> Span {
        Span::new(self.start_position(), self.end_position())
    }

    /// The source text covered by this node.
    pub fn text(&self) -> &'t str {
        &self.tree.text[self.start_byte()..self.end_byte()]
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.tree
            .data(self.id)
            .parent
            .map(|id| SyntaxNode { tree: self.tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn children(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    /// Children whose kind participates in named traversal (composite nodes
    /// and identifiers; keywords and punctuation are skipped).
    pub fn named_children(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.children().filter(|c| c.kind().is_named())
    }

    /// The first child carrying the given field tag.
    pub fn child_by_field(self, field: Field) -> Option<SyntaxNode<'t>> {
        self.children().find(|c| c.field() == Some(field))
    }

    /// Children carrying the given field tag, in document order.
    pub fn children_by_field(self, field: Field) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.children().filter(move |c| c.field() == Some(field))
    }

    /// Whether `offset` lies within this node (inclusive of the end, so a
    /// cursor sitting just past the last character still counts).
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start_byte() <= offset && offset <= self.end_byte()
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.kind().name(),
            self.start_byte(),
            self.end_byte()
        )
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

/// Checkpoint for retroactive node wrapping (see [`TreeBuilder::checkpoint`]).
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    node: NodeId,
    child_index: usize,
}

/// Incremental construction of a [`SyntaxTree`].
///
/// Mirrors the start/finish protocol of rowan's green-node builder, with a
/// checkpoint mechanism for wrapping already-built children (used for
/// left-recursive rules such as qualified names).
pub struct TreeBuilder {
    text: Arc<str>,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    /// Offset reached by the most recently added token.
    cursor: usize,
}

impl TreeBuilder {
    pub fn new(text: &str) -> Self {
        let text: Arc<str> = Arc::from(text);
        let root = NodeData {
            kind: SyntaxKind::StoredDefinitions,
            field: None,
            start: 0,
            end: text.len(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            text,
            nodes: vec![root],
            stack: vec![NodeId(0)],
            cursor: 0,
        }
    }

    fn top(&self) -> NodeId {
        *self.stack.last().expect("builder stack is never empty")
    }

    /// Open a composite node. Its range is derived from its children when
    /// finished.
    pub fn start_node(&mut self, kind: SyntaxKind, field: Option<Field>) {
        let parent = self.top();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            field,
            start: self.cursor,
            end: self.cursor,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        self.stack.push(id);
    }

    /// Close the innermost open node, fixing its range to cover its children.
    pub fn finish_node(&mut self) {
        let id = self.stack.pop().expect("finish_node without start_node");
        let (start, end) = {
            let data = &self.nodes[id.0 as usize];
            let start = data
                .children
                .first()
                .map(|&c| self.nodes[c.0 as usize].start)
                .unwrap_or(data.start);
            let end = data
                .children
                .last()
                .map(|&c| self.nodes[c.0 as usize].end)
                .unwrap_or(data.end);
            (start, end)
        };
        let data = &mut self.nodes[id.0 as usize];
        data.start = start;
        data.end = end.max(start);
    }

    /// Add a leaf token to the innermost open node.
    pub fn token(&mut self, kind: SyntaxKind, field: Option<Field>, start: usize, end: usize) {
        let parent = self.top();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            field,
            start,
            end,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        self.cursor = end;
    }

    /// Remember the current position in the open node's child list.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            node: self.top(),
            child_index: self.nodes[self.top().0 as usize].children.len(),
        }
    }

    /// Open a node that adopts every child added since `checkpoint`.
    /// The adopted children keep their order; the new node is left open.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind, field: Option<Field>) {
        assert_eq!(
            checkpoint.node,
            self.top(),
            "checkpoint must target the innermost open node"
        );
        let parent = checkpoint.node;
        let adopted: Vec<NodeId> = self.nodes[parent.0 as usize]
            .children
            .split_off(checkpoint.child_index);

        let id = NodeId(self.nodes.len() as u32);
        let start = adopted
            .first()
            .map(|&c| self.nodes[c.0 as usize].start)
            .unwrap_or(self.cursor);
        self.nodes.push(NodeData {
            kind,
            field,
            start,
            end: self.cursor,
            parent: Some(parent),
            children: adopted.clone(),
        });
        for &child in &adopted {
            self.nodes[child.0 as usize].parent = Some(id);
        }
        self.nodes[parent.0 as usize].children.push(id);
        self.stack.push(id);
    }

    /// Re-tag the field of the most recently added child of the open node.
    pub fn set_last_field(&mut self, field: Field) {
        let top = self.top();
        if let Some(&last) = self.nodes[top.0 as usize].children.last() {
            self.nodes[last.0 as usize].field = Some(field);
        }
    }

    pub fn finish(mut self) -> SyntaxTree {
        while self.stack.len() > 1 {
            self.finish_node();
        }
        self.stack.pop();
        // Root always spans the whole text.
        let len = self.text.len();
        self.nodes[0].start = 0;
        self.nodes[0].end = len;

        let line_starts = compute_line_starts(&self.text);
        SyntaxTree {
            text: self.text,
            nodes: self.nodes,
            line_starts,
        }
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let builder = TreeBuilder::new("ab\ncd\n\nx");
        let tree = builder.finish();
        assert_eq!(tree.line_count(), 4);
        assert_eq!(tree.offset_at(Position::new(0, 0)), 0);
        assert_eq!(tree.offset_at(Position::new(1, 1)), 4);
        assert_eq!(tree.offset_at(Position::new(3, 0)), 7);
        assert_eq!(tree.position_at(4), Position::new(1, 1));
        assert_eq!(tree.position_at(3), Position::new(1, 0));
        assert_eq!(tree.position_at(6), Position::new(2, 0));
        // Column past the line end clamps to the line break.
        assert_eq!(tree.offset_at(Position::new(0, 99)), 3);
    }

    #[test]
    fn test_builder_ranges_and_parents() {
        let mut b = TreeBuilder::new("a.b");
        b.start_node(SyntaxKind::Name, None);
        b.token(SyntaxKind::Ident, Some(Field::Identifier), 0, 1);
        b.token(SyntaxKind::Dot, None, 1, 2);
        b.token(SyntaxKind::Ident, None, 2, 3);
        b.finish_node();
        let tree = b.finish();

        let root = tree.root();
        assert_eq!(root.kind(), SyntaxKind::StoredDefinitions);
        let name = root.children().next().unwrap();
        assert_eq!(name.kind(), SyntaxKind::Name);
        assert_eq!(name.start_byte(), 0);
        assert_eq!(name.end_byte(), 3);
        assert_eq!(name.text(), "a.b");
        assert_eq!(name.child_count(), 3);
        assert_eq!(
            name.child_by_field(Field::Identifier).unwrap().text(),
            "a"
        );
        let ident = name.children().next().unwrap();
        assert_eq!(ident.parent().unwrap(), name);
        assert_eq!(name.parent().unwrap(), root);
    }

    #[test]
    fn test_checkpoint_wrapping() {
        // Build name(name(a) . b) via checkpoint adoption.
        let mut b = TreeBuilder::new("a.b");
        let cp = b.checkpoint();
        b.start_node(SyntaxKind::Name, None);
        b.token(SyntaxKind::Ident, Some(Field::Identifier), 0, 1);
        b.finish_node();
        b.start_node_at(cp, SyntaxKind::Name, None);
        b.set_last_field(Field::Qualifier);
        b.token(SyntaxKind::Dot, None, 1, 2);
        b.token(SyntaxKind::Ident, Some(Field::Identifier), 2, 3);
        b.finish_node();
        let tree = b.finish();

        let outer = tree.root().children().next().unwrap();
        assert_eq!(outer.kind(), SyntaxKind::Name);
        assert_eq!(outer.text(), "a.b");
        let qualifier = outer.child_by_field(Field::Qualifier).unwrap();
        assert_eq!(qualifier.kind(), SyntaxKind::Name);
        assert_eq!(qualifier.text(), "a");
        assert_eq!(qualifier.parent().unwrap(), outer);
        assert_eq!(
            outer.child_by_field(Field::Identifier).unwrap().text(),
            "b"
        );
    }
}
