//! Recursive-descent parser for the Modelica grammar subset
//!
//! Produces a [`SyntaxTree`] over the token stream of [`super::lexer`].
//! The parser is error-tolerant: unparseable stretches become `error` nodes
//! and are reported as positioned [`ParseError`]s, but a tree is always
//! produced.

use crate::base::Position;

use super::field::Field;
use super::kind::SyntaxKind;
use super::lexer::{tokenize, Token};
use super::tree::{SyntaxTree, TreeBuilder};

/// A positioned syntax error.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Result of one parser run.
#[derive(Debug)]
pub struct Parse {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
}

/// The parser. A single-owner resource: the project holds exactly one and
/// all documents are parsed through it.
#[derive(Debug, Default)]
pub struct Parser {
    _private: (),
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` into a syntax tree. The previous tree may be supplied as
    /// a reparse hint; the current implementation performs a full parse and
    /// the hint only preserves the incremental interface shape.
    pub fn parse(&mut self, text: &str, _old_tree: Option<&SyntaxTree>) -> Parse {
        let tokens = tokenize(text);
        let mut session = Session {
            text,
            tokens,
            pos: 0,
            builder: TreeBuilder::new(text),
            errors: Vec::new(),
        };
        session.stored_definitions();
        Parse {
            tree: session.builder.finish(),
            errors: session.errors,
        }
    }
}

use SyntaxKind as K;

/// Tokens that may start a class definition.
const CLASS_START: &[SyntaxKind] = &[
    K::EncapsulatedKw,
    K::PartialKw,
    K::ExpandableKw,
    K::PureKw,
    K::ImpureKw,
    K::OperatorKw,
    K::ClassKw,
    K::ModelKw,
    K::RecordKw,
    K::BlockKw,
    K::ConnectorKw,
    K::TypeKw,
    K::PackageKw,
    K::FunctionKw,
];

/// Keywords of a component type prefix.
const TYPE_PREFIX: &[SyntaxKind] = &[
    K::FlowKw,
    K::StreamKw,
    K::DiscreteKw,
    K::ParameterKw,
    K::ConstantKw,
    K::InputKw,
    K::OutputKw,
];

/// Tokens that end an element list.
const SECTION_START: &[SyntaxKind] = &[
    K::PublicKw,
    K::ProtectedKw,
    K::EquationKw,
    K::AlgorithmKw,
    K::InitialKw,
    K::ExternalKw,
    K::AnnotationKw,
    K::EndKw,
];

struct Session<'s> {
    text: &'s str,
    tokens: Vec<Token<'s>>,
    pos: usize,
    builder: TreeBuilder,
    errors: Vec<ParseError>,
}

impl<'s> Session<'s> {
    // ------------------------------------------------------------------
    // Token-stream primitives
    // ------------------------------------------------------------------

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(K::ErrorToken)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.eof() && self.nth(0) == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        !self.eof() && kinds.contains(&self.nth(0))
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.text.len())
    }

    fn bump(&mut self, field: Option<Field>) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder
                .token(token.kind, field, token.offset, token.end());
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump(None);
            true
        } else {
            false
        }
    }

    fn error_at_current(&mut self, message: impl Into<String>) {
        let position = position_of(self.text, self.current_offset());
        self.errors.push(ParseError {
            message: message.into(),
            position,
        });
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.at(kind) {
            self.bump(None);
            true
        } else {
            self.error_at_current(format!("expected {}", what));
            false
        }
    }

    /// Wrap unexpected tokens into an `error` node until one of `sync` (or
    /// EOF) is reached; a trailing semicolon is consumed.
    fn recover(&mut self, message: &str, sync: &[SyntaxKind]) {
        self.error_at_current(message);
        self.builder.start_node(K::Error, None);
        while !self.eof() && !self.at_any(sync) && !self.at(K::Semicolon) {
            self.bump(None);
        }
        self.eat(K::Semicolon);
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Stored definitions
    // ------------------------------------------------------------------

    /// Root production; the builder's root node is already open.
    fn stored_definitions(&mut self) {
        if self.at(K::WithinKw) {
            self.within_clause();
        }
        while !self.eof() {
            if self.at(K::FinalKw) || self.at_any(CLASS_START) {
                self.stored_definition();
            } else if self.at(K::ImportKw) {
                // Technically file-level imports are not standard Modelica,
                // but they appear in the wild and scope resolution uses them.
                self.import_clause();
                self.expect(K::Semicolon, "';' after import");
            } else {
                self.recover("expected class definition", CLASS_START);
            }
        }
    }

    fn within_clause(&mut self) {
        self.builder.start_node(K::WithinClause, None);
        self.bump(None); // within
        if self.at(K::Ident) {
            self.name();
            self.builder.set_last_field(Field::Name);
        }
        self.expect(K::Semicolon, "';' after within clause");
        self.builder.finish_node();
    }

    fn stored_definition(&mut self) {
        self.builder.start_node(K::StoredDefinition, None);
        self.eat(K::FinalKw);
        self.class_definition(Some(Field::ClassDefinition));
        self.expect(K::Semicolon, "';' after class definition");
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Class definitions
    // ------------------------------------------------------------------

    fn class_definition(&mut self, field: Option<Field>) {
        self.builder.start_node(K::ClassDefinition, field);
        self.eat(K::EncapsulatedKw);
        self.class_prefixes();
        self.class_specifier();
        self.builder.finish_node();
    }

    fn class_prefixes(&mut self) {
        self.builder
            .start_node(K::ClassPrefixes, Some(Field::ClassPrefixes));
        self.eat(K::PartialKw);
        // Accepts any combination of prefix keywords; invalid combinations
        // still produce a usable tree.
        while self.at_any(&[
            K::ExpandableKw,
            K::PureKw,
            K::ImpureKw,
            K::OperatorKw,
            K::ClassKw,
            K::ModelKw,
            K::RecordKw,
            K::BlockKw,
            K::ConnectorKw,
            K::TypeKw,
            K::PackageKw,
            K::FunctionKw,
        ]) {
            self.bump(None);
        }
        self.builder.finish_node();
    }

    fn class_specifier(&mut self) {
        if self.at(K::ExtendsKw) {
            self.extends_class_specifier();
        } else if self.at(K::Ident) && self.nth(1) == K::Eq {
            match self.nth(2) {
                K::EnumerationKw => self.enumeration_class_specifier(),
                K::DerKw => self.derivative_class_specifier(),
                _ => self.short_class_specifier(),
            }
        } else {
            self.long_class_specifier();
        }
    }

    fn long_class_specifier(&mut self) {
        self.builder
            .start_node(K::LongClassSpecifier, Some(Field::ClassSpecifier));
        if !self.at(K::Ident) {
            self.error_at_current("expected class name");
        } else {
            self.bump(Some(Field::Identifier));
        }
        if self.at(K::String) {
            self.description_string();
        }
        self.composition();
        self.expect(K::EndKw, "'end'");
        if self.at(K::Ident) {
            self.bump(Some(Field::EndIdentifier));
        }
        self.builder.finish_node();
    }

    /// `class extends Foo … end Foo` — redeclaration of an inherited class.
    fn extends_class_specifier(&mut self) {
        self.builder
            .start_node(K::ExtendsClassSpecifier, Some(Field::ClassSpecifier));
        self.bump(None); // extends
        if self.at(K::Ident) {
            self.bump(Some(Field::Identifier));
        } else {
            self.error_at_current("expected class name after 'class extends'");
        }
        if self.at(K::LParen) {
            self.class_modification();
        }
        if self.at(K::String) {
            self.description_string();
        }
        self.composition();
        self.expect(K::EndKw, "'end'");
        if self.at(K::Ident) {
            self.bump(Some(Field::EndIdentifier));
        }
        self.builder.finish_node();
    }

    fn short_class_specifier(&mut self) {
        self.builder
            .start_node(K::ShortClassSpecifier, Some(Field::ClassSpecifier));
        self.bump(Some(Field::Identifier));
        self.bump(None); // =
        while self.at_any(TYPE_PREFIX) {
            self.bump(None);
        }
        self.type_specifier(Some(Field::TypeSpecifier));
        if self.at(K::LBracket) {
            self.array_subscripts(Some(Field::Indices));
        }
        if self.at(K::LParen) {
            self.class_modification();
        }
        self.description();
        self.builder.finish_node();
    }

    fn enumeration_class_specifier(&mut self) {
        self.builder
            .start_node(K::EnumerationClassSpecifier, Some(Field::ClassSpecifier));
        self.bump(Some(Field::Identifier));
        self.bump(None); // =
        self.bump(None); // enumeration
        self.expect(K::LParen, "'(' after 'enumeration'");
        if self.at(K::Colon) {
            self.bump(None);
        } else {
            while self.at(K::Ident) {
                self.builder.start_node(K::EnumerationLiteral, None);
                self.bump(Some(Field::Identifier));
                self.description();
                self.builder.finish_node();
                if !self.eat(K::Comma) {
                    break;
                }
            }
        }
        self.expect(K::RParen, "')'");
        self.description();
        self.builder.finish_node();
    }

    fn derivative_class_specifier(&mut self) {
        self.builder
            .start_node(K::DerivativeClassSpecifier, Some(Field::ClassSpecifier));
        self.bump(Some(Field::Identifier));
        self.bump(None); // =
        self.bump(None); // der
        self.expect(K::LParen, "'('");
        if self.at(K::Ident) || self.at(K::Dot) {
            self.type_specifier(Some(Field::TypeSpecifier));
        }
        while self.eat(K::Comma) {
            if !self.at(K::Ident) {
                break;
            }
            self.bump(None);
        }
        self.expect(K::RParen, "')'");
        self.description();
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Composition and elements
    // ------------------------------------------------------------------

    fn composition(&mut self) {
        self.element_list(K::ElementList);
        loop {
            if self.at(K::PublicKw) {
                self.builder.start_node(K::PublicElementList, None);
                self.bump(None);
                self.elements();
                self.builder.finish_node();
            } else if self.at(K::ProtectedKw) {
                self.builder.start_node(K::ProtectedElementList, None);
                self.bump(None);
                self.elements();
                self.builder.finish_node();
            } else if self.at(K::EquationKw)
                || (self.at(K::InitialKw) && self.nth(1) == K::EquationKw)
            {
                self.equation_section();
            } else if self.at(K::AlgorithmKw)
                || (self.at(K::InitialKw) && self.nth(1) == K::AlgorithmKw)
            {
                self.algorithm_section();
            } else if self.at(K::ExternalKw) {
                self.external_clause();
            } else if self.at(K::AnnotationKw) {
                self.annotation();
                self.expect(K::Semicolon, "';' after annotation");
            } else {
                break;
            }
        }
    }

    fn element_list(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind, None);
        self.elements();
        self.builder.finish_node();
    }

    fn elements(&mut self) {
        while !self.eof() && !self.at_any(SECTION_START) {
            self.element();
        }
    }

    fn element(&mut self) {
        if self.at(K::ImportKw) {
            self.import_clause();
            self.expect(K::Semicolon, "';' after import");
            return;
        }
        if self.at(K::ExtendsKw) {
            self.extends_clause();
            self.expect(K::Semicolon, "';' after extends clause");
            return;
        }
        self.named_element();
    }

    fn named_element(&mut self) {
        self.builder.start_node(K::NamedElement, None);
        while self.at_any(&[
            K::RedeclareKw,
            K::FinalKw,
            K::InnerKw,
            K::OuterKw,
            K::ReplaceableKw,
        ]) {
            self.bump(None);
        }
        if self.at_any(CLASS_START) {
            self.class_definition(Some(Field::ClassDefinition));
        } else if self.at_any(TYPE_PREFIX) || self.at(K::Ident) || self.at(K::Dot) {
            self.component_clause(Some(Field::ComponentClause));
        } else {
            self.recover("expected class definition or component clause", SECTION_START);
            self.builder.finish_node();
            return;
        }
        if self.at(K::ConstrainedbyKw) {
            self.constraining_clause();
        }
        self.expect(K::Semicolon, "';' after element");
        self.builder.finish_node();
    }

    fn constraining_clause(&mut self) {
        self.builder.start_node(K::ConstrainingClause, None);
        self.bump(None); // constrainedby
        self.type_specifier(Some(Field::TypeSpecifier));
        if self.at(K::LParen) {
            self.class_modification();
        }
        self.description();
        self.builder.finish_node();
    }

    fn import_clause(&mut self) {
        self.builder.start_node(K::ImportClause, None);
        self.bump(None); // import
        if self.at(K::Ident) && self.nth(1) == K::Eq {
            self.bump(Some(Field::Alias));
            self.bump(None); // =
            self.name();
            self.builder.set_last_field(Field::Name);
        } else if self.at(K::Ident) {
            self.import_name();
        } else {
            self.error_at_current("expected name after 'import'");
        }
        self.builder.finish_node();
    }

    /// Dotted import target, possibly ending in `.*` or `.{a, b}`.
    fn import_name(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.builder.start_node(K::Name, None);
        self.bump(Some(Field::Identifier));
        self.builder.finish_node();
        self.builder.set_last_field(Field::Name);
        loop {
            if self.at(K::DotStar) {
                // `.*` lexes as one token
                self.bump(Some(Field::Wildcard));
                return;
            }
            if !self.at(K::Dot) {
                return;
            }
            match self.nth(1) {
                K::Ident => {
                    self.builder.start_node_at(checkpoint, K::Name, None);
                    self.builder.set_last_field(Field::Qualifier);
                    self.bump(None); // .
                    self.bump(Some(Field::Identifier));
                    self.builder.finish_node();
                    self.builder.set_last_field(Field::Name);
                }
                K::Star => {
                    self.bump(None); // .
                    self.bump(Some(Field::Wildcard));
                    return;
                }
                K::LBrace => {
                    self.bump(None); // .
                    self.import_list();
                    return;
                }
                _ => return,
            }
        }
    }

    fn import_list(&mut self) {
        self.builder.start_node(K::ImportList, Some(Field::Imports));
        self.bump(None); // {
        while self.at(K::Ident) {
            self.bump(None);
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.expect(K::RBrace, "'}'");
        self.builder.finish_node();
    }

    fn extends_clause(&mut self) {
        self.builder.start_node(K::ExtendsClause, None);
        self.bump(None); // extends
        self.type_specifier(Some(Field::TypeSpecifier));
        if self.at(K::LParen) {
            self.class_modification();
        }
        if self.at(K::AnnotationKw) {
            self.annotation();
        }
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    fn component_clause(&mut self, field: Option<Field>) {
        self.builder.start_node(K::ComponentClause, field);
        if self.at_any(TYPE_PREFIX) {
            self.builder.start_node(K::TypePrefix, Some(Field::TypePrefix));
            while self.at_any(TYPE_PREFIX) {
                self.bump(None);
            }
            self.builder.finish_node();
        }
        self.type_specifier(Some(Field::TypeSpecifier));
        if self.at(K::LBracket) {
            self.array_subscripts(Some(Field::Indices));
        }
        self.component_list();
        self.builder.finish_node();
    }

    fn component_list(&mut self) {
        self.builder
            .start_node(K::ComponentList, Some(Field::ComponentDeclarations));
        loop {
            self.component_declaration();
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn component_declaration(&mut self) {
        self.builder.start_node(K::ComponentDeclaration, None);
        self.declaration();
        if self.at(K::IfKw) {
            // conditional component: `x if cond`
            self.bump(None);
            self.expression();
        }
        self.description();
        self.builder.finish_node();
    }

    fn declaration(&mut self) {
        self.builder.start_node(K::Declaration, Some(Field::Declaration));
        if self.at(K::Ident) {
            self.bump(Some(Field::Identifier));
        } else {
            self.error_at_current("expected component name");
        }
        if self.at(K::LBracket) {
            self.array_subscripts(Some(Field::Indices));
        }
        if self.at_any(&[K::LParen, K::Eq, K::ColonEq]) {
            self.modification();
        }
        self.builder.finish_node();
    }

    fn modification(&mut self) {
        self.builder.start_node(K::Modification, Some(Field::Modification));
        if self.at(K::LParen) {
            self.class_modification();
            if self.eat(K::Eq) {
                self.expression();
            }
        } else if self.eat(K::Eq) || self.eat(K::ColonEq) {
            self.expression();
        }
        self.builder.finish_node();
    }

    fn class_modification(&mut self) {
        self.builder.start_node(K::ClassModification, None);
        self.bump(None); // (
        if !self.at(K::RParen) {
            self.builder.start_node(K::ArgumentList, None);
            loop {
                self.argument();
                if !self.eat(K::Comma) {
                    break;
                }
            }
            self.builder.finish_node();
        }
        self.expect(K::RParen, "')'");
        self.builder.finish_node();
    }

    fn argument(&mut self) {
        self.builder.start_node(K::ElementModification, None);
        if self.at(K::RedeclareKw) {
            self.bump(None);
            while self.at_any(&[K::EachKw, K::FinalKw, K::ReplaceableKw]) {
                self.bump(None);
            }
            if self.at_any(CLASS_START) {
                self.class_definition(Some(Field::ClassDefinition));
            } else {
                self.builder.start_node(K::ComponentRedeclaration, None);
                self.component_clause(Some(Field::ComponentClause));
                self.builder.finish_node();
            }
        } else {
            while self.at_any(&[K::EachKw, K::FinalKw]) {
                self.bump(None);
            }
            if self.at(K::Ident) || self.at(K::Dot) {
                self.name();
                self.builder.set_last_field(Field::Name);
            } else {
                self.error_at_current("expected modification target");
            }
            if self.at_any(&[K::LParen, K::Eq, K::ColonEq]) {
                self.modification();
            }
            if self.at(K::String) {
                self.description_string();
            }
        }
        self.builder.finish_node();
    }

    fn array_subscripts(&mut self, field: Option<Field>) {
        self.builder.start_node(K::ArraySubscripts, field);
        self.bump(None); // [
        loop {
            self.builder.start_node(K::Subscript, None);
            if self.at(K::Colon) {
                self.bump(None);
            } else {
                self.expression();
            }
            self.builder.finish_node();
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.expect(K::RBracket, "']'");
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Names and type specifiers
    // ------------------------------------------------------------------

    /// Dotted name, built left-recursively: `A.B.C` is
    /// `name(qualifier: name(qualifier: name(A), B), C)`.
    fn name(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.builder.start_node(K::Name, None);
        if self.at(K::Ident) {
            self.bump(Some(Field::Identifier));
        } else {
            self.error_at_current("expected identifier");
        }
        self.builder.finish_node();
        while self.at(K::Dot) && self.nth(1) == K::Ident {
            self.builder.start_node_at(checkpoint, K::Name, None);
            self.builder.set_last_field(Field::Qualifier);
            self.bump(None); // .
            self.bump(Some(Field::Identifier));
            self.builder.finish_node();
        }
    }

    fn type_specifier(&mut self, field: Option<Field>) {
        self.builder.start_node(K::TypeSpecifier, field);
        if self.at(K::Dot) {
            // leading dot roots the type at the global scope
            self.bump(Some(Field::Global));
        }
        self.name();
        self.builder.set_last_field(Field::Name);
        self.builder.finish_node();
    }

    fn component_reference(&mut self) {
        self.builder.start_node(K::ComponentReference, None);
        if self.at(K::Dot) {
            self.bump(Some(Field::Global));
        }
        if self.at(K::Ident) {
            self.bump(None);
        } else {
            self.error_at_current("expected identifier");
        }
        if self.at(K::LBracket) {
            self.array_subscripts(Some(Field::Indices));
        }
        while self.at(K::Dot) && self.nth(1) == K::Ident {
            self.bump(None); // .
            self.bump(None); // ident
            if self.at(K::LBracket) {
                self.array_subscripts(Some(Field::Indices));
            }
        }
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Descriptions and annotations
    // ------------------------------------------------------------------

    fn description(&mut self) {
        if self.at(K::String) {
            self.description_string();
        }
        if self.at(K::AnnotationKw) {
            self.annotation();
        }
    }

    fn description_string(&mut self) {
        self.builder
            .start_node(K::DescriptionString, Some(Field::DescriptionString));
        self.bump(None);
        while self.at(K::Plus) && self.nth(1) == K::String {
            self.bump(None);
            self.bump(None);
        }
        self.builder.finish_node();
    }

    fn annotation(&mut self) {
        self.builder.start_node(K::Annotation, None);
        self.bump(None); // annotation
        if self.at(K::LParen) {
            self.class_modification();
        } else {
            self.error_at_current("expected '(' after 'annotation'");
        }
        self.builder.finish_node();
    }

    fn external_clause(&mut self) {
        self.builder.start_node(K::ExternalClause, None);
        self.bump(None); // external
        while !self.eof() && !self.at(K::Semicolon) && !self.at(K::AnnotationKw) {
            self.bump(None);
        }
        self.eat(K::Semicolon);
        if self.at(K::AnnotationKw) {
            self.annotation();
            self.expect(K::Semicolon, "';' after annotation");
        }
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Equations and algorithms
    // ------------------------------------------------------------------

    fn equation_section(&mut self) {
        self.builder.start_node(K::EquationSection, None);
        self.eat(K::InitialKw);
        self.bump(None); // equation
        self.equation_block(&[]);
        self.builder.finish_node();
    }

    /// Equations until a section start or one of `extra_stops`.
    fn equation_block(&mut self, extra_stops: &[SyntaxKind]) {
        while !self.eof() && !self.at_any(SECTION_START) && !self.at_any(extra_stops) {
            self.equation();
            self.expect(K::Semicolon, "';' after equation");
        }
    }

    fn equation(&mut self) {
        match self.nth(0) {
            K::IfKw => self.if_equation(),
            K::ForKw => self.for_equation(),
            K::WhenKw => self.when_equation(),
            K::ConnectKw => self.connect_clause(),
            _ => {
                self.builder.start_node(K::Equation, None);
                self.simple_expression();
                if self.eat(K::Eq) {
                    self.expression();
                }
                self.description();
                self.builder.finish_node();
            }
        }
    }

    fn if_equation(&mut self) {
        self.builder.start_node(K::IfEquation, None);
        self.bump(None); // if
        self.expression();
        self.expect(K::ThenKw, "'then'");
        self.equation_block(&[K::ElseifKw, K::ElseKw]);
        while self.at(K::ElseifKw) {
            self.bump(None);
            self.expression();
            self.expect(K::ThenKw, "'then'");
            self.equation_block(&[K::ElseifKw, K::ElseKw]);
        }
        if self.eat(K::ElseKw) {
            self.equation_block(&[]);
        }
        self.expect(K::EndKw, "'end if'");
        self.expect(K::IfKw, "'if' after 'end'");
        self.builder.finish_node();
    }

    fn for_equation(&mut self) {
        self.builder.start_node(K::ForEquation, None);
        self.bump(None); // for
        self.for_indices();
        self.expect(K::LoopKw, "'loop'");
        self.equation_block(&[]);
        self.expect(K::EndKw, "'end for'");
        self.expect(K::ForKw, "'for' after 'end'");
        self.builder.finish_node();
    }

    fn when_equation(&mut self) {
        self.builder.start_node(K::WhenEquation, None);
        self.bump(None); // when
        self.expression();
        self.expect(K::ThenKw, "'then'");
        self.equation_block(&[K::ElsewhenKw]);
        while self.at(K::ElsewhenKw) {
            self.bump(None);
            self.expression();
            self.expect(K::ThenKw, "'then'");
            self.equation_block(&[K::ElsewhenKw]);
        }
        self.expect(K::EndKw, "'end when'");
        self.expect(K::WhenKw, "'when' after 'end'");
        self.builder.finish_node();
    }

    fn connect_clause(&mut self) {
        self.builder.start_node(K::ConnectClause, None);
        self.bump(None); // connect
        self.expect(K::LParen, "'('");
        self.component_reference();
        self.expect(K::Comma, "','");
        self.component_reference();
        self.expect(K::RParen, "')'");
        self.builder.finish_node();
    }

    fn for_indices(&mut self) {
        self.builder.start_node(K::ForIndices, None);
        loop {
            self.builder.start_node(K::ForIndex, None);
            if self.at(K::Ident) {
                self.bump(Some(Field::Identifier));
            } else {
                self.error_at_current("expected loop variable");
            }
            if self.eat(K::InKw) {
                self.expression();
            }
            self.builder.finish_node();
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn algorithm_section(&mut self) {
        self.builder.start_node(K::AlgorithmSection, None);
        self.eat(K::InitialKw);
        self.bump(None); // algorithm
        self.statement_block(&[]);
        self.builder.finish_node();
    }

    fn statement_block(&mut self, extra_stops: &[SyntaxKind]) {
        while !self.eof() && !self.at_any(SECTION_START) && !self.at_any(extra_stops) {
            self.statement();
            self.expect(K::Semicolon, "';' after statement");
        }
    }

    fn statement(&mut self) {
        match self.nth(0) {
            K::IfKw => self.if_statement(),
            K::ForKw => self.for_statement(),
            K::WhileKw => self.while_statement(),
            K::WhenKw => self.when_statement(),
            K::BreakKw | K::ReturnKw => {
                self.builder.start_node(K::Statement, None);
                self.bump(None);
                self.builder.finish_node();
            }
            _ => {
                self.builder.start_node(K::Statement, None);
                self.simple_expression();
                if self.eat(K::ColonEq) {
                    self.expression();
                }
                self.description();
                self.builder.finish_node();
            }
        }
    }

    fn if_statement(&mut self) {
        self.builder.start_node(K::IfStatement, None);
        self.bump(None); // if
        self.expression();
        self.expect(K::ThenKw, "'then'");
        self.statement_block(&[K::ElseifKw, K::ElseKw]);
        while self.at(K::ElseifKw) {
            self.bump(None);
            self.expression();
            self.expect(K::ThenKw, "'then'");
            self.statement_block(&[K::ElseifKw, K::ElseKw]);
        }
        if self.eat(K::ElseKw) {
            self.statement_block(&[]);
        }
        self.expect(K::EndKw, "'end if'");
        self.expect(K::IfKw, "'if' after 'end'");
        self.builder.finish_node();
    }

    fn for_statement(&mut self) {
        self.builder.start_node(K::ForStatement, None);
        self.bump(None); // for
        self.for_indices();
        self.expect(K::LoopKw, "'loop'");
        self.statement_block(&[]);
        self.expect(K::EndKw, "'end for'");
        self.expect(K::ForKw, "'for' after 'end'");
        self.builder.finish_node();
    }

    fn while_statement(&mut self) {
        self.builder.start_node(K::WhileStatement, None);
        self.bump(None); // while
        self.expression();
        self.expect(K::LoopKw, "'loop'");
        self.statement_block(&[]);
        self.expect(K::EndKw, "'end while'");
        self.expect(K::WhileKw, "'while' after 'end'");
        self.builder.finish_node();
    }

    fn when_statement(&mut self) {
        self.builder.start_node(K::WhenStatement, None);
        self.bump(None); // when
        self.expression();
        self.expect(K::ThenKw, "'then'");
        self.statement_block(&[K::ElsewhenKw]);
        while self.at(K::ElsewhenKw) {
            self.bump(None);
            self.expression();
            self.expect(K::ThenKw, "'then'");
            self.statement_block(&[K::ElsewhenKw]);
        }
        self.expect(K::EndKw, "'end when'");
        self.expect(K::WhenKw, "'when' after 'end'");
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) {
        if self.at(K::IfKw) {
            self.builder.start_node(K::IfExpression, None);
            self.bump(None);
            self.expression();
            self.expect(K::ThenKw, "'then'");
            self.expression();
            while self.at(K::ElseifKw) {
                self.bump(None);
                self.expression();
                self.expect(K::ThenKw, "'then'");
                self.expression();
            }
            self.expect(K::ElseKw, "'else'");
            self.expression();
            self.builder.finish_node();
        } else {
            self.simple_expression();
        }
    }

    /// `a [: b [: c]]` — the range form of a simple expression.
    fn simple_expression(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.logical_expression();
        if self.at(K::Colon) {
            self.builder
                .start_node_at(checkpoint, K::RangeExpression, None);
            self.bump(None);
            self.logical_expression();
            if self.eat(K::Colon) {
                self.logical_expression();
            }
            self.builder.finish_node();
        }
    }

    fn logical_expression(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.logical_term();
        while self.at(K::OrKw) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.logical_term();
            self.builder.finish_node();
        }
    }

    fn logical_term(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.logical_factor();
        while self.at(K::AndKw) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.logical_factor();
            self.builder.finish_node();
        }
    }

    fn logical_factor(&mut self) {
        if self.at(K::NotKw) {
            self.builder.start_node(K::UnaryExpression, None);
            self.bump(None);
            self.relation();
            self.builder.finish_node();
        } else {
            self.relation();
        }
    }

    fn relation(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.arithmetic_expression();
        if self.at_any(&[K::Lt, K::Gt, K::LtEq, K::GtEq, K::EqEq, K::LtGt]) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.arithmetic_expression();
            self.builder.finish_node();
        }
    }

    fn arithmetic_expression(&mut self) {
        let checkpoint = self.builder.checkpoint();
        if self.at_any(&[K::Plus, K::Minus, K::DotPlus, K::DotMinus]) {
            self.builder.start_node(K::UnaryExpression, None);
            self.bump(None);
            self.term();
            self.builder.finish_node();
        } else {
            self.term();
        }
        while self.at_any(&[K::Plus, K::Minus, K::DotPlus, K::DotMinus]) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.term();
            self.builder.finish_node();
        }
    }

    fn term(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.factor();
        while self.at_any(&[K::Star, K::Slash, K::DotStar, K::DotSlash]) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.factor();
            self.builder.finish_node();
        }
    }

    fn factor(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.primary();
        if self.at_any(&[K::Caret, K::DotCaret]) {
            self.builder
                .start_node_at(checkpoint, K::BinaryExpression, None);
            self.bump(None);
            self.primary();
            self.builder.finish_node();
        }
    }

    fn primary(&mut self) {
        match self.nth(0) {
            K::UnsignedInteger | K::UnsignedReal | K::String | K::TrueKw | K::FalseKw
            | K::EndKw => {
                self.bump(None);
            }
            K::DerKw | K::InitialKw | K::PureKw => {
                self.builder.start_node(K::FunctionCall, None);
                self.bump(None);
                if self.at(K::LParen) {
                    self.function_arguments();
                }
                self.builder.finish_node();
            }
            K::LParen => {
                self.builder.start_node(K::ParenthesizedExpression, None);
                self.bump(None);
                if !self.at(K::RParen) {
                    self.expression_list();
                }
                self.expect(K::RParen, "')'");
                self.builder.finish_node();
            }
            K::LBrace => {
                self.builder.start_node(K::ArrayConstructor, None);
                self.bump(None);
                if !self.at(K::RBrace) {
                    self.array_arguments();
                }
                self.expect(K::RBrace, "'}'");
                self.builder.finish_node();
            }
            K::LBracket => {
                self.builder.start_node(K::MatrixConstructor, None);
                self.bump(None);
                loop {
                    self.expression_list();
                    if !self.eat(K::Semicolon) {
                        break;
                    }
                }
                self.expect(K::RBracket, "']'");
                self.builder.finish_node();
            }
            K::Ident | K::Dot => {
                let checkpoint = self.builder.checkpoint();
                self.component_reference();
                if self.at(K::LParen) {
                    self.builder
                        .start_node_at(checkpoint, K::FunctionCall, None);
                    self.function_arguments();
                    self.builder.finish_node();
                }
            }
            _ => {
                self.error_at_current("expected expression");
                if !self.eof() && !self.at(K::Semicolon) && !self.at_any(SECTION_START) {
                    self.builder.start_node(K::Error, None);
                    self.bump(None);
                    self.builder.finish_node();
                }
            }
        }
    }

    fn expression_list(&mut self) {
        self.builder.start_node(K::ExpressionList, None);
        loop {
            if self.at(K::Comma) {
                // empty slot in an output list: `(, y) := f()`
                self.bump(None);
                continue;
            }
            self.expression();
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.builder.finish_node();
    }

    fn array_arguments(&mut self) {
        loop {
            self.expression();
            if self.at(K::ForKw) {
                // array comprehension: `{expr for i in range}`
                self.bump(None);
                self.for_indices();
            }
            if !self.eat(K::Comma) {
                break;
            }
        }
    }

    fn function_arguments(&mut self) {
        self.builder.start_node(K::FunctionArguments, None);
        self.bump(None); // (
        while !self.eof() && !self.at(K::RParen) {
            if self.at(K::Ident) && self.nth(1) == K::Eq {
                self.builder.start_node(K::NamedArgument, None);
                self.bump(Some(Field::Identifier));
                self.bump(None); // =
                self.expression();
                self.builder.finish_node();
            } else if self.at(K::ForKw) {
                // reduction: f(expr for i in range)
                self.bump(None);
                self.for_indices();
            } else {
                self.expression();
            }
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.expect(K::RParen, "')'");
        self.builder.finish_node();
    }
}

/// Line/column of a byte offset, for error reporting.
fn position_of(text: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut line_start = 0;
    for (i, b) in text.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    Position::new(line, offset - line_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tree::SyntaxNode;

    fn parse(text: &str) -> Parse {
        Parser::new().parse(text, None)
    }

    fn find_kind<'t>(node: SyntaxNode<'t>, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        if node.kind() == kind {
            return Some(node);
        }
        node.children().find_map(|c| find_kind(c, kind))
    }

    #[test]
    fn test_empty_package() {
        let parse = parse("package TestLibrary\nend TestLibrary;\n");
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        assert_eq!(root.kind(), K::StoredDefinitions);
        let class = find_kind(root, K::ClassDefinition).unwrap();
        let spec = class.child_by_field(Field::ClassSpecifier).unwrap();
        assert_eq!(spec.kind(), K::LongClassSpecifier);
        assert_eq!(
            spec.child_by_field(Field::Identifier).unwrap().text(),
            "TestLibrary"
        );
    }

    #[test]
    fn test_within_and_constants() {
        let text = "within TestLibrary;\npackage Constants\n  constant Real e = 2.71828;\n  constant Real pi = 3.14159;\nend Constants;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        let within = find_kind(root, K::WithinClause).unwrap();
        assert_eq!(
            within.child_by_field(Field::Name).unwrap().text(),
            "TestLibrary"
        );
        let clause = find_kind(root, K::ComponentClause).unwrap();
        let decl = find_kind(clause, K::Declaration).unwrap();
        assert_eq!(decl.child_by_field(Field::Identifier).unwrap().text(), "e");
    }

    #[test]
    fn test_qualified_name_structure() {
        let parse = parse("within A.B.C;\npackage P\nend P;\n");
        assert!(parse.errors.is_empty());
        let within = find_kind(parse.tree.root(), K::WithinClause).unwrap();
        let name = within.child_by_field(Field::Name).unwrap();
        assert_eq!(name.text(), "A.B.C");
        let qualifier = name.child_by_field(Field::Qualifier).unwrap();
        assert_eq!(qualifier.text(), "A.B");
        assert_eq!(name.child_by_field(Field::Identifier).unwrap().text(), "C");
    }

    #[test]
    fn test_import_forms() {
        let text = "package P\n  import A.B.C;\n  import z = A.B.C;\n  import A.B.*;\n  import A.B.{x, y};\nend P;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        let list = find_kind(root, K::ElementList).unwrap();
        let imports: Vec<_> = list
            .children()
            .filter(|c| c.kind() == K::ImportClause)
            .collect();
        assert_eq!(imports.len(), 4);
        // plain
        assert!(imports[0].child_by_field(Field::Alias).is_none());
        assert_eq!(imports[0].child_by_field(Field::Name).unwrap().text(), "A.B.C");
        // alias
        assert_eq!(imports[1].child_by_field(Field::Alias).unwrap().text(), "z");
        // wildcard
        assert!(imports[2].child_by_field(Field::Wildcard).is_some());
        assert_eq!(imports[2].child_by_field(Field::Name).unwrap().text(), "A.B");
        // multi-import
        let multi = imports[3].child_by_field(Field::Imports).unwrap();
        assert_eq!(multi.kind(), K::ImportList);
        let names: Vec<_> = multi.named_children().map(|n| n.text()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_function_with_bindings() {
        let text = "within TestLibrary.TestPackage;\nimport TestLibrary.Constants.pi;\nfunction TestClass\n  input Real twoE = 2 * Constants.e;\n  input Real tau = 2 * pi;\nend TestClass;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        // file-level import is a sibling of the stored definition
        let import = root
            .children()
            .find(|c| c.kind() == K::ImportClause)
            .expect("file-level import");
        assert_eq!(import.child_by_field(Field::Name).unwrap().text(), "TestLibrary.Constants.pi");
        // binding expression contains a component reference to Constants.e
        let comp_refs: Vec<_> = collect_kinds(root, K::ComponentReference);
        assert!(comp_refs.iter().any(|n| n.text() == "Constants.e"));
    }

    fn collect_kinds<'t>(node: SyntaxNode<'t>, kind: SyntaxKind) -> Vec<SyntaxNode<'t>> {
        let mut out = Vec::new();
        fn go<'t>(node: SyntaxNode<'t>, kind: SyntaxKind, out: &mut Vec<SyntaxNode<'t>>) {
            if node.kind() == kind {
                out.push(node);
            }
            for child in node.children() {
                go(child, kind, out);
            }
        }
        go(node, kind, &mut out);
        out
    }

    #[test]
    fn test_extends_and_sections() {
        let text = "model M\n  extends Base.Thing(x = 2);\n  Real v;\nequation\n  der(v) = -9.81;\n  connect(a.b, c.d);\nend M;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        let ext = find_kind(root, K::ExtendsClause).unwrap();
        let ts = ext.child_by_field(Field::TypeSpecifier).unwrap();
        assert_eq!(ts.child_by_field(Field::Name).unwrap().text(), "Base.Thing");
        assert!(find_kind(root, K::EquationSection).is_some());
        assert!(find_kind(root, K::ConnectClause).is_some());
    }

    #[test]
    fn test_global_type_specifier() {
        let parse = parse("model M\n  .Modelica.Units.SI.Length len;\nend M;\n");
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let ts = find_kind(parse.tree.root(), K::TypeSpecifier).unwrap();
        assert!(ts.child_by_field(Field::Global).is_some());
        assert_eq!(
            ts.child_by_field(Field::Name).unwrap().text(),
            "Modelica.Units.SI.Length"
        );
    }

    #[test]
    fn test_short_and_enumeration_specifiers() {
        let text = "package P\n  type Voltage = Real(unit = \"V\");\n  type Color = enumeration(red, green, blue);\nend P;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        let root = parse.tree.root();
        let short = find_kind(root, K::ShortClassSpecifier).unwrap();
        assert_eq!(short.child_by_field(Field::Identifier).unwrap().text(), "Voltage");
        let en = find_kind(root, K::EnumerationClassSpecifier).unwrap();
        assert_eq!(en.child_by_field(Field::Identifier).unwrap().text(), "Color");
    }

    #[test]
    fn test_multi_component_declaration() {
        let parse = parse("model M\n  Real a, b, c;\nend M;\n");
        assert!(parse.errors.is_empty());
        let list = find_kind(parse.tree.root(), K::ComponentList).unwrap();
        let decls: Vec<_> = collect_kinds(list, K::Declaration);
        assert_eq!(decls.len(), 3);
    }

    #[test]
    fn test_error_recovery_keeps_parsing() {
        let text = "model M\n  ??? garbage;\n  Real ok;\nend M;\n";
        let parse = parse(text);
        assert!(!parse.errors.is_empty());
        // the good declaration is still in the tree
        let decls = collect_kinds(parse.tree.root(), K::Declaration);
        assert!(decls.iter().any(|d| d.text().starts_with("ok")));
    }

    #[test]
    fn test_algorithm_section() {
        let text = "function F\n  input Real x;\n  output Real y;\nalgorithm\n  y := x * 2;\nend F;\n";
        let parse = parse(text);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        assert!(find_kind(parse.tree.root(), K::AlgorithmSection).is_some());
    }
}
