//! Syntax kinds for the Modelica concrete syntax tree
//!
//! This enum defines all possible node and token kinds in the syntax tree.
//! Token kinds are leaves (identifiers, keywords, punctuation); node kinds
//! are composite (class definitions, element lists, expressions).

/// All syntax kinds (tokens and nodes) in the Modelica grammar subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (dropped from the tree, kept for the lexer)
    // =========================================================================
    Whitespace = 0,
    LineComment,
    BlockComment,

    // =========================================================================
    // LITERAL TOKENS
    // =========================================================================
    Ident,
    UnsignedInteger,
    UnsignedReal,
    String,

    // =========================================================================
    // PUNCTUATION TOKENS
    // =========================================================================
    LParen,       // (
    RParen,       // )
    LBracket,     // [
    RBracket,     // ]
    LBrace,       // {
    RBrace,       // }
    Semicolon,    // ;
    Colon,        // :
    Comma,        // ,
    Dot,          // .
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Caret,        // ^
    DotPlus,      // .+
    DotMinus,     // .-
    DotStar,      // .*
    DotSlash,     // ./
    DotCaret,     // .^
    Eq,           // =
    ColonEq,      // :=
    Lt,           // <
    Gt,           // >
    LtEq,         // <=
    GtEq,         // >=
    EqEq,         // ==
    LtGt,         // <>

    // =========================================================================
    // KEYWORD TOKENS
    // =========================================================================
    AlgorithmKw,
    AndKw,
    AnnotationKw,
    BlockKw,
    BreakKw,
    ClassKw,
    ConnectKw,
    ConnectorKw,
    ConstantKw,
    ConstrainedbyKw,
    DerKw,
    DiscreteKw,
    EachKw,
    ElseKw,
    ElseifKw,
    ElsewhenKw,
    EncapsulatedKw,
    EndKw,
    EnumerationKw,
    EquationKw,
    ExpandableKw,
    ExtendsKw,
    ExternalKw,
    FalseKw,
    FinalKw,
    FlowKw,
    ForKw,
    FunctionKw,
    IfKw,
    ImportKw,
    ImpureKw,
    InKw,
    InitialKw,
    InnerKw,
    InputKw,
    LoopKw,
    ModelKw,
    NotKw,
    OperatorKw,
    OrKw,
    OuterKw,
    OutputKw,
    PackageKw,
    ParameterKw,
    PartialKw,
    ProtectedKw,
    PublicKw,
    PureKw,
    RecordKw,
    RedeclareKw,
    ReplaceableKw,
    ReturnKw,
    StreamKw,
    ThenKw,
    TrueKw,
    TypeKw,
    WhenKw,
    WhileKw,
    WithinKw,

    /// A token the lexer could not recognize
    ErrorToken,

    // =========================================================================
    // NODE KINDS — declarations and structure
    // =========================================================================
    StoredDefinitions,
    StoredDefinition,
    WithinClause,
    ClassDefinition,
    ClassPrefixes,
    LongClassSpecifier,
    ShortClassSpecifier,
    EnumerationClassSpecifier,
    DerivativeClassSpecifier,
    ExtendsClassSpecifier,
    ElementList,
    PublicElementList,
    ProtectedElementList,
    NamedElement,
    ImportClause,
    ImportList,
    ExtendsClause,
    ConstrainingClause,
    ComponentClause,
    ComponentRedeclaration,
    ComponentList,
    ComponentDeclaration,
    Declaration,
    TypePrefix,
    TypeSpecifier,
    Name,
    ComponentReference,
    ArraySubscripts,
    Subscript,
    Modification,
    ClassModification,
    ArgumentList,
    ElementModification,
    EnumerationLiteral,
    Description,
    DescriptionString,
    Annotation,
    ExternalClause,

    // =========================================================================
    // NODE KINDS — sections, equations, statements
    // =========================================================================
    EquationSection,
    AlgorithmSection,
    Equation,
    ConnectClause,
    IfEquation,
    ForEquation,
    WhenEquation,
    Statement,
    IfStatement,
    ForStatement,
    WhileStatement,
    WhenStatement,
    ForIndices,
    ForIndex,

    // =========================================================================
    // NODE KINDS — expressions
    // =========================================================================
    BinaryExpression,
    UnaryExpression,
    RangeExpression,
    IfExpression,
    ParenthesizedExpression,
    ArrayConstructor,
    MatrixConstructor,
    FunctionCall,
    FunctionArguments,
    NamedArgument,
    ExpressionList,

    /// A stretch of source the parser could not interpret
    Error,
}

impl SyntaxKind {
    /// True for leaf (token) kinds.
    pub fn is_token(self) -> bool {
        self <= SyntaxKind::ErrorToken
    }

    /// True for kinds that participate in named-child traversal. Composite
    /// nodes and identifiers are named; keywords and punctuation are not.
    pub fn is_named(self) -> bool {
        !self.is_token() || self == SyntaxKind::Ident
    }

    /// The grammar-facing tag of this kind, e.g. `class_definition`.
    pub fn name(self) -> &'static str {
        use SyntaxKind::*;
        match self {
            Whitespace => "whitespace",
            LineComment => "line_comment",
            BlockComment => "block_comment",
            Ident => "IDENT",
            UnsignedInteger => "UNSIGNED_INTEGER",
            UnsignedReal => "UNSIGNED_REAL",
            String => "STRING",
            ErrorToken => "error_token",
            StoredDefinitions => "stored_definitions",
            StoredDefinition => "stored_definition",
            WithinClause => "within_clause",
            ClassDefinition => "class_definition",
            ClassPrefixes => "class_prefixes",
            LongClassSpecifier => "long_class_specifier",
            ShortClassSpecifier => "short_class_specifier",
            EnumerationClassSpecifier => "enumeration_class_specifier",
            DerivativeClassSpecifier => "derivative_class_specifier",
            ExtendsClassSpecifier => "extends_class_specifier",
            ElementList => "element_list",
            PublicElementList => "public_element_list",
            ProtectedElementList => "protected_element_list",
            NamedElement => "named_element",
            ImportClause => "import_clause",
            ImportList => "import_list",
            ExtendsClause => "extends_clause",
            ConstrainingClause => "constraining_clause",
            ComponentClause => "component_clause",
            ComponentRedeclaration => "component_redeclaration",
            ComponentList => "component_list",
            ComponentDeclaration => "component_declaration",
            Declaration => "declaration",
            TypePrefix => "type_prefix",
            TypeSpecifier => "type_specifier",
            Name => "name",
            ComponentReference => "component_reference",
            ArraySubscripts => "array_subscripts",
            Subscript => "subscript",
            Modification => "modification",
            ClassModification => "class_modification",
            ArgumentList => "argument_list",
            ElementModification => "element_modification",
            EnumerationLiteral => "enumeration_literal",
            Description => "description",
            DescriptionString => "description_string",
            Annotation => "annotation",
            ExternalClause => "external_clause",
            EquationSection => "equation_section",
            AlgorithmSection => "algorithm_section",
            Equation => "equation",
            ConnectClause => "connect_clause",
            IfEquation => "if_equation",
            ForEquation => "for_equation",
            WhenEquation => "when_equation",
            Statement => "statement",
            IfStatement => "if_statement",
            ForStatement => "for_statement",
            WhileStatement => "while_statement",
            WhenStatement => "when_statement",
            ForIndices => "for_indices",
            ForIndex => "for_index",
            BinaryExpression => "binary_expression",
            UnaryExpression => "unary_expression",
            RangeExpression => "range_expression",
            IfExpression => "if_expression",
            ParenthesizedExpression => "parenthesized_expression",
            ArrayConstructor => "array_constructor",
            MatrixConstructor => "matrix_constructor",
            FunctionCall => "function_call",
            FunctionArguments => "function_arguments",
            NamedArgument => "named_argument",
            ExpressionList => "expression_list",
            Error => "error",
            _ => "token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SyntaxKind;

    #[test]
    fn token_node_split() {
        assert!(SyntaxKind::Ident.is_token());
        assert!(SyntaxKind::WithinKw.is_token());
        assert!(!SyntaxKind::ClassDefinition.is_token());
        assert!(SyntaxKind::Ident.is_named());
        assert!(!SyntaxKind::Semicolon.is_named());
        assert!(SyntaxKind::Name.is_named());
    }

    #[test]
    fn grammar_tags() {
        assert_eq!(SyntaxKind::StoredDefinitions.name(), "stored_definitions");
        assert_eq!(SyntaxKind::ComponentClause.name(), "component_clause");
    }
}
