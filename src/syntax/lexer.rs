//! Logos-based lexer for Modelica
//!
//! Fast tokenization using the logos crate.

use logos::Logos;

use super::kind::SyntaxKind;

/// A token with its kind, text, and byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// True for whitespace and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = self.inner.span().start;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ErrorToken,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string, dropping trivia.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).filter(|t| !t.is_trivia()).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    // Plain and quoted identifiers share a kind; the quotes stay in the text.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    #[regex(r"'([^'\\]|\\.)*'")]
    Ident,

    #[regex(r"[0-9]+")]
    UnsignedInteger,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    UnsignedReal,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token(".+")]
    DotPlus,
    #[token(".-")]
    DotMinus,
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".^")]
    DotCaret,
    #[token("=")]
    Eq,
    #[token(":=")]
    ColonEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("<>")]
    LtGt,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("algorithm")]
    Algorithm,
    #[token("and")]
    And,
    #[token("annotation")]
    Annotation,
    #[token("block")]
    Block,
    #[token("break")]
    Break,
    #[token("class")]
    Class,
    #[token("connect")]
    Connect,
    #[token("connector")]
    Connector,
    #[token("constant")]
    Constant,
    #[token("constrainedby")]
    Constrainedby,
    #[token("der")]
    Der,
    #[token("discrete")]
    Discrete,
    #[token("each")]
    Each,
    #[token("else")]
    Else,
    #[token("elseif")]
    Elseif,
    #[token("elsewhen")]
    Elsewhen,
    #[token("encapsulated")]
    Encapsulated,
    #[token("end")]
    End,
    #[token("enumeration")]
    Enumeration,
    #[token("equation")]
    Equation,
    #[token("expandable")]
    Expandable,
    #[token("extends")]
    Extends,
    #[token("external")]
    External,
    #[token("false")]
    False,
    #[token("final")]
    Final,
    #[token("flow")]
    Flow,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("impure")]
    Impure,
    #[token("in")]
    In,
    #[token("initial")]
    Initial,
    #[token("inner")]
    Inner,
    #[token("input")]
    Input,
    #[token("loop")]
    Loop,
    #[token("model")]
    Model,
    #[token("not")]
    Not,
    #[token("operator")]
    Operator,
    #[token("or")]
    Or,
    #[token("outer")]
    Outer,
    #[token("output")]
    Output,
    #[token("package")]
    Package,
    #[token("parameter")]
    Parameter,
    #[token("partial")]
    Partial,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("pure")]
    Pure,
    #[token("record")]
    Record,
    #[token("redeclare")]
    Redeclare,
    #[token("replaceable")]
    Replaceable,
    #[token("return")]
    Return,
    #[token("stream")]
    Stream,
    #[token("then")]
    Then,
    #[token("true")]
    True,
    #[token("type")]
    Type,
    #[token("when")]
    When,
    #[token("while")]
    While,
    #[token("within")]
    Within,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken as L;
        use SyntaxKind as K;
        match token {
            L::Whitespace => K::Whitespace,
            L::LineComment => K::LineComment,
            L::BlockComment => K::BlockComment,
            L::Ident => K::Ident,
            L::UnsignedInteger => K::UnsignedInteger,
            L::UnsignedReal => K::UnsignedReal,
            L::String => K::String,
            L::LParen => K::LParen,
            L::RParen => K::RParen,
            L::LBracket => K::LBracket,
            L::RBracket => K::RBracket,
            L::LBrace => K::LBrace,
            L::RBrace => K::RBrace,
            L::Semicolon => K::Semicolon,
            L::Colon => K::Colon,
            L::Comma => K::Comma,
            L::Dot => K::Dot,
            L::Plus => K::Plus,
            L::Minus => K::Minus,
            L::Star => K::Star,
            L::Slash => K::Slash,
            L::Caret => K::Caret,
            L::DotPlus => K::DotPlus,
            L::DotMinus => K::DotMinus,
            L::DotStar => K::DotStar,
            L::DotSlash => K::DotSlash,
            L::DotCaret => K::DotCaret,
            L::Eq => K::Eq,
            L::ColonEq => K::ColonEq,
            L::Lt => K::Lt,
            L::Gt => K::Gt,
            L::LtEq => K::LtEq,
            L::GtEq => K::GtEq,
            L::EqEq => K::EqEq,
            L::LtGt => K::LtGt,
            L::Algorithm => K::AlgorithmKw,
            L::And => K::AndKw,
            L::Annotation => K::AnnotationKw,
            L::Block => K::BlockKw,
            L::Break => K::BreakKw,
            L::Class => K::ClassKw,
            L::Connect => K::ConnectKw,
            L::Connector => K::ConnectorKw,
            L::Constant => K::ConstantKw,
            L::Constrainedby => K::ConstrainedbyKw,
            L::Der => K::DerKw,
            L::Discrete => K::DiscreteKw,
            L::Each => K::EachKw,
            L::Else => K::ElseKw,
            L::Elseif => K::ElseifKw,
            L::Elsewhen => K::ElsewhenKw,
            L::Encapsulated => K::EncapsulatedKw,
            L::End => K::EndKw,
            L::Enumeration => K::EnumerationKw,
            L::Equation => K::EquationKw,
            L::Expandable => K::ExpandableKw,
            L::Extends => K::ExtendsKw,
            L::External => K::ExternalKw,
            L::False => K::FalseKw,
            L::Final => K::FinalKw,
            L::Flow => K::FlowKw,
            L::For => K::ForKw,
            L::Function => K::FunctionKw,
            L::If => K::IfKw,
            L::Import => K::ImportKw,
            L::Impure => K::ImpureKw,
            L::In => K::InKw,
            L::Initial => K::InitialKw,
            L::Inner => K::InnerKw,
            L::Input => K::InputKw,
            L::Loop => K::LoopKw,
            L::Model => K::ModelKw,
            L::Not => K::NotKw,
            L::Operator => K::OperatorKw,
            L::Or => K::OrKw,
            L::Outer => K::OuterKw,
            L::Output => K::OutputKw,
            L::Package => K::PackageKw,
            L::Parameter => K::ParameterKw,
            L::Partial => K::PartialKw,
            L::Protected => K::ProtectedKw,
            L::Public => K::PublicKw,
            L::Pure => K::PureKw,
            L::Record => K::RecordKw,
            L::Redeclare => K::RedeclareKw,
            L::Replaceable => K::ReplaceableKw,
            L::Return => K::ReturnKw,
            L::Stream => K::StreamKw,
            L::Then => K::ThenKw,
            L::True => K::TrueKw,
            L::Type => K::TypeKw,
            L::When => K::WhenKw,
            L::While => K::WhileKw,
            L::Within => K::WithinKw,
        }
    }
}
