//! Token types for the tensor language.
//!
//! A token is the raw lexeme plus the lexical class it was scanned as, and
//! a span giving its byte range in the source. Classes are deliberately
//! coarse: the parser decides what a `-` or a `{` means from context.

use std::fmt;

/// Byte offset range in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    IntLiteral,
    FloatLiteral,
    /// A lexeme that fits no class, e.g. a lone `.`.
    None,
    /// End-of-input sentinel; its lexeme is empty.
    Eof,
}

impl TokenKind {
    /// Tag used for this class in the parse trace.
    pub fn trace_tag(self) -> Option<&'static str> {
        match self {
            TokenKind::Keyword => Some("keyword"),
            TokenKind::Symbol => Some("symbol"),
            TokenKind::Identifier => Some("identifier"),
            TokenKind::IntLiteral => Some("int_const"),
            TokenKind::FloatLiteral => Some("float_const"),
            TokenKind::None | TokenKind::Eof => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Identifier => "identifier",
            TokenKind::IntLiteral => "int",
            TokenKind::FloatLiteral => "float",
            TokenKind::None => "none",
            TokenKind::Eof => "eof",
        };
        f.write_str(name)
    }
}

/// Reserved words. Everything else matching the identifier pattern is an
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Int,
    Float,
    Tensor,
}

impl Keyword {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "let" => Some(Keyword::Let),
            "int" => Some(Keyword::Int),
            "float" => Some(Keyword::Float),
            "tensor" => Some(Keyword::Tensor),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Int => "int",
            Keyword::Float => "float",
            Keyword::Tensor => "tensor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, span: Span) -> Self {
        Self {
            lexeme: lexeme.into(),
            kind,
            span,
        }
    }

    pub fn eof(at: usize) -> Self {
        Self::new("", TokenKind::Eof, Span::new(at, at))
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// True if this is the given single-character symbol.
    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.lexeme.starts_with(symbol)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword && self.lexeme == keyword.as_str()
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword => Keyword::from_lexeme(&self.lexeme),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, TokenKind::IntLiteral | TokenKind::FloatLiteral)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "end of input")
        } else {
            write!(f, "{}", self.lexeme)
        }
    }
}
