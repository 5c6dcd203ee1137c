//! Compiler errors with source spans.
//!
//! Every failure in the pipeline is a [`CompileError`] tagged with an
//! [`ErrorKind`]. All kinds except [`ErrorKind::Warning`] are fatal: the
//! stage that raises one stops, and the error travels up with `?` to the
//! single handler in the CLI, which renders it through miette with the
//! offending span underlined.

use crate::token::Span;
use miette::{Diagnostic, SourceSpan};
use std::fmt;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed lexeme, e.g. a digit run running into a letter.
    Lexical,
    /// Unexpected token.
    Syntax,
    /// Meaningless but well-formed input.
    Semantic,
    /// Use of a name with no visible declaration. A kind of semantic error.
    IllegalIdentifier,
    /// Internal inconsistency between pipeline stages.
    Logical,
    /// Reserved; never raised.
    Warning,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorKind::Warning)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = match self {
            ErrorKind::Lexical => "Lexical error",
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::Semantic | ErrorKind::IllegalIdentifier => "Semantic error",
            ErrorKind::Logical => "Logical error",
            ErrorKind::Warning => "Warning",
        };
        f.write_str(category)
    }
}

/// A compiler error with source location information.
///
/// The source text itself is not stored; the CLI attaches it with
/// [`miette::Report::with_source_code`] when rendering.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,

    #[label("{kind}")]
    pub span: SourceSpan,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: (span.start, span.len()).into(),
        }
    }

    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexical, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Semantic, message, span)
    }

    pub fn illegal_identifier(name: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::IllegalIdentifier,
            format!("'{}' is not declared", name),
            span,
        )
    }

    pub fn logical(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Logical, message, span)
    }

    /// Byte offset where the problem starts.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}
