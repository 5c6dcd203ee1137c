//! Parser: recursive descent with one token of lookahead.
//!
//! Each grammar production is one method. The parser never backtracks and
//! stops at the first unexpected token.
//!
//! ```text
//! compilation_unit := statements EOF
//! statements       := var_dec*
//! var_dec          := 'let' type IDENT '=' expression ';'
//! type             := 'int' | 'float' | 'tensor'
//! expression       := term (('+' | '-') term)*
//! term             := factor (('*' | '/') factor)*
//! factor           := '(' expression ')' | primary
//! primary          := NUMBER | IDENT | tensor | ('-' | '~' | '\'') factor
//! tensor           := '{' [element (',' element)*] '}'
//! element          := tensor | ['-'] NUMBER
//! ```
//!
//! Precedence, tightest first: prefix operators, then `*` `/`, then `+` `-`.
//! Both binary levels are left-associative, so `8 / 4 / 2` is
//! `(8 / 4) / 2`.
//!
//! Names are resolved while parsing. A use looks itself up in the symbol
//! table on the spot and records the kind it found, or `None`. Unresolved
//! uses are not errors here; the code generator reports them. A declaration
//! enters the table only after its initializer is parsed, so `let int a = a;`
//! never sees itself.
//!
//! Every production also writes to the parse [`Trace`].
//!
//! Nesting is bounded. Parentheses, prefix operators and braces may nest at
//! most [`MAX_NESTING`] deep, and no expression tree may grow taller than
//! [`MAX_HEIGHT`]. Deeper input is a syntax error rather than a stack
//! overflow in the parser or in the passes that walk the tree.

use crate::ast::*;
use crate::errors::{CompileError, CompileResult};
use crate::lexer::Tokenizer;
use crate::symbol_table::{SymbolTable, VarKind, VarType};
use crate::token::{Keyword, Span, Token, TokenKind};
use crate::trace::Trace;

const COMPILATION_UNIT: &str = "compilation_unit";

/// Deepest allowed nesting of `(`, `{` and prefix operators.
pub const MAX_NESTING: usize = 128;

/// Tallest allowed expression tree, counting binary operators in a chain.
pub const MAX_HEIGHT: usize = 1024;

pub struct Parser<'src> {
    tokenizer: Tokenizer<'src>,
    symbols: SymbolTable,
    trace: Trace,
    nesting: usize,
    height: usize,
}

impl<'src> Parser<'src> {
    /// Create a parser over `source`. Fails if the first token is malformed.
    pub fn new(source: &'src str) -> CompileResult<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(source)?,
            symbols: SymbolTable::new(),
            trace: Trace::new(),
            nesting: 0,
            height: 0,
        })
    }

    pub fn without_trace(mut self) -> Self {
        self.trace = Trace::disabled();
        self
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Hand over the symbol table and trace once parsing is done.
    pub fn into_parts(self) -> (SymbolTable, Trace) {
        (self.symbols, self.trace)
    }

    // ── Productions ──────────────────────────────────────────────────

    pub fn parse_compilation_unit(&mut self) -> CompileResult<Program> {
        let token = self.current().clone();
        self.trace.open(COMPILATION_UNIT);

        let statements = self.statements()?;
        if !self.current().is_eof() {
            return Err(self.unexpected("'let' or end of input"));
        }

        self.trace.close(COMPILATION_UNIT);
        log::debug!("parsed {} declarations", statements.declarations.len());
        Ok(Program {
            label: COMPILATION_UNIT.to_string(),
            token,
            children: vec![Node::Statements(statements)],
        })
    }

    /// A statement list owns a fresh scope. Anything other than `let`
    /// ends it.
    fn statements(&mut self) -> CompileResult<Statements> {
        let token = self.current().clone();
        self.trace.open("statements");
        self.symbols = SymbolTable::new();

        let mut declarations = Vec::new();
        while self.current().is_keyword(Keyword::Let) {
            declarations.push(self.var_dec()?);
        }

        self.trace.close("statements");
        Ok(Statements {
            token,
            declarations,
        })
    }

    fn var_dec(&mut self) -> CompileResult<VarDec> {
        self.trace.open("var_dec");

        let token = self.expect_keyword(Keyword::Let)?;
        let var_type = self.var_type()?;
        let name = self.expect_identifier()?.lexeme;
        self.expect_symbol('=')?;
        let rhs = self.expression()?;

        let kind = VarKind::Local;
        self.symbols.define(&name, var_type, kind);

        self.expect_symbol(';')?;
        self.trace.close("var_dec");
        Ok(VarDec {
            token,
            name,
            var_type,
            kind,
            rhs,
        })
    }

    fn var_type(&mut self) -> CompileResult<VarType> {
        let var_type = match self.current().keyword() {
            Some(Keyword::Int) => VarType::Int,
            Some(Keyword::Float) => VarType::Float,
            Some(Keyword::Tensor) => VarType::Tensor,
            _ => return Err(self.unexpected("a type ('int', 'float' or 'tensor')")),
        };
        self.advance()?;
        Ok(var_type)
    }

    fn expression(&mut self) -> CompileResult<Expr> {
        self.trace.open("expression");
        let mut left = self.term()?;

        let mut chain = 0;
        while let Some(op) = self.binary_op(&[BinOp::Add, BinOp::Sub]) {
            let token = self.advance()?;
            self.grow(token.span)?;
            chain += 1;
            let right = self.term()?;
            left = binary(op, left, right, token);
        }
        self.height -= chain;

        self.trace.close("expression");
        Ok(left)
    }

    fn term(&mut self) -> CompileResult<Expr> {
        self.trace.open("term");
        let mut left = self.factor()?;

        let mut chain = 0;
        while let Some(op) = self.binary_op(&[BinOp::Mul, BinOp::Div]) {
            let token = self.advance()?;
            self.grow(token.span)?;
            chain += 1;
            let right = self.factor()?;
            left = binary(op, left, right, token);
        }
        self.height -= chain;

        self.trace.close("term");
        Ok(left)
    }

    fn factor(&mut self) -> CompileResult<Expr> {
        self.trace.open("factor");

        let expr = if self.current().is_symbol('(') {
            let open = self.advance()?;
            self.enter(open.span)?;
            let inner = self.expression()?;
            self.expect_symbol(')')?;
            self.leave();
            inner
        } else {
            self.primary()?
        };

        self.trace.close("factor");
        Ok(expr)
    }

    fn primary(&mut self) -> CompileResult<Expr> {
        self.trace.open("primary");
        let token = self.current().clone();

        let expr = match token.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                let scalar = self.scalar()?;
                Expr {
                    kind: ExprKind::Scalar(scalar),
                    token,
                }
            }
            TokenKind::Identifier => {
                let kind = self.symbols.kind_of(&token.lexeme);
                self.advance()?;
                Expr {
                    kind: ExprKind::Identifier {
                        name: token.lexeme.clone(),
                        kind,
                    },
                    token,
                }
            }
            TokenKind::Symbol if token.is_symbol('{') => Expr {
                kind: ExprKind::Tensor(self.tensor()?),
                token,
            },
            TokenKind::Symbol => match token.lexeme.chars().next().and_then(UnaryOp::from_symbol) {
                Some(op) => {
                    self.advance()?;
                    self.enter(token.span)?;
                    let operand = self.factor()?;
                    self.leave();
                    Expr {
                        kind: ExprKind::Unary {
                            op,
                            operand: Box::new(operand),
                        },
                        token,
                    }
                }
                None => return Err(self.unexpected("an expression")),
            },
            _ => return Err(self.unexpected("an expression")),
        };

        self.trace.close("primary");
        Ok(expr)
    }

    /// One pair of braces. Nesting is handled by recursion, one call per
    /// `{`, up to `MAX_NESTING`.
    fn tensor(&mut self) -> CompileResult<TensorLiteral> {
        self.trace.open("tensor");
        self.enter(self.current().span)?;
        let open = self.expect_symbol('{')?;

        let mut extent = 0;
        let mut entries = Vec::new();
        if !self.current().is_symbol('}') {
            loop {
                if let Some(value) = self.tensor_element()? {
                    entries.push(TensorEntry {
                        index: extent,
                        value,
                    });
                }
                extent += 1;

                if !self.current().is_symbol(',') {
                    break;
                }
                self.advance()?;
            }
        }

        if !self.current().is_symbol('}') {
            let found = describe(self.current());
            return Err(CompileError::syntax(
                format!("expected ',' or '}}' to close the tensor literal, found {}", found),
                open.span.merge(self.current().span),
            ));
        }
        self.advance()?;
        self.leave();

        self.trace.close("tensor");
        Ok(TensorLiteral::Node { extent, entries })
    }

    /// A nested literal, or a possibly negated number. Zero scalars are
    /// elided and come back as `None`.
    fn tensor_element(&mut self) -> CompileResult<Option<TensorLiteral>> {
        if self.current().is_symbol('{') {
            return self.tensor().map(Some);
        }

        let negative = self.current().is_symbol('-');
        if negative {
            self.advance()?;
        }
        if !self.current().is_number() {
            return Err(self.unexpected("a number or '{' inside the tensor literal"));
        }

        let mut scalar = self.scalar()?;
        if negative {
            scalar.value = -scalar.value;
        }
        if scalar.is_zero() {
            return Ok(None);
        }
        Ok(Some(TensorLiteral::Leaf(scalar)))
    }

    fn scalar(&mut self) -> CompileResult<Scalar> {
        let token = self.advance()?;
        let dtype = match token.kind {
            TokenKind::IntLiteral => DataType::Int,
            _ => DataType::Float,
        };
        let value = token.lexeme.parse::<f64>().map_err(|e| {
            CompileError::lexical(
                format!("invalid numeric literal '{}': {}", token.lexeme, e),
                token.span,
            )
        })?;
        if !value.is_finite() {
            return Err(CompileError::lexical(
                format!("numeric literal '{}' is out of range", token.lexeme),
                token.span,
            ));
        }
        Ok(Scalar { value, dtype })
    }

    // ── Nesting ──────────────────────────────────────────────────────

    /// Step one bracket or prefix level deeper. Undone by [`Self::leave`].
    fn enter(&mut self, span: Span) -> CompileResult<()> {
        if self.nesting == MAX_NESTING {
            return Err(CompileError::syntax(
                format!("nesting too deep (limit {})", MAX_NESTING),
                span,
            ));
        }
        self.nesting += 1;
        self.grow(span)
    }

    fn leave(&mut self) {
        self.nesting -= 1;
        self.height -= 1;
    }

    fn grow(&mut self, span: Span) -> CompileResult<()> {
        if self.height == MAX_HEIGHT {
            return Err(CompileError::syntax(
                format!("expression too deep (limit {})", MAX_HEIGHT),
                span,
            ));
        }
        self.height += 1;
        Ok(())
    }

    // ── Token-level helpers ──────────────────────────────────────────

    fn current(&self) -> &Token {
        self.tokenizer.current()
    }

    /// Consume the current token, recording it in the trace.
    fn advance(&mut self) -> CompileResult<Token> {
        if let Some(repr) = self.tokenizer.current_repr() {
            self.trace.line(&repr);
        }
        self.tokenizer.advance()
    }

    fn binary_op(&self, allowed: &[BinOp]) -> Option<BinOp> {
        allowed
            .iter()
            .copied()
            .find(|op| self.current().is_symbol(op.symbol()))
    }

    fn expect_symbol(&mut self, symbol: char) -> CompileResult<Token> {
        if self.current().is_symbol(symbol) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", symbol)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> CompileResult<Token> {
        if self.current().is_keyword(keyword) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", keyword.as_str())))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<Token> {
        if self.current().kind == TokenKind::Identifier {
            self.advance()
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.current();
        CompileError::syntax(
            format!("expected {}, found {}", expected, describe(token)),
            token.span,
        )
    }
}

fn describe(token: &Token) -> String {
    if token.is_eof() {
        "end of input".to_string()
    } else {
        format!("'{}'", token.lexeme)
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, token: Token) -> Expr {
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        token,
    }
}

/// Parse a whole compilation unit, returning the tree and the symbol table
/// the code generator needs.
pub fn parse(source: &str) -> CompileResult<(Program, SymbolTable)> {
    let mut parser = Parser::new(source)?.without_trace();
    let program = parser.parse_compilation_unit()?;
    let (symbols, _) = parser.into_parts();
    Ok((program, symbols))
}

/// Like [`parse`], but also returns the parse trace, which is kept even when
/// parsing fails.
pub fn parse_traced(source: &str) -> (CompileResult<(Program, SymbolTable)>, Trace) {
    let mut parser = match Parser::new(source) {
        Ok(parser) => parser,
        Err(e) => return (Err(e), Trace::new()),
    };
    let result = parser.parse_compilation_unit();
    let (symbols, trace) = parser.into_parts();
    (result.map(|program| (program, symbols)), trace)
}
