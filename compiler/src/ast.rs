//! Abstract Syntax Tree for the tensor language.
//!
//! Every node keeps the token it was parsed from, for error reporting. The
//! hierarchy is closed: printing and code generation dispatch with
//! exhaustive `match`, and each child is owned by exactly one parent.
//!
//! ```text
//! Program ─ Statements ─ VarDec* ─ Expr
//!                                   ├─ Binary / Unary
//!                                   ├─ Scalar
//!                                   ├─ Identifier
//!                                   └─ Tensor(TensorLiteral)
//! ```

use crate::symbol_table::{VarKind, VarType};
use crate::token::{Span, Token};
use std::fmt;

/// A child of a [`Program`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Statements(Statements),
}

/// A labelled group of nodes; the root is labelled `compilation_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub label: String,
    pub token: Token,
    pub children: Vec<Node>,
}

impl Program {
    /// All declarations of the program, in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &VarDec> {
        self.children.iter().flat_map(|node| match node {
            Node::Statements(s) => s.declarations.iter(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statements {
    pub token: Token,
    pub declarations: Vec<VarDec>,
}

/// `let <type> <name> = <rhs>;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDec {
    pub token: Token,
    pub name: String,
    pub var_type: VarType,
    pub kind: VarKind,
    pub rhs: Expr,
}

// ── Expressions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub token: Token,
}

impl Expr {
    pub fn span(&self) -> Span {
        self.token.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `a + b`, `a * b`, ...
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `-a`, `~a`, `'a`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Numeric literal.
    Scalar(Scalar),

    /// Variable reference. `kind` is what the name resolved to when it was
    /// parsed; `None` means no declaration was visible.
    Identifier {
        name: String,
        kind: Option<VarKind>,
    },

    /// `{ ... }`
    Tensor(TensorLiteral),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar {
    pub value: f64,
    pub dtype: DataType,
}

impl Scalar {
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `~`
    Tilde,
    /// `'`
    Prime,
}

impl UnaryOp {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' => Some(UnaryOp::Neg),
            '~' => Some(UnaryOp::Tilde),
            '\'' => Some(UnaryOp::Prime),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            UnaryOp::Neg => '-',
            UnaryOp::Tilde => '~',
            UnaryOp::Prime => '\'',
        }
    }
}

// ── Tensor literals ──────────────────────────────────────────────────

/// A nested brace literal in sparse form.
///
/// A `Node` is one pair of braces. `extent` counts every element written
/// between them; `entries` holds only the non-zero ones, each tagged with
/// its position. Zero scalars are never materialized.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorLiteral {
    Leaf(Scalar),
    Node {
        extent: usize,
        entries: Vec<TensorEntry>,
    },
}

/// An element of a tensor node together with its position in the braces.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorEntry {
    pub index: usize,
    pub value: TensorLiteral,
}

impl TensorLiteral {
    /// Number of written elements; 0 for a leaf.
    pub fn extent(&self) -> usize {
        match self {
            TensorLiteral::Leaf(_) => 0,
            TensorLiteral::Node { extent, .. } => *extent,
        }
    }

    pub fn entries(&self) -> &[TensorEntry] {
        match self {
            TensorLiteral::Leaf(_) => &[],
            TensorLiteral::Node { entries, .. } => entries,
        }
    }

    /// First stored element one level down. The remaining entries are its
    /// siblings, in order.
    pub fn first_child(&self) -> Option<&TensorEntry> {
        self.entries().first()
    }

    /// Brace nesting depth: 0 for a leaf, 1 for `{1, 2}`.
    pub fn depth(&self) -> usize {
        match self {
            TensorLiteral::Leaf(_) => 0,
            TensorLiteral::Node { entries, .. } => {
                1 + entries.iter().map(|e| e.value.depth()).max().unwrap_or(0)
            }
        }
    }

    /// Number of stored (non-zero) scalars.
    pub fn leaf_count(&self) -> usize {
        match self {
            TensorLiteral::Leaf(_) => 1,
            TensorLiteral::Node { entries, .. } => {
                entries.iter().map(|e| e.value.leaf_count()).sum()
            }
        }
    }

    /// Coordinates and values of every stored scalar, in source order.
    pub fn nonzeros(&self) -> Vec<(Vec<usize>, f64)> {
        let mut out = Vec::new();
        collect_nonzeros(self, &mut Vec::new(), &mut out);
        out
    }
}

fn collect_nonzeros(t: &TensorLiteral, path: &mut Vec<usize>, out: &mut Vec<(Vec<usize>, f64)>) {
    match t {
        TensorLiteral::Leaf(s) => out.push((path.clone(), s.value)),
        TensorLiteral::Node { entries, .. } => {
            for entry in entries {
                path.push(entry.index);
                collect_nonzeros(&entry.value, path, out);
                path.pop();
            }
        }
    }
}

// ── Printing ─────────────────────────────────────────────────────────

struct Printer<'a, 'f> {
    f: &'a mut fmt::Formatter<'f>,
    depth: usize,
}

impl Printer<'_, '_> {
    fn line(&mut self, text: impl fmt::Display) -> fmt::Result {
        for _ in 0..self.depth {
            self.f.write_str("\t")?;
        }
        writeln!(self.f, "{}", text)
    }

    fn open(&mut self, tag: &str) -> fmt::Result {
        self.line(format_args!("<{}>", tag))?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> fmt::Result {
        self.depth -= 1;
        self.line(format_args!("</{}>", tag))
    }

    fn node(&mut self, node: &Node) -> fmt::Result {
        match node {
            Node::Statements(s) => {
                self.open("statements")?;
                for dec in &s.declarations {
                    self.var_dec(dec)?;
                }
                self.close("statements")
            }
        }
    }

    fn program(&mut self, p: &Program) -> fmt::Result {
        self.open(&p.label)?;
        for child in &p.children {
            self.node(child)?;
        }
        self.close(&p.label)
    }

    fn var_dec(&mut self, d: &VarDec) -> fmt::Result {
        self.open("var_dec")?;
        self.line(format_args!("{}{{{}}}:", d.name, d.var_type))?;
        self.expr(&d.rhs)?;
        self.close("var_dec")
    }

    fn expr(&mut self, e: &Expr) -> fmt::Result {
        match &e.kind {
            ExprKind::Binary { op, left, right } => {
                self.open("expr_node")?;
                self.expr(left)?;
                self.line(op.symbol())?;
                self.expr(right)?;
                self.close("expr_node")
            }
            ExprKind::Unary { op, operand } => {
                self.open("expr_node")?;
                self.line(op.symbol())?;
                self.expr(operand)?;
                self.close("expr_node")
            }
            ExprKind::Scalar(s) => self.line(s.value),
            ExprKind::Identifier { name, .. } => self.line(name),
            ExprKind::Tensor(t) => self.tensor(t),
        }
    }

    fn tensor(&mut self, t: &TensorLiteral) -> fmt::Result {
        match t {
            TensorLiteral::Leaf(s) => self.line(s.value),
            TensorLiteral::Node { entries, .. } => {
                self.open("tensor")?;
                for entry in entries {
                    self.line(format_args!("[{}]", entry.index))?;
                    self.depth += 1;
                    self.tensor(&entry.value)?;
                    self.depth -= 1;
                }
                self.close("tensor")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer { f, depth: 0 }.node(self)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer { f, depth: 0 }.program(self)
    }
}
