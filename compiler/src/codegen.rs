//! Code generator: AST to stack-machine instructions.
//!
//! A post-order walk. Operands are generated before the instruction that
//! consumes them, and a declaration's initializer before the `pop` that
//! stores it.
//!
//! Slots come from the symbol table the parser filled in; the generator
//! does not define anything itself. Instead it replays the table: a
//! watermark counts the declarations generated so far, and name lookups
//! only see declarations below it. That way a use inside an initializer
//! resolves against exactly the declarations the parser had seen.

use crate::ast::*;
use crate::errors::{CompileError, CompileResult};
use crate::symbol_table::{SymbolEntry, SymbolTable};
use crate::vm_writer::{ArithOp, Instruction, Segment};

pub struct CodeGenerator<'a> {
    symbols: &'a SymbolTable,
    /// Declarations generated so far.
    declared: usize,
    code: Vec<Instruction>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            declared: 0,
            code: Vec::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> CompileResult<Vec<Instruction>> {
        self.program(program)?;

        if self.declared != self.symbols.len() {
            return Err(CompileError::logical(
                format!(
                    "symbol table holds {} declarations but the program makes {}",
                    self.symbols.len(),
                    self.declared
                ),
                program.token.span,
            ));
        }

        log::debug!("generated {} instructions", self.code.len());
        Ok(self.code)
    }

    // ── Nodes ────────────────────────────────────────────────────────

    fn node(&mut self, node: &Node) -> CompileResult<()> {
        match node {
            Node::Statements(s) => {
                for dec in &s.declarations {
                    self.var_dec(dec)?;
                }
                Ok(())
            }
        }
    }

    fn program(&mut self, program: &Program) -> CompileResult<()> {
        for child in &program.children {
            self.node(child)?;
        }
        Ok(())
    }

    fn var_dec(&mut self, dec: &VarDec) -> CompileResult<()> {
        self.expr(&dec.rhs)?;

        let entry = self.register(dec)?;
        let (segment, index) = (Segment::from(entry.kind), entry.index);
        log::trace!("'{}' stored to {} {}", dec.name, segment, index);
        self.emit(Instruction::pop(segment, index));
        Ok(())
    }

    /// Make the next recorded declaration visible. It must be the one `dec`
    /// describes.
    fn register(&mut self, dec: &VarDec) -> CompileResult<&'a SymbolEntry> {
        let symbols = self.symbols;
        match symbols.declaration(self.declared) {
            Some(entry)
                if entry.name == dec.name
                    && entry.kind == dec.kind
                    && entry.var_type == dec.var_type =>
            {
                self.declared += 1;
                Ok(entry)
            }
            Some(entry) => Err(CompileError::logical(
                format!(
                    "declaration of '{}' does not match symbol table entry '{}' ({} {})",
                    dec.name, entry.name, entry.kind, entry.var_type
                ),
                dec.token.span,
            )),
            None => Err(CompileError::logical(
                format!("declaration of '{}' is missing from the symbol table", dec.name),
                dec.token.span,
            )),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Binary { op, left, right } => {
                self.expr(left)?;
                self.expr(right)?;
                let op = match op {
                    BinOp::Add => ArithOp::Add,
                    BinOp::Sub => ArithOp::Sub,
                    BinOp::Mul => ArithOp::Mul,
                    BinOp::Div => ArithOp::Div,
                };
                self.emit(op.into());
            }
            ExprKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Neg => ArithOp::Neg,
                    UnaryOp::Tilde | UnaryOp::Prime => {
                        return Err(CompileError::semantic(
                            format!("operator '{}' has no instruction", op.symbol()),
                            expr.span(),
                        ));
                    }
                };
                self.expr(operand)?;
                self.emit(op.into());
            }
            ExprKind::Scalar(s) => self.emit(Instruction::PushConstant(s.value)),
            ExprKind::Identifier { name, kind } => {
                let Some(kind) = kind else {
                    return Err(CompileError::illegal_identifier(name, expr.span()));
                };
                let found = self.symbols.lookup_before(name, self.declared);
                let Some(entry) = found.filter(|e| e.kind == *kind) else {
                    return Err(CompileError::logical(
                        format!("'{}' resolved as {} but has no entry", name, kind),
                        expr.span(),
                    ));
                };
                self.emit(Instruction::push(entry.kind.into(), entry.index));
            }
            ExprKind::Tensor(t) => {
                log::trace!("tensor depth {} with {} stored scalars", t.depth(), t.leaf_count());
                self.tensor(t);
            }
        }
        Ok(())
    }

    /// Header of extent and stored count, then each stored entry as its
    /// index followed by its own code.
    fn tensor(&mut self, tensor: &TensorLiteral) {
        match tensor {
            TensorLiteral::Leaf(s) => self.emit(Instruction::PushConstant(s.value)),
            TensorLiteral::Node { extent, entries } => {
                self.emit(Instruction::PushConstant(*extent as f64));
                self.emit(Instruction::PushConstant(entries.len() as f64));
                for entry in entries {
                    self.emit(Instruction::PushConstant(entry.index as f64));
                    self.tensor(&entry.value);
                }
            }
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }
}

/// Generate code for a parsed program with the symbol table its parse
/// produced.
pub fn generate(program: &Program, symbols: &SymbolTable) -> CompileResult<Vec<Instruction>> {
    CodeGenerator::new(symbols).generate(program)
}
