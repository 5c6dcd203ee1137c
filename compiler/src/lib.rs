//! Tensor algebra compiler: source text to stack-machine instructions.
//!
//! # Compiler Pipeline
//!
//! ```text
//! Source Code (.tac)
//!     │
//!     ▼
//! ┌──────────┐
//! │  Lexer    │  Tokenizes source with one token of lookahead
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │  Parser   │  Recursive descent; fills the symbol table, writes the trace
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐
//! │ Codegen   │  Post-order AST walk against the parser's symbol table
//! └────┬─────┘
//!      │
//!      ▼
//! Instructions (.ir)
//! ```

pub mod ast;
pub mod codegen;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod token;
pub mod trace;
pub mod vm_writer;

pub use errors::{CompileError, CompileResult, ErrorKind};
pub use vm_writer::Instruction;

/// Parse and generate code for one compilation unit.
pub fn compile(source: &str) -> CompileResult<Vec<Instruction>> {
    let (program, symbols) = parser::parse(source)?;
    codegen::generate(&program, &symbols)
}

/// [`compile`], rendered as instruction lines.
pub fn compile_to_text(source: &str) -> CompileResult<String> {
    compile(source).map(|code| vm_writer::render(&code))
}
