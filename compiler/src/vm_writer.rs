//! Stack-machine instruction set and its text serialization.
//!
//! The output format is one instruction per line:
//!
//! ```text
//! push constant 2
//! push constant 3
//! fadd
//! pop local 0
//! ```
//!
//! Constants print in shortest form, so `2.0` is written as `2`.

use crate::symbol_table::VarKind;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Memory segments addressable by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    Global,
    Pointer,
    This,
}

impl From<VarKind> for Segment {
    fn from(kind: VarKind) -> Self {
        match kind {
            VarKind::Arg => Segment::Argument,
            VarKind::Local => Segment::Local,
            VarKind::Global => Segment::Global,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::Global => "global",
            Segment::Pointer => "pointer",
            Segment::This => "this",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "fadd",
            ArithOp::Sub => "fsub",
            ArithOp::Mul => "fmult",
            ArithOp::Div => "fdiv",
            ArithOp::Neg => "fneg",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `push constant <value>`
    PushConstant(f64),
    /// `push <segment> <index>`
    Push { segment: Segment, index: usize },
    /// `pop <segment> <index>`
    Pop { segment: Segment, index: usize },
    /// `call <name> <nargs>`
    Call { name: String, nargs: usize },
    Arith(ArithOp),
}

impl Instruction {
    pub fn push(segment: Segment, index: usize) -> Self {
        Instruction::Push { segment, index }
    }

    pub fn pop(segment: Segment, index: usize) -> Self {
        Instruction::Pop { segment, index }
    }

    pub fn call(name: impl Into<String>, nargs: usize) -> Self {
        Instruction::Call {
            name: name.into(),
            nargs,
        }
    }
}

impl From<ArithOp> for Instruction {
    fn from(op: ArithOp) -> Self {
        Instruction::Arith(op)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushConstant(value) => write!(f, "push constant {}", value),
            Instruction::Push { segment, index } => write!(f, "push {} {}", segment, index),
            Instruction::Pop { segment, index } => write!(f, "pop {} {}", segment, index),
            Instruction::Call { name, nargs } => write!(f, "call {} {}", name, nargs),
            Instruction::Arith(op) => write!(f, "{}", op),
        }
    }
}

/// Heap allocation of `size` words: the size goes on the stack, then
/// `Memory.alloc` consumes it.
pub fn malloc(size: usize) -> [Instruction; 2] {
    [
        Instruction::PushConstant(size as f64),
        Instruction::call("Memory.alloc", 1),
    ]
}

/// Render instructions as newline-terminated lines.
pub fn render(code: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in code {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}

/// Write rendered instructions to `path`.
pub fn write_instructions(path: &Path, code: &[Instruction]) -> io::Result<()> {
    fs::write(path, render(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_text() {
        assert_eq!(Instruction::PushConstant(2.0).to_string(), "push constant 2");
        assert_eq!(Instruction::PushConstant(2.75).to_string(), "push constant 2.75");
        assert_eq!(Instruction::PushConstant(-0.5).to_string(), "push constant -0.5");
        assert_eq!(Instruction::push(Segment::Argument, 1).to_string(), "push argument 1");
        assert_eq!(Instruction::pop(Segment::Local, 0).to_string(), "pop local 0");
        assert_eq!(Instruction::push(Segment::This, 2).to_string(), "push this 2");
        assert_eq!(Instruction::pop(Segment::Pointer, 0).to_string(), "pop pointer 0");
    }

    #[test]
    fn test_arith_mnemonics() {
        let ops = [ArithOp::Add, ArithOp::Sub, ArithOp::Mul, ArithOp::Div, ArithOp::Neg];
        let text: Vec<String> = ops.iter().map(|op| Instruction::from(*op).to_string()).collect();
        assert_eq!(text, ["fadd", "fsub", "fmult", "fdiv", "fneg"]);
    }

    #[test]
    fn test_segment_from_kind() {
        assert_eq!(Segment::from(VarKind::Arg), Segment::Argument);
        assert_eq!(Segment::from(VarKind::Local), Segment::Local);
        assert_eq!(Segment::from(VarKind::Global), Segment::Global);
    }

    #[test]
    fn test_malloc() {
        let code = malloc(4);
        assert_eq!(render(&code), "push constant 4\ncall Memory.alloc 1\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_write_instructions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ir");
        let code = vec![
            Instruction::PushConstant(1.0),
            Instruction::Arith(ArithOp::Neg),
            Instruction::pop(Segment::Local, 0),
        ];
        write_instructions(&path, &code).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "push constant 1\nfneg\npop local 0\n");
    }
}
