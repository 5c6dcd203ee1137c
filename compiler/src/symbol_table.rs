//! Symbol table: one flat scope of declared variables.
//!
//! Each statement list gets a fresh table. Names map to the most recent
//! declaration; the table also keeps every declaration in order, so a later
//! stage can ask what a name meant *before* a given declaration was made.
//!
//! Slots are numbered per kind: arguments, locals and globals each count
//! from 0, matching the `argument`/`local`/`global` segments the code
//! generator addresses.

use std::collections::HashMap;
use std::fmt;

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Int,
    Float,
    Tensor,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Tensor => "tensor",
        })
    }
}

/// Storage category of a variable. An unresolved name has no kind at all,
/// which the API expresses as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Arg,
    Local,
    Global,
}

impl VarKind {
    pub const ALL: [VarKind; 3] = [VarKind::Arg, VarKind::Local, VarKind::Global];

    fn counter(self) -> usize {
        match self {
            VarKind::Arg => 0,
            VarKind::Local => 1,
            VarKind::Global => 2,
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarKind::Arg => "arg",
            VarKind::Local => "local",
            VarKind::Global => "global",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub var_type: VarType,
    pub kind: VarKind,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Every declaration, in the order it was defined.
    declarations: Vec<SymbolEntry>,
    /// Name → position in `declarations` of its current binding.
    bindings: HashMap<String, usize>,
    /// Next free slot per kind.
    running: [usize; 3],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` at the next slot of `kind`.
    ///
    /// Redefining a name replaces its binding for every later lookup and
    /// allocates a fresh slot; the old slot is not reused.
    pub fn define(&mut self, name: &str, var_type: VarType, kind: VarKind) -> &SymbolEntry {
        let index = self.running[kind.counter()];
        self.running[kind.counter()] += 1;

        let ordinal = self.declarations.len();
        self.declarations.push(SymbolEntry {
            name: name.to_string(),
            var_type,
            kind,
            index,
        });
        if let Some(previous) = self.bindings.insert(name.to_string(), ordinal) {
            log::debug!(
                "'{}' redefined: slot {} replaced by {} {} {}",
                name,
                self.declarations[previous].index,
                kind,
                var_type,
                index
            );
        } else {
            log::debug!("defined '{}' as {} {} {}", name, kind, var_type, index);
        }
        &self.declarations[ordinal]
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.bindings.get(name).map(|&i| &self.declarations[i])
    }

    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.get(name).map(|e| e.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<VarType> {
        self.get(name).map(|e| e.var_type)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.get(name).map(|e| e.index)
    }

    /// Number of names currently bound with the given kind.
    pub fn var_count(&self, kind: VarKind) -> usize {
        self.bindings
            .values()
            .filter(|&&i| self.declarations[i].kind == kind)
            .count()
    }

    /// The slot the next declaration of `kind` will receive.
    pub fn running_index(&self, kind: VarKind) -> usize {
        self.running[kind.counter()]
    }

    /// Number of declarations recorded, including overwritten ones.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// The declaration made `ordinal`-th (0-based).
    pub fn declaration(&self, ordinal: usize) -> Option<&SymbolEntry> {
        self.declarations.get(ordinal)
    }

    /// Resolve `name` as the table stood when only the first `ordinal`
    /// declarations had been made.
    pub fn lookup_before(&self, name: &str, ordinal: usize) -> Option<&SymbolEntry> {
        self.declarations[..ordinal.min(self.declarations.len())]
            .iter()
            .rev()
            .find(|e| e.name == name)
    }
}
