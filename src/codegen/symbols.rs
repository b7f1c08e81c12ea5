use std::collections::HashMap;

use crate::common::ast;

use super::{
    error::{Error, FallableSymbol},
    vm,
};

/// Variable kinds a Jack identifier can be declared as.
///
/// `Static` and `Field` live in the class scope, `Arg` and `Var`
/// in the subroutine scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Static,
    Field,
    Arg,
    Var,
}

impl SymbolKind {
    /// The memory segment a symbol of this kind is stored in.
    pub const fn segment(self) -> vm::Segment {
        match self {
            Self::Static => vm::Segment::Static,
            Self::Field => vm::Segment::This,
            Self::Arg => vm::Segment::Argument,
            Self::Var => vm::Segment::Local,
        }
    }

    const fn is_class_scoped(self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }
}

impl From<ast::ClassVarKind> for SymbolKind {
    fn from(kind: ast::ClassVarKind) -> Self {
        match kind {
            ast::ClassVarKind::Static => Self::Static,
            ast::ClassVarKind::Field => Self::Field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub ty: ast::Type,
    pub index: u16,
}

impl Symbol {
    pub fn push(&self) -> vm::VMInstruction {
        vm::push(self.kind.segment(), self.index)
    }

    pub fn pop(&self) -> vm::VMInstruction {
        vm::pop(self.kind.segment(), self.index)
    }
}

/// Two-scope name-to-symbol mapping for one class compilation.
///
/// Indices are per-kind, contiguous and zero-based, assigned in
/// declaration order. Lookup resolves the subroutine scope first;
/// a name found in neither scope is reported as "not found" and the
/// caller decides whether that means "external class reference".
#[derive(Debug)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            class_scope: HashMap::new(),
            subroutine_scope: HashMap::new(),
        }
    }

    /// Clear the subroutine scope. Performed when entering
    /// a new subroutine declaration.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
    }

    /// Insert a symbol with `index = count_of(kind)` into the scope
    /// matching its kind. Re-declaring a name within one scope is
    /// an error.
    pub fn define(&mut self, name: &str, kind: SymbolKind, ty: ast::Type) -> FallableSymbol {
        let index = self.count_of(kind);

        let scope = if kind.is_class_scoped() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };

        if scope.contains_key(name) {
            return Err(Error::VariableAlreadyDefined(name.to_string()));
        }

        let symbol = Symbol { kind, ty, index };
        scope.insert(name.to_string(), symbol.clone());

        Ok(symbol)
    }

    /// Resolve a name, subroutine scope first.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    /// Number of symbols of the given kind defined in its scope.
    pub fn count_of(&self, kind: SymbolKind) -> u16 {
        let scope = if kind.is_class_scoped() {
            &self.class_scope
        } else {
            &self.subroutine_scope
        };

        let count = scope.values().filter(|symbol| symbol.kind == kind).count();
        u16::try_from(count).expect("symbol count fits the index range")
    }
}
