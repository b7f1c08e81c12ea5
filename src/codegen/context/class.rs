use crate::{
    codegen::{symbols::SymbolTable, vm},
    common::{ast, labels::LabelAllocator},
};

// region: Context

/// Context information regarding the class currently being compiled.
#[derive(Debug)]
pub struct Context {
    pub class_name: String,
    pub symbols: SymbolTable,
    pub subroutine: SubroutineContext,
    pub output: vm::VMOutput,
}

impl Context {
    pub fn new(class_name: String) -> Self {
        // label base falls back to the class name until the first
        // subroutine is entered
        let subroutine = SubroutineContext::new(ast::SubroutineKind::Function, &class_name);

        Self {
            class_name,
            symbols: SymbolTable::new(),
            subroutine,
            output: vm::VMOutput::new(),
        }
    }

    /// Reset per-subroutine state: clears the subroutine symbol scope
    /// and starts a fresh label allocator scoped to `Class.subroutine`.
    pub fn enter_subroutine(&mut self, kind: ast::SubroutineKind, subroutine_name: &str) {
        self.symbols.start_subroutine();
        self.subroutine =
            SubroutineContext::new(kind, &format!("{}.{subroutine_name}", self.class_name));
    }
}

// endregion

// region: SubroutineContext

#[derive(Debug)]
pub struct SubroutineContext {
    pub kind: ast::SubroutineKind,
    label_base: String,
    labels: LabelAllocator,
}

impl SubroutineContext {
    fn new(kind: ast::SubroutineKind, label_base: &str) -> Self {
        Self {
            kind,
            label_base: label_base.to_string(),
            labels: LabelAllocator::new(),
        }
    }

    pub fn next_label(&mut self) -> String {
        self.labels.next(&self.label_base)
    }
}

// endregion
