use super::{symbols, vm};

/// List of all errors that could possibly occur during code generation.
#[derive(Debug)]
pub enum Error {
    VariableAlreadyDefined(String),
    VariableNotInScope(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VariableAlreadyDefined(name) => {
                write!(f, "variable `{name}` is already defined in this scope")
            }
            Self::VariableNotInScope(name) => {
                write!(f, "variable `{name}` is not in scope")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type FallableAction = Result<(), Error>;
pub type FallableInstructions = Result<Vec<vm::VMInstruction>, Error>;
pub type FallableSymbol = Result<symbols::Symbol, Error>;
