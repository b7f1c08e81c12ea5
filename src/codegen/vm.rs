//! Typed formatter for the VM commands the code generator emits.
//!
//! Instructions are built through the constructor shorthands below,
//! collected into a [`VMOutput`] per class and rendered to text once
//! at the end of the class.

use std::fmt;

pub use crate::common::segment::Segment;

type Label = String;
type FunctionName = String;

/// One textual VM command.
///
/// `push`/`pop` share a variant since they differ only in direction;
/// the three branching forms share one for the same reason.
#[derive(Debug, Clone)]
pub enum VMInstruction {
    Stack(StackAction, Segment, u16),
    Command(VMCommand),
    Branch(BranchAction, Label),
    Function(FunctionName, u16),
    Call(FunctionName, u16),
}

impl fmt::Display for VMInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stack(action, segment, index) => write!(f, "{action} {segment} {index}"),
            Self::Command(command) => write!(f, "{command}"),
            Self::Branch(action, label) => write!(f, "{action} {label}"),
            Self::Function(name, locals) => write!(f, "function {name} {locals}"),
            Self::Call(name, arguments) => write!(f, "call {name} {arguments}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StackAction {
    Push,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum BranchAction {
    Label,
    Goto,
    IfGoto,
}

/// The nine arithmetic mnemonics, plus `return`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum VMCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Return,
}

// region: constructor shorthands

pub fn push(segment: Segment, index: u16) -> VMInstruction {
    VMInstruction::Stack(StackAction::Push, segment, index)
}

pub fn pop(segment: Segment, index: u16) -> VMInstruction {
    VMInstruction::Stack(StackAction::Pop, segment, index)
}

pub fn command(command: VMCommand) -> VMInstruction {
    VMInstruction::Command(command)
}

pub fn vm_return() -> VMInstruction {
    VMInstruction::Command(VMCommand::Return)
}

pub fn label<S: Into<Label>>(label: S) -> VMInstruction {
    VMInstruction::Branch(BranchAction::Label, label.into())
}

pub fn goto<S: Into<Label>>(label: S) -> VMInstruction {
    VMInstruction::Branch(BranchAction::Goto, label.into())
}

pub fn if_goto<S: Into<Label>>(label: S) -> VMInstruction {
    VMInstruction::Branch(BranchAction::IfGoto, label.into())
}

pub fn function<S: Into<FunctionName>>(name: S, locals: u16) -> VMInstruction {
    VMInstruction::Function(name.into(), locals)
}

pub fn call<S: Into<FunctionName>>(name: S, arguments: u16) -> VMInstruction {
    VMInstruction::Call(name.into(), arguments)
}

// endregion

/// Render instructions as newline-separated command text.
pub fn compile(instructions: impl IntoIterator<Item = VMInstruction>) -> String {
    instructions
        .into_iter()
        .map(|instruction| instruction.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append-only collector for the VM output of one class.
#[derive(Debug)]
pub struct VMOutput {
    instructions: Vec<VMInstruction>,
}

impl VMOutput {
    pub const fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn append(&mut self, instructions: Vec<VMInstruction>) {
        self.instructions.extend(instructions);
    }

    pub fn compile(self) -> String {
        compile(self.instructions)
    }
}
