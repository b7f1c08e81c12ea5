use crate::{
    codegen::{
        context::{ClassContext, ProgramContext},
        error::{Error, FallableInstructions},
        vm,
    },
    common::ast,
};

use super::{expression, subroutine_call};

pub fn construct(
    statement: &ast::Statement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    match statement {
        ast::Statement::Let(let_statement) => {
            construct_let(let_statement, class_context, program_context)
        }
        ast::Statement::If(if_statement) => {
            construct_if(if_statement, class_context, program_context)
        }
        ast::Statement::While(while_statement) => {
            construct_while(while_statement, class_context, program_context)
        }
        ast::Statement::Do(do_statement) => {
            construct_do(do_statement, class_context, program_context)
        }
        ast::Statement::Return(return_statement) => {
            construct_return(return_statement, class_context, program_context)
        }
    }
}

fn construct_block(
    statements: &[ast::Statement],
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    Ok(statements
        .iter()
        .map(|statement| construct(statement, class_context, program_context))
        .collect::<Result<Vec<_>, _>>()?
        .concat())
}

/// `let x = e` pops the evaluated value into the variable's slot.
/// `let x[i] = e` evaluates `e` first, so a nested indexed read inside
/// `e` cannot clobber the `pointer 1` set up for the write.
fn construct_let(
    statement: &ast::LetStatement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let value_instructions =
        expression::construct(&statement.value, class_context, program_context)?;

    let symbol = class_context
        .symbols
        .get(&statement.variable)
        .cloned()
        .ok_or_else(|| Error::VariableNotInScope(statement.variable.clone()))?;

    let Some(index) = &statement.index else {
        return Ok([value_instructions, vec![symbol.pop()]].concat());
    };

    let index_instructions = expression::construct(index, class_context, program_context)?;

    Ok([
        value_instructions,
        vec![symbol.push()],
        index_instructions,
        vec![
            vm::command(vm::VMCommand::Add),
            vm::pop(vm::Segment::Pointer, 1),
            vm::pop(vm::Segment::That, 0),
        ],
    ]
    .concat())
}

fn construct_if(
    statement: &ast::IfStatement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let else_label = class_context.subroutine.next_label();
    let end_label = class_context.subroutine.next_label();

    let condition_instructions =
        expression::construct(&statement.condition, class_context, program_context)?;
    let then_instructions =
        construct_block(&statement.then_branch, class_context, program_context)?;
    let else_instructions =
        construct_block(&statement.else_branch, class_context, program_context)?;

    Ok([
        condition_instructions,
        vec![
            vm::command(vm::VMCommand::Not),
            vm::if_goto(else_label.clone()),
        ],
        then_instructions,
        vec![vm::goto(end_label.clone()), vm::label(else_label)],
        else_instructions,
        vec![vm::label(end_label)],
    ]
    .concat())
}

fn construct_while(
    statement: &ast::WhileStatement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let loop_label = class_context.subroutine.next_label();
    let end_label = class_context.subroutine.next_label();

    let condition_instructions =
        expression::construct(&statement.condition, class_context, program_context)?;
    let body_instructions = construct_block(&statement.body, class_context, program_context)?;

    Ok([
        vec![vm::label(loop_label.clone())],
        condition_instructions,
        vec![
            vm::command(vm::VMCommand::Not),
            vm::if_goto(end_label.clone()),
        ],
        body_instructions,
        vec![vm::goto(loop_label), vm::label(end_label)],
    ]
    .concat())
}

/// A `do` call is evaluated for effect only; the returned value
/// is discarded into `temp 0`.
fn construct_do(
    statement: &ast::DoStatement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let call_instructions =
        subroutine_call::construct(&statement.call, class_context, program_context)?;

    Ok([call_instructions, vec![vm::pop(vm::Segment::Temp, 0)]].concat())
}

/// Void subroutines still return a value; the calling convention
/// requires one word on the stack, so `constant 0` stands in.
fn construct_return(
    statement: &ast::ReturnStatement,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let value_instructions = match &statement.value {
        Some(value) => expression::construct(value, class_context, program_context)?,
        None => vec![vm::push(vm::Segment::Constant, 0)],
    };

    Ok([value_instructions, vec![vm::vm_return()]].concat())
}
