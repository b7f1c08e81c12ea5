use crate::{
    codegen::{
        context::{ClassContext, ProgramContext},
        error::{Error, FallableInstructions},
        vm,
    },
    common::ast,
};

use super::{literal, subroutine_call};

/// Compile `term (op term)*` strictly left to right: the head term,
/// then each tail term followed by its operator. No precedence is
/// applied; `2 + 3 * 4` multiplies 5 by 4.
pub fn construct(
    expression: &ast::Expression,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let mut instructions = construct_term(&expression.term, class_context, program_context)?;

    for (op, term) in &expression.tail {
        instructions.extend(construct_term(term, class_context, program_context)?);
        instructions.extend(binary_op(*op, program_context));
    }

    Ok(instructions)
}

fn construct_term(
    term: &ast::Term,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    match term {
        ast::Term::IntegerConstant(i) => Ok(literal::construct_integer(*i)),
        ast::Term::StringConstant(s) => Ok(literal::construct_string(s, program_context)),
        ast::Term::KeywordConstant(constant) => Ok(literal::construct_keyword(*constant)),
        ast::Term::Variable(name) => {
            let symbol = class_context
                .symbols
                .get(name)
                .ok_or_else(|| Error::VariableNotInScope(name.clone()))?;

            Ok(vec![symbol.push()])
        }
        ast::Term::IndexedVariable(name, index) => {
            construct_indexed_read(name, index, class_context, program_context)
        }
        ast::Term::Call(call) => subroutine_call::construct(call, class_context, program_context),
        ast::Term::Parenthesized(inner) => construct(inner, class_context, program_context),
        ast::Term::Unary(op, operand) => {
            let mut instructions = construct_term(operand, class_context, program_context)?;
            instructions.push(unary_op(*op));
            Ok(instructions)
        }
    }
}

/// `x[e]` as a value: `*(x + e)` read through the `that` segment.
fn construct_indexed_read(
    name: &str,
    index: &ast::Expression,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let array_push = class_context
        .symbols
        .get(name)
        .map(|symbol| symbol.push())
        .ok_or_else(|| Error::VariableNotInScope(name.to_string()))?;

    let index_instructions = construct(index, class_context, program_context)?;

    Ok([
        vec![array_push],
        index_instructions,
        vec![
            vm::command(vm::VMCommand::Add),
            vm::pop(vm::Segment::Pointer, 1),
            vm::push(vm::Segment::That, 0),
        ],
    ]
    .concat())
}

/// `*` and `/` have no VM counterpart and lower to OS calls,
/// which also makes `Math` a used library.
fn binary_op(
    op: ast::BinaryOp,
    program_context: &mut ProgramContext,
) -> Vec<vm::VMInstruction> {
    let arithmetic = |command| vec![vm::command(command)];

    match op {
        ast::BinaryOp::Add => arithmetic(vm::VMCommand::Add),
        ast::BinaryOp::Sub => arithmetic(vm::VMCommand::Sub),
        ast::BinaryOp::And => arithmetic(vm::VMCommand::And),
        ast::BinaryOp::Or => arithmetic(vm::VMCommand::Or),
        ast::BinaryOp::Lt => arithmetic(vm::VMCommand::Lt),
        ast::BinaryOp::Gt => arithmetic(vm::VMCommand::Gt),
        ast::BinaryOp::Eq => arithmetic(vm::VMCommand::Eq),
        ast::BinaryOp::Mul => {
            program_context.os_library.note_usage("Math");
            vec![vm::call("Math.multiply", 2)]
        }
        ast::BinaryOp::Div => {
            program_context.os_library.note_usage("Math");
            vec![vm::call("Math.divide", 2)]
        }
    }
}

fn unary_op(op: ast::UnaryOp) -> vm::VMInstruction {
    match op {
        ast::UnaryOp::Neg => vm::command(vm::VMCommand::Neg),
        ast::UnaryOp::Not => vm::command(vm::VMCommand::Not),
    }
}
