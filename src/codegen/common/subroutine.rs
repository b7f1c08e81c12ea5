use crate::{
    codegen::{
        context::{ClassContext, ProgramContext},
        error::{FallableAction, FallableInstructions},
        symbols::SymbolKind,
        vm,
    },
    common::ast,
};

use super::statement;

pub fn construct(
    subroutine: &ast::SubroutineDec,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    class_context.enter_subroutine(subroutine.kind, &subroutine.name);

    define_subroutine_symbols(subroutine, class_context)?;

    let function_name = format!("{}.{}", class_context.class_name, subroutine.name);
    let local_count = class_context.symbols.count_of(SymbolKind::Var);

    let prologue = construct_prologue(subroutine.kind, class_context, program_context);

    let body_instructions = subroutine
        .body
        .statements
        .iter()
        .map(|s| statement::construct(s, class_context, program_context))
        .collect::<Result<Vec<_>, _>>()?
        .concat();

    Ok([
        vec![vm::function(function_name, local_count)],
        prologue,
        body_instructions,
    ]
    .concat())
}

fn define_subroutine_symbols(
    subroutine: &ast::SubroutineDec,
    class_context: &mut ClassContext,
) -> FallableAction {
    // a method receives its object as an implicit first argument,
    // reserving `argument 0` before any declared parameter
    if subroutine.kind == ast::SubroutineKind::Method {
        class_context.symbols.define(
            "this",
            SymbolKind::Arg,
            ast::Type::Class(class_context.class_name.clone()),
        )?;
    }

    for parameter in &subroutine.parameters {
        class_context
            .symbols
            .define(&parameter.name, SymbolKind::Arg, parameter.ty.clone())?;
    }

    for var_dec in &subroutine.body.var_decs {
        for name in &var_dec.names {
            class_context
                .symbols
                .define(name, SymbolKind::Var, var_dec.ty.clone())?;
        }
    }

    Ok(())
}

/// A constructor allocates room for the object's fields and binds
/// `this` to the fresh block; a method binds `this` to the receiver
/// passed in `argument 0`; a function has no prologue.
fn construct_prologue(
    kind: ast::SubroutineKind,
    class_context: &ClassContext,
    program_context: &mut ProgramContext,
) -> Vec<vm::VMInstruction> {
    match kind {
        ast::SubroutineKind::Constructor => {
            program_context.os_library.note_usage("Memory");

            vec![
                vm::push(
                    vm::Segment::Constant,
                    class_context.symbols.count_of(SymbolKind::Field),
                ),
                vm::call("Memory.alloc", 1),
                vm::pop(vm::Segment::Pointer, 0),
            ]
        }
        ast::SubroutineKind::Method => vec![
            vm::push(vm::Segment::Argument, 0),
            vm::pop(vm::Segment::Pointer, 0),
        ],
        ast::SubroutineKind::Function => vec![],
    }
}
