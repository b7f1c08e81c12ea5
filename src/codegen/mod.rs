//! Logic for converting parsed Jack code (_AST_)
//! to Hack VM instructions.

use context::{ClassContext, ProgramContext};

use crate::common::ast;

mod common;
pub mod context;
pub mod error;
pub mod oslib;
pub mod symbols;
pub mod vm;

pub fn construct_class(
    class: &ast::Class,
    program_context: &mut ProgramContext,
) -> Result<String, error::Error> {
    let mut class_context = ClassContext::new(class.name.clone());

    define_class_symbols(class, &mut class_context)?;

    for subroutine in &class.subroutines {
        let instructions =
            common::subroutine::construct(subroutine, &mut class_context, program_context)?;

        class_context.output.append(instructions);
    }

    Ok(class_context.output.compile())
}

fn define_class_symbols(
    class: &ast::Class,
    class_context: &mut ClassContext,
) -> error::FallableAction {
    for var_dec in &class.var_decs {
        for name in &var_dec.names {
            class_context
                .symbols
                .define(name, var_dec.kind.into(), var_dec.ty.clone())?;
        }
    }

    Ok(())
}
