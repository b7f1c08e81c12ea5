use crate::{
    codegen::{
        context::{ClassContext, ProgramContext},
        error::FallableInstructions,
        symbols::Symbol,
        vm,
    },
    common::ast,
};

use super::expression;

pub fn construct(
    call: &ast::SubroutineCall,
    class_context: &mut ClassContext,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let argument_count = u16::try_from(call.arguments.len()).unwrap_or(u16::MAX);

    let (receiver_instructions, function_name, argument_count) =
        match determine_call_kind(call, class_context) {
            CallKind::CurrentClassMethod => {
                // the receiver is the object currently being worked on;
                // a plain `function` has none to pass along
                let receiver_push = match class_context.subroutine.kind {
                    ast::SubroutineKind::Constructor => vec![vm::push(vm::Segment::Pointer, 0)],
                    ast::SubroutineKind::Method => vec![vm::push(vm::Segment::Argument, 0)],
                    ast::SubroutineKind::Function => vec![],
                };

                (
                    receiver_push,
                    format!("{}.{}", class_context.class_name, call.name),
                    argument_count + 1,
                )
            }
            CallKind::ObjectMethod(symbol) => (
                vec![symbol.push()],
                format!("{}.{}", symbol.ty, call.name),
                argument_count + 1,
            ),
            CallKind::StaticFunction(class_name) => {
                program_context.os_library.note_usage(&class_name);

                (
                    vec![],
                    format!("{class_name}.{}", call.name),
                    argument_count,
                )
            }
        };

    let argument_instructions = call
        .arguments
        .iter()
        .map(|argument| expression::construct(argument, class_context, program_context))
        .collect::<Result<Vec<_>, _>>()?
        .concat();

    Ok([
        receiver_instructions,
        argument_instructions,
        vec![vm::call(function_name, argument_count)],
    ]
    .concat())
}

enum CallKind {
    /// `foo(...)`: a method of the class being compiled.
    CurrentClassMethod,
    /// `obj.foo(...)` where `obj` is a variable in scope: a method
    /// dispatched through the variable's declared type.
    ObjectMethod(Symbol),
    /// `Name.foo(...)` where `Name` is no variable: a constructor or
    /// function of another class, possibly an OS one.
    StaticFunction(String),
}

fn determine_call_kind(call: &ast::SubroutineCall, class_context: &ClassContext) -> CallKind {
    match &call.receiver {
        None => CallKind::CurrentClassMethod,
        Some(receiver) => match class_context.symbols.get(receiver) {
            Some(symbol) => CallKind::ObjectMethod(symbol.clone()),
            None => CallKind::StaticFunction(receiver.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{oslib::OsUsageNoteOutcome, symbols::SymbolKind};

    fn call(receiver: Option<&str>, name: &str, arguments: Vec<ast::Expression>) -> ast::SubroutineCall {
        ast::SubroutineCall {
            receiver: receiver.map(String::from),
            name: String::from(name),
            arguments,
        }
    }

    fn number(i: u16) -> ast::Expression {
        ast::Expression {
            term: ast::Term::IntegerConstant(i),
            tail: vec![],
        }
    }

    #[test]
    fn test_in_class_call_from_method_pushes_receiver() {
        let mut class_context = ClassContext::new(String::from("Square"));
        let mut program_context = ProgramContext::new();

        class_context.enter_subroutine(ast::SubroutineKind::Method, "moveUp");

        let expected = [
            "push argument 0",
            "push constant 2",
            "call Square.draw 2",
        ]
        .join("\n");

        assert!(construct(
            &call(None, "draw", vec![number(2)]),
            &mut class_context,
            &mut program_context
        )
        .is_ok_and(|instructions| vm::compile(instructions) == expected));
    }

    #[test]
    fn test_in_class_call_from_constructor_pushes_this() {
        let mut class_context = ClassContext::new(String::from("Square"));
        let mut program_context = ProgramContext::new();

        class_context.enter_subroutine(ast::SubroutineKind::Constructor, "new");

        let expected = ["push pointer 0", "call Square.draw 1"].join("\n");

        assert!(construct(
            &call(None, "draw", vec![]),
            &mut class_context,
            &mut program_context
        )
        .is_ok_and(|instructions| vm::compile(instructions) == expected));
    }

    #[test]
    fn test_method_call_through_variable_uses_its_type() {
        let mut class_context = ClassContext::new(String::from("Game"));
        let mut program_context = ProgramContext::new();

        class_context.enter_subroutine(ast::SubroutineKind::Function, "run");
        assert!(class_context
            .symbols
            .define(
                "square",
                SymbolKind::Var,
                ast::Type::Class(String::from("Square"))
            )
            .is_ok());

        let expected = [
            "push local 0",
            "push constant 3",
            "call Square.moveUp 2",
        ]
        .join("\n");

        assert!(construct(
            &call(Some("square"), "moveUp", vec![number(3)]),
            &mut class_context,
            &mut program_context
        )
        .is_ok_and(|instructions| vm::compile(instructions) == expected));
    }

    #[test]
    fn test_static_call_marks_library_usage() {
        let mut class_context = ClassContext::new(String::from("Main"));
        let mut program_context = ProgramContext::new();

        class_context.enter_subroutine(ast::SubroutineKind::Function, "main");

        let expected = ["push constant 7", "call Output.printInt 1"].join("\n");

        assert!(construct(
            &call(Some("Output"), "printInt", vec![number(7)]),
            &mut class_context,
            &mut program_context
        )
        .is_ok_and(|instructions| vm::compile(instructions) == expected));

        // already noted; noting again confirms it is a library class
        assert_eq!(
            program_context.os_library.note_usage("Output"),
            OsUsageNoteOutcome::OsClassUsageNoted
        );
    }

    #[test]
    fn test_arguments_are_evaluated_in_order() {
        let mut class_context = ClassContext::new(String::from("Main"));
        let mut program_context = ProgramContext::new();

        class_context.enter_subroutine(ast::SubroutineKind::Function, "main");

        let expected = [
            "push constant 1",
            "push constant 2",
            "push constant 3",
            "call Other.three 3",
        ]
        .join("\n");

        assert!(construct(
            &call(Some("Other"), "three", vec![number(1), number(2), number(3)]),
            &mut class_context,
            &mut program_context
        )
        .is_ok_and(|instructions| vm::compile(instructions) == expected));
    }
}
