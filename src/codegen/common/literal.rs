use crate::{
    codegen::{context::ProgramContext, vm},
    common::ast,
};

pub fn construct_integer(i: u16) -> Vec<vm::VMInstruction> {
    vec![vm::push(vm::Segment::Constant, i)]
}

/// A string literal allocates a `String` object and appends its
/// characters one by one; `appendChar` leaves the receiver on the
/// stack, so the finished string remains as the term's value.
pub fn construct_string(
    s: &str,
    program_context: &mut ProgramContext,
) -> Vec<vm::VMInstruction> {
    program_context.os_library.note_usage("String");

    let length = u16::try_from(s.chars().count()).unwrap_or(u16::MAX);

    let string_init = vec![
        vm::push(vm::Segment::Constant, length),
        vm::call("String.new", 1),
    ];

    let string_population = s
        .chars()
        .flat_map(|c| {
            vec![
                vm::push(vm::Segment::Constant, character_code(c)),
                vm::call("String.appendChar", 2),
            ]
        })
        .collect();

    [string_init, string_population].concat()
}

pub fn construct_keyword(constant: ast::KeywordConstant) -> Vec<vm::VMInstruction> {
    match constant {
        ast::KeywordConstant::True => vec![
            vm::push(vm::Segment::Constant, 1),
            vm::command(vm::VMCommand::Neg),
        ],
        ast::KeywordConstant::False | ast::KeywordConstant::Null => {
            vec![vm::push(vm::Segment::Constant, 0)]
        }
        ast::KeywordConstant::This => vec![vm::push(vm::Segment::Pointer, 0)],
    }
}

fn character_code(c: char) -> u16 {
    // Jack strings are effectively ASCII; wider scalars are truncated
    #[allow(clippy::cast_possible_truncation)]
    {
        u32::from(c) as u16
    }
}
