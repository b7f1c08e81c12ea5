//! Translation of VM commands into Hack assembly.
//!
//! Every VM command maps to a fixed instruction sequence over the
//! canonical memory layout: the stack pointer at `SP` (RAM[0]), the
//! `LCL`/`ARG`/`THIS`/`THAT` base pointers, scratch registers
//! `R13..R15` and the `temp` segment at `R5..R12`.

pub mod command;
pub mod emitter;
pub mod error;
pub mod parser;

use std::io::{self, Write};

use crate::common::labels::LabelAllocator;

use command::{ArithmeticOp, Command, Segment};
use emitter::AsmEmitter;

/// Translation-wide configuration.
///
/// Bootstrap emission is an explicit decision, not inferred from the
/// number of input files: a lone `Sys.vm` still boots when asked to,
/// and a directory translation can skip the boot sequence for the
/// CPU-emulator test setups that preload the stack themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub bootstrap: bool,
    pub debug: bool,
}

pub struct Translator<W: Write> {
    emitter: AsmEmitter<W>,
    labels: LabelAllocator,
    debug: bool,
}

impl<W: Write> Translator<W> {
    pub fn new(out: W, options: Options) -> Self {
        let mut translator = Self {
            emitter: AsmEmitter::new(out),
            labels: LabelAllocator::new(),
            debug: options.debug,
        };

        if options.bootstrap {
            translator.bootstrap();
        }

        translator
    }

    /// A view bound to one input file: controls static segment naming
    /// and tracks the current function for label scoping.
    pub fn file(&mut self, short_name: impl Into<String>) -> FileTranslator<'_, W> {
        FileTranslator {
            translator: self,
            file_name: short_name.into(),
            function_name: String::new(),
        }
    }

    /// Flush the underlying sink and surface the first write error.
    pub fn finish(self) -> io::Result<()> {
        self.emitter.finish()
    }

    /// `SP = 256; call Sys.init 0`.
    fn bootstrap(&mut self) {
        let lines = [
            vec![
                String::from("@256"),
                String::from("D=A"),
                String::from("@SP"),
                String::from("M=D"),
            ],
            self.call("Sys.init", 0),
        ]
        .concat();

        self.emitter.write_lines(&lines);
    }

    fn command(&mut self, command: &Command, file_name: &str, function_name: &mut String) {
        let asm = match command {
            Command::Arithmetic(op) => self.arithmetic(*op),
            Command::Push(segment, index) => push(*segment, *index, file_name),
            Command::Pop(segment, index) => pop(*segment, *index, file_name),
            Command::Label(label) => {
                vec![format!("({})", scoped_label(function_name, label))]
            }
            Command::Goto(label) => vec![
                format!("@{}", scoped_label(function_name, label)),
                String::from("0;JMP"),
            ],
            Command::IfGoto(label) => [
                pop_to_d(),
                vec![
                    format!("@{}", scoped_label(function_name, label)),
                    String::from("D;JNE"),
                ],
            ]
            .concat(),
            Command::Function(name, locals) => {
                function_name.clone_from(name);
                function(name, *locals)
            }
            Command::Call(name, arguments) => self.call(name, *arguments),
            Command::Return => frame_return(),
        };

        if self.debug {
            self.emitter.write_lines(&[format!("// {command}")]);
        }
        self.emitter.write_lines(&asm);
    }

    fn arithmetic(&mut self, op: ArithmeticOp) -> Vec<String> {
        match op {
            ArithmeticOp::Neg => unary("M=-M"),
            ArithmeticOp::Not => unary("M=!M"),
            ArithmeticOp::Add => binary("M=M+D"),
            ArithmeticOp::Sub => binary("M=M-D"),
            ArithmeticOp::And => binary("M=M&D"),
            ArithmeticOp::Or => binary("M=M|D"),
            ArithmeticOp::Eq => self.comparison("D;JEQ"),
            ArithmeticOp::Gt => self.comparison("D;JGT"),
            ArithmeticOp::Lt => self.comparison("D;JLT"),
        }
    }

    /// `x cmp y`: write `-1` (true) into `x`'s cell up front, jump out
    /// on the matching condition, and let the fall-through overwrite
    /// with `0`. Both paths converge on the same `CMP.{n}` label.
    fn comparison(&mut self, jump: &str) -> Vec<String> {
        let label = self.labels.next("CMP");

        vec![
            String::from("@SP"),
            String::from("M=M-1"),
            String::from("A=M"),
            String::from("D=M"),
            String::from("A=A-1"),
            String::from("D=M-D"),
            String::from("M=-1"),
            format!("@{label}"),
            String::from(jump),
            String::from("@SP"),
            String::from("A=M-1"),
            String::from("M=0"),
            format!("({label})"),
        ]
    }

    /// Save the caller frame (return address plus four base pointers),
    /// reposition `ARG`/`LCL` and transfer control. The return-address
    /// label lands right after the jump.
    fn call(&mut self, name: &str, arguments: u16) -> Vec<String> {
        let return_label = self.labels.next("RET");

        [
            push_address(&return_label),
            push_pointer_value("@LCL"),
            push_pointer_value("@ARG"),
            push_pointer_value("@THIS"),
            push_pointer_value("@THAT"),
            vec![
                String::from("@SP"),
                String::from("D=M"),
                format!("@{}", 5 + arguments),
                String::from("D=D-A"),
                String::from("@ARG"),
                String::from("M=D"),
                String::from("@SP"),
                String::from("D=M"),
                String::from("@LCL"),
                String::from("M=D"),
                format!("@{name}"),
                String::from("0;JMP"),
                format!("({return_label})"),
            ],
        ]
        .concat()
    }
}

// region: per-file view

pub struct FileTranslator<'a, W: Write> {
    translator: &'a mut Translator<W>,
    file_name: String,
    function_name: String,
}

impl<W: Write> FileTranslator<'_, W> {
    pub fn command(&mut self, command: &Command) {
        self.translator
            .command(command, &self.file_name, &mut self.function_name);
    }
}

/// Labels are scoped to the lexically enclosing function;
/// outside any function the scope prefix is empty (`$L`).
fn scoped_label(function_name: &str, label: &str) -> String {
    format!("{function_name}${label}")
}

// endregion

// region: instruction sequences

fn unary(op: &str) -> Vec<String> {
    vec![
        String::from("@SP"),
        String::from("A=M-1"),
        String::from(op),
    ]
}

fn binary(op: &str) -> Vec<String> {
    vec![
        String::from("@SP"),
        String::from("M=M-1"),
        String::from("A=M"),
        String::from("D=M"),
        String::from("A=A-1"),
        String::from(op),
    ]
}

/// `*SP = D; SP++`.
fn push_d_tail() -> Vec<String> {
    vec![
        String::from("@SP"),
        String::from("M=M+1"),
        String::from("A=M-1"),
        String::from("M=D"),
    ]
}

/// `SP--; D = *SP`.
fn pop_to_d() -> Vec<String> {
    vec![
        String::from("@SP"),
        String::from("M=M-1"),
        String::from("A=M"),
        String::from("D=M"),
    ]
}

fn push_address(label: &str) -> Vec<String> {
    [
        vec![format!("@{label}"), String::from("D=A")],
        push_d_tail(),
    ]
    .concat()
}

/// Push the value held in a base-pointer register (not the segment
/// entry it points at).
fn push_pointer_value(symbol: &str) -> Vec<String> {
    [
        vec![String::from(symbol), String::from("D=M")],
        push_d_tail(),
    ]
    .concat()
}

fn base_symbol(segment: Segment) -> &'static str {
    match segment {
        Segment::Argument => "@ARG",
        Segment::Local => "@LCL",
        Segment::This => "@THIS",
        Segment::That => "@THAT",
        _ => unreachable!("segment has no base pointer"),
    }
}

fn pointer_symbol(index: u16) -> &'static str {
    if index == 0 {
        "@THIS"
    } else {
        "@THAT"
    }
}

fn push(segment: Segment, index: u16, file_name: &str) -> Vec<String> {
    let load_d = match segment {
        Segment::Argument | Segment::Local | Segment::This | Segment::That => vec![
            String::from(base_symbol(segment)),
            String::from("D=M"),
            format!("@{index}"),
            String::from("A=D+A"),
            String::from("D=M"),
        ],
        Segment::Pointer => vec![String::from(pointer_symbol(index)), String::from("D=M")],
        Segment::Temp => vec![format!("@R{}", 5 + index), String::from("D=M")],
        Segment::Static => vec![format!("@{file_name}.{index}"), String::from("D=M")],
        Segment::Constant => vec![format!("@{index}"), String::from("D=A")],
    };

    [load_d, push_d_tail()].concat()
}

fn pop(segment: Segment, index: u16, file_name: &str) -> Vec<String> {
    let position = match segment {
        Segment::Argument | Segment::Local | Segment::This | Segment::That => {
            // compute the target address first, park it in R13
            return [
                vec![
                    String::from(base_symbol(segment)),
                    String::from("D=M"),
                    format!("@{index}"),
                    String::from("D=D+A"),
                    String::from("@R13"),
                    String::from("M=D"),
                ],
                pop_to_d(),
                vec![
                    String::from("@R13"),
                    String::from("A=M"),
                    String::from("M=D"),
                ],
            ]
            .concat();
        }
        Segment::Pointer => String::from(pointer_symbol(index)),
        Segment::Temp => format!("@R{}", 5 + index),
        Segment::Static => format!("@{file_name}.{index}"),
        Segment::Constant => unreachable!("`pop constant` is rejected at parse"),
    };

    [pop_to_d(), vec![position, String::from("M=D")]].concat()
}

fn function(name: &str, locals: u16) -> Vec<String> {
    let mut asm = vec![format!("({name})")];
    for _ in 0..locals {
        asm.extend([
            String::from("@SP"),
            String::from("M=M+1"),
            String::from("A=M-1"),
            String::from("M=0"),
        ]);
    }
    asm
}

/// Unwind the current frame: stash `FRAME`/`RET` in `R14`/`R15`, plant
/// the return value at `*ARG`, restore the four saved base pointers
/// and jump to the caller.
fn frame_return() -> Vec<String> {
    let restore = |symbol: &str| {
        vec![
            String::from("@R14"),
            String::from("D=M-1"),
            String::from("AM=D"),
            String::from("D=M"),
            String::from(symbol),
            String::from("M=D"),
        ]
    };

    [
        vec![
            String::from("@LCL"),
            String::from("D=M"),
            String::from("@R14"),
            String::from("M=D"),
            String::from("@5"),
            String::from("A=D-A"),
            String::from("D=M"),
            String::from("@R15"),
            String::from("M=D"),
        ],
        pop_to_d(),
        vec![
            String::from("@ARG"),
            String::from("A=M"),
            String::from("M=D"),
            String::from("@ARG"),
            String::from("D=M+1"),
            String::from("@SP"),
            String::from("M=D"),
        ],
        restore("@THAT"),
        restore("@THIS"),
        restore("@ARG"),
        restore("@LCL"),
        vec![
            String::from("@R15"),
            String::from("A=M"),
            String::from("0;JMP"),
        ],
    ]
    .concat()
}

// endregion

#[cfg(test)]
mod tests {
    use super::*;
    use command::ArithmeticOp as Op;

    fn translate(commands: &[Command], options: Options) -> String {
        let mut out = Vec::new();

        let mut translator = Translator::new(&mut out, options);
        {
            let mut file = translator.file("Test");
            for command in commands {
                file.command(command);
            }
        }
        translator.finish().expect("in-memory sink cannot fail");

        String::from_utf8(out).expect("assembly is ASCII")
    }

    // region: Hack machine simulation

    /// Two-pass symbolic assembler plus CPU interpreter, enough to
    /// execute the instruction sequences this translator emits.
    fn simulate(asm: &str, max_steps: usize) -> Vec<i16> {
        use std::collections::HashMap;

        enum Instruction {
            At(i16),
            Compute {
                dest: String,
                comp: String,
                jump: String,
            },
        }

        let mut symbols: HashMap<String, i16> = [
            ("SP", 0),
            ("LCL", 1),
            ("ARG", 2),
            ("THIS", 3),
            ("THAT", 4),
            ("SCREEN", 16384),
            ("KBD", 24576),
        ]
        .into_iter()
        .map(|(name, address)| (name.to_string(), address))
        .collect();
        for register in 0..16 {
            symbols.insert(format!("R{register}"), register);
        }

        // first pass: label addresses
        let mut address = 0;
        for line in asm.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(label) = line.strip_prefix('(') {
                let label = label.strip_suffix(')').expect("well-formed label");
                symbols.insert(label.to_string(), address);
            } else {
                address += 1;
            }
        }

        // second pass: instructions, allocating variables from 16
        let mut next_variable = 16;
        let mut instructions = Vec::new();
        for line in asm.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('(') {
                continue;
            }

            if let Some(value) = line.strip_prefix('@') {
                let address = value.parse::<i16>().unwrap_or_else(|_| {
                    *symbols.entry(value.to_string()).or_insert_with(|| {
                        let address = next_variable;
                        next_variable += 1;
                        address
                    })
                });
                instructions.push(Instruction::At(address));
            } else {
                let (rest, jump) = match line.split_once(';') {
                    Some((rest, jump)) => (rest, jump),
                    None => (line, ""),
                };
                let (dest, comp) = match rest.split_once('=') {
                    Some((dest, comp)) => (dest, comp),
                    None => ("", rest),
                };
                instructions.push(Instruction::Compute {
                    dest: dest.to_string(),
                    comp: comp.to_string(),
                    jump: jump.to_string(),
                });
            }
        }

        let mut ram = vec![0_i16; 32768];
        let (mut a, mut d) = (0_i16, 0_i16);
        let mut pc = 0_usize;

        for _ in 0..max_steps {
            let Some(instruction) = instructions.get(pc) else {
                break;
            };

            match instruction {
                Instruction::At(value) => {
                    a = *value;
                    pc += 1;
                }
                Instruction::Compute { dest, comp, jump } => {
                    let m = ram[a as u16 as usize % 32768];
                    let value = match comp.as_str() {
                        "0" => 0,
                        "1" => 1,
                        "-1" => -1,
                        "D" => d,
                        "A" => a,
                        "M" => m,
                        "!D" => !d,
                        "!A" => !a,
                        "!M" => !m,
                        "-D" => d.wrapping_neg(),
                        "-A" => a.wrapping_neg(),
                        "-M" => m.wrapping_neg(),
                        "D+1" => d.wrapping_add(1),
                        "A+1" => a.wrapping_add(1),
                        "M+1" => m.wrapping_add(1),
                        "D-1" => d.wrapping_sub(1),
                        "A-1" => a.wrapping_sub(1),
                        "M-1" => m.wrapping_sub(1),
                        "D+A" | "A+D" => d.wrapping_add(a),
                        "D+M" | "M+D" => d.wrapping_add(m),
                        "D-A" => d.wrapping_sub(a),
                        "A-D" => a.wrapping_sub(d),
                        "D-M" => d.wrapping_sub(m),
                        "M-D" => m.wrapping_sub(d),
                        "D&A" | "A&D" => d & a,
                        "D&M" | "M&D" => d & m,
                        "D|A" | "A|D" => d | a,
                        "D|M" | "M|D" => d | m,
                        other => panic!("unsupported computation: {other}"),
                    };

                    if dest.contains('M') {
                        ram[a as u16 as usize % 32768] = value;
                    }
                    if dest.contains('A') {
                        a = value;
                    }
                    if dest.contains('D') {
                        d = value;
                    }

                    let jumped = match jump.as_str() {
                        "" => false,
                        "JGT" => value > 0,
                        "JEQ" => value == 0,
                        "JGE" => value >= 0,
                        "JLT" => value < 0,
                        "JNE" => value != 0,
                        "JLE" => value <= 0,
                        "JMP" => true,
                        other => panic!("unsupported jump: {other}"),
                    };

                    if jumped {
                        pc = a as u16 as usize;
                    } else {
                        pc += 1;
                    }
                }
            }
        }

        ram
    }

    fn run(commands: &[Command]) -> Vec<i16> {
        // test programs start with an empty stack at 256
        let asm = format!(
            "@256\nD=A\n@SP\nM=D\n{}",
            translate(commands, Options::default())
        );
        simulate(&asm, 10_000)
    }

    // endregion

    #[test]
    fn test_add_leaves_sum_on_stack() {
        let ram = run(&[
            Command::Push(Segment::Constant, 7),
            Command::Push(Segment::Constant, 8),
            Command::Arithmetic(Op::Add),
        ]);

        assert_eq!(ram[0], 257);
        assert_eq!(ram[256], 15);
    }

    #[test]
    fn test_neg_is_twos_complement() {
        let ram = run(&[
            Command::Push(Segment::Constant, 5),
            Command::Arithmetic(Op::Neg),
        ]);

        assert_eq!(ram[0], 257);
        // 65531 as an unsigned 16-bit word
        assert_eq!(ram[256], -5);
    }

    #[test]
    fn test_comparison_is_all_bits_or_zero() {
        let equal = run(&[
            Command::Push(Segment::Constant, 3),
            Command::Push(Segment::Constant, 3),
            Command::Arithmetic(Op::Eq),
        ]);
        assert_eq!(equal[0], 257);
        assert_eq!(equal[256], -1);

        let unequal = run(&[
            Command::Push(Segment::Constant, 3),
            Command::Push(Segment::Constant, 4),
            Command::Arithmetic(Op::Eq),
        ]);
        assert_eq!(unequal[256], 0);

        let less = run(&[
            Command::Push(Segment::Constant, 2),
            Command::Push(Segment::Constant, 3),
            Command::Arithmetic(Op::Lt),
        ]);
        assert_eq!(less[256], -1);

        let greater = run(&[
            Command::Push(Segment::Constant, 2),
            Command::Push(Segment::Constant, 3),
            Command::Arithmetic(Op::Gt),
        ]);
        assert_eq!(greater[256], 0);
    }

    #[test]
    fn test_segment_push_pop_roundtrip() {
        let ram = run(&[
            // aim THIS at 300 through the pointer segment
            Command::Push(Segment::Constant, 300),
            Command::Pop(Segment::Pointer, 0),
            // this 2 = 37
            Command::Push(Segment::Constant, 37),
            Command::Pop(Segment::This, 2),
            // copy through temp and static
            Command::Push(Segment::This, 2),
            Command::Pop(Segment::Temp, 3),
            Command::Push(Segment::Temp, 3),
            Command::Pop(Segment::Static, 1),
            Command::Push(Segment::Static, 1),
        ]);

        assert_eq!(ram[3], 300, "pointer 0 aliases THIS");
        assert_eq!(ram[302], 37, "this 2 lands at base + 2");
        assert_eq!(ram[8], 37, "temp 3 lands at R8");
        assert_eq!(ram[0], 257);
        assert_eq!(ram[256], 37, "static round-trips back onto the stack");
    }

    #[test]
    fn test_call_and_return_roundtrip() {
        let commands = [
            Command::Function(String::from("Sys.init"), 0),
            Command::Push(Segment::Constant, 3),
            Command::Push(Segment::Constant, 4),
            Command::Call(String::from("Foo.bar"), 2),
            Command::Label(String::from("HALT")),
            Command::Goto(String::from("HALT")),
            Command::Function(String::from("Foo.bar"), 2),
            Command::Push(Segment::Argument, 0),
            Command::Push(Segment::Local, 1),
            Command::Arithmetic(Op::Add),
            Command::Return,
        ];

        let asm = translate(
            &commands,
            Options {
                bootstrap: true,
                debug: false,
            },
        );
        let ram = simulate(&asm, 10_000);

        // Sys.init's working stack starts at 261 (five saved words);
        // the call's two arguments collapse into the returned value
        // 3 + 0 (fresh locals are zeroed).
        assert_eq!(ram[261], 3);
        assert_eq!(ram[0], 262);
    }

    #[test]
    fn test_if_goto_consumes_condition() {
        let ram = run(&[
            Command::Function(String::from("Test.main"), 0),
            Command::Push(Segment::Constant, 1),
            Command::IfGoto(String::from("TAKEN")),
            // skipped
            Command::Push(Segment::Constant, 111),
            Command::Label(String::from("TAKEN")),
            Command::Push(Segment::Constant, 42),
        ]);

        assert_eq!(ram[0], 257);
        assert_eq!(ram[256], 42);
    }

    #[test]
    fn test_function_scopes_labels() {
        let asm = translate(
            &[
                Command::Function(String::from("Foo.bar"), 0),
                Command::Label(String::from("LOOP")),
                Command::Goto(String::from("LOOP")),
            ],
            Options::default(),
        );

        assert!(asm.contains("(Foo.bar$LOOP)"));
        assert!(asm.contains("@Foo.bar$LOOP"));
    }

    #[test]
    fn test_labels_outside_functions_have_empty_scope() {
        let asm = translate(
            &[Command::Label(String::from("FREE"))],
            Options::default(),
        );

        assert!(asm.contains("($FREE)"));
    }

    #[test]
    fn test_static_naming_is_per_file() {
        let mut out = Vec::new();

        let mut translator = Translator::new(&mut out, Options::default());
        {
            let mut first = translator.file("Alpha");
            first.command(&Command::Push(Segment::Static, 0));
        }
        {
            let mut second = translator.file("Beta");
            second.command(&Command::Push(Segment::Static, 0));
        }
        translator.finish().expect("in-memory sink cannot fail");

        let asm = String::from_utf8(out).expect("assembly is ASCII");
        assert!(asm.contains("@Alpha.0"));
        assert!(asm.contains("@Beta.0"));
    }

    #[test]
    fn test_comparison_labels_are_unique_across_files() {
        let mut out = Vec::new();

        let mut translator = Translator::new(&mut out, Options::default());
        {
            let mut first = translator.file("Alpha");
            first.command(&Command::Arithmetic(Op::Eq));
        }
        {
            let mut second = translator.file("Beta");
            second.command(&Command::Arithmetic(Op::Lt));
        }
        translator.finish().expect("in-memory sink cannot fail");

        let asm = String::from_utf8(out).expect("assembly is ASCII");
        assert!(asm.contains("(CMP.0)"));
        assert!(asm.contains("(CMP.1)"));
    }

    #[test]
    fn test_bootstrap_is_emitted_only_when_configured() {
        let without = translate(&[], Options::default());
        assert_eq!(without, "");

        let with = translate(
            &[],
            Options {
                bootstrap: true,
                debug: false,
            },
        );
        assert!(with.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(with.contains("@Sys.init"));
        // SP init, five saved words, ARG and LCL repositioning
        let stores = with.lines().filter(|line| *line == "M=D").count();
        assert_eq!(stores, 1 + 5 + 2);
    }

    #[test]
    fn test_debug_mode_prefixes_command_comments() {
        let asm = translate(
            &[Command::Push(Segment::Constant, 7)],
            Options {
                bootstrap: false,
                debug: true,
            },
        );

        assert!(asm.starts_with("// push constant 7\n"));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let commands = [
            Command::Function(String::from("Foo.bar"), 1),
            Command::Arithmetic(Op::Eq),
            Command::Call(String::from("Foo.baz"), 0),
            Command::Return,
        ];

        let first = translate(&commands, Options::default());
        let second = translate(&commands, Options::default());

        assert_eq!(first, second);
    }
}
