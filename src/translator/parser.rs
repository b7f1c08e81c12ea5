//! Line-oriented reader for `.vm` sources.
//!
//! One command per line, whitespace-separated tokens, `//` comments.
//! Segment and index validation happens here so the translator proper
//! only ever sees well-formed commands.

use std::{io::BufRead, str::FromStr};

use super::{
    command::{ArithmeticOp, Command, Segment},
    error::{Error, ParseErrorKind},
};

pub struct Parser<R> {
    reader: R,
    path: String,
    line: u32,
}

impl<R: BufRead> Parser<R> {
    pub fn new(path: impl Into<String>, reader: R) -> Self {
        Self {
            reader,
            path: path.into(),
            line: 0,
        }
    }

    fn parse_error(&self, kind: ParseErrorKind) -> Error {
        Error::Parse {
            path: self.path.clone(),
            line: self.line,
            kind,
        }
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Command, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = String::new();

        loop {
            buffer.clear();
            match self.reader.read_line(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(error) => return Some(Err(Error::Io(error))),
            }
            self.line += 1;

            let code = match buffer.split_once("//") {
                Some((code, _comment)) => code,
                None => buffer.as_str(),
            };

            let tokens: Vec<&str> = code.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            return Some(map_command(&tokens).map_err(|kind| self.parse_error(kind)));
        }
    }
}

fn map_command(tokens: &[&str]) -> Result<Command, ParseErrorKind> {
    let (&keyword, arguments) = tokens
        .split_first()
        .expect("caller skips blank lines");

    if let Ok(op) = ArithmeticOp::from_str(keyword) {
        expect_arguments(keyword, arguments, 0)?;
        return Ok(Command::Arithmetic(op));
    }

    match keyword {
        "push" | "pop" => map_memory_command(keyword, arguments),
        "label" | "goto" | "if-goto" => map_label_command(keyword, arguments),
        "function" | "call" => map_function_command(keyword, arguments),
        "return" => {
            expect_arguments(keyword, arguments, 0)?;
            Ok(Command::Return)
        }
        _ => Err(ParseErrorKind::UnknownCommand(keyword.to_string())),
    }
}

fn map_memory_command(keyword: &str, arguments: &[&str]) -> Result<Command, ParseErrorKind> {
    expect_arguments(keyword, arguments, 2)?;

    let segment = Segment::from_str(arguments[0])
        .map_err(|_| ParseErrorKind::UnknownSegment(arguments[0].to_string()))?;

    let index: u16 = arguments[1]
        .parse()
        .map_err(|_| ParseErrorKind::InvalidIndex(arguments[1].to_string()))?;

    if segment == Segment::Pointer && index > 1 {
        return Err(ParseErrorKind::PointerIndexOutOfRange(index));
    }
    if segment == Segment::Temp && index > 6 {
        return Err(ParseErrorKind::TempIndexOutOfRange(index));
    }
    if keyword == "pop" && segment == Segment::Constant {
        return Err(ParseErrorKind::PopConstant);
    }

    Ok(if keyword == "push" {
        Command::Push(segment, index)
    } else {
        Command::Pop(segment, index)
    })
}

fn map_label_command(keyword: &str, arguments: &[&str]) -> Result<Command, ParseErrorKind> {
    expect_arguments(keyword, arguments, 1)?;

    let label = arguments[0];
    validate_symbol(label)?;

    Ok(match keyword {
        "label" => Command::Label(label.to_string()),
        "goto" => Command::Goto(label.to_string()),
        _ => Command::IfGoto(label.to_string()),
    })
}

fn map_function_command(keyword: &str, arguments: &[&str]) -> Result<Command, ParseErrorKind> {
    expect_arguments(keyword, arguments, 2)?;

    let name = arguments[0];
    validate_symbol(name)?;

    let count: u16 = arguments[1]
        .parse()
        .map_err(|_| ParseErrorKind::InvalidIndex(arguments[1].to_string()))?;

    Ok(if keyword == "function" {
        Command::Function(name.to_string(), count)
    } else {
        Command::Call(name.to_string(), count)
    })
}

fn expect_arguments(
    keyword: &str,
    arguments: &[&str],
    expected: usize,
) -> Result<(), ParseErrorKind> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(ParseErrorKind::WrongArgumentCount {
            command: keyword.to_string(),
            expected,
        })
    }
}

/// First character: letter, `_`, `.` or `:`; later characters may
/// additionally be digits.
fn validate_symbol(symbol: &str) -> Result<(), ParseErrorKind> {
    for (position, c) in symbol.chars().enumerate() {
        if c.is_ascii_alphabetic() || c == '_' || c == '.' || c == ':' {
            continue;
        }
        if position != 0 && c.is_ascii_digit() {
            continue;
        }
        return Err(ParseErrorKind::InvalidSymbol {
            symbol: symbol.to_string(),
            position,
        });
    }

    Ok(())
}
