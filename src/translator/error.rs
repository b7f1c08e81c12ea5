use std::io;

/// List of all errors that could possibly occur during VM translation.
#[derive(Debug)]
pub enum Error {
    /// A malformed command, addressed by source path and line.
    Parse {
        path: String,
        line: u32,
        kind: ParseErrorKind,
    },
    Io(io::Error),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnknownCommand(String),
    WrongArgumentCount { command: String, expected: usize },
    UnknownSegment(String),
    InvalidIndex(String),
    PointerIndexOutOfRange(u16),
    TempIndexOutOfRange(u16),
    PopConstant,
    InvalidSymbol { symbol: String, position: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { path, line, kind } => write!(f, "error {path}:{line}: {kind}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(command) => write!(f, "unknown command: {command}"),
            Self::WrongArgumentCount { command, expected } => {
                write!(f, "{command} command takes {expected} argument(s)")
            }
            Self::UnknownSegment(segment) => write!(f, "unknown memory segment: {segment}"),
            Self::InvalidIndex(index) => write!(f, "invalid index: {index}"),
            Self::PointerIndexOutOfRange(index) => {
                write!(f, "pointer index must be 0 or 1, got {index}")
            }
            Self::TempIndexOutOfRange(index) => {
                write!(f, "temp index must be less than 7, got {index}")
            }
            Self::PopConstant => write!(f, "pop command does not accept constant segment"),
            Self::InvalidSymbol { symbol, position } => {
                write!(f, "symbol \"{symbol}\": invalid char at {position}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Parse { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}
