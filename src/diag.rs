use std::error::Error;
use std::fmt;

/// Line number (starting at one).
pub type Position = u32;

/// A parse-time diagnostic together with the line it was raised on.
#[derive(Debug, PartialEq)]
pub struct FullParseError {
    pub pos: Position,
    pub error: ParseError,
}

impl fmt::Display for FullParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}: {}", self.pos, self.error)
    }
}

impl Error for FullParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseError {
    BadChar(char),
    UnterminatedString,
    UnexpectedToken { expected: String, found: String },
    NoPrefixParser(String),
    UnexpectedEof,
    BadIntegerLiteral(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadChar(ch) => {
                write!(f, "illegal character: '{}'", ch)
            }
            ParseError::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            ParseError::UnexpectedToken { expected, found } => write!(
                f,
                "unexpected token '{}', expected '{}'",
                found, expected
            ),
            ParseError::NoPrefixParser(kind) => {
                write!(f, "no prefix parse rule for '{}'", kind)
            }
            ParseError::UnexpectedEof => {
                write!(f, "unexpected end of input")
            }
            ParseError::BadIntegerLiteral(lit) => {
                write!(f, "cannot parse integer literal: {}", lit)
            }
        }
    }
}
