use std::fmt;

use thiserror::Error;

use crate::ast::{Span, Token};

/// Where in the source a syntax error was detected.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    /// At the scanner's current position; there is no token yet.
    Here,
    /// At the end-of-input marker.
    End,
    /// At a token with this lexeme.
    Lexeme(String),
}

impl Location {
    pub fn at(span: &Span) -> Self {
        if span.token == Token::EOF {
            Location::End
        } else {
            Location::Lexeme(span.lexeme.clone())
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Here => Ok(()),
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

/// An error found while scanning or parsing. These block execution of the whole program.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub location: Location,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, location: Location, message: impl Into<String>) -> Self {
        Self {
            line,
            location,
            message: message.into(),
        }
    }
}
