//! Module for runtime representation of language items.

use std::fmt;

use thiserror::Error;

use crate::ast::{BinOp, UniOp};
use crate::interpreter::Interpreter;

mod env;
mod fun;
mod value;

pub use self::env::Env;
pub use self::fun::LoxFunction;
pub use self::value::{write_num, Value};

/// Anything that can be invoked with a parenthesized argument list.
pub trait Call: fmt::Debug + fmt::Display {
    fn name(&self) -> String;
    fn arity(&self) -> usize;
    fn call(&self, rt: &mut Interpreter, args: Vec<Value>) -> RunResult<Value>;
}

pub type RunResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// (line, expected, actual)
    #[error("[line {0}] runtime error: expected {1} arguments but got {2}")]
    ArityMismatch(usize, usize, usize),
    /// (line)
    #[error("[line {0}] runtime error: operands of '+' must be two numbers or two strings")]
    BinAddUnsupportedType(usize),
    /// (line, op)
    #[error("[line {0}] runtime error: operands of '{1}' must be numbers")]
    BinNonNumeric(usize, BinOp),
    /// (line)
    #[error("[line {0}] runtime error: can only call functions")]
    NotCallable(usize),
    /// (line)
    #[error("[line {0}] runtime error: stack overflow")]
    StackOverflow(usize),
    /// (line, op)
    #[error("[line {0}] runtime error: operand of '{1}' must be a number")]
    UniNonNumeric(usize, UniOp),
    /// (line, name)
    #[error("[line {0}] runtime error: undefined variable '{1}'")]
    UndefinedVar(usize, String),
    /// (line, reason)
    #[error("[line {0}] runtime error: cannot write output: {1}")]
    Output(usize, String),
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        use RuntimeError::*;
        match *self {
            ArityMismatch(line, ..)
            | BinAddUnsupportedType(line)
            | BinNonNumeric(line, _)
            | NotCallable(line)
            | StackOverflow(line)
            | UniNonNumeric(line, _)
            | UndefinedVar(line, _)
            | Output(line, _) => line,
        }
    }
}

/// How a statement finished executing.
#[derive(Debug)]
pub enum Signal {
    /// A `return` is unwinding to the nearest call activation.
    Ret(Value),
    None,
}
