//! A tree-walking interpreter for the Lox scripting language.
//!
//! Source text goes through three stages: the [`Lexer`] produces spans, the [`Parser`] builds
//! statements, and the [`Interpreter`] evaluates them directly. [`run`] drives all three and
//! reports the result as an [`Outcome`].

pub mod ast;
pub mod error;
pub mod runtime;
pub mod stdlib;

mod interpreter;
mod lexer;
mod parser;
mod stack;

pub use error::SyntaxError;
pub use interpreter::{Interpreter, MAX_CALL_DEPTH};
pub use lexer::Lexer;
pub use parser::Parser;
pub use runtime::RuntimeError;

/// Exit status for a program with syntax errors.
pub const EX_DATAERR: i32 = 65;
/// Exit status for a program that hit a runtime error.
pub const EX_SOFTWARE: i32 = 70;

pub struct LexedProgram {
    pub errors: Vec<SyntaxError>,
    pub spans: Vec<ast::Span>,
}

pub struct ParsedProgram {
    pub errors: Vec<SyntaxError>,
    pub stmts: Vec<Option<ast::Stmt>>,
}

impl ParsedProgram {
    /// The statements, if every one of them parsed cleanly.
    pub fn into_program(self) -> Option<Vec<ast::Stmt>> {
        if !self.errors.is_empty() {
            return None;
        }
        self.stmts.into_iter().collect()
    }
}

/// How a run of a program ended.
#[derive(Debug)]
pub enum Outcome {
    Ok,
    SyntaxErrors(Vec<SyntaxError>),
    RuntimeError(RuntimeError),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::SyntaxErrors(_) => EX_DATAERR,
            Outcome::RuntimeError(_) => EX_SOFTWARE,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// Scans, parses and runs `source` against `rt`. Nothing runs if any syntax error was found.
pub fn run(source: &str, rt: &mut Interpreter) -> Outcome {
    let lexed = Lexer::new(source).scan();
    let mut errors = lexed.errors;

    let parsed = Parser::new(lexed.spans).parse();
    errors.extend(parsed.errors.iter().cloned());
    if !errors.is_empty() {
        errors.sort_by_key(|err| err.line);
        return Outcome::SyntaxErrors(errors);
    }

    let program = match parsed.into_program() {
        Some(program) => program,
        None => return Outcome::SyntaxErrors(errors),
    };

    match rt.interpret(&program) {
        Ok(()) => Outcome::Ok,
        Err(err) => Outcome::RuntimeError(err),
    }
}
