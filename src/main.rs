use std::env;
use std::fs;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loxwalk::{Interpreter, Outcome};

static NAME: &str = "loxwalk";

const EX_USAGE: i32 = 64;
const EX_NOINPUT: i32 = 66;

fn main() {
    init_tracing();

    let args = env::args().collect::<Vec<String>>();
    let status = match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: {} [script]", NAME);
            EX_USAGE
        }
    };

    process::exit(status);
}

/// Logs go to stderr, and only when `RUST_LOG` is set.
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &str) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: cannot read '{}': {}", NAME, path, err);
            return EX_NOINPUT;
        }
    };

    let mut rt = Interpreter::new();
    let outcome = execute(&source, &mut rt);
    outcome.exit_code()
}

fn run_prompt() -> i32 {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("{}: cannot start prompt: {}", NAME, err);
            return EX_USAGE;
        }
    };

    let mut rt = Interpreter::new();
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if let Err(err) = rl.add_history_entry(line.as_str()) {
                    debug!(%err, "history entry dropped");
                }
                execute(&line, &mut rt);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}: {}", NAME, err);
                break;
            }
        }
    }
    0
}

fn execute(source: &str, rt: &mut Interpreter) -> Outcome {
    #[cfg(feature = "debug")]
    dump_program(source);

    let outcome = loxwalk::run(source, rt);
    match outcome {
        Outcome::Ok => {}
        Outcome::SyntaxErrors(ref errors) => {
            for err in errors {
                eprintln!("{}", err);
            }
        }
        Outcome::RuntimeError(ref err) => eprintln!("{}", err),
    }
    outcome
}

#[cfg(feature = "debug")]
fn dump_program(source: &str) {
    use loxwalk::ast::printer::print_stmt;
    use loxwalk::{Lexer, Parser};

    let parsed = Parser::new(Lexer::new(source).scan().spans).parse();
    for stmt in parsed.stmts.iter().flatten() {
        eprintln!("{}", print_stmt(stmt));
    }
}
