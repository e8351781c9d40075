use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{BinOp, LogOp, UniOp};
use crate::ast::{Expr, Stmt};
use crate::runtime::{Env, LoxFunction, RunResult, RuntimeError, Signal, Value};
use crate::stack::ensure_sufficient_stack;
use crate::stdlib::Clock;

/// Default limit on nested call activations before reporting a stack overflow.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Tree-walking evaluator. Globals persist across calls to [`Interpreter::interpret`].
pub struct Interpreter {
    globals: Env,
    env: Env,
    depth: usize,
    max_depth: usize,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// An interpreter whose `print` output goes to `out`.
    pub fn with_output(out: impl Write + 'static) -> Self {
        let mut globals = Env::new();
        globals.define(String::from("clock"), Value::Callable(Rc::new(Clock)));
        Self {
            env: globals.clone(),
            globals,
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
            out: Box::new(out),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Executes top-level statements in order, stopping at the first runtime error.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn interpret(&mut self, program: &[Stmt]) -> RunResult<()> {
        for stmt in program {
            if let Err(err) = self.execute(stmt) {
                debug!(line = err.line(), %err, "runtime error");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Runs `body` inside `env`, restoring the current scope however the body exits.
    pub fn exec_block(&mut self, body: &[Stmt], env: Env) -> RunResult<Signal> {
        let prev = mem::replace(&mut self.env, env);
        let result = self.exec_all(body);
        self.env = prev;
        result
    }

    fn exec_all(&mut self, body: &[Stmt]) -> RunResult<Signal> {
        for stmt in body {
            match self.execute(stmt)? {
                Signal::None => {}
                sig => return Ok(sig),
            }
        }
        Ok(Signal::None)
    }

    fn execute(&mut self, stmt: &Stmt) -> RunResult<Signal> {
        ensure_sufficient_stack(|| self.exec(stmt))
    }

    fn exec(&mut self, stmt: &Stmt) -> RunResult<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(line, expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)
                    .map_err(|err| RuntimeError::Output(*line, err.to_string()))?;
            }
            Stmt::Var(_, name, init) => {
                let value = match init {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.env.define(name.to_owned(), value);
            }
            Stmt::Block(body) => {
                let env = Env::wrap(&self.env);
                return self.exec_block(body, env);
            }
            Stmt::If(cond, then, otherwise) => {
                if self.evaluate(cond)?.is_truthy() {
                    return self.execute(then);
                } else if let Some(otherwise) = otherwise {
                    return self.execute(otherwise);
                }
            }
            Stmt::While(cond, body) => {
                while self.evaluate(cond)?.is_truthy() {
                    if let Signal::Ret(value) = self.execute(body)? {
                        return Ok(Signal::Ret(value));
                    }
                }
            }
            Stmt::Function(decl) => {
                let fun = LoxFunction::new(Rc::clone(decl), self.env.clone());
                self.env.define(decl.name.to_owned(), Value::Callable(Rc::new(fun)));
            }
            Stmt::Return(_, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Signal::Ret(value));
            }
        }
        Ok(Signal::None)
    }

    fn evaluate(&mut self, expr: &Expr) -> RunResult<Value> {
        ensure_sufficient_stack(|| self.eval(expr))
    }

    fn eval(&mut self, expr: &Expr) -> RunResult<Value> {
        match expr {
            Expr::Literal(_, value) => Ok(Value::from(value)),
            Expr::Group(inner) => self.evaluate(inner),
            Expr::Variable(var) => self.env.get(var),
            Expr::Assign(var, value) => {
                let value = self.evaluate(value)?;
                self.env.assign(var, value.clone())?;
                Ok(value)
            }
            Expr::Unary(line, op, rhs) => {
                let value = self.evaluate(rhs)?;
                match (*op, value) {
                    (UniOp::Neg, Value::Num(n)) => Ok(Value::Num(-n)),
                    (UniOp::Neg, _) => Err(RuntimeError::UniNonNumeric(*line, UniOp::Neg)),
                    (UniOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Logical(_, lhs, op, rhs) => {
                let lhs = self.evaluate(lhs)?;
                let short_circuits = match op {
                    LogOp::Or => lhs.is_truthy(),
                    LogOp::And => !lhs.is_truthy(),
                };
                if short_circuits {
                    Ok(lhs)
                } else {
                    self.evaluate(rhs)
                }
            }
            Expr::Binary(line, lhs, op, rhs) => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                binary(*line, *op, lhs, rhs)
            }
            Expr::Call(line, callee, args) => {
                let callee = self.evaluate(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<RunResult<Vec<_>>>()?;
                self.call_value(*line, callee, args)
            }
        }
    }

    fn call_value(&mut self, line: usize, callee: Value, args: Vec<Value>) -> RunResult<Value> {
        let fun = match callee {
            Value::Callable(fun) => fun,
            _ => return Err(RuntimeError::NotCallable(line)),
        };

        if args.len() != fun.arity() {
            return Err(RuntimeError::ArityMismatch(line, fun.arity(), args.len()));
        }

        if self.depth >= self.max_depth {
            return Err(RuntimeError::StackOverflow(line));
        }

        trace!(name = %fun.name(), depth = self.depth, "enter");
        self.depth += 1;
        let result = ensure_sufficient_stack(|| fun.call(self, args));
        self.depth -= 1;
        result
    }
}

fn binary(line: usize, op: BinOp, lhs: Value, rhs: Value) -> RunResult<Value> {
    use Value::{Bool, Num, Str};

    let value = match (op, lhs, rhs) {
        (BinOp::EqEq, lhs, rhs) => Bool(lhs == rhs),
        (BinOp::NotEq, lhs, rhs) => Bool(lhs != rhs),
        (BinOp::Add, Num(a), Num(b)) => Num(a + b),
        (BinOp::Add, Str(a), Str(b)) => Str(a + &b),
        (BinOp::Add, _, _) => return Err(RuntimeError::BinAddUnsupportedType(line)),
        (BinOp::Sub, Num(a), Num(b)) => Num(a - b),
        (BinOp::Mul, Num(a), Num(b)) => Num(a * b),
        (BinOp::Div, Num(a), Num(b)) => Num(a / b),
        (BinOp::Lt, Num(a), Num(b)) => Bool(a < b),
        (BinOp::LtEq, Num(a), Num(b)) => Bool(a <= b),
        (BinOp::Gt, Num(a), Num(b)) => Bool(a > b),
        (BinOp::GtEq, Num(a), Num(b)) => Bool(a >= b),
        (op, _, _) => return Err(RuntimeError::BinNonNumeric(line, op)),
    };
    Ok(value)
}
