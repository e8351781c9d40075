use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::ast::FunDecl;
use crate::runtime::Call;
use crate::runtime::Env;
use crate::runtime::RunResult;
use crate::runtime::Signal;
use crate::runtime::Value;
use crate::Interpreter;

/// A user-defined function closed over the scope it was declared in.
#[derive(Clone)]
pub struct LoxFunction {
    decl: Rc<FunDecl>,
    closure: Env,
}

impl LoxFunction {
    pub fn new(decl: Rc<FunDecl>, closure: Env) -> Self {
        Self { decl, closure }
    }
}

impl Call for LoxFunction {
    fn name(&self) -> String {
        self.decl.name.to_owned()
    }

    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn call(&self, rt: &mut Interpreter, args: Vec<Value>) -> RunResult<Value> {
        trace!(name = %self.decl.name, args = args.len(), "call");
        let mut env = Env::wrap(&self.closure);
        self.decl.params.iter().zip(args).for_each(|(param, arg)| {
            env.define(param.name.to_owned(), arg);
        });

        let result = match rt.exec_block(&self.decl.body, env)? {
            Signal::Ret(value) => value,
            Signal::None => Value::Nil,
        };

        Ok(result)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Function {{ name: {:?}, params: [{}], body: [{}] }}",
            self.decl.name,
            self.decl.params.len(),
            self.decl.body.len()
        )
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn {}>", self.decl.name)
    }
}
