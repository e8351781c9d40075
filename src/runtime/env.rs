use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::ast::Var;
use crate::runtime::{RunResult, RuntimeError, Value};

/// A lexical scope and the chain of scopes enclosing it.
///
/// Cloning an `Env` shares the same scope, which is how closures keep their defining scope alive
/// after control has left it.
#[derive(Clone, Debug)]
pub struct Env {
    ptr: Rc<RefCell<Scope>>,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Self {
            ptr: Rc::new(RefCell::new(Scope::new())),
        }
    }

    /// A fresh child scope whose parent is `env`.
    pub fn wrap(env: &Env) -> Self {
        Self {
            ptr: Rc::new(RefCell::new(Scope::wrap(&env.ptr))),
        }
    }

    /// Binds `name` in this scope only, replacing any previous binding here.
    pub fn define(&mut self, name: String, value: Value) {
        trace!(%name, "define");
        self.ptr.borrow_mut().set(name, value);
    }

    pub fn get(&self, var: &Var) -> RunResult<Value> {
        let mut curr = Some(Rc::clone(&self.ptr));
        while let Some(rc) = curr {
            let scope = rc.borrow();
            if let Some(value) = scope.get(&var.name) {
                return Ok(value);
            }
            curr = scope.next();
        }
        Err(RuntimeError::UndefinedVar(var.line, var.name.clone()))
    }

    /// Overwrites the nearest existing binding of `var`. Never creates a new binding.
    pub fn assign(&mut self, var: &Var, value: Value) -> RunResult<()> {
        let mut curr = Some(Rc::clone(&self.ptr));
        while let Some(rc) = curr {
            let mut scope = rc.borrow_mut();
            if scope.has(&var.name) {
                scope.set(var.name.clone(), value);
                return Ok(());
            }
            curr = scope.next();
        }
        Err(RuntimeError::UndefinedVar(var.line, var.name.clone()))
    }
}

#[derive(Debug)]
struct Scope {
    values: HashMap<String, Value>,
    inner: Option<Rc<RefCell<Scope>>>,
}

impl Scope {
    fn new() -> Self {
        Scope {
            values: HashMap::new(),
            inner: None,
        }
    }

    fn wrap(ptr: &Rc<RefCell<Scope>>) -> Self {
        Scope {
            values: HashMap::new(),
            inner: Some(Rc::clone(ptr)),
        }
    }

    fn next(&self) -> Option<Rc<RefCell<Scope>>> {
        self.inner.as_ref().cloned()
    }

    fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: String, value: Value) -> Option<Value> {
        self.values.insert(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Var {
        Var::new(name.to_owned(), 1)
    }

    #[test]
    fn get_walks_outward() {
        let mut global = Env::new();
        global.define("a".to_owned(), Value::Num(1.0));
        let inner = Env::wrap(&Env::wrap(&global));

        assert_eq!(Value::Num(1.0), inner.get(&var("a")).unwrap());
    }

    #[test]
    fn inner_definition_shadows_outer() {
        let mut global = Env::new();
        global.define("a".to_owned(), Value::Num(1.0));
        let mut inner = Env::wrap(&global);
        inner.define("a".to_owned(), Value::Num(2.0));

        assert_eq!(Value::Num(2.0), inner.get(&var("a")).unwrap());
        assert_eq!(Value::Num(1.0), global.get(&var("a")).unwrap());
    }

    #[test]
    fn redefinition_overwrites() {
        let mut env = Env::new();
        env.define("a".to_owned(), Value::Num(1.0));
        env.define("a".to_owned(), Value::Str("x".to_owned()));

        assert_eq!(Value::Str("x".to_owned()), env.get(&var("a")).unwrap());
    }

    #[test]
    fn assign_updates_enclosing_binding() {
        let mut global = Env::new();
        global.define("a".to_owned(), Value::Num(1.0));
        let mut inner = Env::wrap(&global);
        inner.assign(&var("a"), Value::Num(5.0)).unwrap();

        assert_eq!(Value::Num(5.0), global.get(&var("a")).unwrap());
    }

    #[test]
    fn undefined_variable_errors() {
        let mut env = Env::new();
        let missing = Var::new("nope".to_owned(), 7);

        match env.get(&missing) {
            Err(RuntimeError::UndefinedVar(7, name)) => assert_eq!("nope", name),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(env.assign(&missing, Value::Nil).is_err());
        assert!(env.get(&missing).is_err());
    }
}
