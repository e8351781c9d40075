use std::fmt;
use std::rc::Rc;

use crate::ast::Primitive;
use crate::runtime::Call;

#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Num(f64),
    Str(String),
    Callable(Rc<dyn Call>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match *self {
            Value::Nil => false,
            Value::Bool(b) => b,
            _ => true,
        }
    }
}

impl From<&Primitive> for Value {
    fn from(prim: &Primitive) -> Self {
        match prim {
            Primitive::Nil => Value::Nil,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Num(n) => Value::Num(*n),
            Primitive::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Num(lhs), Value::Num(rhs)) => lhs == rhs,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Callable(lhs), Value::Callable(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Num(n) => write_num(f, *n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Callable(fun) => write!(f, "{}", fun),
        }
    }
}

/// Writes a number the way scripts see it: integral values have no fractional part.
pub fn write_num(f: &mut fmt::Formatter, n: f64) -> fmt::Result {
    if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        write!(f, "{}Infinity", sign)
    } else {
        write!(f, "{}", n)
    }
}
