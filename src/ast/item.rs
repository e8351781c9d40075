//! Module for higher-level syntactic language items.

use std::fmt;
use std::mem;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogOp {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    EqEq,
    NotEq,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniOp {
    Neg,
    Not,
}

impl fmt::Display for LogOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogOp::And => write!(f, "and"),
            LogOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::EqEq => "==",
            BinOp::NotEq => "!=",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UniOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UniOp::Neg => write!(f, "-"),
            UniOp::Not => write!(f, "!"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Nil,
    Bool(bool),
    Num(f64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub name: String,
    pub line: usize,
}

impl Var {
    pub fn new(name: String, line: usize) -> Self {
        Self { name, line }
    }
}

/// Language items that evaluate to values.
#[derive(Debug)]
pub enum Expr {
    /// (line, lhs, op, rhs)
    Logical(usize, Box<Expr>, LogOp, Box<Expr>),
    /// (line, lhs, op, rhs)
    Binary(usize, Box<Expr>, BinOp, Box<Expr>),
    /// (line, op, expr)
    Unary(usize, UniOp, Box<Expr>),
    /// (line of closing paren, callee, args)
    Call(usize, Box<Expr>, Vec<Expr>),
    /// (line, value)
    Literal(usize, Primitive),
    /// (var)
    Variable(Var),
    /// (var, value)
    Assign(Var, Box<Expr>),
    /// (inner)
    Group(Box<Expr>),
}

/// Language items for control flow, side effects and name bindings.
#[derive(Debug)]
pub enum Stmt {
    /// (expr)
    Expression(Expr),
    /// (line, expr)
    Print(usize, Expr),
    /// (line, name, value)
    Var(usize, String, Option<Expr>),
    /// (body)
    Block(Body),
    /// (condition, then, otherwise)
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    /// (condition, body)
    While(Expr, Box<Stmt>),
    /// (decl)
    Function(Rc<FunDecl>),
    /// (line, value)
    Return(usize, Option<Expr>),
}

pub type Body = Vec<Stmt>;

// Trees nest as deeply as the source does, so dropping them must not recurse. Children are
// detached onto a work list and freed one at a time.

impl Expr {
    fn is_leaf(&self) -> bool {
        matches!(self, Expr::Literal(..) | Expr::Variable(_))
    }

    fn detach_children(&mut self, pending: &mut Vec<Expr>) {
        match self {
            Expr::Logical(_, lhs, _, rhs) | Expr::Binary(_, lhs, _, rhs) => {
                detach_expr(lhs, pending);
                detach_expr(rhs, pending);
            }
            Expr::Unary(_, _, inner) | Expr::Assign(_, inner) | Expr::Group(inner) => {
                detach_expr(inner, pending);
            }
            Expr::Call(_, callee, args) => {
                detach_expr(callee, pending);
                pending.append(args);
            }
            Expr::Literal(..) | Expr::Variable(_) => {}
        }
    }
}

fn detach_expr(boxed: &mut Box<Expr>, pending: &mut Vec<Expr>) {
    if !boxed.is_leaf() {
        pending.push(mem::replace(&mut **boxed, Expr::Literal(0, Primitive::Nil)));
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}

impl Stmt {
    fn is_leaf(&self) -> bool {
        match self {
            Stmt::Block(body) => body.is_empty(),
            Stmt::If(..) | Stmt::While(..) | Stmt::Function(_) => false,
            _ => true,
        }
    }

    fn detach_children(&mut self, pending: &mut Vec<Stmt>) {
        match self {
            Stmt::Block(body) => pending.append(body),
            Stmt::If(_, then, otherwise) => {
                detach_stmt(then, pending);
                if let Some(otherwise) = otherwise {
                    detach_stmt(otherwise, pending);
                }
            }
            Stmt::While(_, body) => detach_stmt(body, pending),
            Stmt::Function(decl) => {
                // closures still holding the declaration free it later
                if let Some(decl) = Rc::get_mut(decl) {
                    pending.append(&mut decl.body);
                }
            }
            Stmt::Expression(_) | Stmt::Print(..) | Stmt::Var(..) | Stmt::Return(..) => {}
        }
    }
}

fn detach_stmt(boxed: &mut Box<Stmt>, pending: &mut Vec<Stmt>) {
    if !boxed.is_leaf() {
        pending.push(mem::replace(&mut **boxed, Stmt::Block(Vec::new())));
    }
}

impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut stmt) = pending.pop() {
            stmt.detach_children(&mut pending);
        }
    }
}

#[derive(Debug)]
pub struct Param {
    pub name: String,
    pub line: usize,
}

/// A function declaration. The body is shared by every closure created from it.
#[derive(Debug)]
pub struct FunDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Body,
    pub line: usize,
}
