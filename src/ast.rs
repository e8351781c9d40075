//! Module for representing the abstract syntax tree (AST) of the language.

mod item;
pub mod printer;
mod token;

pub use self::item::{BinOp, LogOp, UniOp};
pub use self::item::{Body, FunDecl, Param, Primitive, Var};
pub use self::item::{Expr, Stmt};
pub use self::token::{Span, Token};
