//! Parenthesized prefix rendering of syntax trees, for debugging and for checking tree shape.

use std::fmt;

use crate::ast::{Expr, Primitive, Stmt};
use crate::runtime::write_num;

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Primitive::Nil => write!(f, "nil"),
            Primitive::Bool(b) => write!(f, "{}", b),
            Primitive::Num(n) => write_num(f, *n),
            Primitive::Str(s) => write!(f, "{}", s),
        }
    }
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(_, value) => value.to_string(),
        Expr::Variable(var) => var.name.clone(),
        Expr::Group(inner) => parenthesize("group", &[&**inner]),
        Expr::Unary(_, op, rhs) => parenthesize(&op.to_string(), &[&**rhs]),
        Expr::Binary(_, lhs, op, rhs) => parenthesize(&op.to_string(), &[&**lhs, &**rhs]),
        Expr::Logical(_, lhs, op, rhs) => parenthesize(&op.to_string(), &[&**lhs, &**rhs]),
        Expr::Assign(var, value) => format!("(= {} {})", var.name, print_expr(value)),
        Expr::Call(_, callee, args) => {
            let mut out = format!("(call {}", print_expr(callee));
            for arg in args {
                out.push(' ');
                out.push_str(&print_expr(arg));
            }
            out.push(')');
            out
        }
    }
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression(expr) => format!("(; {})", print_expr(expr)),
        Stmt::Print(_, expr) => format!("(print {})", print_expr(expr)),
        Stmt::Var(_, name, None) => format!("(var {})", name),
        Stmt::Var(_, name, Some(init)) => format!("(var {} {})", name, print_expr(init)),
        Stmt::Block(body) => {
            let mut out = String::from("(block");
            push_stmts(&mut out, body);
            out.push(')');
            out
        }
        Stmt::If(cond, then, None) => {
            format!("(if {} {})", print_expr(cond), print_stmt(then))
        }
        Stmt::If(cond, then, Some(otherwise)) => format!(
            "(if {} {} {})",
            print_expr(cond),
            print_stmt(then),
            print_stmt(otherwise)
        ),
        Stmt::While(cond, body) => format!("(while {} {})", print_expr(cond), print_stmt(body)),
        Stmt::Function(decl) => {
            let params = decl
                .params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let mut out = format!("(fun {} ({})", decl.name, params);
            push_stmts(&mut out, &decl.body);
            out.push(')');
            out
        }
        Stmt::Return(_, None) => String::from("(return)"),
        Stmt::Return(_, Some(value)) => format!("(return {})", print_expr(value)),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut out = format!("({}", name);
    for expr in exprs {
        out.push(' ');
        out.push_str(&print_expr(expr));
    }
    out.push(')');
    out
}

fn push_stmts(out: &mut String, stmts: &[Stmt]) {
    for stmt in stmts {
        out.push(' ');
        out.push_str(&print_stmt(stmt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, UniOp};

    #[test]
    fn prints_nested_expression() {
        let expr = Expr::Binary(
            1,
            Box::new(Expr::Unary(
                1,
                UniOp::Neg,
                Box::new(Expr::Literal(1, Primitive::Num(123.0))),
            )),
            BinOp::Mul,
            Box::new(Expr::Group(Box::new(Expr::Literal(
                1,
                Primitive::Num(45.67),
            )))),
        );
        assert_eq!("(* (- 123) (group 45.67))", print_expr(&expr));
    }

    #[test]
    fn prints_literals() {
        assert_eq!("nil", print_expr(&Expr::Literal(1, Primitive::Nil)));
        assert_eq!("true", print_expr(&Expr::Literal(1, Primitive::Bool(true))));
        assert_eq!("3", print_expr(&Expr::Literal(1, Primitive::Num(3.0))));
        assert_eq!(
            "hi there",
            print_expr(&Expr::Literal(1, Primitive::Str("hi there".to_owned())))
        );
    }

    #[test]
    fn prints_statements() {
        let stmt = Stmt::If(
            Expr::Literal(1, Primitive::Bool(true)),
            Box::new(Stmt::Print(1, Expr::Literal(1, Primitive::Num(1.0)))),
            Some(Box::new(Stmt::Block(vec![Stmt::Var(1, "a".to_owned(), None)]))),
        );
        assert_eq!("(if true (print 1) (block (var a)))", print_stmt(&stmt));
    }
}
