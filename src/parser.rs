use std::rc::Rc;

use tracing::debug;

use crate::ast::{BinOp, LogOp, UniOp};
use crate::ast::{Expr, FunDecl, Param, Primitive, Span, Stmt, Token, Var};
use crate::error::{Location, SyntaxError};
use crate::stack::ensure_sufficient_stack;
use crate::ParsedProgram;

/// Maximum number of parameters or call arguments.
const MAX_ARGS: usize = 255;

/// Marker for a syntax error that has already been recorded and must be recovered from.
struct ParseError;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    spans: Vec<Span>,
    idx: usize,
    errors: Vec<SyntaxError>,
    fun_depth: usize,
}

impl Parser {
    pub fn new(mut spans: Vec<Span>) -> Self {
        let needs_eof = spans.last().map_or(true, |s| s.token != Token::EOF);
        if needs_eof {
            let line = spans.last().map_or(1, |s| s.line);
            spans.push(Span::new(Token::EOF, String::new(), line));
        }
        Self {
            spans,
            idx: 0,
            errors: Vec::new(),
            fun_depth: 0,
        }
    }

    /// Parses the whole token stream. Statements that failed to parse are `None`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> ParsedProgram {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            stmts.push(self.declaration());
        }

        debug!(stmts = stmts.len(), errors = self.errors.len(), "parsed");
        ParsedProgram {
            errors: self.errors,
            stmts,
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().token == Token::EOF
    }

    fn peek(&self) -> &Span {
        &self.spans[self.idx]
    }

    fn previous(&self) -> &Span {
        &self.spans[self.idx - 1]
    }

    fn advance(&mut self) -> &Span {
        if !self.is_at_end() {
            self.idx += 1;
        }
        self.previous()
    }

    fn check(&self, token: &Token) -> bool {
        !self.is_at_end() && self.peek().token == *token
    }

    fn matches(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token: &Token, msg: &str) -> ParseResult<()> {
        if self.matches(token) {
            Ok(())
        } else {
            Err(self.error_at_peek(msg))
        }
    }

    fn consume_ident(&mut self, msg: &str) -> ParseResult<Var> {
        let span = self.peek();
        if let Token::Ident(ref name) = span.token {
            let var = Var::new(name.clone(), span.line);
            self.idx += 1;
            Ok(var)
        } else {
            Err(self.error_at_peek(msg))
        }
    }

    fn consume_unary_op(&mut self) -> Option<(UniOp, usize)> {
        let curr = self.peek();
        let op = match curr.token {
            Token::Minus => UniOp::Neg,
            Token::Bang => UniOp::Not,
            _ => return None,
        };

        let line = curr.line;
        self.idx += 1;
        Some((op, line))
    }

    fn consume_factor_op(&mut self) -> Option<(BinOp, usize)> {
        let curr = self.peek();
        let op = match curr.token {
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            _ => return None,
        };

        let line = curr.line;
        self.idx += 1;
        Some((op, line))
    }

    fn consume_term_op(&mut self) -> Option<(BinOp, usize)> {
        let curr = self.peek();
        let op = match curr.token {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            _ => return None,
        };

        let line = curr.line;
        self.idx += 1;
        Some((op, line))
    }

    fn consume_compare_op(&mut self) -> Option<(BinOp, usize)> {
        let curr = self.peek();
        let op = match curr.token {
            Token::Lt => BinOp::Lt,
            Token::LtEq => BinOp::LtEq,
            Token::Gt => BinOp::Gt,
            Token::GtEq => BinOp::GtEq,
            _ => return None,
        };

        let line = curr.line;
        self.idx += 1;
        Some((op, line))
    }

    fn consume_equality_op(&mut self) -> Option<(BinOp, usize)> {
        let curr = self.peek();
        let op = match curr.token {
            Token::EqEq => BinOp::EqEq,
            Token::NotEq => BinOp::NotEq,
            _ => return None,
        };

        let line = curr.line;
        self.idx += 1;
        Some((op, line))
    }

    fn consume_logical_op(&mut self, op: LogOp) -> Option<usize> {
        let expected = match op {
            LogOp::And => Token::And,
            LogOp::Or => Token::Or,
        };
        if self.check(&expected) {
            let line = self.peek().line;
            self.idx += 1;
            Some(line)
        } else {
            None
        }
    }

    fn error_at_peek(&mut self, msg: &str) -> ParseError {
        let span = &self.spans[self.idx];
        let err = SyntaxError::new(span.line, Location::at(span), msg);
        self.report(err)
    }

    fn error_at_previous(&mut self, msg: &str) -> ParseError {
        let span = &self.spans[self.idx - 1];
        let err = SyntaxError::new(span.line, Location::at(span), msg);
        self.report(err)
    }

    fn report(&mut self, err: SyntaxError) -> ParseError {
        debug!(%err, "parse error");
        self.errors.push(err);
        ParseError
    }

    /// Skips tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().token == Token::Semi || self.peek().token.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&Token::Var) {
            self.var_declaration()
        } else if self.matches(&Token::Fun) {
            self.function().map(Stmt::Function)
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let var = self.consume_ident("expect variable name")?;
        let init = if self.matches(&Token::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&Token::Semi, "expect ';' after variable declaration")?;
        Ok(Stmt::Var(var.line, var.name, init))
    }

    fn function(&mut self) -> ParseResult<Rc<FunDecl>> {
        let name = self.consume_ident("expect function name")?;
        self.consume(&Token::Lparen, "expect '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&Token::Rparen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.error_at_peek("can't have more than 255 parameters");
                }
                let param = self.consume_ident("expect parameter name")?;
                params.push(Param {
                    name: param.name,
                    line: param.line,
                });
                if !self.matches(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::Rparen, "expect ')' after parameters")?;
        self.consume(&Token::Lbrace, "expect '{' before function body")?;

        self.fun_depth += 1;
        let body = self.block();
        self.fun_depth -= 1;

        Ok(Rc::new(FunDecl {
            name: name.name,
            params,
            body: body?,
            line: name.line,
        }))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        ensure_sufficient_stack(|| match self.peek().token {
            Token::For => {
                self.idx += 1;
                self.for_statement()
            }
            Token::If => {
                self.idx += 1;
                self.if_statement()
            }
            Token::Print => {
                self.idx += 1;
                self.print_statement()
            }
            Token::Ret => {
                self.idx += 1;
                self.return_statement()
            }
            Token::While => {
                self.idx += 1;
                self.while_statement()
            }
            Token::Lbrace => {
                self.idx += 1;
                Ok(Stmt::Block(self.block()?))
            }
            _ => self.expression_statement(),
        })
    }

    /// Parses the rest of a block after its opening brace.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&Token::Rbrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(&Token::Rbrace, "expect '}' after block")?;
        Ok(stmts)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(&Token::Lparen, "expect '(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(&Token::Rparen, "expect ')' after if condition")?;

        let then = Box::new(self.statement()?);
        let otherwise = if self.matches(&Token::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then, otherwise))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(&Token::Lparen, "expect '(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(&Token::Rparen, "expect ')' after condition")?;
        let body = self.statement()?;
        Ok(Stmt::While(cond, Box::new(body)))
    }

    /// Desugars `for (init; cond; post) body` into a block holding the initializer and a while
    /// loop.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.previous().line;
        self.consume(&Token::Lparen, "expect '(' after 'for'")?;

        let init = if self.matches(&Token::Semi) {
            None
        } else if self.matches(&Token::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let cond = if self.check(&Token::Semi) {
            Expr::Literal(line, Primitive::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(&Token::Semi, "expect ';' after loop condition")?;

        let post = if self.check(&Token::Rparen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&Token::Rparen, "expect ')' after for clauses")?;

        let mut body = self.statement()?;
        if let Some(post) = post {
            body = Stmt::Block(vec![body, Stmt::Expression(post)]);
        }

        let mut stmts = Vec::new();
        stmts.extend(init);
        stmts.push(Stmt::While(cond, Box::new(body)));
        Ok(Stmt::Block(stmts))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.previous().line;
        let value = self.expression()?;
        self.consume(&Token::Semi, "expect ';' after value")?;
        Ok(Stmt::Print(line, value))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.previous().line;
        if self.fun_depth == 0 {
            self.error_at_previous("can't return from top-level code");
        }

        let value = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&Token::Semi, "expect ';' after return value")?;
        Ok(Stmt::Return(line, value))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(&Token::Semi, "expect ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logical_or()?;

        if self.matches(&Token::Eq) {
            let eq_idx = self.idx - 1;
            let value = self.assignment()?;
            if let Expr::Variable(ref var) = expr {
                return Ok(Expr::Assign(var.clone(), Box::new(value)));
            }
            let span = &self.spans[eq_idx];
            let err = SyntaxError::new(span.line, Location::at(span), "invalid assignment target");
            self.report(err);
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logical_and()?;

        while let Some(line) = self.consume_logical_op(LogOp::Or) {
            let rhs = self.logical_and()?;
            expr = Expr::Logical(line, Box::new(expr), LogOp::Or, Box::new(rhs));
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while let Some(line) = self.consume_logical_op(LogOp::And) {
            let rhs = self.equality()?;
            expr = Expr::Logical(line, Box::new(expr), LogOp::And, Box::new(rhs));
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while let Some((op, line)) = self.consume_equality_op() {
            let rhs = self.comparison()?;
            expr = Expr::Binary(line, Box::new(expr), op, Box::new(rhs));
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while let Some((op, line)) = self.consume_compare_op() {
            let rhs = self.term()?;
            expr = Expr::Binary(line, Box::new(expr), op, Box::new(rhs));
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while let Some((op, line)) = self.consume_term_op() {
            let rhs = self.factor()?;
            expr = Expr::Binary(line, Box::new(expr), op, Box::new(rhs));
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while let Some((op, line)) = self.consume_factor_op() {
            let rhs = self.unary()?;
            expr = Expr::Binary(line, Box::new(expr), op, Box::new(rhs));
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if let Some((op, line)) = self.consume_unary_op() {
            let rhs = ensure_sufficient_stack(|| self.unary())?;
            return Ok(Expr::Unary(line, op, Box::new(rhs)));
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        while self.matches(&Token::Lparen) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = Vec::new();
        if !self.check(&Token::Rparen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.error_at_peek("can't have more than 255 arguments");
                }
                args.push(self.expression()?);
                if !self.matches(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::Rparen, "expect ')' after arguments")?;
        let line = self.previous().line;

        Ok(Expr::Call(line, Box::new(callee), args))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let line = self.peek().line;
        if let Some(value) = self.peek().literal() {
            self.idx += 1;
            return Ok(Expr::Literal(line, value));
        }

        match self.peek().token {
            Token::Ident(ref name) => {
                let var = Var::new(name.clone(), line);
                self.idx += 1;
                Ok(Expr::Variable(var))
            }
            Token::Lparen => {
                self.idx += 1;
                let inner = self.expression()?;
                self.consume(&Token::Rparen, "expect ')' after expression")?;
                Ok(Expr::Group(Box::new(inner)))
            }
            _ => Err(self.error_at_peek("expect expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::print_stmt;
    use crate::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> ParsedProgram {
        Parser::new(Lexer::new(src).scan().spans).parse()
    }

    fn assert_tree(src: &str, expected: &[&str]) {
        let program = parse(src);
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        let actual = program
            .stmts
            .iter()
            .map(|s| print_stmt(s.as_ref().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(expected.to_vec(), actual);
    }

    fn messages(program: &ParsedProgram) -> Vec<String> {
        program.errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn parse_literal_expression_statements() {
        assert_tree(
            "nil; true; false; 1; \"s\";",
            &["(; nil)", "(; true)", "(; false)", "(; 1)", "(; s)"],
        );
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        assert_tree("1 + 2 * 3;", &["(; (+ 1 (* 2 3)))"]);
        assert_tree("(1 + 2) * 3;", &["(; (* (group (+ 1 2)) 3))"]);
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_tree("8 - 4 - 2;", &["(; (- (- 8 4) 2))"]);
        assert_tree("8 / 4 / 2;", &["(; (/ (/ 8 4) 2))"]);
    }

    #[test]
    fn precedence_ladder() {
        assert_tree("1 < 2 == true;", &["(; (== (< 1 2) true))"]);
        assert_tree("a or b and c;", &["(; (or a (and b c)))"]);
        assert_tree("!-x;", &["(; (! (- x)))"]);
        assert_tree("a == b or -c * d >= e;", &["(; (or (== a b) (>= (* (- c) d) e)))"]);
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_tree("a = b = 1;", &["(; (= a (= b 1)))"]);
        assert_tree("a = b or c;", &["(; (= a (or b c)))"]);
    }

    #[test]
    fn calls_chain() {
        assert_tree("f();", &["(; (call f))"]);
        assert_tree("f(1)(2, 3);", &["(; (call (call f 1) 2 3))"]);
    }

    #[test]
    fn declarations() {
        assert_tree("var a; var b = 1;", &["(var a)", "(var b 1)"]);
        assert_tree(
            "fun add(a, b) { return a + b; }",
            &["(fun add (a b) (return (+ a b)))"],
        );
        assert_tree("fun f() { return; }", &["(fun f () (return))"]);
    }

    #[test]
    fn control_flow() {
        assert_tree(
            "if (a) print 1; else { print 2; }",
            &["(if a (print 1) (block (print 2)))"],
        );
        assert_tree("while (x) x = x - 1;", &["(while x (; (= x (- x 1))))"]);
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        assert_tree(
            "if (a) if (b) print 1; else print 2;",
            &["(if a (if b (print 1) (print 2)))"],
        );
    }

    #[test]
    fn for_loop_desugars_to_while() {
        assert_tree(
            "for (var i = 0; i < 3; i = i + 1) print i;",
            &["(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"],
        );
        assert_tree("for (;;) print 1;", &["(block (while true (print 1)))"]);
        assert_tree("for (i = 0; ;) {}", &["(block (; (= i 0)) (while true (block)))"]);
    }

    #[test]
    fn invalid_assignment_target_keeps_parsing() {
        let program = parse("1 = 2; print 3;");
        assert_eq!(
            vec!["[line 1] Error at '=': invalid assignment target".to_owned()],
            messages(&program)
        );
        assert_eq!(2, program.stmts.len());
        assert_eq!("(; 1)", print_stmt(program.stmts[0].as_ref().unwrap()));
    }

    #[test]
    fn recovers_at_next_statement() {
        let program = parse("print 1;\nprint ;\nprint 3;");
        assert_eq!(
            vec!["[line 2] Error at ';': expect expression".to_owned()],
            messages(&program)
        );
        assert_eq!(3, program.stmts.len());
        assert!(program.stmts[0].is_some());
        assert!(program.stmts[1].is_none());
        assert!(program.stmts[2].is_some());
    }

    #[test]
    fn reports_independent_errors() {
        let program = parse("var = 1;\nprint 2;\nprint (;");
        assert_eq!(
            vec![
                "[line 1] Error at '=': expect variable name".to_owned(),
                "[line 3] Error at ';': expect expression".to_owned(),
            ],
            messages(&program)
        );
        assert_eq!(3, program.stmts.len());
        assert!(program.stmts[1].is_some());
    }

    #[test]
    fn error_at_end() {
        let program = parse("print 1");
        assert_eq!(1, program.errors.len());
        assert_eq!(Location::End, program.errors[0].location);
        assert_eq!("expect ';' after value", program.errors[0].message);
    }

    #[test]
    fn return_outside_function() {
        let program = parse("return 1;");
        assert_eq!(
            vec!["[line 1] Error at 'return': can't return from top-level code".to_owned()],
            messages(&program)
        );

        let program = parse("fun f() { if (true) { return 1; } }");
        assert!(program.errors.is_empty());
    }

    #[test]
    fn too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let program = parse(&format!("f({});", args));
        assert_eq!(1, program.errors.len());
        assert_eq!("can't have more than 255 arguments", program.errors[0].message);
        assert!(program.stmts[0].is_some());
    }

    #[test]
    fn too_many_parameters() {
        let params = (0..256).map(|i| format!("p{}", i)).collect::<Vec<_>>();
        let program = parse(&format!("fun f({}) {{}}", params.join(", ")));
        assert_eq!(1, program.errors.len());
        assert_eq!("can't have more than 255 parameters", program.errors[0].message);
        assert!(program.stmts[0].is_some());

        let program = parse(&format!("fun f({}) {{}}", params[..255].join(", ")));
        assert!(program.errors.is_empty());
    }

    #[test]
    fn parser_appends_missing_eof() {
        let spans = vec![
            Span::new(Token::Nil, "nil".to_owned(), 1),
            Span::new(Token::Semi, ";".to_owned(), 1),
        ];
        let program = Parser::new(spans).parse();
        assert!(program.errors.is_empty());
        assert_eq!(1, program.stmts.len());
    }
}
