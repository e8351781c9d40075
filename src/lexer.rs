use tracing::debug;

use crate::ast::Span;
use crate::ast::Token;
use crate::error::{Location, SyntaxError};
use crate::LexedProgram;

pub struct Lexer {
    src: Vec<char>,
    start: usize,
    idx: usize,
    line: usize,
    errors: Vec<SyntaxError>,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.chars().collect(),
            start: 0,
            idx: 0,
            line: 1,
            errors: Vec::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn scan(mut self) -> LexedProgram {
        let mut spans: Vec<Span> = Vec::new();

        while !self.is_at_end() {
            self.start = self.idx;
            let line = self.line;
            if let Some(token) = self.scan_token() {
                spans.push(Span::new(token, self.lexeme(), line));
            }
        }

        spans.push(Span::new(Token::EOF, String::new(), self.line));
        debug!(tokens = spans.len(), errors = self.errors.len(), "scanned");
        LexedProgram {
            errors: self.errors,
            spans,
        }
    }

    fn scan_token(&mut self) -> Option<Token> {
        let curr = self.advance();
        let token = match curr {
            '(' => Token::Lparen,
            ')' => Token::Rparen,
            '{' => Token::Lbrace,
            '}' => Token::Rbrace,
            ',' => Token::Comma,
            ';' => Token::Semi,
            '.' => Token::Dot,

            ' ' | '\t' | '\r' => return None,
            '\n' => {
                self.advance_line();
                return None;
            }

            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => {
                if self.matches('/') {
                    self.finish_line_comment();
                    return None;
                } else if self.matches('*') {
                    self.finish_block_comment();
                    return None;
                } else {
                    Token::Slash
                }
            }

            '<' => {
                if self.matches('=') {
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.matches('=') {
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '=' => {
                if self.matches('=') {
                    Token::EqEq
                } else {
                    Token::Eq
                }
            }
            '!' => {
                if self.matches('=') {
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }

            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(),
            '0'..='9' => return self.scan_number(),
            '"' => return self.scan_string(),

            _ => {
                self.error(format!("unexpected character '{}'", curr));
                return None;
            }
        };
        Some(token)
    }

    fn is_at_end(&self) -> bool {
        self.idx >= self.src.len()
    }

    fn has_lookahead(&self) -> bool {
        self.idx + 1 < self.src.len()
    }

    fn advance(&mut self) -> char {
        let curr = self.src[self.idx];
        self.idx += 1;
        curr
    }

    fn advance_line(&mut self) {
        self.line += 1;
    }

    fn consume(&mut self) {
        self.idx += 1;
    }

    fn peek(&self) -> char {
        self.src[self.idx]
    }

    fn peek_next(&self) -> char {
        self.src[self.idx + 1]
    }

    fn matches(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.consume();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.src[self.start..self.idx].iter().collect()
    }

    fn finish_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.consume();
        }
    }

    fn finish_block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == '*' && self.has_lookahead() && self.peek_next() == '/' {
                self.consume();
                self.consume();
                return;
            }
            if self.advance() == '\n' {
                self.advance_line();
            }
        }
        self.error("unterminated block comment");
    }

    fn scan_identifier(&mut self) -> Token {
        while !self.is_at_end() && is_alphanumeric(self.peek()) {
            self.consume();
        }
        let name = self.lexeme();
        Token::get_keyword(&name).unwrap_or(Token::Ident(name))
    }

    fn scan_number(&mut self) -> Option<Token> {
        while !self.is_at_end() && is_digit(self.peek()) {
            self.consume();
        }

        if self.has_lookahead() && self.peek() == '.' && is_digit(self.peek_next()) {
            self.consume();
            while !self.is_at_end() && is_digit(self.peek()) {
                self.consume();
            }
        }

        let rep = self.lexeme();
        match rep.parse::<f64>() {
            Ok(num) => Some(Token::Num(num)),
            Err(_) => {
                self.error(format!("cannot parse as number '{}'", rep));
                None
            }
        }
    }

    fn scan_string(&mut self) -> Option<Token> {
        let start = self.idx;
        while !self.is_at_end() && self.peek() != '"' {
            if self.advance() == '\n' {
                self.advance_line();
            }
        }

        let end = self.idx;
        if self.is_at_end() {
            self.error("unterminated string");
            return None;
        } else {
            self.consume();
        }

        let inner = self.src[start..end].iter().collect::<String>();
        Some(Token::Str(inner))
    }

    fn error(&mut self, msg: impl Into<String>) {
        let err = SyntaxError::new(self.line, Location::Here, msg);
        debug!(%err, "scan error");
        self.errors.push(err);
    }
}

fn is_alphanumeric(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Token::*;
    use pretty_assertions::assert_eq;

    fn assert_tokens(src: &str, expected: &[Token]) {
        let spans = Lexer::new(src).scan().spans;
        let actual = spans.into_iter().map(|s| s.token).collect::<Vec<_>>();
        assert_eq!(expected.to_vec(), actual);
    }

    #[test]
    fn eof_token_when_empty_source() {
        let src = "";
        let spans = Lexer::new(src).scan().spans;
        assert_eq!(1, spans.len());
        assert_eq!(EOF, spans[0].token);
        assert_eq!("", spans[0].lexeme);
    }

    #[test]
    fn eof_token_has_line_count() {
        let src = "";
        let spans = Lexer::new(src).scan().spans;
        assert_eq!(1, spans.len());
        assert_eq!(1, spans[0].line);
    }

    #[test]
    fn eof_token_always_last() {
        let src = ";";
        let expected = [Semi, EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn line_count_increments() {
        let src = ";\n;\n;";
        let spans = Lexer::new(src).scan().spans;
        let lines = spans.iter().map(|s| s.line).collect::<Vec<_>>();
        assert_eq!(vec![1, 2, 3, 3], lines);
    }

    #[test]
    fn whitespace_is_ignored() {
        let src = " \t\r\n";
        let expected = [EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn line_comment_is_ignored() {
        let src = "//\n\
                   ////\n\
                   // a\n\
                   ; // abc\n";
        let expected = [Semi, EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn block_comment_is_ignored() {
        let src = "/* a */ ; /* b\n c\n */ ;";
        let spans = Lexer::new(src).scan().spans;
        assert_eq!(Semi, spans[1].token);
        assert_eq!(3, spans[1].line);
        assert_tokens(src, &[Semi, Semi, EOF]);
    }

    #[test]
    fn block_comment_does_not_nest() {
        let src = "/* /* */ ; */";
        assert_tokens(src, &[Semi, Star, Slash, EOF]);
    }

    #[test]
    fn lexemes_are_source_text() {
        let spans = Lexer::new("var x1 = 10.50 != \"s\";").scan().spans;
        let lexemes = spans.iter().map(|s| s.lexeme.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["var", "x1", "=", "10.50", "!=", "\"s\"", ";", ""], lexemes);
    }

    #[test]
    fn token_punctuations() {
        let src = "(){},;.";
        let expected = [Lparen, Rparen, Lbrace, Rbrace, Comma, Semi, Dot, EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn token_operators() {
        let src = "+-*/ ! < <= > >= = == !=";
        let expected = [
            Plus, Minus, Star, Slash, Bang, Lt, LtEq, Gt, GtEq, Eq, EqEq, NotEq, EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn token_two_char_operators_are_greedy() {
        let src = "!==<==>=";
        let expected = [NotEq, Eq, LtEq, Eq, GtEq, EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn token_keywords() {
        let src = "and class else false for fun if nil or \
                   print return super this true var while";
        let expected = [
            And, Class, Else, False, For, Fun, If, Nil, Or, Print, Ret, Super, This, True, Var,
            While, EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_number_integers() {
        let src = "0 1 3 10 500";
        let expected = [Num(0.0), Num(1.0), Num(3.0), Num(10.0), Num(500.0), EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_number_decimals() {
        let src = "0.0 0.1 3.1415 10.01 500.001";
        let expected = [
            Num(0.0),
            Num(0.1),
            Num(3.1415),
            Num(10.01),
            Num(500.001),
            EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_number_decimal_with_no_fraction() {
        let src = "0.a 25.03c 7.";
        let expected = [
            Num(0.0),
            Dot,
            Ident("a".to_owned()),
            Num(25.03),
            Ident("c".to_owned()),
            Num(7.0),
            Dot,
            EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_strings() {
        let src = r#" "" "a" "abc" "#;
        let expected = [
            Str("".to_owned()),
            Str("a".to_owned()),
            Str("abc".to_owned()),
            EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_string_is_not_escape_processed() {
        let src = r#" "a\nb" "#;
        let expected = [Str("a\\nb".to_owned()), EOF];
        assert_tokens(src, &expected);
    }

    #[test]
    fn literal_string_has_starting_line_count() {
        let src = " \"a\nb\" ";
        let spans = Lexer::new(src).scan().spans;
        assert_eq!(2, spans.len());
        assert_eq!(Str("a\nb".to_owned()), spans[0].token);
        assert_eq!(1, spans[0].line);
    }

    #[test]
    fn literal_string_increments_line_count() {
        let src = " \"a\nb\" ";
        let spans = Lexer::new(src).scan().spans;
        assert_eq!(2, spans.len());
        assert_eq!(EOF, spans[1].token);
        assert_eq!(2, spans[1].line);
    }

    #[test]
    fn literal_identifiers() {
        let src = "_ __ _a a_ _a_ a_b a1 A Ab AB";
        let expected = [
            Ident("_".to_owned()),
            Ident("__".to_owned()),
            Ident("_a".to_owned()),
            Ident("a_".to_owned()),
            Ident("_a_".to_owned()),
            Ident("a_b".to_owned()),
            Ident("a1".to_owned()),
            Ident("A".to_owned()),
            Ident("Ab".to_owned()),
            Ident("AB".to_owned()),
            EOF,
        ];
        assert_tokens(src, &expected);
    }

    #[test]
    fn error_when_unrecognized_character() {
        let src = "@";
        let report = Lexer::new(src).scan();
        assert_eq!(1, report.errors.len());
        assert_eq!(1, report.spans.len());
        assert_eq!(EOF, report.spans[0].token);
    }

    #[test]
    fn scanning_continues_after_error() {
        let src = "1 @\n# 2";
        let report = Lexer::new(src).scan();
        assert_eq!(2, report.errors.len());
        assert_eq!(1, report.errors[0].line);
        assert_eq!(2, report.errors[1].line);
        let tokens = report.spans.into_iter().map(|s| s.token).collect::<Vec<_>>();
        assert_eq!(vec![Num(1.0), Num(2.0), EOF], tokens);
    }

    #[test]
    fn error_when_unterminated_string() {
        let src = "true \"a";
        let report = Lexer::new(src).scan();
        assert_eq!(1, report.errors.len());
        assert_eq!("unterminated string", report.errors[0].message);
        assert_eq!(2, report.spans.len());
        assert_eq!(True, report.spans[0].token);
        assert_eq!(EOF, report.spans[1].token);
    }

    #[test]
    fn error_when_unterminated_block_comment() {
        let src = "; /* a\n b *";
        let report = Lexer::new(src).scan();
        assert_eq!(1, report.errors.len());
        assert_eq!("unterminated block comment", report.errors[0].message);
        assert_eq!(2, report.errors[0].line);
        assert_eq!(2, report.spans.len());
        assert_eq!(Semi, report.spans[0].token);
    }
}
