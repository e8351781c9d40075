//! Module for source-level syntactic elements.

use std::fmt;

use crate::ast::Primitive;

/// The fundamental units of the language.
///
/// Each token represents an atomic element of the language grammar. A few of the literal tokens
/// also contains the value it represents.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Punctuations.
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Comma,
    Semi,
    Dot,

    // Operators.
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Lt,
    Gt,
    Eq,
    LtEq,
    GtEq,
    EqEq,
    NotEq,

    // Keywords.
    And,
    Or,
    If,
    Else,
    For,
    While,
    Ret,
    Var,
    Fun,
    Print,
    Class,
    This,
    Super,

    // Literals.
    Nil,
    True,
    False,
    Num(f64),
    Str(String),
    Ident(String),

    // End-of-file marker.
    EOF,
}

impl Token {
    pub fn get_keyword(ident: &str) -> Option<Token> {
        Some(match ident {
            "and" => Token::And,
            "class" => Token::Class,
            "else" => Token::Else,
            "false" => Token::False,
            "for" => Token::For,
            "fun" => Token::Fun,
            "if" => Token::If,
            "nil" => Token::Nil,
            "or" => Token::Or,
            "print" => Token::Print,
            "return" => Token::Ret,
            "super" => Token::Super,
            "this" => Token::This,
            "true" => Token::True,
            "var" => Token::Var,
            "while" => Token::While,
            _ => return None,
        })
    }

    /// Whether this token can begin a declaration or statement, used as a recovery point after
    /// a syntax error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Token::Class
                | Token::Fun
                | Token::Var
                | Token::For
                | Token::If
                | Token::While
                | Token::Print
                | Token::Ret
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Lparen => write!(f, "("),
            Token::Rparen => write!(f, ")"),
            Token::Lbrace => write!(f, "{{"),
            Token::Rbrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Bang => write!(f, "!"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Eq => write!(f, "="),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::While => write!(f, "while"),
            Token::Ret => write!(f, "return"),
            Token::Var => write!(f, "var"),
            Token::Fun => write!(f, "fun"),
            Token::Print => write!(f, "print"),
            Token::Class => write!(f, "class"),
            Token::This => write!(f, "this"),
            Token::Super => write!(f, "super"),
            Token::Nil => write!(f, "nil"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Num(n) => write!(f, "{}", n),
            Token::Str(ref s) | Token::Ident(ref s) => write!(f, "{}", s),
            Token::EOF => write!(f, "EOF"),
        }
    }
}

/// A region of the source code.
///
/// Represents a token and metadata that loosely maps it back to the source code. Thinking of
/// source code as a series of lines, a line is then composed of a series of "spans". The lexeme
/// is the exact source text the token was scanned from.
#[derive(Clone, Debug)]
pub struct Span {
    pub token: Token,
    pub lexeme: String,
    pub line: usize,
}

impl Span {
    pub fn new(token: Token, lexeme: String, line: usize) -> Self {
        Self {
            token,
            lexeme,
            line,
        }
    }

    /// The literal value carried by this span, if its token is a literal.
    pub fn literal(&self) -> Option<Primitive> {
        Some(match self.token {
            Token::Nil => Primitive::Nil,
            Token::True => Primitive::Bool(true),
            Token::False => Primitive::Bool(false),
            Token::Num(n) => Primitive::Num(n),
            Token::Str(ref s) => Primitive::Str(s.clone()),
            _ => return None,
        })
    }
}
