//! Token kinds produced by the lexer.

use mylangc_util::{Span, Symbol};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLit(i64),
    FloatLit(f32),
    StringLit(Symbol),
    Ident(Symbol),

    // Keywords
    Let,
    Print,
    Return,
    If,
    Else,
    While,
    For,
    Function,
    Try,
    Catch,
    Match,
    Case,
    Default,
    True,
    False,
    KwInt,
    KwFloat,
    KwBool,
    KwString,

    // Punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    EqEq,
    Ne,
    AmpAmp,
    PipePipe,
    Bang,
    Eq,
    Colon,
    Semi,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

pub fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "let" => TokenKind::Let,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "match" => TokenKind::Match,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "int" => TokenKind::KwInt,
        "float" => TokenKind::KwFloat,
        "bool" => TokenKind::KwBool,
        "string" => TokenKind::KwString,
        _ => return None,
    })
}
