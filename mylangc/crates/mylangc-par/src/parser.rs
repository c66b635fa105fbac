//! Parser core: token cursor and the small set of helpers every statement
//! and expression parser builds on.

use crate::error::{ParseError, ParseResult};
use mylangc_ast::{Block, Program, Type};
use mylangc_lex::{Token, TokenKind};
use mylangc_util::Span;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while !self.at(&TokenKind::Eof) {
            statements.push(self.parse_stmt()?);
        }
        Ok(Program { statements })
    }

    // --- token-stream primitives -------------------------------------

    pub(crate) fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{kind:?}"),
                found: format!("{:?}", self.peek()),
                span: self.peek_span(),
            })
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<mylangc_util::Symbol> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: format!("{other:?}"),
                span: self.peek_span(),
            }),
        }
    }

    pub(crate) fn parse_type(&mut self) -> ParseResult<Type> {
        let ty = match self.peek() {
            TokenKind::KwInt => Type::Int,
            TokenKind::KwFloat => Type::Float,
            TokenKind::KwBool => Type::Bool,
            TokenKind::KwString => Type::String,
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a type name".to_string(),
                    found: format!("{other:?}"),
                    span: self.peek_span(),
                })
            }
        };
        self.bump();
        Ok(ty)
    }

    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(&TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            statements.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Block { statements })
    }
}
