//! The MyLang lexer: source text in, a flat token stream out.

use crate::cursor::Cursor;
use crate::error::{LexError, LexResult};
use crate::token::{keyword, Token, TokenKind};
use mylangc_util::{Span, Symbol};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
        }
    }

    /// Lex the entire input, stopping at the first error.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> LexResult<Token> {
        self.skip_trivia();

        let start = self.cursor.pos();
        if self.cursor.is_eof() {
            return Ok(Token::new(TokenKind::Eof, Span::new(start as u32, start as u32)));
        }

        let c = self.cursor.peek();
        let kind = match c {
            b'0'..=b'9' => self.lex_number()?,
            b'"' => self.lex_string()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b':' => self.single(TokenKind::Colon),
            b';' => self.single(TokenKind::Semi),
            b',' => self.single(TokenKind::Comma),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'<' => self.single(TokenKind::Lt),
            b'>' => self.single(TokenKind::Gt),
            b'=' => self.lex_eq(),
            b'!' => self.lex_bang(),
            b'&' => self.lex_amp()?,
            b'|' => self.lex_pipe()?,
            other => {
                let span = Span::new(start as u32, (start + 1) as u32);
                return Err(LexError::UnexpectedChar(other as char, span));
            }
        };

        let end = self.cursor.pos();
        Ok(Token::new(kind, Span::new(start as u32, end as u32)))
    }

    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(|b| b.is_ascii_whitespace());
            if self.cursor.peek() == b'/' && self.cursor.peek_at(1) == b'/' {
                self.cursor.eat_while(|b| b != b'\n');
                continue;
            }
            break;
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.bump();
        kind
    }

    fn lex_eq(&mut self) -> TokenKind {
        self.cursor.bump();
        if self.cursor.peek() == b'=' {
            self.cursor.bump();
            TokenKind::EqEq
        } else {
            TokenKind::Eq
        }
    }

    fn lex_bang(&mut self) -> TokenKind {
        self.cursor.bump();
        if self.cursor.peek() == b'=' {
            self.cursor.bump();
            TokenKind::Ne
        } else {
            TokenKind::Bang
        }
    }

    fn lex_amp(&mut self) -> LexResult<TokenKind> {
        let start = self.cursor.pos();
        self.cursor.bump();
        if self.cursor.peek() == b'&' {
            self.cursor.bump();
            Ok(TokenKind::AmpAmp)
        } else {
            Err(LexError::UnexpectedChar(
                '&',
                Span::new(start as u32, self.cursor.pos() as u32),
            ))
        }
    }

    fn lex_pipe(&mut self) -> LexResult<TokenKind> {
        let start = self.cursor.pos();
        self.cursor.bump();
        if self.cursor.peek() == b'|' {
            self.cursor.bump();
            Ok(TokenKind::PipePipe)
        } else {
            Err(LexError::UnexpectedChar(
                '|',
                Span::new(start as u32, self.cursor.pos() as u32),
            ))
        }
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.cursor.pos();
        self.cursor
            .eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let text = self.cursor.slice(start, self.cursor.pos());
        keyword(text).unwrap_or_else(|| TokenKind::Ident(Symbol::intern(text)))
    }

    fn lex_number(&mut self) -> LexResult<TokenKind> {
        let start = self.cursor.pos();
        self.cursor.eat_while(|b| b.is_ascii_digit());
        let mut is_float = false;
        if self.cursor.peek() == b'.' && self.cursor.peek_at(1).is_ascii_digit() {
            is_float = true;
            self.cursor.bump();
            self.cursor.eat_while(|b| b.is_ascii_digit());
        }
        let text = self.cursor.slice(start, self.cursor.pos());
        let span = Span::new(start as u32, self.cursor.pos() as u32);
        if is_float {
            text.parse::<f32>()
                .map(TokenKind::FloatLit)
                .map_err(|_| LexError::InvalidNumber(text.to_string(), span))
        } else {
            text.parse::<i64>()
                .map(TokenKind::IntLit)
                .map_err(|_| LexError::InvalidNumber(text.to_string(), span))
        }
    }

    fn lex_string(&mut self) -> LexResult<TokenKind> {
        let start = self.cursor.pos();
        self.cursor.bump(); // opening quote
        let content_start = self.cursor.pos();
        loop {
            if self.cursor.is_eof() {
                return Err(LexError::UnterminatedString(Span::new(
                    start as u32,
                    self.cursor.pos() as u32,
                )));
            }
            if self.cursor.peek() == b'"' {
                break;
            }
            self.cursor.bump();
        }
        let content_end = self.cursor.pos();
        self.cursor.bump(); // closing quote
        let text = self.cursor.slice(content_start, content_end);
        Ok(TokenKind::StringLit(Symbol::intern(text)))
    }
}
