//! Expression grammar, precedence-climbing from lowest to highest:
//! `||` < `&&` < equality < relational < additive < multiplicative < unary
//! < primary.

use crate::error::ParseResult;
use crate::parser::Parser;
use mylangc_ast::{BinOp, BinaryExpr, CallExpr, Expr, IdentExpr, LiteralExpr, LiteralValue, UnOp, UnaryExpr};
use mylangc_lex::TokenKind;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = Self::binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = Self::binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                _ => break,
            };
            self.bump();
            let right = self.parse_relational()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.at(&TokenKind::Bang) {
            let start = self.peek_span();
            self.bump();
            let operand = self.parse_unary()?;
            let span = start.to(operand.span());
            return Ok(Expr::Unary(UnaryExpr {
                op: UnOp::Not,
                operand: Box::new(operand),
                ty: None,
                span,
            }));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::IntLit(v) => {
                self.bump();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Int(v),
                    span,
                }))
            }
            TokenKind::FloatLit(v) => {
                self.bump();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Float(v),
                    span,
                }))
            }
            TokenKind::StringLit(s) => {
                self.bump();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Str(s),
                    span,
                }))
            }
            TokenKind::True => {
                self.bump();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Bool(true),
                    span,
                }))
            }
            TokenKind::False => {
                self.bump();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Bool(false),
                    span,
                }))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.bump();
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    let end = self.peek_span();
                    Ok(Expr::Call(CallExpr {
                        name,
                        args,
                        ty: None,
                        span: span.to(end),
                    }))
                } else {
                    Ok(Expr::Identifier(IdentExpr {
                        name,
                        ty: None,
                        span,
                    }))
                }
            }
            other => Err(crate::error::ParseError::UnexpectedToken {
                expected: "an expression".to_string(),
                found: format!("{other:?}"),
                span,
            }),
        }
    }

    pub(crate) fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            ty: None,
            span,
        })
    }
}
