//! Statement grammar.

use crate::error::ParseResult;
use crate::parser::Parser;
use mylangc_ast::{
    AssignStmt, CallExpr, DefaultCase, ForClause, ForStmt, FunctionDecl, IfStmt, MatchCase,
    MatchStmt, PrintStmt, ReturnStmt, Stmt, TryCatchStmt, VarDeclStmt, WhileStmt,
};
use mylangc_lex::TokenKind;

impl Parser {
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            TokenKind::Let => self.parse_var_decl().map(Stmt::VarDecl),
            TokenKind::Print => self.parse_print().map(Stmt::Print),
            TokenKind::Return => self.parse_return().map(Stmt::Return),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::For => self.parse_for().map(Stmt::For),
            TokenKind::Function => self.parse_function_decl().map(Stmt::FunctionDecl),
            TokenKind::Try => self.parse_try_catch().map(Stmt::TryCatch),
            TokenKind::Match => self.parse_match().map(Stmt::Match),
            TokenKind::Ident(_) => self.parse_ident_led_stmt(),
            _ => {
                let found = format!("{:?}", self.peek());
                Err(crate::error::ParseError::UnexpectedToken {
                    expected: "a statement".to_string(),
                    found,
                    span: self.peek_span(),
                })
            }
        }
    }

    /// An identifier can start either an `Assignment` or a bare
    /// `FunctionCall` statement; disambiguate by looking one token ahead.
    fn parse_ident_led_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek_span();
        let name = self.expect_ident()?;
        if self.eat(&TokenKind::LParen) {
            let args = self.parse_call_args()?;
            self.expect(&TokenKind::Semi)?;
            let end = self.peek_span();
            return Ok(Stmt::ExprStmt(CallExpr {
                name,
                args,
                ty: None,
                span: start.to(end),
            }));
        }
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semi)?;
        let end = self.peek_span();
        Ok(Stmt::Assign(AssignStmt {
            name,
            value,
            span: start.to(end),
        }))
    }

    fn parse_var_decl(&mut self) -> ParseResult<VarDeclStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::Let)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let declared_type = self.parse_type()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semi)?;
        let end = self.peek_span();
        Ok(VarDeclStmt {
            name,
            declared_type,
            value,
            span: start.to(end),
        })
    }

    fn parse_print(&mut self) -> ParseResult<PrintStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::Print)?;
        self.expect(&TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Semi)?;
        let end = self.peek_span();
        Ok(PrintStmt {
            expr,
            span: start.to(end),
        })
    }

    fn parse_return(&mut self) -> ParseResult<ReturnStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::Return)?;
        let value = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semi)?;
        let end = self.peek_span();
        Ok(ReturnStmt {
            value,
            span: start.to(end),
        })
    }

    fn parse_if(&mut self) -> ParseResult<IfStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        let end = self.peek_span();
        Ok(IfStmt {
            condition,
            then_block,
            else_block,
            span: start.to(end),
        })
    }

    fn parse_while(&mut self) -> ParseResult<WhileStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        let end = self.peek_span();
        Ok(WhileStmt {
            condition,
            body,
            span: start.to(end),
        })
    }

    fn parse_for(&mut self) -> ParseResult<ForStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LParen)?;

        let init = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_for_clause()?)
        };
        self.expect(&TokenKind::Semi)?;

        let condition = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semi)?;

        let update = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_for_clause()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_block()?;
        let end = self.peek_span();
        Ok(ForStmt {
            init,
            condition,
            update,
            body,
            span: start.to(end),
        })
    }

    /// `init`/`update` share the grammar of a `VarDecl`/`Assign` but without
    /// the terminating semicolon (the `for` header supplies its own).
    fn parse_for_clause(&mut self) -> ParseResult<ForClause> {
        if self.eat(&TokenKind::Let) {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let declared_type = self.parse_type()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expr()?;
            Ok(ForClause::VarDecl {
                name,
                declared_type,
                value,
            })
        } else {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expr()?;
            Ok(ForClause::Assign { name, value })
        }
    }

    fn parse_function_decl(&mut self) -> ParseResult<FunctionDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::Function)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let pname = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                let pty = self.parse_type()?;
                params.push((pname, pty));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Colon)?;
        let return_type = self.parse_type()?;
        let body = self.parse_block()?;
        let end = self.peek_span();
        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            span: start.to(end),
        })
    }

    fn parse_try_catch(&mut self) -> ParseResult<TryCatchStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::Try)?;
        let try_block = self.parse_block()?;
        self.expect(&TokenKind::Catch)?;
        self.expect(&TokenKind::LParen)?;
        let exception_name = self.expect_ident()?;
        self.expect(&TokenKind::RParen)?;
        let catch_block = self.parse_block()?;
        let end = self.peek_span();
        Ok(TryCatchStmt {
            try_block,
            exception_name,
            catch_block,
            span: start.to(end),
        })
    }

    fn parse_match(&mut self) -> ParseResult<MatchStmt> {
        let start = self.peek_span();
        self.expect(&TokenKind::Match)?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        let mut default = None;
        while !self.at(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Case) {
                let value = self.parse_expr()?;
                self.expect(&TokenKind::Colon)?;
                let body = self.parse_case_body()?;
                cases.push(MatchCase { value, body });
            } else if self.eat(&TokenKind::Default) {
                self.expect(&TokenKind::Colon)?;
                let body = self.parse_case_body()?;
                default = Some(DefaultCase { body });
            } else {
                let found = format!("{:?}", self.peek());
                return Err(crate::error::ParseError::UnexpectedToken {
                    expected: "`case` or `default`".to_string(),
                    found,
                    span: self.peek_span(),
                });
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let end = self.peek_span();
        Ok(MatchStmt {
            expr,
            cases,
            default,
            span: start.to(end),
        })
    }

    /// A match/default arm's body runs until the next `case`, `default`, or
    /// the closing brace of the `match` — there is no per-arm block syntax.
    fn parse_case_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Case)
            && !self.at(&TokenKind::Default)
            && !self.at(&TokenKind::RBrace)
        {
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }
}
