//! Statement parsing (spec §4.3 / §3 "AST" — *Statements*).
use crate::ast::stmt::{Stmt, StmtKind, SwitchCase};
use crate::position::SourcePosition;
use crate::token::{Keyword, PunctToken, TokenKind};

use super::Parser;

impl<'t> Parser<'t> {
    pub fn parse_block_stmts(&mut self) -> Vec<Stmt> {
        self.expect_punct(PunctToken::LBrace);
        self.symbols.open_scope();
        let mut stmts = Vec::new();
        while self.peek().kind != TokenKind::Punct(PunctToken::RBrace) && !self.at_eof() && !self.fatal_recovery_exceeded() {
            stmts.push(self.parse_stmt());
        }
        self.symbols.close_scope();
        self.expect_punct(PunctToken::RBrace);
        stmts
    }

    fn parse_stmt(&mut self) -> Stmt {
        let start = self.peek().area.start;
        match self.peek().kind.clone() {
            TokenKind::Punct(PunctToken::LBrace) => {
                let body = self.parse_block_stmts();
                Stmt::new(StmtKind::Block(body), self.area_since(start))
            }
            TokenKind::Punct(PunctToken::Semi) => {
                self.bump();
                Stmt::new(StmtKind::Null, self.area_since(start))
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_stmt(start),
            TokenKind::Keyword(Keyword::While) => self.parse_while_stmt(start),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_stmt(start),
            TokenKind::Keyword(Keyword::For) => self.parse_for_stmt(start),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_stmt(start),
            TokenKind::Keyword(Keyword::Return) => {
                self.bump();
                let value = if self.peek().kind != TokenKind::Punct(PunctToken::Semi) { Some(self.parse_expr()) } else { None };
                self.expect_punct(PunctToken::Semi);
                Stmt::new(StmtKind::Return(value), self.area_since(start))
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.bump();
                self.expect_punct(PunctToken::Semi);
                Stmt::new(StmtKind::Break, self.area_since(start))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.bump();
                self.expect_punct(PunctToken::Semi);
                Stmt::new(StmtKind::Continue, self.area_since(start))
            }
            TokenKind::Keyword(Keyword::Discard) => {
                self.bump();
                self.expect_punct(PunctToken::Semi);
                Stmt::new(StmtKind::Discard, self.area_since(start))
            }
            _ => self.parse_decl_or_expr_stmt(start),
        }
    }

    fn parse_if_stmt(&mut self, start: SourcePosition) -> Stmt {
        self.bump();
        self.expect_punct(PunctToken::LParen);
        let cond = self.parse_expr();
        self.expect_punct(PunctToken::RParen);
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.peek().kind == TokenKind::Keyword(Keyword::Else) {
            self.bump();
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::new(StmtKind::If { cond, then_branch, else_branch }, self.area_since(start))
    }

    fn parse_while_stmt(&mut self, start: SourcePosition) -> Stmt {
        self.bump();
        self.expect_punct(PunctToken::LParen);
        let cond = self.parse_expr();
        self.expect_punct(PunctToken::RParen);
        let body = Box::new(self.parse_stmt());
        Stmt::new(StmtKind::While { cond, body }, self.area_since(start))
    }

    fn parse_do_while_stmt(&mut self, start: SourcePosition) -> Stmt {
        self.bump();
        let body = Box::new(self.parse_stmt());
        if self.peek().kind != TokenKind::Keyword(Keyword::While) {
            self.error("expected 'while' after 'do' block");
        } else {
            self.bump();
        }
        self.expect_punct(PunctToken::LParen);
        let cond = self.parse_expr();
        self.expect_punct(PunctToken::RParen);
        self.expect_punct(PunctToken::Semi);
        Stmt::new(StmtKind::DoWhile { body, cond }, self.area_since(start))
    }

    fn parse_for_stmt(&mut self, start: SourcePosition) -> Stmt {
        self.bump();
        self.expect_punct(PunctToken::LParen);
        self.symbols.open_scope();
        let init = if self.peek().kind == TokenKind::Punct(PunctToken::Semi) {
            self.bump();
            None
        } else {
            Some(Box::new(self.parse_decl_or_expr_stmt(self.peek().area.start)))
        };
        let cond = if self.peek().kind != TokenKind::Punct(PunctToken::Semi) { Some(self.parse_expr()) } else { None };
        self.expect_punct(PunctToken::Semi);
        let update = if self.peek().kind != TokenKind::Punct(PunctToken::RParen) { Some(self.parse_expr()) } else { None };
        self.expect_punct(PunctToken::RParen);
        let body = Box::new(self.parse_stmt());
        self.symbols.close_scope();
        Stmt::new(StmtKind::For { init, cond, update, body }, self.area_since(start))
    }

    fn parse_switch_stmt(&mut self, start: SourcePosition) -> Stmt {
        self.bump();
        self.expect_punct(PunctToken::LParen);
        let selector = self.parse_expr();
        self.expect_punct(PunctToken::RParen);
        self.expect_punct(PunctToken::LBrace);
        let mut cases = Vec::new();
        while !self.eat_punct(PunctToken::RBrace) && !self.at_eof() && !self.fatal_recovery_exceeded() {
            let value = if self.peek().kind == TokenKind::Keyword(Keyword::Case) {
                self.bump();
                let v = self.parse_expr();
                if self.peek().kind != TokenKind::Colon {
                    self.error("expected ':' after 'case' value");
                } else {
                    self.bump();
                }
                Some(v)
            } else if self.peek().kind == TokenKind::Keyword(Keyword::Default) {
                self.bump();
                if self.peek().kind != TokenKind::Colon {
                    self.error("expected ':' after 'default'");
                } else {
                    self.bump();
                }
                None
            } else {
                self.error("expected 'case' or 'default'");
                self.bump();
                continue;
            };
            let mut body = Vec::new();
            while !matches!(self.peek().kind, TokenKind::Keyword(Keyword::Case) | TokenKind::Keyword(Keyword::Default) | TokenKind::Punct(PunctToken::RBrace)) && !self.at_eof() {
                body.push(self.parse_stmt());
            }
            cases.push(SwitchCase { value, body });
        }
        Stmt::new(StmtKind::Switch { selector, cases }, self.area_since(start))
    }

    /// Disambiguates a variable-declaration statement from an
    /// expression-statement by attempting a type specifier first.
    fn parse_decl_or_expr_stmt(&mut self, start: SourcePosition) -> Stmt {
        let checkpoint = self.pos;
        if let Some(ty) = self.try_parse_type_specifier() {
            if let TokenKind::Ident = self.peek().kind {
                let name = self.bump().spelling;
                let mut ty = ty;
                ty.semantic = self.try_parse_semantic();
                let ids = self.parse_variable_decl_rest(start, name, ty, false);
                return Stmt::new(StmtKind::VarDecl(ids), self.area_since(start));
            }
        }
        self.pos = checkpoint;
        let expr = self.parse_expr();
        self.expect_punct(PunctToken::Semi);
        Stmt::new(StmtKind::Expr(expr), self.area_since(start))
    }
}
