//! Expression parsing: precedence climbing plus the cast/parenthesized
//! disambiguation that needs the live type-name symbol table (spec §4.3).
use crate::ast::expr::{BinaryOp, CallTarget, Expr, ExprKind, ExprNode, Literal, PostUnaryOp, UnaryOp};
use crate::token::{AssignOpToken, BinOpToken, PunctToken, TokenKind, UnaryOpToken};

use super::Parser;

impl<'t> Parser<'t> {
    pub fn parse_expr(&mut self) -> Expr {
        let first = self.parse_assignment_expr();
        if matches!(self.peek().kind, TokenKind::BinOp(BinOpToken::Comma)) {
            let start = first.area.start;
            let mut items = vec![first];
            while matches!(self.peek().kind, TokenKind::BinOp(BinOpToken::Comma)) {
                self.bump();
                items.push(self.parse_assignment_expr());
            }
            let area = self.area_since(start);
            Box::new(ExprNode::new(ExprKind::Sequence(items), area))
        } else {
            first
        }
    }

    pub fn parse_assignment_expr(&mut self) -> Expr {
        let start = self.peek().area.start;
        let lhs = self.parse_ternary_expr();
        if let TokenKind::AssignOp(op) = self.peek().kind {
            self.bump();
            let rhs = self.parse_assignment_expr();
            let area = self.area_since(start);
            return Box::new(ExprNode::new(ExprKind::Binary { op: assign_op(op), lhs, rhs }, area));
        }
        lhs
    }

    fn parse_ternary_expr(&mut self) -> Expr {
        let start = self.peek().area.start;
        let cond = self.parse_binary_expr(0);
        if self.peek().kind == TokenKind::Question {
            self.bump();
            let then_branch = self.parse_assignment_expr();
            if self.peek().kind != TokenKind::Colon {
                self.error("expected ':' in ternary expression");
            } else {
                self.bump();
            }
            let else_branch = self.parse_assignment_expr();
            let area = self.area_since(start);
            Box::new(ExprNode::new(ExprKind::Ternary { cond, then_branch, else_branch }, area))
        } else {
            cond
        }
    }

    /// Binary operators above a minimum precedence, left-associative.
    fn parse_binary_expr(&mut self, min_prec: u8) -> Expr {
        let start = self.peek().area.start;
        let mut lhs = self.parse_unary_expr();
        loop {
            let Some((op, prec)) = binary_op_and_prec(&self.peek().kind) else { break };
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary_expr(prec + 1);
            let area = self.area_since(start);
            lhs = Box::new(ExprNode::new(ExprKind::Binary { op, lhs, rhs }, area));
        }
        lhs
    }

    fn parse_unary_expr(&mut self) -> Expr {
        let start = self.peek().area.start;
        let op = match self.peek().kind {
            TokenKind::UnaryOp(UnaryOpToken::Not) => Some(UnaryOp::Not),
            TokenKind::UnaryOp(UnaryOpToken::BitNot) => Some(UnaryOp::BitNot),
            TokenKind::UnaryOp(UnaryOpToken::Inc) => Some(UnaryOp::PreInc),
            TokenKind::UnaryOp(UnaryOpToken::Dec) => Some(UnaryOp::PreDec),
            TokenKind::BinOp(BinOpToken::Sub) => Some(UnaryOp::Negate),
            TokenKind::BinOp(BinOpToken::Add) => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary_expr();
            let area = self.area_since(start);
            return Box::new(ExprNode::new(ExprKind::Unary { op, operand }, area));
        }
        if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
            if let Some(cast) = self.try_parse_cast(start) {
                return cast;
            }
        }
        self.parse_postfix_expr()
    }

    /// `(` type-denoter `)` unary-expr — only valid when the parenthesized
    /// content is a complete type name and what follows can start an
    /// operand. Backtracks cleanly on anything else, since `(x)` with `x`
    /// a variable must fall through to a parenthesized expression instead.
    fn try_parse_cast(&mut self, start: crate::position::SourcePosition) -> Option<Expr> {
        let checkpoint = self.save();
        self.bump(); // '('
        let Some(ty) = self.try_parse_type_denoter() else {
            self.restore(checkpoint);
            return None;
        };
        if self.peek().kind != TokenKind::Punct(PunctToken::RParen) {
            self.restore(checkpoint);
            return None;
        }
        self.bump(); // ')'
        if !can_start_unary_operand(&self.peek().kind) {
            self.restore(checkpoint);
            return None;
        }
        let operand = self.parse_unary_expr();
        let area = self.area_since(start);
        Some(Box::new(ExprNode::new(ExprKind::Cast { target: ty, operand }, area)))
    }

    fn parse_postfix_expr(&mut self) -> Expr {
        let start = self.peek().area.start;
        let mut expr = self.parse_primary_expr();
        loop {
            match self.peek().kind {
                TokenKind::Punct(PunctToken::Dot) => {
                    self.bump();
                    let Some(member) = self.expect_ident() else { break };
                    if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
                        // Member function call, e.g. `tex.Sample(...)`. The
                        // receiver becomes the call's implicit first
                        // argument; the analyzer resolves `member` against
                        // the receiver's type (texture/buffer methods are
                        // not in the free-function intrinsic table).
                        let mut args = self.parse_call_args();
                        args.insert(0, expr);
                        let area = self.area_since(start);
                        expr = Box::new(ExprNode::new(
                            ExprKind::Call { target: CallTarget::Unresolved, callee_name: member, args, filled_defaults: Vec::new() },
                            area,
                        ));
                    } else {
                        let area = self.area_since(start);
                        expr = Box::new(ExprNode::new(ExprKind::Member { base: expr, member, resolved: None }, area));
                    }
                }
                TokenKind::Punct(PunctToken::LBracket) => {
                    self.bump();
                    let index = self.parse_expr();
                    self.expect_punct(PunctToken::RBracket);
                    let area = self.area_since(start);
                    expr = Box::new(ExprNode::new(ExprKind::Subscript { base: expr, index }, area));
                }
                TokenKind::UnaryOp(UnaryOpToken::Inc) => {
                    self.bump();
                    let area = self.area_since(start);
                    expr = Box::new(ExprNode::new(ExprKind::PostUnary { op: PostUnaryOp::PostInc, operand: expr }, area));
                }
                TokenKind::UnaryOp(UnaryOpToken::Dec) => {
                    self.bump();
                    let area = self.area_since(start);
                    expr = Box::new(ExprNode::new(ExprKind::PostUnary { op: PostUnaryOp::PostDec, operand: expr }, area));
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        self.expect_punct(PunctToken::LParen);
        let mut args = Vec::new();
        if self.peek().kind != TokenKind::Punct(PunctToken::RParen) {
            loop {
                args.push(self.parse_assignment_expr());
                if !matches!(self.peek().kind, TokenKind::BinOp(BinOpToken::Comma)) {
                    break;
                }
                self.bump();
            }
        }
        self.expect_punct(PunctToken::RParen);
        args
    }

    fn parse_primary_expr(&mut self) -> Expr {
        let start = self.peek().area.start;
        match self.peek().kind.clone() {
            TokenKind::IntLiteral => {
                let spelling = self.bump().spelling;
                let value = parse_int_spelling(&spelling);
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Literal(Literal::Int(value)), area))
            }
            TokenKind::FloatLiteral => {
                let spelling = self.bump().spelling;
                let value: f64 = spelling.trim_end_matches(|c: char| c.is_alphabetic()).parse().unwrap_or(0.0);
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Literal(Literal::Float(value)), area))
            }
            TokenKind::BoolLiteral => {
                let spelling = self.bump().spelling;
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Literal(Literal::Bool(spelling == "true")), area))
            }
            TokenKind::StringLiteral => {
                let spelling = self.bump().spelling;
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Literal(Literal::String(trim_quotes(&spelling))), area))
            }
            TokenKind::Ident => {
                let name = self.bump().spelling;
                if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
                    let args = self.parse_call_args();
                    let area = self.area_since(start);
                    return Box::new(ExprNode::new(
                        ExprKind::Call { target: CallTarget::Unresolved, callee_name: name, args, filled_defaults: Vec::new() },
                        area,
                    ));
                }
                let mut indices = Vec::new();
                while self.peek().kind == TokenKind::Punct(PunctToken::LBracket) {
                    self.bump();
                    indices.push(self.parse_expr());
                    self.expect_punct(PunctToken::RBracket);
                }
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Identifier { name, indices, resolved: None }, area))
            }
            TokenKind::Punct(PunctToken::LParen) => {
                self.bump();
                let inner = self.parse_expr();
                self.expect_punct(PunctToken::RParen);
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::Bracket(inner), area))
            }
            TokenKind::Punct(PunctToken::LBrace) => {
                self.bump();
                let mut items = Vec::new();
                if self.peek().kind != TokenKind::Punct(PunctToken::RBrace) {
                    loop {
                        items.push(self.parse_assignment_expr());
                        if !matches!(self.peek().kind, TokenKind::BinOp(BinOpToken::Comma)) {
                            break;
                        }
                        self.bump();
                    }
                }
                self.expect_punct(PunctToken::RBrace);
                let area = self.area_since(start);
                Box::new(ExprNode::new(ExprKind::InitializerList(items), area))
            }
            _ => {
                if let Some(ty) = self.try_parse_type_denoter() {
                    let area = self.area_since(start);
                    if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
                        let args = self.parse_call_args();
                        let area2 = self.area_since(start);
                        return Box::new(ExprNode::new(
                            ExprKind::Call { target: CallTarget::TypeConstructor(ty), callee_name: String::new(), args, filled_defaults: Vec::new() },
                            area2,
                        ));
                    }
                    return Box::new(ExprNode::new(ExprKind::TypeSpecifier(ty), area));
                }
                self.error(format!("expected an expression, found '{}'", self.peek().spelling));
                let area = self.peek().area;
                self.bump();
                Box::new(ExprNode::new(ExprKind::Literal(Literal::Int(0)), area))
            }
        }
    }

    fn save(&self) -> usize {
        self.pos
    }

    fn restore(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }
}

fn can_start_unary_operand(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::BoolLiteral
            | TokenKind::StringLiteral
            | TokenKind::UnaryOp(_)
            | TokenKind::Punct(PunctToken::LParen)
            | TokenKind::BinOp(BinOpToken::Sub)
            | TokenKind::BinOp(BinOpToken::Add)
    )
}

fn assign_op(op: AssignOpToken) -> BinaryOp {
    match op {
        AssignOpToken::Assign => BinaryOp::Assign,
        AssignOpToken::AddAssign => BinaryOp::AddAssign,
        AssignOpToken::SubAssign => BinaryOp::SubAssign,
        AssignOpToken::MulAssign => BinaryOp::MulAssign,
        AssignOpToken::DivAssign => BinaryOp::DivAssign,
        AssignOpToken::ModAssign => BinaryOp::ModAssign,
        AssignOpToken::AndAssign => BinaryOp::AndAssign,
        AssignOpToken::OrAssign => BinaryOp::OrAssign,
        AssignOpToken::XorAssign => BinaryOp::XorAssign,
        AssignOpToken::ShlAssign => BinaryOp::ShlAssign,
        AssignOpToken::ShrAssign => BinaryOp::ShrAssign,
    }
}

/// Binary operator precedence, highest number binds tightest. Logical/bitwise
/// levels follow C's traditional (if questionable) ordering, matched here
/// since HLSL inherits it.
fn binary_op_and_prec(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::BinOp(BinOpToken::LogicalOr) => (BinaryOp::LogicalOr, 1),
        TokenKind::BinOp(BinOpToken::LogicalAnd) => (BinaryOp::LogicalAnd, 2),
        TokenKind::BinOp(BinOpToken::BitOr) => (BinaryOp::BitOr, 3),
        TokenKind::BinOp(BinOpToken::BitXor) => (BinaryOp::BitXor, 4),
        TokenKind::BinOp(BinOpToken::BitAnd) => (BinaryOp::BitAnd, 5),
        TokenKind::BinOp(BinOpToken::Eq) => (BinaryOp::Eq, 6),
        TokenKind::BinOp(BinOpToken::Ne) => (BinaryOp::Ne, 6),
        TokenKind::BinOp(BinOpToken::Lt) => (BinaryOp::Lt, 7),
        TokenKind::BinOp(BinOpToken::Le) => (BinaryOp::Le, 7),
        TokenKind::BinOp(BinOpToken::Gt) => (BinaryOp::Gt, 7),
        TokenKind::BinOp(BinOpToken::Ge) => (BinaryOp::Ge, 7),
        TokenKind::BinOp(BinOpToken::Shl) => (BinaryOp::Shl, 8),
        TokenKind::BinOp(BinOpToken::Shr) => (BinaryOp::Shr, 8),
        TokenKind::BinOp(BinOpToken::Add) => (BinaryOp::Add, 9),
        TokenKind::BinOp(BinOpToken::Sub) => (BinaryOp::Sub, 9),
        TokenKind::BinOp(BinOpToken::Mul) => (BinaryOp::Mul, 10),
        TokenKind::BinOp(BinOpToken::Div) => (BinaryOp::Div, 10),
        TokenKind::BinOp(BinOpToken::Mod) => (BinaryOp::Mod, 10),
        _ => return None,
    })
}

fn parse_int_spelling(spelling: &str) -> i64 {
    let trimmed = spelling.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        trimmed.parse().unwrap_or(0)
    }
}

fn trim_quotes(spelling: &str) -> String {
    spelling.trim_matches('"').to_string()
}
