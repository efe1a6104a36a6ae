//! Phase 6 "Reachability" (spec §4.5): transitive closure of call edges
//! from the entry point and optional secondary entry point.
use std::collections::VecDeque;

use crate::ast::decl::Decl;
use crate::ast::expr::{CallTarget, Expr, ExprKind};
use crate::ast::stmt::{Stmt, StmtKind};
use crate::ast::{DeclId, Program};

pub fn mark_reachable(program: &mut Program, entry_points: &[DeclId]) {
    let mut queue: VecDeque<DeclId> = entry_points.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        let already = match program.get(id) {
            Decl::Function(f) => f.reachable,
            _ => continue,
        };
        if already {
            continue;
        }
        if let Decl::Function(f) = program.get_mut(id) {
            f.reachable = true;
        }
        let callees = match program.get(id) {
            Decl::Function(f) => f.body.as_ref().map(|body| callees_of(body)).unwrap_or_default(),
            _ => Vec::new(),
        };
        queue.extend(callees);
    }
}

fn callees_of(body: &[Stmt]) -> Vec<DeclId> {
    let mut out = Vec::new();
    for stmt in body {
        visit_stmt(stmt, &mut out);
    }
    out
}

fn visit_stmt(stmt: &Stmt, out: &mut Vec<DeclId>) {
    match &stmt.kind {
        StmtKind::Null | StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::VarDecl(_) => {}
        StmtKind::Block(stmts) => stmts.iter().for_each(|s| visit_stmt(s, out)),
        StmtKind::Expr(e) => visit_expr(e, out),
        StmtKind::If { cond, then_branch, else_branch } => {
            visit_expr(cond, out);
            visit_stmt(then_branch, out);
            if let Some(e) = else_branch {
                visit_stmt(e, out);
            }
        }
        StmtKind::While { cond, body } => {
            visit_expr(cond, out);
            visit_stmt(body, out);
        }
        StmtKind::DoWhile { body, cond } => {
            visit_stmt(body, out);
            visit_expr(cond, out);
        }
        StmtKind::For { init, cond, update, body } => {
            if let Some(s) = init {
                visit_stmt(s, out);
            }
            if let Some(e) = cond {
                visit_expr(e, out);
            }
            if let Some(e) = update {
                visit_expr(e, out);
            }
            visit_stmt(body, out);
        }
        StmtKind::Switch { selector, cases } => {
            visit_expr(selector, out);
            for case in cases {
                if let Some(v) = &case.value {
                    visit_expr(v, out);
                }
                case.body.iter().for_each(|s| visit_stmt(s, out));
            }
        }
        StmtKind::Return(Some(e)) => visit_expr(e, out),
        StmtKind::Return(None) => {}
    }
}

fn visit_expr(expr: &Expr, out: &mut Vec<DeclId>) {
    match &expr.kind {
        ExprKind::Literal(_) => {}
        ExprKind::Identifier { indices, .. } => indices.iter().for_each(|i| visit_expr(i, out)),
        ExprKind::Member { base, .. } => visit_expr(base, out),
        ExprKind::Subscript { base, index } => {
            visit_expr(base, out);
            visit_expr(index, out);
        }
        ExprKind::Call { target, args, filled_defaults, .. } => {
            if let CallTarget::Function(id) = target {
                out.push(*id);
            }
            args.iter().for_each(|a| visit_expr(a, out));
            filled_defaults.iter().for_each(|a| visit_expr(a, out));
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            visit_expr(lhs, out);
            visit_expr(rhs, out);
        }
        ExprKind::Unary { operand, .. } | ExprKind::PostUnary { operand, .. } | ExprKind::Bracket(operand) => visit_expr(operand, out),
        ExprKind::Ternary { cond, then_branch, else_branch } => {
            visit_expr(cond, out);
            visit_expr(then_branch, out);
            visit_expr(else_branch, out);
        }
        ExprKind::Cast { operand, .. } => visit_expr(operand, out),
        ExprKind::InitializerList(items) | ExprKind::Sequence(items) => items.iter().for_each(|i| visit_expr(i, out)),
        ExprKind::TypeSpecifier(_) => {}
    }
}
