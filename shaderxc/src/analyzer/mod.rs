//! Semantic analyzer (spec §4.5): registration, type derivation, overload
//! resolution, entry-point transformation, reachability, control-flow
//! checks, run in that order over one already-parsed [`Program`].
mod control_flow;
mod entry_point;
mod reachability;
mod registration;
mod types;

pub use entry_point::{EntryIoVar, EntryPointPlan, IoDirection};

use crate::ast::decl::{Decl, VariableDecl};
use crate::ast::expr::Expr;
use crate::ast::stmt::{Stmt, StmtKind};
use crate::ast::{DeclId, Program};
use crate::error::CompileError;
use crate::report::Report;
use crate::shader::ShaderStage;
use crate::symbol_table::SymbolTable;

pub struct AnalysisResult {
    pub entry_plan: EntryPointPlan,
    pub secondary_entry_plan: Option<EntryPointPlan>,
}

pub fn analyze(
    program: &mut Program,
    stage: ShaderStage,
    entry_point: &str,
    secondary_entry_point: Option<&str>,
    diagnostics: &mut Vec<Report>,
) -> Result<AnalysisResult, CompileError> {
    log::debug!("analyzer: phase 1 (registration)");
    let symbols = registration::register_top_level(program, diagnostics);

    log::debug!("analyzer: phase 2-4 (type derivation, overload resolution)");
    let function_ids: Vec<DeclId> = program.iter().filter_map(|(id, d)| d.as_function().map(|_| id)).collect();
    for id in &function_ids {
        check_function_body(program, &symbols, *id, diagnostics);
    }

    let entry_id = find_entry(program, entry_point)?;
    if let Decl::Function(f) = program.get_mut(entry_id) {
        f.is_entry_point = true;
    }
    let secondary_id = secondary_entry_point.map(|name| find_entry(program, name)).transpose()?;

    log::debug!("analyzer: phase 5 (entry-point transformation)");
    let entry_plan = entry_point::plan_entry_point(program, entry_id, stage, diagnostics)?;
    let secondary_entry_plan =
        secondary_id.map(|id| entry_point::plan_entry_point(program, id, stage, diagnostics)).transpose()?;

    log::debug!("analyzer: phase 6 (reachability)");
    let mut roots = vec![entry_id];
    roots.extend(secondary_id);
    reachability::mark_reachable(program, &roots);

    log::debug!("analyzer: phase 7 (control-flow checks)");
    for id in &function_ids {
        if let Decl::Function(f) = program.get(*id) {
            control_flow::check_function(f, diagnostics);
        }
    }

    Ok(AnalysisResult { entry_plan, secondary_entry_plan })
}

fn find_entry(program: &Program, name: &str) -> Result<DeclId, CompileError> {
    program
        .top_level
        .iter()
        .find(|&&id| matches!(program.get(id), Decl::Function(f) if f.name == name && f.body.is_some()))
        .copied()
        .ok_or_else(|| CompileError::EntryPointNotFound(name.to_string()))
}

/// Opens a function-local scope, gives each parameter its own arena
/// declaration so identifier references inside the body resolve to exactly
/// one declaration like any other name (spec §3 invariant), then walks the
/// body (phases 2-4 interleaved: a local var must be visible to the
/// statements that follow it, C-style).
fn check_function_body(program: &mut Program, global_symbols: &SymbolTable, id: DeclId, diagnostics: &mut Vec<Report>) {
    let params = match program.get(id) {
        Decl::Function(f) if f.body.is_some() => f.params.clone(),
        _ => return,
    };

    let mut symbols = global_symbols.clone();
    symbols.open_scope();
    let mut param_decl_ids = Vec::with_capacity(params.len());
    for param in &params {
        let decl_id = program.push(Decl::Variable(VariableDecl {
            name: param.name.clone(),
            ty: param.ty.clone(),
            initializer: None,
            register: None,
            packoffset: None,
            area: crate::position::SourceArea::zero(0),
        }));
        symbols.declare(param.name.clone(), decl_id);
        param_decl_ids.push(decl_id);
    }
    if let Decl::Function(f) = program.get_mut(id) {
        f.param_decl_ids = param_decl_ids;
    }

    let mut body = match program.get_mut(id) {
        Decl::Function(f) => f.body.take(),
        _ => None,
    };
    if let Some(stmts) = &mut body {
        walk_block(program, &mut symbols, stmts, diagnostics);
    }
    if let Decl::Function(f) = program.get_mut(id) {
        f.body = body;
    }
}

fn walk_block(program: &mut Program, symbols: &mut SymbolTable, stmts: &mut [Stmt], diagnostics: &mut Vec<Report>) {
    for stmt in stmts {
        walk_stmt(program, symbols, stmt, diagnostics);
    }
}

fn walk_stmt(program: &mut Program, symbols: &mut SymbolTable, stmt: &mut Stmt, diagnostics: &mut Vec<Report>) {
    match &mut stmt.kind {
        StmtKind::Null | StmtKind::Break | StmtKind::Continue | StmtKind::Discard => {}
        StmtKind::Block(body) => {
            symbols.open_scope();
            walk_block(program, symbols, body, diagnostics);
            symbols.close_scope();
        }
        StmtKind::Expr(e) => walk_expr(program, symbols, e, diagnostics),
        StmtKind::VarDecl(ids) => {
            for &id in ids.iter() {
                if let Decl::Variable(v) = program.get(id) {
                    symbols.declare(v.name.clone(), id);
                }
                let mut init = match program.get_mut(id) {
                    Decl::Variable(v) => v.initializer.take(),
                    _ => None,
                };
                if let Some(e) = &mut init {
                    walk_expr(program, symbols, e, diagnostics);
                }
                if let Decl::Variable(v) = program.get_mut(id) {
                    v.initializer = init;
                }
            }
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            walk_expr(program, symbols, cond, diagnostics);
            walk_stmt(program, symbols, then_branch, diagnostics);
            if let Some(e) = else_branch {
                walk_stmt(program, symbols, e, diagnostics);
            }
        }
        StmtKind::While { cond, body } => {
            walk_expr(program, symbols, cond, diagnostics);
            walk_stmt(program, symbols, body, diagnostics);
        }
        StmtKind::DoWhile { body, cond } => {
            walk_stmt(program, symbols, body, diagnostics);
            walk_expr(program, symbols, cond, diagnostics);
        }
        StmtKind::For { init, cond, update, body } => {
            symbols.open_scope();
            if let Some(s) = init {
                walk_stmt(program, symbols, s, diagnostics);
            }
            if let Some(e) = cond {
                walk_expr(program, symbols, e, diagnostics);
            }
            if let Some(e) = update {
                walk_expr(program, symbols, e, diagnostics);
            }
            walk_stmt(program, symbols, body, diagnostics);
            symbols.close_scope();
        }
        StmtKind::Switch { selector, cases } => {
            walk_expr(program, symbols, selector, diagnostics);
            for case in cases {
                if let Some(v) = &mut case.value {
                    walk_expr(program, symbols, v, diagnostics);
                }
                symbols.open_scope();
                walk_block(program, symbols, &mut case.body, diagnostics);
                symbols.close_scope();
            }
        }
        StmtKind::Return(Some(e)) => walk_expr(program, symbols, e, diagnostics),
        StmtKind::Return(None) => {}
    }
}

fn walk_expr(program: &mut Program, symbols: &SymbolTable, expr: &mut Expr, diagnostics: &mut Vec<Report>) {
    types::derive_type(expr, program, symbols, diagnostics);
}
