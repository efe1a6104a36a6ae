//! Statement emission. Each statement is written as one or more complete
//! lines through the generator's sink, indented by the current
//! [`super::indent::IndentHandler`] level.
use crate::ast::decl::Decl;
use crate::ast::stmt::{Stmt, StmtKind};
use crate::codegen::types::map_type_reporting;
use crate::codegen::Generator;

impl Generator<'_> {
    pub(super) fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Null => {}
            StmtKind::Block(body) => self.emit_braced_block(body),
            StmtKind::Expr(e) => self.line(format!("{};", self.emit_expr(e))),
            StmtKind::VarDecl(ids) => {
                for &id in ids {
                    self.emit_local_var_decl(id);
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.line(format!("if ({})", self.emit_expr(cond)));
                self.emit_braced_stmt(then_branch);
                if let Some(e) = else_branch {
                    self.line("else".to_string());
                    self.emit_braced_stmt(e);
                }
            }
            StmtKind::While { cond, body } => {
                self.line(format!("while ({})", self.emit_expr(cond)));
                self.emit_braced_stmt(body);
            }
            StmtKind::DoWhile { body, cond } => {
                self.line("do".to_string());
                self.emit_braced_stmt(body);
                self.line(format!("while ({});", self.emit_expr(cond)));
            }
            StmtKind::For { init, cond, update, body } => {
                let init_str = init.as_deref().map(|s| self.render_for_clause(s)).unwrap_or_default();
                let cond_str = cond.as_ref().map(|e| self.emit_expr(e)).unwrap_or_default();
                let update_str = update.as_ref().map(|e| self.emit_expr(e)).unwrap_or_default();
                self.line(format!("for ({}; {}; {})", init_str, cond_str, update_str));
                self.emit_braced_stmt(body);
            }
            StmtKind::Switch { selector, cases } => {
                self.line(format!("switch ({})", self.emit_expr(selector)));
                self.line("{".to_string());
                self.indent.push();
                for case in cases {
                    match &case.value {
                        Some(v) => self.line(format!("case {}:", self.emit_expr(v))),
                        None => self.line("default:".to_string()),
                    }
                    self.indent.push();
                    for s in &case.body {
                        self.emit_stmt(s);
                    }
                    self.indent.pop();
                }
                self.indent.pop();
                self.line("}".to_string());
            }
            StmtKind::Return(Some(e)) => self.line(format!("return {};", self.emit_expr(e))),
            StmtKind::Return(None) => self.line("return;".to_string()),
            StmtKind::Break => self.line("break;".to_string()),
            StmtKind::Continue => self.line("continue;".to_string()),
            StmtKind::Discard => self.line("discard;".to_string()),
        }
    }

    /// `for` loops parse their init clause as a full statement (declaration
    /// or expression-statement); rendered here without its own indent/braces.
    fn render_for_clause(&mut self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Expr(e) => self.emit_expr(e),
            StmtKind::VarDecl(ids) => ids.iter().map(|&id| self.render_var_decl_fragment(id)).collect::<Vec<_>>().join(", "),
            _ => String::new(),
        }
    }

    fn emit_local_var_decl(&mut self, id: crate::ast::DeclId) {
        let rendered = self.render_var_decl_fragment(id);
        self.line(format!("{};", rendered));
    }

    fn render_var_decl_fragment(&mut self, id: crate::ast::DeclId) -> String {
        let (ty_str, name, init) = match self.program.get(id) {
            Decl::Variable(v) => {
                let ty = map_type_reporting(self.program, &v.ty.denoter, self.diagnostics);
                (ty, self.mangle(id, &v.name), v.initializer.clone())
            }
            _ => return String::new(),
        };
        match init {
            Some(e) => format!("{} {} = {}", ty_str, name, self.emit_expr(&e)),
            None => format!("{} {}", ty_str, name),
        }
    }

    fn emit_braced_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::Block(body) = &stmt.kind {
            self.emit_braced_block(body);
        } else if self.formatting.always_braced_scopes {
            self.emit_braced_block(std::slice::from_ref(stmt));
        } else {
            self.indent.push();
            self.emit_stmt(stmt);
            self.indent.pop();
        }
    }

    pub(super) fn emit_braced_block(&mut self, body: &[Stmt]) {
        if self.formatting.new_line_open_scope {
            self.line("{".to_string());
        } else {
            self.append_to_previous_line(" {");
        }
        self.indent.push();
        for s in body {
            self.emit_stmt(s);
        }
        self.indent.pop();
        self.line("}".to_string());
    }
}
