//! Phase 7 "Control-flow checks" (spec §4.5): every non-void function must
//! have all control paths terminating in `return`.
use crate::ast::decl::FunctionDecl;
use crate::report::Report;

pub fn check_function(f: &FunctionDecl, diagnostics: &mut Vec<Report>) {
    if f.return_type.denoter.is_void() {
        return;
    }
    let Some(body) = &f.body else { return };
    let exits = body.last().map(|s| s.always_exits()).unwrap_or(false);
    if !exits {
        diagnostics.push(Report::error(format!("not all control paths of '{}' return a value", f.name)).with_area(f.area));
    }
}
