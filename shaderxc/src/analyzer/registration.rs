//! Phase 1 "Registration" (spec §4.5): walk top-level declarations and
//! populate the analyzer's fresh symbol table. The parser's own symbol
//! table (used only for cast-disambiguation lookahead) is gone by the time
//! the analyzer runs, so this rebuilds one the analyzer owns end to end.
use crate::ast::decl::Decl;
use crate::ast::Program;
use crate::report::Report;
use crate::symbol_table::SymbolTable;

pub fn register_top_level(program: &Program, diagnostics: &mut Vec<Report>) -> SymbolTable {
    let mut symbols = SymbolTable::new();
    for &id in &program.top_level {
        match program.get(id) {
            Decl::Structure(s) => {
                symbols.declare_type_name(&s.name);
                symbols.declare(&s.name, id);
                for &member in &s.members {
                    if let Decl::Variable(v) = program.get(member) {
                        if let Some(base) = s.base {
                            if struct_has_member(program, base, &v.name) {
                                diagnostics.push(
                                    Report::warning(format!("member '{}' of '{}' shadows a base-structure member", v.name, s.name)).with_area(v.area),
                                );
                            }
                        }
                    }
                }
            }
            Decl::TypeAlias(t) => {
                symbols.declare_type_name(&t.name);
                symbols.declare(&t.name, id);
            }
            Decl::Function(f) => symbols.declare_function(&f.name, id),
            Decl::Variable(v) | Decl::Buffer(v) | Decl::Sampler(v) => symbols.declare(&v.name, id),
            Decl::UniformBuffer(u) => {
                symbols.declare(&u.name, id);
                for &member in &u.members {
                    if let Decl::Variable(v) = program.get(member) {
                        symbols.declare(&v.name, member);
                    }
                }
            }
        }
    }
    symbols
}

fn struct_has_member(program: &Program, id: crate::ast::DeclId, name: &str) -> bool {
    let Some(s) = program.get(id).as_structure() else { return false };
    let here = s.members.iter().any(|&m| program.get(m).name() == name);
    here || s.base.is_some_and(|base| struct_has_member(program, base, name))
}
