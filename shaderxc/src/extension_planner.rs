//! Extension planner (spec §4.7): walks the semantically resolved AST and
//! derives the minimum GLSL version plus the set of `#extension` directives
//! the generated shader needs, given the requested target.
use crate::ast::decl::Decl;
use crate::ast::expr::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::ast::stmt::{Stmt, StmtKind};
use crate::ast::ty::{BufferType, TypeDenoter};
use crate::ast::Program;
use crate::intrinsics;
use crate::report::Report;
use crate::shader::{ShaderStage, ShaderTarget, TargetVersion};

/// One requiring construct's cost: the GLSL version it needs natively, and
/// the extension (if any) that buys the same feature below that version.
struct Requirement {
    min_glsl: u32,
    extension: Option<&'static str>,
}

/// Table 4.7a's non-intrinsic rows. `dFdxFine`/64-bit-int/`fma`-double rows
/// come from the intrinsic table itself (spec §4.6's per-overload tag) and
/// are picked up via [`Program::used_intrinsics`] instead of this table.
const ARRAYS_OF_ARRAYS: Requirement = Requirement { min_glsl: 430, extension: Some("GL_ARB_arrays_of_arrays") };
const EXPLICIT_BINDING: Requirement = Requirement { min_glsl: 420, extension: Some("GL_ARB_shading_language_420pack") };
const UNIFORM_BUFFER_OBJECT: Requirement = Requirement { min_glsl: 140, extension: Some("GL_ARB_uniform_buffer_object") };
const BITWISE_OPS: Requirement = Requirement { min_glsl: 130, extension: Some("GL_EXT_gpu_shader4") };
const PACKOFFSET: Requirement = Requirement { min_glsl: 440, extension: Some("GL_ARB_enhanced_layouts") };
const MULTISAMPLE_TEXTURES: Requirement = Requirement { min_glsl: 150, extension: Some("GL_ARB_texture_multisample") };
const IMAGE_LOAD_STORE: Requirement = Requirement { min_glsl: 420, extension: Some("GL_ARB_shader_image_load_store") };

/// The planner's output: the chosen GLSL version and the exact, deduplicated,
/// deterministically ordered set of extension directives to emit (spec §8).
pub struct ExtensionPlan {
    pub version: u32,
    pub extensions: Vec<&'static str>,
}

pub fn plan_extensions(
    program: &Program,
    stage: ShaderStage,
    target: &ShaderTarget,
    allow_extensions: bool,
    diagnostics: &mut Vec<Report>,
) -> ExtensionPlan {
    let floor = stage.minimum_glsl_version();
    let mut requirements = Vec::new();

    for &id in program.used_intrinsics.keys() {
        if let Some(min_glsl) = intrinsics::required_version(id) {
            requirements.push(Requirement { min_glsl, extension: intrinsics::required_extension(id) });
        }
    }
    scan_declarations(program, &mut requirements);
    if uses_bitwise_ops(program) {
        requirements.push(BITWISE_OPS);
    }

    match target.version {
        TargetVersion::Auto => {
            let version = requirements.iter().fold(floor, |v, r| v.max(r.min_glsl));
            ExtensionPlan { version, extensions: Vec::new() }
        }
        TargetVersion::Explicit(configured) => {
            let version = configured.max(floor);
            let mut extensions = Vec::new();
            for req in &requirements {
                if configured >= req.min_glsl {
                    continue;
                }
                match (allow_extensions, req.extension) {
                    (true, Some(ext)) => {
                        if !extensions.contains(&ext) {
                            extensions.push(ext);
                        }
                    }
                    _ => diagnostics.push(Report::error(format_unmet(configured, req))),
                }
            }
            extensions.sort_unstable();
            ExtensionPlan { version, extensions }
        }
    }
}

fn format_unmet(configured: u32, req: &Requirement) -> String {
    match req.extension {
        Some(ext) => format!("target GLSL{} does not support this construct; requires GLSL{} or extension {}", configured, req.min_glsl, ext),
        None => format!("target GLSL{} does not support this construct; requires GLSL{}", configured, req.min_glsl),
    }
}

fn scan_declarations(program: &Program, requirements: &mut Vec<Requirement>) {
    for (_, decl) in program.iter() {
        match decl {
            Decl::Variable(v) | Decl::Buffer(v) | Decl::Sampler(v) => {
                scan_type(&v.ty.denoter, requirements);
                if v.register.is_some() {
                    requirements.push(EXPLICIT_BINDING);
                }
                if v.packoffset.is_some() {
                    requirements.push(PACKOFFSET);
                }
            }
            Decl::UniformBuffer(u) => {
                requirements.push(UNIFORM_BUFFER_OBJECT);
                if u.register.is_some() {
                    requirements.push(EXPLICIT_BINDING);
                }
            }
            Decl::Function(_) | Decl::Structure(_) | Decl::TypeAlias(_) => {}
        }
    }
}

fn scan_type(ty: &TypeDenoter, requirements: &mut Vec<Requirement>) {
    match ty {
        TypeDenoter::Array { dims, element } => {
            if dims.len() > 1 {
                requirements.push(ARRAYS_OF_ARRAYS);
            }
            scan_type(element, requirements);
        }
        TypeDenoter::Buffer { kind, .. } => match kind {
            BufferType::Texture2DMS => requirements.push(MULTISAMPLE_TEXTURES),
            BufferType::RWTexture1D | BufferType::RWTexture2D | BufferType::RWTexture3D | BufferType::RWBuffer | BufferType::RWStructuredBuffer | BufferType::RWByteAddressBuffer => {
                requirements.push(IMAGE_LOAD_STORE)
            }
            _ => {}
        },
        _ => {}
    }
}

fn uses_bitwise_ops(program: &Program) -> bool {
    program.reachable_functions().any(|id| match program.get(id) {
        Decl::Function(f) => f.body.as_deref().is_some_and(stmts_use_bitwise),
        _ => false,
    })
}

fn stmts_use_bitwise(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_uses_bitwise)
}

fn stmt_uses_bitwise(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Null | StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::VarDecl(_) => false,
        StmtKind::Block(body) => stmts_use_bitwise(body),
        StmtKind::Expr(e) => expr_uses_bitwise(e),
        StmtKind::If { cond, then_branch, else_branch } => {
            expr_uses_bitwise(cond) || stmt_uses_bitwise(then_branch) || else_branch.as_deref().is_some_and(stmt_uses_bitwise)
        }
        StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => expr_uses_bitwise(cond) || stmt_uses_bitwise(body),
        StmtKind::For { init, cond, update, body } => {
            init.as_deref().is_some_and(stmt_uses_bitwise)
                || cond.as_deref().is_some_and(expr_uses_bitwise)
                || update.as_deref().is_some_and(expr_uses_bitwise)
                || stmt_uses_bitwise(body)
        }
        StmtKind::Switch { selector, cases } => {
            expr_uses_bitwise(selector)
                || cases.iter().any(|c| c.value.as_deref().is_some_and(expr_uses_bitwise) || stmts_use_bitwise(&c.body))
        }
        StmtKind::Return(Some(e)) => expr_uses_bitwise(e),
        StmtKind::Return(None) => false,
    }
}

fn expr_uses_bitwise(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::TypeSpecifier(_) => false,
        ExprKind::Identifier { indices, .. } => indices.iter().any(expr_uses_bitwise),
        ExprKind::Member { base, .. } | ExprKind::PostUnary { operand: base, .. } | ExprKind::Bracket(base) | ExprKind::Cast { operand: base, .. } => expr_uses_bitwise(base),
        ExprKind::Unary { op, operand } => matches!(op, UnaryOp::BitNot) || expr_uses_bitwise(operand),
        ExprKind::Subscript { base, index } => expr_uses_bitwise(base) || expr_uses_bitwise(index),
        ExprKind::Call { args, filled_defaults, .. } => args.iter().chain(filled_defaults).any(expr_uses_bitwise),
        ExprKind::Binary { op, lhs, rhs } => {
            matches!(
                op,
                BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr | BinaryOp::AndAssign | BinaryOp::OrAssign | BinaryOp::XorAssign | BinaryOp::ShlAssign | BinaryOp::ShrAssign
            ) || expr_uses_bitwise(lhs)
                || expr_uses_bitwise(rhs)
        }
        ExprKind::Ternary { cond, then_branch, else_branch } => expr_uses_bitwise(cond) || expr_uses_bitwise(then_branch) || expr_uses_bitwise(else_branch),
        ExprKind::InitializerList(items) | ExprKind::Sequence(items) => items.iter().any(expr_uses_bitwise),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decl::{Decl, UniformBufferDecl, UniformBufferKind};
    use crate::ast::Program;
    use crate::position::SourceArea;

    #[test]
    fn empty_program_floors_at_the_stage_minimum() {
        let program = Program::new();
        let mut diagnostics = Vec::new();
        let plan = plan_extensions(&program, ShaderStage::Vertex, &ShaderTarget::auto(crate::shader::TargetDialect::Glsl), true, &mut diagnostics);
        assert_eq!(plan.version, ShaderStage::Vertex.minimum_glsl_version());
        assert!(plan.extensions.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn uniform_buffer_below_configured_floor_errors_when_extensions_disallowed() {
        let mut program = Program::new();
        let id = program.push(Decl::UniformBuffer(UniformBufferDecl {
            kind: UniformBufferKind::ConstantBuffer,
            name: "M".to_string(),
            members: Vec::new(),
            register: None,
            area: SourceArea::zero(0),
        }));
        program.top_level.push(id);

        let mut diagnostics = Vec::new();
        let plan = plan_extensions(&program, ShaderStage::Vertex, &ShaderTarget::glsl(130), false, &mut diagnostics);
        assert_eq!(plan.version, 130);
        assert!(plan.extensions.is_empty());
        assert!(diagnostics.iter().any(|r| r.message.contains("GL_ARB_uniform_buffer_object")));
    }

    #[test]
    fn uniform_buffer_below_configured_floor_emits_extension_when_allowed() {
        let mut program = Program::new();
        let id = program.push(Decl::UniformBuffer(UniformBufferDecl {
            kind: UniformBufferKind::ConstantBuffer,
            name: "M".to_string(),
            members: Vec::new(),
            register: None,
            area: SourceArea::zero(0),
        }));
        program.top_level.push(id);

        let mut diagnostics = Vec::new();
        let plan = plan_extensions(&program, ShaderStage::Vertex, &ShaderTarget::glsl(130), true, &mut diagnostics);
        assert_eq!(plan.extensions, vec!["GL_ARB_uniform_buffer_object"]);
        assert!(diagnostics.is_empty());
    }
}
