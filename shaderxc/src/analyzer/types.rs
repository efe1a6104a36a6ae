//! Type derivation, implicit conversions, and overload resolution
//! (spec §4.5 phases 2–4).
use crate::ast::decl::Decl;
use crate::ast::expr::{BinaryOp, CallTarget, Expr, ExprKind, Literal};
use crate::ast::ty::{BaseType, ScalarType, TypeDenoter};
use crate::ast::{DeclId, Program};
use crate::intrinsics;
use crate::position::SourceArea;
use crate::report::Report;
use crate::symbol_table::SymbolTable;

/// Ranking of an implicit conversion, best to worst. Used to pick the
/// least-surprising candidate when more than one overload is viable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionRank {
    Exact,
    Promotion,
    Narrowing,
}

fn scalar_rank(from: ScalarType, to: ScalarType) -> Option<ConversionRank> {
    use ScalarType::*;
    if from == to {
        return Some(ConversionRank::Exact);
    }
    // bool <-> int <-> uint <-> half <-> float <-> double are all castable
    // (spec §4.5 step 4); widening the element width is a promotion, the
    // reverse direction a narrowing warning.
    let width = |s: ScalarType| match s {
        Bool => 0,
        Int | UInt => 1,
        Half => 2,
        Float => 3,
        Double => 4,
    };
    Some(if width(to) >= width(from) { ConversionRank::Promotion } else { ConversionRank::Narrowing })
}

/// Whether `from` can be implicitly converted to `to`, and at what rank.
/// Structures are never implicitly convertible (spec §4.5 step 4).
pub fn implicit_conversion(from: &TypeDenoter, to: &TypeDenoter) -> Option<ConversionRank> {
    if from == to {
        return Some(ConversionRank::Exact);
    }
    match (from, to) {
        (TypeDenoter::Base(BaseType::Scalar(fs)), TypeDenoter::Base(BaseType::Scalar(ts))) => scalar_rank(*fs, *ts),
        (TypeDenoter::Base(BaseType::Scalar(fs)), TypeDenoter::Base(BaseType::Vector(ts, _))) => {
            // scalar -> vectorN broadcast
            scalar_rank(*fs, *ts).map(|r| r.max(ConversionRank::Promotion))
        }
        (TypeDenoter::Base(BaseType::Vector(fs, fn_)), TypeDenoter::Base(BaseType::Vector(ts, tn))) if fn_ == tn => scalar_rank(*fs, *ts),
        (TypeDenoter::Base(BaseType::Vector(fs, _)), TypeDenoter::Base(BaseType::Vector(ts, _))) => {
            // dimension truncation/widening is itself a narrowing-class warning
            scalar_rank(*fs, *ts).map(|r| r.max(ConversionRank::Narrowing))
        }
        (TypeDenoter::Base(BaseType::Matrix(fs, fr, fc)), TypeDenoter::Base(BaseType::Matrix(ts, tr, tc))) if fr == tr && fc == tc => scalar_rank(*fs, *ts),
        (TypeDenoter::Null, TypeDenoter::Buffer { .. }) => Some(ConversionRank::Exact),
        _ => None,
    }
}

pub fn is_narrowing(from: &TypeDenoter, to: &TypeDenoter) -> bool {
    implicit_conversion(from, to) == Some(ConversionRank::Narrowing)
}

/// Resolved candidate: the function/intrinsic plus its return type.
pub enum Resolution {
    Function(DeclId, TypeDenoter),
    Intrinsic(intrinsics::IntrinsicId, TypeDenoter),
}

/// Overload resolution shared by user function calls and intrinsic calls
/// (spec §4.5 step 3 / §4.6): exact-match pass first, implicit-conversion
/// pass if the exact pass yields nothing, ambiguity is an error either way.
pub fn resolve_call(
    program: &Program,
    symbols: &SymbolTable,
    callee_name: &str,
    arg_types: &[TypeDenoter],
    area: SourceArea,
) -> Result<Resolution, Report> {
    if intrinsics::is_intrinsic_name(callee_name) && symbols.resolve(callee_name).is_none() {
        return intrinsics::resolve_overload(callee_name, arg_types)
            .map(|(id, ret)| Resolution::Intrinsic(id, ret))
            .ok_or_else(|| {
                Report::error(format!("no matching overload of intrinsic '{}' for the given argument types", callee_name)).with_area(area)
            });
    }

    let Some(candidates) = symbols.resolve(callee_name) else {
        return Err(Report::error(format!("use of undeclared identifier '{}'", callee_name)).with_area(area));
    };
    let functions: Vec<(DeclId, &crate::ast::decl::FunctionDecl)> =
        candidates.iter().filter_map(|&id| program.get(id).as_function().map(|f| (id, f))).collect();
    if functions.is_empty() {
        return Err(Report::error(format!("'{}' is not callable", callee_name)).with_area(area));
    }

    let viable: Vec<_> = functions
        .iter()
        .filter(|(_, f)| {
            let min_required = f.params.iter().take_while(|p| p.default_value.is_none()).count();
            arg_types.len() >= min_required && arg_types.len() <= f.params.len()
        })
        .collect();

    let exact: Vec<_> = viable
        .iter()
        .filter(|(_, f)| {
            arg_types.iter().zip(f.params.iter()).all(|(a, p)| a == &p.ty.denoter)
        })
        .collect();
    if exact.len() > 1 {
        return Err(ambiguity_report(callee_name, area, exact.iter().map(|(_, f)| f)));
    }
    if let Some((id, f)) = exact.first() {
        return Ok(Resolution::Function(*id, f.return_type.denoter.clone()));
    }

    let implicit: Vec<_> = viable
        .iter()
        .filter(|(_, f)| {
            arg_types.iter().zip(f.params.iter()).all(|(a, p)| implicit_conversion(a, &p.ty.denoter).is_some())
        })
        .collect();
    match implicit.len() {
        0 => Err(Report::error(format!("no matching overload of '{}' for the given argument types", callee_name)).with_area(area)),
        1 => {
            let (id, f) = implicit[0];
            Ok(Resolution::Function(*id, f.return_type.denoter.clone()))
        }
        _ => Err(ambiguity_report(callee_name, area, implicit.iter().map(|(_, f)| f))),
    }
}

fn ambiguity_report<'a>(name: &str, area: SourceArea, candidates: impl Iterator<Item = &'a crate::ast::decl::FunctionDecl>) -> Report {
    let mut report = Report::error(format!("call to '{}' is ambiguous", name)).with_area(area);
    for f in candidates {
        let params = f.params.iter().map(|p| format!("{:?}", p.ty.denoter)).collect::<Vec<_>>().join(", ");
        report = report.with_hint(format!("candidate: {}({})", f.name, params));
    }
    report
}

/// Lazily derives and caches the type of `expr` (spec §3 invariant: first
/// query computes and caches, subsequent queries reuse it until the node is
/// mutated and `invalidate()`d).
pub fn derive_type(
    expr: &mut Expr,
    program: &mut Program,
    symbols: &SymbolTable,
    diagnostics: &mut Vec<Report>,
) -> TypeDenoter {
    if let Some(cached) = &expr.cached_type {
        return cached.clone();
    }
    let ty = derive_type_uncached(expr, program, symbols, diagnostics);
    expr.cached_type = Some(ty.clone());
    ty
}

fn derive_type_uncached(
    expr: &mut Expr,
    program: &mut Program,
    symbols: &SymbolTable,
    diagnostics: &mut Vec<Report>,
) -> TypeDenoter {
    let area = expr.area;
    match &mut expr.kind {
        ExprKind::Literal(lit) => literal_type(lit),
        ExprKind::Identifier { name, indices, resolved } => {
            let base = match symbols.resolve(name).and_then(|ids| ids.first().copied()) {
                Some(id) => {
                    *resolved = Some(id);
                    declared_type(program, id)
                }
                None => {
                    diagnostics.push(Report::error(format!("use of undeclared identifier '{}'", name)).with_area(area));
                    TypeDenoter::Void
                }
            };
            let mut ty = base;
            for index in indices.iter_mut() {
                derive_type(index, program, symbols, diagnostics);
                ty = element_type_of(&ty);
            }
            ty
        }
        ExprKind::Member { base, member, .. } => {
            let base_ty = derive_type(base, program, symbols, diagnostics);
            member_type(program, &base_ty, member).unwrap_or_else(|| {
                diagnostics.push(Report::error(format!("no member named '{}' on this type", member)).with_area(area));
                TypeDenoter::Void
            })
        }
        ExprKind::Subscript { base, index } => {
            let base_ty = derive_type(base, program, symbols, diagnostics);
            derive_type(index, program, symbols, diagnostics);
            element_type_of(&base_ty)
        }
        ExprKind::Call { target, callee_name, args, .. } => {
            let arg_types: Vec<TypeDenoter> = args.iter_mut().map(|a| derive_type(a, program, symbols, diagnostics)).collect();
            match resolve_call(program, symbols, callee_name, &arg_types, area) {
                Ok(Resolution::Function(id, ret)) => {
                    *target = CallTarget::Function(id);
                    ret
                }
                Ok(Resolution::Intrinsic(id, ret)) => {
                    *target = CallTarget::Intrinsic(id);
                    program.record_intrinsic_use(id, arg_types);
                    ret
                }
                Err(report) => {
                    diagnostics.push(report);
                    TypeDenoter::Void
                }
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs_ty = derive_type(lhs, program, symbols, diagnostics);
            let rhs_ty = derive_type(rhs, program, symbols, diagnostics);
            binary_result_type(*op, &lhs_ty, &rhs_ty, area, diagnostics)
        }
        ExprKind::Unary { operand, .. } => derive_type(operand, program, symbols, diagnostics),
        ExprKind::PostUnary { operand, .. } => derive_type(operand, program, symbols, diagnostics),
        ExprKind::Ternary { cond, then_branch, else_branch } => {
            derive_type(cond, program, symbols, diagnostics);
            let then_ty = derive_type(then_branch, program, symbols, diagnostics);
            let else_ty = derive_type(else_branch, program, symbols, diagnostics);
            if then_ty == else_ty {
                then_ty
            } else if implicit_conversion(&else_ty, &then_ty).is_some() {
                then_ty
            } else if implicit_conversion(&then_ty, &else_ty).is_some() {
                else_ty
            } else {
                diagnostics.push(Report::error("ternary branches have incompatible types").with_area(area));
                then_ty
            }
        }
        ExprKind::Cast { target, operand } => {
            derive_type(operand, program, symbols, diagnostics);
            target.clone()
        }
        ExprKind::Bracket(inner) => derive_type(inner, program, symbols, diagnostics),
        ExprKind::InitializerList(items) => {
            for item in items.iter_mut() {
                derive_type(item, program, symbols, diagnostics);
            }
            TypeDenoter::Void
        }
        ExprKind::Sequence(items) => {
            let mut ty = TypeDenoter::Void;
            for item in items.iter_mut() {
                ty = derive_type(item, program, symbols, diagnostics);
            }
            ty
        }
        ExprKind::TypeSpecifier(ty) => ty.clone(),
    }
}

fn literal_type(lit: &Literal) -> TypeDenoter {
    match lit {
        Literal::Int(_) => TypeDenoter::Base(BaseType::Scalar(ScalarType::Int)),
        Literal::UInt(_) => TypeDenoter::Base(BaseType::Scalar(ScalarType::UInt)),
        Literal::Float(_) => TypeDenoter::Base(BaseType::Scalar(ScalarType::Float)),
        Literal::Bool(_) => TypeDenoter::Base(BaseType::Scalar(ScalarType::Bool)),
        Literal::String(_) => TypeDenoter::Base(BaseType::Scalar(ScalarType::Float)), // no dedicated string denoter; spec lists `string` as an element data type
        Literal::Null => TypeDenoter::Null,
    }
}

fn declared_type(program: &Program, id: DeclId) -> TypeDenoter {
    match program.get(id) {
        Decl::Variable(v) | Decl::Buffer(v) | Decl::Sampler(v) => v.ty.denoter.clone(),
        Decl::Structure(_) => TypeDenoter::Structure(id),
        Decl::TypeAlias(_) => TypeDenoter::Alias(id),
        Decl::Function(f) => f.return_type.denoter.clone(),
        Decl::UniformBuffer(_) => TypeDenoter::Void,
    }
}

/// Type yielded by indexing into `ty` once (array element, vector component,
/// or matrix row).
fn element_type_of(ty: &TypeDenoter) -> TypeDenoter {
    match ty {
        TypeDenoter::Array { element, dims } => {
            if dims.len() > 1 {
                TypeDenoter::Array { element: element.clone(), dims: dims[1..].to_vec() }
            } else {
                (**element).clone()
            }
        }
        TypeDenoter::Base(BaseType::Vector(s, _)) => TypeDenoter::Base(BaseType::Scalar(*s)),
        TypeDenoter::Base(BaseType::Matrix(s, _, cols)) => TypeDenoter::Base(BaseType::Vector(*s, *cols)),
        other => other.clone(),
    }
}

/// Member-access type derivation: swizzles on vectors, field lookup on
/// structures (walking base-first per spec §3's inheritance invariant).
fn member_type(program: &Program, base_ty: &TypeDenoter, member: &str) -> Option<TypeDenoter> {
    match base_ty {
        TypeDenoter::Base(BaseType::Vector(s, n)) => swizzle_type(*s, *n, member),
        TypeDenoter::Structure(id) => struct_member_type(program, *id, member),
        _ => None,
    }
}

fn swizzle_type(scalar: ScalarType, dim: u8, member: &str) -> Option<TypeDenoter> {
    let valid = |c: char| "xyzw".contains(c) || "rgba".contains(c);
    if member.is_empty() || member.len() > 4 || !member.chars().all(valid) {
        return None;
    }
    let is_positional = member.chars().all(|c| "xyzw".contains(c));
    let is_color = member.chars().all(|c| "rgba".contains(c));
    if !is_positional && !is_color {
        return None; // mixed swizzle (spec §4.8 "mixed swizzles error")
    }
    let index_of = |c: char| "xyzwrgba".find(c).unwrap() % 4;
    if member.chars().any(|c| index_of(c) as u8 >= dim) {
        return None;
    }
    Some(if member.len() == 1 {
        TypeDenoter::Base(BaseType::Scalar(scalar))
    } else {
        TypeDenoter::Base(BaseType::Vector(scalar, member.len() as u8))
    })
}

fn struct_member_type(program: &Program, id: DeclId, member: &str) -> Option<TypeDenoter> {
    let s = program.get(id).as_structure()?;
    if let Some(base) = s.base {
        if let Some(ty) = struct_member_type(program, base, member) {
            return Some(ty);
        }
    }
    s.members.iter().find_map(|&mid| match program.get(mid) {
        Decl::Variable(v) if v.name == member => Some(v.ty.denoter.clone()),
        _ => None,
    })
}

fn binary_result_type(op: BinaryOp, lhs: &TypeDenoter, rhs: &TypeDenoter, area: SourceArea, diagnostics: &mut Vec<Report>) -> TypeDenoter {
    use BinaryOp::*;
    if op.is_assignment() {
        return lhs.clone();
    }
    match op {
        Eq | Ne | Lt | Le | Gt | Ge => match (lhs, rhs) {
            (TypeDenoter::Base(BaseType::Vector(_, n)), _) | (_, TypeDenoter::Base(BaseType::Vector(_, n))) => {
                TypeDenoter::Base(BaseType::Vector(ScalarType::Bool, *n))
            }
            _ => TypeDenoter::Base(BaseType::Scalar(ScalarType::Bool)),
        },
        LogicalAnd | LogicalOr => TypeDenoter::Base(BaseType::Scalar(ScalarType::Bool)),
        Comma => rhs.clone(),
        _ => {
            if lhs == rhs {
                return lhs.clone();
            }
            if implicit_conversion(rhs, lhs).is_some() {
                return lhs.clone();
            }
            if implicit_conversion(lhs, rhs).is_some() {
                return rhs.clone();
            }
            diagnostics.push(Report::error("operands to binary operator have incompatible types").with_area(area));
            lhs.clone()
        }
    }
}
