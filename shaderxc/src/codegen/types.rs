//! Type mapping and swizzle/matrix-subscript translation (spec §4.8
//! "Types"/"Swizzles").
use crate::ast::decl::Decl;
use crate::ast::ty::{BaseType, BufferType, ScalarType, TypeDenoter};
use crate::ast::{DeclId, Program};
use crate::report::Report;

fn scalar_name(s: ScalarType) -> Option<&'static str> {
    Some(match s {
        ScalarType::Bool => "bool",
        ScalarType::Int => "int",
        ScalarType::UInt => "uint",
        ScalarType::Float => "float",
        ScalarType::Double => "double",
        // GLSL has no native half; mapped down to float (spec: unrepresentable
        // combinations error, but a plain half scalar degrades cleanly).
        ScalarType::Half => "float",
    })
}

fn vector_name(s: ScalarType, n: u8) -> Option<String> {
    let prefix = match s {
        ScalarType::Bool => "bvec",
        ScalarType::Int => "ivec",
        ScalarType::UInt => "uvec",
        ScalarType::Float | ScalarType::Half => "vec",
        ScalarType::Double => "dvec",
    };
    (2..=4).contains(&n).then(|| format!("{}{}", prefix, n))
}

fn matrix_name(s: ScalarType, rows: u8, cols: u8) -> Option<String> {
    if !matches!(s, ScalarType::Float | ScalarType::Half | ScalarType::Double) || !(2..=4).contains(&rows) || !(2..=4).contains(&cols) {
        return None;
    }
    let prefix = if matches!(s, ScalarType::Double) { "dmat" } else { "mat" };
    Some(if rows == cols { format!("{}{}", prefix, rows) } else { format!("{}{}x{}", prefix, cols, rows) })
}

fn buffer_sampled_type_name(element: &Option<Box<TypeDenoter>>) -> &'static str {
    match element.as_deref() {
        Some(TypeDenoter::Base(BaseType::Scalar(ScalarType::Int))) | Some(TypeDenoter::Base(BaseType::Vector(ScalarType::Int, _))) => "i",
        Some(TypeDenoter::Base(BaseType::Scalar(ScalarType::UInt))) | Some(TypeDenoter::Base(BaseType::Vector(ScalarType::UInt, _))) => "u",
        _ => "",
    }
}

fn buffer_type_name(kind: &BufferType, element: &Option<Box<TypeDenoter>>) -> Option<String> {
    let p = buffer_sampled_type_name(element);
    Some(match kind {
        BufferType::Texture1D => format!("{}sampler1D", p),
        BufferType::Texture1DArray => format!("{}sampler1DArray", p),
        BufferType::Texture2D => format!("{}sampler2D", p),
        BufferType::Texture2DArray => format!("{}sampler2DArray", p),
        BufferType::Texture2DMS => format!("{}sampler2DMS", p),
        BufferType::Texture3D => format!("{}sampler3D", p),
        BufferType::TextureCube => format!("{}samplerCube", p),
        BufferType::TextureCubeArray => format!("{}samplerCubeArray", p),
        BufferType::RWTexture1D => format!("{}image1D", p),
        BufferType::RWTexture2D => format!("{}image2D", p),
        BufferType::RWTexture3D => format!("{}image3D", p),
        BufferType::Buffer => format!("{}samplerBuffer", p),
        BufferType::RWBuffer => format!("{}imageBuffer", p),
        BufferType::StructuredBuffer | BufferType::RWStructuredBuffer | BufferType::AppendStructuredBuffer | BufferType::ConsumeStructuredBuffer => return None,
        BufferType::ByteAddressBuffer | BufferType::RWByteAddressBuffer => return None,
        BufferType::ConstantBuffer | BufferType::InputPatch | BufferType::OutputPatch => return None,
    })
}

/// Maps a resolved type denoter to its GLSL spelling. `StructuredBuffer<T>`
/// and friends have no `sampler`/`image` spelling — they lower to a uniform
/// block instead and are handled by the declaration emitter directly, not
/// through this expression-position mapping.
pub fn map_type(program: &Program, ty: &TypeDenoter) -> Result<String, String> {
    match ty {
        TypeDenoter::Void => Ok("void".to_string()),
        TypeDenoter::Base(BaseType::Scalar(s)) => scalar_name(*s).map(str::to_string).ok_or_else(|| format!("{:?}", s)),
        TypeDenoter::Base(BaseType::Vector(s, n)) => vector_name(*s, *n).ok_or_else(|| format!("{:?}{}", s, n)),
        TypeDenoter::Base(BaseType::Matrix(s, r, c)) => matrix_name(*s, *r, *c).ok_or_else(|| format!("{:?}{}x{}", s, r, c)),
        TypeDenoter::Sampler(_) => Err("bare sampler state has no GLSL type".to_string()),
        TypeDenoter::Buffer { kind, element } => buffer_type_name(kind, element).ok_or_else(|| format!("{:?}", kind)),
        TypeDenoter::Structure(id) => Ok(mangled_struct_name(program, *id)),
        TypeDenoter::Alias(id) => match program.get(*id) {
            Decl::TypeAlias(t) => map_type(program, &t.aliased.clone()),
            _ => Err("type alias does not resolve to a type".to_string()),
        },
        TypeDenoter::Array { element, .. } => map_type(program, element),
        TypeDenoter::Null => Err("'null' has no GLSL type".to_string()),
    }
}

/// `FailedToMap` (spec §4.8): wraps [`map_type`] for call sites that need a
/// [`Report`] rather than a bare `Result<_, String>`.
pub fn map_type_reporting(program: &Program, ty: &TypeDenoter, diagnostics: &mut Vec<Report>) -> String {
    map_type(program, ty).unwrap_or_else(|reason| {
        diagnostics.push(Report::error(format!("FailedToMap: no GLSL type represents '{}'", reason)));
        "/* unrepresentable */ void".to_string()
    })
}

pub fn mangled_struct_name(program: &Program, id: DeclId) -> String {
    match program.get(id) {
        Decl::Structure(s) => s.name.clone(),
        _ => "struct".to_string(),
    }
}

/// `._mRC` (1-based row/column) -> `[R-1][C-1]`. Returns `None` for anything
/// that isn't a matrix-subscript spelling.
pub fn matrix_subscript_indices(member: &str) -> Option<(u8, u8)> {
    let rest = member.strip_prefix("_m")?;
    let mut chars = rest.chars();
    let row = chars.next()?.to_digit(10)? as u8;
    let col = chars.next()?.to_digit(10)? as u8;
    if chars.next().is_some() || !(1..=4).contains(&row) || !(1..=4).contains(&col) {
        return None;
    }
    Some((row - 1, col - 1))
}
