//! Type-denoter model (spec §3 "Type system").
use crate::ast::DeclId;

/// Scalar base types, shared by vector/matrix component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    UInt,
    Half,
    Float,
    Double,
}

/// The built-in HLSL "base" types: scalars plus their vector/matrix forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Scalar(ScalarType),
    /// `floatN`, `intN`, ... where `N` is 1..=4.
    Vector(ScalarType, u8),
    /// `floatRxC`, ... row-major component count notation, 1..=4 each.
    Matrix(ScalarType, u8, u8),
}

impl BaseType {
    pub fn component(self) -> ScalarType {
        match self {
            BaseType::Scalar(s) => s,
            BaseType::Vector(s, _) => s,
            BaseType::Matrix(s, _, _) => s,
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, BaseType::Scalar(_))
    }
}

/// Resource/buffer object types (`Texture2D`, `StructuredBuffer<T>`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferType {
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMS,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    RWTexture1D,
    RWTexture2D,
    RWTexture3D,
    Buffer,
    RWBuffer,
    StructuredBuffer,
    RWStructuredBuffer,
    AppendStructuredBuffer,
    ConsumeStructuredBuffer,
    ByteAddressBuffer,
    RWByteAddressBuffer,
    ConstantBuffer,
    InputPatch,
    OutputPatch,
}

/// Sampler state object types (`SamplerState`, `SamplerComparisonState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerType {
    Sampler,
    SamplerComparison,
}

/// A fully-resolved type denoter. Structures and aliases are referenced by
/// `DeclId` rather than embedded, so the same declaration can be shared by
/// every use site without cloning the structure body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDenoter {
    Void,
    Base(BaseType),
    Buffer { kind: BufferType, element: Option<Box<TypeDenoter>> },
    Sampler(SamplerType),
    Structure(DeclId),
    Array { element: Box<TypeDenoter>, dims: Vec<Option<u32>> },
    Alias(DeclId),
    /// The type of `NULL`, unifiable with any pointer-like buffer/resource type.
    Null,
}

impl TypeDenoter {
    pub fn is_void(&self) -> bool {
        matches!(self, TypeDenoter::Void)
    }

    pub fn base(&self) -> Option<BaseType> {
        match self {
            TypeDenoter::Base(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parses an HLSL base type spelling such as `float3x4` or `uint2`. Returns
/// `None` for anything that is not a built-in scalar/vector/matrix name.
pub fn parse_base_type_name(name: &str) -> Option<BaseType> {
    let (prefix, scalar) = [
        ("bool", ScalarType::Bool),
        ("uint", ScalarType::UInt),
        ("int", ScalarType::Int),
        ("half", ScalarType::Half),
        ("double", ScalarType::Double),
        ("float", ScalarType::Float),
    ]
    .into_iter()
    .find(|(p, _)| name.starts_with(p))?;
    let rest = &name[prefix.len()..];
    if rest.is_empty() {
        return Some(BaseType::Scalar(scalar));
    }
    let mut chars = rest.chars();
    let rows: u8 = chars.next()?.to_digit(10)? as u8;
    if !(1..=4).contains(&rows) {
        return None;
    }
    match chars.next() {
        None => Some(BaseType::Vector(scalar, rows)),
        Some('x') => {
            let cols: u8 = chars.next()?.to_digit(10)? as u8;
            if chars.next().is_some() || !(1..=4).contains(&cols) {
                return None;
            }
            Some(BaseType::Matrix(scalar, rows, cols))
        }
        _ => None,
    }
}
