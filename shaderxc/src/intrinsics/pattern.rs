//! Type patterns used to describe intrinsic parameter/return types, since
//! most HLSL intrinsics are generic over a scalar/vector width (`abs(T) -> T`
//! for any `T` in `{float, int, ...}N`) rather than fixed to one concrete type.
use crate::ast::ty::{BaseType, ScalarType, TypeDenoter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePattern {
    /// Matches any scalar or vector of the given component type, binding its
    /// width to generic slot `0` for later patterns in the same overload.
    GenFloat,
    GenInt,
    GenUInt,
    GenBool,
    /// A fixed, non-generic scalar or vector.
    Fixed(BaseType),
    /// Matches the generic binding established by an earlier `Gen*` pattern
    /// in the same overload (used for same-shape outputs/other arguments).
    SameAsGeneric,
    AnySampler,
    AnyTexture,
    Void,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericBinding {
    pub component: Option<ScalarType>,
    pub width: Option<u8>,
}

impl TypePattern {
    pub fn parse(spelling: &str) -> Option<Self> {
        Some(match spelling {
            "genFloat" => TypePattern::GenFloat,
            "genInt" => TypePattern::GenInt,
            "genUInt" => TypePattern::GenUInt,
            "genBool" => TypePattern::GenBool,
            "sameAsGeneric" => TypePattern::SameAsGeneric,
            "sampler" => TypePattern::AnySampler,
            "texture" => TypePattern::AnyTexture,
            "void" => TypePattern::Void,
            other => TypePattern::Fixed(crate::ast::ty::parse_base_type_name(other)?),
        })
    }

    /// Does `arg` satisfy this pattern, updating/checking `binding` for
    /// generic patterns. Returns false (without mutating `binding`) on a
    /// mismatch with an already-bound generic width.
    pub fn matches(self, arg: &TypeDenoter, binding: &mut GenericBinding) -> bool {
        match self {
            TypePattern::Fixed(expected) => arg.base() == Some(expected),
            TypePattern::Void => arg.is_void(),
            TypePattern::AnySampler => matches!(arg, TypeDenoter::Sampler(_)),
            TypePattern::AnyTexture => matches!(arg, TypeDenoter::Buffer { .. }),
            TypePattern::GenFloat | TypePattern::GenInt | TypePattern::GenUInt | TypePattern::GenBool => {
                let wanted = match self {
                    TypePattern::GenFloat => ScalarType::Float,
                    TypePattern::GenInt => ScalarType::Int,
                    TypePattern::GenUInt => ScalarType::UInt,
                    TypePattern::GenBool => ScalarType::Bool,
                    _ => unreachable!(),
                };
                let Some(base) = arg.base() else { return false };
                if base.component() != wanted {
                    return false;
                }
                let width = vector_width(base);
                match binding.width {
                    Some(existing) if existing != width => false,
                    _ => {
                        binding.component = Some(wanted);
                        binding.width = Some(width);
                        true
                    }
                }
            }
            TypePattern::SameAsGeneric => {
                let Some(base) = arg.base() else { return false };
                let width = vector_width(base);
                binding.width == Some(width)
            }
        }
    }

    /// Resolve this pattern into a concrete type once every parameter has
    /// been matched and `binding` is fully populated.
    pub fn resolve(self, binding: GenericBinding) -> Option<TypeDenoter> {
        match self {
            TypePattern::Fixed(base) => Some(TypeDenoter::Base(base)),
            TypePattern::Void => Some(TypeDenoter::Void),
            TypePattern::GenFloat | TypePattern::GenInt | TypePattern::GenUInt | TypePattern::GenBool | TypePattern::SameAsGeneric => {
                let width = binding.width?;
                let component = binding.component?;
                Some(TypeDenoter::Base(if width == 1 { BaseType::Scalar(component) } else { BaseType::Vector(component, width) }))
            }
            TypePattern::AnySampler | TypePattern::AnyTexture => None,
        }
    }
}

fn vector_width(base: BaseType) -> u8 {
    match base {
        BaseType::Scalar(_) => 1,
        BaseType::Vector(_, n) => n,
        BaseType::Matrix(_, r, c) => r.max(c),
    }
}
