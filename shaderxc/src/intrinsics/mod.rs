//! Intrinsic function table (spec §4.6): built-in shader functions with
//! overload sets and output-parameter metadata. Data-driven, following this
//! codebase's established pattern of shipping a JSON table via `include_str!`
//! behind a lazily-built static index.
pub mod pattern;

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::ast::ty::TypeDenoter;
use pattern::{GenericBinding, TypePattern};

/// Stable id of one intrinsic overload row (index into the flat table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntrinsicId(pub u32);

#[derive(Debug, Deserialize)]
struct RawIntrinsic {
    name: String,
    params: Vec<String>,
    #[serde(rename = "return")]
    return_ty: String,
    #[serde(default)]
    output_params: Vec<usize>,
    #[serde(default)]
    min_version: Option<u32>,
    #[serde(default)]
    required_extension: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntrinsicOverload {
    pub name: String,
    pub params: Vec<TypePattern>,
    pub return_ty: TypePattern,
    /// Indices into `params` that are written through rather than read
    /// (spec §4.6 "output-parameter metadata"), e.g. `sincos`'s 2nd/3rd args.
    pub output_params: Vec<usize>,
    pub min_version: Option<u32>,
    pub required_extension: Option<String>,
}

const HLSL_INTRINSICS_JSON: &str = include_str!("data/hlsl-intrinsics.json");

static TABLE: LazyLock<Vec<IntrinsicOverload>> = LazyLock::new(|| {
    let raw: Vec<RawIntrinsic> = serde_json::from_str(HLSL_INTRINSICS_JSON)
        .expect("built-in intrinsic table is not valid JSON");
    raw.into_iter()
        .map(|r| IntrinsicOverload {
            params: r.params.iter().map(|p| TypePattern::parse(p).unwrap_or_else(|| panic!("unknown intrinsic type pattern '{}'", p))).collect(),
            return_ty: TypePattern::parse(&r.return_ty).unwrap_or_else(|| panic!("unknown intrinsic return pattern '{}'", r.return_ty)),
            name: r.name,
            output_params: r.output_params,
            min_version: r.min_version,
            required_extension: r.required_extension,
        })
        .collect()
});

static BY_NAME: LazyLock<HashMap<&'static str, Vec<IntrinsicId>>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, Vec<IntrinsicId>> = HashMap::new();
    for (i, overload) in TABLE.iter().enumerate() {
        let name: &'static str = Box::leak(overload.name.clone().into_boxed_str());
        map.entry(name).or_default().push(IntrinsicId(i as u32));
    }
    map
});

pub fn overload(id: IntrinsicId) -> &'static IntrinsicOverload {
    &TABLE[id.0 as usize]
}

pub fn is_intrinsic_name(name: &str) -> bool {
    BY_NAME.contains_key(name)
}

pub fn overloads_named(name: &str) -> &'static [IntrinsicId] {
    BY_NAME.get(name).map(|v| v.as_slice()).unwrap_or(&[])
}

/// Resolve an intrinsic call by exact-match over its overload set (spec
/// §4.5's overload resolution applies implicit conversions afterward if this
/// returns nothing viable; this function itself only tests pattern match).
pub fn resolve_overload(name: &str, arg_types: &[TypeDenoter]) -> Option<(IntrinsicId, TypeDenoter)> {
    for &id in overloads_named(name) {
        let overload = overload(id);
        if overload.params.len() != arg_types.len() {
            continue;
        }
        let mut binding = GenericBinding::default();
        let all_match = overload.params.iter().zip(arg_types.iter()).all(|(pattern, arg)| pattern.matches(*arg, &mut binding));
        if all_match {
            if let Some(ret) = overload.return_ty.resolve(binding) {
                return Some((id, ret));
            }
            if matches!(overload.return_ty, TypePattern::Void) {
                return Some((id, TypeDenoter::Void));
            }
        }
    }
    None
}

pub fn output_parameter_indices(id: IntrinsicId) -> &'static [usize] {
    &overload(id).output_params
}

pub fn required_version(id: IntrinsicId) -> Option<u32> {
    overload(id).min_version
}

pub fn required_extension(id: IntrinsicId) -> Option<&'static str> {
    overload(id).required_extension.as_deref()
}
