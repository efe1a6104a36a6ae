//! Intrinsic call emission (spec §4.8 "Intrinsics"): either inlined through a
//! direct HLSL->GLSL name/shape translation, or realized once per concrete
//! signature as a generated wrapper function and called by name thereafter.
use crate::ast::expr::Expr;
use crate::ast::ty::{ScalarType, TypeDenoter};
use crate::codegen::types::map_type_reporting;
use crate::codegen::Generator;
use crate::intrinsics::IntrinsicId;

impl Generator<'_> {
    pub(super) fn emit_intrinsic_call(&mut self, id: IntrinsicId, name: &str, args: &[Expr]) -> String {
        if needs_wrapper(name) {
            let arg_types: Vec<TypeDenoter> = args.iter().map(|a| a.cached_type.clone().unwrap_or(TypeDenoter::Void)).collect();
            let wrapper = self.wrapper_function_name(id, name, &arg_types);
            let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
            return format!("{}({})", wrapper, rendered.join(", "));
        }

        let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
        match name {
            "saturate" => format!("clamp({}, 0.0, 1.0)", rendered[0]),
            "mul" => format!("({} * {})", rendered[0], rendered[1]),
            "mad" => format!("({} * {} + {})", rendered[0], rendered[1], rendered[2]),
            "fmod" => format!("({} - {} * trunc({} / {}))", rendered[0], rendered[1], rendered[0], rendered[1]),
            "asfloat" => format!("{}({})", bit_cast_target(args, "float"), rendered[0]),
            "asuint" => format!("{}({})", bit_cast_target(args, "uint"), rendered[0]),
            "asint" => format!("{}({})", bit_cast_target(args, "int"), rendered[0]),
            _ => format!("{}({})", rename(name), rendered.join(", ")),
        }
    }

    /// Emits (and memoizes) the wrapper function for one concrete signature
    /// of an output-parameter intrinsic, returning its generated name.
    fn wrapper_function_name(&mut self, id: IntrinsicId, name: &str, arg_types: &[TypeDenoter]) -> String {
        let glsl_types: Vec<String> = arg_types.iter().map(|t| map_type_reporting(self.program, t, self.diagnostics)).collect();
        let key = (id, glsl_types.join(","));
        if let Some(existing) = self.wrapper_names.get(&key) {
            return existing.clone();
        }
        let ordinal = self.wrapper_names.len();
        let fn_name = format!("{}{}_{}", self.name_mangling.temporary_prefix, name, ordinal);
        self.wrapper_names.insert(key, fn_name.clone());

        let body = match name {
            "sincos" => "    p1 = sin(p0);\n    p2 = cos(p0);\n".to_string(),
            "InterlockedAdd" => "    p2 = atomicAdd(p0, p1);\n".to_string(),
            _ => String::new(),
        };
        let params: Vec<String> = glsl_types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let is_out = (name == "sincos" && i > 0) || (name == "InterlockedAdd" && i == 2);
                if is_out { format!("out {} p{}", t, i) } else { format!("{} p{}", t, i) }
            })
            .collect();
        self.wrapper_sources.push(format!("void {}({}) {{\n{}}}\n", fn_name, params.join(", "), body));
        fn_name
    }
}

fn needs_wrapper(name: &str) -> bool {
    matches!(name, "sincos" | "InterlockedAdd")
}

/// Direct HLSL->GLSL intrinsic renames with matching arity and argument
/// order; anything absent from this table is assumed to share its HLSL name
/// (true for most of the core math intrinsics: `abs`, `sin`, `min`, `dot`, ...).
fn rename(name: &str) -> &str {
    match name {
        "rsqrt" => "inversesqrt",
        "frac" => "fract",
        "ddx" => "dFdx",
        "ddy" => "dFdy",
        "ddx_fine" => "dFdxFine",
        "ddy_fine" => "dFdyFine",
        "ddx_coarse" => "dFdxCoarse",
        "ddy_coarse" => "dFdyCoarse",
        "atan2" => "atan",
        "lerp" => "mix",
        other => other,
    }
}

/// `asfloat`/`asuint`/`asint` reinterpret bits; GLSL spells the conversion
/// differently depending on the source component type.
fn bit_cast_target(args: &[Expr], want: &str) -> &'static str {
    let source = args[0].cached_type.as_ref().and_then(|t| t.base()).map(|b| b.component());
    match (want, source) {
        ("float", Some(ScalarType::Int)) => "intBitsToFloat",
        ("float", _) => "uintBitsToFloat",
        ("uint", _) => "floatBitsToUint",
        ("int", _) => "floatBitsToInt",
        _ => "float",
    }
}
