//! Phase 5 "Entry-point transformation" (spec §4.5): HLSL's semantic-tagged
//! parameters/return values become GLSL global `in`/`out` variables plus a
//! synthesized wrapper function that reads inputs, calls the original body,
//! and writes outputs (spec §4.8 "Entry point").
use crate::ast::decl::Decl;
use crate::ast::ty::TypeDenoter;
use crate::ast::{DeclId, Program};
use crate::error::{internal_err, CompileError};
use crate::report::Report;
use crate::shader::ShaderStage;

/// Direction of a lifted global (spec §4.5: parameters become inputs, the
/// return value and any `out` parameters become outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    In,
    Out,
}

/// One semantic-tagged value lifted to a GLSL global.
#[derive(Debug, Clone)]
pub struct EntryIoVar {
    pub semantic: String,
    pub direction: IoDirection,
    pub ty: TypeDenoter,
    /// The built-in GLSL name (`gl_Position`, ...) for system-value
    /// semantics, or `None` for a user semantic (named global instead).
    pub builtin: Option<&'static str>,
    /// Explicit `layout(location=N)` when one applies; absent for built-ins.
    pub location: Option<u32>,
    /// Source-side name: the parameter name, or `struct_field` for a
    /// return-value struct member (spec scenario 6).
    pub source_name: String,
}

/// The analyzer's plan for transforming one entry function; consumed by the
/// code generator to emit globals and the synthesized `main`.
#[derive(Debug, Clone)]
pub struct EntryPointPlan {
    pub function: DeclId,
    pub inputs: Vec<EntryIoVar>,
    pub outputs: Vec<EntryIoVar>,
}

/// Maps an HLSL system-value semantic to its GLSL built-in name, if any.
/// `None` means the semantic is a user semantic and needs a named global.
fn system_value_builtin(semantic: &str, stage: ShaderStage, direction: IoDirection) -> Option<&'static str> {
    let upper = semantic.to_uppercase();
    match (upper.as_str(), stage, direction) {
        ("SV_POSITION", ShaderStage::Vertex, IoDirection::Out) => Some("gl_Position"),
        ("SV_POSITION", ShaderStage::Fragment, IoDirection::In) => Some("gl_FragCoord"),
        ("SV_DEPTH", ShaderStage::Fragment, IoDirection::Out) => Some("gl_FragDepth"),
        ("SV_VERTEXID", ShaderStage::Vertex, IoDirection::In) => Some("gl_VertexID"),
        ("SV_INSTANCEID", ShaderStage::Vertex, IoDirection::In) => Some("gl_InstanceID"),
        ("SV_ISFRONTFACE", ShaderStage::Fragment, IoDirection::In) => Some("gl_FrontFacing"),
        ("SV_DISPATCHTHREADID", ShaderStage::Compute, IoDirection::In) => Some("gl_GlobalInvocationID"),
        ("SV_GROUPID", ShaderStage::Compute, IoDirection::In) => Some("gl_WorkGroupID"),
        ("SV_GROUPTHREADID", ShaderStage::Compute, IoDirection::In) => Some("gl_LocalInvocationID"),
        ("SV_GROUPINDEX", ShaderStage::Compute, IoDirection::In) => Some("gl_LocalInvocationIndex"),
        _ => None,
    }
}

/// `SV_Target3` -> explicit location 3; `SV_Target`/`SV_Target0` -> 0.
fn target_location(semantic: &str) -> Option<u32> {
    let upper = semantic.to_uppercase();
    let suffix = upper.strip_prefix("SV_TARGET")?;
    if suffix.is_empty() {
        Some(0)
    } else {
        suffix.parse().ok()
    }
}

fn lift_one(semantic: &str, ty: &TypeDenoter, direction: IoDirection, stage: ShaderStage, source_name: &str, next_auto_location: &mut u32) -> EntryIoVar {
    if let Some(builtin) = system_value_builtin(semantic, stage, direction) {
        return EntryIoVar { semantic: semantic.to_string(), direction, ty: ty.clone(), builtin: Some(builtin), location: None, source_name: source_name.to_string() };
    }
    let location = target_location(semantic).unwrap_or_else(|| {
        let loc = *next_auto_location;
        *next_auto_location += 1;
        loc
    });
    EntryIoVar { semantic: semantic.to_string(), direction, ty: ty.clone(), builtin: None, location: Some(location), source_name: source_name.to_string() }
}

/// Builds the lift plan for one entry function. Fails only on internal
/// invariant violations (spec §4.11); malformed user semantics surface as
/// `Report`s instead since they are a user-facing diagnosable condition.
pub fn plan_entry_point(program: &Program, entry_id: DeclId, stage: ShaderStage, diagnostics: &mut Vec<Report>) -> Result<EntryPointPlan, CompileError> {
    let f = program
        .get(entry_id)
        .as_function()
        .ok_or_else(|| internal_err!("plan_entry_point", "entry declaration id does not name a function"))?;

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut next_in_location = 0u32;
    let mut next_out_location = 0u32;

    for param in &f.params {
        let Some(semantic) = &param.ty.semantic else {
            diagnostics.push(Report::warning(format!("entry-point parameter '{}' has no semantic and cannot be lifted", param.name)));
            continue;
        };
        inputs.push(lift_one(semantic, &param.ty.denoter, IoDirection::In, stage, &param.name, &mut next_in_location));
    }

    match &f.return_type.denoter {
        TypeDenoter::Structure(struct_id) => {
            flatten_struct_outputs(program, *struct_id, stage, &mut outputs, &mut next_out_location, diagnostics);
        }
        TypeDenoter::Void => {}
        other => {
            let Some(semantic) = &f.return_type.semantic else {
                diagnostics.push(Report::error(format!("entry point '{}' return value has no semantic", f.name)).with_area(f.area));
                return Ok(EntryPointPlan { function: entry_id, inputs, outputs });
            };
            outputs.push(lift_one(semantic, other, IoDirection::Out, stage, "return", &mut next_out_location));
        }
    }

    Ok(EntryPointPlan { function: entry_id, inputs, outputs })
}

/// Scenario 6: a fragment entry returning a struct with multiple
/// `SV_Target` members becomes one `out` global per member.
fn flatten_struct_outputs(
    program: &Program,
    struct_id: DeclId,
    stage: ShaderStage,
    outputs: &mut Vec<EntryIoVar>,
    next_location: &mut u32,
    diagnostics: &mut Vec<Report>,
) {
    let Some(s) = program.get(struct_id).as_structure() else { return };
    if let Some(base) = s.base {
        flatten_struct_outputs(program, base, stage, outputs, next_location, diagnostics);
    }
    for &member_id in &s.members {
        if let Decl::Variable(v) = program.get(member_id) {
            let Some(semantic) = &v.ty.semantic else {
                diagnostics.push(Report::warning(format!("return-struct member '{}' has no semantic and cannot be lifted", v.name)));
                continue;
            };
            outputs.push(lift_one(semantic, &v.ty.denoter, IoDirection::Out, stage, &v.name, next_location));
        }
    }
}
