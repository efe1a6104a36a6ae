//! End-to-end scenarios driving `compile()` on literal shader strings,
//! one per worked example.
use shaderxc::options::{CompileOutput, CompileRequest};
use shaderxc::reflection::ReflectionData;
use shaderxc::report::{CollectingLogSink, ReportKind};
use shaderxc::shader::{ShaderStage, ShaderTarget, TargetDialect, TargetVersion};

fn compile_str(source: &str, stage: ShaderStage, entry: &str, target: ShaderTarget) -> (bool, String, CollectingLogSink, ReflectionData) {
    let mut request = CompileRequest::new(source, stage);
    request.entry_point = entry.to_string();

    let mut generated = Vec::new();
    let mut reflection = ReflectionData::default();
    let mut log = CollectingLogSink::new();
    let success = {
        let mut output = CompileOutput::new(&mut generated, target);
        shaderxc::compile(request, &mut output, &mut log, Some(&mut reflection))
    };
    (success, String::from_utf8(generated).unwrap(), log, reflection)
}

#[test]
fn simple_vertex() {
    let source = "cbuffer M{float4x4 w;}; float4 VS(float3 p:POSITION):SV_Position{return mul(w,float4(p,1));}";
    let (success, output, log, reflection) = compile_str(source, ShaderStage::Vertex, "VS", ShaderTarget::glsl(330));
    assert!(success, "compile failed: {:?}", log.reports.iter().map(|r| &r.message).collect::<Vec<_>>());

    assert!(output.contains("layout(std140) uniform M"), "{output}");
    assert!(output.contains("mat4 w"), "{output}");
    assert!(output.contains("in vec3 xsv_POSITION"), "{output}");
    assert!(output.contains("gl_Position"), "{output}");
    assert!(output.contains("void main()"), "{output}");
    assert!(output.contains("w * vec4(xsv_POSITION, 1)"), "{output}");

    let cbuffer = reflection.constant_buffers.iter().find(|c| c.name == "M").expect("constant buffer M");
    assert_eq!(cbuffer.size, 64);
    assert_eq!(cbuffer.padding, 0);
    assert!(reflection.input_attributes.iter().any(|a| a.name.eq_ignore_ascii_case("POSITION")));
}

#[test]
fn intrinsic_translation() {
    let source = "float4 PS(float4 x:TEXCOORD0, float4 a:TEXCOORD1, float4 b:TEXCOORD2, float4 c:TEXCOORD3):SV_Target{return saturate(x) + mad(a,b,c);}";
    let (success, output, log, _) = compile_str(source, ShaderStage::Fragment, "PS", ShaderTarget::glsl(330));
    assert!(success, "compile failed: {:?}", log.reports.iter().map(|r| &r.message).collect::<Vec<_>>());
    assert!(output.contains("clamp("), "{output}");
    assert!(output.contains("0.0, 1.0"), "{output}");
    assert!(output.contains(" * ") && output.contains(" + "), "{output}");
}

#[test]
fn cast_disambiguation() {
    let source = "float4 PS(float4 v:TEXCOORD0):SV_Target{float4 a=(float4)v; float4 b=(float4 + v); return a+b;}";
    let (success, _, log, _) = compile_str(source, ShaderStage::Fragment, "PS", ShaderTarget::glsl(330));
    assert!(success, "compile failed: {:?}", log.reports.iter().map(|r| &r.message).collect::<Vec<_>>());
    assert!(!log.has_errors());
}

#[test]
fn overload_ambiguity() {
    let source = "\
        float f(float a, int b) { return a; }\n\
        int f(int a, float b) { return a; }\n\
        float4 PS(float4 v:TEXCOORD0):SV_Target{ float r = f(0,0); return v * r; }\n\
    ";
    let (success, _, log, _) = compile_str(source, ShaderStage::Fragment, "PS", ShaderTarget::glsl(330));
    assert!(!success);
    assert!(log.reports.iter().any(|r| r.kind == ReportKind::Error && r.message.to_lowercase().contains("ambig")));
}

#[test]
fn extension_planning_errors_when_disallowed() {
    let source = "float4 PS(float4 v:TEXCOORD0):SV_Target{return ddx_fine(v);}";
    let mut request = CompileRequest::new(source, ShaderStage::Fragment);
    request.entry_point = "PS".to_string();

    let mut generated = Vec::new();
    let mut log = CollectingLogSink::new();
    let success = {
        let mut output = CompileOutput::new(&mut generated, ShaderTarget::glsl(400));
        output.codegen.allow_extensions = false;
        shaderxc::compile(request, &mut output, &mut log, None)
    };
    assert!(!success);
    assert!(log.reports.iter().any(|r| r.kind == ReportKind::Error
        && r.message.contains("GL_ARB_derivative_control")
        && r.message.contains("450")));
}

#[test]
fn extension_planning_emits_directive_when_allowed() {
    let source = "float4 PS(float4 v:TEXCOORD0):SV_Target{return ddx_fine(v);}";
    let mut request = CompileRequest::new(source, ShaderStage::Fragment);
    request.entry_point = "PS".to_string();

    let mut generated = Vec::new();
    let mut log = CollectingLogSink::new();
    let success = {
        let mut output = CompileOutput::new(&mut generated, ShaderTarget::glsl(400));
        output.codegen.allow_extensions = true;
        shaderxc::compile(request, &mut output, &mut log, None)
    };
    assert!(success, "compile failed: {:?}", log.reports.iter().map(|r| &r.message).collect::<Vec<_>>());
    let output = String::from_utf8(generated).unwrap();
    assert!(output.contains("#extension GL_ARB_derivative_control : enable"), "{output}");
    assert!(output.contains("#version 400"), "{output}");
}

#[test]
fn entry_point_struct_return_flattening() {
    let source = "\
        struct PSOut { float4 c0:SV_Target0; float4 c1:SV_Target1; };\n\
        PSOut PS(float4 v:TEXCOORD0){ PSOut o; o.c0=v; o.c1=v; return o; }\n\
    ";
    let (success, output, log, reflection) = compile_str(source, ShaderStage::Fragment, "PS", ShaderTarget::auto(TargetDialect::Glsl));
    assert!(success, "compile failed: {:?}", log.reports.iter().map(|r| &r.message).collect::<Vec<_>>());
    assert!(output.contains("layout(location = 0) out vec4"), "{output}");
    assert!(output.contains("layout(location = 1) out vec4"), "{output}");
    assert_eq!(reflection.output_attributes.len(), 2);
}
