//! shaderxc: a source-to-source compiler translating a Direct3D-style HLSL
//! dialect into GLSL/ESSL/VKSL (spec §1). [`compile`] runs every stage to
//! completion over one request and returns a bare success flag; diagnostics
//! flow through the caller-supplied [`report::LogSink`], never a panic or
//! process exit (spec §7).
pub mod analyzer;
pub mod ast;
pub mod codegen;
pub mod extension_planner;
pub mod intrinsics;
pub mod options;
pub mod parser;
pub mod position;
pub mod preprocessor;
pub mod reflection;
pub mod report;
pub mod scanner;
pub mod shader;
pub mod source;
pub mod symbol_table;
pub mod token;

mod error;

pub use error::CompileError;

use options::{CompileOutput, CompileRequest};
use reflection::ReflectionData;
use report::{LogSink, Report, ReportKind};
use shader::HlslVersion;
use source::{FilesystemIncludeProvider, SourceManager};

fn has_errors(diagnostics: &[Report]) -> bool {
    diagnostics.iter().any(|r| r.kind == ReportKind::Error)
}

/// Predefined macro the preprocessor can key conditional compilation off,
/// naming the requested input-dialect version (spec §6 "input-dialect version").
fn hlsl_version_macro(version: HlslVersion) -> &'static str {
    match version {
        HlslVersion::Hlsl3 => "SHADER_MODEL_3",
        HlslVersion::Hlsl4 => "SHADER_MODEL_4",
        HlslVersion::Hlsl5 => "SHADER_MODEL_5",
    }
}

/// Runs preprocessor -> scanner -> parser -> analyzer -> extension planner
/// -> code generator -> reflection extractor over one request, in that
/// order (spec §2 dependency chain). Re-entrant: distinct calls touch only
/// their own stack-local state and may run on different threads
/// concurrently (spec §5).
///
/// A stage that records a `Report::Error` stops the pipeline before the
/// next stage runs and the call returns `false`; internal precondition
/// violations and I/O failures propagate immediately as a panic-free
/// `CompileError`-carrying early return instead (surfaced here as an error
/// report, since `compile` itself never returns `Result`).
pub fn compile(request: CompileRequest, output: &mut CompileOutput, log: &mut dyn LogSink, reflection: Option<&mut ReflectionData>) -> bool {
    let mut diagnostics: Vec<Report> = Vec::new();
    let outcome = run_pipeline(request, output, &mut diagnostics, reflection);
    let success = match outcome {
        Ok(ran_to_completion) => ran_to_completion && !has_errors(&diagnostics),
        Err(err) => {
            diagnostics.push(Report::error(err.to_string()));
            false
        }
    };
    for report in diagnostics {
        log.submit(report);
    }
    success
}

fn run_pipeline(mut request: CompileRequest, output: &mut CompileOutput, diagnostics: &mut Vec<Report>, reflection: Option<&mut ReflectionData>) -> Result<bool, CompileError> {
    let mut source = SourceManager::new();
    let source_text = std::mem::take(&mut request.source);
    let file = source.add_file(request.filename_hint.take().unwrap_or_else(|| "<source>".to_string()), source_text);

    let target_macro = hlsl_version_macro(request.hlsl_version);
    let mut preprocessed = match &mut request.include_provider {
        Some(include) => preprocessor::Preprocessor::new(&mut source, &mut **include, &request.defines, target_macro).run(file),
        None => {
            let mut fs = FilesystemIncludeProvider::default();
            preprocessor::Preprocessor::new(&mut source, &mut fs, &request.defines, target_macro).run(file)
        }
    };
    diagnostics.append(&mut preprocessed.diagnostics);
    if has_errors(diagnostics) {
        return Ok(false);
    }

    let (tokens, mut scan_diagnostics) = scanner::scan_all(file, &preprocessed.text);
    diagnostics.append(&mut scan_diagnostics);
    if has_errors(diagnostics) {
        return Ok(false);
    }

    let mut parser = parser::Parser::new(file, &tokens);
    parser.parse_program();
    diagnostics.append(&mut parser.diagnostics);
    if has_errors(diagnostics) {
        return Ok(false);
    }
    let mut program = parser.program;

    let analysis = analyzer::analyze(&mut program, request.stage, &request.entry_point, request.secondary_entry_point.as_deref(), diagnostics)?;
    if has_errors(diagnostics) {
        return Ok(false);
    }

    let ext_plan = extension_planner::plan_extensions(&program, request.stage, &output.target, output.codegen.allow_extensions, diagnostics);
    if has_errors(diagnostics) {
        return Ok(false);
    }

    if output.codegen.validate_only {
        return Ok(true);
    }

    if output.codegen.preprocess_only {
        use std::io::Write as _;
        output.sink.write_all(preprocessed.text.as_bytes())?;
        return Ok(true);
    }

    codegen::generate(&program, &analysis, &ext_plan, request.stage, output, diagnostics)?;
    if has_errors(diagnostics) {
        return Ok(false);
    }

    if let Some(out) = reflection {
        *out = reflection::extract(&program, &analysis, &output.codegen, preprocessed.defined_macro_names);
    }

    Ok(true)
}
