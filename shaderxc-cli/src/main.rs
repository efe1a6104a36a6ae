//! Command-line driver for `shaderxc`: reads one HLSL source file, runs it
//! through the compiler, and writes the generated shader plus any
//! diagnostics to the terminal.
use std::io::Write as _;
use std::path::PathBuf;

use colored::Colorize;
use shaderxc::options::{CodeGenOptions, CompileOutput, CompileRequest};
use shaderxc::reflection::ReflectionData;
use shaderxc::report::{CollectingLogSink, Report, ReportKind};
use shaderxc::shader::{ShaderStage, ShaderTarget, TargetDialect, TargetVersion};
use shaderxc::source::FilesystemIncludeProvider;

fn print_version() {
    println!("shaderxc-cli {}", env!("CARGO_PKG_VERSION"));
}

fn usage() {
    print_version();
    println!();
    println!("Overview: Translates Direct3D-style HLSL shader sources into GLSL/ESSL/VKSL.");
    println!();
    println!("Usage: shaderxc-cli [OPTIONS] <FILE>");
    println!();
    println!("Options:");
    println!("  -E, --entry-point <NAME>    Entry-point function name (default: main)");
    println!("  -S, --stage <STAGE>         vertex, fragment, tesselationcontrol, tesselationevaluation, geometry, compute");
    println!("  -T, --target <DIALECT>      glsl, essl, vksl (default: glsl)");
    println!("      --target-version <N>    Explicit output version instead of auto-detect");
    println!("  -D, --define <NAME[=VALUE]> Predefine a preprocessor macro");
    println!("  -I, --include <DIR>         Add an include search directory");
    println!("  -o, --output <FILE>         Write generated source to FILE instead of stdout");
    println!("      --auto-binding          Assign resource binding slots automatically");
    println!("      --explicit-binding      Force explicit binding layout even without auto-binding");
    println!("      --obfuscate             Replace identifiers with opaque names in the output");
    println!("      --reflect               Print the reflection record after a successful compile");
    println!("  -v, --version               Print version information");
    println!("  -h, --help                  Print this message");
    println!();
    println!("Example:");
    println!("  shaderxc-cli -E VSMain -S vertex -T glsl shader.hlsl");
}

fn parse_target(s: &str) -> Option<TargetDialect> {
    match s.to_lowercase().as_str() {
        "glsl" => Some(TargetDialect::Glsl),
        "essl" | "gles" => Some(TargetDialect::Essl),
        "vksl" | "vulkan" => Some(TargetDialect::Vksl),
        _ => None,
    }
}

fn report_header(report: &Report) -> String {
    let (label, icon) = match report.kind {
        ReportKind::Error => ("error".red().bold(), "✖"),
        ReportKind::Warning => ("warning".yellow().bold(), "⚠"),
        ReportKind::Info => ("info".blue().bold(), "ℹ"),
    };
    match &report.area {
        Some(area) => format!("{} {}: {} ({}:{}:{})", icon, label, report.message, "<source>", area.start.line + 1, area.start.column + 1),
        None => format!("{} {}: {}", icon, label, report.message),
    }
}

fn print_report(report: &Report) {
    println!("{}", report_header(report));
    if let Some(excerpt) = &report.line_excerpt {
        println!("  {}", excerpt);
        if let Some((column, length)) = report.marker {
            let marker = format!("{}{}", " ".repeat(column as usize), "^".repeat(length.max(1) as usize));
            println!("  {}", marker.red());
        }
    }
    for hint in &report.hints {
        println!("  {} {}", "hint:".cyan(), hint);
    }
}

fn print_reflection(data: &ReflectionData) {
    println!("{}", "reflection:".green().bold());
    println!("{:#?}", data);
}

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let _exe = args.next();

    let mut file_name: Option<String> = None;
    let mut entry_point = "main".to_string();
    let mut stage: Option<ShaderStage> = None;
    let mut dialect = TargetDialect::Glsl;
    let mut target_version: Option<u32> = None;
    let mut defines: Vec<(String, String)> = Vec::new();
    let mut includes: Vec<PathBuf> = Vec::new();
    let mut output_path: Option<String> = None;
    let mut codegen = CodeGenOptions::default();
    let mut show_reflection = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-E" | "--entry-point" => match args.next() {
                Some(v) => entry_point = v,
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "-S" | "--stage" => match args.next() {
                Some(v) => match v.parse() {
                    Ok(s) => stage = Some(s),
                    Err(_) => { println!("Unknown shader stage '{}'.", v); return; }
                },
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "-T" | "--target" => match args.next() {
                Some(v) => match parse_target(&v) {
                    Some(d) => dialect = d,
                    None => { println!("Unknown target dialect '{}'.", v); return; }
                },
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "--target-version" => match args.next() {
                Some(v) => match v.parse() {
                    Ok(n) => target_version = Some(n),
                    Err(_) => { println!("Invalid target version '{}'.", v); return; }
                },
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "-D" | "--define" => match args.next() {
                Some(def) => {
                    let mut parts = def.splitn(2, '=');
                    let name = parts.next().unwrap_or_default().to_string();
                    let value = parts.next().unwrap_or("1").to_string();
                    defines.push((name, value));
                }
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "-I" | "--include" => match args.next() {
                Some(dir) => includes.push(PathBuf::from(dir)),
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "-o" | "--output" => match args.next() {
                Some(path) => output_path = Some(path),
                None => { println!("Missing value for {}.", arg); usage(); return; }
            },
            "--auto-binding" => codegen.auto_binding = true,
            "--explicit-binding" => codegen.explicit_binding = true,
            "--obfuscate" => codegen.obfuscate = true,
            "--reflect" => show_reflection = true,
            "-v" | "--version" => { print_version(); return; }
            "-h" | "--help" => { usage(); return; }
            other if file_name.is_none() => file_name = Some(other.to_string()),
            other => { println!("Unexpected argument '{}'.", other); usage(); return; }
        }
    }

    let Some(file_name) = file_name else {
        println!("Missing a filename.");
        usage();
        return;
    };
    let Some(stage) = stage else {
        println!("Missing required {} option.", "--stage".bold());
        usage();
        return;
    };

    let source_text = match std::fs::read_to_string(&file_name) {
        Ok(text) => text,
        Err(err) => {
            println!("{} failed to read '{}': {}", "error:".red().bold(), file_name, err);
            return;
        }
    };

    let mut include_provider = FilesystemIncludeProvider::new(includes);

    let mut request = CompileRequest::new(source_text, stage);
    request.filename_hint = Some(file_name.clone());
    request.entry_point = entry_point;
    request.defines = defines;
    request.include_provider = Some(&mut include_provider);

    let target = ShaderTarget { dialect, version: target_version.map(TargetVersion::Explicit).unwrap_or(TargetVersion::Auto) };

    let mut generated = Vec::new();
    let mut reflection = ReflectionData::default();
    let success = {
        let mut output = CompileOutput::new(&mut generated, target);
        output.codegen = codegen;
        let mut log = CollectingLogSink::new();
        let success = shaderxc::compile(request, &mut output, &mut log, Some(&mut reflection));
        for report in &log.reports {
            print_report(report);
        }
        success
    };

    if !success {
        println!("{}", "compilation failed".red().bold());
        std::process::exit(1);
    }

    match output_path {
        Some(path) => {
            if let Err(err) = std::fs::write(&path, &generated) {
                println!("{} failed to write '{}': {}", "error:".red().bold(), path, err);
                std::process::exit(1);
            }
        }
        None => {
            let _ = std::io::stdout().write_all(&generated);
        }
    }

    if show_reflection {
        print_reflection(&reflection);
    }
}
