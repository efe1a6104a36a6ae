//! Code generator (spec §4.8): walks a semantically analyzed, reachability-
//! pruned [`Program`] and writes GLSL/ESSL/VKSL source through a single sink.
//! Declarations are emitted in the order structures, uniform buffers,
//! resources (textures/samplers/storage buffers), plain globals, entry-point
//! I/O globals, function prototypes, function bodies, synthesized `main`.
mod expr;
mod indent;
mod intrinsics;
mod stmt;
mod types;

use std::collections::HashMap;
use std::io::Write as _;

use crate::analyzer::{AnalysisResult, EntryIoVar, EntryPointPlan, IoDirection};
use crate::ast::decl::{Decl, ParamDirection, RegisterBinding};
use crate::ast::ty::{BufferType, TypeDenoter};
use crate::ast::{DeclId, Program};
use crate::error::CompileError;
use crate::intrinsics::IntrinsicId;
use crate::options::{CodeGenOptions, CompileOutput, FormattingOptions, NameManglingOptions};
use crate::report::Report;
use crate::shader::{ShaderStage, TargetDialect};
use indent::IndentHandler;
use types::{map_type, map_type_reporting, mangled_struct_name};

/// GLSL keywords/built-ins that could otherwise collide with a carried-over
/// HLSL identifier; these get the reserved-word prefix instead of a bare pass
/// through.
const GLSL_RESERVED: &[&str] = &[
    "input", "output", "texture", "sampler", "buffer", "discard", "attribute", "varying", "uniform", "centroid",
    "invariant", "precise", "coherent", "volatile", "restrict", "readonly", "writeonly", "highp", "mediump", "lowp",
    "precision", "flat", "smooth", "noperspective", "layout", "in", "out", "inout", "struct", "switch", "default",
    "const", "return", "break", "continue", "do", "while", "for", "if", "else", "true", "false", "void",
    // The synthesized entry wrapper always occupies `main` itself (spec §4.8
    // "Entry point"); an HLSL entry function of the same name must be renamed.
    "main",
];

fn is_reserved_word(name: &str) -> bool {
    GLSL_RESERVED.contains(&name)
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingCategory {
    Buffer,
    Texture,
    Sampler,
    Image,
}

/// Per-category sequential binding-slot counter for auto-binding (spec §4.8
/// "Binding"). Shared with the reflection extractor so a slot assigned here
/// and a slot reported there never disagree.
pub(crate) struct BindingAllocator {
    buffer: u32,
    texture: u32,
    sampler: u32,
    image: u32,
}

impl BindingAllocator {
    pub(crate) fn new(start: u32) -> Self {
        Self { buffer: start, texture: start, sampler: start, image: start }
    }

    fn next(&mut self, category: BindingCategory) -> u32 {
        let slot = match category {
            BindingCategory::Buffer => &mut self.buffer,
            BindingCategory::Texture => &mut self.texture,
            BindingCategory::Sampler => &mut self.sampler,
            BindingCategory::Image => &mut self.image,
        };
        let n = *slot;
        *slot += 1;
        n
    }
}

/// Binding-slot resolution policy (spec §4.8 "Binding"): an explicit
/// `register()` annotation wins outright; otherwise auto-binding assigns the
/// next sequential slot in the resource's category; otherwise explicit
/// binding mode (with neither a register nor auto-binding) forces slot 0;
/// otherwise no binding is assigned at all.
pub(crate) fn resolve_binding_slot(codegen: &CodeGenOptions, bindings: &mut BindingAllocator, register: &Option<RegisterBinding>, category: BindingCategory) -> Option<u32> {
    if let Some(r) = register {
        return Some(r.slot);
    }
    if codegen.auto_binding {
        return Some(bindings.next(category));
    }
    if codegen.explicit_binding {
        return Some(0);
    }
    None
}

/// Shared emission state threaded through `expr`/`stmt`/`intrinsics`. Output
/// is buffered line-by-line rather than written straight to the sink so that
/// generated intrinsic wrapper functions (only known once their first call
/// site is reached) can still be spliced in ahead of the functions that use
/// them.
pub struct Generator<'a> {
    program: &'a Program,
    diagnostics: &'a mut Vec<Report>,
    formatting: &'a FormattingOptions,
    name_mangling: &'a NameManglingOptions,
    codegen: &'a CodeGenOptions,
    vertex_semantic_locations: &'a [(String, u32)],
    indent: IndentHandler,
    lines: Vec<String>,
    pending: Option<String>,
    wrapper_names: HashMap<(IntrinsicId, String), String>,
    wrapper_sources: Vec<String>,
    mangled_names: HashMap<DeclId, String>,
    obfuscate_counter: u32,
    bindings: BindingAllocator,
}

impl<'a> Generator<'a> {
    fn line(&mut self, text: String) {
        self.flush_pending();
        let prefixed = format!("{}{}", self.indent.prefix(), text);
        self.pending = Some(prefixed);
    }

    fn append_to_previous_line(&mut self, suffix: &str) {
        match &mut self.pending {
            Some(p) => p.push_str(suffix),
            None => {
                if let Some(last) = self.lines.last_mut() {
                    last.push_str(suffix);
                }
            }
        }
    }

    fn blank_line(&mut self) {
        if self.formatting.blanks {
            self.flush_pending();
            self.lines.push(String::new());
        }
    }

    fn flush_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.lines.push(p);
        }
    }

    fn mark(&mut self) -> usize {
        self.flush_pending();
        self.lines.len()
    }

    fn finish(mut self) -> (Vec<String>, Vec<String>) {
        self.flush_pending();
        (self.lines, self.wrapper_sources)
    }

    /// Name-mangling authority for every carried-over identifier (spec §4.5
    /// "Name mangling" / §4.8 "Obfuscation"). Memoized so every reference to
    /// the same declaration gets the same generated name.
    fn mangle(&mut self, id: DeclId, name: &str) -> String {
        if let Some(existing) = self.mangled_names.get(&id) {
            return existing.clone();
        }
        let mangled = if self.codegen.obfuscate {
            let n = self.obfuscate_counter;
            self.obfuscate_counter += 1;
            format!("{}{}", self.name_mangling.namespace_prefix, n)
        } else if is_reserved_word(name) {
            format!("{}{}", self.name_mangling.reserved_word_prefix, name)
        } else {
            name.to_string()
        };
        self.mangled_names.insert(id, mangled.clone());
        mangled
    }

    fn resolve_binding(&mut self, register: &Option<RegisterBinding>, category: BindingCategory) -> Option<u32> {
        resolve_binding_slot(self.codegen, &mut self.bindings, register, category)
    }

    fn emit_header(&mut self, dialect: TargetDialect, ext_plan: &crate::extension_planner::ExtensionPlan) {
        if self.codegen.write_generator_header {
            self.line("// generated by shaderxc".to_string());
        }
        let suffix = match dialect {
            TargetDialect::Glsl => " core",
            TargetDialect::Essl => " es",
            TargetDialect::Vksl => "",
        };
        self.line(format!("#version {}{}", ext_plan.version, suffix));
        for ext in &ext_plan.extensions {
            self.line(format!("#extension {} : enable", ext));
        }
        if let TargetDialect::Essl = dialect {
            self.line("precision highp float;".to_string());
            self.line("precision highp int;".to_string());
        }
        self.blank_line();
    }

    fn emit_structures(&mut self) {
        let ids: Vec<DeclId> = self.program.top_level.iter().copied().filter(|&id| matches!(self.program.get(id), Decl::Structure(_))).collect();
        let any = !ids.is_empty();
        for id in ids {
            self.emit_structure(id);
        }
        if any {
            self.blank_line();
        }
    }

    fn emit_structure(&mut self, id: DeclId) {
        let name = mangled_struct_name(self.program, id);
        self.line(format!("struct {}", name));
        self.line("{".to_string());
        self.indent.push();
        for member_id in flatten_struct_members(self.program, id) {
            if let Decl::Variable(v) = self.program.get(member_id) {
                let ty = map_type_reporting(self.program, &v.ty.denoter, self.diagnostics);
                let member_name = v.name.clone();
                self.line(format!("{} {};", ty, member_name));
            }
        }
        self.indent.pop();
        self.line("};".to_string());
        self.blank_line();
    }

    fn emit_uniform_buffers(&mut self) {
        let ids: Vec<DeclId> = self.program.top_level.iter().copied().filter(|&id| matches!(self.program.get(id), Decl::UniformBuffer(_))).collect();
        for id in ids {
            self.emit_uniform_buffer(id);
        }
    }

    fn emit_uniform_buffer(&mut self, id: DeclId) {
        let (name, members, register) = match self.program.get(id) {
            Decl::UniformBuffer(u) => (u.name.clone(), u.members.clone(), u.register.clone()),
            _ => return,
        };
        let binding = self.resolve_binding(&register, BindingCategory::Buffer);
        match binding {
            Some(n) => self.line(format!("layout(std140, binding = {}) uniform {}", n, name)),
            None => self.line(format!("layout(std140) uniform {}", name)),
        }
        self.line("{".to_string());
        self.indent.push();
        for member_id in members {
            if let Decl::Variable(v) = self.program.get(member_id) {
                let ty = map_type_reporting(self.program, &v.ty.denoter, self.diagnostics);
                let member_name = v.name.clone();
                self.line(format!("{} {};", ty, member_name));
            }
        }
        self.indent.pop();
        self.line("};".to_string());
        self.blank_line();
    }

    fn emit_resources(&mut self) {
        let ids: Vec<DeclId> = self
            .program
            .top_level
            .iter()
            .copied()
            .filter(|&id| matches!(self.program.get(id), Decl::Buffer(_) | Decl::Sampler(_)))
            .collect();
        let any = !ids.is_empty();
        for id in ids {
            self.emit_resource(id);
        }
        if any {
            self.blank_line();
        }
    }

    fn emit_resource(&mut self, id: DeclId) {
        let (name, denoter, register) = match self.program.get(id) {
            Decl::Buffer(v) | Decl::Sampler(v) => (v.name.clone(), v.ty.denoter.clone(), v.register.clone()),
            _ => return,
        };
        if let TypeDenoter::Buffer { kind, element } = &denoter {
            if is_storage_buffer_kind(kind) {
                self.emit_storage_buffer(&name, kind, element, &register);
                return;
            }
        }
        let Ok(ty) = map_type(self.program, &denoter) else {
            // Bare `SamplerState`/`SamplerComparisonState` carry no texel
            // type to combine with; GLSL has no standalone sampler-state
            // object, so these are dropped rather than mis-emitted.
            return;
        };
        let category = match &denoter {
            TypeDenoter::Sampler(_) => BindingCategory::Sampler,
            TypeDenoter::Buffer { kind, .. } if is_image_kind(kind) => BindingCategory::Image,
            _ => BindingCategory::Texture,
        };
        let binding = self.resolve_binding(&register, category);
        match binding {
            Some(n) => self.line(format!("layout(binding = {}) uniform {} {};", n, ty, name)),
            None => self.line(format!("uniform {} {};", ty, name)),
        }
    }

    /// `StructuredBuffer<T>`/`ByteAddressBuffer` and their `RW`/`Append`/
    /// `Consume` variants lower to a bare (anonymous-instance) shader storage
    /// block, same trick as a `cbuffer`: the sole member keeps the original
    /// name so ordinary `name[i]` subscripts need no special-casing.
    fn emit_storage_buffer(&mut self, name: &str, kind: &BufferType, element: &Option<Box<TypeDenoter>>, register: &Option<RegisterBinding>) {
        let elem_ty = element
            .as_deref()
            .map(|t| map_type_reporting(self.program, t, self.diagnostics))
            .unwrap_or_else(|| "uint".to_string());
        let binding = self.resolve_binding(register, BindingCategory::Buffer);
        let readonly = matches!(kind, BufferType::StructuredBuffer | BufferType::ByteAddressBuffer | BufferType::ConsumeStructuredBuffer);
        let qualifier = if readonly { "readonly buffer" } else { "buffer" };
        match binding {
            Some(n) => self.line(format!("layout(binding = {}, std430) {} {}_t", n, qualifier, name)),
            None => self.line(format!("layout(std430) {} {}_t", qualifier, name)),
        }
        self.line("{".to_string());
        self.indent.push();
        self.line(format!("{} {}[];", elem_ty, name));
        self.indent.pop();
        self.line("};".to_string());
        self.blank_line();
    }

    fn emit_globals(&mut self) {
        let ids: Vec<DeclId> = self.program.top_level.iter().copied().filter(|&id| matches!(self.program.get(id), Decl::Variable(_))).collect();
        let any = !ids.is_empty();
        for id in ids {
            self.emit_global(id);
        }
        if any {
            self.blank_line();
        }
    }

    fn emit_global(&mut self, id: DeclId) {
        let (is_uniform, is_const, ty, name, init) = match self.program.get(id) {
            Decl::Variable(v) => (v.ty.storage.is_uniform, v.ty.modifiers.is_const, v.ty.denoter.clone(), v.name.clone(), v.initializer.clone()),
            _ => return,
        };
        let ty_str = map_type_reporting(self.program, &ty, self.diagnostics);
        let qualifier = if is_uniform { "uniform " } else if is_const { "const " } else { "" };
        match init.filter(|_| !is_uniform) {
            Some(e) => {
                let rendered = self.emit_expr(&e);
                self.line(format!("{}{} {} = {};", qualifier, ty_str, name, rendered));
            }
            None => self.line(format!("{}{} {};", qualifier, ty_str, name)),
        }
    }

    fn emit_entry_io_globals(&mut self, plan: &EntryPointPlan) {
        let any = !plan.inputs.is_empty() || !plan.outputs.is_empty();
        for v in plan.inputs.iter().chain(plan.outputs.iter()) {
            if v.builtin.is_some() {
                continue;
            }
            let ty = map_type_reporting(self.program, &v.ty, self.diagnostics);
            let qualifier = match v.direction {
                IoDirection::In => "in",
                IoDirection::Out => "out",
            };
            let name = io_global_name(self.name_mangling, v);
            let location = self
                .vertex_semantic_locations
                .iter()
                .find(|(sem, _)| sem.eq_ignore_ascii_case(&v.semantic))
                .map(|(_, l)| *l)
                .or(v.location);
            match location {
                Some(loc) => self.line(format!("layout(location = {}) {} {} {};", loc, qualifier, ty, name)),
                None => self.line(format!("{} {} {};", qualifier, ty, name)),
            }
        }
        if any {
            self.blank_line();
        }
    }

    fn emit_function_prototypes(&mut self) {
        let ids: Vec<DeclId> = self.program.reachable_functions().collect();
        let mut any = false;
        for id in ids {
            if matches!(self.program.get(id), Decl::Function(f) if f.body.is_some()) {
                let sig = self.function_signature(id);
                self.line(format!("{};", sig));
                any = true;
            }
        }
        if any {
            self.blank_line();
        }
    }

    fn emit_function_bodies(&mut self) {
        let ids: Vec<DeclId> = self.program.reachable_functions().collect();
        for id in ids {
            let body = match self.program.get(id) {
                Decl::Function(f) if f.body.is_some() => f.body.clone().unwrap(),
                _ => continue,
            };
            let sig = self.function_signature(id);
            self.line(sig);
            self.emit_braced_block(&body);
            self.blank_line();
        }
    }

    fn function_signature(&mut self, id: DeclId) -> String {
        // Parameter names go through `self.mangle` keyed by the arena id the
        // analyzer assigned each parameter (`param_decl_ids`), not the bare
        // name, so an obfuscated signature names its parameters identically
        // to how the body's identifier references already resolved them.
        let (fn_name, return_ty, params): (String, TypeDenoter, Vec<(DeclId, String, ParamDirection, TypeDenoter)>) = match self.program.get(id) {
            Decl::Function(f) => (
                f.name.clone(),
                f.return_type.denoter.clone(),
                f.params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (f.param_decl_ids.get(i).copied().unwrap_or(id), p.name.clone(), p.ty.direction, p.ty.denoter.clone()))
                    .collect(),
            ),
            _ => return String::new(),
        };
        let ret = map_type_reporting(self.program, &return_ty, self.diagnostics);
        let name = self.mangle(id, &fn_name);
        let rendered: Vec<String> = params
            .iter()
            .map(|(param_id, pname, dir, ty)| {
                let ty_str = map_type_reporting(self.program, ty, self.diagnostics);
                let mangled = self.mangle(*param_id, pname);
                let dir_str = match dir {
                    ParamDirection::In => "",
                    ParamDirection::Out => "out ",
                    ParamDirection::InOut => "inout ",
                };
                format!("{}{} {}", dir_str, ty_str, mangled)
            })
            .collect();
        format!("{} {}({})", ret, name, rendered.join(", "))
    }

    fn emit_synthesized_main(&mut self, plan: &EntryPointPlan) {
        self.line("void main()".to_string());
        self.line("{".to_string());
        self.indent.push();

        let (fn_name, return_denoter) = match self.program.get(plan.function) {
            Decl::Function(f) => (f.name.clone(), f.return_type.denoter.clone()),
            _ => (String::new(), TypeDenoter::Void),
        };
        let entry_name = self.mangle(plan.function, &fn_name);
        let call_args: Vec<String> = plan.inputs.iter().map(|v| io_global_name(self.name_mangling, v)).collect();
        let call = format!("{}({})", entry_name, call_args.join(", "));

        if plan.outputs.is_empty() {
            self.line(format!("{};", call));
        } else if plan.outputs.len() == 1 && !matches!(return_denoter, TypeDenoter::Structure(_)) {
            let out_name = io_global_name(self.name_mangling, &plan.outputs[0]);
            self.line(format!("{} = {};", out_name, call));
        } else {
            let result_ty = map_type_reporting(self.program, &return_denoter, self.diagnostics);
            self.line(format!("{} xst_result = {};", result_ty, call));
            for v in &plan.outputs {
                let out_name = io_global_name(self.name_mangling, v);
                let field = v.source_name.clone();
                self.line(format!("{} = xst_result.{};", out_name, field));
            }
        }

        self.indent.pop();
        self.line("}".to_string());
    }
}

fn flatten_struct_members(program: &Program, id: DeclId) -> Vec<DeclId> {
    let mut out = Vec::new();
    if let Decl::Structure(s) = program.get(id) {
        if let Some(base) = s.base {
            out.extend(flatten_struct_members(program, base));
        }
        out.extend(s.members.iter().copied());
    }
    out
}

fn is_storage_buffer_kind(kind: &BufferType) -> bool {
    matches!(
        kind,
        BufferType::StructuredBuffer
            | BufferType::RWStructuredBuffer
            | BufferType::AppendStructuredBuffer
            | BufferType::ConsumeStructuredBuffer
            | BufferType::ByteAddressBuffer
            | BufferType::RWByteAddressBuffer
    )
}

fn is_image_kind(kind: &BufferType) -> bool {
    matches!(kind, BufferType::RWTexture1D | BufferType::RWTexture2D | BufferType::RWTexture3D | BufferType::RWBuffer)
}

/// Same generated name an I/O global was declared under; used both by the
/// declaration emitter and by the synthesized `main` that reads/writes it.
fn io_global_name(mangling: &NameManglingOptions, v: &EntryIoVar) -> String {
    match v.builtin {
        Some(b) => b.to_string(),
        None => {
            let prefix = match v.direction {
                IoDirection::In => &mangling.input_prefix,
                IoDirection::Out => &mangling.output_prefix,
            };
            format!("{}{}", prefix, sanitize_semantic(&v.semantic))
        }
    }
}

fn sanitize_semantic(semantic: &str) -> String {
    semantic.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

pub fn generate(
    program: &Program,
    analysis: &AnalysisResult,
    ext_plan: &crate::extension_planner::ExtensionPlan,
    stage: ShaderStage,
    output: &mut CompileOutput,
    diagnostics: &mut Vec<Report>,
) -> Result<(), CompileError> {
    let mut gen = Generator {
        program,
        diagnostics,
        formatting: &output.formatting,
        name_mangling: &output.name_mangling,
        codegen: &output.codegen,
        vertex_semantic_locations: &output.vertex_semantic_locations,
        indent: IndentHandler::new(output.formatting.indent.clone()),
        lines: Vec::new(),
        pending: None,
        wrapper_names: HashMap::new(),
        wrapper_sources: Vec::new(),
        mangled_names: HashMap::new(),
        obfuscate_counter: 0,
        bindings: BindingAllocator::new(output.codegen.auto_binding_start_slot),
    };

    gen.emit_header(output.target.dialect, ext_plan);
    gen.emit_structures();
    gen.emit_uniform_buffers();
    gen.emit_resources();
    gen.emit_globals();

    let function_marker = gen.mark();

    gen.emit_entry_io_globals(&analysis.entry_plan);
    if let Some(secondary) = &analysis.secondary_entry_plan {
        gen.emit_entry_io_globals(secondary);
    }

    if let (ShaderStage::Compute, Decl::Function(f)) = (stage, program.get(analysis.entry_plan.function)) {
        if let Some((x, y, z)) = f.num_threads {
            gen.line(format!("layout(local_size_x = {}, local_size_y = {}, local_size_z = {}) in;", x, y, z));
            gen.blank_line();
        }
    }

    gen.emit_function_prototypes();
    gen.emit_function_bodies();
    gen.emit_synthesized_main(&analysis.entry_plan);

    let (mut lines, wrapper_sources) = gen.finish();
    let wrapper_lines: Vec<String> = wrapper_sources.iter().flat_map(|s| s.lines().map(str::to_string)).collect();
    lines.splice(function_marker..function_marker, wrapper_lines);

    let mut joined = lines.join("\n");
    joined.push('\n');
    output.sink.write_all(joined.as_bytes())?;
    Ok(())
}
