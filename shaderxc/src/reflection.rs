//! Reflection extractor (spec §4.9): walks the analyzed program a second
//! time, independent of text emission, and reports the binding/attribute/
//! constant-buffer/sampler-state/thread-count record a host application
//! needs without re-parsing the generated shader text.
//!
//! Binding-slot numbers are recomputed here with the exact same allocation
//! policy the code generator uses (`codegen::resolve_binding_slot`), walked
//! in the same declaration order, so a caller's reflection record always
//! matches the `layout(binding=N)` qualifiers actually written to the output.
use crate::analyzer::AnalysisResult;
use crate::ast::decl::{Decl, UniformBufferKind};
use crate::ast::ty::{BaseType, BufferType, SamplerType, ScalarType, TypeDenoter};
use crate::ast::{DeclId, Program};
use crate::codegen::{resolve_binding_slot, BindingAllocator, BindingCategory};
use crate::options::CodeGenOptions;

/// Sampler filter mode (bit-identical to `D3D11_FILTER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    MinMagMipPoint,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinMagLinearMipPoint,
    MinMagMipLinear,
    Anisotropic,
    ComparisonMinMagMipPoint,
    ComparisonMinMagPointMipLinear,
    ComparisonMinPointMagLinearMipPoint,
    ComparisonMinPointMagMipLinear,
    ComparisonMinLinearMagMipPoint,
    ComparisonMinMagLinearMipPoint,
    ComparisonMinMagMipLinear,
    ComparisonAnisotropic,
    Text1Bit,
}

/// Texture address mode (bit-identical to `D3D11_TEXTURE_ADDRESS_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce,
}

/// Sample comparison function (bit-identical to `D3D11_COMPARISON_FUNC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Resource kind as surfaced to a reflection consumer; a subset of the
/// original D3D/GLSL resource taxonomy restricted to the shapes this
/// front-end's AST can actually produce (HLSL keeps texture and sampler
/// objects as separate declarations, so there is no combined `sampler2D`
/// resource kind here the way a GLSL-facing tool would need one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Undefined,
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
    TextureBuffer,
    SamplerState,
    SamplerComparisonState,
}

/// Static sampler state descriptor (`D3D11_SAMPLER_DESC`). Every field and
/// default matches the D3D11 structure so the record can be forwarded to a
/// caller without translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerStateDesc {
    pub filter: Filter,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: u32,
    pub comparison_func: ComparisonFunc,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerStateDesc {
    fn default() -> Self {
        Self {
            filter: Filter::MinMagMipLinear,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 1,
            comparison_func: ComparisonFunc::Never,
            border_color: [0.0; 4],
            min_lod: f32::MIN,
            max_lod: f32::MAX,
        }
    }
}

/// One input/output attribute or loose uniform. `slot` is `None` when no
/// binding location was specified or assigned.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub slot: Option<u32>,
}

/// A texture, sampler, or buffer resource.
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: ResourceType,
    pub name: String,
    pub slot: Option<u32>,
}

/// A `cbuffer`/`tbuffer`, with the Direct3D-packed layout total.
#[derive(Debug, Clone)]
pub struct ConstantBuffer {
    pub kind: ResourceType,
    pub name: String,
    pub slot: Option<u32>,
    /// Total size in bytes, 16-byte aligned.
    pub size: u32,
    /// Trailing padding folded into `size`.
    pub padding: u32,
}

/// A dynamically bound `SamplerState`/`SamplerComparisonState` resource.
#[derive(Debug, Clone)]
pub struct SamplerState {
    pub kind: ResourceType,
    pub name: String,
    pub slot: Option<u32>,
}

/// A `SamplerState` declared with an inline state-block descriptor
/// (`SamplerState s { Filter = ...; };`). This front-end's parser does not
/// recognize the state-block grammar, so this list is always empty; kept in
/// the record for shape-compatibility with a caller expecting it.
#[derive(Debug, Clone)]
pub struct StaticSamplerState {
    pub kind: ResourceType,
    pub name: String,
    pub desc: SamplerStateDesc,
}

/// `numthreads(x, y, z)` for a compute entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumThreads {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// The full reflection record (spec §4.9).
#[derive(Debug, Clone, Default)]
pub struct ReflectionData {
    /// All macro names defined by the end of preprocessing.
    pub macros: Vec<String>,
    pub input_attributes: Vec<Attribute>,
    pub output_attributes: Vec<Attribute>,
    /// Single shader uniforms declared outside any constant buffer.
    pub uniforms: Vec<Attribute>,
    pub resources: Vec<Resource>,
    pub constant_buffers: Vec<ConstantBuffer>,
    pub sampler_states: Vec<SamplerState>,
    pub static_sampler_states: Vec<StaticSamplerState>,
    pub num_threads: Option<NumThreads>,
}

/// One field's placement inside a packed constant buffer.
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

struct StructLayout {
    size: u32,
    padding: u32,
}

fn scalar_size(s: ScalarType) -> u32 {
    match s {
        ScalarType::Double => 8,
        _ => 4,
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}

/// Size in bytes of one field under the Direct3D constant-buffer packing
/// rule (spec §4.9): scalars are 4 bytes (8 for `double`); a vector is its
/// component size times its arity; a matrix is `rows * round_up(component *
/// cols, 16)` (each row occupies its own 16-byte-aligned register); an array
/// element is padded up to 16 bytes per entry; a nested structure recurses.
fn field_size(program: &Program, denoter: &TypeDenoter) -> u32 {
    match denoter {
        TypeDenoter::Base(BaseType::Scalar(s)) => scalar_size(*s),
        TypeDenoter::Base(BaseType::Vector(s, n)) => scalar_size(*s) * u32::from(*n),
        TypeDenoter::Base(BaseType::Matrix(s, rows, cols)) => u32::from(*rows) * round_up(scalar_size(*s) * u32::from(*cols), 16),
        TypeDenoter::Array { element, dims } => {
            let count: u32 = dims.iter().map(|d| d.unwrap_or(1)).product();
            round_up(field_size(program, element), 16) * count
        }
        TypeDenoter::Structure(id) => compute_struct_layout(program, *id).size,
        TypeDenoter::Alias(id) => match program.get(*id) {
            Decl::TypeAlias(t) => field_size(program, &t.aliased),
            _ => 0,
        },
        _ => 0,
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

/// Places each field at the lowest 4-byte aligned offset that does not cross
/// a 16-byte boundary, then rounds the running total up to 16 (spec §4.9).
fn pack_fields(program: &Program, members: impl Iterator<Item = (String, TypeDenoter)>) -> (Vec<FieldLayout>, StructLayout) {
    let mut offset = 0u32;
    let mut fields = Vec::new();
    for (name, ty) in members {
        let size = field_size(program, &ty);
        let mut candidate = round_up(offset, 4);
        if size > 0 && candidate / 16 != (candidate + size - 1) / 16 {
            candidate = round_up(candidate, 16);
        }
        fields.push(FieldLayout { name, offset: candidate, size });
        offset = candidate + size;
    }
    let total = round_up(offset, 16);
    (fields, StructLayout { size: total, padding: total - offset })
}

fn compute_struct_layout(program: &Program, id: DeclId) -> StructLayout {
    let members = flatten_struct_members(program, id).into_iter().filter_map(|mid| match program.get(mid) {
        Decl::Variable(v) => Some((v.name.clone(), v.ty.denoter.clone())),
        _ => None,
    });
    pack_fields(program, members).1
}

/// Per-field offsets for one constant buffer, for a caller that needs
/// byte-level layout rather than just the total size (e.g. a `packoffset`
/// cross-check). Not part of [`ReflectionData`] itself (spec §4.9 lists only
/// the aggregate size/padding), kept as a standalone query.
pub fn constant_buffer_field_layout(program: &Program, members: &[DeclId]) -> Vec<FieldLayout> {
    let iter = members.iter().filter_map(|&mid| match program.get(mid) {
        Decl::Variable(v) => Some((v.name.clone(), v.ty.denoter.clone())),
        _ => None,
    });
    pack_fields(program, iter).0
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

fn classify_buffer(kind: &BufferType) -> ResourceType {
    match kind {
        BufferType::Texture1D => ResourceType::Texture1D,
        BufferType::Texture1DArray => ResourceType::Texture1DArray,
        BufferType::Texture2D => ResourceType::Texture2D,
        BufferType::Texture2DArray => ResourceType::Texture2DArray,
        BufferType::Texture2DMS => ResourceType::Texture2DMS,
        BufferType::Texture3D => ResourceType::Texture3D,
        BufferType::TextureCube => ResourceType::TextureCube,
        BufferType::TextureCubeArray => ResourceType::TextureCubeArray,
        BufferType::RWTexture1D => ResourceType::RWTexture1D,
        BufferType::RWTexture2D => ResourceType::RWTexture2D,
        BufferType::RWTexture3D => ResourceType::RWTexture3D,
        BufferType::Buffer => ResourceType::Buffer,
        BufferType::RWBuffer => ResourceType::RWBuffer,
        BufferType::StructuredBuffer => ResourceType::StructuredBuffer,
        BufferType::RWStructuredBuffer => ResourceType::RWStructuredBuffer,
        BufferType::AppendStructuredBuffer => ResourceType::AppendStructuredBuffer,
        BufferType::ConsumeStructuredBuffer => ResourceType::ConsumeStructuredBuffer,
        BufferType::ByteAddressBuffer => ResourceType::ByteAddressBuffer,
        BufferType::RWByteAddressBuffer => ResourceType::RWByteAddressBuffer,
        BufferType::ConstantBuffer => ResourceType::ConstantBuffer,
        BufferType::InputPatch | BufferType::OutputPatch => ResourceType::Undefined,
    }
}

fn extract_num_threads(program: &Program, function: DeclId) -> Option<NumThreads> {
    match program.get(function) {
        Decl::Function(f) => f.num_threads.map(|(x, y, z)| NumThreads { x, y, z }),
        _ => None,
    }
}

/// Walks the analyzed program and builds the reflection record. Binding
/// slots are allocated with the same policy and declaration order the code
/// generator uses, so `slot` here always agrees with the emitted
/// `layout(binding=N)`.
pub fn extract(program: &Program, analysis: &AnalysisResult, codegen_opts: &CodeGenOptions, macros: Vec<String>) -> ReflectionData {
    let mut data = ReflectionData { macros, ..Default::default() };
    let mut bindings = BindingAllocator::new(codegen_opts.auto_binding_start_slot);

    for &id in &program.top_level {
        let Decl::UniformBuffer(u) = program.get(id) else { continue };
        let slot = resolve_binding_slot(codegen_opts, &mut bindings, &u.register, BindingCategory::Buffer);
        let (_, layout) = pack_fields(
            program,
            u.members.iter().filter_map(|&mid| match program.get(mid) {
                Decl::Variable(v) => Some((v.name.clone(), v.ty.denoter.clone())),
                _ => None,
            }),
        );
        let kind = match u.kind {
            UniformBufferKind::ConstantBuffer => ResourceType::ConstantBuffer,
            UniformBufferKind::TextureBuffer => ResourceType::TextureBuffer,
        };
        data.constant_buffers.push(ConstantBuffer { kind, name: u.name.clone(), slot, size: layout.size, padding: layout.padding });
    }

    for &id in &program.top_level {
        match program.get(id) {
            Decl::Buffer(v) => {
                if let TypeDenoter::Buffer { kind, .. } = &v.ty.denoter {
                    let category = if is_storage_buffer_kind(kind) {
                        BindingCategory::Buffer
                    } else if is_image_kind(kind) {
                        BindingCategory::Image
                    } else {
                        BindingCategory::Texture
                    };
                    let slot = resolve_binding_slot(codegen_opts, &mut bindings, &v.register, category);
                    data.resources.push(Resource { kind: classify_buffer(kind), name: v.name.clone(), slot });
                }
            }
            Decl::Sampler(v) => {
                if let TypeDenoter::Sampler(s) = &v.ty.denoter {
                    let slot = resolve_binding_slot(codegen_opts, &mut bindings, &v.register, BindingCategory::Sampler);
                    let kind = match s {
                        SamplerType::Sampler => ResourceType::SamplerState,
                        SamplerType::SamplerComparison => ResourceType::SamplerComparisonState,
                    };
                    data.sampler_states.push(SamplerState { kind, name: v.name.clone(), slot });
                }
            }
            Decl::Variable(v) if v.ty.storage.is_uniform => {
                data.uniforms.push(Attribute { name: v.name.clone(), slot: v.register.as_ref().map(|r| r.slot) });
            }
            _ => {}
        }
    }

    for plan in std::iter::once(&analysis.entry_plan).chain(analysis.secondary_entry_plan.iter()) {
        for v in plan.inputs.iter().filter(|v| v.builtin.is_none()) {
            data.input_attributes.push(Attribute { name: v.semantic.clone(), slot: v.location });
        }
        for v in plan.outputs.iter().filter(|v| v.builtin.is_none()) {
            data.output_attributes.push(Attribute { name: v.semantic.clone(), slot: v.location });
        }
    }

    data.num_threads = extract_num_threads(program, analysis.entry_plan.function);

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    fn scalar(s: ScalarType) -> TypeDenoter {
        TypeDenoter::Base(BaseType::Scalar(s))
    }

    fn vector(s: ScalarType, n: u8) -> TypeDenoter {
        TypeDenoter::Base(BaseType::Vector(s, n))
    }

    fn matrix(s: ScalarType, rows: u8, cols: u8) -> TypeDenoter {
        TypeDenoter::Base(BaseType::Matrix(s, rows, cols))
    }

    #[test]
    fn lone_mat4_cbuffer_packs_to_64_with_no_padding() {
        let program = Program::new();
        let (fields, layout) = pack_fields(&program, vec![("w".to_string(), matrix(ScalarType::Float, 4, 4))].into_iter());
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[0].size, 64);
        assert_eq!(layout.size, 64);
        assert_eq!(layout.padding, 0);
    }

    #[test]
    fn scalar_after_vec3_is_packed_into_the_same_16_byte_slot() {
        // vec3 occupies bytes [0,12); a trailing scalar fits in [12,16)
        // without crossing a 16-byte boundary, so it is not bumped forward.
        let program = Program::new();
        let members = vec![("a".to_string(), vector(ScalarType::Float, 3)), ("b".to_string(), scalar(ScalarType::Float))];
        let (fields, layout) = pack_fields(&program, members.into_iter());
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[1].offset, 12);
        assert_eq!(layout.size, 16);
        assert_eq!(layout.padding, 0);
    }

    #[test]
    fn scalar_that_would_straddle_a_boundary_is_bumped_to_the_next_one() {
        // vec3 at [0,12) leaves only 4 bytes before the 16-byte boundary;
        // a float2 (8 bytes) placed there would straddle it, so it is
        // pushed to start at offset 16 instead.
        let program = Program::new();
        let members = vec![("a".to_string(), vector(ScalarType::Float, 3)), ("b".to_string(), vector(ScalarType::Float, 2))];
        let (fields, layout) = pack_fields(&program, members.into_iter());
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[1].offset, 16);
        assert_eq!(layout.size, 32);
        assert_eq!(layout.padding, 8);
    }

    #[test]
    fn total_size_is_always_a_multiple_of_16() {
        let program = Program::new();
        let members = vec![("a".to_string(), scalar(ScalarType::Float))];
        let (_, layout) = pack_fields(&program, members.into_iter());
        assert_eq!(layout.size % 16, 0);
    }
}
