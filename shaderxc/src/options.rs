//! Compilation request/output surface (spec §6, §4.12): plain
//! struct-of-values, `Default`-derived, no builder macros — "PImpl-like
//! opaque handles in the public surface" (spec §9).
use crate::report::WarningMask;
use crate::shader::{HlslVersion, ShaderStage, ShaderTarget};
use crate::source::IncludeProvider;

/// Everything a caller supplies to describe the input (spec §6 "Input").
pub struct CompileRequest<'a> {
    pub source: String,
    pub filename_hint: Option<String>,
    pub hlsl_version: HlslVersion,
    pub stage: ShaderStage,
    pub entry_point: String,
    /// Secondary entry point pulling in patch-constant functions for
    /// tessellation pipelines (spec §4.5 step 6).
    pub secondary_entry_point: Option<String>,
    pub warnings: WarningMask,
    /// Preprocessor macros predefined before the first line of source is
    /// read, equivalent to a leading `#define NAME VALUE` (spec §4.1).
    pub defines: Vec<(String, String)>,
    pub include_provider: Option<&'a mut dyn IncludeProvider>,
}

impl<'a> CompileRequest<'a> {
    pub fn new(source: impl Into<String>, stage: ShaderStage) -> Self {
        Self {
            source: source.into(),
            filename_hint: None,
            hlsl_version: HlslVersion::default(),
            stage,
            entry_point: "main".to_string(),
            secondary_entry_point: None,
            warnings: WarningMask::default(),
            defines: Vec::new(),
            include_provider: None,
        }
    }
}

/// Formatting options (spec §6 "Formatting options").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingOptions {
    pub indent: String,
    pub blanks: bool,
    pub line_marks: bool,
    pub compact_wrappers: bool,
    pub always_braced_scopes: bool,
    pub new_line_open_scope: bool,
    pub line_separation: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            blanks: true,
            line_marks: false,
            compact_wrappers: false,
            always_braced_scopes: false,
            new_line_open_scope: true,
            line_separation: true,
        }
    }
}

/// Name-mangling configuration (spec §4.5 "Name mangling").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameManglingOptions {
    pub input_prefix: String,
    pub output_prefix: String,
    pub reserved_word_prefix: String,
    pub temporary_prefix: String,
    pub namespace_prefix: String,
    pub use_always_semantics: bool,
    pub rename_buffer_fields: bool,
}

impl Default for NameManglingOptions {
    fn default() -> Self {
        Self {
            input_prefix: "xsv_".to_string(),
            output_prefix: "xsv_".to_string(),
            reserved_word_prefix: "xsr_".to_string(),
            temporary_prefix: "xst_".to_string(),
            namespace_prefix: "xsn_".to_string(),
            use_always_semantics: false,
            rename_buffer_fields: false,
        }
    }
}

impl NameManglingOptions {
    /// spec §4.5: "reserved-word and temporary prefixes must differ from all
    /// others" and user identifiers may never collide with a mangled prefix.
    pub fn is_internally_consistent(&self) -> bool {
        let all = [
            self.input_prefix.as_str(),
            self.output_prefix.as_str(),
            self.reserved_word_prefix.as_str(),
            self.temporary_prefix.as_str(),
            self.namespace_prefix.as_str(),
        ];
        if all.iter().any(|p| p.is_empty()) {
            return false;
        }
        self.reserved_word_prefix != self.temporary_prefix
            && self.reserved_word_prefix != self.input_prefix
            && self.reserved_word_prefix != self.output_prefix
            && self.reserved_word_prefix != self.namespace_prefix
            && self.temporary_prefix != self.input_prefix
            && self.temporary_prefix != self.output_prefix
            && self.temporary_prefix != self.namespace_prefix
    }
}

/// Code-generation options (spec §6 "Code-generation options").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenOptions {
    pub optimize: bool,
    pub preprocess_only: bool,
    pub validate_only: bool,
    pub allow_extensions: bool,
    pub explicit_binding: bool,
    pub auto_binding: bool,
    pub auto_binding_start_slot: u32,
    pub preserve_comments: bool,
    pub prefer_wrappers: bool,
    pub unroll_array_initializers: bool,
    pub row_major_alignment: bool,
    pub obfuscate: bool,
    pub show_ast: bool,
    pub show_times: bool,
    pub separate_samplers: bool,
    pub separate_shaders: bool,
    pub write_generator_header: bool,
}

impl Default for CodeGenOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            preprocess_only: false,
            validate_only: false,
            allow_extensions: true,
            explicit_binding: false,
            auto_binding: false,
            auto_binding_start_slot: 0,
            preserve_comments: false,
            prefer_wrappers: false,
            unroll_array_initializers: false,
            row_major_alignment: false,
            obfuscate: false,
            show_ast: false,
            show_times: false,
            separate_samplers: false,
            separate_shaders: false,
            write_generator_header: true,
        }
    }
}

/// Everything a caller supplies to describe the desired output (spec §6 "Output").
pub struct CompileOutput<'a> {
    pub sink: &'a mut dyn std::io::Write,
    pub target: ShaderTarget,
    /// Explicit `(semantic, location)` overrides for vertex-input attributes.
    pub vertex_semantic_locations: Vec<(String, u32)>,
    pub formatting: FormattingOptions,
    pub name_mangling: NameManglingOptions,
    pub codegen: CodeGenOptions,
}

impl<'a> CompileOutput<'a> {
    pub fn new(sink: &'a mut dyn std::io::Write, target: ShaderTarget) -> Self {
        Self {
            sink,
            target,
            vertex_semantic_locations: Vec::new(),
            formatting: FormattingOptions::default(),
            name_mangling: NameManglingOptions::default(),
            codegen: CodeGenOptions::default(),
        }
    }
}
