//! Declaration nodes (spec §3 "AST" — *Declarations*).
use crate::ast::expr::Expr;
use crate::ast::stmt::Stmt;
use crate::ast::ty::TypeDenoter;
use crate::ast::DeclId;
use crate::position::SourceArea;

/// `const`/`row_major`/`column_major` and friends (spec §3 "Type specifier").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeModifiers {
    pub is_const: bool,
    pub row_major: bool,
    pub column_major: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageClass {
    pub is_static: bool,
    pub is_extern: bool,
    pub is_uniform: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
}

impl Default for ParamDirection {
    fn default() -> Self {
        ParamDirection::In
    }
}

/// A declared type plus every modifier attached at the declaration site.
#[derive(Debug, Clone)]
pub struct TypeSpecifier {
    pub denoter: TypeDenoter,
    pub modifiers: TypeModifiers,
    pub storage: StorageClass,
    pub interpolation: Option<String>,
    pub direction: ParamDirection,
    /// HLSL semantic, e.g. `SV_Target0`, `POSITION`. `None` for locals.
    pub semantic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub ty: TypeSpecifier,
    pub initializer: Option<Expr>,
    /// `register(bN)` / `register(tN, spaceM)` annotation, if present.
    pub register: Option<RegisterBinding>,
    pub packoffset: Option<(u32, Option<String>)>,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub struct RegisterBinding {
    pub register_class: char, // b, t, s, u, ...
    pub slot: u32,
    pub space: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeSpecifier,
    pub default_value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: TypeSpecifier,
    pub params: Vec<ParamDecl>,
    pub body: Option<Vec<Stmt>>, // None for forward declarations
    /// Filled in by the analyzer once entry-point selection runs.
    pub reachable: bool,
    pub is_entry_point: bool,
    /// `numthreads(x, y, z)` for compute entry points.
    pub num_threads: Option<(u32, u32, u32)>,
    /// Arena ids the analyzer assigned each parameter's own declaration
    /// (spec §3 invariant: every identifier resolves to exactly one
    /// declaration, parameters included). Parallel to `params`; empty until
    /// analysis runs. Lets code generation mangle a parameter's name in the
    /// signature identically to how the body's identifier references resolve it.
    pub param_decl_ids: Vec<DeclId>,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub struct StructureDecl {
    pub name: String,
    pub base: Option<DeclId>,
    pub members: Vec<DeclId>, // VariableDecl ids, declaration order preserved
    pub member_functions: Vec<DeclId>,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub aliased: TypeDenoter,
    pub area: SourceArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformBufferKind {
    ConstantBuffer,
    TextureBuffer,
}

#[derive(Debug, Clone)]
pub struct UniformBufferDecl {
    pub kind: UniformBufferKind,
    pub name: String,
    pub members: Vec<DeclId>,
    pub register: Option<RegisterBinding>,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Variable(VariableDecl),
    Buffer(VariableDecl),
    Sampler(VariableDecl),
    Structure(StructureDecl),
    TypeAlias(TypeAliasDecl),
    Function(FunctionDecl),
    UniformBuffer(UniformBufferDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Variable(v) | Decl::Buffer(v) | Decl::Sampler(v) => &v.name,
            Decl::Structure(s) => &s.name,
            Decl::TypeAlias(t) => &t.name,
            Decl::Function(f) => &f.name,
            Decl::UniformBuffer(u) => &u.name,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match self {
            Decl::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDecl> {
        match self {
            Decl::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&StructureDecl> {
        match self {
            Decl::Structure(s) => Some(s),
            _ => None,
        }
    }
}
