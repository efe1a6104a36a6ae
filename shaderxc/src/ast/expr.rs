//! Expression nodes (spec §3 "AST" — *Expressions*).
use crate::ast::ty::TypeDenoter;
use crate::ast::DeclId;
use crate::intrinsics::IntrinsicId;
use crate::position::SourceArea;

#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    LogicalAnd, LogicalOr,
    BitAnd, BitOr, BitXor, Shl, Shr,
    Eq, Ne, Lt, Le, Gt, Ge,
    Assign, AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,
    AndAssign, OrAssign, XorAssign, ShlAssign, ShrAssign,
    Comma,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::AndAssign
                | BinaryOp::OrAssign
                | BinaryOp::XorAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Negate,
    Plus,
    PreInc,
    PreDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostUnaryOp {
    PostInc,
    PostDec,
}

/// The target a function-call expression resolves to, filled in by the
/// analyzer. Unresolved during parsing.
#[derive(Debug, Clone)]
pub enum CallTarget {
    Unresolved,
    Intrinsic(IntrinsicId),
    Function(DeclId),
    /// `float3(...)`/`(int)x`-style type constructor call.
    TypeConstructor(TypeDenoter),
}

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub area: SourceArea,
    /// Cached derived type denoter; populated on first analyzer visit and
    /// invalidated (set back to `None`) by any mutation of `kind`.
    pub cached_type: Option<TypeDenoter>,
}

impl ExprNode {
    pub fn new(kind: ExprKind, area: SourceArea) -> Self {
        Self { kind, area, cached_type: None }
    }

    pub fn invalidate(&mut self) {
        self.cached_type = None;
    }
}

pub type Expr = Box<ExprNode>;

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// Identifier reference, with an accumulated array-index list (for
    /// `a[0][1]`-style chained subscripts folded into the identifier node,
    /// per spec §3) and the resolved declaration once analysis runs.
    Identifier { name: String, indices: Vec<Expr>, resolved: Option<DeclId> },
    Member { base: Expr, member: String, resolved: Option<DeclId> },
    Subscript { base: Expr, index: Expr },
    Call { target: CallTarget, callee_name: String, args: Vec<Expr>, filled_defaults: Vec<Expr> },
    Binary { op: BinaryOp, lhs: Expr, rhs: Expr },
    Unary { op: UnaryOp, operand: Expr },
    PostUnary { op: PostUnaryOp, operand: Expr },
    Ternary { cond: Expr, then_branch: Expr, else_branch: Expr },
    Cast { target: TypeDenoter, operand: Expr },
    /// A parenthesized expression, kept so code generation can decide
    /// whether to re-emit the parens.
    Bracket(Expr),
    InitializerList(Vec<Expr>),
    Sequence(Vec<Expr>),
    /// A bare type name used as an expression, e.g. the callee position of
    /// `float3(1, 2, 3)` before the parser has decided it is a constructor
    /// call rather than a cast.
    TypeSpecifier(TypeDenoter),
}
