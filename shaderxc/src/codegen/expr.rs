//! Expression emission (spec §4.8 "Swizzles"/"Intrinsics").
use crate::ast::expr::{BinaryOp, CallTarget, Expr, ExprKind, Literal, PostUnaryOp, UnaryOp};
use crate::ast::ty::TypeDenoter;
use crate::codegen::types::{map_type_reporting, matrix_subscript_indices};
use crate::codegen::Generator;
use crate::report::Report;

impl Generator<'_> {
    pub(super) fn emit_expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(lit) => format_literal(lit),
            ExprKind::Identifier { name, indices, resolved } => {
                let base = match resolved {
                    Some(id) => self.mangle(*id, name),
                    None => name.clone(),
                };
                let mut out = base;
                for index in indices {
                    out.push('[');
                    out.push_str(&self.emit_expr(index));
                    out.push(']');
                }
                out
            }
            ExprKind::Member { base, member, .. } => self.emit_member(base, member),
            ExprKind::Subscript { base, index } => format!("{}[{}]", self.emit_expr(base), self.emit_expr(index)),
            ExprKind::Call { target, callee_name, args, .. } => self.emit_call(target, callee_name, args, expr),
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(*op, lhs, rhs),
            ExprKind::Unary { op, operand } => format!("{}{}", unary_spelling(*op), self.emit_expr(operand)),
            ExprKind::PostUnary { op, operand } => format!("{}{}", self.emit_expr(operand), post_unary_spelling(*op)),
            ExprKind::Ternary { cond, then_branch, else_branch } => {
                format!("({} ? {} : {})", self.emit_expr(cond), self.emit_expr(then_branch), self.emit_expr(else_branch))
            }
            ExprKind::Cast { target, operand } => {
                let ty = map_type_reporting(self.program, target, self.diagnostics);
                format!("{}({})", ty, self.emit_expr(operand))
            }
            ExprKind::Bracket(inner) => format!("({})", self.emit_expr(inner)),
            ExprKind::InitializerList(items) => {
                let ty = expr.cached_type.clone().unwrap_or(TypeDenoter::Void);
                let ctor = map_type_reporting(self.program, &ty, self.diagnostics);
                format!("{}({})", ctor, self.emit_args(items))
            }
            ExprKind::Sequence(items) => items.iter().map(|i| self.emit_expr(i)).collect::<Vec<_>>().join(", "),
            ExprKind::TypeSpecifier(ty) => map_type_reporting(self.program, ty, self.diagnostics),
        }
    }

    fn emit_args(&mut self, args: &[Expr]) -> String {
        args.iter().map(|a| self.emit_expr(a)).collect::<Vec<_>>().join(", ")
    }

    /// Matrix-subscript member access (`._m11`) translates to `[row][col]`;
    /// vector swizzles and structure fields both pass through as `.member`.
    fn emit_member(&mut self, base: &Expr, member: &str) -> String {
        match matrix_subscript_indices(member) {
            Some((row, col)) => format!("{}[{}][{}]", self.emit_expr(base), row, col),
            None => format!("{}.{}", self.emit_expr(base), member),
        }
    }

    fn emit_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> String {
        if op == BinaryOp::Comma {
            return format!("({}, {})", self.emit_expr(lhs), self.emit_expr(rhs));
        }
        format!("({} {} {})", self.emit_expr(lhs), binary_spelling(op), self.emit_expr(rhs))
    }

    fn emit_call(&mut self, target: &CallTarget, callee_name: &str, args: &[Expr], expr: &Expr) -> String {
        match target {
            CallTarget::Function(id) => {
                let name = self.mangle(*id, callee_name);
                format!("{}({})", name, self.emit_args(args))
            }
            CallTarget::Intrinsic(id) => self.emit_intrinsic_call(*id, callee_name, args),
            CallTarget::TypeConstructor(ty) => {
                let name = map_type_reporting(self.program, ty, self.diagnostics);
                format!("{}({})", name, self.emit_args(args))
            }
            CallTarget::Unresolved => {
                self.diagnostics.push(Report::error(format!("call to '{}' was never resolved by the analyzer", callee_name)).with_area(expr.area));
                format!("{}({})", callee_name, self.emit_args(args))
            }
        }
    }
}

fn format_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::UInt(v) => format!("{}u", v),
        Literal::Float(v) => format_float(*v),
        Literal::Bool(v) => v.to_string(),
        Literal::String(v) => format!("{:?}", v),
        Literal::Null => "0".to_string(),
    }
}

fn format_float(v: f64) -> String {
    let s = format!("{}", v);
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("nan") {
        s
    } else {
        format!("{}.0", s)
    }
}

fn unary_spelling(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "!",
        UnaryOp::BitNot => "~",
        UnaryOp::Negate => "-",
        UnaryOp::Plus => "+",
        UnaryOp::PreInc => "++",
        UnaryOp::PreDec => "--",
    }
}

fn post_unary_spelling(op: PostUnaryOp) -> &'static str {
    match op {
        PostUnaryOp::PostInc => "++",
        PostUnaryOp::PostDec => "--",
    }
}

fn binary_spelling(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Add => "+", Sub => "-", Mul => "*", Div => "/", Mod => "%",
        LogicalAnd => "&&", LogicalOr => "||",
        BitAnd => "&", BitOr => "|", BitXor => "^", Shl => "<<", Shr => ">>",
        Eq => "==", Ne => "!=", Lt => "<", Le => "<=", Gt => ">", Ge => ">=",
        Assign => "=", AddAssign => "+=", SubAssign => "-=", MulAssign => "*=", DivAssign => "/=", ModAssign => "%=",
        AndAssign => "&=", OrAssign => "|=", XorAssign => "^=", ShlAssign => "<<=", ShrAssign => ">>=",
        Comma => ",",
    }
}
