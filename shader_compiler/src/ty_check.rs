//! Typing rules for expressions. Every constructor here returns a typed node even
//! when the rules are violated; the node then has no type, the violation is recorded
//! once, and checks further up stay quiet about it.

use crate::env::Env;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::function::{FuncId, LookupError};
use crate::ident::Ident;
use crate::lhs_check::LhsChecker;
use crate::lit::Lit;
use crate::op::{BinaryOpType, OpCategory, UnaryOpType};
use crate::shaderast::*;
use crate::span::Span;
use crate::swizzle::Swizzle;
use crate::ty::{BaseType, Type};

pub(crate) struct TyChecker<'a> {
    pub(crate) env: &'a Env,
    pub(crate) diagnostics: &'a mut Vec<Diagnostic>,
}

/// Wraps `expr` in an implicit conversion to `ty`, unless it already has that type.
pub(crate) fn convert(expr: Expr, ty: Type) -> Expr {
    if expr.ty == Some(ty) {
        return expr;
    }
    Expr::new(expr.span, Some(ty), ExprKind::Convert { expr: Box::new(expr) })
}

/// Types of `left op right` for a non-assigning operator: the result, and what the
/// left and right operands have to be converted to.
pub(crate) fn bin_types(op: BinaryOpType, left: Type, right: Type) -> Result<(Type, Type, Type), String> {
    let mismatch = || Err(format!("operator `{}` cannot be applied to `{}` and `{}`", op, left, right));
    match op.category() {
        OpCategory::Math => {
            let (left, right) = match promote_pair(left, right) {
                Some(pair) if left.is_numeric() && right.is_numeric() => pair,
                _ => return mismatch(),
            };
            if left.num_fields() == right.num_fields() || left.is_scalar() || right.is_scalar() {
                let result = if left.num_fields() >= right.num_fields() { left } else { right };
                Ok((result, left, right))
            } else {
                mismatch()
            }
        }
        OpCategory::Rel if op.is_logical() => {
            if left == Type::BOOL && right == Type::BOOL {
                Ok((Type::BOOL, left, right))
            } else {
                mismatch()
            }
        }
        OpCategory::Rel => {
            let ordering = !matches!(op, BinaryOpType::Eq | BinaryOpType::Ne);
            if left.is_sampler() || left == Type::VOID || right.is_sampler() || right == Type::VOID {
                return mismatch();
            }
            if ordering && !(left.is_numeric() && right.is_numeric()) {
                return mismatch();
            }
            let (left, right) = match promote_pair(left, right) {
                Some(pair) if pair.0 == pair.1 => pair,
                _ => return mismatch(),
            };
            match left.with_base(BaseType::Bool) {
                Some(result) => Ok((result, left, right)),
                None => mismatch(),
            }
        }
        OpCategory::Bit => {
            let is_int = |ty: Type| ty.base_type() == BaseType::Int;
            if is_int(left) && is_int(right) && (left.num_fields() == right.num_fields() || right.is_scalar()) {
                Ok((left, left, right))
            } else {
                mismatch()
            }
        }
        OpCategory::Assign => mismatch(),
    }
}

/// Promotes the int side of a mixed int/float pair.
fn promote_pair(left: Type, right: Type) -> Option<(Type, Type)> {
    match (left.base_type(), right.base_type()) {
        (BaseType::Int, BaseType::Float) => Some((left.promoted()?, right)),
        (BaseType::Float, BaseType::Int) => Some((left, right.promoted()?)),
        _ => Some((left, right)),
    }
}

impl<'a> TyChecker<'a> {
    fn error(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Option<Type> {
        self.diagnostics.push(Diagnostic::new(kind, span, message));
        None
    }

    /// Converts `expr` to `target` or reports that it cannot be.
    pub(crate) fn convert_to(&mut self, expr: Expr, target: Type, context: &str) -> Expr {
        match expr.ty {
            Some(ty) if ty.converts_to(target) => convert(expr, target),
            Some(ty) => {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    expr.span,
                    format!("expected `{}` {}, found `{}`", target, context, ty),
                );
                expr
            }
            None => expr,
        }
    }

    fn lhs_check(&mut self, expr: &Expr) -> bool {
        match (LhsChecker { env: self.env }).lhs_check_expr(expr) {
            Ok(()) => true,
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                false
            }
        }
    }

    pub(crate) fn ty_check_un_expr(&mut self, span: Span, op: UnaryOpType, operand: Expr) -> Expr {
        let ty = operand.ty.and_then(|ty| {
            let is_valid = match op {
                UnaryOpType::Neg => ty.is_numeric(),
                UnaryOpType::Not => ty.base_type() == BaseType::Bool,
                UnaryOpType::BitNot => ty.base_type() == BaseType::Int,
                UnaryOpType::PreInc | UnaryOpType::PreDec | UnaryOpType::PostInc | UnaryOpType::PostDec => {
                    ty.is_numeric()
                }
            };
            if is_valid {
                Some(ty)
            } else {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    span,
                    format!("operator `{}` cannot be applied to `{}`", op, ty),
                )
            }
        });
        let ty = if op.modifies_operand() && ty.is_some() && !self.lhs_check(&operand) { None } else { ty };
        Expr::new(span, ty, ExprKind::Un { op, expr: Box::new(operand) })
    }

    pub(crate) fn ty_check_bin_expr(&mut self, span: Span, op: BinaryOpType, left: Expr, right: Expr) -> Expr {
        let (left_ty, right_ty) = match (left.ty, right.ty) {
            (Some(left_ty), Some(right_ty)) => (left_ty, right_ty),
            _ => return Expr::new(span, None, ExprKind::Bin { op, left: Box::new(left), right: Box::new(right) }),
        };
        match bin_types(op, left_ty, right_ty) {
            Ok((ty, left_target, right_target)) => Expr::new(
                span,
                Some(ty),
                ExprKind::Bin { op, left: Box::new(convert(left, left_target)), right: Box::new(convert(right, right_target)) },
            ),
            Err(message) => {
                self.error(DiagnosticKind::TypeMismatch, span, message);
                Expr::new(span, None, ExprKind::Bin { op, left: Box::new(left), right: Box::new(right) })
            }
        }
    }

    pub(crate) fn ty_check_assign_expr(&mut self, span: Span, op: BinaryOpType, lhs: Expr, rhs: Expr) -> Expr {
        let build = |ty, lhs, rhs| Expr::new(span, ty, ExprKind::Assign { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        let lhs_ty = match lhs.ty {
            Some(lhs_ty) => lhs_ty,
            None => return build(None, lhs, rhs),
        };
        if !self.lhs_check(&lhs) {
            return build(None, lhs, rhs);
        }
        let rhs_ty = match rhs.ty {
            Some(rhs_ty) => rhs_ty,
            None => return build(Some(lhs_ty), lhs, rhs),
        };
        match op.compound_op() {
            None => {
                let rhs = self.convert_to(rhs, lhs_ty, "on the right of `=`");
                build(Some(lhs_ty), lhs, rhs)
            }
            Some(bin_op) => match bin_types(bin_op, lhs_ty, rhs_ty) {
                Ok((result, left_target, right_target)) if result == lhs_ty && left_target == lhs_ty => {
                    build(Some(lhs_ty), lhs, convert(rhs, right_target))
                }
                _ => {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        span,
                        format!("operator `{}` cannot be applied to `{}` and `{}`", op, lhs_ty, rhs_ty),
                    );
                    build(None, lhs, rhs)
                }
            },
        }
    }

    pub(crate) fn ty_check_cond_expr(&mut self, span: Span, cond: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
        if let Some(ty) = cond.ty {
            if ty != Type::BOOL {
                self.error(DiagnosticKind::TypeMismatch, cond.span, format!("condition must be `bool`, found `{}`", ty));
            }
        }
        let (ty, then_expr, else_expr) = match (then_expr.ty, else_expr.ty) {
            (Some(then_ty), Some(else_ty)) if then_ty == else_ty => (Some(then_ty), then_expr, else_expr),
            (Some(then_ty), Some(else_ty)) if then_ty.converts_to(else_ty) => {
                (Some(else_ty), convert(then_expr, else_ty), else_expr)
            }
            (Some(then_ty), Some(else_ty)) if else_ty.converts_to(then_ty) => {
                (Some(then_ty), then_expr, convert(else_expr, then_ty))
            }
            (Some(then_ty), Some(else_ty)) => {
                let ty = self.error(
                    DiagnosticKind::TypeMismatch,
                    span,
                    format!("branches of `?:` have different types `{}` and `{}`", then_ty, else_ty),
                );
                (ty, then_expr, else_expr)
            }
            _ => (None, then_expr, else_expr),
        };
        Expr::new(
            span,
            ty,
            ExprKind::Cond { cond: Box::new(cond), then_expr: Box::new(then_expr), else_expr: Box::new(else_expr) },
        )
    }

    pub(crate) fn ty_check_cons_expr(&mut self, span: Span, ty: Type, args: Vec<Expr>) -> Expr {
        let build = |args| Expr::new(span, Some(ty), ExprKind::Cons { ty, args });
        if ty == Type::VOID || ty.is_sampler() {
            let result = self.error(DiagnosticKind::TypeMismatch, span, format!("cannot construct a value of type `{}`", ty));
            return Expr::new(span, result, ExprKind::Cons { ty, args });
        }
        let arg_types: Option<Vec<Type>> = args.iter().map(|arg| arg.ty).collect();
        let arg_types = match arg_types {
            Some(arg_types) => arg_types,
            None => return build(args),
        };
        if let Some(bad) = arg_types.iter().find(|arg_ty| !(arg_ty.is_scalar() || arg_ty.is_vector()) || arg_ty.is_sampler()) {
            let result =
                self.error(DiagnosticKind::TypeMismatch, span, format!("`{}` cannot be used to construct `{}`", bad, ty));
            return Expr::new(span, result, ExprKind::Cons { ty, args });
        }
        if let [arg_ty] = arg_types[..] {
            if arg_ty.is_scalar() {
                return build(args);
            }
        }
        let num_components: usize = arg_types.iter().map(|arg_ty| arg_ty.num_fields()).sum();
        if num_components != ty.num_fields() {
            let result = self.error(
                DiagnosticKind::ArityMismatch,
                span,
                format!("`{}` takes {} components, found {}", ty, ty.num_fields(), num_components),
            );
            return Expr::new(span, result, ExprKind::Cons { ty, args });
        }
        build(args)
    }

    pub(crate) fn ty_check_field_expr(&mut self, span: Span, base: Expr, field: Ident) -> Expr {
        let build = |ty, base, swizzle| Expr::new(span, ty, ExprKind::Field { expr: Box::new(base), field, swizzle });
        let base_ty = match base.ty {
            Some(base_ty) => base_ty,
            None => return build(None, base, None),
        };
        if !(base_ty.is_scalar() || base_ty.is_vector()) || base_ty.is_sampler() {
            let ty = self.error(DiagnosticKind::TypeMismatch, span, format!("type `{}` has no field `{}`", base_ty, field));
            return build(ty, base, None);
        }
        let swizzle = match Swizzle::parse(field) {
            Some(swizzle) if swizzle.max_index() < base_ty.num_fields() => swizzle,
            _ => {
                let ty =
                    self.error(DiagnosticKind::TypeMismatch, span, format!("invalid swizzle `{}` on `{}`", field, base_ty));
                return build(ty, base, None);
            }
        };
        let ty = Type::vector_of(base_ty.base_type(), swizzle.len());
        build(ty, base, Some(swizzle))
    }

    pub(crate) fn ty_check_index_expr(&mut self, span: Span, base: Expr, index: Expr) -> Expr {
        let array_size = match &base.unconverted().kind {
            ExprKind::Var { var: Some(var), .. } => self.env.variable(*var).array_size,
            _ => None,
        };
        let (ty, limit) = match (array_size, base.ty) {
            (Some(array_size), ty) => (ty, Some(array_size as usize)),
            (None, Some(base_ty)) if base_ty.is_vector() => (Some(base_ty.scalar()), Some(base_ty.num_fields())),
            (None, Some(base_ty)) => {
                (self.error(DiagnosticKind::TypeMismatch, span, format!("cannot index into `{}`", base_ty)), None)
            }
            (None, None) => (None, None),
        };
        match index.ty {
            Some(Type::INT) | None => {}
            Some(index_ty) => {
                self.error(DiagnosticKind::TypeMismatch, index.span, format!("index must be `int`, found `{}`", index_ty));
            }
        }
        if let (Some(limit), ExprKind::Lit(Lit::Int(value))) = (limit, &index.kind) {
            if *value < 0 || *value as usize >= limit {
                self.error(DiagnosticKind::TypeMismatch, index.span, format!("index {} is out of range 0..{}", value, limit));
            }
        }
        Expr::new(span, ty, ExprKind::Index { expr: Box::new(base), index: Box::new(index) })
    }

    /// Resolves a call against intrinsics and the user functions declared so far.
    /// `current_func` is the function whose body is being parsed.
    pub(crate) fn ty_check_call_expr(&mut self, span: Span, name: Ident, args: Vec<Expr>, current_func: Option<FuncId>) -> Expr {
        let build = |ty, func, args| Expr::new(span, ty, ExprKind::Call { name, func, args });
        let arg_types: Option<Vec<Type>> = args.iter().map(|arg| arg.ty).collect();
        let arg_types = match arg_types {
            Some(arg_types) => arg_types,
            None => return build(None, None, args),
        };
        match self.env.lookup_function(name, &arg_types) {
            Ok(id) => {
                let func = self.env.function(id);
                let ty = Some(func.return_type());
                let args = args.into_iter().zip(func.param_types()).map(|(arg, param_ty)| convert(arg, param_ty)).collect();
                if Some(id) == current_func {
                    self.error(
                        DiagnosticKind::UnsupportedConstruct,
                        span,
                        format!("function `{}` calls itself; recursion is not supported", name),
                    );
                    return build(None, Some(id), args);
                }
                build(ty, Some(id), args)
            }
            Err(LookupError::AmbiguousOverload(count)) => {
                self.error(
                    DiagnosticKind::AmbiguousOverload,
                    span,
                    format!("call to `{}{}` matches {} overloads", name, signature(&arg_types), count),
                );
                build(None, None, args)
            }
            Err(LookupError::NoSuchFunction) => {
                if !self.env.has_function_named(name) {
                    self.error(DiagnosticKind::UnknownIdentifier, span, format!("unknown function `{}`", name));
                } else if !self.env.has_function_with_arity(name, args.len()) {
                    self.error(
                        DiagnosticKind::ArityMismatch,
                        span,
                        format!("no overload of `{}` takes {} arguments", name, args.len()),
                    );
                } else {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        span,
                        format!("no overload of `{}` takes arguments `{}`", name, signature(&arg_types)),
                    );
                }
                build(None, None, args)
            }
        }
    }
}

fn signature(arg_types: &[Type]) -> String {
    let names: Vec<String> = arg_types.iter().map(|ty| ty.to_string()).collect();
    format!("({})", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_promotion_and_broadcast() {
        assert_eq!(bin_types(BinaryOpType::Add, Type::INT, Type::FLOAT), Ok((Type::FLOAT, Type::FLOAT, Type::FLOAT)));
        assert_eq!(bin_types(BinaryOpType::Mul, Type::FLOAT3, Type::INT), Ok((Type::FLOAT3, Type::FLOAT3, Type::FLOAT)));
        assert_eq!(bin_types(BinaryOpType::Sub, Type::FLOAT, Type::FLOAT4), Ok((Type::FLOAT4, Type::FLOAT, Type::FLOAT4)));
        assert_eq!(bin_types(BinaryOpType::Mod, Type::INT2, Type::INT2), Ok((Type::INT2, Type::INT2, Type::INT2)));
        assert!(bin_types(BinaryOpType::Add, Type::FLOAT2, Type::FLOAT3).is_err());
        assert!(bin_types(BinaryOpType::Add, Type::BOOL, Type::BOOL).is_err());
    }

    #[test]
    fn test_relational() {
        assert_eq!(bin_types(BinaryOpType::Lt, Type::INT, Type::FLOAT), Ok((Type::BOOL, Type::FLOAT, Type::FLOAT)));
        assert_eq!(bin_types(BinaryOpType::Eq, Type::FLOAT3, Type::FLOAT3), Ok((Type::BOOL3, Type::FLOAT3, Type::FLOAT3)));
        assert_eq!(bin_types(BinaryOpType::Ne, Type::BOOL, Type::BOOL), Ok((Type::BOOL, Type::BOOL, Type::BOOL)));
        assert!(bin_types(BinaryOpType::Lt, Type::BOOL, Type::BOOL).is_err());
        assert!(bin_types(BinaryOpType::Lt, Type::FLOAT3, Type::FLOAT).is_err());
        assert!(bin_types(BinaryOpType::Eq, Type::SAMPLER, Type::SAMPLER).is_err());
        assert_eq!(bin_types(BinaryOpType::Xor, Type::BOOL, Type::BOOL), Ok((Type::BOOL, Type::BOOL, Type::BOOL)));
        assert!(bin_types(BinaryOpType::And, Type::BOOL2, Type::BOOL2).is_err());
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(bin_types(BinaryOpType::Shl, Type::INT3, Type::INT), Ok((Type::INT3, Type::INT3, Type::INT)));
        assert!(bin_types(BinaryOpType::BitAnd, Type::INT, Type::INT3).is_err());
        assert!(bin_types(BinaryOpType::BitOr, Type::FLOAT, Type::INT).is_err());
    }
}
