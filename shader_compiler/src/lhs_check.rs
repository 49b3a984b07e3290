use crate::env::Env;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::ident::Ident;
use crate::shaderast::*;
use crate::span::Span;
use crate::swizzle::Swizzle;

/// Checks that an expression can be assigned to, or incremented.
pub(crate) struct LhsChecker<'a> {
    pub(crate) env: &'a Env,
}

impl<'a> LhsChecker<'a> {
    pub(crate) fn lhs_check_expr(&self, expr: &Expr) -> Result<(), Diagnostic> {
        match &expr.kind {
            ExprKind::Var { name, var } => self.lhs_check_var_expr(expr.span, *name, *var),
            ExprKind::Field { expr: base, field, swizzle } => {
                self.lhs_check_field_expr(expr.span, base, *field, swizzle.as_ref())
            }
            ExprKind::Index { expr: base, .. } => self.lhs_check_expr(base),
            _ => Err(not_an_lvalue(expr.span)),
        }
    }

    fn lhs_check_var_expr(&self, span: Span, name: Ident, var: Option<VarId>) -> Result<(), Diagnostic> {
        // Unresolved names have been reported already.
        let var = match var {
            Some(var) => self.env.variable(var),
            None => return Ok(()),
        };
        if !var.is_lvalue() {
            let what = match var.kind {
                VarKind::Param => "parameter",
                VarKind::Const => "constant",
                _ => "read-only variable",
            };
            return Err(Diagnostic::new(DiagnosticKind::InvalidLvalue, span, format!("cannot assign to {} `{}`", what, name)));
        }
        if var.ty.map_or(false, |ty| ty.is_sampler()) {
            return Err(Diagnostic::new(DiagnosticKind::InvalidLvalue, span, format!("cannot assign to sampler `{}`", name)));
        }
        Ok(())
    }

    fn lhs_check_field_expr(&self, span: Span, base: &Expr, field: Ident, swizzle: Option<&Swizzle>) -> Result<(), Diagnostic> {
        self.lhs_check_expr(base)?;
        if let Some(swizzle) = swizzle {
            if swizzle.has_duplicates() {
                return Err(Diagnostic::new(
                    DiagnosticKind::InvalidLvalue,
                    span,
                    format!("swizzle `{}` repeats a component and cannot be assigned to", field),
                ));
            }
        }
        if base.ty.map_or(false, |ty| !ty.is_vector()) {
            return Err(Diagnostic::new(DiagnosticKind::InvalidLvalue, span, "cannot assign to a swizzle of a scalar"));
        }
        Ok(())
    }
}

fn not_an_lvalue(span: Span) -> Diagnostic {
    Diagnostic::new(DiagnosticKind::InvalidLvalue, span, "expression is not a valid left hand side")
}
