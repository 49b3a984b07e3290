//! Double dispatch over the AST. Every pass that walks a [`ProgramUnit`] without
//! being part of the parser (pretty printing, code generation, usage analysis)
//! implements [`TreeVisitor`]; the default methods walk into the children.

use crate::function::FuncId;
use crate::ident::Ident;
use crate::lit::Lit;
use crate::op::{BinaryOpType, UnaryOpType};
use crate::shaderast::*;
use crate::span::Span;
use crate::swizzle::Swizzle;
use crate::ty::Type;

pub trait TreeVisitor {
    type Error;

    fn visit_program_unit(&mut self, unit: &ProgramUnit) -> Result<(), Self::Error> {
        for decl in &unit.decls {
            decl.accept(self)?;
        }
        Ok(())
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) -> Result<(), Self::Error> {
        for declarator in &decl.declarators {
            if let Some(init) = &declarator.init {
                init.accept(self)?;
            }
        }
        Ok(())
    }

    fn visit_func_decl(&mut self, decl: &FuncDecl) -> Result<(), Self::Error> {
        if let Some(body) = &decl.body {
            body.accept(self)?;
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &Block) -> Result<(), Self::Error> {
        for stmt in &block.stmts {
            stmt.accept(self)?;
        }
        Ok(())
    }

    fn visit_if_stmt(&mut self, _span: Span, cond: &Expr, then_stmt: &Stmt, else_stmt: Option<&Stmt>) -> Result<(), Self::Error> {
        cond.accept(self)?;
        then_stmt.accept(self)?;
        if let Some(else_stmt) = else_stmt {
            else_stmt.accept(self)?;
        }
        Ok(())
    }

    fn visit_for_stmt(&mut self, _span: Span, init: &Stmt, cond: &Expr, step: &Expr, body: &Stmt) -> Result<(), Self::Error> {
        init.accept(self)?;
        cond.accept(self)?;
        step.accept(self)?;
        body.accept(self)
    }

    fn visit_return_stmt(&mut self, _span: Span, expr: Option<&Expr>) -> Result<(), Self::Error> {
        match expr {
            Some(expr) => expr.accept(self),
            None => Ok(()),
        }
    }

    fn visit_break_stmt(&mut self, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_continue_stmt(&mut self, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_discard_stmt(&mut self, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &Expr) -> Result<(), Self::Error> {
        expr.accept(self)
    }

    fn visit_empty_stmt(&mut self, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_lit_expr(&mut self, _expr: &Expr, _lit: Lit) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_var_expr(&mut self, _expr: &Expr, _name: Ident, _var: Option<VarId>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_un_expr(&mut self, _expr: &Expr, _op: UnaryOpType, operand: &Expr) -> Result<(), Self::Error> {
        operand.accept(self)
    }

    fn visit_bin_expr(&mut self, _expr: &Expr, _op: BinaryOpType, left: &Expr, right: &Expr) -> Result<(), Self::Error> {
        left.accept(self)?;
        right.accept(self)
    }

    fn visit_assign_expr(&mut self, _expr: &Expr, _op: BinaryOpType, lhs: &Expr, rhs: &Expr) -> Result<(), Self::Error> {
        lhs.accept(self)?;
        rhs.accept(self)
    }

    fn visit_call_expr(&mut self, _expr: &Expr, _name: Ident, _func: Option<FuncId>, args: &[Expr]) -> Result<(), Self::Error> {
        for arg in args {
            arg.accept(self)?;
        }
        Ok(())
    }

    fn visit_cons_expr(&mut self, _expr: &Expr, _ty: Type, args: &[Expr]) -> Result<(), Self::Error> {
        for arg in args {
            arg.accept(self)?;
        }
        Ok(())
    }

    fn visit_field_expr(
        &mut self,
        _expr: &Expr,
        base: &Expr,
        _field: Ident,
        _swizzle: Option<&Swizzle>,
    ) -> Result<(), Self::Error> {
        base.accept(self)
    }

    fn visit_index_expr(&mut self, _expr: &Expr, base: &Expr, index: &Expr) -> Result<(), Self::Error> {
        base.accept(self)?;
        index.accept(self)
    }

    fn visit_cond_expr(&mut self, _expr: &Expr, cond: &Expr, then_expr: &Expr, else_expr: &Expr) -> Result<(), Self::Error> {
        cond.accept(self)?;
        then_expr.accept(self)?;
        else_expr.accept(self)
    }

    fn visit_convert_expr(&mut self, _expr: &Expr, operand: &Expr) -> Result<(), Self::Error> {
        operand.accept(self)
    }
}

impl ProgramUnit {
    pub fn accept<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_program_unit(self)
    }
}

impl ExtDecl {
    pub fn accept<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            ExtDecl::Var(decl) => visitor.visit_var_decl(decl),
            ExtDecl::Func(decl) => visitor.visit_func_decl(decl),
        }
    }
}

impl Block {
    pub fn accept<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_block(self)
    }
}

impl Stmt {
    pub fn accept<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Stmt::Block(block) => visitor.visit_block(block),
            Stmt::Decl(decl) => visitor.visit_var_decl(decl),
            Stmt::If { span, cond, then_stmt, else_stmt } => {
                visitor.visit_if_stmt(*span, cond, then_stmt, else_stmt.as_deref())
            }
            Stmt::For { span, init, cond, step, body } => visitor.visit_for_stmt(*span, init, cond, step, body),
            Stmt::Return { span, expr } => visitor.visit_return_stmt(*span, expr.as_ref()),
            Stmt::Break { span } => visitor.visit_break_stmt(*span),
            Stmt::Continue { span } => visitor.visit_continue_stmt(*span),
            Stmt::Discard { span } => visitor.visit_discard_stmt(*span),
            Stmt::Expr { span, expr } => visitor.visit_expr_stmt(*span, expr),
            Stmt::Empty { span } => visitor.visit_empty_stmt(*span),
        }
    }
}

impl Expr {
    pub fn accept<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match &self.kind {
            ExprKind::Lit(lit) => visitor.visit_lit_expr(self, *lit),
            ExprKind::Var { name, var } => visitor.visit_var_expr(self, *name, *var),
            ExprKind::Un { op, expr } => visitor.visit_un_expr(self, *op, expr),
            ExprKind::Bin { op, left, right } => visitor.visit_bin_expr(self, *op, left, right),
            ExprKind::Assign { op, lhs, rhs } => visitor.visit_assign_expr(self, *op, lhs, rhs),
            ExprKind::Call { name, func, args } => visitor.visit_call_expr(self, *name, *func, args),
            ExprKind::Cons { ty, args } => visitor.visit_cons_expr(self, *ty, args),
            ExprKind::Field { expr, field, swizzle } => visitor.visit_field_expr(self, expr, *field, swizzle.as_ref()),
            ExprKind::Index { expr, index } => visitor.visit_index_expr(self, expr, index),
            ExprKind::Cond { cond, then_expr, else_expr } => visitor.visit_cond_expr(self, cond, then_expr, else_expr),
            ExprKind::Convert { expr } => visitor.visit_convert_expr(self, expr),
        }
    }
}
