//! Turns an AST back into JSL source. The output re-parses to the same tree, minus
//! the implicit conversions which are not part of the source text.

use crate::function::FuncId;
use crate::ident::Ident;
use crate::lit::Lit;
use crate::op::{BinaryOpType, UnaryOpType, ASSIGN_PRECEDENCE, COND_PRECEDENCE, POSTFIX_PRECEDENCE, UNARY_PRECEDENCE};
use crate::shaderast::*;
use crate::span::Span;
use crate::swizzle::Swizzle;
use crate::ty::Type;
use crate::visitor::TreeVisitor;
use std::fmt;

const INDENT: &str = "    ";

struct PrettyPrinter<'a, 'f> {
    f: &'a mut fmt::Formatter<'f>,
    indent: usize,
    /// Set when the next statement continues the current line, as in `else if`.
    skip_indent: bool,
}

impl<'a, 'f> PrettyPrinter<'a, 'f> {
    fn new(f: &'a mut fmt::Formatter<'f>) -> Self {
        PrettyPrinter { f, indent: 0, skip_indent: false }
    }

    fn write_indent(&mut self) -> fmt::Result {
        if self.skip_indent {
            self.skip_indent = false;
            return Ok(());
        }
        for _ in 0..self.indent {
            self.f.write_str(INDENT)?;
        }
        Ok(())
    }

    /// Writes a full statement, starting with indentation and ending with a newline.
    fn write_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Block(block) => {
                self.write_indent()?;
                self.visit_block(block)?;
                writeln!(self.f)
            }
            _ => stmt.accept(self),
        }
    }

    /// The body of an `if` or `for`: blocks stay on the header line, anything else
    /// goes on its own line one level deeper.
    fn write_nested_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Block(block) => {
                write!(self.f, " ")?;
                self.visit_block(block)?;
                writeln!(self.f)
            }
            _ => {
                writeln!(self.f)?;
                self.indent += 1;
                self.write_stmt(stmt)?;
                self.indent -= 1;
                Ok(())
            }
        }
    }

    fn write_var_decl_inline(&mut self, decl: &VarDecl) -> fmt::Result {
        if let Some(qualifier) = decl.qualifier {
            write!(self.f, "{} ", qualifier.keyword())?;
        }
        if let Some(precision) = decl.precision {
            write!(self.f, "{} ", precision.keyword())?;
        }
        write!(self.f, "{} ", decl.ty_expr.name)?;
        for (index, declarator) in decl.declarators.iter().enumerate() {
            if index != 0 {
                write!(self.f, ", ")?;
            }
            write!(self.f, "{}", declarator.name)?;
            if let Some(array_size) = declarator.array_size {
                write!(self.f, "[{}]", array_size)?;
            }
            if let Some(init) = &declarator.init {
                write!(self.f, " = ")?;
                self.write_operand(init, ASSIGN_PRECEDENCE)?;
            }
        }
        Ok(())
    }

    /// Writes `expr`, parenthesized when it binds looser than `min_precedence`.
    fn write_operand(&mut self, expr: &Expr, min_precedence: u8) -> fmt::Result {
        if precedence(expr) < min_precedence {
            write!(self.f, "(")?;
            expr.accept(self)?;
            write!(self.f, ")")
        } else {
            expr.accept(self)
        }
    }

    fn write_args(&mut self, args: &[Expr]) -> fmt::Result {
        write!(self.f, "(")?;
        for (index, arg) in args.iter().enumerate() {
            if index != 0 {
                write!(self.f, ", ")?;
            }
            self.write_operand(arg, ASSIGN_PRECEDENCE)?;
        }
        write!(self.f, ")")
    }
}

fn precedence(expr: &Expr) -> u8 {
    match &expr.unconverted().kind {
        ExprKind::Un { op, .. } if !op.is_postfix() => UNARY_PRECEDENCE,
        ExprKind::Bin { op, .. } => op.precedence(),
        ExprKind::Assign { .. } => ASSIGN_PRECEDENCE,
        ExprKind::Cond { .. } => COND_PRECEDENCE,
        // `1.xx` would lex as a malformed number.
        ExprKind::Lit(_) => UNARY_PRECEDENCE,
        _ => POSTFIX_PRECEDENCE,
    }
}

fn is_prefix_un(expr: &Expr) -> bool {
    matches!(&expr.unconverted().kind, ExprKind::Un { op, .. } if !op.is_postfix())
}

fn is_func_def(decl: &ExtDecl) -> bool {
    matches!(decl, ExtDecl::Func(FuncDecl { body: Some(_), .. }))
}

impl<'a, 'f> TreeVisitor for PrettyPrinter<'a, 'f> {
    type Error = fmt::Error;

    fn visit_program_unit(&mut self, unit: &ProgramUnit) -> fmt::Result {
        for (index, decl) in unit.decls().iter().enumerate() {
            if index != 0 && (is_func_def(decl) || is_func_def(&unit.decls()[index - 1])) {
                writeln!(self.f)?;
            }
            decl.accept(self)?;
        }
        Ok(())
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) -> fmt::Result {
        self.write_indent()?;
        self.write_var_decl_inline(decl)?;
        writeln!(self.f, ";")
    }

    fn visit_func_decl(&mut self, decl: &FuncDecl) -> fmt::Result {
        self.write_indent()?;
        write!(self.f, "{} {}(", decl.return_ty_expr.name, decl.name)?;
        for (index, param) in decl.params.iter().enumerate() {
            if index != 0 {
                write!(self.f, ", ")?;
            }
            write!(self.f, "{} {}", param.ty_expr.name, param.name)?;
        }
        write!(self.f, ")")?;
        match &decl.body {
            Some(body) => {
                write!(self.f, " ")?;
                self.visit_block(body)?;
                writeln!(self.f)
            }
            None => writeln!(self.f, ";"),
        }
    }

    fn visit_block(&mut self, block: &Block) -> fmt::Result {
        writeln!(self.f, "{{")?;
        self.indent += 1;
        for stmt in &block.stmts {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.write_indent()?;
        write!(self.f, "}}")
    }

    fn visit_if_stmt(&mut self, _span: Span, cond: &Expr, then_stmt: &Stmt, else_stmt: Option<&Stmt>) -> fmt::Result {
        self.write_indent()?;
        write!(self.f, "if (")?;
        cond.accept(self)?;
        write!(self.f, ")")?;
        self.write_nested_stmt(then_stmt)?;
        if let Some(else_stmt) = else_stmt {
            self.write_indent()?;
            write!(self.f, "else")?;
            if let Stmt::If { .. } = else_stmt {
                write!(self.f, " ")?;
                self.skip_indent = true;
                self.write_stmt(else_stmt)?;
            } else {
                self.write_nested_stmt(else_stmt)?;
            }
        }
        Ok(())
    }

    fn visit_for_stmt(&mut self, _span: Span, init: &Stmt, cond: &Expr, step: &Expr, body: &Stmt) -> fmt::Result {
        self.write_indent()?;
        write!(self.f, "for (")?;
        match init {
            Stmt::Decl(decl) => self.write_var_decl_inline(decl)?,
            Stmt::Expr { expr, .. } => expr.accept(self)?,
            _ => {}
        }
        write!(self.f, "; ")?;
        cond.accept(self)?;
        write!(self.f, "; ")?;
        step.accept(self)?;
        write!(self.f, ")")?;
        self.write_nested_stmt(body)
    }

    fn visit_return_stmt(&mut self, _span: Span, expr: Option<&Expr>) -> fmt::Result {
        self.write_indent()?;
        match expr {
            Some(expr) => {
                write!(self.f, "return ")?;
                expr.accept(self)?;
                writeln!(self.f, ";")
            }
            None => writeln!(self.f, "return;"),
        }
    }

    fn visit_break_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.f, "break;")
    }

    fn visit_continue_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.f, "continue;")
    }

    fn visit_discard_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.f, "discard;")
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &Expr) -> fmt::Result {
        self.write_indent()?;
        expr.accept(self)?;
        writeln!(self.f, ";")
    }

    fn visit_empty_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.f, ";")
    }

    fn visit_lit_expr(&mut self, _expr: &Expr, lit: Lit) -> fmt::Result {
        write!(self.f, "{}", lit)
    }

    fn visit_var_expr(&mut self, _expr: &Expr, name: Ident, _var: Option<VarId>) -> fmt::Result {
        write!(self.f, "{}", name)
    }

    fn visit_un_expr(&mut self, _expr: &Expr, op: UnaryOpType, operand: &Expr) -> fmt::Result {
        if op.is_postfix() {
            self.write_operand(operand, POSTFIX_PRECEDENCE)?;
            return write!(self.f, "{}", op.symbol());
        }
        write!(self.f, "{}", op.symbol())?;
        // `-(-x)` must not come out as `--x`.
        if is_prefix_un(operand) {
            write!(self.f, "(")?;
            operand.accept(self)?;
            write!(self.f, ")")
        } else {
            self.write_operand(operand, UNARY_PRECEDENCE)
        }
    }

    fn visit_bin_expr(&mut self, _expr: &Expr, op: BinaryOpType, left: &Expr, right: &Expr) -> fmt::Result {
        self.write_operand(left, op.precedence())?;
        write!(self.f, " {} ", op.symbol())?;
        self.write_operand(right, op.precedence() + 1)
    }

    fn visit_assign_expr(&mut self, _expr: &Expr, op: BinaryOpType, lhs: &Expr, rhs: &Expr) -> fmt::Result {
        self.write_operand(lhs, ASSIGN_PRECEDENCE + 1)?;
        write!(self.f, " {} ", op.symbol())?;
        self.write_operand(rhs, ASSIGN_PRECEDENCE)
    }

    fn visit_call_expr(&mut self, _expr: &Expr, name: Ident, _func: Option<FuncId>, args: &[Expr]) -> fmt::Result {
        write!(self.f, "{}", name)?;
        self.write_args(args)
    }

    fn visit_cons_expr(&mut self, _expr: &Expr, ty: Type, args: &[Expr]) -> fmt::Result {
        write!(self.f, "{}", ty)?;
        self.write_args(args)
    }

    fn visit_field_expr(&mut self, _expr: &Expr, base: &Expr, field: Ident, _swizzle: Option<&Swizzle>) -> fmt::Result {
        self.write_operand(base, POSTFIX_PRECEDENCE)?;
        write!(self.f, ".{}", field)
    }

    fn visit_index_expr(&mut self, _expr: &Expr, base: &Expr, index: &Expr) -> fmt::Result {
        self.write_operand(base, POSTFIX_PRECEDENCE)?;
        write!(self.f, "[")?;
        index.accept(self)?;
        write!(self.f, "]")
    }

    fn visit_cond_expr(&mut self, _expr: &Expr, cond: &Expr, then_expr: &Expr, else_expr: &Expr) -> fmt::Result {
        self.write_operand(cond, COND_PRECEDENCE + 1)?;
        write!(self.f, " ? ")?;
        self.write_operand(then_expr, ASSIGN_PRECEDENCE)?;
        write!(self.f, " : ")?;
        self.write_operand(else_expr, COND_PRECEDENCE)
    }

    fn visit_convert_expr(&mut self, _expr: &Expr, operand: &Expr) -> fmt::Result {
        operand.accept(self)
    }
}

impl fmt::Display for ProgramUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.accept(&mut PrettyPrinter::new(f))
    }
}

impl fmt::Display for ExtDecl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.accept(&mut PrettyPrinter::new(f))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.accept(&mut PrettyPrinter::new(f))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        PrettyPrinter::new(f).write_stmt(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.accept(&mut PrettyPrinter::new(f))
    }
}
