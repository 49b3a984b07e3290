//! The part of code generation shared by all dialects. [`ShaderGenerator`] walks the
//! program in source order and asks a [`BackendWriter`] how to spell everything
//! that differs between dialects.

use crate::builtin::intrinsic;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::function::FuncId;
use crate::generate_glsl::{self, GlslVersion};
use crate::generate_hlsl;
use crate::ident::Ident;
use crate::lit::{Lit, PrettyPrintedFloat};
use crate::op::{BinaryOpType, UnaryOpType, ASSIGN_PRECEDENCE, COND_PRECEDENCE, POSTFIX_PRECEDENCE, UNARY_PRECEDENCE};
use crate::shaderast::*;
use crate::span::Span;
use crate::swizzle::Swizzle;
use crate::ty::Type;
use crate::visitor::TreeVisitor;
use std::convert::Infallible;
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

const INDENT: &str = "    ";

/// Name of the helper function that implements `paddedSample` in every dialect.
pub(crate) const PADDED_SAMPLE_HELPER: &str = "jsl_paddedSample";

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Dialect {
    /// GLSL ES 1.00, as used by OpenGL ES 2 and WebGL.
    Es2,
    /// Desktop GLSL 1.30.
    Glsl,
    /// HLSL for shader model 3.
    Hlsl,
}

impl Dialect {
    pub fn all() -> [Dialect; 3] {
        [Dialect::Es2, Dialect::Glsl, Dialect::Hlsl]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Es2 => "es2",
            Dialect::Glsl => "glsl",
            Dialect::Hlsl => "hlsl",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            Dialect::Es2 => "frag",
            Dialect::Glsl => "glsl",
            Dialect::Hlsl => "hlsl",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown dialect `{}`, expected one of es2, glsl, hlsl", self.0)
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(string: &str) -> Result<Dialect, UnknownDialect> {
        Dialect::all().into_iter().find(|dialect| dialect.as_str() == string).ok_or_else(|| UnknownDialect(string.to_string()))
    }
}

/// Generates the shader source for one dialect. Fails with one
/// [`DiagnosticKind::UnsupportedConstruct`] per construct the dialect cannot express.
pub fn generate_shader(program: &ProgramUnit, dialect: Dialect) -> Result<String, Vec<Diagnostic>> {
    match dialect {
        Dialect::Es2 => generate_glsl::generate_shader(program, GlslVersion::Es2),
        Dialect::Glsl => generate_glsl::generate_shader(program, GlslVersion::V130),
        Dialect::Hlsl => generate_hlsl::generate_shader(program),
    }
}

/// How a binary operator is rendered.
pub(crate) enum BinForm {
    /// Infix, spelled and bound as the given operator.
    Infix(BinaryOpType),
    /// As a call, e.g. `lessThan(a, b)` or `mod(a, b)`.
    Call(&'static str),
}

/// How a constructor is rendered.
pub(crate) enum ConsForm {
    Call,
    /// A cast of the single argument, e.g. `((float3)(x))`.
    Cast,
}

/// Everything a dialect spells differently.
pub(crate) trait BackendWriter {
    fn type_name(&self, ty: Type) -> &'static str;

    fn builtin_var_name(&self, builtin: BuiltinVar) -> &'static str;

    /// The name to call an intrinsic by. `sample` and `paddedSample` are included.
    fn intrinsic_name(&self, name: &'static str, num_args: usize) -> &'static str;

    fn precision_keyword(&self, _precision: Precision) -> Option<&'static str> {
        None
    }

    fn check_type(&self, _ty: Type) -> Result<(), String> {
        Ok(())
    }

    /// `operand_ty` is the type of the left operand.
    fn check_bin_op(&self, _op: BinaryOpType, _operand_ty: Type) -> Result<(), String> {
        Ok(())
    }

    fn check_un_op(&self, _op: UnaryOpType) -> Result<(), String> {
        Ok(())
    }

    fn bin_form(&self, op: BinaryOpType, _operand_ty: Type) -> BinForm {
        BinForm::Infix(op)
    }

    /// The function that negates a bool vector, when `!` only works on scalars.
    fn vector_not(&self) -> Option<&'static str> {
        None
    }

    fn cons_form(&self, _ty: Type, _arg_types: &[Option<Type>]) -> ConsForm {
        ConsForm::Call
    }

    /// Whether `f.xx` has to be written as a constructor, `vec2(f)`.
    fn scalar_swizzle_as_constructor(&self) -> bool {
        false
    }

    /// Whether int to float promotions have to be spelled out.
    fn explicit_conversions(&self) -> bool {
        false
    }

    /// Whether `fma` has to be expanded to a multiply-add.
    fn inline_fma(&self) -> bool {
        false
    }

    fn write_preamble(&mut self, string: &mut String, usage: &Usage) -> fmt::Result;

    fn write_padded_sample_helper(&self, string: &mut String) -> fmt::Result;

    /// One declarator of a global declaration, including the trailing newline.
    /// `init` is the already generated initializer.
    fn write_global_var(&mut self, string: &mut String, var: VarId, variable: &Variable, init: Option<&str>) -> fmt::Result;

    /// The signature of `main`, without the body.
    fn write_main_header(&self, string: &mut String) -> fmt::Result;
}

/// What a program uses, so the preamble only declares what is needed.
#[derive(Clone, Debug, Default)]
pub(crate) struct Usage {
    builtins: Vec<BuiltinVar>,
    pub(crate) uses_padded_sample: bool,
}

impl Usage {
    pub(crate) fn collect(program: &ProgramUnit) -> Usage {
        let mut collector = UsageCollector { program, usage: Usage::default() };
        program.accept(&mut collector).unwrap_or_else(|never| match never {});
        collector.usage
    }

    pub(crate) fn uses_builtin(&self, builtin: BuiltinVar) -> bool {
        self.builtins.contains(&builtin)
    }
}

struct UsageCollector<'a> {
    program: &'a ProgramUnit,
    usage: Usage,
}

impl<'a> TreeVisitor for UsageCollector<'a> {
    type Error = Infallible;

    fn visit_var_expr(&mut self, _expr: &Expr, _name: Ident, var: Option<VarId>) -> Result<(), Infallible> {
        if let Some(var) = var {
            if let VarKind::Builtin(builtin) = self.program.variable(var).kind {
                if !self.usage.builtins.contains(&builtin) {
                    self.usage.builtins.push(builtin);
                }
            }
        }
        Ok(())
    }

    fn visit_call_expr(&mut self, _expr: &Expr, _name: Ident, func: Option<FuncId>, args: &[Expr]) -> Result<(), Infallible> {
        if let Some(FuncId::Intrinsic(index)) = func {
            if intrinsic(index).name() == Ident::new("paddedSample") {
                self.usage.uses_padded_sample = true;
            }
        }
        for arg in args {
            arg.accept(self)?;
        }
        Ok(())
    }
}

pub(crate) struct ShaderGenerator<'a, B> {
    program: &'a ProgramUnit,
    backend: B,
    string: String,
    indent: usize,
    /// Precedence the expression about to be written must have to go without
    /// parentheses. Zero where it stands on its own, e.g. as an argument.
    min_precedence: u8,
    in_function: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, B: BackendWriter> ShaderGenerator<'a, B> {
    pub(crate) fn new(program: &'a ProgramUnit, backend: B) -> Self {
        ShaderGenerator {
            program,
            backend,
            string: String::new(),
            indent: 0,
            min_precedence: 0,
            in_function: false,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn generate_shader(mut self) -> Result<String, Vec<Diagnostic>> {
        if let Err(error) = self.generate_program() {
            self.diagnostics.push(error.into());
        }
        if self.diagnostics.is_empty() {
            Ok(self.string)
        } else {
            Err(self.diagnostics)
        }
    }

    fn generate_program(&mut self) -> fmt::Result {
        let usage = Usage::collect(self.program);
        self.backend.write_preamble(&mut self.string, &usage)?;
        if usage.uses_padded_sample {
            self.write_separator()?;
            self.backend.write_padded_sample_helper(&mut self.string)?;
        }
        let program = self.program;
        for decl in program.decls() {
            if matches!(decl, ExtDecl::Func(_)) {
                self.write_separator()?;
            }
            decl.accept(self)?;
        }
        Ok(())
    }

    /// A blank line between top level items.
    fn write_separator(&mut self) -> fmt::Result {
        if !self.string.is_empty() {
            writeln!(self.string)?;
        }
        Ok(())
    }

    fn unsupported(&mut self, span: Span, message: String) {
        self.diagnostics.push(Diagnostic::new(DiagnosticKind::UnsupportedConstruct, span, message));
    }

    fn check_type(&mut self, span: Span, ty: Option<Type>) {
        if let Some(ty) = ty {
            if let Err(message) = self.backend.check_type(ty) {
                self.unsupported(span, message);
            }
        }
    }

    fn write_indent(&mut self) -> fmt::Result {
        for _ in 0..self.indent {
            self.string.push_str(INDENT);
        }
        Ok(())
    }

    fn write_expr(&mut self, expr: &Expr, min_precedence: u8) -> fmt::Result {
        self.min_precedence = min_precedence;
        expr.accept(self)
    }

    /// Generates `expr` on the side, for backends that place it themselves.
    fn generate_expr(&mut self, expr: &Expr) -> Result<String, fmt::Error> {
        let outer = std::mem::take(&mut self.string);
        let result = self.write_expr(expr, 0);
        let generated = std::mem::replace(&mut self.string, outer);
        result.map(|()| generated)
    }

    fn write_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Block(block) => {
                self.write_indent()?;
                self.visit_block(block)?;
                writeln!(self.string)
            }
            _ => stmt.accept(self),
        }
    }

    fn write_nested_stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Block(block) => {
                write!(self.string, " ")?;
                self.visit_block(block)?;
                writeln!(self.string)
            }
            _ => {
                writeln!(self.string)?;
                self.indent += 1;
                self.write_stmt(stmt)?;
                self.indent -= 1;
                Ok(())
            }
        }
    }

    fn write_local_var_decl_inline(&mut self, decl: &VarDecl) -> fmt::Result {
        if decl.qualifier == Some(Qualifier::Const) {
            write!(self.string, "const ")?;
        }
        if let Some(keyword) = decl.precision.and_then(|precision| self.backend.precision_keyword(precision)) {
            write!(self.string, "{} ", keyword)?;
        }
        self.check_type(decl.ty_expr.span, decl.ty_expr.ty);
        let type_name = decl.ty_expr.ty.map_or("void", |ty| self.backend.type_name(ty));
        write!(self.string, "{} ", type_name)?;
        for (index, declarator) in decl.declarators.iter().enumerate() {
            if index != 0 {
                write!(self.string, ", ")?;
            }
            write!(self.string, "{}", declarator.name)?;
            if let Some(array_size) = declarator.array_size {
                write!(self.string, "[{}]", array_size)?;
            }
            if let Some(init) = &declarator.init {
                write!(self.string, " = ")?;
                self.write_expr(init, 0)?;
            }
        }
        Ok(())
    }

    fn write_global_var_decl(&mut self, decl: &VarDecl) -> fmt::Result {
        self.check_type(decl.ty_expr.span, decl.ty_expr.ty);
        for declarator in &decl.declarators {
            let init = match &declarator.init {
                Some(init) => Some(self.generate_expr(init)?),
                None => None,
            };
            let variable = self.program.variable(declarator.var);
            self.backend.write_global_var(&mut self.string, declarator.var, variable, init.as_deref())?;
        }
        Ok(())
    }

    fn write_args(&mut self, args: &[Expr]) -> fmt::Result {
        write!(self.string, "(")?;
        for (index, arg) in args.iter().enumerate() {
            if index != 0 {
                write!(self.string, ", ")?;
            }
            self.write_expr(arg, 0)?;
        }
        write!(self.string, ")")
    }

    fn open_paren(&mut self, needs_parens: bool) -> fmt::Result {
        if needs_parens {
            write!(self.string, "(")?;
        }
        Ok(())
    }

    fn close_paren(&mut self, needs_parens: bool) -> fmt::Result {
        if needs_parens {
            write!(self.string, ")")?;
        }
        Ok(())
    }
}

impl<'a, B: BackendWriter> TreeVisitor for ShaderGenerator<'a, B> {
    type Error = fmt::Error;

    fn visit_var_decl(&mut self, decl: &VarDecl) -> fmt::Result {
        if !self.in_function {
            return self.write_global_var_decl(decl);
        }
        self.write_indent()?;
        self.write_local_var_decl_inline(decl)?;
        writeln!(self.string, ";")
    }

    fn visit_func_decl(&mut self, decl: &FuncDecl) -> fmt::Result {
        let is_main = decl.name == Ident::new("main");
        if is_main && decl.body.is_none() {
            return Ok(());
        }
        self.check_type(decl.return_ty_expr.span, decl.return_ty_expr.ty);
        for param in &decl.params {
            self.check_type(param.ty_expr.span, param.ty_expr.ty);
        }
        if is_main {
            self.backend.write_main_header(&mut self.string)?;
        } else {
            let return_type = decl.return_ty_expr.ty.map_or("void", |ty| self.backend.type_name(ty));
            write!(self.string, "{} {}(", return_type, decl.name)?;
            for (index, param) in decl.params.iter().enumerate() {
                if index != 0 {
                    write!(self.string, ", ")?;
                }
                let type_name = param.ty_expr.ty.map_or("void", |ty| self.backend.type_name(ty));
                write!(self.string, "{} {}", type_name, param.name)?;
            }
            write!(self.string, ")")?;
        }
        match &decl.body {
            Some(body) => {
                write!(self.string, " ")?;
                self.in_function = true;
                let result = self.visit_block(body);
                self.in_function = false;
                result?;
                writeln!(self.string)
            }
            None => writeln!(self.string, ";"),
        }
    }

    fn visit_block(&mut self, block: &Block) -> fmt::Result {
        writeln!(self.string, "{{")?;
        self.indent += 1;
        for stmt in &block.stmts {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.write_indent()?;
        write!(self.string, "}}")
    }

    fn visit_if_stmt(&mut self, _span: Span, cond: &Expr, then_stmt: &Stmt, else_stmt: Option<&Stmt>) -> fmt::Result {
        self.write_indent()?;
        write!(self.string, "if (")?;
        self.write_expr(cond, 0)?;
        write!(self.string, ")")?;
        self.write_nested_stmt(then_stmt)?;
        if let Some(else_stmt) = else_stmt {
            self.write_indent()?;
            write!(self.string, "else")?;
            self.write_nested_stmt(else_stmt)?;
        }
        Ok(())
    }

    fn visit_for_stmt(&mut self, _span: Span, init: &Stmt, cond: &Expr, step: &Expr, body: &Stmt) -> fmt::Result {
        self.write_indent()?;
        write!(self.string, "for (")?;
        match init {
            Stmt::Decl(decl) => self.write_local_var_decl_inline(decl)?,
            Stmt::Expr { expr, .. } => self.write_expr(expr, 0)?,
            _ => {}
        }
        write!(self.string, "; ")?;
        self.write_expr(cond, 0)?;
        write!(self.string, "; ")?;
        self.write_expr(step, 0)?;
        write!(self.string, ")")?;
        self.write_nested_stmt(body)
    }

    fn visit_return_stmt(&mut self, _span: Span, expr: Option<&Expr>) -> fmt::Result {
        self.write_indent()?;
        match expr {
            Some(expr) => {
                write!(self.string, "return ")?;
                self.write_expr(expr, 0)?;
                writeln!(self.string, ";")
            }
            None => writeln!(self.string, "return;"),
        }
    }

    fn visit_break_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.string, "break;")
    }

    fn visit_continue_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.string, "continue;")
    }

    fn visit_discard_stmt(&mut self, _span: Span) -> fmt::Result {
        self.write_indent()?;
        writeln!(self.string, "discard;")
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &Expr) -> fmt::Result {
        self.write_indent()?;
        self.write_expr(expr, 0)?;
        writeln!(self.string, ";")
    }

    fn visit_empty_stmt(&mut self, _span: Span) -> fmt::Result {
        Ok(())
    }

    fn visit_lit_expr(&mut self, _expr: &Expr, lit: Lit) -> fmt::Result {
        write!(self.string, "{}", lit)
    }

    fn visit_var_expr(&mut self, _expr: &Expr, name: Ident, var: Option<VarId>) -> fmt::Result {
        if let Some(var) = var {
            if let VarKind::Builtin(builtin) = self.program.variable(var).kind {
                return write!(self.string, "{}", self.backend.builtin_var_name(builtin));
            }
        }
        write!(self.string, "{}", name)
    }

    fn visit_un_expr(&mut self, expr: &Expr, op: UnaryOpType, operand: &Expr) -> fmt::Result {
        let precedence = if op.is_postfix() { POSTFIX_PRECEDENCE } else { UNARY_PRECEDENCE };
        let needs_parens = precedence < self.min_precedence;
        if let Err(message) = self.backend.check_un_op(op) {
            self.unsupported(expr.span, message);
        }
        if op == UnaryOpType::Not && operand.ty.map_or(false, |ty| ty.is_vector()) {
            if let Some(not) = self.backend.vector_not() {
                write!(self.string, "{}(", not)?;
                self.write_expr(operand, 0)?;
                return write!(self.string, ")");
            }
        }
        self.open_paren(needs_parens)?;
        if op.is_postfix() {
            self.write_expr(operand, POSTFIX_PRECEDENCE)?;
            write!(self.string, "{}", op.symbol())?;
        } else {
            // Keeps `-(-a)` from turning into `--a`.
            let operand_precedence = match &operand.unconverted().kind {
                ExprKind::Un { op, .. } if !op.is_postfix() => UNARY_PRECEDENCE + 1,
                _ => UNARY_PRECEDENCE,
            };
            write!(self.string, "{}", op.symbol())?;
            self.write_expr(operand, operand_precedence)?;
        }
        self.close_paren(needs_parens)
    }

    fn visit_bin_expr(&mut self, expr: &Expr, op: BinaryOpType, left: &Expr, right: &Expr) -> fmt::Result {
        let operand_ty = left.ty.unwrap_or(Type::VOID);
        if let Err(message) = self.backend.check_bin_op(op, operand_ty) {
            self.unsupported(expr.span, message);
        }
        match self.backend.bin_form(op, operand_ty) {
            BinForm::Infix(op) => {
                let needs_parens = op.precedence() < self.min_precedence;
                self.open_paren(needs_parens)?;
                self.write_expr(left, op.precedence())?;
                write!(self.string, " {} ", op.symbol())?;
                self.write_expr(right, op.precedence() + 1)?;
                self.close_paren(needs_parens)
            }
            BinForm::Call(name) => {
                write!(self.string, "{}(", name)?;
                self.write_expr(left, 0)?;
                write!(self.string, ", ")?;
                self.write_expr(right, 0)?;
                write!(self.string, ")")
            }
        }
    }

    fn visit_assign_expr(&mut self, expr: &Expr, op: BinaryOpType, lhs: &Expr, rhs: &Expr) -> fmt::Result {
        let needs_parens = ASSIGN_PRECEDENCE < self.min_precedence;
        let operand_ty = lhs.ty.unwrap_or(Type::VOID);
        if let Err(message) = self.backend.check_bin_op(op, operand_ty) {
            self.unsupported(expr.span, message);
        }
        self.open_paren(needs_parens)?;
        match op.compound_op().map(|bin_op| self.backend.bin_form(bin_op, operand_ty)) {
            // `a %= b` becomes `a = mod(a, b)`.
            Some(BinForm::Call(name)) => {
                if lhs.has_side_effects() {
                    self.unsupported(
                        lhs.span,
                        format!("`{}` needs an lvalue without side effects here, since it is evaluated twice", op.symbol()),
                    );
                }
                self.write_expr(lhs, ASSIGN_PRECEDENCE + 1)?;
                write!(self.string, " = {}(", name)?;
                self.write_expr(lhs, 0)?;
                write!(self.string, ", ")?;
                self.write_expr(rhs, 0)?;
                write!(self.string, ")")?;
            }
            _ => {
                self.write_expr(lhs, ASSIGN_PRECEDENCE + 1)?;
                write!(self.string, " {} ", op.symbol())?;
                self.write_expr(rhs, ASSIGN_PRECEDENCE)?;
            }
        }
        self.close_paren(needs_parens)
    }

    fn visit_call_expr(&mut self, _expr: &Expr, name: Ident, func: Option<FuncId>, args: &[Expr]) -> fmt::Result {
        let index = match func {
            Some(FuncId::Intrinsic(index)) => index,
            _ => {
                write!(self.string, "{}", name)?;
                return self.write_args(args);
            }
        };
        let intrinsic_name = intrinsic(index).name().as_str();
        if let ("fma", [a, b, c]) = (intrinsic_name, args) {
            if self.backend.inline_fma() {
                write!(self.string, "(")?;
                self.write_expr(a, BinaryOpType::Mul.precedence())?;
                write!(self.string, " * ")?;
                self.write_expr(b, BinaryOpType::Mul.precedence() + 1)?;
                write!(self.string, " + ")?;
                self.write_expr(c, BinaryOpType::Add.precedence() + 1)?;
                return write!(self.string, ")");
            }
        }
        write!(self.string, "{}", self.backend.intrinsic_name(intrinsic_name, args.len()))?;
        self.write_args(args)
    }

    fn visit_cons_expr(&mut self, _expr: &Expr, ty: Type, args: &[Expr]) -> fmt::Result {
        let arg_types: Vec<Option<Type>> = args.iter().map(|arg| arg.ty).collect();
        match (self.backend.cons_form(ty, &arg_types), args) {
            (ConsForm::Cast, [arg]) => {
                write!(self.string, "(({})(", self.backend.type_name(ty))?;
                self.write_expr(arg, 0)?;
                write!(self.string, "))")
            }
            _ => {
                write!(self.string, "{}", self.backend.type_name(ty))?;
                self.write_args(args)
            }
        }
    }

    fn visit_field_expr(&mut self, expr: &Expr, base: &Expr, field: Ident, swizzle: Option<&Swizzle>) -> fmt::Result {
        let is_scalar_base = base.ty.map_or(false, |ty| ty.is_scalar());
        if let (true, Some(ty)) = (is_scalar_base && self.backend.scalar_swizzle_as_constructor(), expr.ty) {
            write!(self.string, "{}(", self.backend.type_name(ty))?;
            self.write_expr(base, 0)?;
            return write!(self.string, ")");
        }
        if let ExprKind::Lit(_) = base.unconverted().kind {
            write!(self.string, "(")?;
            self.write_expr(base, 0)?;
            write!(self.string, ")")?;
        } else {
            self.write_expr(base, POSTFIX_PRECEDENCE)?;
        }
        match swizzle {
            Some(swizzle) => write!(self.string, ".{}", swizzle),
            None => write!(self.string, ".{}", field),
        }
    }

    fn visit_index_expr(&mut self, _expr: &Expr, base: &Expr, index: &Expr) -> fmt::Result {
        self.write_expr(base, POSTFIX_PRECEDENCE)?;
        write!(self.string, "[")?;
        self.write_expr(index, 0)?;
        write!(self.string, "]")
    }

    fn visit_cond_expr(&mut self, _expr: &Expr, cond: &Expr, then_expr: &Expr, else_expr: &Expr) -> fmt::Result {
        let needs_parens = COND_PRECEDENCE < self.min_precedence;
        self.open_paren(needs_parens)?;
        self.write_expr(cond, COND_PRECEDENCE + 1)?;
        write!(self.string, " ? ")?;
        self.write_expr(then_expr, ASSIGN_PRECEDENCE)?;
        write!(self.string, " : ")?;
        self.write_expr(else_expr, COND_PRECEDENCE)?;
        self.close_paren(needs_parens)
    }

    fn visit_convert_expr(&mut self, expr: &Expr, operand: &Expr) -> fmt::Result {
        if let ExprKind::Lit(Lit::Int(value)) = operand.kind {
            return write!(self.string, "{}", PrettyPrintedFloat(value as f32));
        }
        match expr.ty {
            Some(ty) if self.backend.explicit_conversions() => {
                write!(self.string, "{}(", self.backend.type_name(ty))?;
                self.write_expr(operand, 0)?;
                write!(self.string, ")")
            }
            // Transparent: the operand takes this node's place, parentheses included.
            _ => operand.accept(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaderparser::parse;

    #[test]
    fn test_dialect_names() {
        for dialect in Dialect::all() {
            assert_eq!(dialect.as_str().parse::<Dialect>(), Ok(dialect));
        }
        assert_eq!("metal".parse::<Dialect>(), Err(UnknownDialect(String::from("metal"))));
        assert_eq!(Dialect::Es2.file_extension(), "frag");
    }

    #[test]
    fn test_usage() {
        let program =
            parse("param sampler s; void main() { color = paddedSample(s, pos0) * jsl_vertexColor; }").unwrap();
        let usage = Usage::collect(&program);
        assert!(usage.uses_padded_sample);
        assert!(usage.uses_builtin(BuiltinVar::Pos0));
        assert!(usage.uses_builtin(BuiltinVar::VertexColor));
        assert!(usage.uses_builtin(BuiltinVar::Color));
        assert!(!usage.uses_builtin(BuiltinVar::PixCoord));
    }
}
