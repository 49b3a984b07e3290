//! Recursive descent parser for JSL. Parsing, name resolution and type checking
//! happen in the same pass; diagnostics accumulate and the parser recovers so that
//! one run reports as many independent problems as possible.

use crate::detok::DeTokParser;
use crate::env::Env;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::function::{FuncId, Param};
use crate::ident::Ident;
use crate::lex::lex;
use crate::op::{BinaryOpType, UnaryOpType, COND_PRECEDENCE};
use crate::shaderast::*;
use crate::span::Span;
use crate::token::Token;
use crate::ty::{BaseType, Type};
use crate::ty_check::TyChecker;

/// Parses and type checks a whole program. Any diagnostic fails the parse; all
/// diagnostics are returned, ordered by position.
pub fn parse(code: &str) -> Result<ProgramUnit, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let mut tokens = Vec::new();
    for result in lex(code) {
        match result {
            Ok(token) => tokens.push(token),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    let parser = ShaderParser {
        tokens: DeTokParser::new(tokens),
        env: Env::new(),
        diagnostics,
        in_function: false,
        current_func: None,
        return_type: None,
        loop_depth: 0,
        calls: Vec::new(),
    };
    parser.parse_program_unit(code.len())
}

struct ShaderParser {
    tokens: DeTokParser,
    env: Env,
    diagnostics: Vec<Diagnostic>,
    in_function: bool,
    current_func: Option<FuncId>,
    /// Return type of the function being parsed; `None` when it is unknown.
    return_type: Option<Type>,
    loop_depth: usize,
    /// Calls between distinct user functions, for the recursion check.
    calls: Vec<Call>,
}

struct Call {
    caller: usize,
    callee: usize,
    span: Span,
}

impl ShaderParser {
    fn ty_checker(&mut self) -> TyChecker {
        TyChecker { env: &self.env, diagnostics: &mut self.diagnostics }
    }

    fn report(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(kind, span, message));
    }

    /// Records `diagnostic` and skips to a point where parsing can resume, making
    /// sure at least one token is consumed since `position`.
    fn recover(&mut self, diagnostic: Diagnostic, position: usize) {
        self.diagnostics.push(diagnostic);
        self.tokens.skip_to_sync();
        if self.tokens.position() == position {
            self.tokens.skip_token();
        }
    }

    fn parse_program_unit(mut self, code_len: usize) -> Result<ProgramUnit, Vec<Diagnostic>> {
        let mut decls = Vec::new();
        while self.tokens.peek_token() != Token::Eof {
            let position = self.tokens.position();
            match self.parse_ext_decl() {
                Ok(decl) => decls.push(decl),
                Err(diagnostic) => self.recover(diagnostic, position),
            }
        }

        let main = Ident::new("main");
        let has_main =
            decls.iter().any(|decl| matches!(decl, ExtDecl::Func(FuncDecl { name, body: Some(_), .. }) if *name == main));
        if !has_main {
            self.report(DiagnosticKind::MissingDefinition, Span::new(code_len, code_len), "program must define `void main()`");
        }
        let missing: Vec<Diagnostic> = self
            .env
            .undefined_functions()
            .map(|(span, func)| {
                Diagnostic::new(DiagnosticKind::MissingDefinition, span, format!("function `{}` is declared but never defined", func))
            })
            .collect();
        self.diagnostics.extend(missing);
        self.check_recursion();

        if !self.diagnostics.is_empty() {
            self.diagnostics.sort_by_key(|diagnostic| diagnostic.span.start);
            return Err(self.diagnostics);
        }
        let (funcs, vars) = self.env.into_arenas();
        Ok(ProgramUnit { decls, funcs, vars })
    }

    /// Neither GLSL nor HLSL allows recursion. Self calls are rejected while type
    /// checking; this catches cycles through other functions, reporting the first
    /// call in each function that leads back to itself.
    fn check_recursion(&mut self) {
        let mut reported = Vec::new();
        for call in &self.calls {
            if reported.contains(&call.caller) || !self.reaches(call.callee, call.caller) {
                continue;
            }
            reported.push(call.caller);
            let caller = self.env.function(FuncId::User(call.caller)).name();
            let callee = self.env.function(FuncId::User(call.callee)).name();
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnsupportedConstruct,
                call.span,
                format!("function `{}` calls itself through `{}`; recursion is not supported", caller, callee),
            ));
        }
    }

    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut seen = vec![from];
        let mut pending = vec![from];
        while let Some(func) = pending.pop() {
            for call in self.calls.iter().filter(|call| call.caller == func) {
                if call.callee == to {
                    return true;
                }
                if !seen.contains(&call.callee) {
                    seen.push(call.callee);
                    pending.push(call.callee);
                }
            }
        }
        false
    }

    fn parse_ext_decl(&mut self) -> Result<ExtDecl, Diagnostic> {
        let start = self.tokens.peek_span().start;
        let span = self.tokens.begin_span();
        let qualifier = self.parse_qualifier();
        let precision = self.parse_precision();
        let ty_expr = self.parse_ty_expr()?;
        let name_span = self.tokens.peek_span();
        let name = self.tokens.parse_ident()?;
        if self.tokens.peek_token() == Token::LeftParen {
            if qualifier.is_some() || precision.is_some() {
                return Err(span.error(&self.tokens, DiagnosticKind::SyntaxError, format!("function `{}` cannot have qualifiers", name)));
            }
            let header_span = span.end(&self.tokens);
            return Ok(ExtDecl::Func(self.parse_func_decl(header_span, ty_expr, name)?));
        }
        Ok(ExtDecl::Var(self.parse_var_decl_rest(start, qualifier, precision, ty_expr, name, name_span)?))
    }

    fn parse_qualifier(&mut self) -> Option<Qualifier> {
        let qualifier = match self.tokens.peek_token() {
            Token::Const => Qualifier::Const,
            Token::Param => Qualifier::Param,
            _ => return None,
        };
        self.tokens.skip_token();
        Some(qualifier)
    }

    fn parse_precision(&mut self) -> Option<Precision> {
        let precision = match self.tokens.peek_token() {
            Token::Lowp => Precision::Low,
            Token::Mediump => Precision::Medium,
            Token::Highp => Precision::High,
            _ => return None,
        };
        self.tokens.skip_token();
        Some(precision)
    }

    /// A type name. Unknown names are reported but parsing carries on with an
    /// unresolved type.
    fn parse_ty_expr(&mut self) -> Result<TyExpr, Diagnostic> {
        let span = self.tokens.peek_span();
        match self.tokens.peek_token() {
            Token::Type(ty) => {
                self.tokens.skip_token();
                Ok(TyExpr { span, name: Ident::new(ty.to_string()), ty: Some(ty) })
            }
            Token::Ident(name) => {
                self.tokens.skip_token();
                self.report(DiagnosticKind::UnknownType, span, format!("unknown type `{}`", name));
                Ok(TyExpr { span, name, ty: None })
            }
            token => Err(self.tokens.error(format!("expected type, unexpected token `{}`", token))),
        }
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, Diagnostic> {
        let start = self.tokens.peek_span().start;
        let qualifier = self.parse_qualifier();
        let precision = self.parse_precision();
        let ty_expr = self.parse_ty_expr()?;
        let name_span = self.tokens.peek_span();
        let name = self.tokens.parse_ident()?;
        self.parse_var_decl_rest(start, qualifier, precision, ty_expr, name, name_span)
    }

    fn parse_var_decl_rest(
        &mut self,
        start: usize,
        qualifier: Option<Qualifier>,
        precision: Option<Precision>,
        ty_expr: TyExpr,
        first_name: Ident,
        first_name_span: Span,
    ) -> Result<VarDecl, Diagnostic> {
        let kind = match qualifier {
            Some(Qualifier::Const) => VarKind::Const,
            Some(Qualifier::Param) => VarKind::Param,
            None if self.in_function => VarKind::Local,
            None => VarKind::Global,
        };
        if kind == VarKind::Param && self.in_function {
            self.report(DiagnosticKind::SyntaxError, first_name_span, "`param` variables must be declared at global scope");
        }
        let mut ty = ty_expr.ty;
        match ty {
            Some(Type::VOID) => {
                self.report(DiagnosticKind::TypeMismatch, ty_expr.span, "variables cannot have type `void`");
                ty = None;
            }
            Some(sampler) if sampler.is_sampler() && (self.in_function || kind == VarKind::Const) => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    ty_expr.span,
                    "samplers can only be declared as globals or function parameters",
                );
            }
            _ => {}
        }

        let mut declarators = Vec::new();
        let (mut name, mut name_span) = (first_name, first_name_span);
        loop {
            let array_size = if self.tokens.accept_token(Token::LeftBracket) { Some(self.parse_array_size()?) } else { None };
            let init = if self.tokens.accept_token(Token::BinOp(BinaryOpType::Assign)) {
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            let span = Span::new(name_span.start, self.tokens.end());

            match (kind, &init) {
                (VarKind::Const, None) => {
                    self.report(DiagnosticKind::SyntaxError, span, format!("constant `{}` must be initialized", name))
                }
                (VarKind::Param, Some(_)) => {
                    self.report(DiagnosticKind::SyntaxError, span, format!("param `{}` cannot have an initializer", name))
                }
                _ => {}
            }
            if array_size.is_some() && init.is_some() {
                self.report(DiagnosticKind::SyntaxError, span, format!("array `{}` cannot have an initializer", name));
            }
            let init = match (init, ty) {
                (Some(_), Some(ty)) if ty.is_sampler() => {
                    self.report(DiagnosticKind::SyntaxError, span, format!("sampler `{}` cannot have an initializer", name));
                    None
                }
                (Some(init), Some(ty)) => {
                    Some(self.ty_checker().convert_to(init, ty, &format!("in the initializer of `{}`", name)))
                }
                (init, _) => init,
            };

            // Declared after the initializer, so `float x = x;` refers to an outer `x`.
            let (var, result) = self.env.insert_var(Variable { span, name, ty, kind, array_size, precision });
            if let Err(diagnostic) = result {
                self.diagnostics.push(diagnostic);
            }
            declarators.push(Declarator { span, name, var, array_size, init });

            if !self.tokens.accept_token(Token::Comma) {
                break;
            }
            name_span = self.tokens.peek_span();
            name = self.tokens.parse_ident()?;
        }
        self.tokens.expect_token(Token::Semi)?;
        Ok(VarDecl { span: Span::new(start, self.tokens.end()), qualifier, precision, ty_expr, declarators })
    }

    fn parse_array_size(&mut self) -> Result<u32, Diagnostic> {
        let size = match self.tokens.peek_token() {
            Token::Lit(crate::lit::Lit::Int(size)) if size > 0 => size as u32,
            token => return Err(self.tokens.error(format!("array size must be a positive integer literal, found `{}`", token))),
        };
        self.tokens.skip_token();
        self.tokens.expect_token(Token::RightBracket)?;
        Ok(size)
    }

    fn parse_func_decl(&mut self, header_span: Span, return_ty_expr: TyExpr, name: Ident) -> Result<FuncDecl, Diagnostic> {
        self.tokens.expect_token(Token::LeftParen)?;
        self.env.push_scope();
        let result = self.parse_func_decl_rest(header_span, return_ty_expr, name);
        self.env.pop_scope();
        self.in_function = false;
        self.current_func = None;
        self.return_type = None;
        result
    }

    fn parse_func_decl_rest(&mut self, header_span: Span, return_ty_expr: TyExpr, name: Ident) -> Result<FuncDecl, Diagnostic> {
        let mut params = Vec::new();
        if !self.tokens.accept_token(Token::RightParen) {
            loop {
                let span = self.tokens.begin_span();
                let ty_expr = self.parse_ty_expr()?;
                let param_name = self.tokens.parse_ident()?;
                let span = span.end(&self.tokens);
                let mut ty = ty_expr.ty;
                if ty == Some(Type::VOID) {
                    self.report(DiagnosticKind::TypeMismatch, ty_expr.span, "parameters cannot have type `void`");
                    ty = None;
                }
                let (var, result) = self.env.insert_var(Variable {
                    span,
                    name: param_name,
                    ty,
                    kind: VarKind::FnParam,
                    array_size: None,
                    precision: None,
                });
                if let Err(diagnostic) = result {
                    self.diagnostics.push(diagnostic);
                }
                params.push(ParamDecl { span, ty_expr, name: param_name, var });
                if !self.tokens.accept_token(Token::Comma) {
                    break;
                }
            }
            self.tokens.expect_token(Token::RightParen)?;
        }
        let header_span = Span::new(header_span.start, self.tokens.end());
        let is_definition = self.tokens.peek_token() == Token::LeftBrace;

        let signature: Option<Vec<Param>> = params
            .iter()
            .map(|param: &ParamDecl| self.env.variable(param.var).ty.map(|ty| Param { name: param.name, ty }))
            .collect();
        let func = match (return_ty_expr.ty, signature) {
            (Some(return_type), Some(signature)) => {
                match self.env.declare_function(header_span, name, return_type, signature, is_definition) {
                    Ok(func) => Some(func),
                    Err(diagnostic) => {
                        self.diagnostics.push(diagnostic);
                        None
                    }
                }
            }
            _ => None,
        };

        let is_main = name == Ident::new("main");
        if is_main && (return_ty_expr.ty != Some(Type::VOID) || !params.is_empty()) {
            self.report(DiagnosticKind::TypeMismatch, header_span, "`main` must be declared as `void main()`");
        }

        if !is_definition {
            self.tokens.expect_token(Token::Semi)?;
            return Ok(FuncDecl { span: header_span, func, return_ty_expr, name, params, body: None });
        }

        if is_main {
            for builtin in BuiltinVar::ALL {
                let (_, result) = self.env.insert_var(Variable {
                    span: header_span,
                    name: Ident::new(builtin.name()),
                    ty: Some(builtin.ty()),
                    kind: VarKind::Builtin(builtin),
                    array_size: None,
                    precision: None,
                });
                if let Err(diagnostic) = result {
                    self.diagnostics.push(diagnostic);
                }
            }
        }
        self.in_function = true;
        self.current_func = func;
        self.return_type = return_ty_expr.ty;
        // Parameters and the outermost body statements share one scope.
        let body = self.parse_block_in_scope()?;
        Ok(FuncDecl { span: Span::new(header_span.start, self.tokens.end()), func, return_ty_expr, name, params, body: Some(body) })
    }

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        self.env.push_scope();
        let result = self.parse_block_in_scope();
        self.env.pop_scope();
        result
    }

    fn parse_block_in_scope(&mut self) -> Result<Block, Diagnostic> {
        let span = self.tokens.begin_span();
        self.tokens.expect_token(Token::LeftBrace)?;
        let mut stmts = Vec::new();
        loop {
            match self.tokens.peek_token() {
                Token::RightBrace => {
                    self.tokens.skip_token();
                    break;
                }
                Token::Eof => return Err(self.tokens.error(String::from("expected `}`, unexpected end of input"))),
                _ => {}
            }
            let position = self.tokens.position();
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(diagnostic) => self.recover(diagnostic, position),
            }
        }
        Ok(Block { span: span.end(&self.tokens), stmts })
    }

    /// The body of an `if`, `else` or `for`, which gets a scope of its own even
    /// without braces.
    fn parse_sub_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        self.env.push_scope();
        let result = self.parse_stmt();
        self.env.pop_scope();
        result
    }

    fn is_var_decl_start(&self) -> bool {
        match self.tokens.peek_token() {
            Token::Const | Token::Param | Token::Lowp | Token::Mediump | Token::Highp | Token::Type(_) => true,
            Token::Ident(_) => matches!(self.tokens.peek_token_at(1), Token::Ident(_)),
            _ => false,
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        if self.is_var_decl_start() {
            return Ok(Stmt::Decl(self.parse_var_decl()?));
        }
        let span = self.tokens.begin_span();
        match self.tokens.peek_token() {
            Token::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::If => self.parse_if_stmt(),
            Token::For => self.parse_for_stmt(),
            token @ (Token::While | Token::Do) => {
                Err(self.tokens.error(format!("`{}` loops are not supported, only counted `for` loops", token)))
            }
            Token::Return => {
                self.tokens.skip_token();
                let expr = if self.tokens.peek_token() == Token::Semi { None } else { Some(self.parse_expr()?) };
                self.tokens.expect_token(Token::Semi)?;
                let span = span.end(&self.tokens);
                let expr = self.check_return(span, expr);
                Ok(Stmt::Return { span, expr })
            }
            Token::Break | Token::Continue => {
                let token = self.tokens.peek_token();
                self.tokens.skip_token();
                self.tokens.expect_token(Token::Semi)?;
                let span = span.end(&self.tokens);
                if self.loop_depth == 0 {
                    self.report(DiagnosticKind::SyntaxError, span, format!("`{}` outside of a loop", token));
                }
                Ok(if token == Token::Break { Stmt::Break { span } } else { Stmt::Continue { span } })
            }
            Token::Discard => {
                self.tokens.skip_token();
                self.tokens.expect_token(Token::Semi)?;
                Ok(Stmt::Discard { span: span.end(&self.tokens) })
            }
            Token::Semi => {
                self.tokens.skip_token();
                Ok(Stmt::Empty { span: span.end(&self.tokens) })
            }
            _ => {
                let expr = self.parse_expr()?;
                self.tokens.expect_token(Token::Semi)?;
                Ok(Stmt::Expr { span: span.end(&self.tokens), expr })
            }
        }
    }

    fn check_return(&mut self, span: Span, expr: Option<Expr>) -> Option<Expr> {
        match (self.return_type, expr) {
            (Some(Type::VOID), Some(expr)) => {
                self.report(DiagnosticKind::TypeMismatch, span, "a `void` function cannot return a value");
                Some(expr)
            }
            (Some(return_type), Some(expr)) => Some(self.ty_checker().convert_to(expr, return_type, "as return value")),
            (Some(return_type), None) if return_type != Type::VOID => {
                self.report(DiagnosticKind::TypeMismatch, span, format!("expected a return value of type `{}`", return_type));
                None
            }
            (_, expr) => expr,
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        if let Some(ty) = cond.ty {
            if ty != Type::BOOL {
                self.report(DiagnosticKind::TypeMismatch, cond.span, format!("condition must be `bool`, found `{}`", ty));
            }
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.tokens.begin_span();
        self.tokens.expect_token(Token::If)?;
        self.tokens.expect_token(Token::LeftParen)?;
        let cond = self.parse_expr()?;
        self.tokens.expect_token(Token::RightParen)?;
        self.check_condition(&cond);
        let then_stmt = Box::new(self.parse_sub_stmt()?);
        let else_stmt = if self.tokens.accept_token(Token::Else) { Some(Box::new(self.parse_sub_stmt()?)) } else { None };
        Ok(Stmt::If { span: span.end(&self.tokens), cond, then_stmt, else_stmt })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        self.env.push_scope();
        let result = self.parse_for_stmt_in_scope();
        self.env.pop_scope();
        result
    }

    fn parse_for_stmt_in_scope(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.tokens.begin_span();
        self.tokens.expect_token(Token::For)?;
        self.tokens.expect_token(Token::LeftParen)?;

        let init = if self.is_var_decl_start() {
            Stmt::Decl(self.parse_var_decl()?)
        } else {
            let init_span = self.tokens.begin_span();
            let expr = self.parse_expr()?;
            self.tokens.expect_token(Token::Semi)?;
            Stmt::Expr { span: init_span.end(&self.tokens), expr }
        };
        let loop_var = self.check_loop_init(&init);

        let cond = self.parse_expr()?;
        self.tokens.expect_token(Token::Semi)?;
        self.check_condition(&cond);
        let step = self.parse_expr()?;
        self.tokens.expect_token(Token::RightParen)?;
        if let Some(loop_var) = loop_var {
            self.check_loop_cond(&cond, loop_var);
            self.check_loop_step(&step, loop_var);
        }

        self.loop_depth += 1;
        let body = self.parse_sub_stmt();
        self.loop_depth -= 1;
        Ok(Stmt::For { span: span.end(&self.tokens), init: Box::new(init), cond, step, body: Box::new(body?) })
    }

    /// The loop initializer must declare or assign exactly one numeric scalar.
    fn check_loop_init(&mut self, init: &Stmt) -> Option<VarId> {
        let var = match init {
            Stmt::Decl(VarDecl { declarators, .. }) if declarators.len() == 1 && declarators[0].init.is_some() => {
                Some(declarators[0].var)
            }
            Stmt::Expr { expr: Expr { kind: ExprKind::Assign { op: BinaryOpType::Assign, lhs, .. }, .. }, .. } => {
                match lhs.kind {
                    ExprKind::Var { var, .. } => var,
                    _ => None,
                }
            }
            _ => None,
        };
        let is_counter = |ty: Option<Type>| matches!(ty, Some(Type::INT) | Some(Type::FLOAT));
        match var {
            Some(var) if is_counter(self.env.variable(var).ty) => Some(var),
            _ => {
                self.report(
                    DiagnosticKind::SyntaxError,
                    init.span(),
                    "`for` loop must start by initializing a single int or float counter",
                );
                None
            }
        }
    }

    fn check_loop_cond(&mut self, cond: &Expr, loop_var: VarId) {
        let is_valid = match &cond.kind {
            ExprKind::Bin { op, left, right } => op.is_comparison() && (is_var(left, loop_var) || is_var(right, loop_var)),
            _ => false,
        };
        if !is_valid {
            self.report(DiagnosticKind::SyntaxError, cond.span, "`for` loop condition must compare the loop counter");
        }
    }

    fn check_loop_step(&mut self, step: &Expr, loop_var: VarId) {
        let is_valid = match &step.kind {
            ExprKind::Un { op, expr } => op.modifies_operand() && is_var(expr, loop_var),
            ExprKind::Assign { op: BinaryOpType::AddAssign | BinaryOpType::SubAssign, lhs, .. } => is_var(lhs, loop_var),
            _ => false,
        };
        if !is_valid {
            self.report(
                DiagnosticKind::SyntaxError,
                step.span,
                "`for` loop step must be `++`, `--`, `+=` or `-=` on the loop counter",
            );
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_assign_expr()
    }

    fn parse_assign_expr(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        let lhs = self.parse_cond_expr()?;
        match self.tokens.peek_token() {
            Token::BinOp(op) if op.modifies_lhs() => {
                self.tokens.skip_token();
                let rhs = self.parse_assign_expr()?;
                let span = span.end(&self.tokens);
                Ok(self.ty_checker().ty_check_assign_expr(span, op, lhs, rhs))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_cond_expr(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        let cond = self.parse_bin_expr(COND_PRECEDENCE + 1)?;
        if !self.tokens.accept_token(Token::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_expr()?;
        self.tokens.expect_token(Token::Colon)?;
        let else_expr = self.parse_cond_expr()?;
        let span = span.end(&self.tokens);
        Ok(self.ty_checker().ty_check_cond_expr(span, cond, then_expr, else_expr))
    }

    /// Precedence climbing over the non-assigning binary operators.
    fn parse_bin_expr(&mut self, min_precedence: u8) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        let mut left = self.parse_un_expr()?;
        loop {
            let op = match self.tokens.peek_token() {
                Token::BinOp(op) if !op.modifies_lhs() && op.precedence() >= min_precedence => op,
                _ => break,
            };
            self.tokens.skip_token();
            let right = self.parse_bin_expr(op.precedence() + 1)?;
            let span = span.end(&self.tokens);
            left = self.ty_checker().ty_check_bin_expr(span, op, left, right);
        }
        Ok(left)
    }

    fn parse_un_expr(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        let op = match self.tokens.peek_token() {
            Token::BinOp(BinaryOpType::Sub) => UnaryOpType::Neg,
            Token::Not => UnaryOpType::Not,
            Token::Tilde => UnaryOpType::BitNot,
            Token::Inc => UnaryOpType::PreInc,
            Token::Dec => UnaryOpType::PreDec,
            _ => return self.parse_postfix_expr(),
        };
        self.tokens.skip_token();
        let operand = self.parse_un_expr()?;
        let span = span.end(&self.tokens);
        Ok(self.ty_checker().ty_check_un_expr(span, op, operand))
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        let mut expr = self.parse_prim_expr()?;
        loop {
            match self.tokens.peek_token() {
                Token::Dot => {
                    self.tokens.skip_token();
                    let field = self.tokens.parse_ident()?;
                    let span = span.end(&self.tokens);
                    expr = self.ty_checker().ty_check_field_expr(span, expr, field);
                }
                Token::LeftBracket => {
                    self.tokens.skip_token();
                    let index = self.parse_expr()?;
                    self.tokens.expect_token(Token::RightBracket)?;
                    let span = span.end(&self.tokens);
                    expr = self.ty_checker().ty_check_index_expr(span, expr, index);
                }
                token @ (Token::Inc | Token::Dec) => {
                    self.tokens.skip_token();
                    let op = if token == Token::Inc { UnaryOpType::PostInc } else { UnaryOpType::PostDec };
                    let span = span.end(&self.tokens);
                    expr = self.ty_checker().ty_check_un_expr(span, op, expr);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, Diagnostic> {
        self.tokens.expect_token(Token::LeftParen)?;
        let mut args = Vec::new();
        if self.tokens.accept_token(Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assign_expr()?);
            if !self.tokens.accept_token(Token::Comma) {
                break;
            }
        }
        self.tokens.expect_token(Token::RightParen)?;
        Ok(args)
    }

    fn parse_prim_expr(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.tokens.begin_span();
        match self.tokens.peek_token() {
            Token::Lit(lit) => {
                self.tokens.skip_token();
                Ok(Expr::new(span.end(&self.tokens), Some(lit.ty()), ExprKind::Lit(lit)))
            }
            Token::Ident(name) => {
                self.tokens.skip_token();
                if self.tokens.peek_token() == Token::LeftParen {
                    let args = self.parse_args()?;
                    let span = span.end(&self.tokens);
                    let current_func = self.current_func;
                    let expr = self.ty_checker().ty_check_call_expr(span, name, args, current_func);
                    if let (Some(FuncId::User(caller)), ExprKind::Call { func: Some(FuncId::User(callee)), .. }) =
                        (current_func, &expr.kind)
                    {
                        if caller != *callee {
                            self.calls.push(Call { caller, callee: *callee, span });
                        }
                    }
                    return Ok(expr);
                }
                let span = span.end(&self.tokens);
                Ok(self.parse_var_expr(span, name))
            }
            Token::Type(ty) => {
                self.tokens.skip_token();
                let args = self.parse_args()?;
                let span = span.end(&self.tokens);
                Ok(self.ty_checker().ty_check_cons_expr(span, ty, args))
            }
            Token::LeftParen => {
                self.tokens.skip_token();
                let expr = self.parse_expr()?;
                self.tokens.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            token => Err(self.tokens.error(format!("expected expression, unexpected token `{}`", token))),
        }
    }

    fn parse_var_expr(&mut self, span: Span, name: Ident) -> Expr {
        let var = match self.env.find_var(name) {
            Some(var) => var,
            None => {
                self.report(DiagnosticKind::UnknownIdentifier, span, format!("unknown identifier `{}`", name));
                return Expr::new(span, None, ExprKind::Var { name, var: None });
            }
        };
        let (mut ty, is_array) = {
            let variable = self.env.variable(var);
            (variable.ty, variable.array_size.is_some())
        };
        if is_array && self.tokens.peek_token() != Token::LeftBracket {
            self.report(DiagnosticKind::TypeMismatch, span, format!("array `{}` must be indexed", name));
            ty = None;
        }
        if ty.map_or(false, |ty| ty.base_type() == BaseType::Void) {
            ty = None;
        }
        Expr::new(span, ty, ExprKind::Var { name, var: Some(var) })
    }
}

fn is_var(expr: &Expr, var: VarId) -> bool {
    matches!(expr.unconverted().kind, ExprKind::Var { var: Some(other), .. } if other == var)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<DiagnosticKind> {
        parse(code).err().unwrap_or_default().into_iter().map(|diagnostic| diagnostic.kind).collect()
    }

    #[test]
    fn test_minimal_program() {
        let program = parse("void main() { color = float4(1.0); }").unwrap();
        assert_eq!(program.decls().len(), 1);
        assert!(program.find_func_decl("main").is_some());
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(kinds("float f() { return 1.0; }"), vec![DiagnosticKind::MissingDefinition]);
        assert_eq!(kinds("int main() { return 0; }"), vec![DiagnosticKind::TypeMismatch]);
    }

    #[test]
    fn test_precedence() {
        let program = parse("void main() { int a = 1 + 2 * 3 << 1 & 7; bool b = 1 < 2 == true; }").unwrap();
        let text = program.to_string();
        assert!(text.contains("int a = 1 + 2 * 3 << 1 & 7;"), "{}", text);
        let program = parse("void main() { int a = (1 + 2) * 3; float x; float y; x = y = 1.0; }").unwrap();
        let text = program.to_string();
        assert!(text.contains("int a = (1 + 2) * 3;"), "{}", text);
        assert!(text.contains("x = y = 1.0;"), "{}", text);
    }

    #[test]
    fn test_implicit_conversion() {
        let program = parse("void main() { float x = 1; float2 v = float2(1.0) * 2; }").unwrap();
        let main = program.find_func_decl("main").unwrap();
        let body = main.body.as_ref().unwrap();
        match &body.stmts[0] {
            Stmt::Decl(decl) => {
                let init = decl.declarators[0].init.as_ref().unwrap();
                assert!(matches!(init.kind, ExprKind::Convert { .. }));
                assert_eq!(init.ty, Some(Type::FLOAT));
            }
            stmt => panic!("unexpected statement {:?}", stmt),
        }
    }

    #[test]
    fn test_error_recovery() {
        assert_eq!(kinds("void main() { float x = a; float y = b; }"), vec![
            DiagnosticKind::UnknownIdentifier,
            DiagnosticKind::UnknownIdentifier
        ]);
        assert_eq!(kinds("void main() { float x = ; float y = b; }"), vec![
            DiagnosticKind::SyntaxError,
            DiagnosticKind::UnknownIdentifier
        ]);
        // One report for the bad operand, none for the expressions around it.
        assert_eq!(kinds("void main() { float x = (true + 1.0) * 2.0 + 3.0; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float x = 1.0 $ 2.0; }"), vec![DiagnosticKind::LexError, DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { int x = -2147483648; float y = 0x1FFFFFFFF + 1.0; }"), vec![
            DiagnosticKind::LexError,
            DiagnosticKind::LexError
        ]);
    }

    #[test]
    fn test_lvalues() {
        assert_eq!(kinds("param float p; void main() { p = 1.0; }"), vec![DiagnosticKind::InvalidLvalue]);
        assert_eq!(kinds("const float k = 1.0; void main() { k += 1.0; }"), vec![DiagnosticKind::InvalidLvalue]);
        assert_eq!(kinds("void main() { pos0 = float2(0.0); }"), vec![DiagnosticKind::InvalidLvalue]);
        assert_eq!(kinds("void main() { color.xx = float2(0.0); }"), vec![DiagnosticKind::InvalidLvalue]);
        assert_eq!(kinds("void main() { (color) = float4(0.0); color.xy = pos0; }"), vec![]);
        assert_eq!(kinds("void main() { 1.0 = 2.0; }"), vec![DiagnosticKind::InvalidLvalue]);
    }

    #[test]
    fn test_builtins_only_in_main() {
        assert_eq!(kinds("float2 f() { return pos0; } void main() {}"), vec![DiagnosticKind::UnknownIdentifier]);
    }

    #[test]
    fn test_declarations() {
        assert_eq!(kinds("const float k; void main() {}"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("param float p = 1.0; void main() {}"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { sampler s; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { void v; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float x; float x; }"), vec![DiagnosticKind::Redefinition]);
        assert_eq!(kinds("void main() { float x; { float x; } }"), vec![]);
        assert_eq!(kinds("void main() { float a[0]; }"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { vec3 v; }"), vec![DiagnosticKind::UnknownType]);
    }

    #[test]
    fn test_functions() {
        assert_eq!(kinds("float f(float x); void main() {}"), vec![DiagnosticKind::MissingDefinition]);
        assert_eq!(kinds("float f(float x); void main() { float y = f(1); } float f(float x) { return x; }"), vec![]);
        assert_eq!(kinds("float f(float x) { return f(x); } void main() {}"), vec![DiagnosticKind::UnsupportedConstruct]);
        assert_eq!(kinds("float f() { return 1.0; } float f() { return 2.0; } void main() {}"), vec![
            DiagnosticKind::Redefinition
        ]);
        assert_eq!(kinds("void main() { float x = sin(1.0, 2.0); }"), vec![DiagnosticKind::ArityMismatch]);
        assert_eq!(kinds("void main() { float x = sin(true); }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float x = nope(1.0); }"), vec![DiagnosticKind::UnknownIdentifier]);
        assert_eq!(kinds("void f() { return 1.0; } void main() {}"), vec![DiagnosticKind::TypeMismatch]);
    }

    #[test]
    fn test_mutual_recursion() {
        let code = "float f(float x);
                    float g(float x) { return f(x); }
                    float f(float x) { return g(x); }
                    void main() { color = float4(f(1.0)); }";
        let diagnostics = parse(code).unwrap_err();
        let actual_kinds: Vec<_> = diagnostics.iter().map(|diagnostic| diagnostic.kind).collect();
        assert_eq!(actual_kinds, vec![DiagnosticKind::UnsupportedConstruct, DiagnosticKind::UnsupportedConstruct]);
        assert_eq!(&code[diagnostics[0].span.start..diagnostics[0].span.end], "f(x)");

        let chain = "float h(float x) { return x; }
                     float g(float x) { return h(x); }
                     float f(float x) { return g(x) + h(x); }
                     void main() { color = float4(f(1.0)); }";
        assert_eq!(kinds(chain), vec![]);
    }

    #[test]
    fn test_counted_loops() {
        assert_eq!(kinds("void main() { for (int i = 0; i < 4; i++) { color.x += 1.0; } }"), vec![]);
        assert_eq!(kinds("void main() { float i; for (i = 0.0; i < 4.0; i += 1.0) { break; } }"), vec![]);
        assert_eq!(kinds("void main() { for (int i = 0; true; i++) {} }"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { for (int i = 0; i < 4; i *= 2) {} }"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { while (true) {} }"), vec![DiagnosticKind::SyntaxError]);
        assert_eq!(kinds("void main() { break; }"), vec![DiagnosticKind::SyntaxError]);
    }

    #[test]
    fn test_vectors() {
        assert_eq!(kinds("void main() { float3 v = float3(1.0, 2.0, 3.0); float2 w = v.zx; float s = v[1]; }"), vec![]);
        assert_eq!(kinds("void main() { float3 v = float3(1.0, 2.0); }"), vec![DiagnosticKind::ArityMismatch]);
        assert_eq!(kinds("void main() { float3 v = float3(0.0); float4 w = v.xyzw; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float3 v = float3(0.0); float2 w = v.xg; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float f = 1.0; float2 w = f.xx; }"), vec![]);
        assert_eq!(kinds("void main() { float a[2]; float b = a[1]; float c = a; }"), vec![DiagnosticKind::TypeMismatch]);
        assert_eq!(kinds("void main() { float a[2]; float b = a[2]; }"), vec![DiagnosticKind::TypeMismatch]);
    }
}
