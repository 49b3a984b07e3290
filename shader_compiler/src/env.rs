use crate::builtin::{intrinsic_candidates, intrinsics};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::function::{resolve_overload, FuncId, Function, LookupError, Param};
use crate::ident::Ident;
use crate::shaderast::{VarId, Variable};
use crate::span::Span;
use crate::ty::Type;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

type Scope = HashMap<Ident, VarId>;

/// Symbol table for one compilation: the variable and user function arenas plus
/// the stack of lexical scopes. Dropped (or turned into a
/// [`crate::shaderast::ProgramUnit`]) when parsing ends.
#[derive(Debug, Default)]
pub(crate) struct Env {
    scopes: Vec<Scope>,
    vars: Vec<Variable>,
    funcs: Vec<UserFunc>,
}

#[derive(Debug)]
struct UserFunc {
    func: Function,
    span: Span,
    is_defined: bool,
}

impl Env {
    pub(crate) fn new() -> Self {
        Env { scopes: vec![Scope::new()], ..Default::default() }
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::new())
    }

    pub(crate) fn pop_scope(&mut self) {
        // The global scope is never popped.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn find_var(&self, name: Ident) -> Option<VarId> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name).copied())
    }

    pub(crate) fn variable(&self, id: VarId) -> &Variable {
        &self.vars[id.0]
    }

    /// Adds a variable to the innermost scope. The variable is kept in the arena
    /// even when its name clashes, so the declaration still has a handle.
    pub(crate) fn insert_var(&mut self, variable: Variable) -> (VarId, Result<(), Diagnostic>) {
        let id = VarId(self.vars.len());
        let (span, name) = (variable.span, variable.name);
        self.vars.push(variable);
        let result = match self.scopes.last_mut().map(|scope| scope.entry(name)) {
            None => Err(Diagnostic::new(DiagnosticKind::InternalError, span, "no scope to declare in")),
            Some(Entry::Vacant(entry)) => {
                entry.insert(id);
                Ok(())
            }
            Some(Entry::Occupied(_)) => Err(Diagnostic::new(
                DiagnosticKind::Redefinition,
                span,
                format!("`{}` is already defined in this scope", name),
            )),
        };
        (id, result)
    }

    pub(crate) fn function(&self, id: FuncId) -> &Function {
        match id {
            FuncId::Intrinsic(index) => &intrinsics()[index],
            FuncId::User(index) => &self.funcs[index].func,
        }
    }

    /// Registers a user function signature. A prototype and a definition with the
    /// same signature share one [`FuncId`].
    pub(crate) fn declare_function(
        &mut self,
        span: Span,
        name: Ident,
        return_type: Type,
        params: Vec<Param>,
        is_definition: bool,
    ) -> Result<FuncId, Diagnostic> {
        let func = Function::new_user(name, return_type, params);
        if intrinsics().contains(&func) {
            return Err(Diagnostic::new(
                DiagnosticKind::Redefinition,
                span,
                format!("`{}` redefines an intrinsic function", func),
            ));
        }
        let same_params =
            |other: &Function| other.name() == name && other.params().len() == func.params().len() && other.param_types().eq(func.param_types());
        if let Some(other) = intrinsics().iter().chain(self.funcs.iter().map(|user| &user.func)).find(|other| same_params(other)) {
            if other.return_type() != return_type {
                return Err(Diagnostic::new(
                    DiagnosticKind::Redefinition,
                    span,
                    format!("`{}` conflicts with `{}`: overloads may not differ only in return type", func, other),
                ));
            }
        }
        if let Some(index) = self.funcs.iter().position(|user| user.func == func) {
            let user = &mut self.funcs[index];
            if is_definition {
                if user.is_defined {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Redefinition,
                        span,
                        format!("function `{}` is already defined", func),
                    ));
                }
                user.is_defined = true;
            }
            return Ok(FuncId::User(index));
        }
        self.funcs.push(UserFunc { func, span, is_defined: is_definition });
        Ok(FuncId::User(self.funcs.len() - 1))
    }

    pub(crate) fn lookup_function(&self, name: Ident, arg_types: &[Type]) -> Result<FuncId, LookupError> {
        let intrinsics = intrinsic_candidates().map(|(id, func)| (id, func as &Function));
        let user = self.funcs.iter().enumerate().map(|(index, user)| (FuncId::User(index), &user.func));
        resolve_overload(intrinsics.chain(user), name, arg_types)
    }

    pub(crate) fn has_function_named(&self, name: Ident) -> bool {
        self.all_functions().any(|func| func.name() == name)
    }

    pub(crate) fn has_function_with_arity(&self, name: Ident, arity: usize) -> bool {
        self.all_functions().any(|func| func.name() == name && func.params().len() == arity)
    }

    fn all_functions(&self) -> impl Iterator<Item = &Function> {
        intrinsics().iter().chain(self.funcs.iter().map(|user| &user.func))
    }

    /// Prototypes that never got a body.
    pub(crate) fn undefined_functions(&self) -> impl Iterator<Item = (Span, &Function)> {
        self.funcs.iter().filter(|user| !user.is_defined).map(|user| (user.span, &user.func))
    }

    pub(crate) fn into_arenas(self) -> (Vec<Function>, Vec<Variable>) {
        (self.funcs.into_iter().map(|user| user.func).collect(), self.vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaderast::VarKind;

    fn local(name: &str) -> Variable {
        Variable {
            span: Span::default(),
            name: Ident::new(name),
            ty: Some(Type::FLOAT),
            kind: VarKind::Local,
            array_size: None,
            precision: None,
        }
    }

    #[test]
    fn test_scopes() {
        let mut env = Env::new();
        let (outer, result) = env.insert_var(local("x"));
        assert!(result.is_ok());
        env.push_scope();
        let (inner, result) = env.insert_var(local("x"));
        assert!(result.is_ok());
        assert_eq!(env.find_var(Ident::new("x")), Some(inner));
        let (_, result) = env.insert_var(local("x"));
        assert_eq!(result.unwrap_err().kind, DiagnosticKind::Redefinition);
        env.pop_scope();
        assert_eq!(env.find_var(Ident::new("x")), Some(outer));
        env.pop_scope();
        assert_eq!(env.find_var(Ident::new("x")), Some(outer));
    }

    #[test]
    fn test_prototype_then_definition() {
        let mut env = Env::new();
        let name = Ident::new("helper");
        let params = vec![Param::new("v", Type::FLOAT2)];
        let prototype = env.declare_function(Span::default(), name, Type::FLOAT, params.clone(), false).unwrap();
        assert_eq!(env.undefined_functions().count(), 1);
        let definition = env.declare_function(Span::default(), name, Type::FLOAT, params.clone(), true).unwrap();
        assert_eq!(prototype, definition);
        assert_eq!(env.undefined_functions().count(), 0);
        let error = env.declare_function(Span::default(), name, Type::FLOAT, params, true).unwrap_err();
        assert_eq!(error.kind, DiagnosticKind::Redefinition);
    }

    #[test]
    fn test_intrinsic_shadowing_policy() {
        let mut env = Env::new();
        let sin = Ident::new("sin");
        let error = env.declare_function(Span::default(), sin, Type::FLOAT, vec![Param::new("x", Type::FLOAT)], true);
        assert_eq!(error.unwrap_err().kind, DiagnosticKind::Redefinition);
        let error = env.declare_function(Span::default(), sin, Type::INT, vec![Param::new("x", Type::FLOAT)], true);
        assert_eq!(error.unwrap_err().kind, DiagnosticKind::Redefinition);
        let overload = env.declare_function(Span::default(), sin, Type::INT, vec![Param::new("x", Type::INT)], true);
        assert_eq!(overload, Ok(FuncId::User(0)));
        assert_eq!(env.lookup_function(sin, &[Type::INT]), Ok(FuncId::User(0)));
        assert!(matches!(env.lookup_function(sin, &[Type::FLOAT]), Ok(FuncId::Intrinsic(_))));
    }
}
