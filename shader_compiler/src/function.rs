use crate::ident::Ident;
use crate::ty::Type;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Copy, Debug)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

impl Param {
    pub fn new(name: &str, ty: Type) -> Self {
        Param { name: Ident::new(name), ty }
    }
}

/// An intrinsic or user-declared function signature.
#[derive(Clone, Debug)]
pub struct Function {
    name: Ident,
    return_type: Type,
    params: Vec<Param>,
    /// Whether this function was declared by the program being compiled rather
    /// than being an intrinsic.
    is_user_func: bool,
}

impl Function {
    pub fn new(name: &str, return_type: Type, params: Vec<Param>) -> Self {
        Function { name: Ident::new(name), return_type, params, is_user_func: false }
    }

    pub fn new_user(name: Ident, return_type: Type, params: Vec<Param>) -> Self {
        Function { name, return_type, params, is_user_func: true }
    }

    pub fn name(&self) -> Ident {
        self.name
    }

    pub fn return_type(&self) -> Type {
        self.return_type
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_user_func(&self) -> bool {
        self.is_user_func
    }

    pub fn param_types(&self) -> impl Iterator<Item = Type> + '_ {
        self.params.iter().map(|param| param.ty)
    }

    fn accepts_exactly(&self, arg_types: &[Type]) -> bool {
        self.params.len() == arg_types.len() && self.param_types().zip(arg_types).all(|(param, arg)| param == *arg)
    }

    fn accepts_with_promotion(&self, arg_types: &[Type]) -> bool {
        self.params.len() == arg_types.len() && self.param_types().zip(arg_types).all(|(param, arg)| arg.converts_to(param))
    }
}

/// Equality deliberately ignores [`Function::is_user_func`] and parameter names, so
/// "has this signature been declared already" works the same for intrinsics and
/// user functions.
impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.params.len() == other.params.len()
            && self.param_types().eq(other.param_types())
    }
}

impl Eq for Function {}

impl Hash for Function {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.return_type.hash(state);
        for ty in self.param_types() {
            ty.hash(state);
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        write!(f, ")")
    }
}

/// Handle to a resolved function: an index into the intrinsic registry or into the
/// user functions of the program being compiled.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FuncId {
    Intrinsic(usize),
    User(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LookupError {
    NoSuchFunction,
    /// More than one overload accepts the arguments after promotion.
    AmbiguousOverload(usize),
}

/// Picks the overload of `name` for `arg_types`: an exact match wins, otherwise each
/// argument may be promoted from int to float, and exactly one candidate must remain.
pub(crate) fn resolve_overload<'a, I>(candidates: I, name: Ident, arg_types: &[Type]) -> Result<FuncId, LookupError>
where
    I: IntoIterator<Item = (FuncId, &'a Function)>,
{
    let named: Vec<(FuncId, &Function)> = candidates.into_iter().filter(|(_, func)| func.name == name).collect();

    let exact: Vec<FuncId> = named.iter().filter(|(_, func)| func.accepts_exactly(arg_types)).map(|(id, _)| *id).collect();
    match exact.len() {
        0 => {}
        1 => return Ok(exact[0]),
        count => return Err(LookupError::AmbiguousOverload(count)),
    }

    let promoted: Vec<FuncId> =
        named.iter().filter(|(_, func)| func.accepts_with_promotion(arg_types)).map(|(id, _)| *id).collect();
    match promoted.len() {
        0 => Err(LookupError::NoSuchFunction),
        1 => Ok(promoted[0]),
        count => Err(LookupError::AmbiguousOverload(count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn f(name: &str, return_type: Type, params: &[Type]) -> Function {
        Function::new(name, return_type, params.iter().map(|ty| Param::new("p", *ty)).collect())
    }

    #[test]
    fn test_equality_ignores_origin() {
        let intrinsic = f("foo", Type::FLOAT, &[Type::FLOAT]);
        let user = Function::new_user(Ident::new("foo"), Type::FLOAT, vec![Param::new("other", Type::FLOAT)]);
        assert!(!intrinsic.is_user_func());
        assert!(user.is_user_func());
        assert_eq!(intrinsic, user);

        let mut set = HashSet::new();
        set.insert(intrinsic);
        assert!(set.contains(&user));
        assert!(!set.contains(&f("foo", Type::FLOAT, &[Type::FLOAT2])));
        assert!(!set.contains(&f("foo", Type::INT, &[Type::FLOAT])));
    }

    #[test]
    fn test_resolve_exact_before_promotion() {
        let funcs = [f("g", Type::FLOAT, &[Type::FLOAT]), f("g", Type::INT, &[Type::INT])];
        let candidates = || funcs.iter().enumerate().map(|(index, func)| (FuncId::User(index), func));
        assert_eq!(resolve_overload(candidates(), Ident::new("g"), &[Type::INT]), Ok(FuncId::User(1)));
        assert_eq!(resolve_overload(candidates(), Ident::new("g"), &[Type::FLOAT]), Ok(FuncId::User(0)));
        assert_eq!(resolve_overload(candidates(), Ident::new("g"), &[Type::BOOL]), Err(LookupError::NoSuchFunction));
        assert_eq!(resolve_overload(candidates(), Ident::new("h"), &[Type::INT]), Err(LookupError::NoSuchFunction));
    }

    #[test]
    fn test_resolve_promotion() {
        let funcs = [f("g", Type::FLOAT, &[Type::FLOAT2, Type::FLOAT]), f("g", Type::FLOAT, &[Type::FLOAT2, Type::FLOAT2])];
        let candidates = || funcs.iter().enumerate().map(|(index, func)| (FuncId::User(index), func));
        assert_eq!(resolve_overload(candidates(), Ident::new("g"), &[Type::INT2, Type::INT]), Ok(FuncId::User(0)));
        assert_eq!(resolve_overload(candidates(), Ident::new("g"), &[Type::FLOAT2, Type::INT2]), Ok(FuncId::User(1)));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let funcs = [f("g", Type::FLOAT, &[Type::FLOAT, Type::INT]), f("g", Type::FLOAT, &[Type::INT, Type::FLOAT])];
        let candidates = || funcs.iter().enumerate().map(|(index, func)| (FuncId::User(index), func));
        assert_eq!(
            resolve_overload(candidates(), Ident::new("g"), &[Type::INT, Type::INT]),
            Err(LookupError::AmbiguousOverload(2))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(f("mix", Type::FLOAT3, &[Type::FLOAT3, Type::FLOAT3, Type::FLOAT]).to_string(), "float3 mix(float3, float3, float)");
    }
}
