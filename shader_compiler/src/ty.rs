//! The fixed catalog of JSL types.

use once_cell::sync::Lazy;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BaseType {
    Void,
    Float,
    Int,
    Bool,
    Sampler,
}

/// A JSL type. Only the constants below exist; there is no way to build a type
/// outside of the catalog.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Type {
    base_type: BaseType,
    name: &'static str,
    num_fields: usize,
}

impl Type {
    pub const VOID: Type = Type::builtin(BaseType::Void, "void", 1);
    pub const FLOAT: Type = Type::builtin(BaseType::Float, "float", 1);
    pub const FLOAT2: Type = Type::builtin(BaseType::Float, "float2", 2);
    pub const FLOAT3: Type = Type::builtin(BaseType::Float, "float3", 3);
    pub const FLOAT4: Type = Type::builtin(BaseType::Float, "float4", 4);
    pub const INT: Type = Type::builtin(BaseType::Int, "int", 1);
    pub const INT2: Type = Type::builtin(BaseType::Int, "int2", 2);
    pub const INT3: Type = Type::builtin(BaseType::Int, "int3", 3);
    pub const INT4: Type = Type::builtin(BaseType::Int, "int4", 4);
    pub const BOOL: Type = Type::builtin(BaseType::Bool, "bool", 1);
    pub const BOOL2: Type = Type::builtin(BaseType::Bool, "bool2", 2);
    pub const BOOL3: Type = Type::builtin(BaseType::Bool, "bool3", 3);
    pub const BOOL4: Type = Type::builtin(BaseType::Bool, "bool4", 4);
    /// Nearest-neighbour filtered texture.
    pub const SAMPLER: Type = Type::builtin(BaseType::Sampler, "sampler", 1);
    /// Linearly filtered texture.
    pub const LSAMPLER: Type = Type::builtin(BaseType::Sampler, "lsampler", 1);
    /// Floating point texture.
    pub const FSAMPLER: Type = Type::builtin(BaseType::Sampler, "fsampler", 1);

    const fn builtin(base_type: BaseType, name: &'static str, num_fields: usize) -> Type {
        Type { base_type, name, num_fields }
    }

    /// Returns the type named by a lowercase token, e.g. `"float3"` gives [`Type::FLOAT3`].
    pub fn from_token(token: &str) -> Result<Type, UnknownType> {
        types().iter().copied().find(|ty| ty.name == token).ok_or_else(|| UnknownType(token.to_string()))
    }

    /// The catalog type with the given base type and width, if there is one.
    pub fn vector_of(base_type: BaseType, num_fields: usize) -> Option<Type> {
        match base_type {
            BaseType::Float | BaseType::Int | BaseType::Bool => {
                types().iter().copied().find(|ty| ty.base_type == base_type && ty.num_fields == num_fields)
            }
            BaseType::Void | BaseType::Sampler => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn is_vector(&self) -> bool {
        self.num_fields > 1
    }

    pub fn is_matrix(&self) -> bool {
        false
    }

    pub fn is_scalar(&self) -> bool {
        self.num_fields == 1 && matches!(self.base_type, BaseType::Float | BaseType::Int | BaseType::Bool)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.base_type, BaseType::Float | BaseType::Int)
    }

    pub fn is_sampler(&self) -> bool {
        self.base_type == BaseType::Sampler
    }

    /// The scalar type of the components of this type.
    pub fn scalar(&self) -> Type {
        Type::vector_of(self.base_type, 1).unwrap_or(*self)
    }

    /// Same width, different base type; `None` for void and samplers.
    pub fn with_base(&self, base_type: BaseType) -> Option<Type> {
        match self.base_type {
            BaseType::Void | BaseType::Sampler => None,
            _ => Type::vector_of(base_type, self.num_fields),
        }
    }

    /// The float type of the same width, for int types. This is the only implicit
    /// conversion in JSL.
    pub fn promoted(&self) -> Option<Type> {
        match self.base_type {
            BaseType::Int => self.with_base(BaseType::Float),
            _ => None,
        }
    }

    /// Whether a value of type `self` can be used where `target` is expected,
    /// possibly after promotion.
    pub fn converts_to(&self, target: Type) -> bool {
        *self == target || self.promoted() == Some(target)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not get type from token `{}`", self.0)
    }
}

static TYPES: Lazy<Vec<Type>> = Lazy::new(|| {
    vec![
        Type::VOID,
        Type::FLOAT,
        Type::FLOAT2,
        Type::FLOAT3,
        Type::FLOAT4,
        Type::INT,
        Type::INT2,
        Type::INT3,
        Type::INT4,
        Type::BOOL,
        Type::BOOL2,
        Type::BOOL3,
        Type::BOOL4,
        Type::SAMPLER,
        Type::LSAMPLER,
        Type::FSAMPLER,
    ]
});

/// All built-in types, in catalog order.
pub fn types() -> &'static [Type] {
    &TYPES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_catalog_totality() {
        for ty in types() {
            assert_eq!(Type::from_token(&ty.to_string()), Ok(*ty));
        }
        assert_eq!(types().len(), 16);
        assert_eq!(types()[0], Type::VOID);
        assert_eq!(types()[15], Type::FSAMPLER);
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(Type::from_token("float5"), Err(UnknownType("float5".to_string())));
        assert_eq!(Type::from_token("Float"), Err(UnknownType("Float".to_string())));
    }

    #[test]
    fn test_predicates() {
        assert!(Type::FLOAT3.is_vector());
        assert!(!Type::FLOAT.is_vector());
        assert!(!Type::SAMPLER.is_vector());
        assert!(types().iter().all(|ty| !ty.is_matrix()));
        assert_ne!(Type::SAMPLER, Type::LSAMPLER);
    }

    #[test]
    fn test_promotion() {
        assert_eq!(Type::INT3.promoted(), Some(Type::FLOAT3));
        assert_eq!(Type::FLOAT.promoted(), None);
        assert!(Type::INT.converts_to(Type::FLOAT));
        assert!(!Type::INT.converts_to(Type::FLOAT2));
        assert!(!Type::FLOAT.converts_to(Type::INT));
        assert_eq!(Type::BOOL2.with_base(BaseType::Float), Some(Type::FLOAT2));
        assert_eq!(Type::vector_of(BaseType::Int, 5), None);
    }
}
