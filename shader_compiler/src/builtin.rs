//! The intrinsic functions every JSL program can call without declaring them.

use crate::function::{FuncId, Function, Param};
use crate::ident::Ident;
use crate::ty::Type;
use once_cell::sync::Lazy;

const GEN_FLOAT: [Type; 4] = [Type::FLOAT, Type::FLOAT2, Type::FLOAT3, Type::FLOAT4];
const SAMPLERS: [Type; 3] = [Type::SAMPLER, Type::LSAMPLER, Type::FSAMPLER];

static INTRINSICS: Lazy<Vec<Function>> = Lazy::new(generate_intrinsics);

/// All intrinsics, indexed by [`FuncId::Intrinsic`].
pub fn intrinsics() -> &'static [Function] {
    &INTRINSICS
}

pub fn intrinsic(index: usize) -> &'static Function {
    &INTRINSICS[index]
}

pub(crate) fn intrinsic_candidates() -> impl Iterator<Item = (FuncId, &'static Function)> {
    intrinsics().iter().enumerate().map(|(index, func)| (FuncId::Intrinsic(index), func))
}

pub fn is_intrinsic_name(name: Ident) -> bool {
    intrinsics().iter().any(|func| func.name() == name)
}

struct Builder {
    funcs: Vec<Function>,
}

impl Builder {
    fn declare(&mut self, name: &str, return_type: Type, params: &[(&str, Type)]) {
        let func = Function::new(name, return_type, params.iter().map(|(name, ty)| Param::new(name, *ty)).collect());
        // The scalar member of a family often coincides with another overload, e.g.
        // `min(genF, float)` for genF = float.
        if !self.funcs.contains(&func) {
            self.funcs.push(func);
        }
    }
}

fn generate_intrinsics() -> Vec<Function> {
    let mut builder = Builder { funcs: Vec::new() };

    for sampler in SAMPLERS {
        builder.declare("sample", Type::FLOAT4, &[("s", sampler), ("loc", Type::FLOAT2)]);
        builder.declare("paddedSample", Type::FLOAT4, &[("s", sampler), ("loc", Type::FLOAT2)]);
    }

    for ty in GEN_FLOAT {
        for name in [
            "abs",
            "acos",
            "asin",
            "atan",
            "ceil",
            "cos",
            "degrees",
            "exp",
            "exp2",
            "floor",
            "fract",
            "inversesqrt",
            "log",
            "log2",
            "normalize",
            "radians",
            "sign",
            "sin",
            "sqrt",
            "tan",
        ] {
            builder.declare(name, ty, &[("x", ty)]);
        }
        for name in ["atan", "pow", "mod", "min", "max", "reflect"] {
            builder.declare(name, ty, &[("x", ty), ("y", ty)]);
        }
        builder.declare("step", ty, &[("edge", ty), ("x", ty)]);
        for name in ["min", "max", "mod"] {
            builder.declare(name, ty, &[("x", ty), ("y", Type::FLOAT)]);
        }
        builder.declare("step", ty, &[("edge", Type::FLOAT), ("x", ty)]);
        builder.declare("clamp", ty, &[("x", ty), ("min", ty), ("max", ty)]);
        builder.declare("clamp", ty, &[("x", ty), ("min", Type::FLOAT), ("max", Type::FLOAT)]);
        builder.declare("mix", ty, &[("x", ty), ("y", ty), ("a", ty)]);
        builder.declare("mix", ty, &[("x", ty), ("y", ty), ("a", Type::FLOAT)]);
        builder.declare("smoothstep", ty, &[("edge0", ty), ("edge1", ty), ("x", ty)]);
        builder.declare("smoothstep", ty, &[("edge0", Type::FLOAT), ("edge1", Type::FLOAT), ("x", ty)]);
        builder.declare("fma", ty, &[("a", ty), ("b", ty), ("c", ty)]);
        builder.declare("dot", Type::FLOAT, &[("x", ty), ("y", ty)]);
        builder.declare("distance", Type::FLOAT, &[("p0", ty), ("p1", ty)]);
        builder.declare("length", Type::FLOAT, &[("x", ty)]);
    }

    builder.declare("cross", Type::FLOAT3, &[("x", Type::FLOAT3), ("y", Type::FLOAT3)]);

    for ty in [Type::BOOL2, Type::BOOL3, Type::BOOL4] {
        builder.declare("any", Type::BOOL, &[("x", ty)]);
        builder.declare("all", Type::BOOL, &[("x", ty)]);
    }

    builder.funcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{resolve_overload, LookupError};

    fn resolve(name: &str, args: &[Type]) -> Result<&'static Function, LookupError> {
        resolve_overload(intrinsic_candidates(), Ident::new(name), args).map(|id| match id {
            FuncId::Intrinsic(index) => intrinsic(index),
            FuncId::User(_) => unreachable!(),
        })
    }

    #[test]
    fn test_no_duplicate_signatures() {
        for (index, func) in intrinsics().iter().enumerate() {
            assert!(!intrinsics()[index + 1..].contains(func), "{} declared twice", func);
        }
    }

    #[test]
    fn test_intrinsic_resolution() {
        assert_eq!(resolve("fma", &[Type::FLOAT, Type::FLOAT, Type::FLOAT]).unwrap().return_type(), Type::FLOAT);
        assert_eq!(resolve("sample", &[Type::LSAMPLER, Type::FLOAT2]).unwrap().return_type(), Type::FLOAT4);
        assert_eq!(resolve("dot", &[Type::FLOAT3, Type::FLOAT3]).unwrap().return_type(), Type::FLOAT);
        assert_eq!(resolve("mix", &[Type::FLOAT4, Type::FLOAT4, Type::FLOAT]).unwrap().return_type(), Type::FLOAT4);
        assert_eq!(resolve("abs", &[Type::INT2]).unwrap().return_type(), Type::FLOAT2);
        assert_eq!(resolve("step", &[Type::INT, Type::INT]).unwrap().params()[0].ty, Type::FLOAT);
        assert_eq!(resolve("clamp", &[Type::FLOAT3, Type::INT, Type::INT]).unwrap().params()[1].ty, Type::FLOAT);
        assert_eq!(resolve("sample", &[Type::FLOAT2, Type::FLOAT2]), Err(LookupError::NoSuchFunction));
        assert!(is_intrinsic_name(Ident::new("paddedSample")));
        assert!(!is_intrinsic_name(Ident::new("texture2D")));
    }
}
