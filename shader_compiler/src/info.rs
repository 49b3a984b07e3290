//! What the host needs to know to feed a compiled program: its `param` globals and
//! samplers, in declaration order, with the slots they are bound to.

use crate::generate::Usage;
use crate::generate_hlsl::{allocate_registers, pixcoord_offset_register, Register};
use crate::shaderast::{BuiltinVar, ProgramUnit, VarKind};
use crate::ty::Type;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SamplerKind {
    /// `sampler`, nearest neighbour filtering.
    Nearest,
    /// `lsampler`, linear filtering.
    Linear,
    /// `fsampler`, a floating point texture.
    Float,
}

impl SamplerKind {
    pub fn from_type(ty: Type) -> Option<SamplerKind> {
        match ty {
            Type::SAMPLER => Some(SamplerKind::Nearest),
            Type::LSAMPLER => Some(SamplerKind::Linear),
            Type::FSAMPLER => Some(SamplerKind::Float),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SamplerKind::Nearest => "sampler",
            SamplerKind::Linear => "lsampler",
            SamplerKind::Float => "fsampler",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: Type,
    pub array_size: Option<u32>,
    /// First HLSL constant register; arrays continue in the following ones.
    pub hlsl_register: Register,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerInfo {
    pub name: String,
    pub kind: SamplerKind,
    /// Texture unit in GLSL, `s` register in HLSL.
    pub unit: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderInfo {
    pub params: Vec<ParamInfo>,
    pub samplers: Vec<SamplerInfo>,
    /// HLSL register of the `jsl_pixCoordOffset` uniform; `None` unless the program
    /// reads `pixcoord`.
    pub pixcoord_offset: Option<Register>,
}

impl ShaderInfo {
    pub fn from_program(program: &ProgramUnit) -> ShaderInfo {
        let mut info = ShaderInfo::default();
        if Usage::collect(program).uses_builtin(BuiltinVar::PixCoord) {
            info.pixcoord_offset = Some(pixcoord_offset_register(program));
        }
        for (var, register) in allocate_registers(program) {
            let variable = program.variable(var);
            let ty = match variable.ty {
                Some(ty) => ty,
                None => continue,
            };
            let name = variable.name.to_string();
            match SamplerKind::from_type(ty) {
                Some(kind) => info.samplers.push(SamplerInfo { name, kind, unit: register.index }),
                None if variable.kind == VarKind::Param => {
                    info.params.push(ParamInfo { name, ty, array_size: variable.array_size, hlsl_register: register })
                }
                None => {}
            }
        }
        info
    }

    pub fn param(&self, name: &str) -> Option<&ParamInfo> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn sampler(&self, name: &str) -> Option<&SamplerInfo> {
        self.samplers.iter().find(|sampler| sampler.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_hlsl::RegisterClass;
    use crate::shaderparser::parse;

    #[test]
    fn test_shader_info() {
        let program = parse(
            "param sampler baseImg;
             param float4 weights[2];
             lsampler maskImg;
             param int count;
             param float alpha;
             float scratch;
             void main() {}",
        )
        .unwrap();
        let info = ShaderInfo::from_program(&program);

        let names: Vec<&str> = info.params.iter().map(|param| param.name.as_str()).collect();
        assert_eq!(names, ["weights", "count", "alpha"]);
        let weights = info.param("weights").unwrap();
        assert_eq!(weights.ty, Type::FLOAT4);
        assert_eq!(weights.array_size, Some(2));
        assert_eq!(weights.hlsl_register, Register { class: RegisterClass::Float, index: 0 });
        assert_eq!(info.param("alpha").unwrap().hlsl_register.to_string(), "c2");
        assert_eq!(info.param("count").unwrap().hlsl_register.to_string(), "i0");
        assert!(info.param("scratch").is_none());
        assert_eq!(info.pixcoord_offset, None);

        assert_eq!(
            info.samplers,
            vec![
                SamplerInfo { name: String::from("baseImg"), kind: SamplerKind::Nearest, unit: 0 },
                SamplerInfo { name: String::from("maskImg"), kind: SamplerKind::Linear, unit: 1 },
            ]
        );
    }

    #[test]
    fn test_pixcoord_offset() {
        let program = parse("param float3 a[2]; param float b; void main() { color = float4(pixcoord, b, a[0].x); }").unwrap();
        let info = ShaderInfo::from_program(&program);
        assert_eq!(info.pixcoord_offset, Some(Register { class: RegisterClass::Float, index: 3 }));
    }
}
