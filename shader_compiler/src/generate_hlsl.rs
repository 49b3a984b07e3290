use crate::error::Diagnostic;
use crate::generate::{BackendWriter, BinForm, ConsForm, ShaderGenerator, Usage, PADDED_SAMPLE_HELPER};
use crate::op::{BinaryOpType, UnaryOpType};
use crate::shaderast::*;
use crate::ty::{BaseType, Type};
use std::fmt;
use std::fmt::Write;

/// Generates an HLSL pixel shader for shader model 3.
pub fn generate_shader(program: &ProgramUnit) -> Result<String, Vec<Diagnostic>> {
    let backend = HlslBackend { registers: allocate_registers(program), pixcoord_offset: pixcoord_offset_register(program) };
    ShaderGenerator::new(program, backend).generate_shader()
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RegisterClass {
    /// `c` registers, for float params.
    Float,
    /// `i` registers, for int params.
    Int,
    /// `b` registers, for bool params.
    Bool,
    /// `s` registers, one per sampler.
    Sampler,
}

impl RegisterClass {
    pub fn prefix(self) -> char {
        match self {
            RegisterClass::Float => 'c',
            RegisterClass::Int => 'i',
            RegisterClass::Bool => 'b',
            RegisterClass::Sampler => 's',
        }
    }

    fn for_type(ty: Type) -> RegisterClass {
        match ty.base_type() {
            BaseType::Int => RegisterClass::Int,
            BaseType::Bool => RegisterClass::Bool,
            BaseType::Sampler => RegisterClass::Sampler,
            BaseType::Float | BaseType::Void => RegisterClass::Float,
        }
    }
}

/// The first register a host-settable global is bound to. Arrays occupy one
/// register per element, starting here.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Register {
    pub class: RegisterClass,
    pub index: u32,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.class.prefix(), self.index)
    }
}

/// Assigns registers to `param` globals and samplers in declaration order, with a
/// separate counter per register class.
pub fn allocate_registers(program: &ProgramUnit) -> Vec<(VarId, Register)> {
    let mut next = [0u32; 4];
    let mut registers = Vec::new();
    for decl in program.decls() {
        let decl = match decl {
            ExtDecl::Var(decl) => decl,
            ExtDecl::Func(_) => continue,
        };
        for declarator in &decl.declarators {
            let variable = program.variable(declarator.var);
            let ty = match variable.ty {
                Some(ty) if variable.kind == VarKind::Param || ty.is_sampler() => ty,
                _ => continue,
            };
            let class = RegisterClass::for_type(ty);
            let counter = &mut next[class as usize];
            registers.push((declarator.var, Register { class, index: *counter }));
            *counter += variable.array_size.unwrap_or(1);
        }
    }
    registers
}

/// The `c` register of `jsl_pixCoordOffset`, the first one after the float params.
pub fn pixcoord_offset_register(program: &ProgramUnit) -> Register {
    let index = allocate_registers(program)
        .into_iter()
        .filter(|(_, register)| register.class == RegisterClass::Float)
        .map(|(var, register)| register.index + program.variable(var).array_size.unwrap_or(1))
        .max()
        .unwrap_or(0);
    Register { class: RegisterClass::Float, index }
}

struct HlslBackend {
    registers: Vec<(VarId, Register)>,
    pixcoord_offset: Register,
}

impl HlslBackend {
    fn register(&self, var: VarId) -> Option<Register> {
        self.registers.iter().find(|(id, _)| *id == var).map(|(_, register)| *register)
    }
}

impl BackendWriter for HlslBackend {
    fn type_name(&self, ty: Type) -> &'static str {
        if ty.is_sampler() {
            "sampler2D"
        } else {
            ty.name()
        }
    }

    fn builtin_var_name(&self, builtin: BuiltinVar) -> &'static str {
        match builtin {
            BuiltinVar::PixCoord => "jsl_pixcoord",
            _ => builtin.name(),
        }
    }

    fn intrinsic_name(&self, name: &'static str, num_args: usize) -> &'static str {
        match (name, num_args) {
            ("sample", _) => "tex2D",
            ("paddedSample", _) => PADDED_SAMPLE_HELPER,
            ("mix", _) => "lerp",
            ("fract", _) => "frac",
            ("mod", _) => "fmod",
            ("inversesqrt", _) => "rsqrt",
            ("atan", 2) => "atan2",
            ("fma", _) => "mad",
            _ => name,
        }
    }

    fn check_bin_op(&self, op: BinaryOpType, _operand_ty: Type) -> Result<(), String> {
        if op.is_bitwise() {
            return Err(format!("bitwise operator `{}` is not available in shader model 3", op));
        }
        Ok(())
    }

    fn check_un_op(&self, op: UnaryOpType) -> Result<(), String> {
        if op == UnaryOpType::BitNot {
            return Err(String::from("bitwise operator `~` is not available in shader model 3"));
        }
        Ok(())
    }

    fn bin_form(&self, op: BinaryOpType, _operand_ty: Type) -> BinForm {
        match op {
            // Logical xor on bools.
            BinaryOpType::Xor => BinForm::Infix(BinaryOpType::Ne),
            _ => BinForm::Infix(op),
        }
    }

    fn cons_form(&self, _ty: Type, arg_types: &[Option<Type>]) -> ConsForm {
        match arg_types {
            [Some(arg_ty)] if arg_ty.is_scalar() => ConsForm::Cast,
            _ => ConsForm::Call,
        }
    }

    fn write_preamble(&mut self, string: &mut String, usage: &Usage) -> fmt::Result {
        if !usage.uses_builtin(BuiltinVar::PixCoord) {
            return Ok(());
        }
        // Same contract as the GLSL backends. VPOS addresses the pixel corner, so
        // move it to the center the way gl_FragCoord is.
        writeln!(string, "float4 jsl_pixCoordOffset : register({});", self.pixcoord_offset)?;
        writeln!(
            string,
            "#define jsl_pixcoord float2((jsl_vpos.x + 0.5) - jsl_pixCoordOffset.x, \
             ((jsl_pixCoordOffset.z - (jsl_vpos.y + 0.5)) * jsl_pixCoordOffset.w) - jsl_pixCoordOffset.y)"
        )
    }

    fn write_padded_sample_helper(&self, string: &mut String) -> fmt::Result {
        writeln!(string, "float4 {}(sampler2D s, float2 loc) {{", PADDED_SAMPLE_HELPER)?;
        writeln!(string, "    float4 c = tex2D(s, loc);")?;
        writeln!(string, "    float2 inside = step(float2(0.0, 0.0), loc) * step(loc, float2(1.0, 1.0));")?;
        writeln!(string, "    return c * (inside.x * inside.y);")?;
        writeln!(string, "}}")
    }

    fn write_global_var(&mut self, string: &mut String, var: VarId, variable: &Variable, init: Option<&str>) -> fmt::Result {
        let ty = variable.ty.unwrap_or(Type::VOID);
        let register = self.register(var);
        let qualifier = match variable.kind {
            _ if register.is_some() => "",
            VarKind::Const => "static const ",
            _ => "static ",
        };
        write!(string, "{}{} {}", qualifier, self.type_name(ty), variable.name)?;
        if let Some(array_size) = variable.array_size {
            write!(string, "[{}]", array_size)?;
        }
        if let Some(register) = register {
            write!(string, " : register({})", register)?;
        }
        if let Some(init) = init {
            write!(string, " = {}", init)?;
        }
        writeln!(string, ";")
    }

    fn write_main_header(&self, string: &mut String) -> fmt::Result {
        write!(
            string,
            "void main(in float2 pos0 : TEXCOORD0, in float2 pos1 : TEXCOORD1, in float2 jsl_vpos : VPOS, \
             in float4 jsl_vertexColor : COLOR0, out float4 color : COLOR0)"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::shaderparser::parse;

    fn generate(code: &str) -> String {
        generate_shader(&parse(code).unwrap()).unwrap()
    }

    #[test]
    fn test_main() {
        let source = generate("param float4 tint; void main() { color = tint; }");
        assert_eq!(
            source,
            "float4 tint : register(c0);\n\
             \n\
             void main(in float2 pos0 : TEXCOORD0, in float2 pos1 : TEXCOORD1, in float2 jsl_vpos : VPOS, \
             in float4 jsl_vertexColor : COLOR0, out float4 color : COLOR0) {\n    color = tint;\n}\n"
        );
    }

    #[test]
    fn test_registers() {
        let program = parse(
            "param float2 offsets[3];
             param sampler a;
             param int count;
             const float k = 2.0;
             float g;
             param float4 tint;
             lsampler b;
             param bool flag;
             void main() {}",
        )
        .unwrap();
        let registers: Vec<String> =
            allocate_registers(&program).iter().map(|(_, register)| register.to_string()).collect();
        assert_eq!(registers, ["c0", "s0", "i0", "c3", "s1", "b0"]);

        let source = generate_shader(&program).unwrap();
        assert!(source.contains("float2 offsets[3] : register(c0);\n"));
        assert!(source.contains("sampler2D b : register(s1);\n"));
        assert!(source.contains("static const float k = 2.0;\n"));
        assert!(source.contains("static float g;\n"));
    }

    #[test]
    fn test_spellings() {
        let source = generate(
            "param sampler img;
             void main() {
                 float4 c = sample(img, pos0);
                 float f = fract(c.x) + mod(c.y, 2.0) + inversesqrt(c.z) + atan(c.x, c.y) + atan(c.w);
                 float3 m = mix(c.rgb, float3(f), 0.5);
                 int i = 3;
                 float r = fma(f, 2.0, i);
                 bool x = (f > 1.0) ^^ (r < 0.0);
                 color = float4(m, x ? r : 0.0);
             }",
        );
        assert!(source.contains("float4 c = tex2D(img, pos0);"));
        assert!(source.contains("float f = frac(c.x) + fmod(c.y, 2.0) + rsqrt(c.z) + atan2(c.x, c.y) + atan(c.w);"));
        assert!(source.contains("float3 m = lerp(c.rgb, ((float3)(f)), 0.5);"));
        assert!(source.contains("float r = mad(f, 2.0, i);"));
        assert!(source.contains("bool x = f > 1.0 != r < 0.0;"));
    }

    #[test]
    fn test_pixcoord() {
        let source =
            generate("param float2 offsets[2]; param int n; void main() { color = float4(pixcoord + offsets[1], 0.0, 1.0); }");
        assert!(source.starts_with(
            "float4 jsl_pixCoordOffset : register(c2);\n\
             #define jsl_pixcoord float2((jsl_vpos.x + 0.5) - jsl_pixCoordOffset.x, "
        ));
        assert!(source.contains("float2 offsets[2] : register(c0);\n"));
        assert!(source.contains("color = float4(jsl_pixcoord + offsets[1], 0.0, 1.0);"));

        assert!(!generate("void main() { color = float4(pos0, 0.0, 1.0); }").contains("jsl_pixCoordOffset"));
    }

    #[test]
    fn test_bitwise_unsupported() {
        let program = parse("param fsampler s; void main() { int a = 6 & 3; a <<= 1; color = sample(s, pos0); }").unwrap();
        let diagnostics = generate_shader(&program).unwrap_err();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|diagnostic| diagnostic.kind == DiagnosticKind::UnsupportedConstruct));
    }
}
