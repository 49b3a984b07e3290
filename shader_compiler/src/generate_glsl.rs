use crate::error::Diagnostic;
use crate::generate::{BackendWriter, BinForm, ShaderGenerator, Usage, PADDED_SAMPLE_HELPER};
use crate::op::{BinaryOpType, UnaryOpType};
use crate::shaderast::*;
use crate::ty::{BaseType, Type};
use std::fmt;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GlslVersion {
    /// GLSL ES 1.00.
    Es2,
    /// Desktop GLSL 1.30.
    V130,
}

/// Generates a GLSL fragment shader.
pub fn generate_shader(program: &ProgramUnit, version: GlslVersion) -> Result<String, Vec<Diagnostic>> {
    ShaderGenerator::new(program, GlslBackend { version }).generate_shader()
}

struct GlslBackend {
    version: GlslVersion,
}

impl GlslBackend {
    fn sample_name(&self) -> &'static str {
        match self.version {
            GlslVersion::Es2 => "texture2D",
            GlslVersion::V130 => "texture",
        }
    }
}

impl BackendWriter for GlslBackend {
    fn type_name(&self, ty: Type) -> &'static str {
        match (ty.base_type(), ty.num_fields()) {
            (BaseType::Float, 2) => "vec2",
            (BaseType::Float, 3) => "vec3",
            (BaseType::Float, 4) => "vec4",
            (BaseType::Int, 2) => "ivec2",
            (BaseType::Int, 3) => "ivec3",
            (BaseType::Int, 4) => "ivec4",
            (BaseType::Bool, 2) => "bvec2",
            (BaseType::Bool, 3) => "bvec3",
            (BaseType::Bool, 4) => "bvec4",
            (BaseType::Sampler, _) => "sampler2D",
            _ => ty.name(),
        }
    }

    fn builtin_var_name(&self, builtin: BuiltinVar) -> &'static str {
        match builtin {
            BuiltinVar::Pos0 => "texCoord0",
            BuiltinVar::Pos1 => "texCoord1",
            BuiltinVar::PixCoord => "jsl_pixcoord",
            BuiltinVar::VertexColor => "perVertexColor",
            BuiltinVar::Color => match self.version {
                GlslVersion::Es2 => "gl_FragColor",
                GlslVersion::V130 => "fragColor",
            },
        }
    }

    fn intrinsic_name(&self, name: &'static str, _num_args: usize) -> &'static str {
        match name {
            "sample" => self.sample_name(),
            "paddedSample" => PADDED_SAMPLE_HELPER,
            _ => name,
        }
    }

    fn precision_keyword(&self, precision: Precision) -> Option<&'static str> {
        Some(precision.keyword())
    }

    fn check_type(&self, ty: Type) -> Result<(), String> {
        if self.version == GlslVersion::Es2 && ty == Type::FSAMPLER {
            return Err(String::from("`fsampler` needs floating point textures, which GLSL ES 1.00 does not have"));
        }
        Ok(())
    }

    fn check_bin_op(&self, op: BinaryOpType, operand_ty: Type) -> Result<(), String> {
        if self.version != GlslVersion::Es2 {
            return Ok(());
        }
        if op.is_bitwise() {
            return Err(format!("bitwise operator `{}` is not available in GLSL ES 1.00", op));
        }
        if matches!(op, BinaryOpType::Mod | BinaryOpType::ModAssign) && operand_ty.base_type() == BaseType::Int {
            return Err(format!("integer `{}` is not available in GLSL ES 1.00", op));
        }
        Ok(())
    }

    fn check_un_op(&self, op: UnaryOpType) -> Result<(), String> {
        if self.version == GlslVersion::Es2 && op == UnaryOpType::BitNot {
            return Err(String::from("bitwise operator `~` is not available in GLSL ES 1.00"));
        }
        Ok(())
    }

    fn bin_form(&self, op: BinaryOpType, operand_ty: Type) -> BinForm {
        if op == BinaryOpType::Mod && operand_ty.base_type() == BaseType::Float {
            return BinForm::Call("mod");
        }
        if operand_ty.is_vector() {
            match op {
                BinaryOpType::Lt => return BinForm::Call("lessThan"),
                BinaryOpType::Gt => return BinForm::Call("greaterThan"),
                BinaryOpType::Le => return BinForm::Call("lessThanEqual"),
                BinaryOpType::Ge => return BinForm::Call("greaterThanEqual"),
                BinaryOpType::Eq => return BinForm::Call("equal"),
                BinaryOpType::Ne => return BinForm::Call("notEqual"),
                _ => {}
            }
        }
        BinForm::Infix(op)
    }

    fn vector_not(&self) -> Option<&'static str> {
        Some("not")
    }

    fn scalar_swizzle_as_constructor(&self) -> bool {
        true
    }

    fn explicit_conversions(&self) -> bool {
        true
    }

    fn inline_fma(&self) -> bool {
        true
    }

    fn write_preamble(&mut self, string: &mut String, usage: &Usage) -> fmt::Result {
        let varying = match self.version {
            GlslVersion::Es2 => {
                writeln!(string, "#ifdef GL_ES")?;
                writeln!(string, "precision highp float;")?;
                writeln!(string, "precision highp int;")?;
                writeln!(string, "#else")?;
                writeln!(string, "#define highp")?;
                writeln!(string, "#define mediump")?;
                writeln!(string, "#define lowp")?;
                writeln!(string, "#endif")?;
                "varying"
            }
            GlslVersion::V130 => {
                writeln!(string, "#version 130")?;
                writeln!(string, "out vec4 fragColor;")?;
                "in"
            }
        };
        for builtin in [BuiltinVar::Pos0, BuiltinVar::Pos1, BuiltinVar::VertexColor] {
            if usage.uses_builtin(builtin) {
                writeln!(string, "{} {} {};", varying, self.type_name(builtin.ty()), self.builtin_var_name(builtin))?;
            }
        }
        if usage.uses_builtin(BuiltinVar::PixCoord) {
            // x, y: offset of the destination; z: height of the render target;
            // w: 1.0 or -1.0 depending on whether the target is flipped.
            writeln!(string, "uniform vec4 jsl_pixCoordOffset;")?;
            writeln!(
                string,
                "#define jsl_pixcoord vec2(gl_FragCoord.x - jsl_pixCoordOffset.x, \
                 ((jsl_pixCoordOffset.z - gl_FragCoord.y) * jsl_pixCoordOffset.w) - jsl_pixCoordOffset.y)"
            )?;
        }
        Ok(())
    }

    fn write_padded_sample_helper(&self, string: &mut String) -> fmt::Result {
        writeln!(string, "vec4 {}(sampler2D s, vec2 loc) {{", PADDED_SAMPLE_HELPER)?;
        writeln!(string, "    vec4 c = {}(s, loc);", self.sample_name())?;
        writeln!(string, "    vec2 inside = step(vec2(0.0), loc) * step(loc, vec2(1.0));")?;
        writeln!(string, "    return c * (inside.x * inside.y);")?;
        writeln!(string, "}}")
    }

    fn write_global_var(&mut self, string: &mut String, _var: VarId, variable: &Variable, init: Option<&str>) -> fmt::Result {
        let ty = variable.ty.unwrap_or(Type::VOID);
        let qualifier = match variable.kind {
            _ if ty.is_sampler() => "uniform ",
            VarKind::Param => "uniform ",
            VarKind::Const => "const ",
            _ => "",
        };
        write!(string, "{}{} {}", qualifier, self.type_name(ty), variable.name)?;
        if let Some(array_size) = variable.array_size {
            write!(string, "[{}]", array_size)?;
        }
        if let Some(init) = init {
            write!(string, " = {}", init)?;
        }
        writeln!(string, ";")
    }

    fn write_main_header(&self, string: &mut String) -> fmt::Result {
        write!(string, "void main()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::shaderparser::parse;

    fn generate(code: &str, version: GlslVersion) -> String {
        let program = parse(code).unwrap();
        generate_shader(&program, version).unwrap()
    }

    fn unsupported(code: &str) -> usize {
        let program = parse(code).unwrap();
        let diagnostics = generate_shader(&program, GlslVersion::Es2).unwrap_err();
        assert!(diagnostics.iter().all(|diagnostic| diagnostic.kind == DiagnosticKind::UnsupportedConstruct));
        diagnostics.len()
    }

    #[test]
    fn test_es2_main() {
        let source = generate("param float4 tint; void main() { color = tint * jsl_vertexColor; }", GlslVersion::Es2);
        assert!(source.starts_with("#ifdef GL_ES\nprecision highp float;\n"));
        assert!(source.contains("varying vec4 perVertexColor;\n"));
        assert!(source.contains("uniform vec4 tint;\n"));
        assert!(source.contains("void main() {\n    gl_FragColor = tint * perVertexColor;\n}\n"));
        assert!(!source.contains("texCoord0"));
    }

    #[test]
    fn test_glsl130_main() {
        let source = generate("param sampler img; void main() { color = sample(img, pos0); }", GlslVersion::V130);
        assert!(source.starts_with("#version 130\nout vec4 fragColor;\n"));
        assert!(source.contains("in vec2 texCoord0;\n"));
        assert!(source.contains("uniform sampler2D img;\n"));
        assert!(source.contains("fragColor = texture(img, texCoord0);"));
    }

    #[test]
    fn test_conversions() {
        let source = generate("void main() { int i = 2; float f = i * 0.5 + 1; color = float4(f); }", GlslVersion::Es2);
        assert!(source.contains("float f = float(i) * 0.5 + 1.0;"));
        assert!(source.contains("gl_FragColor = vec4(f);"));
    }

    #[test]
    fn test_spellings() {
        let source = generate(
            "void main() {
                float2 a = float2(1.0, 2.0);
                bool2 lt = a < pos0;
                bool2 n = !lt;
                float m = a.x % 2.0;
                float2 s = m.xx;
                float r = fma(a.x, a.y, m - 1.0);
                color = float4(s, r, 1.0);
            }",
            GlslVersion::Es2,
        );
        assert!(source.contains("bvec2 lt = lessThan(a, texCoord0);"));
        assert!(source.contains("bvec2 n = not(lt);"));
        assert!(source.contains("float m = mod(a.x, 2.0);"));
        assert!(source.contains("vec2 s = vec2(m);"));
        assert!(source.contains("float r = (a.x * a.y + (m - 1.0));"));
    }

    #[test]
    fn test_parentheses() {
        let source = generate("void main() { float a = 1.0; float b = (a - (a - 2.0)) * -a; }", GlslVersion::Es2);
        assert!(source.contains("float b = (a - (a - 2.0)) * -a;"));
    }

    #[test]
    fn test_pixcoord_and_padded_sample() {
        let source = generate("param sampler s; void main() { color = paddedSample(s, pixcoord); }", GlslVersion::Es2);
        assert!(source.contains("uniform vec4 jsl_pixCoordOffset;\n#define jsl_pixcoord vec2("));
        assert!(source.contains("vec4 jsl_paddedSample(sampler2D s, vec2 loc) {\n    vec4 c = texture2D(s, loc);"));
        assert!(source.contains("gl_FragColor = jsl_paddedSample(s, jsl_pixcoord);"));
    }

    #[test]
    fn test_compound_mod_lvalue() {
        let source = generate("void main() { float a[2]; int i = 0; a[i] %= 2.0; }", GlslVersion::V130);
        assert!(source.contains("a[i] = mod(a[i], 2.0);"));

        let program = parse("void main() { float a[2]; int i = 0; a[i++] %= 2.0; a[i] += 1.0; }").unwrap();
        let diagnostics = generate_shader(&program, GlslVersion::V130).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedConstruct);
    }

    #[test]
    fn test_es2_unsupported() {
        assert_eq!(unsupported("param fsampler s; void main() { color = sample(s, pos0); }"), 1);
        assert_eq!(unsupported("void main() { int a = 6; int b = (a & 3) | (a << 1); }"), 3);
        assert_eq!(unsupported("void main() { int a = 7 % 2; a %= 2; float f = 7.0 % 2.0; }"), 2);
        assert_eq!(unsupported("void main() { int a = ~1; }"), 1);

        let program = parse("param fsampler s; void main() { int a = 6 & 3; color = sample(s, pos0); }").unwrap();
        assert!(generate_shader(&program, GlslVersion::V130).is_ok());
    }
}
