use jsl_shader_compiler::ty::Type;
use jsl_shader_compiler::{
    generate_shader, parse, CompileJob, CompileOptions, CompileState, Compiler, Dialect, DiagnosticKind, FuncId, LookupError,
    SourceFile,
};

const BLEND: &str = "
param sampler baseImg;
param sampler blendImg;
param float opacity;

float4 blend(float4 bot, float4 top) {
    return top + bot * (1.0 - top.a);
}

void main() {
    float4 bot = sample(baseImg, pos0);
    float4 top = sample(blendImg, pos1) * opacity;
    color = blend(bot, top) * jsl_vertexColor;
}
";

fn kinds(source: &str) -> Vec<DiagnosticKind> {
    parse(source).unwrap_err().iter().map(|diagnostic| diagnostic.kind).collect()
}

#[test]
fn test_round_trip() {
    let program = parse("void main(){ float r = fma(1.5, 3.0, 5.0); }").unwrap();
    let printed = program.to_string();
    assert_eq!(printed, "void main() {\n    float r = fma(1.5, 3.0, 5.0);\n}\n");

    let reparsed = parse(&printed).unwrap();
    assert_eq!(reparsed.to_string(), printed);
    for dialect in Dialect::all() {
        assert_eq!(generate_shader(&program, dialect), generate_shader(&reparsed, dialect));
    }
}

#[test]
fn test_round_trip_blend() {
    let program = parse(BLEND).unwrap();
    let reparsed = parse(&program.to_string()).unwrap();
    assert_eq!(reparsed.to_string(), program.to_string());
    for dialect in Dialect::all() {
        assert_eq!(generate_shader(&program, dialect), generate_shader(&reparsed, dialect));
    }
}

#[test]
fn test_round_trip_literal_swizzle() {
    let program = parse("void main() { int2 v = (1).xx; float3 w = (2.5).xxx; }").unwrap();
    let printed = program.to_string();
    assert!(printed.contains("int2 v = (1).xx;"), "{}", printed);
    assert!(printed.contains("float3 w = (2.5).xxx;"), "{}", printed);
    let reparsed = parse(&printed).unwrap();
    assert_eq!(reparsed.to_string(), printed);

    let hlsl = generate_shader(&program, Dialect::Hlsl).unwrap();
    assert!(hlsl.contains("int2 v = (1).xx;"), "{}", hlsl);
    let glsl = generate_shader(&program, Dialect::Glsl).unwrap();
    assert!(glsl.contains("ivec2 v = ivec2(1);"), "{}", glsl);
}

#[test]
fn test_error_accumulation() {
    assert_eq!(
        kinds("void main() { float a = x; float b = y; }"),
        [DiagnosticKind::UnknownIdentifier, DiagnosticKind::UnknownIdentifier]
    );
    assert_eq!(
        kinds("void main() { float a = 1.0 +; bool b = 1.0; float c = y; }"),
        [DiagnosticKind::SyntaxError, DiagnosticKind::TypeMismatch, DiagnosticKind::UnknownIdentifier]
    );
}

#[test]
fn test_overload_errors() {
    let functions = "float f(float a, int b) { return a; } float f(int a, float b) { return b; }";
    assert_eq!(kinds(&format!("{functions} void main() {{ float x = f(1, 1); }}")), [DiagnosticKind::AmbiguousOverload]);
    assert!(parse(&format!("{functions} void main() {{ float x = f(1.0, 2); }}")).is_ok());
    assert_eq!(kinds(&format!("{functions} void main() {{ float x = f(1.0); }}")), [DiagnosticKind::ArityMismatch]);
    assert_eq!(kinds("void main() { float x = nope(1.0); }"), [DiagnosticKind::UnknownIdentifier]);
}

#[test]
fn test_lookup_function() {
    let program = parse(
        "float f(float a, int b) { return a; }
         float f(int a, float b) { return b; }
         void main() {}",
    )
    .unwrap();
    assert_eq!(program.lookup_function("f", &[Type::FLOAT, Type::INT]), Ok(FuncId::User(0)));
    assert_eq!(program.lookup_function("f", &[Type::INT, Type::INT]), Err(LookupError::AmbiguousOverload(2)));
    assert_eq!(program.lookup_function("f", &[Type::FLOAT]), Err(LookupError::NoSuchFunction));
    assert_eq!(program.lookup_function("g", &[]), Err(LookupError::NoSuchFunction));

    let id = program.lookup_function("mix", &[Type::FLOAT3, Type::FLOAT3, Type::INT]).unwrap();
    assert!(matches!(id, FuncId::Intrinsic(_)));
    assert_eq!(program.function(id).return_type(), Type::FLOAT3);
}

#[test]
fn test_per_dialect_isolation() {
    let source = "param fsampler data; void main() { color = sample(data, pos0); }";
    let output = Compiler::new().compile(source, &CompileOptions::new("FloatData"));
    assert_eq!(output.state, CompileState::GenerationFailed);
    assert!(output.shader(Dialect::Hlsl).is_some());
    assert!(output.shader(Dialect::Glsl).is_some());

    let es2 = output.results[&Dialect::Es2].as_ref().unwrap_err();
    assert_eq!(es2.len(), 1);
    assert_eq!(es2[0].kind, DiagnosticKind::UnsupportedConstruct);
    assert_eq!(&source[es2[0].span.start..es2[0].span.end], "fsampler");
}

#[test]
fn test_generated_snippets() {
    let output = Compiler::new().compile(BLEND, &CompileOptions::new("Blend.jsl").with_peer_name("BlendPeer"));
    assert!(output.is_success());

    let es2 = &output.shader(Dialect::Es2).unwrap().source;
    assert!(es2.contains("uniform sampler2D baseImg;\n"));
    assert!(es2.contains("vec4 blend(vec4 bot, vec4 top) {\n    return top + bot * (1.0 - top.a);\n}\n"));
    assert!(es2.contains("    vec4 bot = texture2D(baseImg, texCoord0);\n"));
    assert!(es2.contains("    gl_FragColor = blend(bot, top) * perVertexColor;\n"));

    let glsl = &output.shader(Dialect::Glsl).unwrap().source;
    assert!(glsl.starts_with("#version 130\n"));
    assert!(glsl.contains("    vec4 top = texture(blendImg, texCoord1) * opacity;\n"));

    let hlsl = output.shader(Dialect::Hlsl).unwrap();
    assert_eq!(hlsl.file_name, "BlendPeer.hlsl");
    assert!(hlsl.source.contains("sampler2D blendImg : register(s1);\n"));
    assert!(hlsl.source.contains("float opacity : register(c0);\n"));
    assert!(hlsl.source.contains("    float4 bot = tex2D(baseImg, pos0);\n"));

    let info = output.shader_info().unwrap();
    assert_eq!(info.sampler("blendImg").unwrap().unit, 1);
    assert_eq!(info.param("opacity").unwrap().hlsl_register.to_string(), "c0");
}

#[test]
fn test_determinism_across_threads() {
    let compiler = Compiler::new();
    let options = CompileOptions::new("Blend");
    let expected = compiler.compile(BLEND, &options);
    let jobs: Vec<CompileJob> =
        (0..8).map(|_| CompileJob { source: BLEND.to_string(), options: options.clone() }).collect();
    for output in compiler.compile_batch(&jobs) {
        assert!(output.is_success());
        assert_eq!(output.results, expected.results);
    }
}

#[test]
fn test_console_format() {
    let code = "void main() {\n    color = tint;\n}\n";
    let output = Compiler::new().compile(code, &CompileOptions::new("Tint.jsl"));
    let source = SourceFile::new("Tint.jsl", code);
    let messages: Vec<String> = output.diagnostics().map(|(_, diagnostic)| diagnostic.format_for_console(&source)).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Tint.jsl:2:13: unknown identifier: "));
}
