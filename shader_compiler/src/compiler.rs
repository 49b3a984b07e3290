//! Runs one program through the whole pipeline: parse once, then generate once per
//! requested dialect.

use crate::error::Diagnostic;
use crate::generate::{generate_shader, Dialect};
use crate::info::ShaderInfo;
use crate::shaderast::ProgramUnit;
use crate::shaderparser::parse;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::thread;

#[derive(Clone, Debug, PartialEq)]
pub struct CompileOptions {
    /// Name used in logs and diagnostics, usually the source file name.
    pub program_name: String,
    /// Base name of the generated files.
    pub peer_name: String,
    pub dialects: Vec<Dialect>,
}

impl CompileOptions {
    /// Targets every dialect, with the peer named after the program.
    pub fn new(program_name: impl Into<String>) -> Self {
        let program_name = program_name.into();
        CompileOptions { peer_name: program_name.clone(), program_name, dialects: Dialect::all().to_vec() }
    }

    pub fn with_peer_name(mut self, peer_name: impl Into<String>) -> Self {
        self.peer_name = peer_name.into();
        self
    }

    pub fn with_dialects(mut self, dialects: &[Dialect]) -> Self {
        self.dialects = dialects.to_vec();
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompileState {
    Idle,
    Parsing,
    Parsed,
    ParseFailed,
    Generating(Dialect),
    Done,
    /// Parsing succeeded but at least one dialect did not.
    GenerationFailed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedShader {
    pub dialect: Dialect,
    pub file_name: String,
    pub source: String,
}

#[derive(Clone, Debug)]
pub struct CompileOutput {
    pub state: CompileState,
    /// `None` when parsing failed.
    pub program: Option<ProgramUnit>,
    pub parse_diagnostics: Vec<Diagnostic>,
    /// One entry per requested dialect; empty when parsing failed.
    pub results: BTreeMap<Dialect, Result<GeneratedShader, Vec<Diagnostic>>>,
}

impl CompileOutput {
    pub fn is_success(&self) -> bool {
        self.state == CompileState::Done
    }

    /// Every diagnostic, parse diagnostics first, then per dialect in dialect order.
    pub fn diagnostics(&self) -> impl Iterator<Item = (Option<Dialect>, &Diagnostic)> {
        let parse_diagnostics = self.parse_diagnostics.iter().map(|diagnostic| (None, diagnostic));
        let generate_diagnostics = self.results.iter().flat_map(|(dialect, result)| {
            let diagnostics: &[Diagnostic] = match result {
                Ok(_) => &[],
                Err(diagnostics) => diagnostics,
            };
            diagnostics.iter().map(move |diagnostic| (Some(*dialect), diagnostic))
        });
        parse_diagnostics.chain(generate_diagnostics)
    }

    pub fn shader(&self, dialect: Dialect) -> Option<&GeneratedShader> {
        self.results.get(&dialect).and_then(|result| result.as_ref().ok())
    }

    pub fn shader_info(&self) -> Option<ShaderInfo> {
        self.program.as_ref().map(ShaderInfo::from_program)
    }
}

/// One program of a [`Compiler::compile_batch`].
#[derive(Clone, Debug)]
pub struct CompileJob {
    pub source: String,
    pub options: CompileOptions,
}

/// Entry point of the library. Holds no state between compilations, so one
/// instance can be shared by any number of threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Compiler
    }

    pub fn compile(&self, source: &str, options: &CompileOptions) -> CompileOutput {
        let name = &options.program_name;
        let mut output = CompileOutput {
            state: CompileState::Idle,
            program: None,
            parse_diagnostics: Vec::new(),
            results: BTreeMap::new(),
        };

        transition(name, &mut output.state, CompileState::Parsing);
        let program = match parse(source) {
            Ok(program) => program,
            Err(diagnostics) => {
                debug!("{name}: parsing failed with {} diagnostic(s)", diagnostics.len());
                output.parse_diagnostics = diagnostics;
                transition(name, &mut output.state, CompileState::ParseFailed);
                return output;
            }
        };
        debug!("{name}: parsed {} declaration(s)", program.decls().len());
        transition(name, &mut output.state, CompileState::Parsed);

        let mut failed = false;
        for &dialect in &options.dialects {
            if output.results.contains_key(&dialect) {
                continue;
            }
            transition(name, &mut output.state, CompileState::Generating(dialect));
            let result = generate_shader(&program, dialect).map(|source| GeneratedShader {
                dialect,
                file_name: format!("{}.{}", options.peer_name, dialect.file_extension()),
                source,
            });
            match &result {
                Ok(shader) => debug!("{name}: generated {} ({} bytes)", shader.file_name, shader.source.len()),
                Err(diagnostics) => {
                    debug!("{name}: {dialect} generation failed with {} diagnostic(s)", diagnostics.len());
                    failed = true;
                }
            }
            output.results.insert(dialect, result);
        }

        let state = if failed { CompileState::GenerationFailed } else { CompileState::Done };
        transition(name, &mut output.state, state);
        output.program = Some(program);
        output
    }

    /// Compiles independent programs in parallel. Jobs are split into contiguous
    /// chunks, one scoped thread per chunk, with no more threads than the machine
    /// runs in parallel. Outputs are in job order.
    pub fn compile_batch(&self, jobs: &[CompileJob]) -> Vec<CompileOutput> {
        if jobs.is_empty() {
            return Vec::new();
        }
        let workers = thread::available_parallelism().map_or(1, |count| count.get()).min(jobs.len());
        let chunk_size = (jobs.len() + workers - 1) / workers;
        debug!("compiling {} program(s) on {} thread(s)", jobs.len(), (jobs.len() + chunk_size - 1) / chunk_size);
        thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|job| self.compile(&job.source, &job.options)).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}

fn transition(name: &str, state: &mut CompileState, next: CompileState) {
    trace!("{name}: {:?} -> {:?}", state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    #[test]
    fn test_compile_all_dialects() {
        let options = CompileOptions::new("Tint").with_peer_name("TintPeer");
        let output = Compiler::new().compile("param float4 tint; void main() { color = tint; }", &options);
        assert!(output.is_success());
        assert_eq!(output.results.len(), 3);
        assert_eq!(output.shader(Dialect::Es2).unwrap().file_name, "TintPeer.frag");
        assert_eq!(output.shader(Dialect::Glsl).unwrap().file_name, "TintPeer.glsl");
        assert_eq!(output.shader(Dialect::Hlsl).unwrap().file_name, "TintPeer.hlsl");
        assert_eq!(output.diagnostics().count(), 0);
        assert_eq!(output.shader_info().unwrap().params.len(), 1);
    }

    #[test]
    fn test_parse_failure() {
        let output = Compiler::new().compile("void main() { color = bogus; }", &CompileOptions::new("Bad"));
        assert_eq!(output.state, CompileState::ParseFailed);
        assert!(output.program.is_none());
        assert!(output.results.is_empty());
        let kinds: Vec<_> = output.diagnostics().map(|(dialect, diagnostic)| (dialect, diagnostic.kind)).collect();
        assert_eq!(kinds, [(None, DiagnosticKind::UnknownIdentifier)]);
    }

    #[test]
    fn test_batch_keeps_job_order() {
        let jobs: Vec<CompileJob> = (0..40)
            .map(|index| CompileJob {
                source: if index % 7 == 3 {
                    String::from("void main() { color = nope; }")
                } else {
                    format!("void main() {{ color = float4({}.0); }}", index)
                },
                options: CompileOptions::new(format!("Job{}", index)).with_dialects(&[Dialect::Hlsl]),
            })
            .collect();
        let outputs = Compiler::new().compile_batch(&jobs);
        assert_eq!(outputs.len(), jobs.len());
        for (index, output) in outputs.iter().enumerate() {
            assert_eq!(output.is_success(), index % 7 != 3);
            if let Some(shader) = output.shader(Dialect::Hlsl) {
                assert_eq!(shader.file_name, format!("Job{}.hlsl", index));
                assert!(shader.source.contains(&format!("color = ((float4)({}.0));", index)), "{}", shader.source);
            }
        }
        assert!(Compiler::new().compile_batch(&[]).is_empty());
    }

    #[test]
    fn test_selected_dialects() {
        let options = CompileOptions::new("Bits").with_dialects(&[Dialect::Glsl, Dialect::Es2, Dialect::Glsl]);
        let output = Compiler::new().compile("void main() { int a = 5 & 3; }", &options);
        assert_eq!(output.state, CompileState::GenerationFailed);
        assert_eq!(output.results.len(), 2);
        assert!(output.shader(Dialect::Glsl).is_some());
        let failures: Vec<_> = output.diagnostics().map(|(dialect, _)| dialect).collect();
        assert_eq!(failures, [Some(Dialect::Es2)]);
    }
}
