use crate::error::JslcError;
use clap::{App, AppSettings, Arg, ArgMatches};
use jsl_shader_compiler::{CompileJob, CompileOptions, CompileOutput, Compiler, Dialect, SourceFile};
use log::{error, info};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

struct JslcOpts {
    inputs: Vec<PathBuf>,
    out_dir: PathBuf,
    dialects: Vec<Dialect>,
    name: Option<String>,
    peer: Option<String>,
    manifest: bool,
    check: bool,
    print_ast: bool,
}

/// Returns the process exit code.
pub(crate) fn cmd() -> i32 {
    // Use "info" logging level by default.
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let matches = App::new("JSL Shader Compiler")
        .setting(AppSettings::ArgRequiredElseHelp)
        .about(env!["CARGO_PKG_DESCRIPTION"])
        .version(env!("CARGO_PKG_VERSION"))
        .arg(Arg::new("input").takes_value(true).multiple_values(true).required(true).help("JSL source files"))
        .arg(Arg::new("out-dir").short('o').long("out-dir").takes_value(true).default_value(".").help("Output directory"))
        .arg(
            Arg::new("dialect")
                .short('d')
                .long("dialect")
                .takes_value(true)
                .multiple_occurrences(true)
                .possible_values(["es2", "glsl", "hlsl", "all"])
                .default_value("all")
                .help("Dialects to generate"),
        )
        .arg(Arg::new("name").long("name").takes_value(true).help("Program name (default: input file stem)"))
        .arg(Arg::new("peer").long("peer").takes_value(true).help("Base name of the output files (default: input file stem)"))
        .arg(Arg::new("manifest").long("manifest").takes_value(false).help("Also write <peer>.json with parameter metadata"))
        .arg(Arg::new("check").long("check").takes_value(false).help("Validate only, write nothing"))
        .arg(Arg::new("print-ast").long("print-ast").takes_value(false).help("Print the parsed program to stdout"))
        .get_matches();

    let result = parse_opts(&matches).and_then(|opts| run(&opts));
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

fn parse_opts(matches: &ArgMatches) -> Result<JslcOpts, JslcError> {
    let inputs: Vec<PathBuf> = matches.values_of("input").into_iter().flatten().map(PathBuf::from).collect();
    let mut dialects = Vec::new();
    for value in matches.values_of("dialect").into_iter().flatten() {
        if value == "all" {
            dialects.extend(Dialect::all());
        } else {
            dialects.push(value.parse::<Dialect>()?);
        }
    }
    let name = matches.value_of("name").map(String::from);
    let peer = matches.value_of("peer").map(String::from);
    if (name.is_some() || peer.is_some()) && inputs.len() != 1 {
        return Err(JslcError::NamedManyInputs(inputs.len()));
    }
    Ok(JslcOpts {
        inputs,
        out_dir: PathBuf::from(matches.value_of("out-dir").unwrap_or(".")),
        dialects,
        name,
        peer,
        manifest: matches.is_present("manifest"),
        check: matches.is_present("check"),
        print_ast: matches.is_present("print-ast"),
    })
}

/// Compiles every input; returns whether all of them succeeded for every dialect.
fn run(opts: &JslcOpts) -> Result<bool, JslcError> {
    let mut sources = Vec::new();
    let mut jobs = Vec::new();
    for path in &opts.inputs {
        let code = fs::read_to_string(path).map_err(|source| JslcError::Read { path: path.display().to_string(), source })?;
        let stem = file_stem(path);
        let options = CompileOptions::new(opts.name.clone().unwrap_or_else(|| stem.clone()))
            .with_peer_name(opts.peer.clone().unwrap_or(stem))
            .with_dialects(&opts.dialects);
        sources.push(SourceFile::new(path.display().to_string(), code.as_str()));
        jobs.push(CompileJob { source: code, options });
    }

    let outputs = Compiler::new().compile_batch(&jobs);

    if !opts.check {
        fs::create_dir_all(&opts.out_dir)
            .map_err(|source| JslcError::Write { path: opts.out_dir.display().to_string(), source })?;
    }
    let mut success = true;
    for ((source, job), output) in sources.iter().zip(&jobs).zip(&outputs) {
        for (dialect, diagnostic) in output.diagnostics() {
            match dialect {
                Some(dialect) => error!("[{dialect}] {}", diagnostic.format_for_console(source)),
                None => error!("{}", diagnostic.format_for_console(source)),
            }
        }
        success &= output.is_success();

        if opts.print_ast {
            if let Some(program) = &output.program {
                print!("{program}");
            }
        }
        if opts.check {
            continue;
        }
        for shader in output.results.values().flatten() {
            write_file(&opts.out_dir.join(&shader.file_name), &shader.source)?;
        }
        if opts.manifest && output.program.is_some() {
            let manifest = serde_json::to_string_pretty(&manifest(&job.options, output))?;
            write_file(&opts.out_dir.join(format!("{}.json", job.options.peer_name)), &manifest)?;
        }
    }
    Ok(success)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map_or_else(|| String::from("shader"), |stem| stem.to_string_lossy().into_owned())
}

fn write_file(path: &Path, contents: &str) -> Result<(), JslcError> {
    fs::write(path, contents).map_err(|source| JslcError::Write { path: path.display().to_string(), source })?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Parameter metadata for the host, next to the generated shaders.
fn manifest(options: &CompileOptions, output: &CompileOutput) -> Value {
    let info = output.shader_info().unwrap_or_default();
    let shaders: serde_json::Map<String, Value> = output
        .results
        .values()
        .flatten()
        .map(|shader| (shader.dialect.to_string(), Value::from(shader.file_name.clone())))
        .collect();
    let params: Vec<Value> = info
        .params
        .iter()
        .map(|param| {
            json!({
                "name": param.name,
                "type": param.ty.to_string(),
                "arraySize": param.array_size,
                "hlslRegister": param.hlsl_register.to_string(),
            })
        })
        .collect();
    let samplers: Vec<Value> = info
        .samplers
        .iter()
        .map(|sampler| json!({ "name": sampler.name, "kind": sampler.kind.as_str(), "unit": sampler.unit }))
        .collect();
    json!({
        "name": options.program_name,
        "peer": options.peer_name,
        "shaders": shaders,
        "params": params,
        "samplers": samplers,
        "pixCoordOffset": info.pixcoord_offset.map(|register| register.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest() {
        let options = CompileOptions::new("Blend").with_dialects(&[Dialect::Es2, Dialect::Hlsl]);
        let output = Compiler::new().compile(
            "param sampler img; param float3 weights[2]; void main() { color = sample(img, pos0) * weights[0].x; }",
            &options,
        );
        assert_eq!(
            manifest(&options, &output),
            json!({
                "name": "Blend",
                "peer": "Blend",
                "shaders": { "es2": "Blend.frag", "hlsl": "Blend.hlsl" },
                "params": [{ "name": "weights", "type": "float3", "arraySize": 2, "hlslRegister": "c0" }],
                "samplers": [{ "name": "img", "kind": "sampler", "unit": 0 }],
                "pixCoordOffset": null,
            })
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("effects/Blend_SRC_OVER.jsl")), "Blend_SRC_OVER");
    }
}
