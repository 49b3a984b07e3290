use jsl_shader_compiler::UnknownDialect;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JslcError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error(transparent)]
    Dialect(#[from] UnknownDialect),

    #[error("--name and --peer need exactly one input, got {0}")]
    NamedManyInputs(usize),

    #[error("failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
