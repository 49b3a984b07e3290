//! Compiles JSL effect programs, a small C-like shading language over float, int,
//! bool and sampler types, into GLSL ES 1.00, desktop GLSL 1.30 and HLSL shader
//! source.
//!
//! Use [`Compiler::compile`] for the whole pipeline, or [`parse`] followed by
//! [`generate_shader`] to drive the stages by hand.

// We want to use links to private fields, since we use `--document-private-items`.
#![allow(rustdoc::private_intra_doc_links)]
#![warn(clippy::all)]

mod builtin;
mod compiler;
mod detok;
mod env;
pub mod error;
mod function;
mod generate;
pub mod generate_glsl;
pub mod generate_hlsl;
mod ident;
mod info;
mod lex;
mod lhs_check;
mod lit;
mod op;
mod pretty;
mod shaderast;
mod shaderparser;
pub mod source;
pub mod span;
mod swizzle;
mod token;
pub mod ty;
mod ty_check;
mod visitor;

pub use builtin::{intrinsics, is_intrinsic_name};
pub use compiler::{CompileJob, CompileOptions, CompileOutput, CompileState, Compiler, GeneratedShader};
pub use error::{Diagnostic, DiagnosticKind};
pub use function::{FuncId, Function, LookupError, Param};
pub use generate::{generate_shader, Dialect, UnknownDialect};
pub use ident::Ident;
pub use info::{ParamInfo, SamplerInfo, SamplerKind, ShaderInfo};
pub use lit::Lit;
pub use op::{BinaryOpType, OpCategory, UnaryOpType};
pub use shaderast::*;
pub use shaderparser::parse;
pub use source::SourceFile;
pub use swizzle::Swizzle;
pub use visitor::TreeVisitor;
