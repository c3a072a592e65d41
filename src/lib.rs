//! # Fun compiler
//!
//! Resolves and compiles Fun, a small reactive templating language, into
//! JavaScript that drives the `fun` runtime library.
//!
//! ## Pipeline
//!
//! 1. **Resolve** (`resolver`): imports are inlined, declarations bound into
//!    lexical scopes, aliases replaced by their values, types checked.
//! 2. **Validate** (`validate`): nothing the resolver eliminates survives.
//! 3. **Generate** (`codegen`): hooks, observers, and the if/else and
//!    for-loop state machines are emitted through `code_builder`.
//! 4. **Finalize** (`finalize`): library, module code and the compiled body
//!    are assembled into one program.
//!
//! ## Invariants
//!
//! 1. A name is declared at most once per scope level; inner scopes may shadow.
//! 2. Sibling scopes never see each other's declarations.
//! 3. Mutation targets are always addressable data objects.
//! 4. Compilation yields a complete program or a structured failure, never
//!    a partial program.

#[cfg(feature = "napi")]
use napi_derive::napi;

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub mod ast;
pub mod cache;
pub mod code_builder;
pub mod codegen;
pub mod config;
pub mod discovery;
pub mod finalize;
pub mod names;
pub mod parse;
pub mod resolver;
pub mod scope;
pub mod types;
pub mod validate;
pub mod visitor;

#[cfg(test)]
mod resolver_tests;

pub use ast::Node;
pub use config::CompilerConfig;
pub use parse::{JsonSourceParser, SourceParser};
pub use resolver::{ModuleRecord, Resolution, Resolver};
pub use validate::*;

use codegen::{GenContext, Generator};
use finalize::{assemble_program, verify_program, ProgramParts};
use scope::Scope;

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

/// What an embedder receives when compilation does not produce a program.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{error}")]
pub struct CompileFailure {
    pub error: String,
    pub path: Option<String>,
    pub detail: Option<CompilerError>,
    pub cause: Option<String>,
}

impl CompileFailure {
    fn from_error(error: &str, detail: CompilerError) -> Self {
        CompileFailure {
            error: error.to_string(),
            path: if detail.file.is_empty() {
                None
            } else {
                Some(detail.file.clone())
            },
            cause: Some(detail.to_string()),
            detail: Some(detail),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves `ast` in a fresh context.
pub fn resolve(ast: Vec<Node>, config: &CompilerConfig, parser: &dyn SourceParser) -> FunResult<Resolution> {
    let mut resolver = Resolver::new(config, parser);
    let root = Scope::root();
    let resolved = resolver.resolve_in(&root, ast)?;
    Ok(resolver.finish(resolved))
}

/// Generates the emitted program for an already resolved AST.
pub fn compile(resolution: &Resolution, config: &CompilerConfig) -> Result<String, CompileFailure> {
    let library = fs::read_to_string(&config.library_path).map_err(|e| CompileFailure {
        error: "Could not read library file".to_string(),
        path: Some(config.library_path.to_string_lossy().to_string()),
        detail: Some(CompilerError::unlocated(
            ErrorKind::MissingLibrary,
            format!("Could not read {}", config.library_path.display()),
        )),
        cause: Some(e.to_string()),
    })?;

    let mut generator = Generator::new();
    let root_hook = generator.hook();
    let references = Scope::root();
    let ctx = GenContext::new(&root_hook, &references);

    let generated = generator
        .compile_declarations(&ctx, &resolution.declarations)
        .and_then(|declarations| {
            generator
                .compile_statements(&ctx, &resolution.ast)
                .map(|body| (declarations, body))
        });
    let (declarations, body) =
        generated.map_err(|e| CompileFailure::from_error("Could not compile", e))?;

    let program = assemble_program(&ProgramParts {
        library: &library,
        modules: &resolution.modules,
        root_hook: &root_hook,
        host_container: &config.host_container,
        declarations: &declarations,
        body: &body,
    });

    if config.verify_output {
        if let Some(e) = verify_program(&program) {
            return Err(CompileFailure::from_error("Could not compile", e));
        }
    }

    debug!(
        "Compiled {} statements and {} declarations into {} bytes",
        resolution.ast.len(),
        resolution.declarations.len(),
        program.len()
    );
    Ok(program)
}

/// Resolves, validates and compiles `ast` in one go.
pub fn compile_program(
    ast: Vec<Node>,
    config: &CompilerConfig,
    parser: &dyn SourceParser,
) -> Result<String, CompileFailure> {
    let resolution = resolve(ast, config, parser)
        .map_err(|e| CompileFailure::from_error("Could not resolve", e))?;
    if let Some(e) = validate_resolved(&resolution.ast) {
        return Err(CompileFailure::from_error("Could not resolve", e));
    }
    compile(&resolution, config)
}

/// Reads, parses and compiles a source file. Failures located in a file
/// that can be read carry the offending line as context.
pub fn compile_file(
    path: &Path,
    config: &CompilerConfig,
    parser: &dyn SourceParser,
) -> Result<String, CompileFailure> {
    let file = path.to_string_lossy().to_string();
    let source = fs::read_to_string(path).map_err(|e| CompileFailure {
        error: "Could not read source file".to_string(),
        path: Some(file.clone()),
        detail: None,
        cause: Some(e.to_string()),
    })?;

    let ast = parser
        .parse(&source, &file)
        .map_err(|e| CompileFailure::from_error("Could not parse", with_source_context(e)))?;
    compile_program(ast, config, parser).map_err(|mut failure| {
        failure.detail = failure.detail.map(|detail| {
            if detail.kind.is_generation() {
                detail
            } else {
                with_source_context(detail.in_file(&file))
            }
        });
        failure
    })
}

fn with_source_context(error: CompilerError) -> CompilerError {
    if error.file.is_empty() || error.context.is_some() {
        return error;
    }
    let context = fs::read_to_string(&error.file)
        .ok()
        .and_then(|source| render_source_context(&source, error.line, error.column, 1));
    error.with_context(context)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles a JSON AST with a JSON config. Returns the program, or the
/// serialized `CompileFailure` as the error reason.
#[cfg(feature = "napi")]
#[napi]
pub fn compile_fun_native(ast_json: String, config_json: Option<String>) -> napi::Result<String> {
    let config = match config_json {
        Some(json) => CompilerConfig::from_json_str(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => CompilerConfig::default(),
    };
    let parser = JsonSourceParser;
    let ast = parser
        .parse(&ast_json, "<input>")
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    compile_program(ast, &config, &parser).map_err(|failure| {
        let reason = serde_json::to_string(&failure).unwrap_or_else(|_| failure.error.clone());
        napi::Error::from_reason(reason)
    })
}
