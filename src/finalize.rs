//! Finalize module for the Fun compiler
//!
//! Assembles the emitted program: runtime library, module code, the root
//! hook bound to its host container, hoisted declarations, then the body.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use sha2::{Digest, Sha256};

use crate::code_builder::CodeBuilder;
use crate::resolver::ModuleRecord;
use crate::validate::{CompilerError, ErrorKind};

pub struct ProgramParts<'a> {
    pub library: &'a str,
    pub modules: &'a [ModuleRecord],
    pub root_hook: &'a str,
    pub host_container: &'a str,
    pub declarations: &'a str,
    pub body: &'a str,
}

/// Digest of the generated part of the program. Identical input always
/// yields the same digest.
pub fn compute_digest(declarations: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(declarations.as_bytes());
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn assemble_program(parts: &ProgramParts<'_>) -> String {
    let mut out = CodeBuilder::new();
    out.box_comment(&format!(
        "Fun compiled output\nsha256 {}",
        compute_digest(parts.declarations, parts.body)
    ))
    .newline(1)
    .box_comment("lib.js")
    .raw(parts.library)
    .newline(1);

    for module in parts.modules {
        out.box_comment(&format!("Module {}", module.name));
        match &module.code {
            Some(code) => out.raw(code),
            None => out.code(&format!("// No JS code for {}", module.name)),
        };
        out.newline(1);
    }

    out.box_comment("Compiled output")
        .declare_hook(parts.root_hook)
        .code(&format!(
            "fun.setDOMHook({}, {});",
            parts.root_hook, parts.host_container
        ));
    if !parts.declarations.is_empty() {
        out.code(parts.declarations);
    }
    out.code(parts.body);
    out.build()
}

/// Syntax-checks the emitted program (Return Option, not Result).
pub fn verify_program(code: &str) -> Option<CompilerError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, code, source_type).parse();
    if ret.errors.is_empty() {
        return None;
    }

    let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
    Some(
        CompilerError::unlocated(
            ErrorKind::MalformedNode,
            format!("Emitted program is not valid JavaScript: {}", messages[0]),
        )
        .with_hints(messages),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parts<'a>(modules: &'a [ModuleRecord], body: &'a str) -> ProgramParts<'a> {
        ProgramParts {
            library: "var fun = {};\n\nfun.name = function() {};",
            modules,
            root_hook: "hook_1",
            host_container: "document.body",
            declarations: "",
            body,
        }
    }

    #[test]
    fn test_program_layout() {
        let modules = vec![
            ModuleRecord {
                name: "Mouse".to_string(),
                path: PathBuf::from("Modules/Mouse"),
                code: Some("fun.mouse = {};".to_string()),
            },
            ModuleRecord {
                name: "Empty".to_string(),
                path: PathBuf::from("Modules/Empty"),
                code: None,
            },
        ];
        let program = assemble_program(&parts(&modules, "debugger;"));

        let lib = program.find("var fun = {};\n\nfun.name").unwrap();
        let mouse = program.find("fun.mouse = {};").unwrap();
        let empty = program.find("// No JS code for Empty").unwrap();
        let root = program.find("fun.setDOMHook(hook_1, document.body);").unwrap();
        let body = program.find("debugger;").unwrap();
        assert!(lib < mouse && mouse < empty && empty < root && root < body);
    }

    #[test]
    fn test_digest_is_stable() {
        let a = assemble_program(&parts(&[], "x();"));
        let b = assemble_program(&parts(&[], "x();"));
        let c = assemble_program(&parts(&[], "y();"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_verify_program() {
        assert!(verify_program("var a = 1; function f() { return a; }").is_none());
        let err = verify_program("var = ;").unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedNode);
        assert!(!err.hints.is_empty());
    }
}
