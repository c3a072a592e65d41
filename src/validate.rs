use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{Node, SourceLocation};
use crate::visitor::{walk_node, AstVisitor};

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNDECLARED_ALIAS: &str = "FUN-ERR-SCOPE-001";
pub const ERR_DUPLICATE_DECLARATION: &str = "FUN-ERR-SCOPE-002";
pub const ERR_ESCAPING_BINDING: &str = "FUN-ERR-SCOPE-003";
pub const ERR_TYPE_MISMATCH: &str = "FUN-ERR-TYPE-001";
pub const ERR_INVALID_METHOD: &str = "FUN-ERR-TYPE-002";
pub const ERR_MISSING_INVOCABLE: &str = "FUN-ERR-CALL-001";
pub const ERR_UNADDRESSABLE_TARGET: &str = "FUN-ERR-MUTATION-001";
pub const ERR_MISSING_IMPORT: &str = "FUN-ERR-IMPORT-001";
pub const ERR_MISSING_MODULE: &str = "FUN-ERR-IMPORT-002";
pub const ERR_UNSUPPORTED_ATTRIBUTE: &str = "FUN-ERR-XML-001";
pub const ERR_PARSE: &str = "FUN-ERR-PARSE-001";
pub const ERR_IO: &str = "FUN-ERR-IO-001";
pub const ERR_MALFORMED_NODE: &str = "FUN-ERR-GEN-001";
pub const ERR_MISSING_LIBRARY: &str = "FUN-ERR-GEN-002";
pub const ERR_UNRESOLVED_NODE: &str = "FUN-ERR-GEN-003";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Resolution
    UndeclaredAlias,
    DuplicateDeclaration,
    EscapingBinding,
    TypeMismatch,
    InvalidMethod,
    MissingInvocable,
    UnaddressableMutationTarget,
    MissingImport,
    MissingModule,
    UnsupportedAttribute,
    Parse,
    Io,
    // Generation
    MalformedNode,
    MissingLibrary,
    UnresolvedNode,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UndeclaredAlias => ERR_UNDECLARED_ALIAS,
            ErrorKind::DuplicateDeclaration => ERR_DUPLICATE_DECLARATION,
            ErrorKind::EscapingBinding => ERR_ESCAPING_BINDING,
            ErrorKind::TypeMismatch => ERR_TYPE_MISMATCH,
            ErrorKind::InvalidMethod => ERR_INVALID_METHOD,
            ErrorKind::MissingInvocable => ERR_MISSING_INVOCABLE,
            ErrorKind::UnaddressableMutationTarget => ERR_UNADDRESSABLE_TARGET,
            ErrorKind::MissingImport => ERR_MISSING_IMPORT,
            ErrorKind::MissingModule => ERR_MISSING_MODULE,
            ErrorKind::UnsupportedAttribute => ERR_UNSUPPORTED_ATTRIBUTE,
            ErrorKind::Parse => ERR_PARSE,
            ErrorKind::Io => ERR_IO,
            ErrorKind::MalformedNode => ERR_MALFORMED_NODE,
            ErrorKind::MissingLibrary => ERR_MISSING_LIBRARY,
            ErrorKind::UnresolvedNode => ERR_UNRESOLVED_NODE,
        }
    }

    pub fn is_generation(self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedNode | ErrorKind::MissingLibrary | ErrorKind::UnresolvedNode
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UndeclaredAlias => "Every alias refers to a name declared in an enclosing scope.",
        ErrorKind::DuplicateDeclaration => "A name is declared at most once per scope level.",
        ErrorKind::EscapingBinding => {
            "Hoisted templates and handlers only use their own arguments and loop items."
        }
        ErrorKind::TypeMismatch => "Values are only used where their inferred type is accepted.",
        ErrorKind::InvalidMethod => "Mutations only call methods defined for the target's type.",
        ErrorKind::MissingInvocable => "Every invocation refers to a declared template or handler.",
        ErrorKind::UnaddressableMutationTarget => {
            "Mutation targets are addressable data objects, never local constants."
        }
        ErrorKind::MissingImport => "Imported files exist relative to the project root.",
        ErrorKind::MissingModule => "Imported modules exist as directories under the modules root.",
        ErrorKind::UnsupportedAttribute => "XML attribute names have a single segment.",
        ErrorKind::Parse => "Sources handed to the resolver parse into a valid AST.",
        ErrorKind::Io => "Source files referenced by the program are readable.",
        ErrorKind::MalformedNode => "The generator only receives well-formed resolved nodes.",
        ErrorKind::MissingLibrary => "The runtime library is emitted with every program.",
        ErrorKind::UnresolvedNode => "No alias, declaration or import survives resolution.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message} (on line {line}, column {column} of \"{file}\")")]
pub struct CompilerError {
    pub code: String,
    pub kind: ErrorKind,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

pub type FunResult<T> = Result<T, CompilerError>;

impl CompilerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: &SourceLocation) -> Self {
        CompilerError {
            code: kind.code().to_string(),
            kind,
            error_type: if kind.is_generation() {
                "GENERATION_ERROR".to_string()
            } else {
                "RESOLUTION_ERROR".to_string()
            },
            message: message.into(),
            guarantee: get_guarantee(kind).to_string(),
            file: location.file.clone(),
            line: location.line,
            column: location.column,
            context: None,
            hints: vec![],
        }
    }

    pub fn unlocated(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, &SourceLocation::default())
    }

    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Attributes an error raised inside an imported file to that file.
    pub fn in_file(mut self, file: &str) -> Self {
        if self.file.is_empty() {
            self.file = file.to_string();
        }
        self
    }
}

/// Renders the offending source line with a caret under the failing column.
pub fn render_source_context(source: &str, line: u32, column: u32, span: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    let text = source.lines().nth(line as usize - 1)?;
    let offset = column.saturating_sub(1) as usize;
    let width = span.max(1) as usize;
    Some(format!(
        "{:>4} | {}\n     | {}{}",
        line,
        text,
        " ".repeat(offset),
        "^".repeat(width)
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVED AST VALIDATION (Return Option, not Result)
// ═══════════════════════════════════════════════════════════════════════════════

struct UnresolvedFinder {
    found: Option<CompilerError>,
}

impl AstVisitor for UnresolvedFinder {
    fn visit_node(&mut self, node: &Node) {
        if self.found.is_some() {
            return;
        }
        match node {
            Node::Alias(_)
            | Node::Declaration(_)
            | Node::ImportModule(_)
            | Node::ImportFile(_) => {
                self.found = Some(CompilerError::new(
                    ErrorKind::UnresolvedNode,
                    format!("{} node survived resolution.", node.type_name()),
                    node.location(),
                ));
            }
            _ => walk_node(self, node),
        }
    }
}

/// Checks that nothing the resolver is responsible for eliminating is left
/// in the tree. Object literals may remain, but not aliases inside them.
pub fn validate_resolved(nodes: &[Node]) -> Option<CompilerError> {
    let mut finder = UnresolvedFinder { found: None };
    finder.visit_nodes(nodes);
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_source_context() {
        let source = "let a = 1\nlet a = 2\n";
        let rendered = render_source_context(source, 2, 5, 1).unwrap();
        assert!(rendered.contains("let a = 2"));
        assert!(rendered.ends_with("    ^"));
        assert!(render_source_context(source, 9, 1, 1).is_none());
    }

    #[test]
    fn test_error_codes_and_display() {
        let err = CompilerError::new(
            ErrorKind::DuplicateDeclaration,
            "Repeat declaration of \"a\"",
            &SourceLocation::new("main.fun", 3, 1),
        );
        assert_eq!(err.code, ERR_DUPLICATE_DECLARATION);
        assert_eq!(err.error_type, "RESOLUTION_ERROR");
        assert_eq!(
            err.to_string(),
            "Repeat declaration of \"a\" (on line 3, column 1 of \"main.fun\")"
        );
        let gen = CompilerError::unlocated(ErrorKind::MissingLibrary, "no lib");
        assert_eq!(gen.error_type, "GENERATION_ERROR");
    }

    #[test]
    fn test_validate_resolved_flags_aliases() {
        let nodes = vec![Node::text("ok"), Node::alias("left.over")];
        let err = validate_resolved(&nodes).unwrap();
        assert_eq!(err.kind, ErrorKind::UnresolvedNode);
        assert!(err.message.contains("ALIAS"));
        assert!(validate_resolved(&[Node::text("ok")]).is_none());
    }
}
