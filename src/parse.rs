//! Parse seam.
//!
//! Tokenizing and parsing Fun surface syntax happens upstream. The resolver
//! only needs something that turns the text of an imported file into AST
//! nodes, which is what `SourceParser` abstracts.

use crate::ast::{Node, SourceLocation};
use crate::validate::{CompilerError, ErrorKind, FunResult};

pub trait SourceParser {
    fn parse(&self, source: &str, file: &str) -> FunResult<Vec<Node>>;
}

/// Reads files that hold an already-parsed AST serialized as JSON: either
/// an array of statements or a single statement.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSourceParser;

impl SourceParser for JsonSourceParser {
    fn parse(&self, source: &str, file: &str) -> FunResult<Vec<Node>> {
        let trimmed = source.trim_start();
        let parsed = if trimmed.starts_with('[') {
            serde_json::from_str::<Vec<Node>>(source)
        } else {
            serde_json::from_str::<Node>(source).map(|node| vec![node])
        };
        let mut nodes = parsed.map_err(|e| {
            CompilerError::new(
                ErrorKind::Parse,
                format!("Could not parse AST: {}", e),
                &SourceLocation::new(file, e.line() as u32, e.column() as u32),
            )
        })?;
        for node in &mut nodes {
            stamp_file(node, file);
        }
        Ok(nodes)
    }
}

/// Top-level statements without a file get the file they were read from,
/// so diagnostics raised while resolving them point at the right source.
fn stamp_file(node: &mut Node, file: &str) {
    let location = match node {
        Node::ImportModule(n) => &mut n.location,
        Node::ImportFile(n) => &mut n.location,
        Node::Declaration(n) => &mut n.location,
        Node::Alias(n) => &mut n.location,
        Node::Xml(n) => &mut n.location,
        Node::IfStatement(n) => &mut n.location,
        Node::ForLoop(n) => &mut n.location,
        Node::Mutation(n) => &mut n.location,
        Node::Invocation(n) => &mut n.location,
        _ => return,
    };
    if location.file.is_empty() {
        location.file = file.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_array_and_single_node() {
        let parser = JsonSourceParser;
        let many = parser
            .parse(r#"[{"type": "STATIC_VALUE", "value": "a"}, {"type": "DEBUGGER"}]"#, "a.fun")
            .unwrap();
        assert_eq!(many.len(), 2);
        let one = parser
            .parse(r#"{"type": "ALIAS", "namespace": ["x"]}"#, "b.fun")
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].location().file, "b.fun");
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = JsonSourceParser
            .parse("[\n  {\"type\": \"NOPE\"}\n]", "bad.fun")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.file, "bad.fun");
        assert_eq!(err.line, 2);
    }
}
