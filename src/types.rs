//! Type registry: the named base types, static inference over resolved
//! nodes, and which mutation methods each type accepts.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ast::{Literal, Node};
use crate::validate::{CompilerError, ErrorKind, FunResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FunType {
    Text,
    Number,
    List,
    Item,
    Handler,
    Template,
    Anything,
}

impl FunType {
    pub fn name(&self) -> &'static str {
        match self {
            FunType::Text => "Text",
            FunType::Number => "Number",
            FunType::List => "List",
            FunType::Item => "Item",
            FunType::Handler => "Handler",
            FunType::Template => "Template",
            FunType::Anything => "Anything",
        }
    }
}

lazy_static! {
    static ref METHODS: HashMap<FunType, &'static [&'static str]> = {
        let mut m: HashMap<FunType, &'static [&'static str]> = HashMap::new();
        m.insert(FunType::Text, &["set", "append", "prepend"]);
        m.insert(FunType::Number, &["set", "add", "subtract", "increment", "decrement"]);
        m.insert(
            FunType::List,
            &["push", "unshift", "pop", "shift", "insert", "remove", "set", "clear"],
        );
        m.insert(FunType::Item, &["set"]);
        m.insert(FunType::Handler, &[]);
        m.insert(FunType::Template, &[]);
        m
    };
}

/// Methods valid on a value of type `ty`. `Anything` accepts the union.
pub fn methods_for(ty: FunType) -> Vec<&'static str> {
    match ty {
        FunType::Anything => {
            let mut all: Vec<&'static str> = METHODS.values().flat_map(|m| m.iter().copied()).collect();
            all.sort_unstable();
            all.dedup();
            all
        }
        other => METHODS.get(&other).map(|m| m.to_vec()).unwrap_or_default(),
    }
}

/// Static type of a resolved node. Anything whose value only exists at
/// runtime is `Anything`.
pub fn type_of(node: &Node) -> FunType {
    match node {
        Node::StaticValue(s) => match s.value {
            Literal::Text(_) => FunType::Text,
            Literal::Number(_) => FunType::Number,
        },
        Node::List(_) => FunType::List,
        Node::Item(_) => FunType::Item,
        Node::Reference(r) => r.data_type.unwrap_or(FunType::Anything),
        Node::Handler(_) => FunType::Handler,
        Node::Template(_) => FunType::Template,
        Node::Composite(c) => {
            let (left, right) = (type_of(&c.left), type_of(&c.right));
            match c.operator.as_str() {
                "+" if left == FunType::Text || right == FunType::Text => FunType::Text,
                "+" | "-" | "*" | "/" | "%"
                    if left == FunType::Number && right == FunType::Number =>
                {
                    FunType::Number
                }
                _ => FunType::Anything,
            }
        }
        _ => FunType::Anything,
    }
}

/// Infers the type of `node` and checks it against `allowed`. An empty
/// `allowed` accepts any type, and `Anything` is accepted everywhere.
pub fn infer(node: &Node, allowed: &[FunType]) -> FunResult<FunType> {
    let ty = type_of(node);
    if allowed.is_empty() || ty == FunType::Anything || allowed.contains(&ty) {
        return Ok(ty);
    }
    let expected: Vec<&str> = allowed.iter().map(|t| t.name()).collect();
    Err(CompilerError::new(
        ErrorKind::TypeMismatch,
        format!(
            "Expected a value of type {} but found {} ({})",
            expected.join(" or "),
            ty.name(),
            node.type_name()
        ),
        node.location(),
    ))
}

/// Checks that `method` may be called on the value `target`.
pub fn infer_by_method(target: &Node, method: &str) -> FunResult<FunType> {
    let ty = type_of(target);
    let methods = methods_for(ty);
    if methods.contains(&method) {
        return Ok(ty);
    }
    Err(CompilerError::new(
        ErrorKind::InvalidMethod,
        format!("\"{}\" is not a valid method for type {}", method, ty.name()),
        target.location(),
    )
    .with_hints(vec![format!(
        "Valid methods for {}: {}",
        ty.name(),
        methods.join(", ")
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompositeNode, ListNode, ReferenceKind, SourceLocation};

    #[test]
    fn test_static_inference() {
        assert_eq!(type_of(&Node::text("a")), FunType::Text);
        assert_eq!(type_of(&Node::number(2.0)), FunType::Number);
        let list = Node::List(ListNode {
            content: vec![],
            location: SourceLocation::default(),
        });
        assert_eq!(infer(&list, &[FunType::List]).unwrap(), FunType::List);
    }

    #[test]
    fn test_infer_rejects_wrong_type() {
        let err = infer(&Node::text("a"), &[FunType::List]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(err.message.contains("List"));
    }

    #[test]
    fn test_untyped_reference_is_anything() {
        let r = Node::reference(ReferenceKind::Local, "items", None);
        assert_eq!(infer(&r, &[FunType::List]).unwrap(), FunType::Anything);
        let typed = Node::reference(ReferenceKind::Local, "n", Some(FunType::Number));
        assert!(infer(&typed, &[FunType::List]).is_err());
    }

    #[test]
    fn test_composite_inference() {
        let sum = Node::Composite(CompositeNode {
            left: Box::new(Node::number(1.0)),
            operator: "+".to_string(),
            right: Box::new(Node::number(2.0)),
            location: SourceLocation::default(),
        });
        assert_eq!(type_of(&sum), FunType::Number);
        let concat = Node::Composite(CompositeNode {
            left: Box::new(Node::text("a")),
            operator: "+".to_string(),
            right: Box::new(Node::number(2.0)),
            location: SourceLocation::default(),
        });
        assert_eq!(type_of(&concat), FunType::Text);
    }

    #[test]
    fn test_methods_by_type() {
        let list = Node::reference(ReferenceKind::Global, "items", Some(FunType::List));
        assert!(infer_by_method(&list, "push").is_ok());
        let err = infer_by_method(&list, "add").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMethod);
        let untyped = Node::reference(ReferenceKind::Global, "x", None);
        assert!(infer_by_method(&untyped, "add").is_ok());
        assert!(infer_by_method(&untyped, "explode").is_err());
    }
}
