//! AST for Fun programs.
//!
//! Nodes arrive from the upstream parser as JSON tagged on `"type"`. The
//! resolver consumes them by value and returns new, resolved nodes; the
//! generator only ever reads them.

use serde::{Deserialize, Serialize};

use crate::types::FunType;

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub span: u32,
}

impl SourceLocation {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        SourceLocation {
            file: file.to_string(),
            line,
            column,
            span: 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Node {
    ImportModule(ImportModuleNode),
    ImportFile(ImportFileNode),
    Declaration(DeclarationNode),
    Alias(AliasNode),
    NestedAlias(NestedAliasNode),
    StaticValue(StaticValueNode),
    List(ListNode),
    Item(ItemNode),
    Reference(ReferenceNode),
    Composite(CompositeNode),
    Xml(XmlNode),
    IfStatement(IfStatementNode),
    ForLoop(ForLoopNode),
    Mutation(MutationNode),
    Invocation(InvocationNode),
    Handler(HandlerNode),
    Template(TemplateNode),
    TemplateArgument(TemplateArgumentNode),
    RuntimeIterator(RuntimeIteratorNode),
    ItemProperty(ItemPropertyNode),
    InlineScript(InlineScriptNode),
    Debugger(DebuggerNode),
}

impl Node {
    /// The wire name of the variant, as it appears in the `"type"` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::ImportModule(_) => "IMPORT_MODULE",
            Node::ImportFile(_) => "IMPORT_FILE",
            Node::Declaration(_) => "DECLARATION",
            Node::Alias(_) => "ALIAS",
            Node::NestedAlias(_) => "NESTED_ALIAS",
            Node::StaticValue(_) => "STATIC_VALUE",
            Node::List(_) => "LIST",
            Node::Item(_) => "ITEM",
            Node::Reference(_) => "REFERENCE",
            Node::Composite(_) => "COMPOSITE",
            Node::Xml(_) => "XML",
            Node::IfStatement(_) => "IF_STATEMENT",
            Node::ForLoop(_) => "FOR_LOOP",
            Node::Mutation(_) => "MUTATION",
            Node::Invocation(_) => "INVOCATION",
            Node::Handler(_) => "HANDLER",
            Node::Template(_) => "TEMPLATE",
            Node::TemplateArgument(_) => "TEMPLATE_ARGUMENT",
            Node::RuntimeIterator(_) => "RUNTIME_ITERATOR",
            Node::ItemProperty(_) => "ITEM_PROPERTY",
            Node::InlineScript(_) => "INLINE_SCRIPT",
            Node::Debugger(_) => "DEBUGGER",
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Node::ImportModule(n) => &n.location,
            Node::ImportFile(n) => &n.location,
            Node::Declaration(n) => &n.location,
            Node::Alias(n) => &n.location,
            Node::NestedAlias(n) => &n.location,
            Node::StaticValue(n) => &n.location,
            Node::List(n) => &n.location,
            Node::Item(n) => &n.location,
            Node::Reference(n) => &n.location,
            Node::Composite(n) => &n.location,
            Node::Xml(n) => &n.location,
            Node::IfStatement(n) => &n.location,
            Node::ForLoop(n) => &n.location,
            Node::Mutation(n) => &n.location,
            Node::Invocation(n) => &n.location,
            Node::Handler(n) => &n.location,
            Node::Template(n) => &n.location,
            Node::TemplateArgument(n) => &n.location,
            Node::RuntimeIterator(n) => &n.location,
            Node::ItemProperty(n) => &n.location,
            Node::InlineScript(n) => &n.location,
            Node::Debugger(n) => &n.location,
        }
    }

    pub fn text(value: &str) -> Node {
        Node::StaticValue(StaticValueNode {
            value: Literal::Text(value.to_string()),
            location: SourceLocation::default(),
        })
    }

    pub fn number(value: f64) -> Node {
        Node::StaticValue(StaticValueNode {
            value: Literal::Number(value),
            location: SourceLocation::default(),
        })
    }

    pub fn alias(dotted: &str) -> Node {
        Node::Alias(AliasNode::from_dotted(dotted))
    }

    pub fn reference(kind: ReferenceKind, name: &str, data_type: Option<FunType>) -> Node {
        Node::Reference(ReferenceNode {
            kind,
            name: name.to_string(),
            data_type,
            location: SourceLocation::default(),
        })
    }
}

pub fn split_namespace(dotted: &str) -> Vec<String> {
    dotted.split('.').map(|s| s.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS AND DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportModuleNode {
    pub name: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileNode {
    /// Project-relative path without the source extension.
    pub path: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationNode {
    pub namespace: Vec<String>,
    pub value: Box<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AliasNode {
    pub namespace: Vec<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl AliasNode {
    pub fn from_dotted(dotted: &str) -> Self {
        AliasNode {
            namespace: split_namespace(dotted),
            location: SourceLocation::default(),
        }
    }

    pub fn key(&self) -> String {
        self.namespace.join(".")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NestedProperty {
    pub name: String,
    pub value: Node,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NestedAliasNode {
    pub content: Vec<NestedProperty>,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALUES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn value_type(&self) -> &'static str {
        match self {
            Literal::Number(_) => "number",
            Literal::Text(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticValueNode {
    pub value: Literal,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    pub content: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemNode {
    pub properties: Vec<NestedProperty>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ItemNode {
    /// Follows a property path through nested item/object literals.
    pub fn property(&self, path: &[String]) -> Option<&Node> {
        find_property(&self.properties, path)
    }
}

fn find_property<'a>(properties: &'a [NestedProperty], path: &[String]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let value = &properties.iter().find(|p| &p.name == first)?.value;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        Node::Item(inner) => find_property(&inner.properties, rest),
        Node::NestedAlias(inner) => find_property(&inner.content, rest),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Local,
    Global,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Local => "LOCAL",
            ReferenceKind::Global => "GLOBAL",
        }
    }
}

/// An addressable live data object. The only legal mutation target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceNode {
    pub kind: ReferenceKind,
    pub name: String,
    #[serde(default)]
    pub data_type: Option<FunType>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeNode {
    pub left: Box<Node>,
    pub operator: String,
    pub right: Box<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeNode {
    pub namespace: Vec<String>,
    pub value: Node,
    #[serde(default)]
    pub location: SourceLocation,
}

impl AttributeNode {
    pub fn name(&self) -> String {
        self.namespace.join(".")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct XmlNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<AttributeNode>,
    #[serde(default, alias = "content")]
    pub block: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROL FLOW
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Comparison {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison::Lt,
        Comparison::Gt,
        Comparison::Le,
        Comparison::Ge,
        Comparison::Eq,
        Comparison::Ne,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }

    /// Equality compiles to strict JS equality; ordering keeps JS coercion.
    pub fn js_operator(&self) -> &'static str {
        match self {
            Comparison::Eq => "===",
            Comparison::Ne => "!==",
            other => other.symbol(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub left: Box<Node>,
    #[serde(default)]
    pub comparison: Option<Comparison>,
    #[serde(default)]
    pub right: Option<Box<Node>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IfStatementNode {
    pub condition: Condition,
    pub if_block: Vec<Node>,
    #[serde(default)]
    pub else_block: Option<Vec<Node>>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForLoopNode {
    pub iterator: String,
    pub iterable: Box<Node>,
    pub block: Vec<Node>,
    /// Assigned during resolution.
    #[serde(default)]
    pub iterator_runtime_name: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLS AND SCOPED BODIES
// ═══════════════════════════════════════════════════════════════════════════════

/// `target.method(args)`. Parsed with `alias` holding the method-qualified
/// namespace; resolution replaces it with `target` and `method`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationNode {
    #[serde(default)]
    pub alias: Option<AliasNode>,
    #[serde(default)]
    pub target: Option<Box<Node>>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub args: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationNode {
    #[serde(default)]
    pub alias: Option<AliasNode>,
    #[serde(default)]
    pub invocable: Option<Box<Node>>,
    #[serde(default)]
    pub args: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandlerNode {
    #[serde(default)]
    pub args: Vec<String>,
    pub block: Vec<Node>,
    /// Set when the handler is declared and hoisted.
    #[serde(default)]
    pub runtime_name: Option<String>,
    #[serde(default)]
    pub arg_runtime_names: Vec<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    #[serde(default)]
    pub args: Vec<String>,
    pub block: Vec<Node>,
    #[serde(default)]
    pub runtime_name: Option<String>,
    #[serde(default)]
    pub arg_runtime_names: Vec<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateArgumentNode {
    pub name: String,
    pub runtime_name: String,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHETIC LOOP NODES
// ═══════════════════════════════════════════════════════════════════════════════

/// The current item of a loop; its value only exists at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeIteratorNode {
    #[serde(default)]
    pub runtime_name: Option<String>,
    /// Dotted property path read off the item, if any.
    #[serde(default)]
    pub iterator_property: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemPropertyNode {
    pub item: Box<Node>,
    pub property: Vec<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineScriptNode {
    pub code: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerNode {
    #[serde(default)]
    pub location: SourceLocation,
}
