use crate::ast::{
    AttributeNode, ForLoopNode, HandlerNode, IfStatementNode, Node, ReferenceNode, TemplateNode,
    XmlNode,
};

/// The AstVisitor trait defines the single traversal mechanism over Fun ASTs.
///
/// Rules:
/// 1. Traversal order is source order and fixed.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers call `walk_*` functions to continue traversal unless pruning is intended.
pub trait AstVisitor {
    fn visit_nodes(&mut self, nodes: &[Node]) {
        walk_nodes(self, nodes);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_reference(&mut self, _reference: &ReferenceNode) {
        // Leaf node, nothing to walk by default
    }

    fn visit_xml(&mut self, xml: &XmlNode) {
        walk_xml(self, xml);
    }

    fn visit_attribute(&mut self, attribute: &AttributeNode) {
        self.visit_node(&attribute.value);
    }

    fn visit_if_statement(&mut self, statement: &IfStatementNode) {
        walk_if_statement(self, statement);
    }

    fn visit_for_loop(&mut self, for_loop: &ForLoopNode) {
        walk_for_loop(self, for_loop);
    }

    fn visit_handler(&mut self, handler: &HandlerNode) {
        self.visit_nodes(&handler.block);
    }

    fn visit_template(&mut self, template: &TemplateNode) {
        self.visit_nodes(&template.block);
    }
}

pub fn walk_nodes<V: AstVisitor + ?Sized>(visitor: &mut V, nodes: &[Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: AstVisitor + ?Sized>(visitor: &mut V, node: &Node) {
    match node {
        Node::Declaration(d) => visitor.visit_node(&d.value),
        Node::NestedAlias(n) => {
            for property in &n.content {
                visitor.visit_node(&property.value);
            }
        }
        Node::List(l) => visitor.visit_nodes(&l.content),
        Node::Item(i) => {
            for property in &i.properties {
                visitor.visit_node(&property.value);
            }
        }
        Node::Reference(r) => visitor.visit_reference(r),
        Node::Composite(c) => {
            visitor.visit_node(&c.left);
            visitor.visit_node(&c.right);
        }
        Node::Xml(x) => visitor.visit_xml(x),
        Node::IfStatement(s) => visitor.visit_if_statement(s),
        Node::ForLoop(f) => visitor.visit_for_loop(f),
        Node::Mutation(m) => {
            if let Some(target) = &m.target {
                visitor.visit_node(target);
            }
            visitor.visit_nodes(&m.args);
        }
        Node::Invocation(i) => {
            if let Some(invocable) = &i.invocable {
                visitor.visit_node(invocable);
            }
            visitor.visit_nodes(&i.args);
        }
        Node::Handler(h) => visitor.visit_handler(h),
        Node::Template(t) => visitor.visit_template(t),
        Node::ItemProperty(p) => visitor.visit_node(&p.item),
        Node::ImportModule(_)
        | Node::ImportFile(_)
        | Node::Alias(_)
        | Node::StaticValue(_)
        | Node::TemplateArgument(_)
        | Node::RuntimeIterator(_)
        | Node::InlineScript(_)
        | Node::Debugger(_) => {}
    }
}

pub fn walk_xml<V: AstVisitor + ?Sized>(visitor: &mut V, xml: &XmlNode) {
    for attribute in &xml.attributes {
        visitor.visit_attribute(attribute);
    }
    visitor.visit_nodes(&xml.block);
}

pub fn walk_if_statement<V: AstVisitor + ?Sized>(visitor: &mut V, statement: &IfStatementNode) {
    visitor.visit_node(&statement.condition.left);
    if let Some(right) = &statement.condition.right {
        visitor.visit_node(right);
    }
    visitor.visit_nodes(&statement.if_block);
    if let Some(else_block) = &statement.else_block {
        visitor.visit_nodes(else_block);
    }
}

pub fn walk_for_loop<V: AstVisitor + ?Sized>(visitor: &mut V, for_loop: &ForLoopNode) {
    visitor.visit_node(&for_loop.iterable);
    visitor.visit_nodes(&for_loop.block);
}

/// Collects the live references an expression depends on, deduplicated by
/// kind and name, in first-use order.
pub struct DependencyCollector {
    pub references: Vec<ReferenceNode>,
}

impl DependencyCollector {
    pub fn collect(node: &Node) -> Vec<ReferenceNode> {
        let mut collector = DependencyCollector { references: vec![] };
        collector.visit_node(node);
        collector.references
    }
}

impl AstVisitor for DependencyCollector {
    fn visit_reference(&mut self, reference: &ReferenceNode) {
        let seen = self
            .references
            .iter()
            .any(|r| r.kind == reference.kind && r.name == reference.name);
        if !seen {
            self.references.push(reference.clone());
        }
    }

    // Expressions never own bodies; anything scoped is someone else's dependency.
    fn visit_handler(&mut self, _handler: &HandlerNode) {}

    fn visit_template(&mut self, _template: &TemplateNode) {}
}
