//! Codegen module for the Fun compiler
//!
//! Turns a resolved AST into JavaScript that builds a tree of DOM hooks and
//! wires reactive observers against the runtime library (`fun.*`). Every
//! emitted hook is created through its parent, so insertion order holds even
//! when a hook's content is produced later inside a closure.

use lazy_static::lazy_static;
use log::{trace, warn};
use regex::Regex;

use crate::ast::{
    AliasNode, DeclarationNode, ForLoopNode, HandlerNode, IfStatementNode, InvocationNode,
    ItemPropertyNode, Literal, MutationNode, NestedProperty, Node, ReferenceNode,
    RuntimeIteratorNode, XmlNode,
};
use crate::code_builder::{hook_code, q, CodeBuilder};
use crate::names::NameGenerator;
use crate::scope::Scope;
use crate::validate::{CompilerError, ErrorKind, FunResult};
use crate::visitor::DependencyCollector;

lazy_static! {
    static ref ATTRIBUTE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_:-]*$").unwrap();
    static ref STYLE_PROPERTY: Regex = Regex::new(r"^-?[A-Za-z][A-Za-z0-9-]*$").unwrap();
}

const OPERATORS: [&str; 5] = ["+", "-", "*", "/", "%"];

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Where code is being generated: the hook new content nests under, and
/// the table of compile-time values aliases can be inlined from.
pub struct GenContext<'s> {
    pub hook_name: String,
    pub references: &'s Scope<'s>,
}

impl<'s> GenContext<'s> {
    pub fn new(hook_name: &str, references: &'s Scope<'s>) -> Self {
        GenContext {
            hook_name: hook_name.to_string(),
            references,
        }
    }

    pub fn with_hook(&self, hook_name: &str) -> GenContext<'s> {
        GenContext {
            hook_name: hook_name.to_string(),
            references: self.references,
        }
    }
}

fn malformed(node: &Node, message: String) -> CompilerError {
    CompilerError::new(ErrorKind::MalformedNode, message, node.location())
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Generator {
    names: NameGenerator,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(&mut self) -> String {
        self.names.hook()
    }

    pub fn compile_statements(&mut self, ctx: &GenContext<'_>, nodes: &[Node]) -> FunResult<String> {
        let mut out = CodeBuilder::new();
        for node in nodes {
            out.code(&self.compile_statement(ctx, node)?);
        }
        Ok(out.build())
    }

    pub fn compile_statement(&mut self, ctx: &GenContext<'_>, node: &Node) -> FunResult<String> {
        match node {
            Node::Declaration(declaration) => {
                declare_reference(ctx, declaration);
                Ok(String::new())
            }
            Node::Alias(alias) => {
                let value = lookup_reference(ctx, alias)?;
                self.compile_statement(ctx, &value)
            }
            Node::StaticValue(_)
            | Node::RuntimeIterator(_)
            | Node::TemplateArgument(_)
            | Node::ItemProperty(_) => {
                let value = self.value_code(ctx, node)?;
                Ok(self.inline_value_code(ctx, &value))
            }
            Node::Composite(_) => self.composite_code(ctx, node),
            Node::Reference(reference) => Ok(self.reference_code(ctx, reference)),
            Node::Xml(xml) => self.xml_code(ctx, xml),
            Node::IfStatement(statement) => self.if_else_code(ctx, statement),
            Node::ForLoop(for_loop) => self.for_loop_code(ctx, for_loop),
            Node::Invocation(invocation) => self.invocation_code(ctx, invocation),
            Node::Mutation(mutation) => self.mutation_code(ctx, node, mutation),
            // Declared handlers and templates are emitted with the declarations.
            Node::Handler(handler) if handler.runtime_name.is_some() => Ok(String::new()),
            Node::Template(template) if template.runtime_name.is_some() => Ok(String::new()),
            Node::Handler(handler) => {
                let body = self.handler_body_code(ctx, &handler.block)?;
                let mut b = CodeBuilder::new();
                b.code(&format!(";(function({}) {{", handler.arg_runtime_names.join(", ")))
                    .code(&body)
                    .code("})();");
                Ok(b.build())
            }
            Node::Template(template) => self.compile_statements(ctx, &template.block),
            Node::InlineScript(script) => Ok(script.code.clone()),
            Node::Debugger(_) => Ok("debugger;".to_string()),
            Node::ImportModule(_)
            | Node::ImportFile(_)
            | Node::NestedAlias(_)
            | Node::List(_)
            | Node::Item(_) => Ok(placeholder(node)),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Values and references
    // ───────────────────────────────────────────────────────────────────────────

    /// A JS expression for the current value of `node`.
    pub fn value_code(&mut self, ctx: &GenContext<'_>, node: &Node) -> FunResult<String> {
        match node {
            Node::StaticValue(s) => Ok(literal_code(&s.value)),
            Node::Reference(r) => Ok(format!(
                "fun.cachedValue({}, {})",
                q(r.kind.as_str()),
                q(&r.name)
            )),
            Node::RuntimeIterator(iterator) => {
                let name = iterator.runtime_name.as_deref().ok_or_else(|| {
                    malformed(node, "Runtime iterator without a runtime name".to_string())
                })?;
                let mut code = name.to_string();
                if let Some(property) = &iterator.iterator_property {
                    for segment in property.split('.') {
                        code.push_str(&format!("[{}]", q(segment)));
                    }
                }
                Ok(code)
            }
            Node::TemplateArgument(argument) => Ok(argument.runtime_name.clone()),
            Node::ItemProperty(p) => self.item_property_code(ctx, p),
            Node::Item(item) => self.object_code(ctx, &item.properties),
            Node::NestedAlias(nested) => self.object_code(ctx, &nested.content),
            Node::List(list) => {
                let values = list
                    .content
                    .iter()
                    .map(|n| self.value_code(ctx, n))
                    .collect::<FunResult<Vec<_>>>()?;
                Ok(format!("[{}]", values.join(", ")))
            }
            Node::Composite(c) => {
                if !OPERATORS.contains(&c.operator.as_str()) {
                    return Err(malformed(node, format!("Unknown operator \"{}\"", c.operator)));
                }
                let left = self.value_code(ctx, &c.left)?;
                let right = self.value_code(ctx, &c.right)?;
                Ok(format!("({} {} {})", left, c.operator, right))
            }
            Node::Alias(alias) => {
                let value = lookup_reference(ctx, alias)?;
                self.value_code(ctx, &value)
            }
            Node::Handler(HandlerNode {
                runtime_name: Some(name),
                ..
            }) => Ok(name.clone()),
            other => Err(malformed(
                other,
                format!("{} cannot be used as a value", other.type_name()),
            )),
        }
    }

    fn item_property_code(&mut self, ctx: &GenContext<'_>, p: &ItemPropertyNode) -> FunResult<String> {
        if let Node::Item(item) = p.item.as_ref() {
            return match item.property(&p.property) {
                Some(value) => self.value_code(ctx, value),
                None => Ok("undefined".to_string()),
            };
        }
        let mut code = self.value_code(ctx, &p.item)?;
        for segment in &p.property {
            code.push_str(&format!("[{}]", q(segment)));
        }
        Ok(code)
    }

    fn object_code(&mut self, ctx: &GenContext<'_>, properties: &[NestedProperty]) -> FunResult<String> {
        let mut fields = Vec::with_capacity(properties.len());
        for property in properties {
            fields.push(format!(
                "{}: {}",
                q(&property.name),
                self.value_code(ctx, &property.value)?
            ));
        }
        Ok(format!("{{{}}}", fields.join(", ")))
    }

    fn inline_value_code(&mut self, ctx: &GenContext<'_>, value: &str) -> String {
        let hook = self.names.hook();
        let mut b = CodeBuilder::new();
        b.declare_hook(&hook).code(&format!(
            "{}.textContent = {};",
            hook_code(&ctx.hook_name, &hook),
            value
        ));
        b.build()
    }

    fn reference_code(&mut self, ctx: &GenContext<'_>, reference: &ReferenceNode) -> String {
        let hook = self.names.hook();
        let mut b = CodeBuilder::new();
        b.declare_hook(&hook)
            .closure_start()
            .declare("hook", &hook_code(&ctx.hook_name, &hook))
            .observe(
                reference,
                "function(mutation, value) { hook.textContent = value; }",
                &ctx.hook_name,
            )
            .closure_end();
        b.build()
    }

    /// Static composites are folded into inline code. Live ones re-evaluate
    /// once per tick after every dependency has reported.
    fn composite_code(&mut self, ctx: &GenContext<'_>, node: &Node) -> FunResult<String> {
        let value = self.value_code(ctx, node)?;
        let dependencies = DependencyCollector::collect(node);
        if dependencies.is_empty() {
            return Ok(self.inline_value_code(ctx, &value));
        }

        let hook = self.names.hook();
        let mut b = CodeBuilder::new();
        b.declare_hook(&hook)
            .closure_start()
            .declare("hook", &hook_code(&ctx.hook_name, &hook))
            .declare("blocker", "fun.getCallbackBlock(evaluate, {fireOnce: false})");
        for dependency in &dependencies {
            b.observe(dependency, "blocker.addBlock()", &ctx.hook_name);
        }
        b.function_start("evaluate", &[])
            .assign("hook.textContent", &value)
            .function_end()
            .closure_end();
        Ok(b.build())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // XML
    // ───────────────────────────────────────────────────────────────────────────

    fn xml_code(&mut self, ctx: &GenContext<'_>, xml: &XmlNode) -> FunResult<String> {
        let hook = self.names.hook();
        let inner = ctx.with_hook(&hook);
        let mut b = CodeBuilder::new();
        let mut attrs: Vec<(String, String)> = vec![];

        b.declare_hook(&hook);
        for attribute in &xml.attributes {
            let name = attribute.name();
            if !ATTRIBUTE_NAME.is_match(&name) {
                return Err(CompilerError::new(
                    ErrorKind::MalformedNode,
                    format!("Invalid attribute name \"{}\" on <{}>", name, xml.tag),
                    &attribute.location,
                ));
            }
            let value = deref(ctx, &attribute.value)?;

            match (name.as_str(), &value) {
                ("data", Node::Reference(reference)) if xml.tag == "input" => {
                    b.reflect_input(&hook, reference);
                }
                ("style", Node::NestedAlias(nested)) => {
                    self.style_code(ctx, &hook, &nested.content, &mut attrs, &mut b)?;
                }
                ("style", Node::Item(item)) => {
                    self.style_code(ctx, &hook, &item.properties, &mut attrs, &mut b)?;
                }
                ("style", other) => {
                    return Err(malformed(
                        other,
                        format!("Style attribute must be an object, found {}", other.type_name()),
                    ));
                }
                ("onClick", _) => {
                    b.code(&self.click_code(&inner, &value)?);
                }
                (_, Node::Reference(reference)) => {
                    b.bind_attribute(&hook, &name, reference);
                }
                (_, Node::StaticValue(s)) => {
                    attrs.push((name.clone(), literal_text(&s.value)));
                }
                (_, other) => {
                    return Err(malformed(
                        other,
                        format!(
                            "Attribute \"{}\" cannot hold a {}",
                            name,
                            other.type_name()
                        ),
                    ));
                }
            }
        }

        b.create_hook(&ctx.hook_name, &hook, &xml.tag, &attrs)
            .code(&self.compile_statements(&inner, &xml.block)?);
        Ok(b.build())
    }

    fn style_code(
        &mut self,
        ctx: &GenContext<'_>,
        hook: &str,
        properties: &[NestedProperty],
        attrs: &mut Vec<(String, String)>,
        b: &mut CodeBuilder,
    ) -> FunResult<()> {
        let mut style = String::new();
        for property in properties {
            if !STYLE_PROPERTY.is_match(&property.name) {
                return Err(malformed(
                    &property.value,
                    format!("Invalid style property \"{}\"", property.name),
                ));
            }
            match deref(ctx, &property.value)? {
                Node::Reference(reference) => {
                    b.bind_style(hook, &property.name, &reference);
                }
                Node::StaticValue(s) => {
                    let postfix = match s.value {
                        Literal::Number(_) => "px",
                        Literal::Text(_) => "",
                    };
                    style.push_str(&format!(
                        "{}:{}{}; ",
                        property.name,
                        literal_text(&s.value),
                        postfix
                    ));
                }
                other => {
                    return Err(malformed(
                        &other,
                        format!(
                            "Style property \"{}\" cannot hold a {}",
                            property.name,
                            other.type_name()
                        ),
                    ));
                }
            }
        }
        if !style.is_empty() {
            attrs.push(("style".to_string(), style));
        }
        Ok(())
    }

    fn click_code(&mut self, ctx: &GenContext<'_>, value: &Node) -> FunResult<String> {
        let handler = match value {
            Node::Handler(handler) => handler,
            other => {
                return Err(malformed(
                    other,
                    format!("onClick attribute must be a handler, found {}", other.type_name()),
                ))
            }
        };

        let mut b = CodeBuilder::new();
        b.with_hook_start(&ctx.hook_name, "hook");
        match &handler.runtime_name {
            Some(name) => {
                b.assign("hook.onclick", name);
            }
            None => {
                let body = self.handler_body_code(ctx, &handler.block)?;
                b.block_start(&format!(
                    "hook.onclick = function({})",
                    handler.arg_runtime_names.join(", ")
                ))
                .code(&body)
                .block_end();
            }
        }
        b.with_hook_end();
        Ok(b.build())
    }

    /// Handler bodies may only change data; they never build hooks.
    fn handler_body_code(&mut self, ctx: &GenContext<'_>, block: &[Node]) -> FunResult<String> {
        let mut b = CodeBuilder::new();
        for statement in block {
            match statement {
                Node::Mutation(mutation) => {
                    b.code(&self.mutation_code(ctx, statement, mutation)?);
                }
                Node::Invocation(_) | Node::InlineScript(_) | Node::Debugger(_) => {
                    b.code(&self.compile_statement(ctx, statement)?);
                }
                Node::Declaration(declaration) => declare_reference(ctx, declaration),
                other => {
                    return Err(malformed(
                        other,
                        format!(
                            "Handler code should be mutation statements, found {}",
                            other.type_name()
                        ),
                    ))
                }
            }
        }
        Ok(b.build())
    }

    fn mutation_code(
        &mut self,
        ctx: &GenContext<'_>,
        node: &Node,
        mutation: &MutationNode,
    ) -> FunResult<String> {
        let target = match mutation.target.as_deref() {
            Some(Node::Reference(reference)) => reference,
            Some(other) => {
                return Err(CompilerError::new(
                    ErrorKind::UnaddressableMutationTarget,
                    format!(
                        "Target in mutation should be a local or a global data object, found {}",
                        other.type_name()
                    ),
                    node.location(),
                ))
            }
            None => return Err(malformed(node, "Mutation without a resolved target".to_string())),
        };
        let method = mutation
            .method
            .as_deref()
            .ok_or_else(|| malformed(node, "Mutation without a method".to_string()))?;

        let args = mutation
            .args
            .iter()
            .map(|a| self.value_code(ctx, a))
            .collect::<FunResult<Vec<_>>>()?;
        let mut b = CodeBuilder::new();
        b.mutate(method, target, &args);
        Ok(b.build())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Invocations
    // ───────────────────────────────────────────────────────────────────────────

    fn invocation_code(&mut self, ctx: &GenContext<'_>, invocation: &InvocationNode) -> FunResult<String> {
        let invocable = match (&invocation.invocable, &invocation.alias) {
            (Some(invocable), _) => deref(ctx, invocable)?,
            (None, Some(alias)) => lookup_reference(ctx, alias)?,
            (None, None) => {
                return Err(CompilerError::new(
                    ErrorKind::MissingInvocable,
                    "Found an invocation without a reference to an invocable",
                    &invocation.location,
                ))
            }
        };
        let mut args = invocation
            .args
            .iter()
            .map(|a| self.value_code(ctx, a))
            .collect::<FunResult<Vec<_>>>()?;

        let mut b = CodeBuilder::new();
        match &invocable {
            Node::Template(template) => {
                let hook = self.names.hook();
                b.declare_hook(&hook)
                    .code(&format!("{};", hook_code(&ctx.hook_name, &hook)));
                match &template.runtime_name {
                    Some(name) => {
                        args.insert(0, hook.clone());
                        b.call_function(name, &args);
                    }
                    None => {
                        let body = self.compile_statements(&ctx.with_hook(&hook), &template.block)?;
                        b.code(&format!(";(function({}) {{", template.arg_runtime_names.join(", ")))
                            .code(&body)
                            .code(&format!("}})({});", args.join(", ")));
                    }
                }
            }
            Node::Handler(handler) => match &handler.runtime_name {
                Some(name) => {
                    b.call_function(name, &args);
                }
                None => {
                    let body = self.handler_body_code(ctx, &handler.block)?;
                    b.code(&format!(";(function({}) {{", handler.arg_runtime_names.join(", ")))
                        .code(&body)
                        .code(&format!("}})({});", args.join(", ")));
                }
            },
            other => {
                return Err(CompilerError::new(
                    ErrorKind::MissingInvocable,
                    format!("{} is not invocable", other.type_name()),
                    &invocation.location,
                ))
            }
        }
        Ok(b.build())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // If/else
    // ───────────────────────────────────────────────────────────────────────────

    /// Both branch hooks are created up front so the DOM order is fixed. The
    /// condition is re-evaluated once per tick, and only a changed result
    /// toggles visibility. Each branch body runs on its first activation.
    fn if_else_code(&mut self, ctx: &GenContext<'_>, statement: &IfStatementNode) -> FunResult<String> {
        let parent = &ctx.hook_name;
        let if_hook = self.names.hook();
        let else_hook = self.names.hook();

        let condition = &statement.condition;
        let left = deref(ctx, &condition.left)?;
        let left_code = self.value_code(ctx, &left)?;
        let mut dependencies = DependencyCollector::collect(&left);
        let compare_code = match (&condition.comparison, &condition.right) {
            (Some(comparison), Some(right)) => {
                let right = deref(ctx, right)?;
                for dependency in DependencyCollector::collect(&right) {
                    let seen = dependencies
                        .iter()
                        .any(|d| d.kind == dependency.kind && d.name == dependency.name);
                    if !seen {
                        dependencies.push(dependency);
                    }
                }
                format!(
                    "({} {} {})",
                    left_code,
                    comparison.js_operator(),
                    self.value_code(ctx, &right)?
                )
            }
            _ => format!("!!({})", left_code),
        };

        let if_body = self.compile_statements(&ctx.with_hook(&if_hook), &statement.if_block)?;
        let else_body = match &statement.else_block {
            Some(block) => self.compile_statements(&ctx.with_hook(&else_hook), block)?,
            None => String::new(),
        };

        let if_hook_code = hook_code(parent, &if_hook);
        let else_hook_code = hook_code(parent, &else_hook);
        let mut b = CodeBuilder::new();
        b.closure_start()
            .declare_hook(&if_hook)
            .declare_hook(&else_hook)
            .code(&format!("{};", if_hook_code))
            .code(&format!("{};", else_hook_code))
            .declare("ifDone", "false")
            .declare("elseDone", "false")
            .code("var lastTime;");
        if !dependencies.is_empty() {
            b.declare("blocker", "fun.getCallbackBlock(evaluate, {fireOnce: false})");
            for dependency in &dependencies {
                b.observe(dependency, "blocker.addBlock()", parent);
            }
        }
        b.function_start("togglePath", &[])
            .assign(
                &format!("{}.style.display", if_hook_code),
                "(lastTime ? \"block\" : \"none\")",
            )
            .assign(
                &format!("{}.style.display", else_hook_code),
                "(lastTime ? \"none\" : \"block\")",
            )
            .if_else(
                "lastTime",
                "if (!ifDone) { ifDone = true; ifPath(); }",
                "if (!elseDone) { elseDone = true; elsePath(); }",
            )
            .function_end()
            .function_start("evaluate", &[])
            .declare("thisTime", &compare_code)
            .return_if_equal("thisTime", "lastTime")
            .assign("lastTime", "thisTime")
            .call_function("togglePath", &[])
            .function_end()
            .function_start("ifPath", &[])
            .code(&if_body)
            .function_end()
            .function_start("elsePath", &[])
            .code(&else_body)
            .function_end();
        if dependencies.is_empty() {
            b.call_function("evaluate", &[]);
        }
        b.closure_end();
        Ok(b.build())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // For loops
    // ───────────────────────────────────────────────────────────────────────────

    /// Items are kept index-aligned with the list: inserts and removals touch
    /// one item hook, anything else rebuilds every item.
    fn for_loop_code(&mut self, ctx: &GenContext<'_>, for_loop: &ForLoopNode) -> FunResult<String> {
        let parent = &ctx.hook_name;
        let loop_hook = self.names.hook();
        let item_hook = self.names.hook();
        let iterator = match &for_loop.iterator_runtime_name {
            Some(name) => name.clone(),
            None => self.names.next("iterator"),
        };

        let loop_references = Scope::child(ctx.references);
        loop_references.bind(
            &for_loop.iterator,
            Node::RuntimeIterator(RuntimeIteratorNode {
                runtime_name: Some(iterator.clone()),
                iterator_property: None,
                location: for_loop.location.clone(),
            }),
        );
        let loop_ctx = GenContext::new(&item_hook, &loop_references);
        let body = self.compile_statements(&loop_ctx, &for_loop.block)?;
        trace!("Loop over {} renders into {}", iterator, loop_hook);

        let iterable = deref(ctx, &for_loop.iterable)?;
        let mut b = CodeBuilder::new();
        b.closure_start()
            .declare_hook(&loop_hook)
            .code(&format!("{};", hook_code(parent, &loop_hook)))
            .declare("itemHooks", "[]")
            .function_start("renderItem", &[iterator.clone(), "index".to_string()])
            .declare_hook(&item_hook)
            .code(&format!("fun.insertDOMHook({}, {}, index);", loop_hook, item_hook))
            .code(&body)
            .code(&format!("return {};", item_hook))
            .function_end()
            .function_start("onMutation", &["mutation".to_string()])
            .block_start("switch (mutation.op)")
            .code("case \"push\":")
            .code("case \"insert\":")
            .code("\tvar at = (mutation.index == null ? itemHooks.length : mutation.index);")
            .code("\titemHooks.splice(at, 0, renderItem(mutation.value, at));")
            .code("\tbreak;")
            .code("case \"remove\":")
            .code("\tfun.destroyHook(itemHooks[mutation.index]);")
            .code("\titemHooks.splice(mutation.index, 1);")
            .code("\tbreak;")
            .code("case \"set\":")
            .code("\tfun.destroyHook(itemHooks[mutation.index]);")
            .code("\titemHooks[mutation.index] = renderItem(mutation.value, mutation.index);")
            .code("\tbreak;")
            .code("default:")
            .code("\tfor (var i = 0; i < itemHooks.length; i++) { fun.destroyHook(itemHooks[i]); }")
            .code("\titemHooks = [];")
            .code("\tvar items = mutation.value || [];")
            .code("\tfor (var j = 0; j < items.length; j++) { itemHooks.push(renderItem(items[j], j)); }")
            .block_end()
            .function_end();

        match &iterable {
            Node::Reference(reference) => {
                b.observe(reference, "onMutation", parent);
            }
            Node::List(_) | Node::RuntimeIterator(_) | Node::TemplateArgument(_) | Node::ItemProperty(_) => {
                let value = self.value_code(ctx, &iterable)?;
                b.code(&format!("onMutation({{ op: \"reset\", value: {} }});", value));
            }
            other => {
                return Err(malformed(
                    other,
                    format!("Cannot iterate over a {}", other.type_name()),
                ))
            }
        }
        b.closure_end();
        Ok(b.build())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Declarations
    // ───────────────────────────────────────────────────────────────────────────

    /// Emits every hoisted template and handler as a top-level function.
    pub fn compile_declarations(&mut self, ctx: &GenContext<'_>, declarations: &[Node]) -> FunResult<String> {
        let mut b = CodeBuilder::new();
        for declaration in declarations {
            match declaration {
                Node::Template(template) => {
                    let name = template.runtime_name.as_deref().ok_or_else(|| {
                        malformed(declaration, "Hoisted template without a runtime name".to_string())
                    })?;
                    let hook = self.names.hook();
                    let mut params = vec![hook.clone()];
                    params.extend(template.arg_runtime_names.iter().cloned());
                    let body = self.compile_statements(&ctx.with_hook(&hook), &template.block)?;
                    b.function_start(name, &params).code(&body).function_end();
                }
                Node::Handler(handler) => {
                    let name = handler.runtime_name.as_deref().ok_or_else(|| {
                        malformed(declaration, "Hoisted handler without a runtime name".to_string())
                    })?;
                    let body = self.handler_body_code(ctx, &handler.block)?;
                    b.function_start(name, &handler.arg_runtime_names)
                        .code(&body)
                        .function_end();
                }
                other => {
                    return Err(malformed(
                        other,
                        format!("Only templates and handlers are hoisted, found {}", other.type_name()),
                    ))
                }
            }
        }
        Ok(b.build())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Registers a compile-time value. Object literals are flattened the same
/// way the resolver flattens them.
fn declare_reference(ctx: &GenContext<'_>, declaration: &DeclarationNode) {
    match declaration.value.as_ref() {
        Node::NestedAlias(nested) => {
            for property in &nested.content {
                let mut namespace = declaration.namespace.clone();
                namespace.push(property.name.clone());
                declare_reference(
                    ctx,
                    &DeclarationNode {
                        namespace,
                        value: Box::new(property.value.clone()),
                        location: declaration.location.clone(),
                    },
                );
            }
        }
        value => ctx.references.bind(&declaration.namespace.join("."), value.clone()),
    }
}

fn lookup_reference(ctx: &GenContext<'_>, alias: &AliasNode) -> FunResult<Node> {
    for i in 0..alias.namespace.len() {
        let key = alias.namespace[..=i].join(".");
        let value = match ctx.references.lookup(&key) {
            Some(v) => v,
            None => continue,
        };
        let suffix = &alias.namespace[i + 1..];
        if suffix.is_empty() {
            return Ok(value);
        }
        return Ok(match value {
            Node::RuntimeIterator(mut iterator) => {
                let suffix = suffix.join(".");
                iterator.iterator_property = Some(match iterator.iterator_property {
                    Some(existing) => format!("{}.{}", existing, suffix),
                    None => suffix,
                });
                Node::RuntimeIterator(iterator)
            }
            Node::Item(item) => Node::ItemProperty(ItemPropertyNode {
                item: Box::new(Node::Item(item)),
                property: suffix.to_vec(),
                location: alias.location.clone(),
            }),
            other => other,
        });
    }
    Err(CompilerError::new(
        ErrorKind::MalformedNode,
        format!("Alias \"{}\" reached the generator without a value", alias.key()),
        &alias.location,
    ))
}

/// Follows an alias to its compile-time value; anything else is itself.
fn deref(ctx: &GenContext<'_>, node: &Node) -> FunResult<Node> {
    match node {
        Node::Alias(alias) => lookup_reference(ctx, alias),
        other => Ok(other.clone()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

fn number_code(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n.is_finite() {
        format!("{}", n)
    } else {
        "NaN".to_string()
    }
}

fn literal_code(value: &Literal) -> String {
    match value {
        Literal::Text(s) => q(s),
        Literal::Number(n) => number_code(*n),
    }
}

fn literal_text(value: &Literal) -> String {
    match value {
        Literal::Text(s) => s.clone(),
        Literal::Number(n) => number_code(*n),
    }
}

fn placeholder(node: &Node) -> String {
    warn!("No code generation for {} node", node.type_name());
    let json = serde_json::to_string(node).unwrap_or_default();
    format!("{};", q(&format!("UNDEFINED AST TYPE {}: {}", node.type_name(), json)))
}
