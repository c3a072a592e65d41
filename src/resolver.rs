//! Resolver.
//!
//! Takes parsed Fun statements and returns them fully linked: imports are
//! inlined, declarations are bound into lexical scopes and dropped, aliases
//! are replaced by what they name, and values are checked against the type
//! registry. The first violation halts resolution.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{
    AliasNode, AttributeNode, DeclarationNode, ForLoopNode, HandlerNode, IfStatementNode,
    ImportFileNode, ImportModuleNode, InvocationNode, ItemPropertyNode, MutationNode, Node,
    RuntimeIteratorNode, SourceLocation, TemplateArgumentNode, TemplateNode, XmlNode,
};
use crate::cache::ParseCache;
use crate::config::CompilerConfig;
use crate::discovery::discover_modules;
use crate::names::NameGenerator;
use crate::parse::SourceParser;
use crate::scope::Scope;
use crate::types::{infer, infer_by_method, FunType};
use crate::validate::{CompilerError, ErrorKind, FunResult};
use crate::visitor::{walk_node, AstVisitor};

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub name: String,
    pub path: PathBuf,
    /// Contents of the module's code file, if it has one.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub ast: Vec<Node>,
    /// Imported modules, in import order.
    pub modules: Vec<ModuleRecord>,
    /// Every declared template and handler, hoisted regardless of nesting.
    pub declarations: Vec<Node>,
    pub file_dependencies: Vec<PathBuf>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds the side tables of one resolution context. Scopes are passed
/// alongside, so a caller can resolve several statement lists against the
/// same root scope and tables.
pub struct Resolver<'a> {
    config: &'a CompilerConfig,
    parser: &'a dyn SourceParser,
    cache: Option<ParseCache>,
    modules: Vec<ModuleRecord>,
    declarations: Vec<Node>,
    file_dependencies: Vec<PathBuf>,
    names: NameGenerator,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a CompilerConfig, parser: &'a dyn SourceParser) -> Self {
        Resolver {
            config,
            parser,
            cache: config.cache_dir.as_ref().map(ParseCache::new),
            modules: vec![],
            declarations: vec![],
            file_dependencies: vec![],
            names: NameGenerator::new(),
        }
    }

    pub fn resolve_in(&mut self, scope: &Scope<'_>, ast: Vec<Node>) -> FunResult<Vec<Node>> {
        self.resolve_block(scope, ast)
    }

    pub fn finish(self, ast: Vec<Node>) -> Resolution {
        Resolution {
            ast,
            modules: self.modules,
            declarations: self.declarations,
            file_dependencies: self.file_dependencies,
        }
    }

    fn resolve_block(&mut self, scope: &Scope<'_>, nodes: Vec<Node>) -> FunResult<Vec<Node>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            self.resolve_statement(scope, node, &mut out)?;
        }
        Ok(out)
    }

    fn resolve_statement(
        &mut self,
        scope: &Scope<'_>,
        node: Node,
        out: &mut Vec<Node>,
    ) -> FunResult<()> {
        match node {
            Node::ImportModule(import) => self.import_module(scope, import, out),
            Node::ImportFile(import) => self.import_file(scope, import, out),
            Node::Declaration(declaration) => self.declare(scope, declaration),
            Node::Alias(alias) => {
                // Bound values were resolved when declared, so re-dispatching
                // on the target's type leaves it as it is.
                out.push(self.resolve_alias(scope, &alias)?);
                Ok(())
            }
            Node::Xml(xml) => {
                out.push(self.resolve_xml(scope, xml)?);
                Ok(())
            }
            Node::IfStatement(statement) => {
                out.push(self.resolve_if(scope, statement)?);
                Ok(())
            }
            Node::ForLoop(for_loop) => {
                out.push(self.resolve_for(scope, for_loop)?);
                Ok(())
            }
            other => {
                out.push(self.resolve_value(scope, other)?);
                Ok(())
            }
        }
    }

    /// Resolves an expression: aliases are followed until they reach a
    /// value, and container literals are resolved field by field.
    fn resolve_value(&mut self, scope: &Scope<'_>, node: Node) -> FunResult<Node> {
        match node {
            Node::Alias(alias) => self.resolve_alias(scope, &alias),
            Node::NestedAlias(mut nested) => {
                for property in &mut nested.content {
                    let value = std::mem::replace(&mut property.value, Node::text(""));
                    property.value = self.resolve_value(scope, value)?;
                }
                Ok(Node::NestedAlias(nested))
            }
            Node::List(mut list) => {
                list.content = self.resolve_values(scope, list.content)?;
                Ok(Node::List(list))
            }
            Node::Item(mut item) => {
                for property in &mut item.properties {
                    let value = std::mem::replace(&mut property.value, Node::text(""));
                    property.value = self.resolve_value(scope, value)?;
                }
                Ok(Node::Item(item))
            }
            Node::Composite(mut composite) => {
                composite.left = Box::new(self.resolve_value(scope, *composite.left)?);
                composite.right = Box::new(self.resolve_value(scope, *composite.right)?);
                Ok(Node::Composite(composite))
            }
            Node::StaticValue(_) => {
                infer(&node, &[FunType::Text, FunType::Number])?;
                Ok(node)
            }
            Node::Handler(handler) if handler.runtime_name.is_none() => {
                self.resolve_inline_handler(scope, handler)
            }
            Node::Template(mut template) if template.runtime_name.is_none() => {
                let body_scope = Scope::child(scope);
                template.arg_runtime_names =
                    self.declare_arguments(&body_scope, &template.args, &template.location)?;
                template.block = self.resolve_block(&body_scope, template.block)?;
                Ok(Node::Template(template))
            }
            Node::Xml(xml) => self.resolve_xml(scope, xml),
            Node::Invocation(invocation) => self.resolve_invocation(scope, invocation),
            Node::Mutation(mutation) => self.resolve_mutation(scope, mutation),
            Node::IfStatement(_)
            | Node::ForLoop(_)
            | Node::Declaration(_)
            | Node::ImportModule(_)
            | Node::ImportFile(_) => Err(CompilerError::new(
                ErrorKind::TypeMismatch,
                format!("{} cannot be used as a value", node.type_name()),
                node.location(),
            )),
            // Already resolved, or a leaf.
            other => Ok(other),
        }
    }

    fn resolve_values(&mut self, scope: &Scope<'_>, nodes: Vec<Node>) -> FunResult<Vec<Node>> {
        nodes
            .into_iter()
            .map(|n| self.resolve_value(scope, n))
            .collect()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Alias lookup
    // ───────────────────────────────────────────────────────────────────────────

    /// Grows the lookup key one segment at a time and returns on the first
    /// prefix bound anywhere in the scope chain.
    fn resolve_alias(&self, scope: &Scope<'_>, alias: &AliasNode) -> FunResult<Node> {
        let namespace = &alias.namespace;
        for i in 0..namespace.len() {
            let key = namespace[..=i].join(".");
            let value = match scope.lookup(&key) {
                Some(v) => v,
                None => continue,
            };
            let suffix = &namespace[i + 1..];

            return Ok(match value {
                Node::RuntimeIterator(mut iterator) if !suffix.is_empty() => {
                    let suffix = suffix.join(".");
                    iterator.iterator_property = Some(match iterator.iterator_property {
                        Some(existing) => format!("{}.{}", existing, suffix),
                        None => suffix,
                    });
                    Node::RuntimeIterator(iterator)
                }
                Node::Item(item) if !suffix.is_empty() => Node::ItemProperty(ItemPropertyNode {
                    item: Box::new(Node::Item(item)),
                    property: suffix.to_vec(),
                    location: alias.location.clone(),
                }),
                other => {
                    if !suffix.is_empty() {
                        trace!(
                            "Alias \"{}\" matched \"{}\"; ignoring suffix on {}",
                            alias.key(),
                            key,
                            other.type_name()
                        );
                    }
                    other
                }
            });
        }

        Err(CompilerError::new(
            ErrorKind::UndeclaredAlias,
            format!("Lookup of undeclared alias \"{}\"", alias.key()),
            &alias.location,
        ))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Declarations
    // ───────────────────────────────────────────────────────────────────────────

    fn declare(&mut self, scope: &Scope<'_>, declaration: DeclarationNode) -> FunResult<()> {
        let DeclarationNode {
            namespace,
            value,
            location,
        } = declaration;

        if let Node::NestedAlias(nested) = *value {
            for property in nested.content {
                let mut nested_namespace = namespace.clone();
                nested_namespace.push(property.name);
                self.declare(
                    scope,
                    DeclarationNode {
                        namespace: nested_namespace,
                        value: Box::new(property.value),
                        location: location.clone(),
                    },
                )?;
            }
            return Ok(());
        }

        let key = namespace.join(".");
        if scope.contains_local(&key) {
            return Err(duplicate_declaration(&key, &location));
        }

        let value = match *value {
            Node::Template(template) => self.hoist_template(scope, template, &key, &location)?,
            Node::Handler(handler) => self.hoist_handler(scope, handler, &key, &location)?,
            other => self.resolve_value(scope, other)?,
        };

        trace!(
            "Declared \"{}\" as {} at depth {}",
            key,
            value.type_name(),
            scope.depth()
        );
        scope
            .declare(&key, value)
            .map_err(|message| CompilerError::new(ErrorKind::DuplicateDeclaration, message, &location))
    }

    fn hoist_template(
        &mut self,
        scope: &Scope<'_>,
        mut template: TemplateNode,
        key: &str,
        declared_at: &SourceLocation,
    ) -> FunResult<Node> {
        let body_scope = Scope::child(scope);
        template.arg_runtime_names = self.declare_arguments(&body_scope, &template.args, &template.location)?;
        template.block = self.resolve_block(&body_scope, template.block)?;
        check_captures("Template", key, &template.arg_runtime_names, &template.block, declared_at)?;
        template.runtime_name = Some(self.names.next("template"));

        let node = Node::Template(template);
        self.declarations.push(node.clone());
        Ok(node)
    }

    fn hoist_handler(
        &mut self,
        scope: &Scope<'_>,
        mut handler: HandlerNode,
        key: &str,
        declared_at: &SourceLocation,
    ) -> FunResult<Node> {
        let body_scope = Scope::child(scope);
        handler.arg_runtime_names = self.declare_arguments(&body_scope, &handler.args, &handler.location)?;
        handler.block = self.resolve_block(&body_scope, handler.block)?;
        check_captures("Handler", key, &handler.arg_runtime_names, &handler.block, declared_at)?;
        handler.runtime_name = Some(self.names.next("handler"));

        let node = Node::Handler(handler);
        self.declarations.push(node.clone());
        Ok(node)
    }

    fn declare_arguments(
        &mut self,
        body_scope: &Scope<'_>,
        args: &[String],
        location: &SourceLocation,
    ) -> FunResult<Vec<String>> {
        let mut runtime_names = Vec::with_capacity(args.len());
        for arg in args {
            let runtime_name = self.names.next("arg");
            let argument = Node::TemplateArgument(TemplateArgumentNode {
                name: arg.clone(),
                runtime_name: runtime_name.clone(),
                location: location.clone(),
            });
            body_scope
                .declare(arg, argument)
                .map_err(|message| CompilerError::new(ErrorKind::DuplicateDeclaration, message, location))?;
            runtime_names.push(runtime_name);
        }
        Ok(runtime_names)
    }

    /// An undeclared handler is compiled where it stands; its body still
    /// gets its own scope.
    fn resolve_inline_handler(&mut self, scope: &Scope<'_>, mut handler: HandlerNode) -> FunResult<Node> {
        let body_scope = Scope::child(scope);
        handler.arg_runtime_names = self.declare_arguments(&body_scope, &handler.args, &handler.location)?;
        handler.block = self.resolve_block(&body_scope, handler.block)?;
        Ok(Node::Handler(handler))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Imports
    // ───────────────────────────────────────────────────────────────────────────

    fn import_module(
        &mut self,
        scope: &Scope<'_>,
        import: ImportModuleNode,
        out: &mut Vec<Node>,
    ) -> FunResult<()> {
        if self.modules.iter().any(|m| m.name == import.name) {
            trace!("Module {} already imported", import.name);
            return Ok(());
        }

        let modules_dir = self.config.modules_dir();
        let dir = modules_dir.join(&import.name);
        if !dir.is_dir() {
            let available = discover_modules(
                &modules_dir,
                &self.config.source_extension,
                &self.config.code_extension,
            );
            let hint = if available.is_empty() {
                format!("No modules found under {}", modules_dir.display())
            } else {
                let names: Vec<&str> = available.iter().map(|m| m.name.as_str()).collect();
                format!("Available modules: {}", names.join(", "))
            };
            return Err(CompilerError::new(
                ErrorKind::MissingModule,
                format!("Could not find the module at {}", dir.display()),
                &import.location,
            )
            .with_hints(vec![hint]));
        }

        debug!("Importing module {} from {}", import.name, dir.display());
        // Recorded before its source is resolved, so a module importing
        // itself is a no-op.
        let index = self.modules.len();
        self.modules.push(ModuleRecord {
            name: import.name.clone(),
            path: dir.clone(),
            code: None,
        });

        let source_file = dir.join(format!("{}.{}", import.name, self.config.source_extension));
        if source_file.is_file() {
            let nodes = self.import_source(&source_file)?;
            let file = source_file.to_string_lossy().to_string();
            let resolved = self
                .resolve_block(scope, nodes)
                .map_err(|e| e.in_file(&file))?;
            out.extend(resolved);
        }

        let code_file = dir.join(format!("{}.{}", import.name, self.config.code_extension));
        if code_file.is_file() {
            let code = read_source(&code_file, &import.location)?;
            self.modules[index].code = Some(code);
        }
        Ok(())
    }

    fn import_file(
        &mut self,
        scope: &Scope<'_>,
        import: ImportFileNode,
        out: &mut Vec<Node>,
    ) -> FunResult<()> {
        let path = self
            .config
            .project_root
            .join(format!("{}.{}", import.path, self.config.source_extension));
        if !path.is_file() {
            return Err(CompilerError::new(
                ErrorKind::MissingImport,
                format!("Could not find file for import: \"{}\"", path.display()),
                &import.location,
            ));
        }
        if self.file_dependencies.contains(&path) {
            trace!("File {} already imported", path.display());
            return Ok(());
        }

        debug!("Importing file {}", path.display());
        self.file_dependencies.push(path.clone());
        let nodes = self.import_source(&path)?;
        let file = path.to_string_lossy().to_string();
        let resolved = self
            .resolve_block(scope, nodes)
            .map_err(|e| e.in_file(&file))?;
        out.extend(resolved);
        Ok(())
    }

    fn import_source(&self, path: &Path) -> FunResult<Vec<Node>> {
        let file = path.to_string_lossy().to_string();
        let source = read_source(path, &SourceLocation::new(&file, 0, 0))?;

        if let Some(cache) = &self.cache {
            if let Some(nodes) = cache.get(&file, &source) {
                return Ok(nodes);
            }
        }

        let nodes = self
            .parser
            .parse(&source, &file)
            .map_err(|e| e.in_file(&file))?;
        if let Some(cache) = &self.cache {
            cache.set(&file, &source, &nodes);
        }
        Ok(nodes)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Elements and control flow
    // ───────────────────────────────────────────────────────────────────────────

    fn resolve_xml(&mut self, scope: &Scope<'_>, mut xml: XmlNode) -> FunResult<Node> {
        let mut attributes = Vec::with_capacity(xml.attributes.len());
        for attribute in xml.attributes {
            if attribute.namespace.len() != 1 {
                let hints = match attribute.namespace.split_first() {
                    Some((head, rest)) if !rest.is_empty() => {
                        vec![format!("Use {}={{ {}: ... }} instead", head, rest.join("."))]
                    }
                    _ => vec![],
                };
                return Err(CompilerError::new(
                    ErrorKind::UnsupportedAttribute,
                    format!(
                        "Dot notation attribute \"{}\" is not supported on <{}>",
                        attribute.name(),
                        xml.tag
                    ),
                    &attribute.location,
                )
                .with_hints(hints));
            }
            let AttributeNode {
                namespace,
                value,
                location,
            } = attribute;
            attributes.push(AttributeNode {
                namespace,
                value: self.resolve_value(scope, value)?,
                location,
            });
        }
        xml.attributes = attributes;
        // Elements do not open a scope.
        xml.block = self.resolve_block(scope, xml.block)?;
        Ok(Node::Xml(xml))
    }

    fn resolve_if(&mut self, scope: &Scope<'_>, mut statement: IfStatementNode) -> FunResult<Node> {
        if let Some(comparison) = statement.condition.comparison {
            if !self.config.allows(comparison) {
                return Err(CompilerError::new(
                    ErrorKind::TypeMismatch,
                    format!("Comparison \"{}\" is not enabled", comparison.symbol()),
                    &statement.location,
                ));
            }
            if statement.condition.right.is_none() {
                return Err(CompilerError::new(
                    ErrorKind::TypeMismatch,
                    format!("Comparison \"{}\" needs a right operand", comparison.symbol()),
                    &statement.location,
                ));
            }
        } else if statement.condition.right.is_some() {
            return Err(CompilerError::new(
                ErrorKind::TypeMismatch,
                "Condition has a right operand but no comparison",
                &statement.location,
            ));
        }

        statement.condition.left = Box::new(self.resolve_value(scope, *statement.condition.left)?);
        if let Some(right) = statement.condition.right.take() {
            statement.condition.right = Some(Box::new(self.resolve_value(scope, *right)?));
        }

        let if_scope = Scope::child(scope);
        statement.if_block = self.resolve_block(&if_scope, statement.if_block)?;
        if let Some(else_block) = statement.else_block.take() {
            let else_scope = Scope::child(scope);
            statement.else_block = Some(self.resolve_block(&else_scope, else_block)?);
        }
        Ok(Node::IfStatement(statement))
    }

    fn resolve_for(&mut self, scope: &Scope<'_>, mut for_loop: ForLoopNode) -> FunResult<Node> {
        let runtime_name = self.names.next("iterator");
        let iterable = self.resolve_value(scope, *for_loop.iterable)?;
        infer(&iterable, &[FunType::List])?;
        for_loop.iterable = Box::new(iterable);

        let loop_scope = Scope::child(scope);
        let iterator = Node::RuntimeIterator(RuntimeIteratorNode {
            runtime_name: Some(runtime_name.clone()),
            iterator_property: None,
            location: for_loop.location.clone(),
        });
        loop_scope
            .declare(&for_loop.iterator, iterator)
            .map_err(|message| {
                CompilerError::new(ErrorKind::DuplicateDeclaration, message, &for_loop.location)
            })?;

        for_loop.block = self.resolve_block(&loop_scope, for_loop.block)?;
        for_loop.iterator_runtime_name = Some(runtime_name);
        Ok(Node::ForLoop(for_loop))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Calls
    // ───────────────────────────────────────────────────────────────────────────

    fn resolve_invocation(&mut self, scope: &Scope<'_>, mut invocation: InvocationNode) -> FunResult<Node> {
        let invocable = match (invocation.alias.take(), invocation.invocable.take()) {
            (Some(alias), _) => Some(self.resolve_value(scope, Node::Alias(alias))?),
            (None, Some(invocable)) => Some(self.resolve_value(scope, *invocable)?),
            (None, None) => None,
        };

        match invocable {
            Some(node @ (Node::Template(_) | Node::Handler(_))) => {
                invocation.invocable = Some(Box::new(node));
            }
            other => {
                let found = other.map(|n| n.type_name()).unwrap_or("nothing");
                return Err(CompilerError::new(
                    ErrorKind::MissingInvocable,
                    format!("Found an invocation without a reference to an invocable (got {})", found),
                    &invocation.location,
                ));
            }
        }

        invocation.args = self.resolve_values(scope, invocation.args)?;
        Ok(Node::Invocation(invocation))
    }

    fn resolve_mutation(&mut self, scope: &Scope<'_>, mut mutation: MutationNode) -> FunResult<Node> {
        let (target_name, target, method) =
            match (mutation.alias.take(), mutation.target.take(), mutation.method.take()) {
                (Some(mut alias), _, _) => {
                    let method = match alias.namespace.pop() {
                        Some(method) if !alias.namespace.is_empty() => method,
                        _ => {
                            return Err(CompilerError::new(
                                ErrorKind::UnaddressableMutationTarget,
                                format!("Mutation \"{}\" has no target", alias.key()),
                                &mutation.location,
                            ))
                        }
                    };
                    let target_name = alias.key();
                    (target_name, self.resolve_value(scope, Node::Alias(alias))?, method)
                }
                // A target supplied by the parser is checked like an aliased one.
                (None, Some(target), Some(method)) => {
                    let target_name = match target.as_ref() {
                        Node::Reference(reference) => reference.name.clone(),
                        other => other.type_name().to_string(),
                    };
                    (target_name, self.resolve_value(scope, *target)?, method)
                }
                _ => {
                    return Err(CompilerError::new(
                        ErrorKind::UnaddressableMutationTarget,
                        "Mutation without a target",
                        &mutation.location,
                    ))
                }
            };

        if !matches!(target, Node::Reference(_)) {
            return Err(CompilerError::new(
                ErrorKind::UnaddressableMutationTarget,
                format!(
                    "Target in mutation should be a local or a global data object, but \"{}\" is a {}",
                    target_name,
                    target.type_name()
                ),
                &mutation.location,
            ));
        }
        infer_by_method(&target, &method)?;

        mutation.args = self.resolve_values(scope, mutation.args)?;
        mutation.target = Some(Box::new(target));
        mutation.method = Some(method);
        Ok(Node::Mutation(mutation))
    }
}

/// Finds a loop item or template argument that a hoisted body uses without
/// binding it itself. Nested hoisted bodies were checked when declared.
struct CaptureFinder {
    bound: Vec<String>,
    found: Option<&'static str>,
}

impl AstVisitor for CaptureFinder {
    fn visit_node(&mut self, node: &Node) {
        if self.found.is_some() {
            return;
        }
        match node {
            Node::RuntimeIterator(RuntimeIteratorNode {
                runtime_name: Some(name),
                ..
            }) if !self.bound.contains(name) => {
                self.found = Some("the item of an enclosing for loop");
            }
            Node::TemplateArgument(argument) if !self.bound.contains(&argument.runtime_name) => {
                self.found = Some("an argument of an enclosing template or handler");
            }
            _ => walk_node(self, node),
        }
    }

    fn visit_for_loop(&mut self, for_loop: &ForLoopNode) {
        self.visit_node(&for_loop.iterable);
        let mark = self.bound.len();
        self.bound.extend(for_loop.iterator_runtime_name.iter().cloned());
        self.visit_nodes(&for_loop.block);
        self.bound.truncate(mark);
    }

    fn visit_handler(&mut self, handler: &HandlerNode) {
        if handler.runtime_name.is_none() {
            self.visit_inline_body(&handler.arg_runtime_names, &handler.block);
        }
    }

    fn visit_template(&mut self, template: &TemplateNode) {
        if template.runtime_name.is_none() {
            self.visit_inline_body(&template.arg_runtime_names, &template.block);
        }
    }
}

impl CaptureFinder {
    fn visit_inline_body(&mut self, args: &[String], block: &[Node]) {
        let mark = self.bound.len();
        self.bound.extend(args.iter().cloned());
        self.visit_nodes(block);
        self.bound.truncate(mark);
    }
}

fn check_captures(
    what: &str,
    key: &str,
    args: &[String],
    block: &[Node],
    location: &SourceLocation,
) -> FunResult<()> {
    let mut finder = CaptureFinder {
        bound: args.to_vec(),
        found: None,
    };
    finder.visit_nodes(block);
    match finder.found {
        None => Ok(()),
        Some(captured) => Err(CompilerError::new(
            ErrorKind::EscapingBinding,
            format!("{} \"{}\" is emitted at top level but uses {}", what, key, captured),
            location,
        )
        .with_hints(vec![
            "Declare it outside the enclosing loop or template and pass the value as an argument"
                .to_string(),
        ])),
    }
}

fn duplicate_declaration(key: &str, location: &SourceLocation) -> CompilerError {
    CompilerError::new(
        ErrorKind::DuplicateDeclaration,
        format!("Repeat declaration of \"{}\"", key),
        location,
    )
}

fn read_source(path: &Path, location: &SourceLocation) -> FunResult<String> {
    fs::read_to_string(path).map_err(|e| {
        CompilerError::new(
            ErrorKind::Io,
            format!("Could not read {}: {}", path.display(), e),
            location,
        )
    })
}
