//! Resolver behaviour: scoping, alias lookup, imports and type checks.

#[cfg(test)]
mod tests {
    use crate::ast::{Literal, Node};
    use crate::config::CompilerConfig;
    use crate::parse::{JsonSourceParser, SourceParser};
    use crate::resolver::{Resolution, Resolver};
    use crate::scope::Scope;
    use crate::types::FunType;
    use crate::validate::{validate_resolved, CompilerError, ErrorKind, FunResult};
    use crate::resolve;
    use serde_json::{json, Value};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn nodes(value: Value) -> Vec<Node> {
        serde_json::from_value(value).unwrap()
    }

    fn resolve_json(value: Value) -> FunResult<Resolution> {
        init_logger();
        resolve(nodes(value), &CompilerConfig::default(), &JsonSourceParser)
    }

    fn resolve_err(value: Value) -> CompilerError {
        resolve_json(value).unwrap_err()
    }

    fn text(s: &str) -> Value {
        json!({"type": "STATIC_VALUE", "value": s})
    }

    fn number(n: f64) -> Value {
        json!({"type": "STATIC_VALUE", "value": n})
    }

    fn alias(dotted: &str) -> Value {
        let namespace: Vec<&str> = dotted.split('.').collect();
        json!({"type": "ALIAS", "namespace": namespace})
    }

    fn declare(dotted: &str, value: Value) -> Value {
        let namespace: Vec<&str> = dotted.split('.').collect();
        json!({"type": "DECLARATION", "namespace": namespace, "value": value})
    }

    fn global(name: &str, data_type: &str) -> Value {
        json!({"type": "REFERENCE", "kind": "GLOBAL", "name": name, "dataType": data_type})
    }

    fn mutation(dotted: &str, args: Value) -> Value {
        let namespace: Vec<&str> = dotted.split('.').collect();
        json!({"type": "MUTATION", "alias": {"namespace": namespace}, "args": args})
    }

    /// Maps source text to a canned AST and counts parses.
    struct ScriptedParser {
        by_source: HashMap<String, Vec<Node>>,
        calls: Cell<usize>,
    }

    impl ScriptedParser {
        fn new(entries: Vec<(&str, Value)>) -> Self {
            ScriptedParser {
                by_source: entries
                    .into_iter()
                    .map(|(source, ast)| (source.to_string(), nodes(ast)))
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl SourceParser for ScriptedParser {
        fn parse(&self, source: &str, file: &str) -> FunResult<Vec<Node>> {
            self.calls.set(self.calls.get() + 1);
            self.by_source.get(source).cloned().ok_or_else(|| {
                CompilerError::unlocated(ErrorKind::Parse, format!("No script for {}", file))
            })
        }
    }

    fn project(root: &Path) -> CompilerConfig {
        CompilerConfig {
            project_root: root.to_path_buf(),
            ..CompilerConfig::default()
        }
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCOPES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_sibling_branches_are_isolated() {
        let err = resolve_err(json!([
            declare("x", number(1.0)),
            {"type": "IF_STATEMENT",
             "condition": {"left": alias("x")},
             "ifBlock": [declare("a", text("in if"))],
             "elseBlock": [alias("a")]}
        ]));
        assert_eq!(err.kind, ErrorKind::UndeclaredAlias);
        assert!(err.message.contains("\"a\""));
    }

    #[test]
    fn test_branch_declarations_do_not_leak_to_parent() {
        let err = resolve_err(json!([
            declare("x", number(1.0)),
            {"type": "IF_STATEMENT",
             "condition": {"left": alias("x")},
             "ifBlock": [declare("a", text("in if"))]},
            alias("a")
        ]));
        assert_eq!(err.kind, ErrorKind::UndeclaredAlias);
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let resolution = resolve_json(json!([
            declare("a", text("outer")),
            {"type": "IF_STATEMENT",
             "condition": {"left": alias("a")},
             "ifBlock": [declare("a", text("inner")), alias("a")]},
            alias("a")
        ]))
        .unwrap();

        match &resolution.ast[0] {
            Node::IfStatement(statement) => {
                assert_eq!(statement.if_block, vec![Node::text("inner")]);
                assert_eq!(*statement.condition.left, Node::text("outer"));
            }
            other => panic!("expected IF_STATEMENT, got {:?}", other),
        }
        assert_eq!(resolution.ast[1], Node::text("outer"));
    }

    #[test]
    fn test_duplicate_declaration_fails_for_any_value() {
        let err = resolve_err(json!([declare("a", number(1.0)), declare("a", number(2.0))]));
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
        assert_eq!(err.message, "Repeat declaration of \"a\"");

        let err = resolve_err(json!([
            declare("a", text("x")),
            declare("a", json!({"type": "HANDLER", "block": []}))
        ]));
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
    }

    #[test]
    fn test_context_carries_across_statement_lists() {
        init_logger();
        let config = CompilerConfig::default();
        let mut resolver = Resolver::new(&config, &JsonSourceParser);
        let root = Scope::root();
        resolver
            .resolve_in(&root, nodes(json!([declare("a", text("first"))])))
            .unwrap();
        let second = resolver
            .resolve_in(&root, nodes(json!([alias("a")])))
            .unwrap();
        assert_eq!(second, vec![Node::text("first")]);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ALIASES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_alias_flattens_into_dotted_declarations() {
        let nested = resolve_json(json!([
            declare("a", json!({"type": "NESTED_ALIAS", "content": [
                {"name": "x", "value": number(1.0)},
                {"name": "y", "value": {"type": "NESTED_ALIAS", "content": [
                    {"name": "z", "value": text("deep")}
                ]}}
            ]})),
            alias("a.x"),
            alias("a.y.z")
        ]))
        .unwrap();
        let dotted = resolve_json(json!([
            declare("a.x", number(1.0)),
            declare("a.y.z", text("deep")),
            alias("a.x"),
            alias("a.y.z")
        ]))
        .unwrap();

        assert_eq!(nested.ast, vec![Node::number(1.0), Node::text("deep")]);
        assert_eq!(nested.ast, dotted.ast);
    }

    #[test]
    fn test_flattened_field_cannot_be_redeclared() {
        let err = resolve_err(json!([
            declare("a", json!({"type": "NESTED_ALIAS", "content": [{"name": "x", "value": number(1.0)}]})),
            declare("a.x", number(2.0))
        ]));
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
        assert!(err.message.contains("a.x"));
    }

    #[test]
    fn test_alias_to_alias_is_resolved_at_declaration() {
        let resolution = resolve_json(json!([
            declare("a", text("value")),
            declare("b", alias("a")),
            alias("b")
        ]))
        .unwrap();
        assert_eq!(resolution.ast, vec![Node::text("value")]);
    }

    #[test]
    fn test_item_prefix_yields_item_property() {
        let resolution = resolve_json(json!([
            declare("book", json!({"type": "ITEM", "properties": [
                {"name": "title", "value": text("Dune")}
            ]})),
            alias("book.title")
        ]))
        .unwrap();
        match &resolution.ast[0] {
            Node::ItemProperty(p) => {
                assert_eq!(p.property, vec!["title".to_string()]);
                assert!(matches!(p.item.as_ref(), Node::Item(_)));
            }
            other => panic!("expected ITEM_PROPERTY, got {:?}", other),
        }
    }

    #[test]
    fn test_runtime_iterator_prefix_keeps_suffix() {
        let resolution = resolve_json(json!([
            declare("items", global("items", "List")),
            {"type": "FOR_LOOP", "iterator": "item", "iterable": alias("items"),
             "block": [alias("item.name"), alias("item.author.first"), alias("item")]}
        ]))
        .unwrap();

        let for_loop = match &resolution.ast[0] {
            Node::ForLoop(f) => f,
            other => panic!("expected FOR_LOOP, got {:?}", other),
        };
        let runtime_name = for_loop.iterator_runtime_name.clone().unwrap();
        let properties: Vec<Option<String>> = for_loop
            .block
            .iter()
            .map(|n| match n {
                Node::RuntimeIterator(it) => {
                    assert_eq!(it.runtime_name.as_deref(), Some(runtime_name.as_str()));
                    it.iterator_property.clone()
                }
                other => panic!("expected RUNTIME_ITERATOR, got {:?}", other),
            })
            .collect();
        assert_eq!(
            properties,
            vec![Some("name".to_string()), Some("author.first".to_string()), None]
        );
        assert!(validate_resolved(&resolution.ast).is_none());
    }

    #[test]
    fn test_alias_statement_redispatches_to_target() {
        let resolution = resolve_json(json!([
            declare("header", json!({"type": "XML", "tag": "h1", "content": [text("Title")]})),
            alias("header")
        ]))
        .unwrap();
        match &resolution.ast[0] {
            Node::Xml(xml) => {
                assert_eq!(xml.tag, "h1");
                assert_eq!(xml.block, vec![Node::text("Title")]);
            }
            other => panic!("expected XML, got {:?}", other),
        }
    }

    #[test]
    fn test_xml_attributes_and_children_resolve_in_place() {
        let resolution = resolve_json(json!([
            declare("width", number(10.0)),
            declare("label", text("hi")),
            {"type": "XML", "tag": "div",
             "attributes": [{"namespace": ["style"], "value": {"type": "NESTED_ALIAS", "content": [
                 {"name": "width", "value": alias("width")}
             ]}}],
             "block": [alias("label")]}
        ]))
        .unwrap();
        assert!(validate_resolved(&resolution.ast).is_none());
        match &resolution.ast[0] {
            Node::Xml(xml) => {
                assert_eq!(xml.block, vec![Node::text("hi")]);
                match &xml.attributes[0].value {
                    Node::NestedAlias(style) => assert_eq!(style.content[0].value, Node::number(10.0)),
                    other => panic!("expected NESTED_ALIAS, got {:?}", other),
                }
            }
            other => panic!("expected XML, got {:?}", other),
        }
    }

    #[test]
    fn test_dot_notation_attribute_is_rejected() {
        let err = resolve_err(json!([
            {"type": "XML", "tag": "div",
             "attributes": [{"namespace": ["style", "width"], "value": number(10.0)}]}
        ]));
        assert_eq!(err.kind, ErrorKind::UnsupportedAttribute);
        assert!(err.hints[0].contains("style={ width: ... }"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // TYPES, LOOPS AND CONDITIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_for_loop_requires_a_list() {
        let err = resolve_err(json!([
            declare("items", number(3.0)),
            {"type": "FOR_LOOP", "iterator": "x", "iterable": alias("items"), "block": []}
        ]));
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(err.message.contains("List"));

        assert!(resolve_json(json!([
            {"type": "FOR_LOOP", "iterator": "x",
             "iterable": {"type": "LIST", "content": [text("a"), text("b")]}, "block": [alias("x")]}
        ]))
        .is_ok());
    }

    #[test]
    fn test_loop_iterator_is_scoped_to_the_body() {
        let err = resolve_err(json!([
            {"type": "FOR_LOOP", "iterator": "x",
             "iterable": {"type": "LIST", "content": []}, "block": []},
            alias("x")
        ]));
        assert_eq!(err.kind, ErrorKind::UndeclaredAlias);
    }

    #[test]
    fn test_disabled_comparison_is_rejected() {
        let config = CompilerConfig::from_json_str(r#"{"comparisons": ["=="]}"#).unwrap();
        let ast = nodes(json!([
            {"type": "IF_STATEMENT",
             "condition": {"left": number(1.0), "comparison": "<", "right": number(2.0)},
             "ifBlock": []}
        ]));
        let err = resolve(ast, &config, &JsonSourceParser).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(err.message.contains("\"<\""));
    }

    #[test]
    fn test_right_operand_without_comparison_is_rejected() {
        let err = resolve_err(json!([
            {"type": "IF_STATEMENT",
             "condition": {"left": number(1.0), "right": number(2.0)},
             "ifBlock": [text("yes")]}
        ]));
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(err.message.contains("no comparison"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // HANDLERS, TEMPLATES, MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_declared_handler_is_hoisted_with_resolved_mutations() {
        let resolution = resolve_json(json!([
            declare("count", global("count", "Number")),
            declare("increment", json!({"type": "HANDLER", "block": [mutation("count.add", json!([number(1.0)]))]}))
        ]))
        .unwrap();

        assert!(resolution.ast.is_empty());
        assert_eq!(resolution.declarations.len(), 1);
        match &resolution.declarations[0] {
            Node::Handler(handler) => {
                assert!(handler.runtime_name.is_some());
                match &handler.block[0] {
                    Node::Mutation(m) => {
                        assert_eq!(m.method.as_deref(), Some("add"));
                        assert!(m.alias.is_none());
                        assert!(matches!(m.target.as_deref(), Some(Node::Reference(_))));
                    }
                    other => panic!("expected MUTATION, got {:?}", other),
                }
            }
            other => panic!("expected HANDLER, got {:?}", other),
        }
    }

    #[test]
    fn test_mutation_method_must_fit_target_type() {
        let err = resolve_err(json!([
            declare("count", global("count", "Number")),
            declare("h", json!({"type": "HANDLER", "block": [mutation("count.push", json!([number(1.0)]))]}))
        ]));
        assert_eq!(err.kind, ErrorKind::InvalidMethod);
        assert!(err.hints[0].contains("add"));
    }

    #[test]
    fn test_click_mutation_of_local_alias_is_unaddressable() {
        let err = resolve_err(json!([
            declare("local", number(5.0)),
            {"type": "XML", "tag": "button",
             "attributes": [{"namespace": ["onClick"], "value": {"type": "HANDLER", "block": [
                 mutation("local.set", json!([number(6.0)]))
             ]}}]}
        ]));
        assert_eq!(err.kind, ErrorKind::UnaddressableMutationTarget);
        assert!(err.message.contains("\"local\""));
    }

    #[test]
    fn test_inline_handler_is_not_hoisted() {
        let resolution = resolve_json(json!([
            declare("items", global("items", "List")),
            {"type": "XML", "tag": "button",
             "attributes": [{"namespace": ["onClick"], "value": {"type": "HANDLER", "block": [
                 mutation("items.push", json!([text("new")]))
             ]}}]}
        ]))
        .unwrap();
        assert!(resolution.declarations.is_empty());
        assert!(validate_resolved(&resolution.ast).is_none());
    }

    #[test]
    fn test_template_invocation_and_arguments() {
        let resolution = resolve_json(json!([
            declare("greet", json!({"type": "TEMPLATE", "args": ["who"], "block": [alias("who")]})),
            {"type": "INVOCATION", "alias": {"namespace": ["greet"]}, "args": [text("Ada")]}
        ]))
        .unwrap();

        let template = match &resolution.declarations[0] {
            Node::Template(t) => t,
            other => panic!("expected TEMPLATE, got {:?}", other),
        };
        assert_eq!(template.arg_runtime_names.len(), 1);
        match &template.block[0] {
            Node::TemplateArgument(arg) => {
                assert_eq!(arg.name, "who");
                assert_eq!(arg.runtime_name, template.arg_runtime_names[0]);
            }
            other => panic!("expected TEMPLATE_ARGUMENT, got {:?}", other),
        }

        match &resolution.ast[0] {
            Node::Invocation(invocation) => {
                assert!(invocation.alias.is_none());
                assert!(matches!(invocation.invocable.as_deref(), Some(Node::Template(_))));
                assert_eq!(invocation.args, vec![Node::text("Ada")]);
            }
            other => panic!("expected INVOCATION, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_template_is_registered() {
        let resolution = resolve_json(json!([
            declare("flag", global("flag", "Number")),
            {"type": "IF_STATEMENT", "condition": {"left": alias("flag")},
             "ifBlock": [declare("inner", json!({"type": "TEMPLATE", "block": [text("x")]}))]}
        ]))
        .unwrap();
        assert_eq!(resolution.declarations.len(), 1);
        assert!(matches!(resolution.declarations[0], Node::Template(_)));
    }

    #[test]
    fn test_invoking_a_value_fails() {
        let err = resolve_err(json!([
            declare("n", number(1.0)),
            {"type": "INVOCATION", "alias": {"namespace": ["n"]}, "args": []}
        ]));
        assert_eq!(err.kind, ErrorKind::MissingInvocable);
    }

    #[test]
    fn test_handler_declared_in_loop_cannot_use_the_item() {
        let err = resolve_err(json!([
            declare("items", global("items", "List")),
            declare("selected", global("selected", "Text")),
            {"type": "FOR_LOOP", "iterator": "x", "iterable": alias("items"), "block": [
                declare("pick", json!({"type": "HANDLER", "block": [
                    mutation("selected.set", json!([alias("x.name")]))
                ]}))
            ]}
        ]));
        assert_eq!(err.kind, ErrorKind::EscapingBinding);
        assert!(err.message.contains("\"pick\""));
        assert!(err.message.contains("for loop"));
        assert!(err.hints[0].contains("pass the value as an argument"));
    }

    #[test]
    fn test_nested_template_cannot_use_outer_argument() {
        let err = resolve_err(json!([
            declare("outer", json!({"type": "TEMPLATE", "args": ["who"], "block": [
                declare("inner", json!({"type": "TEMPLATE", "block": [alias("who")]}))
            ]}))
        ]));
        assert_eq!(err.kind, ErrorKind::EscapingBinding);
        assert!(err.message.contains("\"inner\""));
    }

    #[test]
    fn test_hoisted_bodies_may_use_their_own_bindings() {
        let resolution = resolve_json(json!([
            declare("items", global("items", "List")),
            declare("count", global("count", "Number")),
            {"type": "FOR_LOOP", "iterator": "x", "iterable": alias("items"), "block": [
                declare("bump", json!({"type": "HANDLER", "block": [mutation("count.add", json!([number(1.0)]))]}))
            ]},
            declare("row", json!({"type": "TEMPLATE", "args": ["label"], "block": [
                {"type": "FOR_LOOP", "iterator": "y", "iterable": alias("items"),
                 "block": [alias("label"), alias("y.name")]}
            ]}))
        ]))
        .unwrap();
        assert_eq!(resolution.declarations.len(), 2);
    }

    #[test]
    fn test_preset_mutation_target_is_checked() {
        let err = resolve_err(json!([
            declare("h", json!({"type": "HANDLER", "block": [
                {"type": "MUTATION", "target": number(5.0), "method": "set", "args": [number(6.0)]}
            ]}))
        ]));
        assert_eq!(err.kind, ErrorKind::UnaddressableMutationTarget);

        let err = resolve_err(json!([
            declare("h", json!({"type": "HANDLER", "block": [
                {"type": "MUTATION", "target": global("count", "Number"), "method": "push", "args": []}
            ]}))
        ]));
        assert_eq!(err.kind, ErrorKind::InvalidMethod);
    }

    #[test]
    fn test_preset_mutation_arguments_are_resolved() {
        let resolution = resolve_json(json!([
            declare("step", number(2.0)),
            declare("h", json!({"type": "HANDLER", "block": [
                {"type": "MUTATION", "target": global("count", "Number"), "method": "add", "args": [alias("step")]}
            ]}))
        ]))
        .unwrap();
        let handler = match &resolution.declarations[0] {
            Node::Handler(h) => h,
            other => panic!("expected HANDLER, got {:?}", other),
        };
        match &handler.block[0] {
            Node::Mutation(m) => {
                assert_eq!(m.method.as_deref(), Some("add"));
                assert_eq!(m.args, vec![Node::number(2.0)]);
            }
            other => panic!("expected MUTATION, got {:?}", other),
        }
    }

    #[test]
    fn test_typed_reference_survives_resolution() {
        let resolution = resolve_json(json!([declare("c", global("c", "Number")), alias("c")])).unwrap();
        match &resolution.ast[0] {
            Node::Reference(r) => assert_eq!(r.data_type, Some(FunType::Number)),
            other => panic!("expected REFERENCE, got {:?}", other),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // IMPORTS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn greeter_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("Modules/Greeter/Greeter.fun"),
            &json!([declare("greeting", text("hello"))]).to_string(),
        );
        write(&dir.path().join("Modules/Greeter/Greeter.js"), "fun.greeter = {};");
        write(&dir.path().join("Modules/Plain/Plain.fun"), "[]");
        dir
    }

    #[test]
    fn test_module_import_is_idempotent() {
        init_logger();
        let dir = greeter_project();
        let config = project(dir.path());
        let import = json!({"type": "IMPORT_MODULE", "name": "Greeter"});

        let twice = resolve(nodes(json!([import, import, alias("greeting")])), &config, &JsonSourceParser).unwrap();
        let once = resolve(nodes(json!([import, alias("greeting")])), &config, &JsonSourceParser).unwrap();

        assert_eq!(twice, once);
        assert_eq!(twice.ast, vec![Node::text("hello")]);
        assert_eq!(twice.modules.len(), 1);
        assert_eq!(twice.modules[0].code.as_deref(), Some("fun.greeter = {};"));
    }

    #[test]
    fn test_module_without_code_file() {
        let dir = greeter_project();
        let resolution = resolve(
            nodes(json!([{"type": "IMPORT_MODULE", "name": "Plain"}])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap();
        assert_eq!(resolution.modules[0].name, "Plain");
        assert!(resolution.modules[0].code.is_none());
    }

    #[test]
    fn test_missing_module_lists_available_modules() {
        let dir = greeter_project();
        let err = resolve(
            nodes(json!([{"type": "IMPORT_MODULE", "name": "Nope"}])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingModule);
        assert_eq!(err.hints, vec!["Available modules: Greeter, Plain".to_string()]);
    }

    #[test]
    fn test_file_import_records_dependency_once() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("shared/consts.fun"),
            &json!([declare("answer", number(42.0))]).to_string(),
        );
        let import = json!({"type": "IMPORT_FILE", "path": "shared/consts"});
        let resolution = resolve(
            nodes(json!([import, import, alias("answer")])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap();

        assert_eq!(resolution.file_dependencies.len(), 1);
        assert!(resolution.file_dependencies[0].ends_with("shared/consts.fun"));
        assert_eq!(resolution.ast, vec![Node::number(42.0)]);
    }

    #[test]
    fn test_imported_statements_are_spliced_in_place() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("banner.fun"), &json!([text("banner")]).to_string());
        let resolution = resolve(
            nodes(json!([text("before"), {"type": "IMPORT_FILE", "path": "banner"}, text("after")])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap();
        let texts: Vec<&Literal> = resolution
            .ast
            .iter()
            .map(|n| match n {
                Node::StaticValue(s) => &s.value,
                other => panic!("expected STATIC_VALUE, got {:?}", other),
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                &Literal::Text("before".to_string()),
                &Literal::Text("banner".to_string()),
                &Literal::Text("after".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_file_import() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(
            nodes(json!([{"type": "IMPORT_FILE", "path": "ghost"}])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingImport);
        assert!(err.message.contains("ghost.fun"));
    }

    #[test]
    fn test_errors_in_imported_file_name_that_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("broken.fun"),
            &json!([{"type": "IF_STATEMENT", "condition": {"left": alias("nowhere")}, "ifBlock": []}]).to_string(),
        );
        let err = resolve(
            nodes(json!([{"type": "IMPORT_FILE", "path": "broken"}])),
            &project(dir.path()),
            &JsonSourceParser,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndeclaredAlias);
        assert!(err.file.ends_with("broken.fun"));
    }

    #[test]
    fn test_parse_cache_skips_second_parse() {
        init_logger();
        let dir = tempfile::tempdir().unwrap();
        let source = "consts v1";
        write(&dir.path().join("consts.fun"), source);
        let parser = ScriptedParser::new(vec![(source, json!([declare("answer", number(42.0))]))]);
        let config = CompilerConfig {
            cache_dir: Some(dir.path().join(".cache")),
            ..project(dir.path())
        };

        for _ in 0..2 {
            let resolution = resolve(
                nodes(json!([{"type": "IMPORT_FILE", "path": "consts"}, alias("answer")])),
                &config,
                &parser,
            )
            .unwrap();
            assert_eq!(resolution.ast, vec![Node::number(42.0)]);
        }
        assert_eq!(parser.calls.get(), 1);
    }
}
