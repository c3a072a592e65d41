//! Append-only builder for emitted JavaScript.
//!
//! Every helper appends one structural piece (a hook declaration, a closure
//! boundary, an observer registration) and returns the builder so calls
//! chain in the order the code reads.

use crate::ast::ReferenceNode;

const INDENT: &str = "\t";

#[derive(Debug, Default)]
pub struct CodeBuilder {
    lines: Vec<String>,
    depth: usize,
}

/// Quotes `s` as a JS string literal.
pub fn q(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Addresses (and lazily creates) the hook `hook` under `parent`.
pub fn hook_code(parent: &str, hook: &str) -> String {
    format!("fun.getDOMHook({}, {})", parent, hook)
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends code at the current depth. Multi-line input is re-indented
    /// line by line, so nested builders can be spliced in.
    pub fn code(&mut self, code: &str) -> &mut Self {
        for line in code.lines() {
            if line.trim().is_empty() {
                continue;
            }
            self.lines
                .push(format!("{}{}", INDENT.repeat(self.depth), line));
        }
        self
    }

    /// Appends text exactly as given.
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.lines.extend(text.lines().map(|l| l.to_string()));
        self
    }

    pub fn newline(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.lines.push(String::new());
        }
        self
    }

    pub fn box_comment(&mut self, text: &str) -> &mut Self {
        let width = text.lines().map(|l| l.len()).max().unwrap_or(0);
        let border = "*".repeat(width + 4);
        self.code(&format!("/{}", border));
        for line in text.lines() {
            self.code(&format!(" * {:<width$} *", line, width = width));
        }
        self.code(&format!(" {}/", border))
    }

    pub fn declare_hook(&mut self, hook: &str) -> &mut Self {
        self.code(&format!("var {} = fun.name();", hook))
    }

    pub fn create_hook(&mut self, parent: &str, hook: &str, tag: &str, attrs: &[(String, String)]) -> &mut Self {
        let attrs: Vec<String> = attrs
            .iter()
            .map(|(k, v)| format!("{}: {}", q(k), q(v)))
            .collect();
        self.code(&format!(
            "fun.getDOMHook({}, {}, {}, {{{}}});",
            parent,
            hook,
            q(tag),
            attrs.join(", ")
        ))
    }

    pub fn assign(&mut self, target: &str, value: &str) -> &mut Self {
        self.code(&format!("{} = {};", target, value))
    }

    pub fn declare(&mut self, name: &str, value: &str) -> &mut Self {
        self.code(&format!("var {} = {};", name, value))
    }

    pub fn closure_start(&mut self) -> &mut Self {
        self.code(";(function() {");
        self.depth += 1;
        self
    }

    pub fn closure_end(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.code("})();")
    }

    pub fn function_start(&mut self, name: &str, params: &[String]) -> &mut Self {
        self.code(&format!("function {}({}) {{", name, params.join(", ")));
        self.depth += 1;
        self
    }

    pub fn function_end(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.code("}")
    }

    pub fn block_start(&mut self, head: &str) -> &mut Self {
        self.code(&format!("{} {{", head));
        self.depth += 1;
        self
    }

    pub fn block_end(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.code("}")
    }

    pub fn call_function(&mut self, name: &str, args: &[String]) -> &mut Self {
        self.code(&format!("{}({});", name, args.join(", ")))
    }

    /// Subscribes `callback` to mutations of `reference`. The runtime
    /// cancels the subscription when `owner` is destroyed.
    pub fn observe(&mut self, reference: &ReferenceNode, callback: &str, owner: &str) -> &mut Self {
        self.code(&format!(
            "fun.observe({}, {}, {}, {});",
            q(reference.kind.as_str()),
            q(&reference.name),
            callback,
            owner
        ))
    }

    pub fn reflect_input(&mut self, hook: &str, reference: &ReferenceNode) -> &mut Self {
        self.code(&format!(
            "fun.reflectInput({}, {}, {});",
            hook,
            q(reference.kind.as_str()),
            q(&reference.name)
        ))
    }

    pub fn bind_attribute(&mut self, hook: &str, attribute: &str, reference: &ReferenceNode) -> &mut Self {
        self.code(&format!(
            "fun.bindAttribute({}, {}, {}, {});",
            hook,
            q(attribute),
            q(reference.kind.as_str()),
            q(&reference.name)
        ))
    }

    pub fn bind_style(&mut self, hook: &str, property: &str, reference: &ReferenceNode) -> &mut Self {
        self.code(&format!(
            "fun.bindStyle({}, {}, {}, {});",
            hook,
            q(property),
            q(reference.kind.as_str()),
            q(&reference.name)
        ))
    }

    pub fn with_hook_start(&mut self, hook: &str, var: &str) -> &mut Self {
        self.code(&format!("fun.withHook({}, function({}) {{", hook, var));
        self.depth += 1;
        self
    }

    pub fn with_hook_end(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.code("});")
    }

    pub fn if_else(&mut self, condition: &str, if_code: &str, else_code: &str) -> &mut Self {
        self.code(&format!(
            "if ({}) {{ {} }} else {{ {} }}",
            condition, if_code, else_code
        ))
    }

    pub fn return_if_equal(&mut self, a: &str, b: &str) -> &mut Self {
        self.code(&format!("if ({} === {}) {{ return; }}", a, b))
    }

    pub fn mutate(&mut self, method: &str, target: &ReferenceNode, args: &[String]) -> &mut Self {
        self.code(&format!(
            "fun.mutate({}, {}, {}, [{}]);",
            q(method),
            q(target.kind.as_str()),
            q(&target.name),
            args.join(", ")
        ))
    }

    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ReferenceKind, SourceLocation};

    #[test]
    fn test_nested_code_is_reindented() {
        let mut inner = CodeBuilder::new();
        inner.declare("a", "1").declare("b", "2");

        let mut outer = CodeBuilder::new();
        outer.closure_start().code(&inner.build()).closure_end();
        assert_eq!(outer.build(), ";(function() {\n\tvar a = 1;\n\tvar b = 2;\n})();\n");
    }

    #[test]
    fn test_runtime_calls() {
        let reference = ReferenceNode {
            kind: ReferenceKind::Global,
            name: "count".to_string(),
            data_type: None,
            location: SourceLocation::default(),
        };
        let mut b = CodeBuilder::new();
        b.observe(&reference, "cb", "hook_1")
            .mutate("add", &reference, &["1".to_string()])
            .create_hook("hook_1", "hook_2", "div", &[("class".to_string(), "big".to_string())]);
        let code = b.build();
        assert!(code.contains("fun.observe(\"GLOBAL\", \"count\", cb, hook_1);"));
        assert!(code.contains("fun.mutate(\"add\", \"GLOBAL\", \"count\", [1]);"));
        assert!(code.contains("fun.getDOMHook(hook_1, hook_2, \"div\", {\"class\": \"big\"});"));
    }

    #[test]
    fn test_box_comment_and_quoting() {
        let mut b = CodeBuilder::new();
        b.box_comment("lib.js");
        assert_eq!(b.build(), "/**********\n * lib.js *\n **********/\n");
        assert_eq!(q("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
