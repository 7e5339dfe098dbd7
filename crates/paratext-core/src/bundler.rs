/*
 * bundler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bundling: resolving imports and inlining components.
//!
//! Bundling turns a document plus everything it imports into one
//! self-contained tree. Each imported file is parsed once per bundle run
//! and bound to its default-import name; elements whose name matches a
//! binding are replaced by the imported body, with `props.*` references in
//! expression nodes substituted from the call site's attribute text and
//! `props.children` replaced by the call site's children. Cycles are
//! detected on the import call stack before a file is parsed.

use crate::engine::TreeParser;
use crate::error::{TemplateError, TemplateResult};
use crate::loader::{dirname, resolve_path, ContentLoader};
use crate::value::format_number;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use paratext_ast::{Attribute, AttributeValue, Element, ModuleStatement, Node, Nodes};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// A `props.<name>` reference inside expression source text.
static PROP_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"props\.(\w+)").unwrap());

/// Attribute text that is a self-contained literal: a quoted string or a
/// plain decimal number.
static LITERAL_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^['"].*['"]$|^\d+(\.\d+)?$"#).unwrap());

/// Component nesting deeper than this aborts bundling.
const MAX_INLINE_DEPTH: usize = 64;

/// Stand-in path for content bundled from a string rather than a file.
const ENTRY_FILE: &str = "__entry__.md";

/// Default-import name to inlined component body.
type ComponentTable = IndexMap<String, Nodes>;

/// Attribute name to raw attribute source text.
type RawProps = IndexMap<String, String>;

pub(crate) struct Bundler<'a> {
    parser: &'a dyn TreeParser,
    loader: &'a dyn ContentLoader,
    processed: HashSet<String>,
}

impl<'a> Bundler<'a> {
    pub(crate) fn new(parser: &'a dyn TreeParser, loader: &'a dyn ContentLoader) -> Self {
        Self {
            parser,
            loader,
            processed: HashSet::new(),
        }
    }

    /// Bundle in-memory content whose imports resolve against `base_dir`.
    pub(crate) fn bundle(&mut self, content: &str, base_dir: &str) -> TemplateResult<Node> {
        let entry = resolve_path(base_dir, ENTRY_FILE);
        self.bundle_at(content, &entry)
    }

    /// Bundle content that logically lives at `entry_path`.
    pub(crate) fn bundle_at(&mut self, content: &str, entry_path: &str) -> TemplateResult<Node> {
        let mut call_stack = Vec::new();
        let (mut children, components) =
            self.process_content(content, entry_path, &mut call_stack)?;
        while self.inline_pass(&mut children, &components)? {}
        Ok(Node::root(children))
    }

    /// Parse one file, process its imports depth-first, and return its
    /// top-level nodes plus the component table it contributes.
    fn process_content(
        &mut self,
        content: &str,
        path: &str,
        call_stack: &mut Vec<String>,
    ) -> TemplateResult<(Nodes, ComponentTable)> {
        if call_stack.iter().any(|entry| entry == path) {
            let mut chain = call_stack.clone();
            chain.push(path.to_string());
            return Err(TemplateError::CircularImport { chain });
        }
        // a file already bundled elsewhere contributes nothing new
        if self.processed.contains(path) {
            return Ok((Vec::new(), ComponentTable::new()));
        }

        let tree = self.parser.parse(content)?;
        let Node::Root(root) = tree else {
            return Err(TemplateError::Parse {
                message: format!("expected a root node for {path}"),
            });
        };
        let mut children = root.children;
        remove_comments(&mut children);

        call_stack.push(path.to_string());
        let mut components = ComponentTable::new();
        for node in &children {
            let Node::Import(import) = node else {
                continue;
            };
            for statement in &import.statements {
                match statement {
                    ModuleStatement::Export => {
                        call_stack.pop();
                        return Err(TemplateError::Import {
                            path: path.to_string(),
                            message: format!("Exports are not supported. Found in {path}"),
                        });
                    }
                    ModuleStatement::Import {
                        default_binding,
                        named_bindings,
                        source,
                    } => {
                        if !named_bindings.is_empty() {
                            call_stack.pop();
                            return Err(TemplateError::Import {
                                path: path.to_string(),
                                message: format!(
                                    "Only default imports are supported. Invalid import in {path}"
                                ),
                            });
                        }
                        let Some(name) = default_binding else {
                            call_stack.pop();
                            return Err(TemplateError::Import {
                                path: path.to_string(),
                                message: format!("Invalid import in {path}"),
                            });
                        };
                        let import_path = resolve_path(&dirname(path), source);
                        let loaded =
                            self.loader
                                .load(&import_path)
                                .map_err(|source| TemplateError::Load {
                                    path: import_path.clone(),
                                    source,
                                })?;
                        let (nested_children, nested_components) =
                            self.process_content(&loaded, &import_path, call_stack)?;
                        // bindings from deeper files are visible here, but a
                        // direct import of the same name wins
                        components.extend(nested_components);
                        components.insert(name.clone(), nested_children);
                    }
                }
            }
        }
        call_stack.pop();

        children.retain(|node| !matches!(node, Node::Import(_)));
        self.processed.insert(path.to_string());
        debug!(path, "bundled file");
        Ok((children, components))
    }

    /// One inlining sweep. Returns whether anything changed.
    fn inline_pass(&self, nodes: &mut Nodes, components: &ComponentTable) -> TemplateResult<bool> {
        let mut changed = false;
        let mut index = 0;
        while index < nodes.len() {
            let mut replacement: Option<Vec<Node>> = None;
            if let Node::Element(element) = &nodes[index] {
                if let Some(name) = element.name.as_deref() {
                    if let Some(body) = components.get(name) {
                        let props = extract_raw_props(name, &element.attributes, &RawProps::new())?;
                        let mut inlined = Vec::new();
                        for body_node in body {
                            inlined.extend(self.instantiate(
                                body_node,
                                &props,
                                &element.children,
                                components,
                                0,
                            )?);
                        }
                        replacement = Some(inlined);
                    }
                }
            }
            match replacement {
                Some(replacement) => {
                    let count = replacement.len();
                    nodes.splice(index..index + 1, replacement);
                    index += count;
                    changed = true;
                }
                None => {
                    if let Some(children) = nodes[index].children_mut() {
                        if self.inline_pass(children, components)? {
                            changed = true;
                        }
                    }
                    index += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Instantiate one node of a component body at a call site.
    fn instantiate(
        &self,
        node: &Node,
        props: &RawProps,
        caller_children: &[Node],
        components: &ComponentTable,
        depth: usize,
    ) -> TemplateResult<Vec<Node>> {
        match node {
            Node::ExpressionInline(expr) if expr.value == "props.children" => {
                self.splice_caller_children(caller_children, components)
            }
            Node::ExpressionBlock(expr) if expr.value == "props.children" => {
                self.splice_caller_children(caller_children, components)
            }
            Node::ExpressionInline(expr) if expr.value.contains("props.") => Ok(vec![
                substituted_expression(&expr.value, props, Node::expression_inline)?,
            ]),
            Node::ExpressionBlock(expr) if expr.value.contains("props.") => Ok(vec![
                substituted_expression(&expr.value, props, Node::expression_block)?,
            ]),
            Node::Element(element) => {
                if let Some(name) = element.name.as_deref() {
                    if let Some(body) = components.get(name) {
                        if depth >= MAX_INLINE_DEPTH {
                            return Err(TemplateError::RecursiveInline {
                                name: name.to_string(),
                                max_depth: MAX_INLINE_DEPTH,
                            });
                        }
                        let nested_props = extract_raw_props(name, &element.attributes, props)?;
                        let mut out = Vec::new();
                        for body_node in body {
                            out.extend(self.instantiate(
                                body_node,
                                &nested_props,
                                &element.children,
                                components,
                                depth + 1,
                            )?);
                        }
                        return Ok(out);
                    }
                }
                let mut children = Vec::with_capacity(element.children.len());
                for child in &element.children {
                    children.extend(self.instantiate(
                        child,
                        props,
                        caller_children,
                        components,
                        depth,
                    )?);
                }
                Ok(vec![Node::Element(Element {
                    name: element.name.clone(),
                    attributes: element.attributes.clone(),
                    children,
                })])
            }
            parent if parent.children().is_some() => {
                let mut rebuilt = parent.clone();
                if let Some(children) = rebuilt.children_mut() {
                    let original = std::mem::take(children);
                    let mut out = Vec::with_capacity(original.len());
                    for child in &original {
                        out.extend(self.instantiate(
                            child,
                            props,
                            caller_children,
                            components,
                            depth,
                        )?);
                    }
                    *children = out;
                }
                Ok(vec![rebuilt])
            }
            leaf => Ok(vec![leaf.clone()]),
        }
    }

    /// Inline the call site's children fully, then merge them into a single
    /// paragraph so they flow where `props.children` stood.
    fn splice_caller_children(
        &self,
        caller_children: &[Node],
        components: &ComponentTable,
    ) -> TemplateResult<Vec<Node>> {
        let mut inlined = caller_children.to_vec();
        while self.inline_pass(&mut inlined, components)? {}
        Ok(merge_into_paragraph(inlined))
    }
}

fn remove_comments(nodes: &mut Nodes) {
    nodes.retain(|node| !is_comment(node));
    for node in nodes {
        if let Some(children) = node.children_mut() {
            remove_comments(children);
        }
    }
}

fn is_comment(node: &Node) -> bool {
    let value = match node {
        Node::ExpressionInline(expr) => &expr.value,
        Node::ExpressionBlock(expr) => &expr.value,
        _ => return false,
    };
    let trimmed = value.trim();
    trimmed.starts_with("//") || (trimmed.starts_with("/*") && trimmed.ends_with("*/"))
}

fn merge_into_paragraph(children: Nodes) -> Vec<Node> {
    let mut inline = Vec::new();
    let last = children.len().saturating_sub(1);
    for (index, child) in children.into_iter().enumerate() {
        match child {
            Node::Paragraph(paragraph) => inline.extend(paragraph.children),
            Node::List(list) => inline.extend(list.children),
            other => inline.push(other),
        }
        if index < last {
            inline.push(Node::text("\n"));
        }
    }
    if inline.is_empty() {
        Vec::new()
    } else {
        vec![Node::paragraph(inline)]
    }
}

/// Record each attribute of a component call as raw source text: literals
/// as encoded strings, expressions with the parent's props substituted in.
fn extract_raw_props(
    element_name: &str,
    attributes: &[Attribute],
    parent_props: &RawProps,
) -> TemplateResult<RawProps> {
    let mut props = RawProps::new();
    for attribute in attributes {
        match attribute {
            Attribute::Named { name, value } => {
                let raw = match value {
                    None => "\"\"".to_string(),
                    Some(AttributeValue::Literal(text)) => encode_literal(text),
                    Some(AttributeValue::Expression(source)) => {
                        substitute_props(source, parent_props)?
                    }
                };
                props.insert(name.clone(), raw);
            }
            Attribute::Spread { .. } => {
                return Err(TemplateError::UnsupportedAttribute {
                    element: element_name.to_string(),
                    message: format!(
                        "Only literal attribute values are supported. \
                         Invalid attribute in component <{element_name}>."
                    ),
                });
            }
        }
    }
    Ok(props)
}

fn encode_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

/// Replace `props.<name>` references with the call site's raw attribute
/// text. A reference to an absent prop stays as written. One visited set
/// covers the whole expression, so reference cycles fail fast.
fn substitute_props(expression: &str, props: &RawProps) -> TemplateResult<String> {
    let mut visited = HashSet::new();
    substitute_into(expression, props, &mut visited)
}

fn substitute_into(
    expression: &str,
    props: &RawProps,
    visited: &mut HashSet<String>,
) -> TemplateResult<String> {
    let mut out = String::with_capacity(expression.len());
    let mut consumed = 0;
    for found in PROP_REFERENCE.find_iter(expression) {
        let name = &found.as_str()["props.".len()..];
        out.push_str(&expression[consumed..found.start()]);
        consumed = found.end();
        match props.get(name) {
            None => out.push_str(found.as_str()),
            Some(raw) => {
                if !visited.insert(name.to_string()) {
                    return Err(TemplateError::Prop {
                        message: format!("Circular reference detected for property '{name}'."),
                    });
                }
                out.push_str(&substitute_into(raw, props, visited)?);
            }
        }
    }
    out.push_str(&expression[consumed..]);
    Ok(out)
}

/// Rebuild an expression node after substitution. Text that collapsed to a
/// self-contained literal becomes plain text instead.
fn substituted_expression(
    value: &str,
    props: &RawProps,
    make: impl FnOnce(String) -> Node,
) -> TemplateResult<Node> {
    let substituted = substitute_props(value, props)?;
    if LITERAL_TEXT.is_match(&substituted) {
        return literal_text_node(substituted);
    }
    Ok(make(substituted))
}

fn literal_text_node(text: String) -> TemplateResult<Node> {
    if text.starts_with('"') || text.starts_with('\'') {
        let decoded: String = serde_json::from_str(&text).map_err(|_| TemplateError::Prop {
            message: format!("Invalid literal: {text}"),
        })?;
        return Ok(Node::text(decoded));
    }
    let number: f64 = text.parse().map_err(|_| TemplateError::Prop {
        message: format!("Invalid literal: {text}"),
    })?;
    Ok(Node::text(format_number(number)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Maps exact source strings to pre-built trees, standing in for a
    /// real parser.
    struct StubParser {
        trees: HashMap<String, Node>,
    }

    impl StubParser {
        fn with(entries: Vec<(&str, Node)>) -> Self {
            let trees = entries
                .into_iter()
                .map(|(source, tree)| (source.to_string(), tree))
                .collect();
            Self { trees }
        }
    }

    impl TreeParser for StubParser {
        fn parse(&self, source: &str) -> TemplateResult<Node> {
            self.trees
                .get(source)
                .cloned()
                .ok_or_else(|| TemplateError::Parse {
                    message: format!("no stub tree for {source:?}"),
                })
        }
    }

    fn import_node(name: &str, source: &str) -> Node {
        Node::import(vec![ModuleStatement::default_import(name, source)])
    }

    #[test]
    fn test_inlines_a_component_with_a_literal_prop() {
        let parser = StubParser::with(vec![
            (
                "ENTRY",
                Node::root(vec![
                    import_node("Card", "./card.md"),
                    Node::element(
                        "Card",
                        vec![Attribute::literal("title", "Hi")],
                        vec![],
                    ),
                ]),
            ),
            (
                "CARD",
                Node::root(vec![Node::heading(
                    1,
                    vec![Node::expression_inline("props.title")],
                )]),
            ),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/docs/card.md", "CARD");

        let mut bundler = Bundler::new(&parser, &loader);
        let bundled = bundler.bundle("ENTRY", "/docs").unwrap();
        assert_eq!(
            bundled,
            Node::root(vec![Node::heading(1, vec![Node::text("Hi")])])
        );
    }

    #[test]
    fn test_splices_caller_children() {
        let parser = StubParser::with(vec![
            (
                "ENTRY",
                Node::root(vec![
                    import_node("Box", "./box.md"),
                    Node::element(
                        "Box",
                        vec![],
                        vec![Node::paragraph(vec![Node::text("inner")])],
                    ),
                ]),
            ),
            (
                "BOX",
                Node::root(vec![Node::expression_block("props.children")]),
            ),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/d/box.md", "BOX");

        let mut bundler = Bundler::new(&parser, &loader);
        let bundled = bundler.bundle("ENTRY", "/d").unwrap();
        assert_eq!(
            bundled,
            Node::root(vec![Node::paragraph(vec![Node::text("inner")])])
        );
    }

    #[test]
    fn test_detects_circular_imports() {
        let parser = StubParser::with(vec![
            ("A", Node::root(vec![import_node("B", "./b.md")])),
            ("B", Node::root(vec![import_node("A", "./a.md")])),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/d/a.md", "A");
        loader.add("/d/b.md", "B");

        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("A", "/d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Circular import detected: /d/__entry__.md -> /d/b.md -> /d/a.md -> /d/b.md"
        );
    }

    #[test]
    fn test_second_import_of_a_file_binds_nothing() {
        let parser = StubParser::with(vec![
            (
                "ENTRY",
                Node::root(vec![
                    import_node("First", "./shared.md"),
                    import_node("Second", "./shared.md"),
                    Node::element("First", vec![], vec![]),
                    Node::element("Second", vec![], vec![]),
                ]),
            ),
            ("SHARED", Node::root(vec![Node::text("shared body")])),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/d/shared.md", "SHARED");

        let mut bundler = Bundler::new(&parser, &loader);
        let bundled = bundler.bundle("ENTRY", "/d").unwrap();
        // the second binding points at an already-processed file, so the
        // element expands to nothing
        assert_eq!(bundled, Node::root(vec![Node::text("shared body")]));
    }

    #[test]
    fn test_rejects_exports_and_named_imports() {
        let parser = StubParser::with(vec![
            (
                "EXPORTS",
                Node::root(vec![Node::import(vec![ModuleStatement::Export])]),
            ),
            (
                "NAMED",
                Node::root(vec![Node::import(vec![ModuleStatement::named_import(
                    vec!["Part".to_string()],
                    "./p.md",
                )])]),
            ),
        ]);
        let loader = MemoryLoader::new();

        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("EXPORTS", "/d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Exports are not supported. Found in /d/__entry__.md"
        );

        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("NAMED", "/d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only default imports are supported. Invalid import in /d/__entry__.md"
        );
    }

    #[test]
    fn test_missing_import_file_is_a_load_error() {
        let parser = StubParser::with(vec![(
            "ENTRY",
            Node::root(vec![import_node("Gone", "./gone.md")]),
        )]);
        let loader = MemoryLoader::new();
        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("ENTRY", "/d").unwrap_err();
        assert!(err.to_string().starts_with("Failed to load /d/gone.md"));
    }

    #[test]
    fn test_removes_comment_expressions() {
        let parser = StubParser::with(vec![(
            "ENTRY",
            Node::root(vec![
                Node::expression_block("// a line comment"),
                Node::paragraph(vec![
                    Node::text("kept"),
                    Node::expression_inline("/* block comment */"),
                ]),
            ]),
        )]);
        let loader = MemoryLoader::new();
        let mut bundler = Bundler::new(&parser, &loader);
        let bundled = bundler.bundle("ENTRY", "/d").unwrap();
        assert_eq!(
            bundled,
            Node::root(vec![Node::paragraph(vec![Node::text("kept")])])
        );
    }

    #[test]
    fn test_recursive_component_hits_the_depth_guard() {
        let parser = StubParser::with(vec![
            (
                "ENTRY",
                Node::root(vec![
                    import_node("Loop", "./loop.md"),
                    Node::element("Loop", vec![], vec![]),
                ]),
            ),
            (
                "LOOP",
                Node::root(vec![Node::element("Loop", vec![], vec![])]),
            ),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/d/loop.md", "LOOP");

        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("ENTRY", "/d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Recursive component inlining detected (depth > 64): Loop"
        );
    }

    #[test]
    fn test_spread_attributes_on_component_calls_are_rejected() {
        let parser = StubParser::with(vec![
            (
                "ENTRY",
                Node::root(vec![
                    import_node("Card", "./card.md"),
                    Node::Element(Element {
                        name: Some("Card".to_string()),
                        attributes: vec![Attribute::spread("extra")],
                        children: vec![],
                    }),
                ]),
            ),
            ("CARD", Node::root(vec![Node::text("card")])),
        ]);
        let mut loader = MemoryLoader::new();
        loader.add("/d/card.md", "CARD");

        let mut bundler = Bundler::new(&parser, &loader);
        let err = bundler.bundle("ENTRY", "/d").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only literal attribute values are supported. Invalid attribute in component <Card>."
        );
    }

    // ===== prop substitution =====

    fn raw_props(entries: Vec<(&str, &str)>) -> RawProps {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_props_in_expression_text() {
        let props = raw_props(vec![("count", "5"), ("label", "\"items\"")]);
        assert_eq!(
            substitute_props("props.count + props.label", &props).unwrap(),
            "5 + \"items\""
        );
        // absent props stay as written
        assert_eq!(
            substitute_props("props.other", &props).unwrap(),
            "props.other"
        );
    }

    #[test]
    fn test_substitution_follows_nested_references() {
        let props = raw_props(vec![("a", "props.b"), ("b", "3")]);
        assert_eq!(substitute_props("props.a", &props).unwrap(), "3");
    }

    #[test]
    fn test_substitution_detects_reference_cycles() {
        let props = raw_props(vec![("a", "props.b"), ("b", "props.a")]);
        let err = substitute_props("props.a", &props).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error substituting props in expression: \
             Circular reference detected for property 'a'."
        );
    }

    #[test]
    fn test_literal_results_become_text() {
        let props = raw_props(vec![("n", "5"), ("s", "\"hi\"")]);
        assert_eq!(
            substituted_expression("props.n", &props, Node::expression_inline).unwrap(),
            Node::text("5")
        );
        assert_eq!(
            substituted_expression("props.s", &props, Node::expression_inline).unwrap(),
            Node::text("hi")
        );
        // anything else stays an expression for transform time
        assert_eq!(
            substituted_expression("props.n + 1", &props, Node::expression_inline).unwrap(),
            Node::expression_inline("5 + 1")
        );
    }
}
