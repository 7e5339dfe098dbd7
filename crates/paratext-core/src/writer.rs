/*
 * writer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Serialization back to text.
//!
//! [`TreeSerializer`] is the seam the engine and the `<Raw>` plugin write
//! through. [`MarkdownWriter`] is the shipped implementation: top-level
//! blocks separated by blank lines, a single trailing newline, expressions
//! re-wrapped in braces, and elements in tag syntax.

use paratext_ast::{Attribute, AttributeValue, Element, Import, List, ListItem, ModuleStatement, Node};

/// Serializes document nodes back to text.
pub trait TreeSerializer {
    /// Render nodes as a complete document fragment.
    fn stringify(&self, nodes: &[Node]) -> String;
}

/// Markdown-shaped text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownWriter;

impl MarkdownWriter {
    pub fn new() -> Self {
        MarkdownWriter
    }
}

impl TreeSerializer for MarkdownWriter {
    fn stringify(&self, nodes: &[Node]) -> String {
        let blocks = write_blocks(nodes);
        if blocks.is_empty() {
            return String::new();
        }
        format!("{blocks}\n")
    }
}

fn write_blocks(nodes: &[Node]) -> String {
    let blocks: Vec<String> = nodes
        .iter()
        .map(write_block)
        .filter(|block| !block.is_empty())
        .collect();
    blocks.join("\n\n")
}

fn write_block(node: &Node) -> String {
    match node {
        Node::Root(root) => write_blocks(&root.children),
        Node::Text(text) => text.value.clone(),
        Node::Paragraph(paragraph) => write_inline_children(&paragraph.children),
        Node::Heading(heading) => {
            let marker = "#".repeat(heading.depth as usize);
            format!("{marker} {}", write_inline_children(&heading.children))
        }
        Node::List(list) => write_list(list),
        Node::ListItem(item) => write_list_item(item, "* "),
        Node::Html(html) => html.value.clone(),
        Node::Yaml(yaml) => format!("---\n{}\n---", yaml.value),
        Node::Element(element) => write_element(element, false),
        Node::ExpressionInline(expr) => format!("{{{}}}", expr.value),
        Node::ExpressionBlock(expr) => format!("{{{}}}", expr.value),
        Node::Import(import) => write_import(import),
    }
}

fn write_inline_children(nodes: &[Node]) -> String {
    nodes.iter().map(write_inline).collect()
}

fn write_inline(node: &Node) -> String {
    match node {
        Node::Text(text) => text.value.clone(),
        Node::Html(html) => html.value.clone(),
        Node::ExpressionInline(expr) => format!("{{{}}}", expr.value),
        Node::Element(element) => write_element(element, true),
        other => write_block(other),
    }
}

fn write_element(element: &Element, inline: bool) -> String {
    let name = element.name.as_deref().unwrap_or("");
    let attributes = write_attributes(&element.attributes);
    if element.children.is_empty() {
        if name.is_empty() {
            return "<></>".to_string();
        }
        return format!("<{name}{attributes} />");
    }
    if inline {
        let children = write_inline_children(&element.children);
        format!("<{name}{attributes}>{children}</{name}>")
    } else {
        let children = write_blocks(&element.children);
        format!("<{name}{attributes}>\n{children}\n</{name}>")
    }
}

fn write_attributes(attributes: &[Attribute]) -> String {
    let mut out = String::new();
    for attribute in attributes {
        match attribute {
            Attribute::Named { name, value: None } => {
                out.push(' ');
                out.push_str(name);
            }
            Attribute::Named {
                name,
                value: Some(AttributeValue::Literal(text)),
            } => out.push_str(&format!(" {name}=\"{text}\"")),
            Attribute::Named {
                name,
                value: Some(AttributeValue::Expression(source)),
            } => out.push_str(&format!(" {name}={{{source}}}")),
            Attribute::Spread { expression } => out.push_str(&format!(" {{...{expression}}}")),
        }
    }
    out
}

fn write_list(list: &List) -> String {
    let mut rendered = Vec::with_capacity(list.children.len());
    for (index, child) in list.children.iter().enumerate() {
        let prefix = if list.ordered {
            format!("{}. ", index + 1)
        } else {
            "* ".to_string()
        };
        let text = match child {
            Node::ListItem(item) => write_list_item(item, &prefix),
            other => indent_under_prefix(&prefix, &write_block(other)),
        };
        rendered.push(text);
    }
    let separator = if list.spread { "\n\n" } else { "\n" };
    rendered.join(separator)
}

fn write_list_item(item: &ListItem, prefix: &str) -> String {
    let separator = if item.spread { "\n\n" } else { "\n" };
    let blocks: Vec<String> = item
        .children
        .iter()
        .map(write_block)
        .filter(|block| !block.is_empty())
        .collect();
    indent_under_prefix(prefix, &blocks.join(separator))
}

// Continuation lines sit under the marker, indented to its width.
fn indent_under_prefix(prefix: &str, content: &str) -> String {
    if content.is_empty() {
        return prefix.trim_end().to_string();
    }
    let indent = " ".repeat(prefix.chars().count());
    let mut out = String::with_capacity(prefix.len() + content.len());
    for (index, line) in content.lines().enumerate() {
        if index == 0 {
            out.push_str(prefix);
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn write_import(import: &Import) -> String {
    let mut lines = Vec::with_capacity(import.statements.len());
    for statement in &import.statements {
        match statement {
            ModuleStatement::Import {
                default_binding,
                named_bindings,
                source,
            } => {
                let mut pieces = Vec::new();
                if let Some(binding) = default_binding {
                    pieces.push(binding.clone());
                }
                if !named_bindings.is_empty() {
                    pieces.push(format!("{{ {} }}", named_bindings.join(", ")));
                }
                if pieces.is_empty() {
                    lines.push(format!("import \"{source}\""));
                } else {
                    lines.push(format!("import {} from \"{source}\"", pieces.join(", ")));
                }
            }
            ModuleStatement::Export => lines.push("export {}".to_string()),
        }
    }
    lines.join("\n")
}
