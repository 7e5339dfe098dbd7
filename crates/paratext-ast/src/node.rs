/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document tree node types.
//!
//! The node vocabulary is closed: bundling and transformation match on it
//! exhaustively, so adding a node kind is a deliberate API change rather
//! than a runtime registration. Trees are plain owned data; `Clone` performs
//! a structural deep copy, which is what component inlining relies on.

use crate::attribute::Attribute;
use serde::{Deserialize, Serialize};

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Document root. The parser seam always yields one of these.
    Root(Root),

    /// Plain text.
    Text(Text),

    /// A paragraph of flowing content.
    Paragraph(Paragraph),

    /// A heading with a depth of 1 through 6.
    Heading(Heading),

    /// An ordered or unordered list.
    List(List),

    /// A single list item.
    ListItem(ListItem),

    /// Raw embedded HTML, passed through untouched.
    Html(Html),

    /// A front-matter block, stored as raw text until decoded.
    Yaml(Yaml),

    /// A tag element: `<Name attr="...">children</Name>`.
    ///
    /// A `None` or empty name is a fragment (`<>...</>`).
    Element(Element),

    /// An expression embedded in flowing text: `{expr}`.
    ExpressionInline(ExpressionInline),

    /// An expression standing alone at block level: `{expr}`.
    ExpressionBlock(ExpressionBlock),

    /// An import/export declaration block.
    ///
    /// These only appear at the top level of a freshly parsed tree and are
    /// consumed (validated and removed) during bundling.
    Import(Import),
}

pub type Nodes = Vec<Node>;

/// Document root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub children: Nodes,
}

/// Literal text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
}

/// A paragraph of flowing content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub children: Nodes,
}

/// A heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub depth: u8,
    pub children: Nodes,
}

/// An ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    /// Whether items are rendered loosely (blank lines between them).
    pub spread: bool,
    pub children: Nodes,
}

/// A single list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Whether the item is rendered loosely.
    pub spread: bool,
    pub children: Nodes,
}

/// Raw embedded HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Html {
    pub value: String,
}

/// A front-matter block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yaml {
    /// Raw YAML text, without the `---` fences.
    pub value: String,
}

/// A tag element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name. `None` (or an empty string) marks a fragment.
    pub name: Option<String>,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    pub children: Nodes,
}

/// An expression embedded in flowing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionInline {
    /// Raw expression source text, without the surrounding braces.
    pub value: String,
}

/// An expression standing alone at block level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionBlock {
    /// Raw expression source text, without the surrounding braces.
    pub value: String,
    /// Parsed arrow-function form, attached by the parser when the block is
    /// `{(a, b) => ...}`. Only tag plugins that accept a function-shaped
    /// child (iteration) consume this; expression evaluation ignores it.
    pub template: Option<BlockTemplate>,
}

/// The parsed body of an arrow-function block expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTemplate {
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// The function body as document nodes.
    pub body: Nodes,
}

impl BlockTemplate {
    pub fn new(params: Vec<String>, body: Nodes) -> Self {
        Self { params, body }
    }
}

/// An import/export declaration block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// The statements of the block, in source order.
    pub statements: Vec<ModuleStatement>,
}

/// One module-level statement inside an [`Import`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatement {
    /// An import declaration.
    ///
    /// Only the default form (`import Name from "./file.md"`) is accepted
    /// by bundling; named or namespace bindings are recorded in
    /// `named_bindings` so the bundler can reject them precisely.
    Import {
        default_binding: Option<String>,
        named_bindings: Vec<String>,
        source: String,
    },

    /// Any `export` statement. Bundling rejects these.
    Export,
}

impl ModuleStatement {
    /// A default-form import: `import Name from "source"`.
    pub fn default_import(binding: impl Into<String>, source: impl Into<String>) -> Self {
        ModuleStatement::Import {
            default_binding: Some(binding.into()),
            named_bindings: Vec::new(),
            source: source.into(),
        }
    }

    /// A named-bindings import: `import { A, B } from "source"`.
    pub fn named_import(bindings: Vec<String>, source: impl Into<String>) -> Self {
        ModuleStatement::Import {
            default_binding: None,
            named_bindings: bindings,
            source: source.into(),
        }
    }
}

impl Element {
    /// Whether this element is a fragment wrapper rather than a named tag.
    pub fn is_fragment(&self) -> bool {
        matches!(
            self.name.as_deref(),
            None | Some("") | Some("Fragment") | Some("React.Fragment")
        )
    }
}

impl Node {
    pub fn root(children: Nodes) -> Node {
        Node::Root(Root { children })
    }

    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(Text {
            value: value.into(),
        })
    }

    pub fn paragraph(children: Nodes) -> Node {
        Node::Paragraph(Paragraph { children })
    }

    pub fn heading(depth: u8, children: Nodes) -> Node {
        Node::Heading(Heading { depth, children })
    }

    /// A tight list (no blank lines between items).
    pub fn list(ordered: bool, children: Nodes) -> Node {
        Node::List(List {
            ordered,
            spread: false,
            children,
        })
    }

    pub fn list_item(children: Nodes) -> Node {
        Node::ListItem(ListItem {
            spread: false,
            children,
        })
    }

    pub fn html(value: impl Into<String>) -> Node {
        Node::Html(Html {
            value: value.into(),
        })
    }

    pub fn yaml(value: impl Into<String>) -> Node {
        Node::Yaml(Yaml {
            value: value.into(),
        })
    }

    pub fn element(name: impl Into<String>, attributes: Vec<Attribute>, children: Nodes) -> Node {
        Node::Element(Element {
            name: Some(name.into()),
            attributes,
            children,
        })
    }

    /// An unnamed fragment element: `<>...</>`.
    pub fn fragment(children: Nodes) -> Node {
        Node::Element(Element {
            name: None,
            attributes: Vec::new(),
            children,
        })
    }

    pub fn expression_inline(value: impl Into<String>) -> Node {
        Node::ExpressionInline(ExpressionInline {
            value: value.into(),
        })
    }

    pub fn expression_block(value: impl Into<String>) -> Node {
        Node::ExpressionBlock(ExpressionBlock {
            value: value.into(),
            template: None,
        })
    }

    /// A block expression carrying a parsed arrow-function template.
    pub fn templated_block(value: impl Into<String>, template: BlockTemplate) -> Node {
        Node::ExpressionBlock(ExpressionBlock {
            value: value.into(),
            template: Some(template),
        })
    }

    pub fn import(statements: Vec<ModuleStatement>) -> Node {
        Node::Import(Import { statements })
    }

    /// The node's children, for parent kinds.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root(n) => Some(&n.children),
            Node::Paragraph(n) => Some(&n.children),
            Node::Heading(n) => Some(&n.children),
            Node::List(n) => Some(&n.children),
            Node::ListItem(n) => Some(&n.children),
            Node::Element(n) => Some(&n.children),
            _ => None,
        }
    }

    /// Mutable access to the node's children, for parent kinds.
    pub fn children_mut(&mut self) -> Option<&mut Nodes> {
        match self {
            Node::Root(n) => Some(&mut n.children),
            Node::Paragraph(n) => Some(&mut n.children),
            Node::Heading(n) => Some(&mut n.children),
            Node::List(n) => Some(&mut n.children),
            Node::ListItem(n) => Some(&mut n.children),
            Node::Element(n) => Some(&mut n.children),
            _ => None,
        }
    }

    /// The element payload, when this node is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ========================================================================
    // Constructor tests
    // ========================================================================

    #[test]
    fn test_text_constructor() {
        assert_eq!(
            Node::text("hello"),
            Node::Text(Text {
                value: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_list_constructor_is_tight() {
        let list = Node::list(false, vec![Node::list_item(vec![Node::text("a")])]);
        match list {
            Node::List(l) => {
                assert!(!l.ordered);
                assert!(!l.spread);
                assert_eq!(l.children.len(), 1);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_templated_block_carries_params_and_body() {
        let node = Node::templated_block(
            "(item) => item",
            BlockTemplate::new(vec!["item".to_string()], vec![Node::text("x")]),
        );
        match node {
            Node::ExpressionBlock(block) => {
                let template = block.template.unwrap();
                assert_eq!(template.params, vec!["item".to_string()]);
                assert_eq!(template.body, vec![Node::text("x")]);
            }
            other => panic!("expected expression block, got {other:?}"),
        }
    }

    // ========================================================================
    // Structure tests
    // ========================================================================

    #[test]
    fn test_children_access_for_parent_kinds() {
        let mut root = Node::root(vec![Node::text("a"), Node::text("b")]);
        assert_eq!(root.children().map(<[Node]>::len), Some(2));

        root.children_mut()
            .expect("root has children")
            .push(Node::text("c"));
        assert_eq!(root.children().map(<[Node]>::len), Some(3));
    }

    #[test]
    fn test_leaves_have_no_children() {
        assert!(Node::text("x").children().is_none());
        assert!(Node::yaml("a: 1").children().is_none());
        assert!(Node::expression_inline("1 + 1").children().is_none());
    }

    #[test]
    fn test_fragment_detection() {
        let named = Element {
            name: Some("Note".to_string()),
            attributes: vec![],
            children: vec![],
        };
        assert!(!named.is_fragment());

        for name in [None, Some(String::new())] {
            let element = Element {
                name,
                attributes: vec![],
                children: vec![],
            };
            assert!(element.is_fragment());
        }

        let react = Element {
            name: Some("React.Fragment".to_string()),
            attributes: vec![],
            children: vec![],
        };
        assert!(react.is_fragment());
    }

    #[test]
    fn test_clone_is_a_deep_copy() {
        let original = Node::element(
            "Card",
            vec![Attribute::literal("title", "Hi")],
            vec![Node::paragraph(vec![Node::text("body")])],
        );
        let mut copy = original.clone();
        copy.children_mut()
            .expect("element has children")
            .push(Node::text("extra"));

        assert_eq!(original.children().map(<[Node]>::len), Some(1));
        assert_eq!(copy.children().map(<[Node]>::len), Some(2));
    }
}
